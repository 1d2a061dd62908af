//! Antora site reader.
//!
//! The navigation panel of an Antora site is a nested list whose items carry
//! a `data-depth` attribute:
//!
//! ```html
//! <nav class="nav-menu" data-panel="menu">
//!   <ul class="nav-list">
//!     <li class="nav-item" data-depth="1">
//!       <a class="nav-link" href="install.html">Install</a>
//!       ...
//! ```
//!
//! Page bodies live in `<article class="doc">`.

use std::fs;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use wikipub_config::MAX_DEPTH_LIMIT;

use super::{INDEX_FILE, SourceParser};
use crate::error::{ExtractError, NavigationError};
use crate::markup::{Element, collapse_whitespace, parse_html};
use crate::tree::{PageId, PageTree, PageTreeBuilder};

/// Reader for Antora-generated sites.
#[derive(Debug, Clone, Copy)]
pub struct AntoraParser {
    max_depth: usize,
}

impl AntoraParser {
    /// Create a parser that rejects navigation deeper than `max_depth`.
    ///
    /// Limits above [`MAX_DEPTH_LIMIT`] are clamped to it.
    #[must_use]
    pub const fn new(max_depth: usize) -> Self {
        let max_depth = if max_depth > MAX_DEPTH_LIMIT {
            MAX_DEPTH_LIMIT
        } else {
            max_depth
        };
        Self { max_depth }
    }

    /// Build a page tree from an already parsed index document.
    fn resolve_document(
        &self,
        document: &Element,
        root: &Path,
        index: &Path,
    ) -> Result<PageTree, NavigationError> {
        let menus = document.find_all(&|e: &Element| e.attr("data-panel") == Some("menu"));
        let Some(&menu) = menus.first() else {
            return Err(NavigationError::MenuNotFound(index.to_path_buf()));
        };
        if menus.len() > 1 {
            tracing::warn!(
                count = menus.len(),
                path = %index.display(),
                "Multiple navigation menus found, using the first"
            );
        }

        let mut anchors = Vec::new();
        collect_anchors(menu, None, &mut anchors);

        let mut builder = PageTreeBuilder::new();
        // stack[d] holds the most recent entry at depth d
        let mut stack: Vec<Option<PageId>> = Vec::new();

        for (anchor, parent) in anchors {
            let Some(raw_depth) = parent.and_then(|p| p.attr("data-depth")) else {
                continue;
            };
            let title = collapse_whitespace(&anchor.text_content());
            let depth: usize = raw_depth.trim().parse().map_err(|_| NavigationError::InvalidDepth {
                value: raw_depth.to_owned(),
                title: title.clone(),
            })?;
            if depth > self.max_depth {
                return Err(NavigationError::DepthExceeded {
                    depth,
                    max: self.max_depth,
                    title,
                });
            }

            let parent_id = if depth <= 1 {
                None
            } else {
                let direct = stack.get(depth - 1).copied().flatten();
                if direct.is_none() {
                    tracing::warn!(
                        title = %title,
                        depth,
                        "No navigation entry at the parent depth, attaching to the nearest shallower one"
                    );
                }
                direct.or_else(|| {
                    stack[..(depth - 1).min(stack.len())]
                        .iter()
                        .rev()
                        .find_map(|id| *id)
                })
            };

            let source = anchor.attr("href").and_then(|href| link_target(root, href));
            tracing::debug!(title = %title, depth, source = ?source, "Navigation entry");

            let id = builder.add(title, source, parent_id);
            stack.resize(depth, None);
            stack.push(Some(id));
        }

        Ok(builder.build())
    }
}

impl SourceParser for AntoraParser {
    fn resolve(&self, root: &Path) -> Result<PageTree, NavigationError> {
        let index = root.join(INDEX_FILE);
        let html = fs::read_to_string(&index).map_err(|source| NavigationError::Io {
            path: index.clone(),
            source,
        })?;
        let document = parse_html(&html).map_err(|source| NavigationError::Markup {
            path: index.clone(),
            source,
        })?;

        let tree = self.resolve_document(&document, root, &index)?;
        tracing::info!(pages = tree.len(), root = %root.display(), "Resolved navigation");
        Ok(tree)
    }

    fn extract(&self, source: &Path) -> Result<Option<Element>, ExtractError> {
        tracing::info!(path = %source.display(), "Loading page");

        let html = fs::read_to_string(source).map_err(|e| ExtractError::Io {
            path: source.to_path_buf(),
            source: e,
        })?;
        let document = parse_html(&html).map_err(|e| ExtractError::Markup {
            path: source.to_path_buf(),
            source: e,
        })?;

        Ok(document
            .find(&|e: &Element| e.tag == "article" && e.has_class("doc"))
            .cloned())
    }
}

/// Collect anchors in document order together with their direct parent.
fn collect_anchors<'a>(
    element: &'a Element,
    parent: Option<&'a Element>,
    out: &mut Vec<(&'a Element, Option<&'a Element>)>,
) {
    if element.tag == "a" {
        out.push((element, parent));
    }
    for child in &element.children {
        collect_anchors(child, Some(element), out);
    }
}

/// Resolve a navigation link to a local file.
///
/// The fragment is dropped. Empty links, fragment-only links and absolute
/// URLs have no local target.
fn link_target(root: &Path, href: &str) -> Option<PathBuf> {
    let path = href.split_once('#').map_or(href, |(path, _)| path).trim();
    if path.is_empty() || url::Url::parse(path).is_ok() {
        return None;
    }
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    Some(root.join(decoded.as_ref()))
}
