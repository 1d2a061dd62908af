//! Reconciliation of a page tree with a remote space.
//!
//! Pages are matched by exact title against a snapshot of the space taken
//! once per pass. Matching pages are reused, missing pages are created, and
//! every page with content gets its body replaced. Traversal is depth-first
//! with parents written before their children.

use std::collections::BTreeSet;
use std::fs;

use quick_xml::escape::escape;
use uuid::Uuid;
use wikipub_confluence::types::{NewPage, PageSummary, PageUpdate};
use wikipub_confluence::{ConfluenceApi, guess_media_type};

use crate::error::SyncError;
use crate::parser::SourceParser;
use crate::transform::{Attachment, MarkupTransformer};
use crate::tree::{PageId, PageNode, PageTree};

/// Page properties that control the page width.
pub const APPEARANCE_PROPERTIES: [&str; 2] =
    ["content-appearance-draft", "content-appearance-published"];

/// Default value of the appearance properties.
pub const DEFAULT_APPEARANCE: &str = "full-width";

/// Counters for one publish pass.
///
/// In dry-run mode the counters describe the writes that would happen.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MappingStats {
    /// Pages created because no page with the title existed.
    pub pages_created: usize,
    /// Existing pages matched by title.
    pub pages_reused: usize,
    /// Pages whose body was written.
    pub pages_updated: usize,
    /// Attachments uploaded.
    pub attachments_uploaded: usize,
    /// Attachments that could not be read or uploaded.
    pub attachments_failed: usize,
}

/// Remote page a node is bound to.
#[derive(Debug)]
struct RemotePage {
    id: String,
    version: u32,
}

/// State of one pass over a space.
struct Pass {
    space_id: String,
    index: Vec<PageSummary>,
    stats: MappingStats,
}

/// Writes a [`PageTree`] into a space.
pub struct SyncEngine<'a> {
    api: &'a dyn ConfluenceApi,
    parser: &'a dyn SourceParser,
    transformer: &'a dyn MarkupTransformer,
    dry_run: bool,
    appearance: &'a str,
}

impl<'a> SyncEngine<'a> {
    /// Create an engine writing through `api`.
    #[must_use]
    pub fn new(
        api: &'a dyn ConfluenceApi,
        parser: &'a dyn SourceParser,
        transformer: &'a dyn MarkupTransformer,
    ) -> Self {
        Self {
            api,
            parser,
            transformer,
            dry_run: false,
            appearance: DEFAULT_APPEARANCE,
        }
    }

    /// Run extraction and transformation without any remote call.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Value written to the appearance properties.
    #[must_use]
    pub fn with_appearance(mut self, appearance: &'a str) -> Self {
        self.appearance = appearance;
        self
    }

    /// Reconcile `tree` into the space `space_key`.
    ///
    /// # Errors
    ///
    /// Returns the first extraction, transformation or remote write error;
    /// pages after the failing one are not processed. Attachment failures
    /// are only counted.
    pub fn sync(&self, space_key: &str, tree: &PageTree) -> Result<MappingStats, SyncError> {
        let mut pass = if self.dry_run {
            tracing::info!(space = %space_key, "Dry run: no changes will be made");
            Pass {
                space_id: format!("dry-run-{space_key}"),
                index: Vec::new(),
                stats: MappingStats::default(),
            }
        } else {
            let space = self.api.find_space(space_key)?;
            let index = self.api.list_pages(&space.id)?;
            tracing::info!(space = %space_key, pages = index.len(), "Loaded remote page index");
            Pass {
                space_id: space.id,
                index,
                stats: MappingStats::default(),
            }
        };

        for &root in tree.roots() {
            self.sync_node(&mut pass, tree, root, None)?;
        }

        Ok(pass.stats)
    }

    fn sync_node(
        &self,
        pass: &mut Pass,
        tree: &PageTree,
        id: PageId,
        parent_id: Option<&str>,
    ) -> Result<(), SyncError> {
        let node = tree.node(id);
        let mut page = self.bind_page(pass, node, parent_id)?;

        if let Some(source) = &node.source {
            match self.parser.extract(source)? {
                Some(content) => {
                    let result = self.transformer.transform(node, content)?;
                    self.write_body(pass, node, &mut page, &result.markup)?;
                    self.upload_attachments(pass, &page.id, &result.attachments);
                }
                None => {
                    tracing::warn!(
                        title = %node.title,
                        source = %source.display(),
                        "No page content found, body not written"
                    );
                }
            }
        }

        for &child in tree.children(id) {
            self.sync_node(pass, tree, child, Some(&page.id))?;
        }
        Ok(())
    }

    /// Find the remote page for `node` by title, creating it when missing.
    fn bind_page(
        &self,
        pass: &mut Pass,
        node: &PageNode,
        parent_id: Option<&str>,
    ) -> Result<RemotePage, SyncError> {
        if let Some(existing) = pass.index.iter().find(|page| page.title == node.title) {
            tracing::info!(title = %node.title, id = %existing.id, "Using existing page");
            pass.stats.pages_reused += 1;
            return Ok(RemotePage {
                id: existing.id.clone(),
                version: existing.version.number,
            });
        }

        pass.stats.pages_created += 1;
        if self.dry_run {
            let id = format!("dry-run-{}", Uuid::new_v4());
            tracing::info!(title = %node.title, id = %id, parent = ?parent_id, "Would create page");
            return Ok(RemotePage { id, version: 0 });
        }

        let body = escape(node.title.as_str());
        let created = self.api.create_page(&NewPage {
            space_id: &pass.space_id,
            parent_id,
            title: &node.title,
            body: &body,
        })?;
        tracing::info!(title = %node.title, id = %created.id, "Created page");
        Ok(RemotePage {
            id: created.id,
            version: created.version.number,
        })
    }

    /// Replace the page body and make sure the appearance properties exist.
    fn write_body(
        &self,
        pass: &mut Pass,
        node: &PageNode,
        page: &mut RemotePage,
        markup: &str,
    ) -> Result<(), SyncError> {
        let version = page.version + 1;

        if self.dry_run {
            tracing::info!(title = %node.title, version, length = markup.len(), "Would update page");
            page.version = version;
            pass.stats.pages_updated += 1;
            return Ok(());
        }

        let updated = self.api.update_page(&PageUpdate {
            id: &page.id,
            title: &node.title,
            version,
            body: markup,
        })?;
        page.version = updated.version.number.max(version);
        pass.stats.pages_updated += 1;
        tracing::info!(title = %node.title, version = page.version, "Updated page");

        let existing = self.api.list_page_properties(&page.id)?;
        for key in APPEARANCE_PROPERTIES {
            if existing.iter().any(|property| property.key == key) {
                continue;
            }
            self.api
                .create_page_property(&page.id, key, self.appearance)?;
            tracing::debug!(page = %page.id, key, value = %self.appearance, "Set page property");
        }
        Ok(())
    }

    /// Upload attachments one by one; failures are logged and counted.
    fn upload_attachments(&self, pass: &mut Pass, page_id: &str, attachments: &BTreeSet<Attachment>) {
        for attachment in attachments {
            if self.dry_run {
                tracing::info!(
                    file_name = %attachment.file_name,
                    page = %page_id,
                    "Would upload attachment"
                );
                pass.stats.attachments_uploaded += 1;
                continue;
            }

            let data = match fs::read(&attachment.source) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(
                        path = %attachment.source.display(),
                        error = %e,
                        "Failed to read attachment"
                    );
                    pass.stats.attachments_failed += 1;
                    continue;
                }
            };

            let media_type = guess_media_type(&attachment.file_name);
            match self
                .api
                .upload_attachment(page_id, &attachment.file_name, &data, media_type)
            {
                Ok(()) => pass.stats.attachments_uploaded += 1,
                Err(e) => {
                    tracing::warn!(
                        file_name = %attachment.file_name,
                        page = %page_id,
                        error = %e,
                        "Failed to upload attachment"
                    );
                    pass.stats.attachments_failed += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use pretty_assertions::assert_eq;
    use wikipub_confluence::{MockConfluence, RemoteCall};

    use super::*;
    use crate::parser::AntoraParser;
    use crate::transform::ConfluenceStorageTransformer;
    use crate::tree::PageTreeBuilder;

    const PARSER: AntoraParser = AntoraParser::new(10);

    fn write_page(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(
            &path,
            format!(r#"<html><body><article class="doc">{body}</article></body></html>"#),
        )
        .unwrap();
        path
    }

    fn created_titles(calls: &[RemoteCall]) -> Vec<String> {
        calls
            .iter()
            .filter_map(|call| match call {
                RemoteCall::CreatePage { title, .. } => Some(title.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_reuses_matching_title_and_creates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = PageTreeBuilder::new();
        builder.add("Intro".to_owned(), Some(write_page(dir.path(), "intro.html", "<p>i</p>")), None);
        builder.add("NewPage".to_owned(), Some(write_page(dir.path(), "new.html", "<p>n</p>")), None);
        let tree = builder.build();

        let api = MockConfluence::new()
            .with_space("DOCS", "100")
            .with_page("100", "42", "Intro", 3);
        let transformer = ConfluenceStorageTransformer::new();
        let stats = SyncEngine::new(&api, &PARSER, &transformer)
            .sync("DOCS", &tree)
            .unwrap();

        assert_eq!(stats.pages_reused, 1);
        assert_eq!(stats.pages_created, 1);
        assert_eq!(stats.pages_updated, 2);
        assert_eq!(created_titles(&api.calls()), vec!["NewPage"]);
        assert_eq!(api.page("42").unwrap().version.number, 4);
        assert_eq!(api.body("42").as_deref(), Some("<p>i</p>"));
    }

    #[test]
    fn test_title_match_is_case_sensitive() {
        let mut builder = PageTreeBuilder::new();
        builder.add("intro".to_owned(), None, None);
        let tree = builder.build();

        let api = MockConfluence::new()
            .with_space("DOCS", "100")
            .with_page("100", "42", "Intro", 1);
        let transformer = ConfluenceStorageTransformer::new();
        let stats = SyncEngine::new(&api, &PARSER, &transformer)
            .sync("DOCS", &tree)
            .unwrap();

        assert_eq!(stats.pages_created, 1);
        assert_eq!(stats.pages_reused, 0);
    }

    #[test]
    fn test_children_created_under_parent_id() {
        let mut builder = PageTreeBuilder::new();
        let guide = builder.add("Guide".to_owned(), None, None);
        builder.add("Install".to_owned(), None, Some(guide));
        let tree = builder.build();

        let api = MockConfluence::new().with_space("DOCS", "100");
        let transformer = ConfluenceStorageTransformer::new();
        SyncEngine::new(&api, &PARSER, &transformer)
            .sync("DOCS", &tree)
            .unwrap();

        let install = api.page_by_title("Install").unwrap();
        let guide = api.page_by_title("Guide").unwrap();
        assert_eq!(install.parent_id, Some(guide.id.clone()));
        assert_eq!(guide.parent_id, None);
        assert_eq!(api.body(&guide.id).as_deref(), Some("Guide"));
    }

    #[test]
    fn test_initial_body_is_escaped_title() {
        let mut builder = PageTreeBuilder::new();
        builder.add("Q&A <draft>".to_owned(), None, None);
        let tree = builder.build();

        let api = MockConfluence::new().with_space("DOCS", "100");
        let transformer = ConfluenceStorageTransformer::new();
        SyncEngine::new(&api, &PARSER, &transformer)
            .sync("DOCS", &tree)
            .unwrap();

        assert_eq!(api.body("mock-1").as_deref(), Some("Q&amp;A &lt;draft&gt;"));
    }

    #[test]
    fn test_dry_run_makes_no_remote_calls() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.png"), b"PNG").unwrap();
        let mut builder = PageTreeBuilder::new();
        let root = builder.add("Root".to_owned(), None, None);
        builder.add(
            "Page".to_owned(),
            Some(write_page(dir.path(), "page.html", r#"<img src="a.png">"#)),
            Some(root),
        );
        let tree = builder.build();

        let api = MockConfluence::new();
        let transformer = ConfluenceStorageTransformer::new();
        let stats = SyncEngine::new(&api, &PARSER, &transformer)
            .with_dry_run(true)
            .sync("DOCS", &tree)
            .unwrap();

        assert!(api.calls().is_empty());
        assert_eq!(stats.pages_created, 2);
        assert_eq!(stats.pages_updated, 1);
        assert_eq!(stats.attachments_uploaded, 1);
    }

    #[test]
    fn test_properties_created_only_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = PageTreeBuilder::new();
        builder.add("Intro".to_owned(), Some(write_page(dir.path(), "intro.html", "<p>x</p>")), None);
        let tree = builder.build();

        let api = MockConfluence::new()
            .with_space("DOCS", "100")
            .with_page("100", "42", "Intro", 1)
            .with_property("42", "content-appearance-draft", "fixed-width");
        let transformer = ConfluenceStorageTransformer::new();
        SyncEngine::new(&api, &PARSER, &transformer)
            .with_appearance("max")
            .sync("DOCS", &tree)
            .unwrap();

        let created: Vec<_> = api
            .calls()
            .into_iter()
            .filter(|call| matches!(call, RemoteCall::CreateProperty { .. }))
            .collect();
        assert_eq!(
            created,
            vec![RemoteCall::CreateProperty {
                page_id: "42".to_owned(),
                key: "content-appearance-published".to_owned(),
                value: "max".to_owned(),
            }]
        );
    }

    #[test]
    fn test_attachment_failure_does_not_stop_siblings() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.png"), b"A").unwrap();
        fs::write(dir.path().join("b.png"), b"B").unwrap();
        fs::write(dir.path().join("c.png"), b"C").unwrap();
        let mut builder = PageTreeBuilder::new();
        let page = builder.add(
            "Images".to_owned(),
            Some(write_page(
                dir.path(),
                "images.html",
                r#"<img src="a.png"><img src="b.png"><img src="c.png">"#,
            )),
            None,
        );
        builder.add("After".to_owned(), None, Some(page));
        let tree = builder.build();

        let api = MockConfluence::new()
            .with_space("DOCS", "100")
            .failing_upload("b.png");
        let transformer = ConfluenceStorageTransformer::new();
        let stats = SyncEngine::new(&api, &PARSER, &transformer)
            .sync("DOCS", &tree)
            .unwrap();

        assert_eq!(stats.attachments_uploaded, 2);
        assert_eq!(stats.attachments_failed, 1);
        assert!(api.page_by_title("After").is_some());
    }

    #[test]
    fn test_failed_update_aborts_subtree() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = PageTreeBuilder::new();
        let parent = builder.add(
            "Broken".to_owned(),
            Some(write_page(dir.path(), "broken.html", "<p>x</p>")),
            None,
        );
        builder.add("Child".to_owned(), None, Some(parent));
        let tree = builder.build();

        let api = MockConfluence::new()
            .with_space("DOCS", "100")
            .failing_update("Broken");
        let transformer = ConfluenceStorageTransformer::new();
        let result = SyncEngine::new(&api, &PARSER, &transformer).sync("DOCS", &tree);

        assert!(matches!(result, Err(SyncError::Remote(_))));
        assert!(api.page_by_title("Child").is_none());
    }

    #[test]
    fn test_failed_create_aborts_subtree() {
        let mut builder = PageTreeBuilder::new();
        let parent = builder.add("Parent".to_owned(), None, None);
        builder.add("Child".to_owned(), None, Some(parent));
        let tree = builder.build();

        let api = MockConfluence::new()
            .with_space("DOCS", "100")
            .failing_create("Parent");
        let transformer = ConfluenceStorageTransformer::new();
        let result = SyncEngine::new(&api, &PARSER, &transformer).sync("DOCS", &tree);

        assert!(matches!(result, Err(SyncError::Remote(_))));
        assert!(api.page_by_title("Parent").is_none());
        assert!(api.page_by_title("Child").is_none());
        assert_eq!(created_titles(&api.calls()), vec!["Parent"]);
    }

    #[test]
    fn test_stale_version_fails_sync() {
        let dir = tempfile::tempdir().unwrap();
        // both entries bind to page 42 from the same snapshot
        let mut builder = PageTreeBuilder::new();
        builder.add("Intro".to_owned(), Some(write_page(dir.path(), "a.html", "<p>a</p>")), None);
        builder.add("Intro".to_owned(), Some(write_page(dir.path(), "b.html", "<p>b</p>")), None);
        let tree = builder.build();

        let api = MockConfluence::new()
            .with_space("DOCS", "100")
            .with_page("100", "42", "Intro", 1);
        let transformer = ConfluenceStorageTransformer::new();
        let result = SyncEngine::new(&api, &PARSER, &transformer).sync("DOCS", &tree);

        let Err(SyncError::Remote(err)) = result else {
            panic!("expected a remote error, got {result:?}");
        };
        assert!(err.is_version_conflict(), "{err}");
        assert_eq!(api.page("42").unwrap().version.number, 2);
        assert_eq!(api.body("42").as_deref(), Some("<p>a</p>"));
    }

    #[test]
    fn test_missing_body_skips_write_but_processes_children() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("empty.html");
        fs::write(&source, "<html><body><p>no article</p></body></html>").unwrap();
        let mut builder = PageTreeBuilder::new();
        let parent = builder.add("Empty".to_owned(), Some(source), None);
        builder.add("Child".to_owned(), None, Some(parent));
        let tree = builder.build();

        let api = MockConfluence::new().with_space("DOCS", "100");
        let transformer = ConfluenceStorageTransformer::new();
        let stats = SyncEngine::new(&api, &PARSER, &transformer)
            .sync("DOCS", &tree)
            .unwrap();

        assert_eq!(stats.pages_updated, 0);
        assert_eq!(stats.pages_created, 2);
    }

    #[test]
    fn test_unknown_space_fails() {
        let api = MockConfluence::new();
        let transformer = ConfluenceStorageTransformer::new();
        let result = SyncEngine::new(&api, &PARSER, &transformer).sync("NOPE", &PageTree::default());

        assert!(matches!(result, Err(SyncError::Remote(_))));
    }
}
