//! Confluence storage format transformer.
//!
//! Turns an Antora `article.doc` element into a Confluence page body:
//! the duplicated page heading is dropped, local images become
//! `ac:image` attachment references and highlighted code blocks become
//! `code` macros whose body is a CDATA section.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;

use super::{Attachment, MarkupTransformer, TransformResult};
use crate::error::TransformError;
use crate::markup::{Element, serialize_inner};
use crate::tree::PageNode;

/// Inert element carrying raw code text until CDATA sections are restored.
const CDATA_PLACEHOLDER: &str = "cdata-placeholder";

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<br\s*>|</br\s*>").expect("invalid line break regex"));

static EMPTY_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<a(?:\s[^>]*)?></a>|<a(?:\s[^>]*)?/>").expect("invalid anchor regex")
});

static CDATA_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<cdata-placeholder>(.*?)</cdata-placeholder>").expect("invalid CDATA regex")
});

static LANGUAGE_PARAMETER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(ac:name="language">)\s*([^<\s]+)\s*(</ac:parameter>)"#)
        .expect("invalid language regex")
});

/// Transformer producing Confluence storage format.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfluenceStorageTransformer;

impl ConfluenceStorageTransformer {
    /// Create a new transformer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl MarkupTransformer for ConfluenceStorageTransformer {
    fn transform(
        &self,
        node: &PageNode,
        mut content: Element,
    ) -> Result<TransformResult, TransformError> {
        let source = node
            .source
            .as_deref()
            .ok_or_else(|| TransformError::MissingSource(node.title.clone()))?;
        let base_dir = source.parent().unwrap_or_else(|| Path::new(""));

        tracing::info!(title = %node.title, source = %source.display(), "Transforming page");

        if strip_title(&mut content) {
            tracing::debug!(title = %node.title, "Removed page heading");
        }
        let attachments = rewrite_images(&mut content, base_dir);
        let code_blocks = rewrite_code_blocks(&mut content);
        let markup = sanitize(&mut content);

        tracing::debug!(
            title = %node.title,
            attachments = attachments.len(),
            code_blocks,
            length = markup.len(),
            "Transformed page"
        );

        Ok(TransformResult {
            markup,
            attachments,
        })
    }
}

/// Remove the first `h1.page` in document order, keeping its tail text.
pub(crate) fn strip_title(content: &mut Element) -> bool {
    remove_first(content, &|e: &Element| e.tag == "h1" && e.has_class("page"))
}

fn remove_first(parent: &mut Element, predicate: &impl Fn(&Element) -> bool) -> bool {
    for index in 0..parent.children.len() {
        if predicate(&parent.children[index]) {
            let removed = parent.children.remove(index);
            if index == 0 {
                parent.text.push_str(&removed.tail);
            } else {
                parent.children[index - 1].tail.push_str(&removed.tail);
            }
            return true;
        }
        if remove_first(&mut parent.children[index], predicate) {
            return true;
        }
    }
    false
}

/// Replace local images with attachment references.
///
/// Images whose file is missing, and remote images, are left untouched.
pub(crate) fn rewrite_images(element: &mut Element, base_dir: &Path) -> BTreeSet<Attachment> {
    let mut attachments = BTreeSet::new();
    for child in &mut element.children {
        if child.tag == "img" {
            if let Some((image, attachment)) = attachment_image(child, base_dir) {
                *child = image;
                attachments.insert(attachment);
            }
        } else {
            attachments.extend(rewrite_images(child, base_dir));
        }
    }
    attachments
}

fn attachment_image(img: &Element, base_dir: &Path) -> Option<(Element, Attachment)> {
    let src = img.attr("src").map(str::trim).filter(|src| !src.is_empty())?;
    if is_remote(src) {
        tracing::debug!(src, "Leaving remote image unchanged");
        return None;
    }

    let path = normalize(&base_dir.join(percent_decode_str(src).decode_utf8_lossy().as_ref()));
    if !path.is_file() {
        tracing::info!(path = %path.display(), "Image does not exist, leaving reference unchanged");
        return None;
    }
    let file_name = path.file_name()?.to_string_lossy().into_owned();

    let align = non_blank(img.attr("align")).unwrap_or("center");
    let mut image = Element::new("ac:image").with_attr("ac:align", align);
    if let Some(width) = non_blank(img.attr("width")) {
        image = image.with_attr("ac:width", width);
    }
    let image = image
        .with_children(vec![
            Element::new("ri:attachment").with_attr("ri:filename", file_name.clone()),
        ])
        .with_tail(img.tail.clone());

    tracing::debug!(file_name = %file_name, path = %path.display(), "Image attachment");
    Some((
        image,
        Attachment {
            file_name,
            source: path,
        },
    ))
}

fn is_remote(src: &str) -> bool {
    let lower = src.to_ascii_lowercase();
    ["http:", "https:", "data:", "//"]
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Resolve `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Replace `pre` blocks holding a `code` element with code macros.
pub(crate) fn rewrite_code_blocks(element: &mut Element) -> usize {
    let mut count = 0;
    for child in &mut element.children {
        if child.tag == "pre"
            && let Some(code_macro) = code_macro(child)
        {
            *child = code_macro;
            count += 1;
        } else {
            count += rewrite_code_blocks(child);
        }
    }
    count
}

fn code_macro(pre: &Element) -> Option<Element> {
    let code = pre.children.iter().find(|child| child.tag == "code")?;

    let mut children = Vec::with_capacity(2);
    if let Some(language) = non_blank(code.attr("data-lang")) {
        children.push(
            Element::new("ac:parameter")
                .with_attr("ac:name", "language")
                .with_text(language),
        );
    }
    children.push(
        Element::new("ac:plain-text-body")
            .with_children(vec![Element::new(CDATA_PLACEHOLDER).with_text(code.text_content())]),
    );

    Some(
        Element::new("ac:structured-macro")
            .with_attr("ac:name", "code")
            .with_children(children)
            .with_tail(pre.tail.clone()),
    )
}

/// Strip presentation attributes and serialize the body content.
pub(crate) fn sanitize(content: &mut Element) -> String {
    strip_classes(content);
    finish_markup(serialize_inner(content).trim())
}

fn strip_classes(element: &mut Element) {
    for child in &mut element.children {
        child.remove_attr("class");
        strip_classes(child);
    }
}

/// Text-level fixups on serialized storage markup.
fn finish_markup(html: &str) -> String {
    let html = LINE_BREAK.replace_all(html, "<br />");
    let html = EMPTY_ANCHOR.replace_all(&html, "");
    let html = CDATA_SPAN.replace_all(&html, |caps: &regex::Captures| {
        let raw = caps[1]
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&amp;", "&")
            .replace("]]>", "]]]]><![CDATA[>");
        format!("<![CDATA[{raw}]]>")
    });
    LANGUAGE_PARAMETER
        .replace_all(&html, "$1$2$3")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::markup::parse_html;

    fn body(html: &str) -> Element {
        parse_html(html).unwrap().children.remove(0)
    }

    fn page(source: &Path) -> PageNode {
        PageNode {
            title: "Page".to_owned(),
            source: Some(source.to_path_buf()),
            parent: None,
        }
    }

    #[test]
    fn test_strip_title_keeps_tail() {
        let mut content = body(r#"<article class="doc"><h1 class="page">Title</h1>
<p>Text</p></article>"#);

        assert!(strip_title(&mut content));
        assert_eq!(serialize_inner(&content), "\n<p>Text</p>");
    }

    #[test]
    fn test_strip_title_only_first() {
        let mut content = body(
            r#"<article><div><h1 class="page">One</h1></div><h1 class="page">Two</h1></article>"#,
        );

        assert!(strip_title(&mut content));
        assert_eq!(
            serialize_inner(&content),
            r#"<div></div><h1 class="page">Two</h1>"#
        );
    }

    #[test]
    fn test_strip_title_absent() {
        let mut content = body("<article><h1>Plain</h1></article>");
        assert!(!strip_title(&mut content));
    }

    #[test]
    fn test_image_becomes_attachment() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.png"), b"PNG").unwrap();
        let mut content = body(r#"<article><img src="a.png" width="50" align="left"> after</article>"#);

        let attachments = rewrite_images(&mut content, dir.path());

        assert_eq!(
            serialize_inner(&content),
            r#"<ac:image ac:align="left" ac:width="50"><ri:attachment ri:filename="a.png" /></ac:image> after"#
        );
        assert_eq!(attachments.len(), 1);
        let attachment = attachments.first().unwrap();
        assert_eq!(attachment.file_name, "a.png");
        assert_eq!(attachment.source, dir.path().join("a.png"));
    }

    #[test]
    fn test_image_defaults_to_center_without_width() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("_images")).unwrap();
        fs::write(dir.path().join("_images/b.svg"), b"<svg/>").unwrap();
        let mut content = body(r#"<article><img src="_images/b.svg" align=" " width=""></article>"#);

        rewrite_images(&mut content, dir.path());

        assert_eq!(
            serialize_inner(&content),
            r#"<ac:image ac:align="center"><ri:attachment ri:filename="b.svg" /></ac:image>"#
        );
    }

    #[test]
    fn test_missing_image_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut content = body(r#"<article><img src="missing.png" alt="x"></article>"#);

        let attachments = rewrite_images(&mut content, dir.path());

        assert!(attachments.is_empty());
        assert_eq!(serialize_inner(&content), r#"<img src="missing.png" alt="x" />"#);
    }

    #[test]
    fn test_remote_image_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut content = body(r#"<article><img src="https://example.com/a.png"></article>"#);

        assert!(rewrite_images(&mut content, dir.path()).is_empty());
        assert_eq!(content.children[0].tag, "img");
    }

    #[test]
    fn test_same_image_twice_is_one_attachment() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("img")).unwrap();
        fs::write(dir.path().join("a.png"), b"PNG").unwrap();
        let mut content = body(
            r#"<article><p><img src="a.png"></p><div><img src="./img/../a.png"></div></article>"#,
        );

        let attachments = rewrite_images(&mut content, dir.path());

        assert_eq!(attachments.len(), 1);
    }

    #[test]
    fn test_code_block_becomes_macro() {
        let mut content = body(r#"<article><pre><code data-lang="go">x:=1</code></pre></article>"#);

        assert_eq!(rewrite_code_blocks(&mut content), 1);
        assert_eq!(
            sanitize(&mut content),
            r#"<ac:structured-macro ac:name="code"><ac:parameter ac:name="language">go</ac:parameter><ac:plain-text-body><![CDATA[x:=1]]></ac:plain-text-body></ac:structured-macro>"#
        );
    }

    #[test]
    fn test_code_block_drops_highlight_markup() {
        let mut content = body(
            r#"<article><pre class="highlight"><code class="language-html" data-lang="html"><span class="tag">&lt;div&gt;</span> a &amp;&amp; b</code></pre></article>"#,
        );

        rewrite_code_blocks(&mut content);
        let markup = sanitize(&mut content);

        assert!(markup.contains("<![CDATA[<div> a && b]]>"));
        assert!(!markup.contains("cdata-placeholder"));
        assert!(!markup.contains("span"));
    }

    #[test]
    fn test_code_block_without_language() {
        let mut content = body("<article><pre><code>plain</code></pre></article>");

        rewrite_code_blocks(&mut content);
        let markup = sanitize(&mut content);

        assert!(!markup.contains("ac:parameter"));
        assert!(markup.contains("<![CDATA[plain]]>"));
    }

    #[test]
    fn test_pre_without_code_untouched() {
        let mut content = body("<article><pre>literal</pre></article>");

        assert_eq!(rewrite_code_blocks(&mut content), 0);
        assert_eq!(sanitize(&mut content), "<pre>literal</pre>");
    }

    #[test]
    fn test_cdata_end_marker_split() {
        let mut content = body("<article><pre><code>a]]&gt;b</code></pre></article>");

        rewrite_code_blocks(&mut content);

        assert!(sanitize(&mut content).contains("<![CDATA[a]]]]><![CDATA[>b]]>"));
    }

    #[test]
    fn test_escaping_outside_cdata_kept() {
        let mut content = body(
            "<article><p>a &lt; b &amp; c</p><pre><code>if a &lt; b</code></pre></article>",
        );

        rewrite_code_blocks(&mut content);
        let markup = sanitize(&mut content);

        assert!(markup.starts_with("<p>a &lt; b &amp; c</p>"));
        assert!(markup.contains("<![CDATA[if a < b]]>"));
        assert!(!markup.contains("&amp;lt;"));
    }

    #[test]
    fn test_sanitize_strips_classes_and_empty_anchors() {
        let mut content = body(
            r#"<article class="doc">
<div class="paragraph"><p><a id="anchor"></a>Text<a href="x.html">link</a></p></div>
</article>"#,
        );

        assert_eq!(
            sanitize(&mut content),
            r#"<div><p>Text<a href="x.html">link</a></p></div>"#
        );
    }

    #[test]
    fn test_finish_markup_fixups() {
        assert_eq!(finish_markup("a<br>b</br>c"), "a<br />b<br />c");
        assert_eq!(finish_markup(r#"<a name="x"/>text"#), "text");
        assert_eq!(
            finish_markup("<ac:parameter ac:name=\"language\">\n  go \n</ac:parameter>"),
            "<ac:parameter ac:name=\"language\">go</ac:parameter>"
        );
    }

    #[test]
    fn test_transform_full_page() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("page.html");
        fs::write(dir.path().join("arch.png"), b"PNG").unwrap();
        let content = body(
            r#"<article class="doc">
<h1 class="page">Page</h1>
<div class="imageblock"><img src="arch.png"></div>
<pre><code data-lang="sh">echo hi</code></pre>
</article>"#,
        );

        let result = ConfluenceStorageTransformer::new()
            .transform(&page(&source), content)
            .unwrap();

        assert_eq!(
            result.markup,
            concat!(
                r#"<div><ac:image ac:align="center"><ri:attachment ri:filename="arch.png" /></ac:image></div>"#,
                "\n",
                r#"<ac:structured-macro ac:name="code"><ac:parameter ac:name="language">sh</ac:parameter><ac:plain-text-body><![CDATA[echo hi]]></ac:plain-text-body></ac:structured-macro>"#,
            )
        );
        assert_eq!(result.attachments.len(), 1);
    }

    #[test]
    fn test_transform_requires_source() {
        let node = PageNode {
            title: "Container".to_owned(),
            source: None,
            parent: None,
        };

        let result = ConfluenceStorageTransformer::new().transform(&node, Element::new("article"));
        assert!(matches!(result, Err(TransformError::MissingSource(_))));
    }
}
