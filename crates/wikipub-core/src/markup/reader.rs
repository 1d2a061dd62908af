//! Tolerant HTML reader on top of `quick-xml`.

use std::borrow::Cow;
use std::sync::LazyLock;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use regex::Regex;

use super::entities::{decode_reference, expand_named_entities};
use super::{Element, is_void};
use crate::error::MarkupError;

/// Script and style bodies are not markup and may contain bare `<`.
static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:script|style)\b[^>]*>.*?</(?:script|style)\s*>")
        .expect("invalid script regex")
});

/// Parse an HTML document into an element tree.
///
/// The returned element is a nameless document root holding the top-level
/// nodes. Whitespace is kept exactly. Void elements never take children, an
/// end tag closes the nearest open element with the same name, and stray end
/// tags are dropped. Comments, doctype and processing instructions are
/// dropped; CDATA becomes text. A `<` that cannot open a tag is text.
///
/// # Errors
///
/// Returns an error if the input is not even tolerantly tokenizable (for
/// example a tag left open at end of input).
pub fn parse_html(html: &str) -> Result<Element, MarkupError> {
    let html = SCRIPT_OR_STYLE.replace_all(html, "");
    let html = escape_bare_lt(&html);
    let html = expand_named_entities(&html);

    let mut reader = Reader::from_str(&html);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.allow_dangling_amp = true;

    // stack[0] is the document root
    let mut stack = vec![Element::default()];

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let element = start_element(&e);
                if is_void(&element.tag) {
                    push_child(&mut stack, element);
                } else {
                    stack.push(element);
                }
            }
            Event::Empty(e) => push_child(&mut stack, start_element(&e)),
            Event::End(e) => {
                let tag = lossy(e.name().as_ref());
                if let Some(depth) = stack.iter().skip(1).rposition(|open| open.tag == tag) {
                    close_to(&mut stack, depth + 1);
                }
            }
            Event::Text(e) => append_text(&mut stack, &lossy(&e)),
            Event::GeneralRef(e) => append_text(&mut stack, &decode_reference(&lossy(&e))),
            Event::CData(e) => append_text(&mut stack, &lossy(&e)),
            Event::Eof => break,
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }

    close_to(&mut stack, 1);
    Ok(stack.pop().unwrap_or_default())
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn start_element(e: &BytesStart) -> Element {
    let mut element = Element::new(lossy(e.name().as_ref()));
    for attr in e.html_attributes().flatten() {
        let name = lossy(attr.key.as_ref());
        let value = attr
            .unescape_value()
            .map_or_else(|_| lossy(&attr.value), Cow::into_owned);
        element.attrs.push((name, value));
    }
    element
}

/// Attach `element` as the last child of the innermost open element.
fn push_child(stack: &mut [Element], element: Element) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    }
}

/// Pop open elements until only `len` remain, attaching each to its parent.
fn close_to(stack: &mut Vec<Element>, len: usize) {
    while stack.len() > len.max(1) {
        if let Some(element) = stack.pop() {
            push_child(stack, element);
        }
    }
}

/// Append text to the open element's text or its last child's tail.
fn append_text(stack: &mut [Element], text: &str) {
    let Some(node) = stack.last_mut() else {
        return;
    };
    if let Some(last_child) = node.children.last_mut() {
        last_child.tail.push_str(text);
    } else {
        node.text.push_str(text);
    }
}

/// Escape every `<` not followed by a tag name, `/`, `!` or `?`.
fn escape_bare_lt(html: &str) -> Cow<'_, str> {
    let opens_markup = |next: Option<char>| {
        next.is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'))
    };

    let mut chars = html.char_indices().peekable();
    let mut out: Option<String> = None;
    let mut copied = 0;
    while let Some((i, c)) = chars.next() {
        if c == '<' && !opens_markup(chars.peek().map(|&(_, next)| next)) {
            let buf = out.get_or_insert_with(|| String::with_capacity(html.len() + 8));
            buf.push_str(&html[copied..i]);
            buf.push_str("&lt;");
            copied = i + 1;
        }
    }
    match out {
        Some(mut buf) => {
            buf.push_str(&html[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(html),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::markup::serialize;

    use super::*;

    #[test]
    fn test_parse_nested_elements() {
        let doc = parse_html("<p><strong>Bold</strong> text</p>").unwrap();

        let p = &doc.children[0];
        assert_eq!(p.tag, "p");
        assert!(p.text.is_empty());
        assert_eq!(p.children[0].tag, "strong");
        assert_eq!(p.children[0].text, "Bold");
        assert_eq!(p.children[0].tail, " text");
    }

    #[test]
    fn test_void_elements_take_no_children() {
        let doc = parse_html(r#"<p>Before<br>After<img src="a.png">End</p>"#).unwrap();

        let p = &doc.children[0];
        assert_eq!(p.text, "Before");
        assert_eq!(p.children.len(), 2);
        assert_eq!(p.children[0].tag, "br");
        assert_eq!(p.children[0].tail, "After");
        assert_eq!(p.children[1].attr("src"), Some("a.png"));
        assert_eq!(p.children[1].tail, "End");
    }

    #[test]
    fn test_valueless_attributes() {
        let doc = parse_html(r#"<input type="checkbox" checked><span>x</span>"#).unwrap();

        let input = &doc.children[0];
        assert_eq!(input.attr("checked"), Some(""));
        assert_eq!(doc.children[1].tag, "span");
    }

    #[test]
    fn test_end_tag_closes_unclosed_children() {
        let doc = parse_html("<ul><li>One<li>Two</ul><p>After</p>").unwrap();

        assert_eq!(doc.children.len(), 2);
        assert_eq!(doc.children[0].tag, "ul");
        assert_eq!(doc.children[1].tag, "p");
    }

    #[test]
    fn test_stray_end_tag_ignored() {
        let doc = parse_html("<p>Text</span> more</p>").unwrap();

        let p = &doc.children[0];
        assert_eq!(p.text, "Text more");
    }

    #[test]
    fn test_entities_decoded() {
        let doc = parse_html("<p>a&nbsp;&lt;b&gt;&#38;&amp;</p>").unwrap();
        assert_eq!(doc.children[0].text, "a\u{00a0}<b>&&");
    }

    #[test]
    fn test_bare_less_than_is_text() {
        let doc = parse_html("<p>a < b</p>").unwrap();

        let p = &doc.children[0];
        assert_eq!(p.text, "a < b");
        assert!(p.children.is_empty());
        assert_eq!(serialize(p), "<p>a &lt; b</p>");
    }

    #[test]
    fn test_less_than_before_digit_or_end() {
        let doc = parse_html("<p>x<3</p><p>tail <").unwrap();
        assert_eq!(doc.children[0].text, "x<3");
        assert_eq!(doc.children[1].text, "tail <");
    }

    #[test]
    fn test_escape_bare_lt_borrows_clean_input() {
        assert!(matches!(escape_bare_lt("<p>ok</p>"), Cow::Borrowed(_)));
        assert_eq!(escape_bare_lt("1 <= 2</b>"), "1 &lt;= 2</b>");
    }

    #[test]
    fn test_attribute_entities_decoded() {
        let doc = parse_html(r#"<a href="?a=1&amp;b=2">x</a>"#).unwrap();
        assert_eq!(doc.children[0].attr("href"), Some("?a=1&b=2"));
    }

    #[test]
    fn test_whitespace_preserved() {
        let doc = parse_html("<pre>line 1\n  line 2\n</pre>").unwrap();
        assert_eq!(doc.children[0].text, "line 1\n  line 2\n");
    }

    #[test]
    fn test_doctype_comments_and_scripts_dropped() {
        let html = "<!DOCTYPE html><html><!-- note --><body><script>if (a < b) {}</script><p>x</p></body></html>";
        let doc = parse_html(html).unwrap();

        let body = &doc.children[0].children[0];
        assert_eq!(body.tag, "body");
        assert_eq!(body.children.len(), 1);
        assert_eq!(body.children[0].tag, "p");
    }

    #[test]
    fn test_attribute_order_kept() {
        let doc = parse_html(r#"<img width="50" src="a.png" align="left">"#).unwrap();
        let names: Vec<_> = doc.children[0]
            .attrs
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(names, vec!["width", "src", "align"]);
    }
}
