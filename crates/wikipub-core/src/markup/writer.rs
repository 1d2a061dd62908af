//! Element tree serializer producing storage-format XHTML.

use std::fmt::Write;

use super::{Element, is_void};

/// Serialize an element including its own tags (tail excluded).
#[must_use]
pub fn serialize(element: &Element) -> String {
    let mut out = String::with_capacity(1024);
    write_element(element, &mut out, false);
    out
}

/// Serialize the content of an element: its text and children with their tails.
#[must_use]
pub fn serialize_inner(element: &Element) -> String {
    let mut out = String::with_capacity(4096);
    escape_into(&element.text, false, &mut out);
    for child in &element.children {
        write_element(child, &mut out, true);
    }
    out
}

fn write_element(element: &Element, out: &mut String, with_tail: bool) {
    out.push('<');
    out.push_str(&element.tag);

    for (name, value) in &element.attrs {
        let _ = write!(out, " {name}=\"");
        escape_into(value, true, out);
        out.push('"');
    }

    let is_empty = element.text.is_empty() && element.children.is_empty();
    if is_void(&element.tag) || (is_empty && is_macro_tag(&element.tag)) {
        out.push_str(" />");
        // Content attached to a void element is written after it.
        if is_void(&element.tag) && !is_empty {
            escape_into(&element.text, false, out);
            for child in &element.children {
                write_element(child, out, true);
            }
        }
    } else {
        out.push('>');
        escape_into(&element.text, false, out);
        for child in &element.children {
            write_element(child, out, true);
        }
        let _ = write!(out, "</{}>", element.tag);
    }

    if with_tail {
        escape_into(&element.tail, false, out);
    }
}

/// Confluence macro elements (`ac:`, `ri:`) self-close when empty.
fn is_macro_tag(tag: &str) -> bool {
    tag.starts_with("ac:") || tag.starts_with("ri:")
}

/// Escape XML special characters.
fn escape_into(text: &str, in_attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}
