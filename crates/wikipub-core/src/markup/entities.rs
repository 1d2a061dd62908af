//! Character reference handling for HTML input.
//!
//! Generated HTML uses named entities that XML does not know (`&nbsp;`,
//! `&rarr;`). They are turned into characters before parsing; the five XML
//! entities and numeric references are resolved by [`decode_reference`].

use std::sync::LazyLock;

use regex::Regex;

static NAMED_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&([a-zA-Z][a-zA-Z0-9]*);").expect("invalid entity regex"));

/// HTML named entities that are not predefined in XML.
const NAMED_ENTITIES: &[(&str, char)] = &[
    // Spacing
    ("nbsp", '\u{00a0}'),
    ("ensp", '\u{2002}'),
    ("emsp", '\u{2003}'),
    ("thinsp", '\u{2009}'),
    ("zwsp", '\u{200b}'),
    ("zwnj", '\u{200c}'),
    ("zwj", '\u{200d}'),
    ("shy", '\u{00ad}'),
    // Punctuation
    ("mdash", '\u{2014}'),
    ("ndash", '\u{2013}'),
    ("ldquo", '\u{201c}'),
    ("rdquo", '\u{201d}'),
    ("lsquo", '\u{2018}'),
    ("rsquo", '\u{2019}'),
    ("sbquo", '\u{201a}'),
    ("bdquo", '\u{201e}'),
    ("laquo", '\u{00ab}'),
    ("raquo", '\u{00bb}'),
    ("lsaquo", '\u{2039}'),
    ("rsaquo", '\u{203a}'),
    ("bull", '\u{2022}'),
    ("hellip", '\u{2026}'),
    ("middot", '\u{00b7}'),
    ("iexcl", '\u{00a1}'),
    ("iquest", '\u{00bf}'),
    ("dagger", '\u{2020}'),
    ("Dagger", '\u{2021}'),
    ("prime", '\u{2032}'),
    ("Prime", '\u{2033}'),
    // Arrows
    ("rarr", '\u{2192}'),
    ("larr", '\u{2190}'),
    ("harr", '\u{2194}'),
    ("uarr", '\u{2191}'),
    ("darr", '\u{2193}'),
    ("rArr", '\u{21d2}'),
    ("lArr", '\u{21d0}'),
    ("hArr", '\u{21d4}'),
    // Math
    ("le", '\u{2264}'),
    ("ge", '\u{2265}'),
    ("ne", '\u{2260}'),
    ("asymp", '\u{2248}'),
    ("equiv", '\u{2261}'),
    ("plusmn", '\u{00b1}'),
    ("times", '\u{00d7}'),
    ("divide", '\u{00f7}'),
    ("minus", '\u{2212}'),
    ("infin", '\u{221e}'),
    ("deg", '\u{00b0}'),
    ("micro", '\u{00b5}'),
    ("frac14", '\u{00bc}'),
    ("frac12", '\u{00bd}'),
    ("frac34", '\u{00be}'),
    ("sup1", '\u{00b9}'),
    ("sup2", '\u{00b2}'),
    ("sup3", '\u{00b3}'),
    // Symbols
    ("copy", '\u{00a9}'),
    ("reg", '\u{00ae}'),
    ("trade", '\u{2122}'),
    ("para", '\u{00b6}'),
    ("sect", '\u{00a7}'),
    ("euro", '\u{20ac}'),
    ("pound", '\u{00a3}'),
    ("yen", '\u{00a5}'),
    ("cent", '\u{00a2}'),
    ("check", '\u{2713}'),
    ("cross", '\u{2717}'),
];

/// Replace HTML named entities with the characters they stand for.
///
/// XML entities (`amp`, `lt`, `gt`, `quot`, `apos`) and unknown names are
/// left for the XML reader.
pub(crate) fn expand_named_entities(html: &str) -> String {
    NAMED_ENTITY
        .replace_all(html, |caps: &regex::Captures| {
            named_entity(&caps[1]).map_or_else(|| caps[0].to_owned(), String::from)
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    NAMED_ENTITIES
        .iter()
        .find(|(entity, _)| *entity == name)
        .map(|&(_, ch)| ch)
}

/// Resolve the body of a `&...;` reference left in the XML stream.
///
/// Unknown references are kept literally.
pub(crate) fn decode_reference(reference: &str) -> String {
    let resolved = match reference {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        s if s.starts_with("#x") || s.starts_with("#X") => {
            u32::from_str_radix(&s[2..], 16).ok().and_then(char::from_u32)
        }
        s if s.starts_with('#') => s[1..].parse::<u32>().ok().and_then(char::from_u32),
        s => named_entity(s),
    };
    resolved.map_or_else(|| format!("&{reference};"), String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_nbsp_and_arrows() {
        assert_eq!(
            expand_named_entities("Next&nbsp;&rarr;"),
            "Next\u{00a0}\u{2192}"
        );
    }

    #[test]
    fn test_expand_keeps_xml_entities() {
        assert_eq!(expand_named_entities("&amp;&lt;&gt;"), "&amp;&lt;&gt;");
    }

    #[test]
    fn test_expand_keeps_unknown_entities() {
        assert_eq!(expand_named_entities("&bogus;"), "&bogus;");
    }

    #[test]
    fn test_decode_xml_references() {
        assert_eq!(decode_reference("lt"), "<");
        assert_eq!(decode_reference("amp"), "&");
        assert_eq!(decode_reference("quot"), "\"");
    }

    #[test]
    fn test_decode_numeric_references() {
        assert_eq!(decode_reference("#60"), "<");
        assert_eq!(decode_reference("#x2014"), "\u{2014}");
        assert_eq!(decode_reference("#XA0"), "\u{00a0}");
    }

    #[test]
    fn test_decode_invalid_reference_kept() {
        assert_eq!(decode_reference("#xZZ"), "&#xZZ;");
        assert_eq!(decode_reference("nope"), "&nope;");
    }
}
