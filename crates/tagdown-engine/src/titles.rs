//! Title extraction for heading blocks.
//!
//! Anchor ids are generated from the ordinal position among *all* scanned
//! blocks, not only headings: a `<p>` before an `<h1>` still advances the
//! counter. Callers index sections by this scheme, so the quirk is part
//! of the contract.

use regex::Regex;
use std::sync::OnceLock;

/// A heading's extracted level, display text and generated anchor id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title {
    pub level: u8,
    pub text: String,
    pub id: String,
}

/// `"h3"` → `Some(3)`; non-heading tags → `None`.
pub fn heading_level(tag: &str) -> Option<u8> {
    let digit = tag.strip_prefix('h')?;
    match digit.parse::<u8>() {
        Ok(level @ 1..=6) => Some(level),
        _ => None,
    }
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag regex"))
}

/// Strip all markup, normalize whitespace, join with single spaces.
pub fn strip_tags(raw: &str) -> String {
    let without_tags = tag_regex().replace_all(raw, " ");
    without_tags
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract a heading block's title and rewrite its opening tag to carry
/// the generated id. `ordinal` is the 0-based position among all scanned
/// blocks. The rewrite only fires on a bare `<hN>` opener; an opener that
/// already carries attributes keeps them and loses the anchor, while the
/// title is still recorded.
pub fn extract_heading(raw: &str, level: u8, ordinal: usize, prefix: &str) -> (String, Title) {
    let title = Title {
        level,
        text: strip_tags(raw),
        id: format!("{prefix}{}", ordinal + 1),
    };
    let rewritten = raw.replace(
        &format!("<h{level}>"),
        &format!("<h{level} id=\"{}\">", title.id),
    );
    (rewritten, title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("h1", Some(1))]
    #[case("h6", Some(6))]
    #[case("h7", None)]
    #[case("p", None)]
    #[case("table", None)]
    fn test_heading_level(#[case] tag: &str, #[case] expected: Option<u8>) {
        assert_eq!(heading_level(tag), expected);
    }

    #[test]
    fn test_strip_tags_joins_fragments_with_single_spaces() {
        let text = strip_tags("<h1>A <code>b</code>   c</h1>");

        assert_eq!(text, "A b c");
    }

    #[test]
    fn test_strip_tags_on_plain_heading() {
        assert_eq!(strip_tags("<h2>Title 2</h2>"), "Title 2");
    }

    #[test]
    fn test_extract_heading_rewrites_opening_tag() {
        let (rewritten, title) = extract_heading("<h1>Intro</h1>", 1, 0, "section");

        assert_eq!(rewritten, "<h1 id=\"section1\">Intro</h1>");
        assert_eq!(
            title,
            Title {
                level: 1,
                text: "Intro".to_string(),
                id: "section1".to_string(),
            }
        );
    }

    #[test]
    fn test_extract_heading_with_attributes_keeps_title_but_not_anchor() {
        let raw = "<h2 class=\"big\">T</h2>";

        let (rewritten, title) = extract_heading(raw, 2, 3, "section");

        assert_eq!(rewritten, raw);
        assert_eq!(title.id, "section4");
        assert_eq!(title.text, "T");
    }

    #[test]
    fn test_id_uses_one_based_ordinal() {
        let (_, title) = extract_heading("<h3>x</h3>", 3, 7, "section");

        assert_eq!(title.id, "section8");
    }
}
