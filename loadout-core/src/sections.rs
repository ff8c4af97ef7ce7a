//! Idempotent marker-delimited sections inside a shared file.
//!
//! A section named `key` is materialized as
//!
//! ```text
//! <!-- start: key -->
//! body
//! <!-- end: key -->
//! ```
//!
//! [`replace_section`] rewrites every `start … end` pair for `key` (shortest
//! match, all occurrences) or appends a new block when none exists. The key is
//! matched as a literal string, so characters such as `.*+?()[]{}|^$\` carry
//! no special meaning.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::NamedSection;

/// `<!-- start: {key} -->`
pub fn start_marker(key: &str) -> String {
    format!("<!-- start: {key} -->")
}

/// `<!-- end: {key} -->`
pub fn end_marker(key: &str) -> String {
    format!("<!-- end: {key} -->")
}

/// Replace (or append) the section `key` in `current` with `body`.
///
/// Every occurrence of the marker pair is rewritten to the same block, so a
/// file that accumulated duplicate blocks converges to one consistent value.
/// Content outside the matched blocks is preserved byte for byte.
pub fn replace_section(current: &str, key: &str, body: &str) -> String {
    let start = start_marker(key);
    let end = end_marker(key);
    let block = format!("{start}\n{body}\n{end}");

    let mut out = String::with_capacity(current.len() + block.len() + 1);
    let mut rest = current;
    let mut matched = false;

    while let Some(open) = rest.find(&start) {
        let body_from = open + start.len();
        let Some(close) = rest[body_from..].find(&end) else {
            break;
        };
        let block_to = body_from + close + end.len();
        out.push_str(&rest[..open]);
        out.push_str(&block);
        rest = &rest[block_to..];
        matched = true;
    }

    if !matched {
        return format!("{current}\n{block}");
    }
    out.push_str(rest);
    out
}

/// Apply every section in order. Later sections with the same key win.
pub fn merge_sections(current: &str, sections: &[NamedSection]) -> String {
    sections
        .iter()
        .fold(current.to_string(), |acc, s| replace_section(&acc, &s.key, &s.content))
}

/// Marker keys present in `content`, in first-seen order, without duplicates.
pub fn section_keys(content: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for caps in start_re().captures_iter(content) {
        let key = caps[1].to_string();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// True when only whitespace and empty marker pairs remain.
///
/// A shared file in that state carries nothing and can be deleted.
/// A start marker only pairs with the end marker of the same key.
pub fn is_effectively_empty(content: &str) -> bool {
    section_keys(content)
        .iter()
        .fold(content.to_string(), |acc, key| strip_empty_blocks(&acc, key))
        .trim()
        .is_empty()
}

/// Drop every `start … end` pair for `key` with only whitespace between.
fn strip_empty_blocks(content: &str, key: &str) -> String {
    let start = start_marker(key);
    let end = end_marker(key);

    let mut out = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(open) = rest.find(&start) {
        let after = &rest[open + start.len()..];
        let body = after.len() - after.trim_start().len();
        if after[body..].starts_with(&end) {
            out.push_str(&rest[..open]);
            rest = &after[body + end.len()..];
        } else {
            out.push_str(&rest[..open + start.len()]);
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

fn start_re() -> &'static Regex {
    static START_RE: OnceLock<Regex> = OnceLock::new();
    START_RE.get_or_init(|| Regex::new(r"<!-- start: (.+?) -->").unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn appends_to_empty_content() {
        assert_eq!(
            replace_section("", "k", "v"),
            "\n<!-- start: k -->\nv\n<!-- end: k -->"
        );
    }

    #[test]
    fn append_preserves_existing_content() {
        let before = "# Title\n\nhand-written notes\n";
        let out = replace_section(before, "k", "v");
        assert!(out.starts_with(before));
        assert!(out.ends_with("<!-- start: k -->\nv\n<!-- end: k -->"));
    }

    #[test]
    fn replaces_existing_block_in_place() {
        let current = "head\n<!-- start: k -->\nold\n<!-- end: k -->\ntail";
        assert_eq!(
            replace_section(current, "k", "new"),
            "head\n<!-- start: k -->\nnew\n<!-- end: k -->\ntail"
        );
    }

    #[test]
    fn rewrites_every_duplicate_block() {
        let current = "<!-- start: k -->\na\n<!-- end: k -->\nmid\n<!-- start: k -->\nb\n<!-- end: k -->";
        let out = replace_section(current, "k", "v");
        assert_eq!(
            out,
            "<!-- start: k -->\nv\n<!-- end: k -->\nmid\n<!-- start: k -->\nv\n<!-- end: k -->"
        );
    }

    #[test]
    fn match_is_non_greedy() {
        let current = "<!-- start: k -->\na\n<!-- end: k -->\nkeep me\n<!-- end: k -->";
        let out = replace_section(current, "k", "v");
        assert!(out.contains("keep me"));
    }

    #[test]
    fn unterminated_start_marker_appends() {
        let current = "<!-- start: k -->\ndangling";
        let out = replace_section(current, "k", "v");
        assert!(out.starts_with(current));
        assert!(out.ends_with("<!-- start: k -->\nv\n<!-- end: k -->"));
    }

    #[test]
    fn body_with_dollar_signs_is_inserted_verbatim() {
        let out = replace_section("", "k", "cost: $1 and ${name}");
        assert!(out.contains("cost: $1 and ${name}"));
    }

    #[rstest]
    #[case("plain")]
    #[case(".*+?^${}()|[]\\")]
    #[case("loadout standards (v2) [beta]")]
    #[case("a|b")]
    fn replace_is_idempotent(#[case] key: &str) {
        for start in ["", "prefix\n", "x\n<!-- start: other -->\no\n<!-- end: other -->\n"] {
            let once = replace_section(start, key, "body\nline 2");
            let twice = replace_section(&once, key, "body\nline 2");
            assert_eq!(once, twice, "key {key:?} over {start:?}");
        }
    }

    #[test]
    fn metacharacter_key_does_not_match_other_keys() {
        let current = "<!-- start: ab -->\nx\n<!-- end: ab -->";
        let out = replace_section(current, "a.", "y");
        assert!(out.contains("<!-- start: ab -->\nx\n<!-- end: ab -->"));
        assert!(out.ends_with("<!-- start: a. -->\ny\n<!-- end: a. -->"));
    }

    #[test]
    fn independent_sections_coexist() {
        let a = replace_section("", "k1", "v1");
        let b = replace_section(&a, "k2", "v2");
        assert!(b.contains("v1") && b.contains("v2"));

        let c = replace_section(&b, "k1", "v3");
        assert!(c.contains("<!-- start: k2 -->\nv2\n<!-- end: k2 -->"));
        assert!(!c.contains("v1"));
        assert!(c.contains("v3"));
    }

    #[test]
    fn section_order_does_not_matter() {
        let ab = replace_section(&replace_section("", "a", "1"), "b", "2");
        let ba = replace_section(&replace_section("", "b", "2"), "a", "1");
        for out in [&ab, &ba] {
            assert!(out.contains("<!-- start: a -->\n1\n<!-- end: a -->"));
            assert!(out.contains("<!-- start: b -->\n2\n<!-- end: b -->"));
        }
    }

    #[test]
    fn cleared_section_keeps_markers_and_rest_of_file() {
        let current = "intro\n<!-- start: k -->\nold\n<!-- end: k -->";
        let out = replace_section(current, "k", "");
        assert_eq!(out, "intro\n<!-- start: k -->\n\n<!-- end: k -->");
    }

    #[test]
    fn merge_sections_applies_all() {
        let out = merge_sections(
            "",
            &[NamedSection::cleared("recipes"), NamedSection::new("standards", "s")],
        );
        assert_eq!(section_keys(&out), vec!["recipes", "standards"]);
        assert!(out.contains("<!-- start: standards -->\ns\n<!-- end: standards -->"));
    }

    #[test]
    fn effectively_empty_detection() {
        assert!(is_effectively_empty(""));
        assert!(is_effectively_empty("\n<!-- start: k -->\n\n<!-- end: k -->\n"));
        assert!(is_effectively_empty(&merge_sections(
            "",
            &[NamedSection::cleared("a"), NamedSection::cleared("b")]
        )));
        assert!(!is_effectively_empty("\n<!-- start: k -->\nv\n<!-- end: k -->"));
        assert!(!is_effectively_empty("notes\n<!-- start: k -->\n\n<!-- end: k -->"));
    }

    #[rstest]
    #[case::mismatched_keys("<!-- start: a -->\n<!-- end: b -->")]
    #[case::text_inside_first_pair("<!-- start: k --> notes <!-- end: k --><!-- end: k -->")]
    #[case::end_before_start("<!-- end: k -->\n<!-- start: k -->")]
    fn only_matching_empty_pairs_count_as_empty(#[case] content: &str) {
        assert!(!is_effectively_empty(content));
    }

    #[test]
    fn several_empty_pairs_are_empty() {
        assert!(is_effectively_empty(
            "<!-- start: a -->\n<!-- end: a -->\n\n<!-- start: b --> <!-- end: b -->\n"
        ));
    }

    #[test]
    fn large_input_is_handled() {
        let filler = "lorem ipsum\n".repeat(200_000);
        let current = format!("{filler}<!-- start: k -->\nold\n<!-- end: k -->\n{filler}");
        let out = replace_section(&current, "k", "new");
        assert_eq!(out.len(), current.len());
        assert!(out.contains("<!-- start: k -->\nnew\n<!-- end: k -->"));
    }
}
