//! Column order recovery from a query's `RETURN` clause.
//!
//! Neo4j rows come back as maps, so the order the query author wrote the
//! projection in is recovered from the query text itself.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

fn return_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bRETURN\b(?:\s+DISTINCT\b)?").expect("valid regex"))
}

fn clause_end_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(?:ORDER\s+BY|SKIP|LIMIT|UNION)\b").expect("valid regex"))
}

fn alias_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\s+AS\s+(`[^`]+`|\w+)\s*$").expect("valid regex"))
}

/// Column names of the final `RETURN` projection, in order.
///
/// Returns an empty list when the query has no `RETURN` or uses `RETURN *`.
pub fn projection_columns(cypher: &str) -> Vec<String> {
    let Some(last) = keyword_matches(return_re(), cypher).pop() else {
        return Vec::new();
    };
    let rest = &cypher[last.end..];
    let body = match keyword_matches(clause_end_re(), rest).into_iter().next() {
        Some(m) => &rest[..m.start],
        None => rest,
    };

    split_top_level(body)
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty() && *item != "*")
        .map(column_name)
        .collect()
}

/// Matches of a keyword pattern that sit outside string literals and
/// backtick-quoted names and are not a property key (`d.limit`).
fn keyword_matches(re: &Regex, text: &str) -> Vec<Range<usize>> {
    let spans = quoted_spans(text);
    re.find_iter(text)
        .map(|m| m.range())
        .filter(|m| !spans.iter().any(|s| s.contains(&m.start)))
        .filter(|m| !text[..m.start].ends_with('.'))
        .collect()
}

/// Byte ranges covered by quotes, delimiters included.
fn quoted_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut open: Option<(char, usize)> = None;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        match open {
            Some(_) if escaped => escaped = false,
            Some((q, _)) if c == '\\' && q != '`' => escaped = true,
            Some((q, start)) if c == q => {
                spans.push(start..i + 1);
                open = None;
            }
            Some(_) => {}
            None if matches!(c, '"' | '\'' | '`') => open = Some((c, i)),
            None => {}
        }
    }
    if let Some((_, start)) = open {
        spans.push(start..text.len());
    }
    spans
}

fn column_name(item: &str) -> String {
    match alias_re().captures(item) {
        Some(caps) => caps[1].trim_matches('`').to_string(),
        None => item.to_string(),
    }
}

/// Split on commas that are not nested in brackets or string literals.
fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in body.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[' | '{') => depth += 1,
            (None, ')' | ']' | '}') => depth -= 1,
            (None, ',') if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}
