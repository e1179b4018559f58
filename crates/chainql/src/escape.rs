//! String escaping for literal values and identifiers.
//!
//! Two literal styles are provided:
//!
//! - [`escape_backslash`] matches MySQL's `real_escape_string`.
//! - [`escape_quote_doubling`] is standard SQL (Postgres with
//!   `standard_conforming_strings = on`).
//!
//! Both produce text meant to sit between single quotes; neither adds the quotes.

/// Backslash-escape a value the way MySQL's `real_escape_string` does.
pub fn escape_backslash(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\x1a' => out.push_str("\\Z"),
            c => out.push(c),
        }
    }
    out
}

/// Escape a value by doubling single quotes.
pub fn escape_quote_doubling(value: &str) -> String {
    value.replace('\'', "''")
}

/// Wrap a column name in backticks, doubling any embedded backtick.
pub fn backtick(column: &str) -> String {
    format!("`{}`", column.replace('`', "``"))
}

/// Wrap a column name in double quotes, doubling any embedded double quote.
pub fn double_quote(column: &str) -> String {
    format!("\"{}\"", column.replace('"', "\"\""))
}

/// Whether a predicate key already carries its own comparison operator.
///
/// Keys such as `age >=` or `id !=` are emitted as written; only their value is
/// quoted. A column whose name literally contains one of `! = < >` is treated the
/// same way and cannot be quoted through this path.
pub(crate) fn has_comparison_operator(key: &str) -> bool {
    key.contains(['!', '=', '<', '>'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backslash_style_matches_mysql() {
        assert_eq!(escape_backslash("O'Brien"), r"O\'Brien");
        assert_eq!(escape_backslash("a\\b"), r"a\\b");
        assert_eq!(escape_backslash("line\nbreak"), r"line\nbreak");
        assert_eq!(escape_backslash("say \"hi\""), r#"say \"hi\""#);
        assert_eq!(escape_backslash("nul\0"), r"nul\0");
        assert_eq!(escape_backslash("plain"), "plain");
    }

    #[test]
    fn quote_doubling_only_touches_single_quotes() {
        assert_eq!(escape_quote_doubling("O'Brien"), "O''Brien");
        assert_eq!(escape_quote_doubling(r"a\b"), r"a\b");
    }

    #[test]
    fn identifiers_double_their_quote_char() {
        assert_eq!(backtick("age"), "`age`");
        assert_eq!(backtick("we`ird"), "`we``ird`");
        assert_eq!(double_quote("age"), "\"age\"");
        assert_eq!(double_quote("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn operator_sniffing() {
        assert!(has_comparison_operator("age >="));
        assert!(has_comparison_operator("id !="));
        assert!(has_comparison_operator("a<b"));
        assert!(!has_comparison_operator("created_at"));
    }
}
