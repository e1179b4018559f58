//! Clause storage for the SELECT accumulator.
//!
//! Every clause is either a list of [`Fragment`]s merged with their joiners, or
//! a verbatim override supplied by the caller. Input text is classified once, when
//! it reaches a setter: text that begins with the clause's own keyword becomes
//! [`Clause::Verbatim`] and is emitted exactly as given.

use std::fmt;

/// Named segments of a SELECT statement, in the order they are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Select,
    From,
    Join,
    Where,
    GroupBy,
    Having,
    OrderBy,
    Limit,
}

impl Keyword {
    /// Fixed SQL clause order.
    pub const ORDER: [Keyword; 8] = [
        Keyword::Select,
        Keyword::From,
        Keyword::Join,
        Keyword::Where,
        Keyword::GroupBy,
        Keyword::Having,
        Keyword::OrderBy,
        Keyword::Limit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Select => "SELECT",
            Keyword::From => "FROM",
            Keyword::Join => "JOIN",
            Keyword::Where => "WHERE",
            Keyword::GroupBy => "GROUP BY",
            Keyword::Having => "HAVING",
            Keyword::OrderBy => "ORDER BY",
            Keyword::Limit => "LIMIT",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }

    /// Whether `text` opens with this keyword, i.e. is a complete clause.
    ///
    /// JOIN fragments are complete as soon as they mention `JOIN` anywhere
    /// (`LEFT JOIN ...`, `NATURAL JOIN ...`).
    pub fn opens(self, text: &str) -> bool {
        match self {
            Keyword::Join => contains_keyword(text, "JOIN"),
            kw => starts_with_keyword(text.trim_start(), kw.as_str()),
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive keyword test at the start of `s`, on a word boundary.
pub(crate) fn starts_with_keyword(s: &str, keyword: &str) -> bool {
    match s.get(0..keyword.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(keyword) => s[keyword.len()..]
            .chars()
            .next()
            .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '_')),
        _ => false,
    }
}

fn contains_keyword(s: &str, keyword: &str) -> bool {
    s.char_indices().any(|(i, _)| {
        let before_ok = s[..i]
            .chars()
            .next_back()
            .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '_'));
        before_ok && starts_with_keyword(&s[i..], keyword)
    })
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// How a fragment attaches to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joiner {
    And,
    Or,
    Comma,
    Space,
}

impl Joiner {
    pub fn as_str(self) -> &'static str {
        match self {
            Joiner::And => " AND ",
            Joiner::Or => " OR ",
            Joiner::Comma => ", ",
            Joiner::Space => " ",
        }
    }
}

/// One merged piece of a structured clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Ignored for the first fragment of a clause.
    pub joiner: Joiner,
    pub text: String,
}

/// The accumulated body of a single clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// Merged fragments; the keyword is added when rendering.
    Structured(Vec<Fragment>),
    /// Caller-supplied clause text that already carries its keyword.
    Verbatim(String),
}

impl Default for Clause {
    fn default() -> Self {
        Clause::Structured(Vec::new())
    }
}

impl Clause {
    /// A structured clause with a single fragment.
    pub fn single(text: impl Into<String>) -> Self {
        Clause::Structured(vec![Fragment {
            joiner: Joiner::Space,
            text: text.into(),
        }])
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Clause::Structured(parts) => parts.iter().all(|part| is_blank(&part.text)),
            Clause::Verbatim(text) => text.trim().is_empty(),
        }
    }

    pub fn is_verbatim(&self) -> bool {
        matches!(self, Clause::Verbatim(_))
    }

    /// The clause text without any keyword added.
    pub fn body(&self) -> String {
        match self {
            Clause::Verbatim(text) => text.clone(),
            Clause::Structured(parts) => {
                let mut out = String::new();
                for part in parts.iter().filter(|part| !is_blank(&part.text)) {
                    if !out.is_empty() {
                        out.push_str(part.joiner.as_str());
                    }
                    out.push_str(&part.text);
                }
                out
            }
        }
    }

    /// Merge another fragment onto the end of the clause.
    ///
    /// Merging onto a verbatim clause extends its text with the same joiner.
    /// Blank text is ignored.
    pub(crate) fn push(&mut self, joiner: Joiner, text: impl Into<String>) {
        let text = text.into();
        if is_blank(&text) {
            return;
        }
        match self {
            Clause::Structured(parts) => parts.push(Fragment { joiner, text }),
            Clause::Verbatim(existing) => {
                existing.push_str(joiner.as_str());
                existing.push_str(&text);
            }
        }
    }

    /// Render the clause for `keyword`, or `None` when it has nothing to emit.
    pub fn render(&self, keyword: Keyword) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        match self {
            Clause::Verbatim(text) => Some(text.trim().to_string()),
            Clause::Structured(_) if keyword == Keyword::Join => Some(self.body()),
            Clause::Structured(_) => Some(format!("{} {}", keyword, self.body())),
        }
    }
}

/// Clause state of a SELECT under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clauses {
    slots: [Clause; 8],
}

impl Default for Clauses {
    fn default() -> Self {
        let mut slots: [Clause; 8] = Default::default();
        slots[Keyword::Select.slot()] = Clause::single("*");
        Self { slots }
    }
}

impl Clauses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, keyword: Keyword) -> &Clause {
        &self.slots[keyword.slot()]
    }

    fn get_mut(&mut self, keyword: Keyword) -> &mut Clause {
        &mut self.slots[keyword.slot()]
    }

    /// Whether every clause is back at its default.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    /// Replace a clause outright.
    pub(crate) fn set(&mut self, keyword: Keyword, clause: Clause) {
        *self.get_mut(keyword) = clause;
    }

    /// Replace a clause with caller text, classifying it as verbatim or structured.
    ///
    /// Blank text clears the clause.
    pub(crate) fn replace(&mut self, keyword: Keyword, text: impl Into<String>) {
        let text = text.into();
        let clause = if is_blank(&text) {
            Clause::default()
        } else if keyword.opens(&text) && keyword != Keyword::Join {
            Clause::Verbatim(text)
        } else {
            Clause::single(text)
        };
        self.set(keyword, clause);
    }

    /// Merge caller text into a clause.
    ///
    /// Text that opens with the clause keyword overrides the whole clause.
    /// Blank text leaves the clause as it was.
    pub(crate) fn append(&mut self, keyword: Keyword, joiner: Joiner, text: impl Into<String>) {
        let text = text.into();
        if is_blank(&text) {
            return;
        }
        if keyword != Keyword::Join && keyword.opens(&text) {
            self.set(keyword, Clause::Verbatim(text));
        } else {
            self.get_mut(keyword).push(joiner, text);
        }
    }

    /// Prefix the SELECT list with `DISTINCT` (once).
    pub(crate) fn distinct(&mut self) {
        match self.get_mut(Keyword::Select) {
            Clause::Structured(parts) => match parts.first_mut() {
                Some(first) if !starts_with_keyword(&first.text, "DISTINCT") => {
                    first.text = format!("DISTINCT {}", first.text);
                }
                Some(_) => {}
                None => parts.push(Fragment {
                    joiner: Joiner::Space,
                    text: "DISTINCT *".to_string(),
                }),
            },
            Clause::Verbatim(text) => {
                let trimmed = text.trim_start();
                let rest = trimmed
                    .get(Keyword::Select.as_str().len()..)
                    .unwrap_or_default()
                    .trim_start();
                if !starts_with_keyword(rest, "DISTINCT") {
                    *text = format!("SELECT DISTINCT {}", rest);
                }
            }
        }
    }

    /// Assemble the SELECT statement: non-empty clauses in fixed order, single-spaced.
    pub fn render_select(&self) -> String {
        Keyword::ORDER
            .iter()
            .filter_map(|&kw| self.get(kw).render(kw))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The current FROM target, if one is set.
    pub(crate) fn table(&self) -> Option<String> {
        let from = self.get(Keyword::From);
        if from.is_empty() {
            return None;
        }
        let body = from.body();
        let body = body.trim();
        let table = if from.is_verbatim() {
            body.get(Keyword::From.as_str().len()..)
                .unwrap_or_default()
                .trim_start()
        } else {
            body
        };
        (!table.is_empty()).then(|| table.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_render_select_star_only() {
        let clauses = Clauses::new();
        assert_eq!(clauses.render_select(), "SELECT *");
        assert!(clauses.is_default());
    }

    #[test]
    fn keyword_detection_respects_word_boundary() {
        assert!(starts_with_keyword("SELECT a", "SELECT"));
        assert!(starts_with_keyword("select a", "SELECT"));
        assert!(starts_with_keyword("LIMIT", "LIMIT"));
        assert!(!starts_with_keyword("selected_at", "SELECT"));
        assert!(!starts_with_keyword("SEL", "SELECT"));
        assert!(Keyword::GroupBy.opens("  group by a"));
        assert!(Keyword::Join.opens("LEFT JOIN t ON a = b"));
        assert!(!Keyword::Join.opens("joined_table"));
    }

    #[test]
    fn structured_fragments_merge_with_their_joiners() {
        let mut clauses = Clauses::new();
        clauses.append(Keyword::Where, Joiner::And, "a = '1'");
        clauses.append(Keyword::Where, Joiner::Or, "b = '2'");
        clauses.append(Keyword::Where, Joiner::And, "c = '3'");
        assert_eq!(
            clauses.get(Keyword::Where).render(Keyword::Where).as_deref(),
            Some("WHERE a = '1' OR b = '2' AND c = '3'")
        );
    }

    #[test]
    fn keyword_text_becomes_verbatim_and_still_merges() {
        let mut clauses = Clauses::new();
        clauses.append(Keyword::Where, Joiner::And, "x = 1");
        clauses.append(Keyword::Where, Joiner::And, "WHERE id = 5");
        assert!(clauses.get(Keyword::Where).is_verbatim());

        clauses.append(Keyword::Where, Joiner::Or, "id = 6");
        assert_eq!(
            clauses.get(Keyword::Where).render(Keyword::Where).as_deref(),
            Some("WHERE id = 5 OR id = 6")
        );
    }

    #[test]
    fn replace_classifies_text() {
        let mut clauses = Clauses::new();
        clauses.replace(Keyword::Select, "SELECT a, b");
        clauses.replace(Keyword::From, "t");
        assert_eq!(clauses.render_select(), "SELECT a, b FROM t");

        clauses.replace(Keyword::Select, "a");
        assert_eq!(clauses.render_select(), "SELECT a FROM t");
    }

    #[test]
    fn distinct_applies_once_to_either_form() {
        let mut clauses = Clauses::new();
        clauses.distinct();
        clauses.distinct();
        assert_eq!(clauses.render_select(), "SELECT DISTINCT *");

        clauses.replace(Keyword::Select, "SELECT name");
        clauses.distinct();
        assert_eq!(clauses.render_select(), "SELECT DISTINCT name");
    }

    #[test]
    fn table_strips_verbatim_keyword() {
        let mut clauses = Clauses::new();
        assert_eq!(clauses.table(), None);
        clauses.replace(Keyword::From, "users");
        assert_eq!(clauses.table().as_deref(), Some("users"));
        clauses.replace(Keyword::From, "FROM users u");
        assert_eq!(clauses.table().as_deref(), Some("users u"));
    }

    #[test]
    fn blank_text_never_makes_a_clause() {
        let mut clauses = Clauses::new();
        clauses.replace(Keyword::From, "t");
        clauses.append(Keyword::GroupBy, Joiner::Comma, "");
        clauses.append(Keyword::OrderBy, Joiner::Comma, "  ");
        clauses.replace(Keyword::Limit, "");
        assert!(clauses.get(Keyword::GroupBy).is_empty());
        assert_eq!(clauses.render_select(), "SELECT * FROM t");

        clauses.append(Keyword::GroupBy, Joiner::Comma, "a");
        clauses.append(Keyword::GroupBy, Joiner::Comma, "");
        assert_eq!(clauses.render_select(), "SELECT * FROM t GROUP BY a");

        let blank = Clause::Structured(vec![Fragment {
            joiner: Joiner::Space,
            text: " ".to_string(),
        }]);
        assert!(blank.is_empty());
        assert_eq!(blank.render(Keyword::Where), None);
    }

    #[test]
    fn blank_table_is_no_table() {
        let mut clauses = Clauses::new();
        clauses.replace(Keyword::From, "");
        assert_eq!(clauses.table(), None);
        clauses.replace(Keyword::From, "FROM ");
        assert_eq!(clauses.table(), None);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut clauses = Clauses::new();
        clauses.replace(Keyword::From, "t");
        clauses.append(Keyword::OrderBy, Joiner::Comma, "a");
        assert!(!clauses.is_default());
        clauses.reset();
        assert!(clauses.is_default());
    }
}
