//! Protections table for one identity
//!
//! Holds the rules the server returned for a single user/IP pair, in
//! receipt order. Order is load-bearing: later rules overlay earlier ones.

use tracing::{debug, trace};

use crate::error::{ParseError, ParseResult};
use crate::protections::rule::{ProtectionEntry, Rule};

/// Ordered, immutable rule sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<Rule>,
    case_sensitive: bool,
}

impl RuleTable {
    /// Parse raw protections lines
    ///
    /// Fails on the first line that does not follow the grammar; no partial
    /// table is ever produced.
    pub fn from_lines<I, S>(lines: I, case_sensitive: bool) -> ParseResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Vec::new();
        for (index, line) in lines.into_iter().enumerate() {
            let line = line.as_ref();
            let rule = Rule::parse(line, case_sensitive)
                .map_err(|kind| ParseError::new(index + 1, line, kind))?;
            trace!(line = index + 1, rule = %rule, "Parsed protections line");
            rules.push(rule);
        }

        debug!(rules = rules.len(), case_sensitive, "Built protections table");
        Ok(Self {
            rules,
            case_sensitive,
        })
    }

    /// Build from tagged `protects` records
    pub fn from_entries(entries: &[ProtectionEntry], case_sensitive: bool) -> ParseResult<Self> {
        let rules = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                Rule::from_entry(entry, case_sensitive)
                    .map_err(|kind| ParseError::new(index + 1, entry.to_string(), kind))
            })
            .collect::<ParseResult<Vec<_>>>()?;

        debug!(rules = rules.len(), case_sensitive, "Built protections table from entries");
        Ok(Self {
            rules,
            case_sensitive,
        })
    }

    /// A table with no rules; denies everything
    pub fn empty(case_sensitive: bool) -> Self {
        Self {
            rules: Vec::new(),
            case_sensitive,
        }
    }

    /// Rules, oldest first
    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }
}

impl<'a> IntoIterator for &'a RuleTable {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuleError;
    use crate::protections::AccessMode;

    #[test]
    fn test_from_lines_preserves_order() {
        let table = RuleTable::from_lines(
            [
                "list user foo 1.2.3.4 -//...",
                "read user foo 1.2.3.4 //depot/a/b/foo",
            ],
            true,
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        let modes: Vec<_> = table.iter().map(Rule::mode).collect();
        assert_eq!(modes, vec![AccessMode::List, AccessMode::Read]);
        assert!(table.rules()[0].is_exclude());
        assert!(table.case_sensitive());
    }

    #[test]
    fn test_from_lines_fails_closed() {
        let err = RuleTable::from_lines(
            [
                "write user foo * //foo/...",
                "bogus",
                "read user foo * //bar/...",
            ],
            true,
        )
        .unwrap_err();

        assert_eq!(err.line, 2);
        assert_eq!(err.text, "bogus");
        assert_eq!(err.kind, RuleError::Malformed);
    }

    #[test]
    fn test_empty_table() {
        let table = RuleTable::from_lines(Vec::<String>::new(), false).unwrap();
        assert!(table.is_empty());
        assert_eq!(table, RuleTable::empty(false));
    }

    #[test]
    fn test_from_entries() {
        let entries: Vec<ProtectionEntry> = serde_json::from_str(
            r#"[
                {"perm":"write","host":"*","user":"foo","line":"1","depotFile":"//foo/..."},
                {"perm":"=open","host":"*","user":"foo","line":"2","depotFile":"//foo/...","unmap":""}
            ]"#,
        )
        .unwrap();

        let table = RuleTable::from_entries(&entries, true).unwrap();
        assert_eq!(table.len(), 2);
        assert!(!table.rules()[0].is_exclude());
        assert!(table.rules()[1].is_exclude());
        assert!(table.rules()[1].is_exact());
    }

    #[test]
    fn test_from_entries_reports_bad_record() {
        let entries: Vec<ProtectionEntry> = serde_json::from_str(
            r#"[{"perm":"owner","host":"*","user":"foo","depotFile":"//foo/..."}]"#,
        )
        .unwrap();

        let err = RuleTable::from_entries(&entries, true).unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.kind, RuleError::UnknownMode("owner".to_string()));
    }

    #[test]
    fn test_into_iterator() {
        let table = RuleTable::from_lines(["read user foo * //..."], true).unwrap();
        let mut count = 0;
        for rule in &table {
            assert_eq!(rule.mode(), AccessMode::Read);
            count += 1;
        }
        assert_eq!(count, 1);
    }
}
