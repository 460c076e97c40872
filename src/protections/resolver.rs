//! Access resolver
//!
//! Computes the access one identity holds at a candidate path by overlaying
//! its protections table in order, later rules taking precedence:
//!
//! 1. Ordinary grant - raises access to the rule's mode
//! 2. Exact grant (`=mode`) - access becomes exactly the rule's mode
//! 3. Ordinary exclude (`-path`) - all access granted so far is dropped
//! 4. Exact exclude (`=mode ... -path`) - only the rule's own mode is withdrawn
//!
//! File candidates are matched against each rule's pattern. Directory
//! candidates (ending in `/`) stand for everything beneath them: a rule whose
//! pattern covers the whole directory is applied as for a file, while a grant
//! reaching only part of the directory leaves a descendant witness that keeps
//! the directory visible at `list` level until a later exclude matching
//! everything that grant reaches withdraws it.

use tracing::trace;

use crate::protections::mode::{Access, AccessMode};
use crate::protections::pattern::{MatchBuffers, fold_case};
use crate::protections::rule::Rule;
use crate::protections::table::RuleTable;

/// Whether a candidate names a file or a directory prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateKind {
    File,
    Directory,
}

impl CandidateKind {
    pub fn of(path: &str) -> Self {
        if path.ends_with('/') {
            CandidateKind::Directory
        } else {
            CandidateKind::File
        }
    }
}

/// Access resolver over one identity's protections table
#[derive(Debug, Clone, Copy)]
pub struct AccessResolver<'a> {
    table: &'a RuleTable,
}

impl<'a> AccessResolver<'a> {
    pub fn new(table: &'a RuleTable) -> Self {
        Self { table }
    }

    /// Highest mode the candidate is entitled to, or `None` for no access
    pub fn resolve(&self, path: &str) -> Option<AccessMode> {
        self.access(path).highest()
    }

    /// Check whether the candidate meets the required mode
    pub fn allows(&self, path: &str, required: AccessMode) -> bool {
        self.access(path).allows(required)
    }

    /// Full access state at the candidate
    pub fn access(&self, path: &str) -> Access {
        let candidate = fold_case(path, self.table.case_sensitive());
        let mut buffers = MatchBuffers::default();
        match CandidateKind::of(path) {
            CandidateKind::File => self.file_access(&candidate, &mut buffers),
            CandidateKind::Directory => self.directory_access(&candidate, &mut buffers),
        }
    }

    fn file_access(&self, path: &str, buffers: &mut MatchBuffers) -> Access {
        let mut access = Access::none();
        for rule in self.table {
            if rule.pattern().reach_folded(path, buffers).matches {
                trace!(path, rule = %rule, "Rule matches file");
                apply(&mut access, rule);
            }
        }
        access
    }

    fn directory_access(&self, dir: &str, buffers: &mut MatchBuffers) -> Access {
        let mut access = Access::none();
        let mut witnesses: Vec<&Rule> = Vec::new();

        for rule in self.table {
            let pattern = rule.pattern();
            let reach = pattern.reach_folded(dir, buffers);
            if reach.covers {
                trace!(path = dir, rule = %rule, "Rule covers directory");
                apply(&mut access, rule);
                if hides_listing(rule) {
                    witnesses.clear();
                }
            } else if reach.overlaps {
                if !rule.is_exclude() {
                    trace!(path = dir, rule = %rule, "Rule reaches into directory");
                    witnesses.push(rule);
                } else if hides_listing(rule) {
                    witnesses.retain(|witness| !pattern.contains(witness.pattern()));
                }
            }
        }

        if !witnesses.is_empty() {
            trace!(path = dir, witnesses = witnesses.len(), "Directory visible through descendants");
            access.grant(AccessMode::List);
        }
        access
    }
}

fn apply(access: &mut Access, rule: &Rule) {
    match (rule.is_exclude(), rule.is_exact()) {
        (false, false) => access.grant(rule.mode()),
        (false, true) => access.grant_exact(rule.mode()),
        (true, false) => access.revoke_all(),
        (true, true) => access.revoke_exact(rule.mode()),
    }
}

/// Exclusions that take away the ability to see a path at all
fn hides_listing(rule: &Rule) -> bool {
    rule.is_exclude() && (!rule.is_exact() || rule.mode() == AccessMode::List)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(lines: &[&str]) -> RuleTable {
        RuleTable::from_lines(lines, true).unwrap()
    }

    #[test]
    fn test_empty_table_denies() {
        let table = RuleTable::empty(true);
        let resolver = AccessResolver::new(&table);
        assert_eq!(resolver.resolve("//depot/file"), None);
        assert_eq!(resolver.resolve("//depot/"), None);
    }

    #[test]
    fn test_simple_grant() {
        let table = table(&["write user foo * //foo/..."]);
        let resolver = AccessResolver::new(&table);
        assert_eq!(resolver.resolve("//foo/test"), Some(AccessMode::Write));
        assert_eq!(resolver.resolve("//bar/test"), None);
    }

    #[test]
    fn test_grants_merge_upwards() {
        let table = table(&["write user foo * //depot/...", "read user foo * //depot/a/..."]);
        let resolver = AccessResolver::new(&table);
        assert_eq!(resolver.resolve("//depot/a/file"), Some(AccessMode::Write));
    }

    #[test]
    fn test_exclude_clears() {
        let table = table(&["super user foo * //...", "read user foo * -//depot/secret/..."]);
        let resolver = AccessResolver::new(&table);
        assert_eq!(resolver.resolve("//depot/secret/file"), None);
        assert_eq!(resolver.resolve("//depot/public/file"), Some(AccessMode::Super));
    }

    #[test]
    fn test_later_grant_restores() {
        let table = table(&[
            "read user foo * //...",
            "list user foo * -//depot/...",
            "open user foo * //depot/a/...",
        ]);
        let resolver = AccessResolver::new(&table);
        assert_eq!(resolver.resolve("//depot/a/x"), Some(AccessMode::Open));
        assert_eq!(resolver.resolve("//depot/b/x"), None);
        assert_eq!(resolver.resolve("//other/x"), Some(AccessMode::Read));
    }

    #[test]
    fn test_exact_exclude_is_scoped() {
        let table = table(&[
            "write user foo 1.2.3.4 //foo/...",
            "=open user foo 1.2.3.4 -//foo/...",
        ]);
        let resolver = AccessResolver::new(&table);
        assert!(resolver.allows("//foo/test", AccessMode::Read));
        assert!(!resolver.allows("//foo/test", AccessMode::Open));
        assert!(resolver.allows("//foo/test", AccessMode::Write));
        assert_eq!(resolver.resolve("//foo/test"), Some(AccessMode::Write));
        assert_eq!(resolver.access("//foo/test").revoked(), vec![AccessMode::Open]);
    }

    #[test]
    fn test_exact_grant_sets_baseline() {
        let table = table(&["write user foo * //depot/...", "=read user foo * //depot/docs/..."]);
        let resolver = AccessResolver::new(&table);
        assert_eq!(resolver.resolve("//depot/docs/readme"), Some(AccessMode::Read));
        assert_eq!(resolver.resolve("//depot/src/main.c"), Some(AccessMode::Write));
    }

    #[test]
    fn test_ordinary_grant_escalates_after_exact() {
        let table = table(&["=read user foo * //depot/...", "open user foo * //depot/..."]);
        let resolver = AccessResolver::new(&table);
        assert_eq!(resolver.resolve("//depot/file"), Some(AccessMode::Open));
    }

    #[test]
    fn test_directory_through_descendant() {
        let table = table(&[
            "list user foo 1.2.3.4 -//...",
            "list user foo 1.2.3.4 //depot/a/b/c/...",
        ]);
        let resolver = AccessResolver::new(&table);
        assert_eq!(resolver.resolve("//depot/a/b/"), Some(AccessMode::List));
        assert_eq!(resolver.resolve("//depot/a/"), Some(AccessMode::List));
        assert_eq!(resolver.resolve("//depot/a/b/c/"), Some(AccessMode::List));
        assert_eq!(resolver.resolve("//depot/a/x/"), None);
    }

    #[test]
    fn test_descendant_only_gives_list() {
        let table = table(&[
            "list user foo 1.2.3.4 -//...",
            "read user foo 1.2.3.4 //depot/a/b/foo",
        ]);
        let resolver = AccessResolver::new(&table);
        assert_eq!(resolver.resolve("//depot/a/b/"), Some(AccessMode::List));
        assert_eq!(resolver.resolve("//depot/a/b/foo"), Some(AccessMode::Read));
        assert_eq!(resolver.resolve("//depot/a/b/foo/x"), None);
    }

    #[test]
    fn test_covering_grant_applies_to_directory() {
        let table = table(&["read user foo * //depot/...", "list user foo * -//depot/a/secret/..."]);
        let resolver = AccessResolver::new(&table);
        assert_eq!(resolver.resolve("//depot/a/"), Some(AccessMode::Read));
        assert_eq!(resolver.resolve("//depot/a/secret/"), None);
    }

    #[test]
    fn test_covering_exclude_clears_witnesses() {
        let table = table(&["read user foo * //depot/a/b/c/...", "list user foo * -//depot/..."]);
        let resolver = AccessResolver::new(&table);
        assert_eq!(resolver.resolve("//depot/a/"), None);
    }

    #[test]
    fn test_partial_exclude_shadows_witness() {
        let table = table(&[
            "read user foo * //depot/a/b/c/...",
            "read user foo * //depot/a/b/d",
            "list user foo * -//depot/a/b/c/...",
        ]);
        let resolver = AccessResolver::new(&table);
        // d is still visible
        assert_eq!(resolver.resolve("//depot/a/"), Some(AccessMode::List));
    }

    #[test]
    fn test_partial_exclude_hides_directory() {
        let table = table(&["read user foo * //depot/a/b/c/...", "list user foo * -//depot/a/b/..."]);
        let resolver = AccessResolver::new(&table);
        assert_eq!(resolver.resolve("//depot/a/"), None);
    }

    #[test]
    fn test_exact_exclude_keeps_witness() {
        let table = table(&["write user foo * //depot/a/b/...", "=write user foo * -//depot/a/b/..."]);
        let resolver = AccessResolver::new(&table);
        assert_eq!(resolver.resolve("//depot/a/"), Some(AccessMode::List));
        assert_eq!(resolver.resolve("//depot/a/b/"), Some(AccessMode::Open));
    }

    #[test]
    fn test_exclude_repeating_wildcard_grant_hides_directories() {
        let table = table(&[
            "list user foo * //depot/*/secret/...",
            "list user foo * -//depot/*/secret/...",
        ]);
        let resolver = AccessResolver::new(&table);
        assert_eq!(resolver.resolve("//depot/"), None);
        assert_eq!(resolver.resolve("//depot/a/"), None);
        assert_eq!(resolver.resolve("//depot/a/secret/"), None);
    }

    #[test]
    fn test_broader_exclude_shadows_wildcard_grant() {
        let broader = table(&["read user foo * //depot/a/*.c", "list user foo * -//depot/a/..."]);
        assert_eq!(AccessResolver::new(&broader).resolve("//depot/"), None);

        // a narrower exclude leaves part of the grant reachable
        let narrower = table(&["read user foo * //depot/a/*", "list user foo * -//depot/a/*.c"]);
        assert_eq!(
            AccessResolver::new(&narrower).resolve("//depot/"),
            Some(AccessMode::List)
        );
    }

    #[test]
    fn test_case_insensitive_candidate_folded_once() {
        let table = RuleTable::from_lines(["read user foo * //Depot/Main/..."], false).unwrap();
        let resolver = AccessResolver::new(&table);
        assert_eq!(resolver.resolve("//DEPOT/main/x"), Some(AccessMode::Read));
        assert_eq!(resolver.resolve("//depot/MAIN/"), Some(AccessMode::Read));
        assert_eq!(resolver.resolve("//DEPOT/"), Some(AccessMode::List));
    }

    #[test]
    fn test_candidate_kind() {
        assert_eq!(CandidateKind::of("//depot/"), CandidateKind::Directory);
        assert_eq!(CandidateKind::of("//depot"), CandidateKind::File);
        assert_eq!(CandidateKind::of(""), CandidateKind::File);
    }
}
