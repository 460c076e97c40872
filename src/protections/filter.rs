//! Protections filter
//!
//! The single entry point the rest of an application talks to: hand it the
//! identity's protections table once, then filter candidate depot paths
//! against a required mode as often as needed.

use serde::Serialize;
use tracing::debug;

use crate::error::ParseResult;
use crate::protections::mode::AccessMode;
use crate::protections::resolver::{AccessResolver, CandidateKind};
use crate::protections::table::RuleTable;

/// Mode [`ProtectionsFilter::can_access`] checks against
pub const CAN_ACCESS_MODE: AccessMode = AccessMode::Read;

/// Filters candidate paths against one identity's protections
///
/// Holds no mutable state; share it freely (e.g. behind an `Arc`) between
/// concurrent callers working for the same identity.
#[derive(Debug, Clone)]
pub struct ProtectionsFilter {
    table: RuleTable,
}

/// Outcome for one candidate, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathDecision {
    pub path: String,
    pub kind: CandidateKind,
    pub highest: Option<AccessMode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub revoked: Vec<AccessMode>,
    pub allowed: bool,
}

impl ProtectionsFilter {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    /// Parse raw protections lines straight into a filter
    pub fn from_lines<I, S>(lines: I, case_sensitive: bool) -> ParseResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        RuleTable::from_lines(lines, case_sensitive).map(Self::new)
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    pub fn resolver(&self) -> AccessResolver<'_> {
        AccessResolver::new(&self.table)
    }

    /// Keep the candidates the identity may access at `required` or above
    ///
    /// Input order is preserved; duplicates are passed through untouched.
    pub fn filter_paths<I, S>(&self, candidates: I, required: AccessMode) -> Vec<S>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.filter_by(candidates, required, |candidate| candidate.as_ref())
    }

    /// Keep the items whose path passes; `path_of` extracts the path
    pub fn filter_by<I, T, F>(&self, items: I, required: AccessMode, path_of: F) -> Vec<T>
    where
        I: IntoIterator<Item = T>,
        F: Fn(&T) -> &str,
    {
        let resolver = self.resolver();
        let mut total = 0usize;
        let accepted: Vec<T> = items
            .into_iter()
            .inspect(|_| total += 1)
            .filter(|item| resolver.allows(path_of(item), required))
            .collect();

        debug!(
            required = %required,
            candidates = total,
            accepted = accepted.len(),
            "Filtered paths"
        );
        accepted
    }

    /// Check a single path against [`CAN_ACCESS_MODE`]
    pub fn can_access(&self, path: &str) -> bool {
        self.resolver().allows(path, CAN_ACCESS_MODE)
    }

    /// Per-candidate decisions with the access that produced them
    pub fn explain<I, S>(&self, candidates: I, required: AccessMode) -> Vec<PathDecision>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let resolver = self.resolver();
        candidates
            .into_iter()
            .map(|candidate| {
                let path = candidate.as_ref();
                let access = resolver.access(path);
                PathDecision {
                    path: path.to_string(),
                    kind: CandidateKind::of(path),
                    highest: access.highest(),
                    revoked: access.revoked(),
                    allowed: access.allows(required),
                }
            })
            .collect()
    }
}

impl From<RuleTable> for ProtectionsFilter {
    fn from(table: RuleTable) -> Self {
        Self::new(table)
    }
}
