//! Access modes
//!
//! Perforce permission levels and the per-path access state the resolver
//! accumulates while overlaying rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RuleError;

/// Perforce permission level, ordered from weakest to strongest
///
/// A mode satisfies a requirement iff it compares greater than or equal to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    List,
    Read,
    Open,
    Write,
    Admin,
    Super,
}

impl AccessMode {
    /// Get the mode name as it appears in a protections table
    pub const fn as_str(&self) -> &'static str {
        match self {
            AccessMode::List => "list",
            AccessMode::Read => "read",
            AccessMode::Open => "open",
            AccessMode::Write => "write",
            AccessMode::Admin => "admin",
            AccessMode::Super => "super",
        }
    }

    /// Try to parse a mode from its table name
    pub fn try_parse(s: &str) -> Option<Self> {
        match s {
            "list" => Some(AccessMode::List),
            "read" => Some(AccessMode::Read),
            "open" => Some(AccessMode::Open),
            "write" => Some(AccessMode::Write),
            "admin" => Some(AccessMode::Admin),
            "super" => Some(AccessMode::Super),
            _ => None,
        }
    }

    /// Get all modes, weakest first
    pub fn all() -> &'static [AccessMode] {
        &[
            AccessMode::List,
            AccessMode::Read,
            AccessMode::Open,
            AccessMode::Write,
            AccessMode::Admin,
            AccessMode::Super,
        ]
    }

    /// Check if this mode meets a required mode
    pub fn satisfies(&self, required: AccessMode) -> bool {
        *self >= required
    }

    const fn bit(&self) -> u8 {
        1 << (*self as u8)
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AccessMode {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse(s).ok_or_else(|| RuleError::UnknownMode(s.to_string()))
    }
}

/// Access held at one path after overlaying a run of rules
///
/// `ceiling` is the highest mode granted so far; `revoked` holds modes
/// individually withdrawn by exact excludes (`=mode ... -path`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Access {
    ceiling: Option<AccessMode>,
    revoked: u8,
}

impl Access {
    /// No access at all
    pub const fn none() -> Self {
        Self {
            ceiling: None,
            revoked: 0,
        }
    }

    /// Ordinary grant: this mode and everything below it
    pub fn grant(&mut self, mode: AccessMode) {
        self.ceiling = self.ceiling.max(Some(mode));
        // re-granting restores anything an exact exclude took away below it
        self.revoked &= !((mode.bit() << 1) - 1);
    }

    /// Exact grant: the ceiling becomes exactly this mode
    pub fn grant_exact(&mut self, mode: AccessMode) {
        self.ceiling = Some(mode);
        self.revoked &= !mode.bit();
    }

    /// Ordinary exclude: everything granted so far is dropped
    pub fn revoke_all(&mut self) {
        *self = Self::none();
    }

    /// Exact exclude: only this one mode is withdrawn
    pub fn revoke_exact(&mut self, mode: AccessMode) {
        self.revoked |= mode.bit();
    }

    /// Check whether the required mode is held
    pub fn allows(&self, required: AccessMode) -> bool {
        self.ceiling.is_some_and(|c| c.satisfies(required)) && self.revoked & required.bit() == 0
    }

    /// Highest mode currently held, if any
    pub fn highest(&self) -> Option<AccessMode> {
        AccessMode::all()
            .iter()
            .rev()
            .copied()
            .find(|mode| self.allows(*mode))
    }

    /// Modes withdrawn by exact excludes, weakest first
    pub fn revoked(&self) -> Vec<AccessMode> {
        AccessMode::all()
            .iter()
            .copied()
            .filter(|mode| self.revoked & mode.bit() != 0)
            .collect()
    }

    pub fn ceiling(&self) -> Option<AccessMode> {
        self.ceiling
    }

    pub fn is_none(&self) -> bool {
        self.highest().is_none()
    }
}
