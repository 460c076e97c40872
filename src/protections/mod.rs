//! Protections path filter
//!
//! Decides offline which depot paths an identity may access, given the
//! protections table a Perforce server returned for that identity
//! (`p4 protects -h <ip>`).
//!
//! ## Rule Model
//!
//! Rules are evaluated in table order and later rules overlay earlier ones:
//!
//! ```text
//! write user foo * //depot/...              # grants write and below
//! list  user foo * -//depot/secret/...      # removes everything there
//! =open user foo * -//depot/frozen/...      # removes only `open`
//! read  user foo * //depot/secret/readme    # grants read on one file
//! ```
//!
//! Access modes are ordered `list < read < open < write < admin < super`.
//!
//! ## Candidates
//!
//! - a path not ending in `/` is a file and must be matched by the rules
//! - a path ending in `/` is a directory; it is visible when anything
//!   beneath it is, and holds a higher mode only when a rule covers all of it

pub mod filter;
pub mod mode;
pub mod pattern;
pub mod resolver;
pub mod rule;
pub mod table;

pub use filter::{CAN_ACCESS_MODE, PathDecision, ProtectionsFilter};
pub use mode::{Access, AccessMode};
pub use pattern::{PathPattern, Reach};
pub use resolver::{AccessResolver, CandidateKind};
pub use rule::{ProtectionEntry, Rule};
pub use table::RuleTable;
