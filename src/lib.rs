//! Perforce Protections Filter
//!
//! Offline filtering of depot paths against a Perforce protections table.
//!
//! ## Features
//!
//! - **Perforce wildcards** - `*`, `...` and positional `%%n` in any position
//! - **Ordered overlay** - grants, exclusions and exact (`=`) overrides in table order
//! - **Directory aggregation** - `//depot/dir/` is visible when anything below it is
//! - **Case-insensitive servers** - matching folds case when the server does
//!
//! ## Example
//!
//! ```
//! use p4_protections::{AccessMode, ProtectionsFilter};
//!
//! let filter = ProtectionsFilter::from_lines(
//!     [
//!         "write user foo * //foo/...",
//!         "=open user foo * -//foo/frozen/...",
//!     ],
//!     true,
//! )?;
//!
//! let visible = filter.filter_paths(["//foo/test", "//bar/test"], AccessMode::Read);
//! assert_eq!(visible, vec!["//foo/test"]);
//! assert!(!filter.resolver().allows("//foo/frozen/x", AccessMode::Open));
//! # Ok::<(), p4_protections::error::ParseError>(())
//! ```
//!
//! ## Configuration
//!
//! The bundled `p4-protections` binary reads its defaults from TOML:
//!
//! ```toml
//! [filter]
//! case_sensitive = false          # server reports case-insensitive
//! required_mode = "read"
//! rules_format = "lines"          # or "json" for `p4 -ztag -Mj protects`
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```

pub mod config;
pub mod error;
pub mod protections;

// Re-export main types
pub use config::{AppConfig, load_config};
pub use error::{AppError, ParseError, Result};
pub use protections::{
    AccessMode, AccessResolver, PathPattern, ProtectionsFilter, Rule, RuleTable,
};
