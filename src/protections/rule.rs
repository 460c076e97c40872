//! Protections table lines
//!
//! Raw grammar, one rule per line:
//!
//! ```text
//! [=][-]<mode> <type> <name> <host> [-]<path>
//! ```
//!
//! The exclude marker is accepted in front of the mode or the path, the path
//! may be double-quoted when it contains whitespace, and runs of whitespace
//! between fields count as a single separator.

use serde::Deserialize;
use std::fmt;

use crate::error::RuleError;
use crate::protections::mode::AccessMode;
use crate::protections::pattern::PathPattern;

/// One parsed protections line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    mode: AccessMode,
    exclude: bool,
    exact: bool,
    pattern: PathPattern,
    subject_type: String,
    name: String,
    host: String,
}

impl Rule {
    /// Parse a raw protections line
    pub fn parse(line: &str, case_sensitive: bool) -> Result<Self, RuleError> {
        let (mode_token, rest) = split_token(line.trim()).ok_or(RuleError::Malformed)?;
        let (subject_type, rest) = split_token(rest).ok_or(RuleError::Malformed)?;
        let (name, rest) = split_token(rest).ok_or(RuleError::Malformed)?;
        let (host, path_field) = split_token(rest).ok_or(RuleError::Malformed)?;

        let (exact, mode_token) = strip_marker(mode_token, '=');
        let (mode_exclude, mode_token) = strip_marker(mode_token, '-');
        let mode = mode_token.parse::<AccessMode>()?;

        let (path_exclude, path) = parse_path(path_field)?;

        Ok(Self {
            mode,
            exclude: mode_exclude || path_exclude,
            exact,
            pattern: PathPattern::new(path, case_sensitive),
            subject_type: subject_type.to_string(),
            name: name.to_string(),
            host: host.to_string(),
        })
    }

    /// Build a rule from one tagged `protects` record
    pub fn from_entry(entry: &ProtectionEntry, case_sensitive: bool) -> Result<Self, RuleError> {
        let (exact, perm) = strip_marker(entry.perm.trim(), '=');
        let mode = perm.parse::<AccessMode>()?;

        let (path_exclude, path) = strip_marker(entry.depot_file.trim(), '-');
        if path.is_empty() {
            return Err(RuleError::EmptyPath);
        }

        Ok(Self {
            mode,
            exclude: path_exclude || entry.unmap.is_some(),
            exact,
            pattern: PathPattern::new(path, case_sensitive),
            subject_type: entry.subject_type().to_string(),
            name: entry.user.clone(),
            host: entry.host.clone(),
        })
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn is_exclude(&self) -> bool {
        self.exclude
    }

    pub fn is_exact(&self) -> bool {
        self.exact
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// `user` or `group`; kept for diagnostics only
    pub fn subject_type(&self) -> &str {
        &self.subject_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

impl fmt::Display for Rule {
    /// Canonical raw-line form, re-parseable by [`Rule::parse`]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exact {
            f.write_str("=")?;
        }
        write!(
            f,
            "{} {} {} {} ",
            self.mode, self.subject_type, self.name, self.host
        )?;

        let marker = if self.exclude { "-" } else { "" };
        let path = self.pattern.as_str();
        if path.contains(char::is_whitespace) {
            write!(f, "\"{marker}{path}\"")
        } else {
            write!(f, "{marker}{path}")
        }
    }
}

/// One record of tagged `p4 -ztag protects` output
#[derive(Debug, Clone, Deserialize)]
pub struct ProtectionEntry {
    pub perm: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub user: String,
    /// Present when `user` names a group
    #[serde(default)]
    pub isgroup: Option<String>,
    /// Position in the server's table, when reported
    #[serde(default)]
    pub line: Option<String>,
    #[serde(rename = "depotFile")]
    pub depot_file: String,
    /// Present on exclusionary lines
    #[serde(default)]
    pub unmap: Option<String>,
}

impl ProtectionEntry {
    pub fn subject_type(&self) -> &'static str {
        if self.isgroup.is_some() {
            "group"
        } else {
            "user"
        }
    }
}

impl fmt::Display for ProtectionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.unmap.is_some() { "-" } else { "" };
        write!(
            f,
            "{} {} {} {} {}{}",
            self.perm,
            self.subject_type(),
            self.user,
            self.host,
            marker,
            self.depot_file
        )
    }
}

fn split_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    match s.find(char::is_whitespace) {
        Some(end) => Some((&s[..end], s[end..].trim_start())),
        None => Some((s, "")),
    }
}

fn strip_marker(token: &str, marker: char) -> (bool, &str) {
    match token.strip_prefix(marker) {
        Some(rest) => (true, rest),
        None => (false, token),
    }
}

/// Split the path field into its exclude flag and unquoted path
fn parse_path(field: &str) -> Result<(bool, &str), RuleError> {
    let field = field.trim();
    if field.is_empty() {
        return Err(RuleError::Malformed);
    }

    let (outer_exclude, field) = strip_marker(field, '-');
    let (inner_exclude, path) = if let Some(quoted) = field.strip_prefix('"') {
        let inner = quoted
            .strip_suffix('"')
            .ok_or(RuleError::UnterminatedQuote)?;
        if inner.contains('"') {
            return Err(RuleError::UnterminatedQuote);
        }
        strip_marker(inner, '-')
    } else {
        if field.contains('"') {
            return Err(RuleError::UnterminatedQuote);
        }
        // an unquoted path cannot hold whitespace; anything after it is a sixth field
        if field.contains(char::is_whitespace) {
            return Err(RuleError::Malformed);
        }
        (false, field)
    };

    if path.is_empty() {
        return Err(RuleError::EmptyPath);
    }
    Ok((outer_exclude || inner_exclude, path))
}
