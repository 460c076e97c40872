//! Depot path pattern matching
//!
//! Patterns are compiled once into a flat atom list and evaluated by
//! simulating the equivalent NFA, so matching is `O(pattern × path)` with no
//! backtracking regardless of how many wildcards a pattern carries.
//!
//! Wildcards:
//! - `*` matches any run of characters within one path segment (no `/`)
//! - `...` matches any run of characters, `/` included; a `/.../` run may
//!   also collapse to a single `/`
//! - `%%1`..`%%9` are positional wildcards and match like `*`

use std::borrow::Cow;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Atom {
    Byte(u8),
    Star,
    Ellipsis,
    /// `...` between two slashes; may also skip the slash that follows it
    DirEllipsis,
}

impl Atom {
    fn is_wildcard(&self) -> bool {
        !matches!(self, Atom::Byte(_))
    }
}

/// Compiled depot path pattern
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    atoms: Vec<Atom>,
    case_sensitive: bool,
}

impl PartialEq for PathPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.case_sensitive == other.case_sensitive
    }
}

impl Eq for PathPattern {}

/// How a pattern relates to one candidate, from a single pass over it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reach {
    /// The pattern matches the candidate itself
    pub matches: bool,
    /// The pattern matches at least one path beginning with the candidate
    pub overlaps: bool,
    /// The pattern matches every path beginning with the candidate
    pub covers: bool,
}

/// NFA state vectors reused across patterns evaluated against one candidate
#[derive(Debug, Default)]
pub(crate) struct MatchBuffers {
    current: Vec<bool>,
    next: Vec<bool>,
}

impl PathPattern {
    /// Compile an (already unquoted) depot path pattern
    pub fn new(pattern: impl Into<String>, case_sensitive: bool) -> Self {
        let source = pattern.into();
        let folded = fold_case(&source, case_sensitive);
        let atoms = compile(folded.as_bytes());
        Self {
            source,
            atoms,
            case_sensitive,
        }
    }

    /// The pattern as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn has_wildcards(&self) -> bool {
        self.atoms.iter().any(Atom::is_wildcard)
    }

    /// Check if the pattern matches the whole path
    pub fn matches(&self, path: &str) -> bool {
        self.reach(path).matches
    }

    /// Check if the pattern matches at least one path beginning with `prefix`
    ///
    /// This includes the pattern matching `prefix` itself.
    pub fn overlaps(&self, prefix: &str) -> bool {
        self.reach(prefix).overlaps
    }

    /// Check if the pattern matches every path beginning with `prefix`
    pub fn covers(&self, prefix: &str) -> bool {
        self.reach(prefix).covers
    }

    /// Match, overlap and cover answers for `text` in one pass
    pub fn reach(&self, text: &str) -> Reach {
        let folded = fold_case(text, self.case_sensitive);
        self.reach_folded(&folded, &mut MatchBuffers::default())
    }

    /// Same as [`PathPattern::reach`] for text already folded to this
    /// pattern's case
    pub(crate) fn reach_folded(&self, text: &str, buffers: &mut MatchBuffers) -> Reach {
        if !self.run(text, buffers) {
            return Reach::default();
        }
        let states = &buffers.current;
        let covers = states.iter().enumerate().any(|(i, live)| {
            let rest = &self.atoms[i..];
            *live && !rest.is_empty() && rest.iter().all(|atom| *atom == Atom::Ellipsis)
        });
        Reach {
            matches: states[self.atoms.len()],
            overlaps: true,
            covers,
        }
    }

    /// Check that every path `other` matches is also matched by this pattern
    ///
    /// Each wildcard of `other` must be absorbed by a wildcard here at least
    /// as permissive, so the answer may be `false` for some exotic pairs
    /// that are in fact contained, but is never `true` for a pair that is not.
    pub fn contains(&self, other: &PathPattern) -> bool {
        let theirs = &other.atoms;
        let n = self.atoms.len();

        // ok[k][j]: every suffix `other` produces from atom k is accepted from state j
        let mut ok = vec![vec![false; n + 1]; theirs.len() + 1];
        for (j, accepts) in ok[theirs.len()].iter_mut().enumerate() {
            *accepts = self.closure(j).any(|state| state == n);
        }

        for k in (0..theirs.len()).rev() {
            for j in 0..=n {
                let accepted = match theirs[k] {
                    Atom::Byte(byte) => {
                        let plain = self.steps(j, byte).any(|state| ok[k + 1][state]);
                        if theirs.get(k + 1) == Some(&Atom::DirEllipsis) {
                            plain && self.steps(j, byte).any(|state| ok[k + 3][state])
                        } else {
                            plain
                        }
                    }
                    Atom::Star => self.absorbers(j, false).any(|state| ok[k + 1][state]),
                    Atom::Ellipsis | Atom::DirEllipsis => {
                        self.absorbers(j, true).any(|state| ok[k + 1][state])
                    }
                };
                ok[k][j] = accepted;
            }
        }
        ok[0][0]
    }

    /// Feed `text` through the automaton, leaving the live states in
    /// `buffers.current`; returns `false` once every state has died
    fn run(&self, text: &str, buffers: &mut MatchBuffers) -> bool {
        let n = self.atoms.len();
        let MatchBuffers { current, next } = buffers;
        current.clear();
        current.resize(n + 1, false);
        next.clear();
        next.resize(n + 1, false);

        current[0] = true;
        self.close(current);

        for &byte in text.as_bytes() {
            next.fill(false);
            let mut alive = false;
            for (i, atom) in self.atoms.iter().enumerate() {
                if !current[i] {
                    continue;
                }
                match *atom {
                    Atom::Byte(b) if b == byte => {
                        next[i + 1] = true;
                        // an empty `/.../` collapses to the slash just consumed
                        if self.atoms.get(i + 1) == Some(&Atom::DirEllipsis) {
                            next[i + 3] = true;
                        }
                        alive = true;
                    }
                    Atom::Star if byte != b'/' => {
                        next[i] = true;
                        alive = true;
                    }
                    Atom::Ellipsis | Atom::DirEllipsis => {
                        next[i] = true;
                        alive = true;
                    }
                    _ => {}
                }
            }
            if !alive {
                return false;
            }
            self.close(next);
            std::mem::swap(current, next);
        }

        true
    }

    /// Wildcards may match the empty string
    fn close(&self, states: &mut [bool]) {
        for (i, atom) in self.atoms.iter().enumerate() {
            if states[i] && atom.is_wildcard() {
                states[i + 1] = true;
            }
        }
    }

    /// States reachable from `state` without consuming anything
    fn closure(&self, state: usize) -> impl Iterator<Item = usize> + '_ {
        let wildcards = self.atoms[state..]
            .iter()
            .take_while(|atom| atom.is_wildcard())
            .count();
        state..=state + wildcards
    }

    /// States reached from `state` by consuming `byte`
    fn steps(&self, state: usize, byte: u8) -> impl Iterator<Item = usize> + '_ {
        self.closure(state).flat_map(move |i| {
            let (first, skip) = match self.atoms.get(i) {
                Some(Atom::Byte(b)) if *b == byte => {
                    let skip = self.atoms.get(i + 1) == Some(&Atom::DirEllipsis);
                    (Some(i + 1), skip.then_some(i + 3))
                }
                Some(Atom::Star) if byte != b'/' => (Some(i), None),
                Some(Atom::Ellipsis | Atom::DirEllipsis) => (Some(i), None),
                _ => (None, None),
            };
            first.into_iter().chain(skip)
        })
    }

    /// Wildcard states reachable from `state` able to swallow any run of
    /// characters, `/` included when `crosses_slash` is set
    fn absorbers(&self, state: usize, crosses_slash: bool) -> impl Iterator<Item = usize> + '_ {
        self.closure(state).filter(move |&i| match self.atoms.get(i) {
            Some(Atom::Ellipsis | Atom::DirEllipsis) => true,
            Some(Atom::Star) => !crosses_slash,
            _ => false,
        })
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

pub(crate) fn fold_case(text: &str, case_sensitive: bool) -> Cow<'_, str> {
    if case_sensitive {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.to_lowercase())
    }
}

fn compile(bytes: &[u8]) -> Vec<Atom> {
    let mut atoms = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let atom = if bytes[i..].starts_with(b"...") {
            let between_slashes = i > 0 && bytes[i - 1] == b'/' && bytes.get(i + 3) == Some(&b'/');
            i += 3;
            if between_slashes {
                Atom::DirEllipsis
            } else {
                Atom::Ellipsis
            }
        } else if bytes[i] == b'*' {
            i += 1;
            Atom::Star
        } else if bytes[i..].starts_with(b"%%") && bytes.get(i + 2).is_some_and(u8::is_ascii_digit) {
            i += 3;
            Atom::Star
        } else {
            i += 1;
            Atom::Byte(bytes[i - 1])
        };

        // runs of `...` collapse into one
        if atom == Atom::Ellipsis && atoms.last() == Some(&Atom::Ellipsis) {
            continue;
        }
        atoms.push(atom);
    }
    atoms
}
