//! Canonical version representation and ordering.
//!
//! A [`Version`] is the normalized form of a release tag. Two tags that
//! normalize to the same release/pre/post triple compare equal regardless of
//! cosmetic differences such as a `v` prefix or build metadata.

mod parse;
mod sem;

pub use parse::{Normalizer, parse_tag};
pub use sem::SemPrecision;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::Unparseable;

/// Pre-release kind, ordered by increasing maturity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreKind {
    Dev,
    Alpha,
    Beta,
    Rc,
}

/// Canonical, comparison-aware version value.
///
/// Ordering is defined over `release` (zero-padded), then pre-release,
/// then post-release. The `local` label and the stability hint never
/// participate in comparisons.
#[derive(Debug, Clone)]
pub struct Version {
    release: Vec<u64>,
    pre: Option<(PreKind, u64)>,
    post: Option<u64>,
    local: Option<String>,
    stable_hint: bool,
}

impl Version {
    pub(crate) fn new(
        release: Vec<u64>,
        pre: Option<(PreKind, u64)>,
        post: Option<u64>,
        local: Option<String>,
        stable_hint: bool,
    ) -> Self {
        debug_assert!(!release.is_empty());
        Self {
            release,
            pre,
            post,
            local,
            stable_hint,
        }
    }

    /// Release components (e.g. `[1, 2, 3]` for `1.2.3`). Never empty.
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    /// Pre-release pair, if any (`1.2.3-rc1` yields `(Rc, 1)`).
    pub fn pre(&self) -> Option<(PreKind, u64)> {
        self.pre
    }

    /// Post-release number, if any (`2.3.4-p2` yields `2`).
    pub fn post(&self) -> Option<u64> {
        self.post
    }

    /// Opaque build-metadata suffix (`1.2.3+build5` yields `build5`).
    pub fn local(&self) -> Option<&str> {
        self.local.as_deref()
    }

    /// Whether this version precedes its final release.
    ///
    /// True for explicit pre-release markers and for versions the parser
    /// flagged via the magnitude heuristic (trailing component >= 90).
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || !self.stable_hint
    }

    pub fn major(&self) -> u64 {
        self.component(0)
    }

    pub fn minor(&self) -> u64 {
        self.component(1)
    }

    pub fn micro(&self) -> u64 {
        self.component(2)
    }

    /// Whether the minor component is even (missing minor counts as 0).
    pub fn is_even(&self) -> bool {
        self.minor() % 2 == 0
    }

    fn component(&self, index: usize) -> u64 {
        self.release.get(index).copied().unwrap_or(0)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let width = self.release.len().max(other.release.len());
        for i in 0..width {
            match self.component(i).cmp(&other.component(i)) {
                Ordering::Equal => continue,
                decided => return decided,
            }
        }

        // A final release outranks any of its pre-releases.
        let by_pre = match (&self.pre, &other.pre) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a.cmp(b),
        };
        if by_pre != Ordering::Equal {
            return by_pre;
        }

        self.post.unwrap_or(0).cmp(&other.post.unwrap_or(0))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dotted: Vec<String> = self.release.iter().map(u64::to_string).collect();
        write!(f, "{}", dotted.join("."))?;
        if let Some((kind, n)) = self.pre {
            match kind {
                PreKind::Dev => write!(f, ".dev{}", n)?,
                PreKind::Alpha => write!(f, "a{}", n)?,
                PreKind::Beta => write!(f, "b{}", n)?,
                PreKind::Rc => write!(f, "rc{}", n)?,
            }
        }
        if let Some(post) = self.post {
            write!(f, ".post{}", post)?;
        }
        if let Some(local) = &self.local {
            write!(f, "+{}", local)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = Unparseable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_tag(s)
    }
}
