//! Semantic-precision projection: truncate or pad a version to a
//! major/minor/patch base.

use std::fmt;
use std::str::FromStr;

use super::Version;

/// Requested semantic-versioning precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemPrecision {
    Major,
    Minor,
    Patch,
}

impl SemPrecision {
    /// Number of release components at this precision.
    pub fn width(self) -> usize {
        match self {
            SemPrecision::Major => 1,
            SemPrecision::Minor => 2,
            SemPrecision::Patch => 3,
        }
    }
}

impl fmt::Display for SemPrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemPrecision::Major => write!(f, "major"),
            SemPrecision::Minor => write!(f, "minor"),
            SemPrecision::Patch => write!(f, "patch"),
        }
    }
}

impl FromStr for SemPrecision {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "major" => Ok(SemPrecision::Major),
            "minor" => Ok(SemPrecision::Minor),
            "patch" => Ok(SemPrecision::Patch),
            _ => anyhow::bail!("Unknown precision: {}. Expected major, minor, or patch.", s),
        }
    }
}

impl Version {
    /// Project to a final version at the given precision, truncating longer
    /// releases and zero-padding shorter ones (`5.9` at patch -> `5.9.0`).
    pub fn sem_base(&self, precision: SemPrecision) -> Version {
        let width = precision.width();
        let mut release: Vec<u64> = self.release().iter().copied().take(width).collect();
        release.resize(width, 0);
        Version::new(release, None, None, None, true)
    }

    /// Like [`Version::sem_base`], but a pre-release source keeps its
    /// pre-release pair when the caller accepts pre-releases.
    pub fn sem_base_keeping_pre(&self, precision: SemPrecision, pre_ok: bool) -> Version {
        let base = self.sem_base(precision);
        match self.pre() {
            Some(pre) if pre_ok => {
                Version::new(base.release().to_vec(), Some(pre), None, None, false)
            }
            _ => base,
        }
    }
}
