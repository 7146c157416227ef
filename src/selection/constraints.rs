//! Constraint configuration for one selection run.

use anyhow::{Context, Result};
use regex::Regex;

use crate::release::ReleaseAsset;
use crate::version::SemPrecision;

/// Text matcher applied to tag or asset names.
///
/// Syntax follows the CLI convention: a leading `~` marks the rest as a
/// regular expression, a leading `!` negates the match, anything else is
/// substring containment.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    negated: bool,
    regex: Option<Regex>,
}

impl Pattern {
    pub fn new(spec: &str) -> Result<Self> {
        let (negated, body) = match spec.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, spec),
        };
        let (regex, raw) = match body.strip_prefix('~') {
            Some(expr) => {
                let compiled =
                    Regex::new(expr).with_context(|| format!("Invalid pattern: {}", spec))?;
                (Some(compiled), expr.to_string())
            }
            None => (None, body.to_string()),
        };
        Ok(Self {
            raw,
            negated,
            regex,
        })
    }

    /// Whether `text` satisfies the pattern, negation applied.
    pub fn matches(&self, text: &str) -> bool {
        let hit = match &self.regex {
            Some(regex) => regex.is_match(text),
            None => text.contains(&self.raw),
        };
        hit != self.negated
    }
}

/// Asset-presence requirement for a candidate.
#[derive(Debug, Clone)]
pub enum AssetFilter {
    /// Any asset at all must be attached.
    Any,
    /// At least one asset name must match the pattern.
    Matching(Pattern),
}

impl AssetFilter {
    /// Parse a CLI value; an empty value means "any asset".
    pub fn parse(spec: &str) -> Result<Self> {
        if spec.is_empty() {
            Ok(AssetFilter::Any)
        } else {
            Ok(AssetFilter::Matching(Pattern::new(spec)?))
        }
    }

    pub fn is_satisfied_by(&self, assets: &[ReleaseAsset]) -> bool {
        match self {
            AssetFilter::Any => !assets.is_empty(),
            AssetFilter::Matching(pattern) => assets.iter().any(|a| pattern.matches(&a.name)),
        }
    }
}

/// Immutable constraint set passed into one selection run.
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    /// Accept pre-releases.
    pub pre_ok: bool,
    /// Required leading release components (branch/major filter).
    pub major: Option<Vec<u64>>,
    /// Tag must match.
    pub only: Option<Pattern>,
    /// Tag must not match.
    pub exclude: Option<Pattern>,
    /// Required asset presence.
    pub having_asset: Option<AssetFilter>,
    /// Only even minor versions count as stable.
    pub even: bool,
    /// Only provider-marked formal releases.
    pub formal: bool,
    /// Requested semantic precision.
    pub sem: Option<SemPrecision>,
}

impl Constraints {
    /// Parse a dotted major/branch filter such as `1` or `1.2`.
    pub fn parse_major(spec: &str) -> Result<Vec<u64>> {
        spec.split('.')
            .map(|part| {
                part.parse::<u64>()
                    .with_context(|| format!("Invalid major filter: {}", spec))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str) -> ReleaseAsset {
        ReleaseAsset {
            name: name.to_string(),
            download_url: format!("https://example.com/{}", name),
        }
    }

    #[test]
    fn test_substring_pattern() {
        let pattern = Pattern::new("linux").unwrap();
        assert!(pattern.matches("tool-linux-x86_64"));
        assert!(!pattern.matches("tool-darwin-arm64"));
    }

    #[test]
    fn test_negated_pattern() {
        let pattern = Pattern::new("!beta").unwrap();
        assert!(pattern.matches("v1.0.0"));
        assert!(!pattern.matches("v1.0.0-beta"));
    }

    #[test]
    fn test_regex_pattern() {
        let pattern = Pattern::new(r"~^v\d+\.\d+$").unwrap();
        assert!(pattern.matches("v1.2"));
        assert!(!pattern.matches("v1.2.3"));
    }

    #[test]
    fn test_negated_regex_pattern() {
        let pattern = Pattern::new(r"!~\.(sig|asc)$").unwrap();
        assert!(pattern.matches("tool.tar.gz"));
        assert!(!pattern.matches("tool.tar.gz.sig"));
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        assert!(Pattern::new("~[").is_err());
    }

    #[test]
    fn test_asset_filter_any() {
        let filter = AssetFilter::parse("").unwrap();
        assert!(filter.is_satisfied_by(&[asset("anything.tar.gz")]));
        assert!(!filter.is_satisfied_by(&[]));
    }

    #[test]
    fn test_asset_filter_matching() {
        let filter = AssetFilter::parse(r"~\.rpm$").unwrap();
        assert!(filter.is_satisfied_by(&[asset("tool.x86_64.rpm")]));
        assert!(!filter.is_satisfied_by(&[asset("tool.tar.gz")]));
    }

    #[test]
    fn test_parse_major() {
        assert_eq!(Constraints::parse_major("1").unwrap(), vec![1]);
        assert_eq!(Constraints::parse_major("1.2").unwrap(), vec![1, 2]);
        assert!(Constraints::parse_major("1.x").is_err());
        assert!(Constraints::parse_major("").is_err());
    }
}
