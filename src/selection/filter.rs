//! Per-candidate rule evaluation.

use std::fmt;

use log::debug;

use crate::release::Candidate;
use crate::selection::constraints::Constraints;
use crate::version::{Normalizer, Version};

/// Why a candidate was rejected. Each variant names the rule that failed,
/// so callers can tell runs apart (e.g. "nothing matched the asset filter"
/// vs. "nothing parsed").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Only,
    Exclude,
    MissingAsset,
    NotFormal,
    Unparseable,
    Major,
    OddMinor,
    Prerelease,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Only => write!(f, "does not match the only filter"),
            Rejection::Exclude => write!(f, "matches the exclude filter"),
            Rejection::MissingAsset => write!(f, "has no matching asset"),
            Rejection::NotFormal => write!(f, "is not a formal release"),
            Rejection::Unparseable => write!(f, "is not a recognizable version"),
            Rejection::Major => write!(f, "is outside the requested branch"),
            Rejection::OddMinor => write!(f, "has an odd minor version"),
            Rejection::Prerelease => write!(f, "is a pre-release"),
        }
    }
}

/// Applies one [`Constraints`] set to candidates.
///
/// The filter owns a [`Normalizer`] because the branch/major rule can only
/// be evaluated on the normalized release tuple.
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    constraints: Constraints,
    normalizer: Normalizer,
}

impl CandidateFilter {
    pub fn new(constraints: Constraints) -> Self {
        Self {
            constraints,
            normalizer: Normalizer::new(),
        }
    }

    /// A filter that strips `name-` style prefixes from tags before parsing.
    pub fn with_project(constraints: Constraints, project: impl Into<String>) -> Self {
        Self {
            constraints,
            normalizer: Normalizer::with_project(project),
        }
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Check one candidate; `Ok` carries the normalized version.
    pub fn check(&self, candidate: &Candidate) -> Result<Version, Rejection> {
        let c = &self.constraints;

        if let Some(only) = &c.only
            && !only.matches(&candidate.tag)
        {
            return Err(Rejection::Only);
        }
        if let Some(exclude) = &c.exclude
            && exclude.matches(&candidate.tag)
        {
            return Err(Rejection::Exclude);
        }
        if let Some(filter) = &c.having_asset
            && !filter.is_satisfied_by(&candidate.assets)
        {
            return Err(Rejection::MissingAsset);
        }
        if c.formal && !candidate.formal {
            return Err(Rejection::NotFormal);
        }

        let version = self.normalizer.normalize(&candidate.tag).map_err(|e| {
            debug!("Dropping tag {}: {}", candidate.tag, e);
            Rejection::Unparseable
        })?;

        if let Some(major) = &c.major
            && !version.release().starts_with(major)
        {
            return Err(Rejection::Major);
        }
        if c.even && !version.is_even() && !c.pre_ok {
            return Err(Rejection::OddMinor);
        }

        if !c.pre_ok {
            if candidate.provider_prerelease == Some(true) {
                return Err(Rejection::Prerelease);
            }
            if version.pre().is_some() {
                return Err(Rejection::Prerelease);
            }
            // The remaining signal is the magnitude heuristic, which never
            // overrides an explicit formal-release mark from the provider.
            if version.is_prerelease() && candidate.provider_prerelease != Some(false) {
                return Err(Rejection::Prerelease);
            }
        }

        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::ReleaseAsset;
    use crate::selection::constraints::{AssetFilter, Pattern};

    fn candidate(tag: &str) -> Candidate {
        Candidate {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    fn formal_candidate(tag: &str, prerelease: bool) -> Candidate {
        Candidate {
            tag: tag.to_string(),
            formal: true,
            provider_prerelease: Some(prerelease),
            ..Default::default()
        }
    }

    #[test]
    fn test_accepts_plain_stable_tag() {
        let filter = CandidateFilter::new(Constraints::default());
        let version = filter.check(&candidate("v1.2.3")).unwrap();
        assert_eq!(version.release(), &[1, 2, 3]);
    }

    #[test]
    fn test_only_filter() {
        let constraints = Constraints {
            only: Some(Pattern::new("stable").unwrap()),
            ..Default::default()
        };
        let filter = CandidateFilter::new(constraints);
        assert_eq!(filter.check(&candidate("1.2.3")), Err(Rejection::Only));
        assert!(filter.check(&candidate("stable-1.2.3")).is_ok());
    }

    #[test]
    fn test_exclude_filter() {
        let constraints = Constraints {
            exclude: Some(Pattern::new("nightly").unwrap()),
            ..Default::default()
        };
        let filter = CandidateFilter::new(constraints);
        assert_eq!(
            filter.check(&candidate("nightly-1.2.3")),
            Err(Rejection::Exclude)
        );
        assert!(filter.check(&candidate("1.2.3")).is_ok());
    }

    #[test]
    fn test_asset_filter() {
        let constraints = Constraints {
            having_asset: Some(AssetFilter::parse(r"~\.rpm$").unwrap()),
            ..Default::default()
        };
        let filter = CandidateFilter::new(constraints);

        let mut with_rpm = candidate("1.0.0");
        with_rpm.assets.push(ReleaseAsset {
            name: "tool-1.0.0.x86_64.rpm".into(),
            download_url: String::new(),
        });
        assert!(filter.check(&with_rpm).is_ok());

        assert_eq!(
            filter.check(&candidate("1.0.0")),
            Err(Rejection::MissingAsset)
        );
    }

    #[test]
    fn test_formal_only() {
        let constraints = Constraints {
            formal: true,
            ..Default::default()
        };
        let filter = CandidateFilter::new(constraints);
        assert_eq!(filter.check(&candidate("1.0.0")), Err(Rejection::NotFormal));
        assert!(filter.check(&formal_candidate("1.0.0", false)).is_ok());
    }

    #[test]
    fn test_unparseable_tag() {
        let filter = CandidateFilter::new(Constraints::default());
        assert_eq!(
            filter.check(&candidate("not-a-version")),
            Err(Rejection::Unparseable)
        );
        assert_eq!(
            filter.check(&candidate("1.2.x")),
            Err(Rejection::Unparseable)
        );
    }

    #[test]
    fn test_major_filter() {
        let constraints = Constraints {
            major: Some(vec![1]),
            ..Default::default()
        };
        let filter = CandidateFilter::new(constraints);
        assert!(filter.check(&candidate("1.1.0")).is_ok());
        assert_eq!(filter.check(&candidate("2.0.0")), Err(Rejection::Major));

        let constraints = Constraints {
            major: Some(vec![1, 2]),
            ..Default::default()
        };
        let filter = CandidateFilter::new(constraints);
        assert!(filter.check(&candidate("1.2.9")).is_ok());
        assert_eq!(filter.check(&candidate("1.3.0")), Err(Rejection::Major));
    }

    #[test]
    fn test_even_minor_rule() {
        let constraints = Constraints {
            even: true,
            ..Default::default()
        };
        let filter = CandidateFilter::new(constraints);
        assert!(filter.check(&candidate("1.2.3")).is_ok());
        assert_eq!(filter.check(&candidate("1.3.0")), Err(Rejection::OddMinor));
    }

    #[test]
    fn test_even_minor_lifted_by_pre_ok() {
        let constraints = Constraints {
            even: true,
            pre_ok: true,
            ..Default::default()
        };
        let filter = CandidateFilter::new(constraints);
        assert!(filter.check(&candidate("1.3.0")).is_ok());
    }

    #[test]
    fn test_prerelease_rejected_by_default() {
        let filter = CandidateFilter::new(Constraints::default());
        assert_eq!(
            filter.check(&candidate("1.2.3-rc1")),
            Err(Rejection::Prerelease)
        );
    }

    #[test]
    fn test_prerelease_accepted_with_pre_ok() {
        let constraints = Constraints {
            pre_ok: true,
            ..Default::default()
        };
        let filter = CandidateFilter::new(constraints);
        assert!(filter.check(&candidate("1.2.3-rc1")).is_ok());
    }

    #[test]
    fn test_provider_prerelease_flag_rejects() {
        let filter = CandidateFilter::new(Constraints::default());
        assert_eq!(
            filter.check(&formal_candidate("1.2.3", true)),
            Err(Rejection::Prerelease)
        );
    }

    #[test]
    fn test_explicit_release_signal_beats_magnitude_heuristic() {
        let filter = CandidateFilter::new(Constraints::default());

        // Magnitude heuristic alone: rejected.
        assert_eq!(
            filter.check(&candidate("1.2.95")),
            Err(Rejection::Prerelease)
        );

        // The provider explicitly says this is a real release: accepted.
        assert!(filter.check(&formal_candidate("1.2.95", false)).is_ok());

        // An explicit marker is not the magnitude heuristic; it stays rejected.
        assert_eq!(
            filter.check(&formal_candidate("1.2.95-rc1", false)),
            Err(Rejection::Prerelease)
        );
    }

    #[test]
    fn test_project_prefix_aware_filter() {
        let filter = CandidateFilter::with_project(Constraints::default(), "libssh2");
        let version = filter.check(&candidate("libssh2-1.2.3")).unwrap();
        assert_eq!(version.release(), &[1, 2, 3]);
    }
}
