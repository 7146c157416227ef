use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::version::Version;

/// A downloadable asset attached to a release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReleaseAsset {
    pub name: String,
    #[serde(default)]
    pub download_url: String,
}

/// A candidate release record as supplied by a provider.
///
/// Candidates are read-only input to the selection core; providers create
/// them fresh per run and the core never mutates them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    /// Raw tag text as published by the provider.
    pub tag: String,
    /// Commit or publication timestamp, when the provider can supply one.
    pub date: Option<DateTime<Utc>>,
    /// Downloadable assets in provider order.
    pub assets: Vec<ReleaseAsset>,
    /// Whether the provider marks this as a formal release (vs. a bare tag).
    pub formal: bool,
    /// The provider's own prerelease flag, if it exposes one.
    pub provider_prerelease: Option<bool>,
}

/// The outcome of a selection run: the winning candidate and its
/// canonical version.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedRelease {
    pub version: Version,
    pub tag: String,
    pub date: Option<DateTime<Utc>>,
    pub assets: Vec<ReleaseAsset>,
    pub formal: bool,
}
