//! The fold that picks the best qualifying release from a candidate stream.

use chrono::Duration;
use log::{debug, info};

use crate::release::{Candidate, SelectedRelease};
use crate::selection::constraints::Constraints;
use crate::selection::filter::{CandidateFilter, Rejection};
use crate::version::Version;

/// Default staleness window in days. A candidate this much older than the
/// current best means the stream has moved past anything that could win.
pub const DEFAULT_STALENESS_DAYS: i64 = 365;

/// Selector lifecycle: `Scanning` consumes candidates, `Done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorState {
    Scanning,
    Done,
}

/// Per-rule rejection counters, surfaced with the result so the caller can
/// tell an "asset filter matched nothing" run from a "nothing parsed" run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RejectionCounts {
    pub only: u32,
    pub exclude: u32,
    pub missing_asset: u32,
    pub not_formal: u32,
    pub unparseable: u32,
    pub major: u32,
    pub odd_minor: u32,
    pub prerelease: u32,
}

impl RejectionCounts {
    fn record(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::Only => self.only += 1,
            Rejection::Exclude => self.exclude += 1,
            Rejection::MissingAsset => self.missing_asset += 1,
            Rejection::NotFormal => self.not_formal += 1,
            Rejection::Unparseable => self.unparseable += 1,
            Rejection::Major => self.major += 1,
            Rejection::OddMinor => self.odd_minor += 1,
            Rejection::Prerelease => self.prerelease += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.only
            + self.exclude
            + self.missing_asset
            + self.not_formal
            + self.unparseable
            + self.major
            + self.odd_minor
            + self.prerelease
    }
}

/// Result of a (possibly partial) selection run.
#[derive(Debug, Clone)]
pub struct SelectionResult {
    pub selected: Option<SelectedRelease>,
    pub rejections: RejectionCounts,
}

/// Folds a candidate stream into the best qualifying release.
///
/// The selector owns its accumulator exclusively; concurrent runs share
/// nothing. It tolerates partial consumption: stopping early still yields a
/// valid (possibly non-optimal) best.
pub struct ReleaseSelector {
    filter: CandidateFilter,
    window: Duration,
    state: SelectorState,
    best: Option<(Version, Candidate)>,
    rejections: RejectionCounts,
}

impl ReleaseSelector {
    pub fn new(constraints: Constraints) -> Self {
        Self::with_filter(CandidateFilter::new(constraints))
    }

    pub fn with_filter(filter: CandidateFilter) -> Self {
        Self {
            filter,
            window: Duration::days(DEFAULT_STALENESS_DAYS),
            state: SelectorState::Scanning,
            best: None,
            rejections: RejectionCounts::default(),
        }
    }

    /// Override the staleness window (tunable, not an invariant).
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn state(&self) -> SelectorState {
        self.state
    }

    pub fn rejections(&self) -> &RejectionCounts {
        &self.rejections
    }

    pub fn best_version(&self) -> Option<&Version> {
        self.best.as_ref().map(|(version, _)| version)
    }

    /// Offer one candidate to the fold.
    ///
    /// Returns the state after consuming it; `Done` tells the caller to stop
    /// pulling the stream. Providers may page lazily, so stopping early
    /// avoids real I/O.
    pub fn offer(&mut self, candidate: Candidate) -> SelectorState {
        if self.state == SelectorState::Done {
            return self.state;
        }

        // Once a best exists, a candidate dated far behind it means the
        // stream has scrolled past anything that could still win.
        if let Some((_, best)) = &self.best
            && let (Some(best_date), Some(date)) = (best.date, candidate.date)
            && date + self.window < best_date
        {
            info!(
                "Tag {} is older than the staleness window, stopping the scan",
                candidate.tag
            );
            self.state = SelectorState::Done;
            return self.state;
        }

        match self.filter.check(&candidate) {
            Err(rejection) => {
                debug!("Skipping tag {}: {}", candidate.tag, rejection);
                self.rejections.record(rejection);
            }
            Ok(version) => {
                let replace = match &self.best {
                    None => true,
                    Some((best_version, best)) => {
                        version > *best_version
                            || (version == *best_version && is_newer(candidate.date, best.date))
                    }
                };
                if replace {
                    info!("Selected {} ({}) as current best", version, candidate.tag);
                    self.best = Some((version, candidate));
                }
            }
        }

        self.state
    }

    /// Close the fold. Valid after full or partial consumption.
    pub fn finish(self) -> SelectionResult {
        let selected = self.best.map(|(version, candidate)| SelectedRelease {
            version,
            tag: candidate.tag,
            date: candidate.date,
            assets: candidate.assets,
            formal: candidate.formal,
        });
        SelectionResult {
            selected,
            rejections: self.rejections,
        }
    }

    /// Run the whole fold over an in-memory stream, honoring early
    /// termination.
    pub fn select_from<I>(constraints: Constraints, candidates: I) -> SelectionResult
    where
        I: IntoIterator<Item = Candidate>,
    {
        let mut selector = ReleaseSelector::new(constraints);
        for candidate in candidates {
            if selector.offer(candidate) == SelectorState::Done {
                break;
            }
        }
        selector.finish()
    }
}

fn is_newer(
    candidate: Option<chrono::DateTime<chrono::Utc>>,
    best: Option<chrono::DateTime<chrono::Utc>>,
) -> bool {
    match (candidate, best) {
        (Some(candidate), Some(best)) => candidate > best,
        (Some(_), None) => true,
        _ => false,
    }
}
