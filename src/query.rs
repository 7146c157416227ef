//! Query driver: wires a candidate source into the release selector.

use anyhow::Result;
use chrono::Duration;
use log::{debug, info};

use crate::error::SelectionError;
use crate::provider::CandidateSource;
use crate::release::SelectedRelease;
use crate::selection::{
    CandidateFilter, Constraints, RejectionCounts, ReleaseSelector, SelectorState,
};
use crate::version::{SemPrecision, Version, parse_tag};

/// Outcome of one latest-release query. Both variants are normal
/// terminations; the counters let the caller report why nothing qualified.
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    Found(SelectedRelease),
    NotFound(RejectionCounts),
}

impl QueryOutcome {
    /// Collapse into the typed taxonomy for callers that treat "nothing
    /// qualified" as an error value.
    pub fn into_result(self) -> Result<SelectedRelease, SelectionError> {
        match self {
            QueryOutcome::Found(selected) => Ok(selected),
            QueryOutcome::NotFound(_) => Err(SelectionError::NoQualifyingRelease),
        }
    }
}

/// Find the latest qualifying release from `source` under `constraints`.
///
/// Batches are pulled only while the selector scans: once the staleness
/// window closes the fold, no further pages are requested.
#[tracing::instrument(skip(source, constraints))]
pub async fn latest(
    source: &mut dyn CandidateSource,
    constraints: &Constraints,
    project: Option<&str>,
    window_days: i64,
) -> Result<QueryOutcome> {
    let filter = match project {
        Some(name) => CandidateFilter::with_project(constraints.clone(), name),
        None => CandidateFilter::new(constraints.clone()),
    };
    let mut selector =
        ReleaseSelector::with_filter(filter).with_window(Duration::days(window_days));

    'stream: loop {
        let batch = source.next_batch().await?;
        if batch.is_empty() {
            break;
        }
        debug!("Considering a batch of {} candidates", batch.len());
        for candidate in batch {
            if selector.offer(candidate) == SelectorState::Done {
                break 'stream;
            }
        }
    }

    let result = selector.finish();
    match result.selected {
        Some(selected) => {
            info!(
                "Latest qualifying release: {} ({})",
                selected.version, selected.tag
            );
            Ok(QueryOutcome::Found(selected))
        }
        None => Ok(QueryOutcome::NotFound(result.rejections)),
    }
}

/// Check that accepting `latest` over `current` stays within the requested
/// semantic precision (patch bumps must not change the minor, and so on).
pub fn check_sem_constraint(
    current: &Version,
    latest: &Version,
    precision: SemPrecision,
) -> Result<(), SelectionError> {
    let violated = match precision {
        SemPrecision::Major => false,
        SemPrecision::Minor => latest.major() != current.major(),
        SemPrecision::Patch => {
            latest.major() != current.major() || latest.minor() != current.minor()
        }
    };
    if violated {
        return Err(SelectionError::ConstraintViolation {
            current: current.clone(),
            latest: latest.clone(),
            precision,
        });
    }
    Ok(())
}

/// Parse a free-form version argument (`test`, `format`, `--newer-than`).
///
/// Returns `None` for values that are clearly not versions: URLs and
/// owner/repo names.
pub fn parse_free_version(value: &str) -> Option<Version> {
    if value.starts_with("http://") || value.starts_with("https://") {
        return None;
    }
    if value.contains('/') && !value.contains(' ') {
        return None;
    }
    parse_tag(value).ok()
}
