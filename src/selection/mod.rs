//! Release selection: constraints, per-candidate filtering, and the fold
//! that picks the best qualifying candidate out of a stream.

mod constraints;
mod filter;
mod selector;

pub use constraints::{AssetFilter, Constraints, Pattern};
pub use filter::{CandidateFilter, Rejection};
pub use selector::{
    DEFAULT_STALENESS_DAYS, RejectionCounts, ReleaseSelector, SelectionResult, SelectorState,
};
