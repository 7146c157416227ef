//! Source construction from a provider kind and optional API URL.

use crate::http::HttpClient;

use super::{CandidateSource, GitHubSource, GitLabSource, ProviderKind, RepoId, github, gitlab};

/// Create a candidate source for the given provider, using the provider's
/// well-known API URL unless the caller overrides it.
pub fn source_for(
    kind: ProviderKind,
    http_client: HttpClient,
    repo: RepoId,
    api_url: Option<String>,
) -> Box<dyn CandidateSource> {
    match kind {
        ProviderKind::GitHub => Box::new(GitHubSource::new(
            http_client,
            repo,
            api_url.unwrap_or_else(|| github::DEFAULT_API_URL.to_string()),
        )),
        ProviderKind::GitLab => Box::new(GitLabSource::new(
            http_client,
            repo,
            api_url.unwrap_or_else(|| gitlab::DEFAULT_API_URL.to_string()),
        )),
    }
}
