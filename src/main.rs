use anyhow::Result;
use clap::Parser;
use std::process;

use lastrel::http::{HttpClient, HttpError};
use lastrel::provider::{ProviderKind, RepoId, source_for};
use lastrel::query::{self, QueryOutcome};
use lastrel::release::SelectedRelease;
use lastrel::selection::{AssetFilter, Constraints, DEFAULT_STALENESS_DAYS, Pattern};
use lastrel::version::SemPrecision;

const EXIT_NO_RELEASE: i32 = 1;
const EXIT_NOT_NEWER: i32 = 2;
const EXIT_NO_MATCHING_ASSET: i32 = 3;
const EXIT_SEM_VIOLATION: i32 = 4;

/// lastrel - Latest release finder
///
/// Answers "what is the latest stable release" for projects hosted on
/// GitHub or GitLab, normalizing their noisy tag schemes into comparable
/// versions.
///
/// Examples:
///   lastrel get nginx/nginx            # latest stable release
///   lastrel get owner/repo --pre       # pre-releases qualify too
///   lastrel test v1.2.3-rc1            # show how a tag is understood
#[derive(Parser, Debug)]
#[command(author, version = env!("LASTREL_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Find the latest qualifying release of a repository
    Get(GetArgs),

    /// Parse a tag and report how it is understood
    Test(TagArgs),

    /// Parse a tag and print its canonical form
    Format(TagArgs),
}

#[derive(clap::Args, Debug)]
struct GetArgs {
    /// The repository in the format "owner/repo"
    #[arg(value_name = "OWNER/REPO")]
    repo: String,

    /// Accept pre-releases
    #[arg(long)]
    pre: bool,

    /// Only consider versions under this branch prefix (e.g. "1" or "1.2")
    #[arg(long, value_name = "PREFIX")]
    major: Option<String>,

    /// Only consider tags matching this pattern (prefix with ~ for regex,
    /// ! to negate)
    #[arg(long, value_name = "PATTERN")]
    only: Option<String>,

    /// Skip tags matching this pattern
    #[arg(long, value_name = "PATTERN")]
    exclude: Option<String>,

    /// Only consider releases carrying an asset, optionally matching a
    /// pattern
    #[arg(long, value_name = "PATTERN", num_args = 0..=1, default_missing_value = "")]
    having_asset: Option<String>,

    /// Only consider releases with an even minor version
    #[arg(long)]
    even: bool,

    /// Only consider formally published releases, not bare tags
    #[arg(long)]
    formal: bool,

    /// Truncate output to this semantic precision (major, minor, patch)
    #[arg(long, value_name = "LEVEL")]
    sem: Option<SemPrecision>,

    /// Exit with status 2 unless the found release is newer than this
    #[arg(long = "newer-than", short = 'g', alias = "gt", value_name = "VER")]
    newer_than: Option<String>,

    /// Print matching asset URLs instead of the version
    #[arg(long)]
    assets: bool,

    /// Hosting provider (github or gitlab)
    #[arg(long, value_name = "PROVIDER", default_value = "github")]
    at: ProviderKind,

    /// API URL (defaults to the provider's public instance)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Stop scanning once tags fall this many days behind the best found
    #[arg(long, value_name = "DAYS", default_value_t = DEFAULT_STALENESS_DAYS)]
    staleness_days: i64,
}

#[derive(clap::Args, Debug)]
struct TagArgs {
    /// The tag or version string
    tag: String,

    /// Truncate output to this semantic precision (major, minor, patch)
    #[arg(long, value_name = "LEVEL")]
    sem: Option<SemPrecision>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(error) => {
            log::error!("{:#}", error);
            EXIT_NO_RELEASE
        }
    };
    process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Get(args) => get(args).await,
        Commands::Test(args) => Ok(describe_tag(&args, true)),
        Commands::Format(args) => Ok(describe_tag(&args, false)),
    }
}

async fn get(args: GetArgs) -> Result<i32> {
    let repo: RepoId = args.repo.parse()?;
    let constraints = build_constraints(&args)?;

    let newer_than = match &args.newer_than {
        Some(raw) => match query::parse_free_version(raw) {
            Some(version) => Some(version),
            None => {
                log::error!("{} is not a valid version value", raw);
                return Ok(EXIT_NO_RELEASE);
            }
        },
        None => None,
    };

    let client = reqwest::Client::builder()
        .user_agent(concat!("lastrel/", env!("LASTREL_VERSION")))
        .build()?;
    let mut source = source_for(args.at, HttpClient::new(client), repo.clone(), args.api_url.clone());

    let outcome = match query::latest(
        source.as_mut(),
        &constraints,
        Some(repo.repo.as_str()),
        args.staleness_days,
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(error) => {
            if matches!(error.downcast_ref::<HttpError>(), Some(HttpError::NotFound(_))) {
                log::error!("No such repository: {}", repo);
                return Ok(EXIT_NO_RELEASE);
            }
            return Err(error);
        }
    };

    match outcome {
        QueryOutcome::Found(selected) => report_found(&args, &constraints, newer_than, selected),
        QueryOutcome::NotFound(rejections) => {
            if args.assets && rejections.missing_asset > 0 {
                log::error!("No release carries a matching asset");
                return Ok(EXIT_NO_MATCHING_ASSET);
            }
            log::error!("No release was found");
            Ok(EXIT_NO_RELEASE)
        }
    }
}

fn report_found(
    args: &GetArgs,
    constraints: &Constraints,
    newer_than: Option<lastrel::version::Version>,
    selected: SelectedRelease,
) -> Result<i32> {
    // An update gated to patch/minor precision must not cross that boundary.
    if let (Some(precision), Some(current)) = (constraints.sem, &newer_than)
        && let Err(violation) = query::check_sem_constraint(current, &selected.version, precision)
    {
        log::warn!("{}", violation);
        return Ok(EXIT_SEM_VIOLATION);
    }

    if args.assets {
        let urls = asset_urls(&selected, constraints.having_asset.as_ref());
        if urls.is_empty() {
            log::error!("No assets matched");
            return Ok(EXIT_NO_MATCHING_ASSET);
        }
        for url in urls {
            println!("{}", url);
        }
        return Ok(0);
    }

    let display = match constraints.sem {
        Some(precision) => selected.version.sem_base_keeping_pre(precision, constraints.pre_ok),
        None => selected.version.clone(),
    };
    println!("{}", display);

    if let Some(current) = newer_than {
        let (latest, current) = match constraints.sem {
            Some(precision) => (
                selected.version.sem_base(precision),
                current.sem_base(precision),
            ),
            None => (selected.version.clone(), current),
        };
        if latest <= current {
            return Ok(EXIT_NOT_NEWER);
        }
    }
    Ok(0)
}

fn describe_tag(args: &TagArgs, verbose: bool) -> i32 {
    match query::parse_free_version(&args.tag) {
        Some(version) => {
            let version = match args.sem {
                Some(precision) => version.sem_base_keeping_pre(precision, true),
                None => version,
            };
            if verbose {
                println!("Parsed as: {}", version);
                println!("Stable: {}", !version.is_prerelease());
            } else {
                println!("{}", version);
            }
            0
        }
        None => {
            log::error!("Failed to parse {:?} as a version", args.tag);
            EXIT_NO_RELEASE
        }
    }
}

fn build_constraints(args: &GetArgs) -> Result<Constraints> {
    Ok(Constraints {
        pre_ok: args.pre,
        major: args
            .major
            .as_deref()
            .map(Constraints::parse_major)
            .transpose()?,
        only: args.only.as_deref().map(Pattern::new).transpose()?,
        exclude: args.exclude.as_deref().map(Pattern::new).transpose()?,
        having_asset: args
            .having_asset
            .as_deref()
            .map(AssetFilter::parse)
            .transpose()?,
        even: args.even,
        formal: args.formal,
        sem: args.sem,
    })
}

fn asset_urls(selected: &SelectedRelease, filter: Option<&AssetFilter>) -> Vec<String> {
    selected
        .assets
        .iter()
        .filter(|asset| match filter {
            Some(AssetFilter::Matching(pattern)) => pattern.matches(&asset.name),
            _ => true,
        })
        .map(|asset| asset.download_url.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_get_parsing() {
        let cli = Cli::try_parse_from(["lastrel", "get", "owner/repo"]).unwrap();
        match cli.command {
            Commands::Get(args) => {
                assert_eq!(args.repo, "owner/repo");
                assert!(!args.pre);
                assert_eq!(args.staleness_days, DEFAULT_STALENESS_DAYS);
            }
            _ => panic!("Expected Get command"),
        }
    }

    #[test]
    fn test_cli_get_flags() {
        let cli = Cli::try_parse_from([
            "lastrel",
            "get",
            "owner/repo",
            "--pre",
            "--major",
            "1.2",
            "--sem",
            "minor",
            "--at",
            "gitlab",
        ])
        .unwrap();
        match cli.command {
            Commands::Get(args) => {
                assert!(args.pre);
                assert_eq!(args.major.as_deref(), Some("1.2"));
                assert_eq!(args.sem, Some(SemPrecision::Minor));
                assert_eq!(args.at, ProviderKind::GitLab);
            }
            _ => panic!("Expected Get command"),
        }
    }

    #[test]
    fn test_cli_having_asset_without_value() {
        let cli =
            Cli::try_parse_from(["lastrel", "get", "owner/repo", "--having-asset"]).unwrap();
        match cli.command {
            Commands::Get(args) => assert_eq!(args.having_asset.as_deref(), Some("")),
            _ => panic!("Expected Get command"),
        }
    }

    #[test]
    fn test_cli_having_asset_with_pattern() {
        let cli = Cli::try_parse_from([
            "lastrel",
            "get",
            "owner/repo",
            "--having-asset",
            r"~\.rpm$",
        ])
        .unwrap();
        match cli.command {
            Commands::Get(args) => assert_eq!(args.having_asset.as_deref(), Some(r"~\.rpm$")),
            _ => panic!("Expected Get command"),
        }
    }

    #[test]
    fn test_cli_test_parsing() {
        let cli = Cli::try_parse_from(["lastrel", "test", "v1.2.3"]).unwrap();
        match cli.command {
            Commands::Test(args) => assert_eq!(args.tag, "v1.2.3"),
            _ => panic!("Expected Test command"),
        }
    }

    #[test]
    fn test_cli_invalid_sem_fails() {
        assert!(Cli::try_parse_from(["lastrel", "get", "owner/repo", "--sem", "bogus"]).is_err());
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        assert!(Cli::try_parse_from(["lastrel", "owner/repo"]).is_err());
    }

    #[test]
    fn test_build_constraints_rejects_bad_patterns() {
        let cli =
            Cli::try_parse_from(["lastrel", "get", "owner/repo", "--only", "~["]).unwrap();
        match cli.command {
            Commands::Get(args) => assert!(build_constraints(&args).is_err()),
            _ => panic!("Expected Get command"),
        }
    }

    #[test]
    fn test_asset_urls_filtering() {
        use lastrel::release::ReleaseAsset;
        use lastrel::version::parse_tag;

        let selected = SelectedRelease {
            version: parse_tag("1.0.0").unwrap(),
            tag: "v1.0.0".into(),
            date: None,
            assets: vec![
                ReleaseAsset {
                    name: "tool.rpm".into(),
                    download_url: "https://example.com/tool.rpm".into(),
                },
                ReleaseAsset {
                    name: "tool.deb".into(),
                    download_url: "https://example.com/tool.deb".into(),
                },
            ],
            formal: true,
        };

        let all = asset_urls(&selected, None);
        assert_eq!(all.len(), 2);

        let filter = AssetFilter::parse(r"~\.rpm$").unwrap();
        let rpm_only = asset_urls(&selected, Some(&filter));
        assert_eq!(rpm_only, vec!["https://example.com/tool.rpm".to_string()]);
    }
}
