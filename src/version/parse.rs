//! Tag normalization: turning raw tag strings into [`Version`] values.
//!
//! Tags in the wild carry product-name prefixes, `v` markers, date stamps,
//! rebuild counters and a zoo of pre-release spellings. Normalization is a
//! fixed rule table, so the same tag always parses to the same value.

use std::sync::LazyLock;

use regex::Regex;

use super::{PreKind, Version};
use crate::error::Unparseable;

/// Pre-release markers, matched at a token boundary after the release digits.
/// Longer spellings first: the regex engine prefers earlier alternatives.
static PRE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[-._+ ])(early[-._ ]?access|preview|devel|alpha|beta|test|dev|rc|pre)[-._ ]?(\d*)")
        .expect("pre-release marker regex")
});

/// PEP 440 style short pre-release suffix (`1.2.3a0`, `1.2.3.b2`).
static SHORT_PRE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i)[-._]?(a|b)(\d+)$").expect("short pre-release regex"));

/// Post-release suffix: `-p2` (Magento), `.post2`, `+p2`.
static POST_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[-.+]p(?:ost)?(\d+)$").expect("post-release regex"));

/// Parse a raw tag with no project-name context.
pub fn parse_tag(tag: &str) -> Result<Version, Unparseable> {
    Normalizer::new().normalize(tag)
}

/// Tag normalizer, optionally aware of the project name so that tags like
/// `libssh2-1.2.3` do not leak the trailing `2` of the name into the release.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    project: Option<String>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(name: impl Into<String>) -> Self {
        Self {
            project: Some(name.into()),
        }
    }

    /// Normalize `tag` into a [`Version`], or reject it as [`Unparseable`].
    ///
    /// Deterministic: the same input always yields the same value.
    pub fn normalize(&self, tag: &str) -> Result<Version, Unparseable> {
        let mut s = tag.trim();

        if let Some(name) = &self.project {
            s = strip_project_prefix(s, name);
        }

        // v1.2.3 and 1.2.3 are the same version
        if let Some(rest) = s.strip_prefix(['v', 'V'])
            && rest.starts_with(|c: char| c.is_ascii_digit())
        {
            s = rest;
        }

        let (release, end) = extract_release(s)?;
        let remainder = Remainder::parse(&s[end..]);

        let last = *release.last().expect("release is never empty");
        let magnitude_flagged = release.len() >= 3
            && release[0] > 0
            && release[1] > 0
            && last >= 90
            && !is_date_shaped(last);
        let stable_hint = remainder.pre.is_none() && !magnitude_flagged;

        Ok(Version::new(
            release,
            remainder.pre,
            remainder.post,
            remainder.local,
            stable_hint,
        ))
    }
}

fn strip_project_prefix<'a>(s: &'a str, name: &str) -> &'a str {
    for sep in ['-', '_', '.'] {
        if let Some((head, tail)) = s.split_at_checked(name.len())
            && head.eq_ignore_ascii_case(name)
            && tail.starts_with(sep)
            && tail.len() > 1
        {
            return &tail[1..];
        }
    }
    s
}

/// Extract the leading run of dot/underscore/dash-delimited integers.
///
/// Returns the components and the byte offset where the remainder begins.
fn extract_release(s: &str) -> Result<(Vec<u64>, usize), Unparseable> {
    let bytes = s.as_bytes();
    let start = s
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| Unparseable(s.to_string()))?;

    let mut parts: Vec<u64> = Vec::new();
    let mut base_components = 0usize;
    let mut crossed_dash = false;
    let mut i = start;

    loop {
        let run_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        let component: u64 = s[run_start..i]
            .parse()
            .map_err(|_| Unparseable(s.to_string()))?;
        parts.push(component);
        if !crossed_dash {
            base_components += 1;
        }

        if i >= bytes.len() {
            break;
        }
        let next_is_digit = i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit();
        match bytes[i] {
            b'.' | b'_' if next_is_digit => i += 1,
            b'-' if next_is_digit => {
                // A dotted base followed by a lone dash-separated integer is
                // a rebuild counter (1.2.3-4), not more release components.
                if !crossed_dash && base_components >= 2 && lone_integer_at(bytes, i + 1) {
                    break;
                }
                crossed_dash = true;
                i += 1;
            }
            _ => break,
        }
    }

    // 1.2.x is a wildcard pattern, not a concrete version
    if i + 1 < bytes.len() && bytes[i] == b'.' && matches!(bytes[i + 1], b'x' | b'X' | b'*') {
        let terminal = bytes
            .get(i + 2)
            .is_none_or(|c| !c.is_ascii_alphanumeric());
        if terminal {
            return Err(Unparseable(s.to_string()));
        }
    }

    // Date stamps only count as release components when nothing else does.
    if parts.len() > 1 {
        let kept: Vec<u64> = parts
            .iter()
            .copied()
            .filter(|c| !is_date_shaped(*c))
            .collect();
        if !kept.is_empty() && kept.len() < parts.len() {
            parts = kept;
        }
    }

    Ok((parts, i))
}

fn lone_integer_at(bytes: &[u8], mut j: usize) -> bool {
    while j < bytes.len() && bytes[j].is_ascii_digit() {
        j += 1;
    }
    !(j + 1 < bytes.len() && matches!(bytes[j], b'.' | b'_') && bytes[j + 1].is_ascii_digit())
}

/// Whether `n` reads as a plausible YYYYMMDD stamp.
fn is_date_shaped(n: u64) -> bool {
    if !(10_000_000..=99_999_999).contains(&n) {
        return false;
    }
    let (year, month, day) = (n / 10_000, (n / 100) % 100, n % 100);
    (1900..=2099).contains(&year) && (1..=12).contains(&month) && (1..=31).contains(&day)
}

/// Everything the tag says after its release digits.
#[derive(Debug, Default)]
struct Remainder {
    pre: Option<(PreKind, u64)>,
    post: Option<u64>,
    local: Option<String>,
}

impl Remainder {
    fn parse(remainder: &str) -> Self {
        let mut out = Remainder::default();
        let mut rest = remainder.to_string();

        // A single letter glued to the release digits is a patch letter
        // (OpenSSL 1.1.1i): it marks a more stable build, not a pre-release.
        if rest.len() == 1 {
            let c = rest.chars().next().expect("len checked");
            if c.is_ascii_alphabetic() {
                out.post = Some(letter_index(c));
                return out;
            }
        }

        if let Some(caps) = POST_SUFFIX.captures(&rest) {
            out.post = caps.get(1).and_then(|m| m.as_str().parse().ok());
            let span = caps.get(0).expect("whole match").start();
            rest.truncate(span);
        }

        if let Some(plus) = rest.find('+') {
            let label = rest[plus + 1..].to_string();
            if !label.is_empty() {
                out.local = Some(label);
            }
            rest.truncate(plus);
        }

        if let Some(caps) = SHORT_PRE.captures(&rest) {
            let kind = match &caps[1].to_ascii_lowercase()[..] {
                "a" => PreKind::Alpha,
                _ => PreKind::Beta,
            };
            let number = caps[2].parse().unwrap_or(0);
            out.pre = Some((kind, number));
        } else if let Some(caps) = PRE_MARKER.captures(&rest) {
            let kind = match &caps[1].to_ascii_lowercase()[..] {
                "alpha" => PreKind::Alpha,
                "rc" | "pre" => PreKind::Rc,
                "dev" | "devel" | "test" => PreKind::Dev,
                // beta, preview, early-access: "not yet final" without a
                // ranking of their own
                _ => PreKind::Beta,
            };
            let number = caps[2].parse().unwrap_or(0);
            out.pre = Some((kind, number));
        }

        out
    }
}

fn letter_index(c: char) -> u64 {
    (c.to_ascii_lowercase() as u64) - ('a' as u64) + 1
}
