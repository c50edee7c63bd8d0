//! npm-style version ranges.
//!
//! npm ranges are a superset of what `semver::VersionReq` parses: a bare
//! `1.2.3` is exact rather than caret, comparators are separated by spaces,
//! and `||` and `a - b` are allowed. Each `||` alternative is translated into
//! one `VersionReq`.

use std::fmt;

use semver::{Version, VersionReq};

/// A parsed npm range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    raw: String,
    alternatives: Vec<VersionReq>,
}

impl VersionRange {
    /// Parse a range. Returns `None` for anything that is not a semver
    /// range: dist-tags, URLs, `file:` and git specifiers.
    pub fn parse(raw: &str) -> Option<Self> {
        let alternatives = raw
            .split("||")
            .map(translate_set)
            .collect::<Option<Vec<_>>>()?;

        Some(VersionRange {
            raw: raw.to_string(),
            alternatives,
        })
    }

    /// Check whether a version satisfies any alternative.
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    /// The range as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Check `version` against `range`; unparseable ranges never match.
pub fn satisfies(version: &Version, range: &str) -> bool {
    VersionRange::parse(range).is_some_and(|r| r.matches(version))
}

fn is_operator(c: char) -> bool {
    matches!(c, '<' | '>' | '=' | '^' | '~')
}

fn is_wildcard(part: &str) -> bool {
    matches!(part, "x" | "X" | "*")
}

/// Translate one space-separated comparator set.
fn translate_set(set: &str) -> Option<VersionReq> {
    let set = set.trim();
    if set.is_empty() || is_wildcard(set) {
        return Some(VersionReq::STAR);
    }

    // Hyphen range: `1.2.3 - 2.3.4` is inclusive on both ends
    if let Some((low, high)) = set.split_once(" - ") {
        let low = strip_v(low.trim());
        let high = strip_v(high.trim());
        return format!(">={}, <={}", low, high).parse().ok();
    }

    let mut comparators = Vec::new();
    let mut pending_op: Option<&str> = None;

    for token in set.split_whitespace() {
        // `>= 1.0.0` is written with a space after the operator
        if token.chars().all(is_operator) {
            pending_op = Some(token);
            continue;
        }
        let token = match pending_op.take() {
            Some(op) => format!("{}{}", op, token),
            None => token.to_string(),
        };
        comparators.push(translate_comparator(&token));
    }

    if pending_op.is_some() || comparators.is_empty() {
        return None;
    }

    comparators.join(", ").parse().ok()
}

/// Translate a single comparator.
fn translate_comparator(token: &str) -> String {
    let op_len = token.find(|c: char| !is_operator(c)).unwrap_or(token.len());
    let (op, version) = token.split_at(op_len);
    let version = strip_v(version);

    if !op.is_empty() {
        return format!("{}{}", op, version);
    }

    // Bare versions: exact when complete, an x-range when partial
    let core = version.split(['-', '+']).next().unwrap_or(version);
    let parts: Vec<&str> = core.split('.').collect();
    if parts.iter().any(|p| is_wildcard(p)) {
        version.to_string()
    } else if parts.len() >= 3 {
        format!("={}", version)
    } else {
        format!("~{}", version)
    }
}

fn strip_v(s: &str) -> &str {
    s.strip_prefix('v').unwrap_or(s)
}

/// Parse a version string, allowing for incomplete versions.
pub fn parse_version_lenient(s: &str) -> Option<Version> {
    let s = strip_v(s.trim());

    // Try exact parse first
    if let Ok(v) = s.parse() {
        return Some(v);
    }

    // Try adding missing components
    let parts: Vec<&str> = s.split('.').collect();
    match parts.len() {
        1 => {
            let major: u64 = parts[0].parse().ok()?;
            Some(Version::new(major, 0, 0))
        }
        2 => {
            let major: u64 = parts[0].parse().ok()?;
            let minor: u64 = parts[1].parse().ok()?;
            Some(Version::new(major, minor, 0))
        }
        _ => None,
    }
}
