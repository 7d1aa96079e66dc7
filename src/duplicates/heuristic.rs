//! Filename version and date markers.
//!
//! When two files are near-duplicates, the one whose name carries the newer
//! marker is kept. [`VersionDescriptor::from_path`] scans the lowercased file
//! stem for dates (`report_2024-03-18`, `notes_20240318`, `plan_2024q2`),
//! version numbers (`spec_v2.1b`, `draft-v-3`), keyword-prefixed numbers
//! (`build42`), revision markers (`rev3`, `r2`) and descriptive tags
//! (`final`, `latest`, `updated`). The highest-ranked candidate wins.
//!
//! Descriptors form a single total order:
//!
//! ```text
//! Dated  >  Tagged  >  Versioned  >  None
//! ```
//!
//! Within `Dated` and `Versioned`, components compare numerically with
//! missing trailing components treated as 0, then the letter suffix, then
//! tagged over untagged.

use std::cmp::Ordering;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in pattern is valid")
}

const BOUNDARY: &str = r"(^|[^a-z0-9])";

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"{BOUNDARY}v?([0-9]+(?:\.[0-9]+)*)([a-z]?)")));
static V_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"{BOUNDARY}v[._-]+([0-9]+(?:\.[0-9]+)*)([a-z]?)")));
static SEPARATOR_V_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"{BOUNDARY}[._-]+v[._-]+([0-9]+(?:\.[0-9]+)*)([a-z]?)")));
static PREFIX_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"{BOUNDARY}(ver|version|rel|release|build|b)([0-9]+(?:\.[0-9]+)*)([a-z]?)"
    ))
});
static REV_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"{BOUNDARY}(rev|revision|r)([0-9]+)?([a-z]?)")));
static TAG_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"{BOUNDARY}(final|latest|new|updated|update|revised)([0-9]+)?([a-z]?)"
    ))
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"{BOUNDARY}(new|revised|revision|rev|latest|final|updated|update)($|[^a-z0-9])"
    ))
});

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(^|[^0-9])([0-9]{4})[-_.]?([0-9]{2})[-_.]?([0-9]{2})(?:[tT_. -]?([0-9]{2})[:_.\-]?([0-9]{2})(?:[:_.\-]?([0-9]{2}))?)?",
    )
});
static DATE_COMPACT_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(^|[^0-9])([0-9]{8})([0-9]{4}|[0-9]{6})?($|[^0-9])"));
static YEAR_MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(^|[^0-9])([0-9]{4})[-_.]?([0-9]{2})($|[^0-9])"));
static QUARTER_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(^|[^0-9])([0-9]{4})[-_.]?(q|quarter)([1-4])($|[^0-9])"));

/// An ordering key extracted from a filename.
#[derive(Debug, Clone, Default)]
pub enum VersionDescriptor {
    /// No marker found.
    #[default]
    None,
    /// A tag keyword without any number.
    Tagged,
    /// Dot-separated version components with an optional letter suffix.
    Versioned {
        parts: Vec<u64>,
        /// `a` = 1 … `z` = 26, 0 if absent
        suffix: u8,
        tagged: bool,
    },
    /// Year, month, day, hour, minute, second.
    Dated { parts: [u64; 6], tagged: bool },
}

impl VersionDescriptor {
    /// Extracts the best marker from a path's file stem.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();
        Self::from_stem(&stem)
    }

    /// Extracts the best marker from a bare name (no extension handling).
    #[must_use]
    pub fn from_stem(stem: &str) -> Self {
        let name = stem.to_ascii_lowercase();
        let has_tag = TAG_RE.is_match(&name);
        let mut best: Option<Self> = None;
        let mut consider = |candidate: Self| {
            if best.as_ref().is_none_or(|current| candidate > *current) {
                best = Some(candidate);
            }
        };

        for caps in DATE_RE.captures_iter(&name) {
            let parts = [2, 3, 4, 5, 6, 7].map(|group| number(&caps, group));
            if let Some(candidate) = Self::dated(parts, has_tag) {
                consider(candidate);
            }
        }

        for caps in DATE_COMPACT_RE.captures_iter(&name) {
            let ymd = &caps[2];
            let mut parts = [
                parse_number(&ymd[0..4]),
                parse_number(&ymd[4..6]),
                parse_number(&ymd[6..8]),
                0,
                0,
                0,
            ];
            if let Some(hms) = caps.get(3).map(|m| m.as_str()) {
                parts[3] = parse_number(&hms[0..2]);
                parts[4] = parse_number(&hms[2..4]);
                if hms.len() == 6 {
                    parts[5] = parse_number(&hms[4..6]);
                }
            }
            if let Some(candidate) = Self::dated(parts, has_tag) {
                consider(candidate);
            }
        }

        for caps in YEAR_MONTH_RE.captures_iter(&name) {
            let parts = [number(&caps, 2), number(&caps, 3), 0, 0, 0, 0];
            if (1..=12).contains(&parts[1]) {
                consider(Self::Dated {
                    parts,
                    tagged: has_tag,
                });
            }
        }

        for caps in QUARTER_RE.captures_iter(&name) {
            let parts = [number(&caps, 2), number(&caps, 4) * 3, 0, 0, 0, 0];
            consider(Self::Dated {
                parts,
                tagged: has_tag,
            });
        }

        for re in [&*VERSION_RE, &*V_SEPARATOR_RE, &*SEPARATOR_V_RE] {
            for caps in re.captures_iter(&name) {
                consider(Self::Versioned {
                    parts: parse_version_parts(&caps[2]),
                    suffix: suffix_value(&caps[3]),
                    tagged: has_tag,
                });
            }
        }

        for caps in PREFIX_VERSION_RE.captures_iter(&name) {
            consider(Self::Versioned {
                parts: parse_version_parts(&caps[3]),
                suffix: suffix_value(&caps[4]),
                tagged: true,
            });
        }

        for re in [&*REV_RE, &*TAG_VERSION_RE] {
            for caps in re.captures_iter(&name) {
                consider(Self::tagged_marker(&caps));
            }
        }

        match best {
            Some(best) => best,
            None if has_tag => Self::Tagged,
            None => Self::None,
        }
    }

    /// A date candidate, or `None` if any field is out of calendar range.
    fn dated(parts: [u64; 6], tagged: bool) -> Option<Self> {
        let [_, month, day, hour, minute, second] = parts;
        let valid = (1..=12).contains(&month)
            && (1..=31).contains(&day)
            && hour <= 23
            && minute <= 59
            && second <= 59;
        valid.then_some(Self::Dated { parts, tagged })
    }

    /// A revision or tag marker: `rev3` has parts `[3]`, `revb` has `[0]`
    /// with suffix `b`, bare `rev` is tag-only.
    fn tagged_marker(caps: &Captures<'_>) -> Self {
        let digits = caps.get(3).map_or("", |m| m.as_str());
        let suffix = caps.get(4).map_or("", |m| m.as_str());
        if !digits.is_empty() {
            Self::Versioned {
                parts: vec![parse_number(digits)],
                suffix: suffix_value(suffix),
                tagged: true,
            }
        } else if !suffix.is_empty() {
            Self::Versioned {
                parts: vec![0],
                suffix: suffix_value(suffix),
                tagged: true,
            }
        } else {
            Self::Tagged
        }
    }

    #[must_use]
    pub fn is_date(&self) -> bool {
        matches!(self, Self::Dated { .. })
    }

    #[must_use]
    pub fn is_tagged(&self) -> bool {
        match self {
            Self::None => false,
            Self::Tagged => true,
            Self::Versioned { tagged, .. } | Self::Dated { tagged, .. } => *tagged,
        }
    }

    /// Numeric components; empty for `None` and `Tagged`.
    #[must_use]
    pub fn components(&self) -> &[u64] {
        match self {
            Self::Versioned { parts, .. } => parts,
            Self::Dated { parts, .. } => parts,
            Self::None | Self::Tagged => &[],
        }
    }

    #[must_use]
    pub fn suffix(&self) -> u8 {
        match self {
            Self::Versioned { suffix, .. } => *suffix,
            _ => 0,
        }
    }

    fn has_components(&self) -> bool {
        matches!(self, Self::Versioned { .. } | Self::Dated { .. })
    }
}

impl Ord for VersionDescriptor {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.is_date() != other.is_date() {
            return self.is_date().cmp(&other.is_date());
        }

        match (self.has_components(), other.has_components()) {
            (true, true) => compare_components(self.components(), other.components())
                .then_with(|| self.suffix().cmp(&other.suffix()))
                .then_with(|| self.is_tagged().cmp(&other.is_tagged())),
            // A bare tag outranks a version number; anything outranks nothing.
            (false, true) => {
                if self.is_tagged() {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            }
            (true, false) => {
                if other.is_tagged() {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            (false, false) => self.is_tagged().cmp(&other.is_tagged()),
        }
    }
}

impl PartialOrd for VersionDescriptor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Equality follows the ordering: `v1` and `v1.0` are the same version.
impl PartialEq for VersionDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionDescriptor {}

impl std::fmt::Display for VersionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = if self.is_tagged() { "+tag" } else { "" };
        match self {
            Self::None => write!(f, "none"),
            Self::Tagged => write!(f, "tag"),
            Self::Versioned { parts, suffix, .. } => {
                let joined: Vec<String> = parts.iter().map(u64::to_string).collect();
                write!(f, "v{}", joined.join("."))?;
                if *suffix > 0 {
                    write!(f, "{}", char::from(b'a' + suffix - 1))?;
                }
                write!(f, "{tag}")
            }
            Self::Dated { parts, .. } => write!(
                f,
                "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}{tag}",
                parts[0], parts[1], parts[2], parts[3], parts[4], parts[5]
            ),
        }
    }
}

fn compare_components(left: &[u64], right: &[u64]) -> Ordering {
    let len = left.len().max(right.len());
    (0..len)
        .map(|i| {
            let l = left.get(i).copied().unwrap_or(0);
            let r = right.get(i).copied().unwrap_or(0);
            l.cmp(&r)
        })
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn parse_number(digits: &str) -> u64 {
    digits.parse().unwrap_or(0)
}

fn number(caps: &Captures<'_>, group: usize) -> u64 {
    caps.get(group).map_or(0, |m| parse_number(m.as_str()))
}

fn parse_version_parts(value: &str) -> Vec<u64> {
    value
        .split('.')
        .filter(|segment| !segment.is_empty())
        .map(parse_number)
        .collect()
}

fn suffix_value(suffix: &str) -> u8 {
    match suffix.as_bytes().first() {
        Some(&c @ b'a'..=b'z') => c - b'a' + 1,
        _ => 0,
    }
}
