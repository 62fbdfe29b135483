//! Structural product version model

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Release category derived from the suffix after the first `-`.
///
/// Ordered by declaration, so a milestone sorts below a beta, a beta below a
/// release candidate, and a release candidate below the final release.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReleaseType {
    Milestone,
    Beta,
    ReleaseCandidate,
    #[default]
    Release,
}

impl ReleaseType {
    /// Classify a version suffix (the part after the first `-`), case-insensitively.
    ///
    /// Any suffix that is not recognised, including an empty one, is a `Release`.
    pub fn classify(suffix: &str) -> Self {
        let suffix = suffix.to_lowercase();
        if suffix.contains("beta") {
            ReleaseType::Beta
        } else if suffix.starts_with("rc") {
            ReleaseType::ReleaseCandidate
        } else if suffix.starts_with('m') {
            ReleaseType::Milestone
        } else {
            ReleaseType::Release
        }
    }
}

/// Major component of a version.
///
/// A major that is not a number is kept verbatim. Numeric majors always sort
/// below raw ones so the order stays total.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Major {
    Number(u64),
    Raw(String),
}

impl fmt::Display for Major {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Major::Number(n) => write!(f, "{}", n),
            Major::Raw(s) => f.write_str(s),
        }
    }
}

/// A dotted product version such as `8.16.0`, `6.0.0-RC2` or `1.0.0-m1`.
///
/// Ordering is `(major, minor, patch, build, release_type)`, then the suffix:
/// its first number (`RC9 < RC10`), then its text. A bare version sorts above
/// every suffixed one with the same components. Equality and hashing use the
/// same key, so `6.7` and `6.7.0` are equal; `raw` keeps the original string.
#[derive(Debug, Clone)]
pub struct Version {
    pub major: Major,
    pub minor: u64,
    pub patch: u64,
    pub build: u64,
    pub release_type: ReleaseType,
    pub raw: String,
}

impl Version {
    /// Parse a version string. Never fails.
    ///
    /// Examples:
    /// - "6" -> (6, 0, 0, 0, Release)
    /// - "6.7.8" -> (6, 7, 8, 0, Release)
    /// - "6.0.0-RC2" -> (6, 0, 0, 0, ReleaseCandidate)
    /// - "latest" -> (Raw("latest"), 0, 0, 0, Release)
    pub fn parse(s: &str) -> Self {
        let (version_part, type_part) = s.split_once('-').unwrap_or((s, ""));
        let mut components = version_part.split('.').map(|c| c.parse::<u64>().ok());

        let major = match components.next().flatten() {
            Some(n) => Major::Number(n),
            None => Major::Raw(s.to_string()),
        };
        let mut next = || components.next().flatten().unwrap_or(0);
        let minor = next();
        let patch = next();
        let build = next();

        Self {
            major,
            minor,
            patch,
            build,
            release_type: ReleaseType::classify(type_part),
            raw: s.to_string(),
        }
    }

    /// True when the major component parsed as a number.
    pub fn is_numeric(&self) -> bool {
        matches!(self.major, Major::Number(_))
    }

    /// Same major component as `other`.
    pub fn same_major(&self, other: &Version) -> bool {
        self.major == other.major
    }

    /// Same major and minor components as `other`.
    pub fn same_minor(&self, other: &Version) -> bool {
        self.major == other.major && self.minor == other.minor
    }

    /// The text after the first `-`, if any.
    pub fn suffix(&self) -> Option<&str> {
        match self.major {
            Major::Number(_) => self.raw.split_once('-').map(|(_, suffix)| suffix),
            Major::Raw(_) => None,
        }
    }

    fn key(&self) -> (&Major, u64, u64, u64, ReleaseType, SuffixRank<'_>) {
        let suffix = match self.suffix() {
            Some(suffix) => SuffixRank::Suffixed {
                ordinal: suffix_ordinal(suffix),
                text: suffix,
            },
            None => SuffixRank::Bare,
        };
        (
            &self.major,
            self.minor,
            self.patch,
            self.build,
            self.release_type,
            suffix,
        )
    }
}

/// Last component of the ordering key. Declaration order puts `Bare` on top.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum SuffixRank<'a> {
    Suffixed { ordinal: u64, text: &'a str },
    Bare,
}

/// First run of digits in a suffix: `RC10` -> 10, `EAP01` -> 1, `tinymcebeta` -> 0.
fn suffix_ordinal(suffix: &str) -> u64 {
    suffix
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Version {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.9.9", "1.20.0")]
    #[case("1.20.0", "1.100")]
    #[case("1", "1.99.99")]
    #[case("1.99.99", "2")]
    #[case("1.0.0-RC1", "1.0.0-RC2")]
    #[case("1.0.0-RC2", "1.0.0")]
    #[case("1.0.0-RC2", "1")]
    #[case("1.0.0-m1", "1.0.0-tinymcebeta")]
    #[case("1.0.0-tinymcebeta", "1.0.0-RC1")]
    #[case("8.16.0.1", "8.16.1")]
    #[case("8.16.0-RC9", "8.16.0-RC10")]
    #[case("9.0.0-EAP01", "9.0.0-EAP02")]
    #[case("1.0.0-m9", "1.0.0-M10")]
    #[case("6.0.0-foo", "6.0.0")]
    fn versions_are_ordered(#[case] lower: &str, #[case] higher: &str) {
        assert!(Version::parse(lower) < Version::parse(higher));
    }

    #[rstest]
    #[case("", ReleaseType::Release)]
    #[case("RC1", ReleaseType::ReleaseCandidate)]
    #[case("rc02", ReleaseType::ReleaseCandidate)]
    #[case("m55", ReleaseType::Milestone)]
    #[case("M1", ReleaseType::Milestone)]
    #[case("tinymcebeta", ReleaseType::Beta)]
    #[case("Beta2", ReleaseType::Beta)]
    #[case("EAP01", ReleaseType::Release)]
    fn classify_suffix(#[case] suffix: &str, #[case] expected: ReleaseType) {
        assert_eq!(ReleaseType::classify(suffix), expected);
    }

    #[test]
    fn parse_fills_missing_components_with_zero() {
        let version = Version::parse("6.7");

        assert_eq!(version.major, Major::Number(6));
        assert_eq!(version.minor, 7);
        assert_eq!(version.patch, 0);
        assert_eq!(version.build, 0);
        assert_eq!(version.release_type, ReleaseType::Release);
        assert_eq!(version.raw, "6.7");
    }

    #[test]
    fn parse_splits_only_on_first_hyphen() {
        let version = Version::parse("6.0.0-RC1-jdk11");

        assert_eq!(version.major, Major::Number(6));
        assert_eq!(version.release_type, ReleaseType::ReleaseCandidate);
    }

    #[test]
    fn parse_keeps_non_numeric_major_as_raw() {
        let version = Version::parse("latest");

        assert_eq!(version.major, Major::Raw("latest".to_string()));
        assert!(!version.is_numeric());
        assert!(Version::parse("999") < version);
    }

    #[test]
    fn equality_ignores_missing_trailing_zeros() {
        assert_eq!(Version::parse("6.7"), Version::parse("6.7.0"));
        assert_ne!(Version::parse("6.7.0"), Version::parse("6.7.0-RC1"));
        assert_ne!(Version::parse("6.7.0-RC1"), Version::parse("6.7.0-RC01-jdk11"));
    }

    #[test]
    fn equal_versions_hash_alike() {
        use std::collections::HashSet;

        let versions: HashSet<Version> = ["6.7", "6.7.0", "6.7.0-RC1", "6.7.0-RC2"]
            .into_iter()
            .map(Version::parse)
            .collect();

        assert_eq!(versions.len(), 3);
    }

    #[rstest]
    #[case("RC10", 10)]
    #[case("EAP01", 1)]
    #[case("RC1-jdk11", 1)]
    #[case("tinymcebeta", 0)]
    fn suffix_ordinal_reads_first_number(#[case] suffix: &str, #[case] expected: u64) {
        assert_eq!(suffix_ordinal(suffix), expected);
    }
}
