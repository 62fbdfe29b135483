//! "Latest" membership checks over a set of version strings

use crate::version::types::Version;

/// Find the maximum version string by `Version` order.
///
/// Versions that compare equal (`6.7` and `6.7.0`) are broken by the greater
/// raw string, so the result is deterministic.
pub fn find_max<'a, I>(versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    versions
        .into_iter()
        .map(|v| (v.as_str(), Version::parse(v)))
        .max_by(|(_, a), (_, b)| a.cmp(b).then_with(|| a.raw.cmp(&b.raw)))
        .map(|(original, _)| original)
}

/// True if `version` is the global maximum of `all_versions`.
pub fn is_latest(version: &str, all_versions: &[String]) -> bool {
    find_max(all_versions) == Some(version)
}

/// True if `version` is the maximum of the versions sharing its major component.
///
/// `version` itself must be one of `all_versions`.
pub fn is_latest_major(version: &str, all_versions: &[String]) -> bool {
    let current = Version::parse(version);
    let same_major = all_versions
        .iter()
        .filter(|v| Version::parse(v).same_major(&current));

    find_max(same_major) == Some(version)
}

/// True if `version` is the maximum of the versions sharing its major.minor prefix.
///
/// `version` itself must be one of `all_versions`.
pub fn is_latest_minor(version: &str, all_versions: &[String]) -> bool {
    let current = Version::parse(version);
    let same_minor = all_versions
        .iter()
        .filter(|v| Version::parse(v).same_minor(&current));

    find_max(same_minor) == Some(version)
}

/// The `major` tag prefix of a version string, e.g. "6" for "6.7.8".
pub fn major_prefix(version: &str) -> &str {
    version.split('.').next().unwrap_or(version)
}

/// The `major.minor` tag prefix of a version string, e.g. "6.7" for "6.7.8".
pub fn minor_prefix(version: &str) -> &str {
    match version.match_indices('.').nth(1) {
        Some((idx, _)) => &version[..idx],
        None => version,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn versions(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case(&[], None)]
    #[case(&["1.0.0", "2.0.0", "1.5.0"], Some("2.0.0"))]
    #[case(&["1.9.9", "1.100", "1.20.0"], Some("1.100"))]
    #[case(&["6.0.0-RC1", "6.0.0-m55", "6.0.0-RC2"], Some("6.0.0-RC2"))]
    #[case(&["6.0.0-EAP01", "6.0.0"], Some("6.0.0"))]
    #[case(&["8.16.0-RC10", "8.16.0-RC9"], Some("8.16.0-RC10"))]
    #[case(&["6.7", "6.7.0"], Some("6.7.0"))]
    fn find_max_returns_expected(#[case] list: &[&str], #[case] expected: Option<&str>) {
        let list = versions(list);
        assert_eq!(find_max(&list), expected);
    }

    #[rstest]
    #[case("5.7.8", true)]
    #[case("5.7.7", false)]
    #[case("5.6.7", false)]
    #[case("5.6.9", true)]
    #[case("5.4.3", true)]
    fn latest_minor(#[case] version: &str, #[case] expected: bool) {
        let list = versions(&["5.4.3", "5.6.7", "5.6.9", "5.7.7", "5.7.8"]);
        assert_eq!(is_latest_minor(version, &list), expected);
    }

    #[rstest]
    #[case("6.7.8", true)]
    #[case("6.7.7", false)]
    #[case("5.6.7", true)]
    #[case("5.4.3", false)]
    fn latest_major(#[case] version: &str, #[case] expected: bool) {
        let list = versions(&["5.4.3", "5.6.7", "6.7.7", "6.7.8"]);
        assert_eq!(is_latest_major(version, &list), expected);
    }

    #[test]
    fn major_does_not_match_by_string_prefix() {
        let list = versions(&["1.2.0", "10.0.0"]);

        assert!(is_latest_major("1.2.0", &list));
        assert!(is_latest_major("10.0.0", &list));
    }

    #[test]
    fn non_member_is_never_latest() {
        let list = versions(&["6.7.7", "6.7.8"]);

        assert!(!is_latest("6.9.0-RC1", &list));
        assert!(!is_latest_major("6.0.0-RC1", &list));
        assert!(!is_latest_minor("6.7.9", &list));
    }

    #[rstest]
    #[case("6.7.8", "6", "6.7")]
    #[case("6.7", "6", "6.7")]
    #[case("6", "6", "6")]
    #[case("8.16.0.1", "8", "8.16")]
    fn prefixes(#[case] version: &str, #[case] major: &str, #[case] minor: &str) {
        assert_eq!(major_prefix(version), major);
        assert_eq!(minor_prefix(version), minor);
    }
}
