use image_release_manager::release::reconcile::batch_job;
use image_release_manager::version::Version;
use image_release_manager::version::latest::{find_max, is_latest_minor};

#[test]
fn versions_sort_numerically_by_component() {
    assert!(Version::parse("1.9.9") < Version::parse("1.20.0"));
    assert!(Version::parse("1.20.0") < Version::parse("1.100"));

    assert!(Version::parse("1") < Version::parse("1.99.99"));
    assert!(Version::parse("1.99.99") < Version::parse("2"));
}

#[test]
fn pre_releases_sort_below_the_release() {
    assert!(Version::parse("1.0.0-RC1") < Version::parse("1.0.0-RC2"));
    assert!(Version::parse("1.0.0-RC2") < Version::parse("1"));

    assert!(Version::parse("1.0.0-m1") < Version::parse("1.0.0-tinymcebeta"));
    assert!(Version::parse("1.0.0-tinymcebeta") < Version::parse("1.0.0-RC1"));
}

#[test]
fn pre_release_numbers_compare_numerically() {
    assert!(Version::parse("8.16.0-RC9") < Version::parse("8.16.0-RC10"));
    assert_eq!(
        find_max(&["8.16.0-RC10".to_string(), "8.16.0-RC9".to_string()]),
        Some("8.16.0-RC10")
    );
}

#[test]
fn latest_minor_is_the_newest_patch_of_its_line() {
    let versions: Vec<String> = ["5.4.3", "5.6.7", "5.6.9", "5.7.7", "5.7.8"]
        .iter()
        .map(|v| v.to_string())
        .collect();

    assert!(!is_latest_minor("5.7.7", &versions));
    assert!(is_latest_minor("5.7.8", &versions));
    assert!(!is_latest_minor("5.6.7", &versions));
}

#[test]
fn find_max_prefers_release_over_equal_suffixed_version() {
    let versions = vec!["6.0.0-EAP01".to_string(), "6.0.0".to_string()];

    assert_eq!(find_max(&versions), Some("6.0.0"));
}

#[test]
fn sorting_a_feed_uses_version_order() {
    let mut versions = vec!["1.100", "1.9.9", "2", "1.20.0", "2.0.0-RC1"];
    versions.sort_by_key(|v| Version::parse(v));

    assert_eq!(versions, vec!["1.9.9", "1.20.0", "1.100", "2.0.0-RC1", "2"]);
}

#[test]
fn shards_reassemble_the_candidate_list() {
    let versions: Vec<String> = (0..68).map(|i| format!("3.2.{}", i)).collect();

    for total in [1, 5, 12, 68, 70] {
        let reassembled: Vec<String> = (0..total)
            .flat_map(|offset| batch_job(&versions, total, offset).to_vec())
            .collect();
        assert_eq!(reassembled, versions, "{} shards", total);
    }
}
