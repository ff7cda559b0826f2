use super::*;

#[test]
fn builtin_list_is_loaded() {
    let set = ExclusionSet::builtin();
    assert_eq!(set.len(), BUILTIN_EXCLUSIONS.len());
    assert!(set.contains("overlay", "background-opacity"));
    assert!(set.contains("mapbox-gl-js#5631", "regressions"));
    assert!(!set.contains("background-opacity", "overlay"));
}

#[test]
fn matching_is_exact_and_case_sensitive() {
    let set: ExclusionSet = [("pitchAndBearing", "line-pitch")].into_iter().collect();
    assert!(set.contains("pitchAndBearing", "line-pitch"));
    assert!(!set.contains("pitchandbearing", "line-pitch"));
    assert!(!set.contains("pitchAndBearing", "Line-Pitch"));
    assert!(!set.contains("pitchAndBearing ", "line-pitch"));
}

#[test]
fn ignore_document_keys_become_pairs() {
    let json = r#"{
        "render-tests/line-pitch/pitch15": "https://example.invalid/issue/1",
        "query-tests/fill/bad": "skip",
        "circle-radius/zoom": ""
    }"#;
    let set = ExclusionSet::from_ignore_reader(json.as_bytes()).unwrap();
    assert_eq!(set.len(), 3);
    assert!(set.contains("pitch15", "line-pitch"));
    assert!(set.contains("bad", "fill"));
    assert!(set.contains("zoom", "circle-radius"));
}

#[test]
fn ignore_document_rejects_single_segment_keys() {
    let err = ExclusionSet::from_ignore_reader(r#"{ "lonely": "x" }"#.as_bytes()).unwrap_err();
    assert!(err.to_string().contains("parse error:"));
}

#[test]
fn extend_merges_sets() {
    let mut set = ExclusionSet::empty();
    assert!(set.is_empty());
    set.extend(ExclusionSet::builtin());
    set.insert("extra", "cat");
    assert_eq!(set.len(), BUILTIN_EXCLUSIONS.len() + 1);
    let first = set.iter().next().unwrap();
    assert_eq!(first, ("1024-circle", "extent"));
}
