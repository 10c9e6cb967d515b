use docdiff::{
    compare_input_files, filter_report, parse_file, CompareSettings, FilterConfig, PathPattern,
    Report,
};
use std::path::Path;

fn fixture_report() -> Report {
    let from = parse_file(Path::new("tests/fixtures/deployment_old.yaml")).unwrap();
    let to = parse_file(Path::new("tests/fixtures/deployment_new.yaml")).unwrap();
    compare_input_files(from, to, &CompareSettings::default()).unwrap()
}

fn paths(report: &Report) -> Vec<String> {
    report.diffs.iter().map(|d| d.path.to_string()).collect()
}

#[test]
fn test_no_filters_keeps_report() {
    let report = fixture_report();
    let filtered = filter_report(report.clone(), &FilterConfig::new());
    assert_eq!(filtered, report);
}

#[test]
fn test_only_pattern() {
    let filtered = filter_report(fixture_report(), &FilterConfig::new().only("/spec/replicas"));
    assert_eq!(paths(&filtered), vec!["/spec/replicas"]);
}

#[test]
fn test_ignore_pattern_with_wildcard() {
    let filtered = filter_report(fixture_report(), &FilterConfig::new().ignore("/metadata/*/*"));
    assert_eq!(filtered.len(), 4);
    assert!(filtered.find("/metadata/annotations/deployment.kubernetes.io~1revision").is_none());
}

#[test]
fn test_named_entry_pattern() {
    let config = FilterConfig::new().only("/spec/template/spec/containers/name=web/**");
    let filtered = filter_report(fixture_report(), &config);
    assert_eq!(
        paths(&filtered),
        vec!["/spec/template/spec/containers/name=web/image"]
    );
}

#[test]
fn test_escaped_pattern_matches_key_with_slash() {
    let config = FilterConfig::new().only("/**/deployment.kubernetes.io~1revision");
    let filtered = filter_report(fixture_report(), &config);
    assert_eq!(filtered.len(), 1);
}

#[test]
fn test_filter_keeps_inputs() {
    let filtered = filter_report(fixture_report(), &FilterConfig::new().ignore("/**"));
    assert!(filtered.is_empty());
    assert_eq!(filtered.from.len(), 2);
    assert_eq!(filtered.to.location, "tests/fixtures/deployment_new.yaml");
}

#[test]
fn test_pattern_segments() {
    let pattern = PathPattern::parse("/a/*/**");
    assert_eq!(pattern.segments.len(), 3);
    assert!(pattern.matches(&["a".to_string(), "b".to_string()]));
    assert!(!pattern.matches(&["a".to_string()]));
}
