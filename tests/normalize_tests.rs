use docdiff::{
    compare_input_files, normalize_stream, parse_file, CompareSettings, ConfigFile,
    IgnoreNormalizer, IgnoreRule, JsonPointer, NormalizeError, Normalizer, ResourceFilter,
};
use std::path::Path;

const REVISION: &str = "/metadata/annotations/deployment.kubernetes.io~1revision";

fn fixtures() -> (docdiff::DocumentStream, docdiff::DocumentStream) {
    (
        parse_file(Path::new("tests/fixtures/deployment_old.yaml")).unwrap(),
        parse_file(Path::new("tests/fixtures/deployment_new.yaml")).unwrap(),
    )
}

#[test]
fn test_normalized_field_is_not_reported() {
    let (mut from, mut to) = fixtures();
    let normalizer = IgnoreNormalizer::from_paths([REVISION]).unwrap();
    normalize_stream(&normalizer, &mut from).unwrap();
    normalize_stream(&normalizer, &mut to).unwrap();

    let report = compare_input_files(from, to, &CompareSettings::default()).unwrap();
    assert!(report.find(REVISION).is_none());
    assert_eq!(report.len(), 4);
}

#[test]
fn test_scoped_rule_skips_other_kinds() {
    let (mut from, _) = fixtures();
    let normalizer = IgnoreNormalizer::new(vec![IgnoreRule::new(
        ResourceFilter::any().kind("Service"),
        JsonPointer::parse("/spec/ports").unwrap(),
    )]);
    normalize_stream(&normalizer, &mut from).unwrap();

    let deployment = from.documents[0].root().unwrap();
    assert!(deployment.get("spec").is_some());
    let service = from.documents[1].root().unwrap();
    assert!(service.get("spec").unwrap().get("ports").is_none());
}

#[test]
fn test_rules_from_config_file() {
    let config = ConfigFile::load(Path::new("tests/fixtures/docdiff.toml")).unwrap();
    let normalizer = IgnoreNormalizer::from_config_rules(&config.normalize).unwrap();
    assert_eq!(normalizer.rules().len(), 1);
    assert_eq!(normalizer.rules()[0].filter.kind.as_deref(), Some("Deployment"));

    let (mut from, _) = fixtures();
    normalize_stream(&normalizer, &mut from).unwrap();
    assert_eq!(
        from.documents[0].scalar_at(&["metadata", "annotations", "deployment.kubernetes.io/revision"]),
        None
    );
}

#[test]
fn test_construction_fails_fast_on_bad_pointer() {
    for bad in ["", "no-slash", "/bad~escape"] {
        let result = IgnoreNormalizer::from_paths(["/fine", bad]);
        assert!(
            matches!(result, Err(NormalizeError::InvalidPointer { .. })),
            "{:?} should be rejected",
            bad
        );
    }
}

#[test]
fn test_missing_paths_never_fail() {
    let (mut from, _) = fixtures();
    let before = from.clone();
    let normalizer = IgnoreNormalizer::from_paths(["/does/not/exist", "/kind/deeper"]).unwrap();
    for document in &mut from.documents {
        normalizer.normalize(document).unwrap();
    }
    assert_eq!(from, before);
}

#[test]
fn test_normalizer_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<IgnoreNormalizer>();
    assert_send_sync::<CompareSettings>();
}
