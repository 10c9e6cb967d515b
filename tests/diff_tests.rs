use docdiff::{
    compare_input_files, parse_file, parse_yaml, Anchors, Comparators, CompareError,
    CompareSettings, DetailKind, DocumentStream, Node, Report,
};
use std::path::Path;

fn stream(location: &str, yaml: &str) -> DocumentStream {
    DocumentStream::new(location, parse_yaml(yaml).unwrap())
}

fn compare_with(from: &str, to: &str, settings: &CompareSettings) -> Report {
    compare_input_files(stream("from", from), stream("to", to), settings).unwrap()
}

fn compare(from: &str, to: &str) -> Report {
    compare_with(from, to, &CompareSettings::default())
}

fn paths(report: &Report) -> Vec<String> {
    report.diffs.iter().map(|d| d.path.to_string()).collect()
}

#[test]
fn test_identical_documents_have_no_diffs() {
    let from = parse_file(Path::new("tests/fixtures/deployment_old.yaml")).unwrap();
    let to = parse_file(Path::new("tests/fixtures/deployment_old.yaml")).unwrap();
    let report = compare_input_files(from, to, &CompareSettings::default()).unwrap();
    assert!(report.is_empty());
    assert!(report.stats().is_empty());
}

#[test]
fn test_null_spellings_are_equal() {
    assert!(compare("a: null", "a: ~").is_empty());
    assert!(compare("a:", "a: null").is_empty());
    assert!(compare("a: Null", "a: NULL").is_empty());
}

#[test]
fn test_mapping_addition_is_packed_at_parent() {
    let report = compare("{a: 1}", "{a: 1, b: 2}");
    assert_eq!(report.diffs.len(), 1);
    assert_eq!(report.diffs[0].path.to_string(), "/");
    let details = &report.diffs[0].details;
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].kind, DetailKind::Addition);
    assert_eq!(details[0].from, None);
    assert_eq!(details[0].to, Some(Node::mapping([("b", Node::int(2))])));
}

#[test]
fn test_mapping_removal_is_packed_at_parent() {
    let report = compare("{a: 1, b: 2}", "{}");
    assert_eq!(report.diffs.len(), 1);
    let details = &report.diffs[0].details;
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].kind, DetailKind::Removal);
    assert_eq!(
        details[0].from,
        Some(Node::mapping([("a", Node::int(1)), ("b", Node::int(2))]))
    );
}

#[test]
fn test_named_list_correlation_with_order_change() {
    let report = compare(
        "- {name: x, v: 1}\n- {name: y, v: 2}",
        "- {name: y, v: 3}\n- {name: x, v: 1}",
    );
    assert_eq!(paths(&report), vec!["/", "/name=y/v"]);

    let order = &report.diffs[0].details;
    assert_eq!(order.len(), 1);
    assert_eq!(order[0].kind, DetailKind::OrderChange);
    assert_eq!(
        order[0].from,
        Some(Node::sequence([Node::string("x"), Node::string("y")]))
    );
    assert_eq!(
        order[0].to,
        Some(Node::sequence([Node::string("y"), Node::string("x")]))
    );

    let modification = &report.diffs[1].details[0];
    assert_eq!(modification.kind, DetailKind::Modification);
    assert_eq!(modification.from, Some(Node::int(2)));
    assert_eq!(modification.to, Some(Node::int(3)));
}

#[test]
fn test_named_list_order_change_can_be_ignored() {
    let settings = CompareSettings::default().ignore_order_changes(true);
    let report = compare_with(
        "- {name: x, v: 1}\n- {name: y, v: 2}",
        "- {name: y, v: 3}\n- {name: x, v: 1}",
        &settings,
    );
    assert_eq!(paths(&report), vec!["/name=y/v"]);
}

#[test]
fn test_named_list_detail_order() {
    let report = compare(
        "- name: a\n- name: b\n- name: c",
        "- name: b\n- name: a\n- name: d",
    );
    assert_eq!(report.diffs.len(), 1);
    let kinds: Vec<DetailKind> = report.diffs[0].details.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DetailKind::OrderChange,
            DetailKind::Removal,
            DetailKind::Addition
        ]
    );
}

#[test]
fn test_duplicate_names_fall_back_to_simple_list() {
    let report = compare(
        "- {name: a, v: 1}\n- {name: a, v: 2}",
        "- {name: a, v: 1}\n- {name: a, v: 3}",
    );
    assert!(paths(&report).iter().all(|p| !p.contains("name=")));
    assert_eq!(report.diffs.len(), 1);
    let kinds: Vec<DetailKind> = report.diffs[0].details.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![DetailKind::Removal, DetailKind::Addition]);
}

#[test]
fn test_simple_list_reorder() {
    let report = compare("[1, 2, 3]", "[3, 2, 1]");
    assert_eq!(report.diffs.len(), 1);
    let details = &report.diffs[0].details;
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].kind, DetailKind::OrderChange);

    let settings = CompareSettings::default().ignore_order_changes(true);
    assert!(compare_with("[1, 2, 3]", "[3, 2, 1]", &settings).is_empty());
}

#[test]
fn test_simple_list_matches_mappings_regardless_of_key_order() {
    let report = compare("- {a: 1, b: 2}\n- c", "- c\n- {b: 2, a: 1}");
    assert_eq!(report.diffs[0].details[0].kind, DetailKind::OrderChange);
}

#[test]
fn test_ignored_addition_path() {
    let settings = CompareSettings::default().paths_to_ignore_addition(["/a"]);
    assert!(compare_with("{}", "{a: 1}", &settings).is_empty());
    assert!(!compare_with("{}", "{b: 1}", &settings).is_empty());
}

#[test]
fn test_ignored_removal_path() {
    let settings = CompareSettings::default().paths_to_ignore_removal(["/spec/paused"]);
    let report = compare_with("spec: {paused: true, x: 1}", "spec: {x: 1}", &settings);
    assert!(report.is_empty());
}

#[test]
fn test_custom_comparator_overrides_string_equality() {
    let settings =
        CompareSettings::default().comparators(Comparators::new().register("/a", |_, _| true));
    assert!(compare_with("a: foo", "a: bar", &settings).is_empty());
    assert!(!compare_with("b: foo", "b: bar", &settings).is_empty());
    // only consulted for strings
    assert!(!compare_with("a: 1", "a: 2", &settings).is_empty());
}

#[test]
fn test_last_applied_configuration_compares_as_json() {
    let from = "metadata:\n  annotations:\n    kubectl.kubernetes.io/last-applied-configuration: '{\"a\":1,\"b\":[1,2]}'\n";
    let to = "metadata:\n  annotations:\n    kubectl.kubernetes.io/last-applied-configuration: '{ \"b\": [1, 2], \"a\": 1 }'\n";
    assert!(compare(from, to).is_empty());

    let settings = CompareSettings::default().comparators(Comparators::new());
    assert_eq!(compare_with(from, to, &settings).diffs.len(), 1);
}

#[test]
fn test_document_count_mismatch_is_an_error() {
    let result = compare_input_files(
        stream("one.yaml", "a: 1"),
        stream("two.yaml", "a: 1\n---\na: 2"),
        &CompareSettings::default(),
    );
    match result {
        Err(CompareError::DocumentCountMismatch {
            from_count,
            to_count,
            ..
        }) => {
            assert_eq!(from_count, 1);
            assert_eq!(to_count, 2);
        }
        other => panic!("Expected DocumentCountMismatch, got {:?}", other),
    }
}

#[test]
fn test_documents_are_paired_by_index() {
    let report = compare("a: 1\n---\nb: 1", "a: 1\n---\nb: 2");
    assert_eq!(report.diffs.len(), 1);
    assert_eq!(report.diffs[0].path.document, 1);
    assert_eq!(report.diffs[0].path.to_string(), "/b");
}

#[test]
fn test_guessed_identifier_respects_threshold() {
    let from = "- {host: a, ip: x}\n- {host: b, ip: y}\n- {host: c, ip: z}";
    let to = "- {host: a, ip: x}\n- {host: b, ip: y}\n- {host: c, ip: w}";

    let report = compare(from, to);
    assert_eq!(paths(&report), vec!["/"]);

    let settings = CompareSettings::default().non_standard_identifier_guess_count_threshold(2);
    let report = compare_with(from, to, &settings);
    assert_eq!(paths(&report), vec!["/host=c/ip"]);
}

#[test]
fn test_aliases_are_resolved_before_comparison() {
    let mut anchors = Anchors::new();
    let limits = anchors.register(Node::mapping([("cpu", Node::string("1"))]));
    let from = DocumentStream::single("from", Node::mapping([("resources", Node::alias(limits))]))
        .with_anchors(anchors);
    let to = DocumentStream::single(
        "to",
        Node::mapping([("resources", Node::mapping([("cpu", Node::string("2"))]))]),
    );

    let report = compare_input_files(from, to, &CompareSettings::default()).unwrap();
    assert_eq!(report.diffs.len(), 1);
    assert_eq!(report.diffs[0].path.to_string(), "/resources/cpu");
    assert_eq!(report.diffs[0].details[0].from, Some(Node::string("1")));
}

#[test]
fn test_alias_payloads_are_materialized() {
    let mut anchors = Anchors::new();
    let shared = anchors.register(Node::sequence([Node::int(1)]));
    let from = DocumentStream::single("from", Node::mapping([("a", Node::int(0))]));
    let to = DocumentStream::single(
        "to",
        Node::mapping([("a", Node::int(0)), ("b", Node::alias(shared))]),
    )
    .with_anchors(anchors);

    let report = compare_input_files(from, to, &CompareSettings::default()).unwrap();
    assert_eq!(
        report.diffs[0].details[0].to,
        Some(Node::mapping([("b", Node::sequence([Node::int(1)]))]))
    );
}

/// Existing behavior, kept as is: when one side has no value at all the
/// change is a single modification rather than an addition or removal.
#[test]
fn test_one_side_absent_is_a_modification() {
    let report = compare("", "a: 1");
    assert_eq!(report.diffs.len(), 1);
    assert_eq!(report.diffs[0].path.to_string(), "/");
    let detail = &report.diffs[0].details[0];
    assert_eq!(detail.kind, DetailKind::Modification);
    assert_eq!(detail.from, None);
    assert_eq!(detail.to, Some(Node::mapping([("a", Node::int(1))])));
}

#[test]
fn test_fixture_deployment_changes() {
    let from = parse_file(Path::new("tests/fixtures/deployment_old.yaml")).unwrap();
    let to = parse_file(Path::new("tests/fixtures/deployment_new.yaml")).unwrap();
    let report = compare_input_files(from, to, &CompareSettings::default()).unwrap();

    assert_eq!(
        paths(&report),
        vec![
            "/metadata/annotations/deployment.kubernetes.io~1revision",
            "/spec/replicas",
            "/spec/template/spec/containers",
            "/spec/template/spec/containers/name=web/image",
            "/spec/ports",
        ]
    );
    let stats = report.stats();
    assert_eq!(stats.modifications, 3);
    assert_eq!(stats.order_changes, 1);
    assert_eq!(stats.additions, 1);
    assert_eq!(report.diffs[4].path.document, 1);
}
