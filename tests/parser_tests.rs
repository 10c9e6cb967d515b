use docdiff::{
    parse_content, parse_file, parse_json, parse_toml, parse_yaml, FormatHint, Node, ParseError,
    Tag,
};
use std::path::Path;

#[test]
fn test_parse_multi_document_fixture() {
    let stream = parse_file(Path::new("tests/fixtures/deployment_old.yaml")).unwrap();
    assert_eq!(stream.len(), 2);
    assert_eq!(stream.location, "tests/fixtures/deployment_old.yaml");
    assert_eq!(stream.documents[0].scalar_at(&["kind"]), Some("Deployment"));
    assert_eq!(stream.documents[1].scalar_at(&["kind"]), Some("Service"));
}

#[test]
fn test_parse_json_fixture_keeps_key_order() {
    let stream = parse_file(Path::new("tests/fixtures/identical_2.json")).unwrap();
    match stream.documents[0].root() {
        Some(Node::Mapping { entries, .. }) => {
            let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
            assert_eq!(keys, vec!["labels", "ports", "name"]);
        }
        other => panic!("Expected mapping, got {:?}", other),
    }
}

#[test]
fn test_parse_toml_fixture() {
    let stream = parse_file(Path::new("tests/fixtures/app_old.toml")).unwrap();
    assert_eq!(stream.len(), 1);
    assert_eq!(stream.documents[0].scalar_at(&["server", "port"]), Some("8080"));
    let root = stream.documents[0].root().unwrap();
    assert!(matches!(root.get("upstream"), Some(Node::Sequence { items, .. }) if items.len() == 2));
}

#[test]
fn test_document_separator_only() {
    let documents = parse_yaml("---\na: 1\n---\n---\nb: 2\n").unwrap();
    assert_eq!(documents.len(), 3);
    assert_eq!(documents[1], Node::empty_document());
}

#[test]
fn test_tags_survive_parsing() {
    let documents = parse_yaml("a: 1\nb: \"1\"\nc: 1.0\nd: true\ne: null").unwrap();
    let root = documents[0].root().unwrap();
    let tags: Vec<Option<&Tag>> = ["a", "b", "c", "d", "e"]
        .iter()
        .map(|key| root.get(key).and_then(Node::tag))
        .collect();
    assert_eq!(
        tags,
        vec![
            Some(&Tag::Int),
            Some(&Tag::Str),
            Some(&Tag::Float),
            Some(&Tag::Bool),
            Some(&Tag::Null)
        ]
    );
}

#[test]
fn test_json_and_yaml_agree() {
    let json = parse_json(r#"{"a": [1, "x", null], "b": {"c": 2.5}}"#).unwrap();
    let yaml = parse_yaml("a: [1, x, null]\nb:\n  c: 2.5\n").unwrap();
    assert_eq!(json, yaml);
}

#[test]
fn test_toml_timestamp_tag() {
    let document = parse_toml("at = 2024-01-01T00:00:00Z").unwrap();
    let root = document.root().unwrap();
    assert_eq!(root.get("at").and_then(Node::tag), Some(&Tag::Timestamp));
}

#[test]
fn test_parse_content_explicit_formats() {
    assert!(parse_content("a = 1", FormatHint::Toml, "inline").is_ok());
    assert!(matches!(
        parse_content("a = [", FormatHint::Toml, "inline"),
        Err(ParseError::TomlError { .. })
    ));
    assert!(matches!(
        parse_content("a: [", FormatHint::Yaml, "inline"),
        Err(ParseError::YamlError { .. })
    ));
}

#[test]
fn test_parse_content_auto_unknown_format() {
    let result = parse_content("key: [unclosed", FormatHint::Auto, "mystery");
    assert!(matches!(result, Err(ParseError::UnknownFormat { ref path }) if path == "mystery"));
}

#[test]
fn test_parse_file_invalid_yaml() {
    let result = parse_file(Path::new("tests/fixtures/invalid.yaml"));
    assert!(matches!(result, Err(ParseError::YamlError { .. })));
}
