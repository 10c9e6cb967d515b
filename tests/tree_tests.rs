use docdiff::{parse_yaml, Anchors, Node, NodeKind, ResourceId, Tag};

#[test]
fn test_type_name() {
    assert_eq!(Node::null().type_name(), "null");
    assert_eq!(Node::bool(true).type_name(), "bool");
    assert_eq!(Node::int(42).type_name(), "int");
    assert_eq!(Node::float(4.2).type_name(), "float");
    assert_eq!(Node::string("test").type_name(), "string");
    assert_eq!(Node::mapping(Vec::<(String, Node)>::new()).type_name(), "map");
    assert_eq!(Node::sequence(vec![]).type_name(), "list");
    assert_eq!(Node::scalar(Tag::Custom("!Ref".to_string()), "x").type_name(), "!Ref");
}

#[test]
fn test_float_spelling() {
    assert_eq!(Node::float(1.0).as_scalar(), Some("1.0"));
    assert_eq!(Node::float(2.5).as_scalar(), Some("2.5"));
}

#[test]
fn test_preview() {
    assert_eq!(Node::string("hello").preview(100), "\"hello\"");
    assert_eq!(Node::int(42).preview(100), "42");
    assert_eq!(Node::sequence([Node::int(1), Node::int(2)]).preview(100), "[ 2 items ]");
    assert_eq!(Node::mapping([("a", Node::int(1))]).preview(100), "{ 1 key }");
    assert_eq!(Node::empty_document().preview(100), "(empty document)");
    assert_eq!(Node::string("a".repeat(30)).preview(10), "\"aaaaaa...");
}

#[test]
fn test_document_root_and_lookup() {
    let document = parse_yaml("metadata:\n  name: web\n").unwrap().remove(0);
    assert_eq!(document.kind(), NodeKind::Document);
    assert_eq!(document.root().unwrap().kind(), NodeKind::Mapping);
    assert_eq!(document.scalar_at(&["metadata", "name"]), Some("web"));
    assert_eq!(document.scalar_at(&["metadata", "missing"]), None);
    assert_eq!(Node::empty_document().root(), None);
}

#[test]
fn test_get_mut() {
    let mut node = Node::mapping([("a", Node::int(1))]);
    *node.get_mut("a").unwrap() = Node::int(2);
    assert_eq!(node.get("a"), Some(&Node::int(2)));
    assert!(Node::int(1).get("a").is_none());
}

#[test]
fn test_resource_id() {
    let document = parse_yaml("apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n")
        .unwrap()
        .remove(0);
    let id = document.resource_id().unwrap();
    assert_eq!(
        id,
        ResourceId {
            api_version: "apps/v1".to_string(),
            kind: "Deployment".to_string(),
            namespace: None,
            name: "web".to_string(),
        }
    );
    assert_eq!(id.to_string(), "apps/v1/Deployment/web");
    assert!(Node::int(1).resource_id().is_none());
}

#[test]
fn test_anchor_materialize() {
    let mut anchors = Anchors::new();
    let port = anchors.register(Node::int(80));
    let node = Node::sequence([Node::alias(port), Node::alias(port)]);
    assert_eq!(
        anchors.materialize(&node).unwrap(),
        Node::sequence([Node::int(80), Node::int(80)])
    );
    assert_eq!(anchors.len(), 1);
}
