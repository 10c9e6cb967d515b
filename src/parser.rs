//! Input parsing for JSON, YAML and TOML.
//!
//! Every input becomes a [`DocumentStream`]. YAML streams yield one document
//! per `---` separator, JSON input may hold several concatenated values, and
//! TOML always holds exactly one document. An input with no content yields a
//! single empty document.
//!
//! The format is detected by file extension (.json, .yaml, .yml, .toml). If
//! the extension is unknown or missing, JSON is tried first, then YAML.
//!
//! # Examples
//!
//! ```no_run
//! use docdiff::parser::parse_file;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let stream = parse_file(Path::new("deployment.yaml"))?;
//! println!("{} documents", stream.len());
//! # Ok(())
//! # }
//! ```

use crate::error::ParseError;
use crate::tree::{DocumentStream, Node, Tag};
use serde::Deserialize;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

/// Location label used for standard input.
pub const STDIN_LOCATION: &str = "<stdin>";

/// Which parser to use for a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatHint {
    /// Try JSON, then YAML.
    #[default]
    Auto,
    Json,
    Yaml,
    Toml,
}

impl FormatHint {
    /// Picks a format from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|s| s.to_lowercase());

        match extension.as_deref() {
            Some("json") => FormatHint::Json,
            Some("yaml") | Some("yml") => FormatHint::Yaml,
            Some("toml") => FormatHint::Toml,
            _ => FormatHint::Auto,
        }
    }
}

/// Parses a file into a document stream labelled with its path.
///
/// # Errors
///
/// - `ParseError::FileNotFound` if the file does not exist
/// - `ParseError::ReadError` if it cannot be read
/// - a format error if the content is invalid for the detected format
/// - `ParseError::UnknownFormat` if no format could be detected
pub fn parse_file(path: &Path) -> Result<DocumentStream, ParseError> {
    let location = path.to_string_lossy().to_string();
    if !path.exists() {
        return Err(ParseError::file_not_found(location));
    }

    let content =
        fs::read_to_string(path).map_err(|e| ParseError::read_error(location.clone(), e))?;

    parse_content(&content, FormatHint::from_path(path), location)
}

/// Reads standard input to the end and parses it.
pub fn parse_stdin(hint: FormatHint) -> Result<DocumentStream, ParseError> {
    let mut content = String::new();
    io::stdin()
        .read_to_string(&mut content)
        .map_err(|e| ParseError::read_error(STDIN_LOCATION, e))?;

    parse_content(&content, hint, STDIN_LOCATION)
}

/// Parses in-memory content. `location` labels the stream in messages.
pub fn parse_content(
    content: &str,
    hint: FormatHint,
    location: impl Into<String>,
) -> Result<DocumentStream, ParseError> {
    let location = location.into();
    let documents = match hint {
        FormatHint::Json => {
            parse_json(content).map_err(|e| ParseError::json_error(location.clone(), e))?
        }
        FormatHint::Yaml => {
            parse_yaml(content).map_err(|e| ParseError::yaml_error(location.clone(), e))?
        }
        FormatHint::Toml => vec![parse_toml(content)
            .map_err(|e| ParseError::toml_error(location.clone(), e))?],
        FormatHint::Auto => match parse_json(content) {
            Ok(documents) => documents,
            Err(_) => parse_yaml(content)
                .map_err(|_| ParseError::unknown_format(location.clone()))?,
        },
    };

    debug!(location = %location, documents = documents.len(), "parsed input");
    Ok(DocumentStream::new(location, documents))
}

/// Parses a stream of concatenated JSON values, one document each.
///
/// ```
/// use docdiff::parser::parse_json;
///
/// let documents = parse_json(r#"{"a": 1} {"a": 2}"#).unwrap();
/// assert_eq!(documents.len(), 2);
/// ```
pub fn parse_json(content: &str) -> Result<Vec<Node>, serde_json::Error> {
    let mut documents = Vec::new();
    for value in serde_json::Deserializer::from_str(content).into_iter::<serde_json::Value>() {
        documents.push(into_document(json_to_node(value?)));
    }
    if documents.is_empty() {
        documents.push(Node::empty_document());
    }
    Ok(documents)
}

/// Parses a YAML stream, one document per `---` section.
///
/// ```
/// use docdiff::parser::parse_yaml;
///
/// let documents = parse_yaml("a: 1\n---\na: 2\n").unwrap();
/// assert_eq!(documents.len(), 2);
/// ```
pub fn parse_yaml(content: &str) -> Result<Vec<Node>, serde_yaml::Error> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(content) {
        let value = serde_yaml::Value::deserialize(document)?;
        documents.push(into_document(yaml_to_node(value)));
    }
    if documents.is_empty() {
        documents.push(Node::empty_document());
    }
    Ok(documents)
}

/// Parses a TOML file into a single document.
pub fn parse_toml(content: &str) -> Result<Node, toml::de::Error> {
    let value: toml::Value = toml::from_str(content)?;
    Ok(Node::document(toml_to_node(value)))
}

/// A top-level null is an empty document.
fn into_document(root: Node) -> Node {
    if root.is_null() {
        Node::empty_document()
    } else {
        Node::document(root)
    }
}

fn json_to_node(value: serde_json::Value) -> Node {
    match value {
        serde_json::Value::Null => Node::null(),
        serde_json::Value::Bool(b) => Node::bool(b),
        serde_json::Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                Node::scalar(Tag::Int, n.to_string())
            } else {
                Node::float(n.as_f64().unwrap_or_default())
            }
        }
        serde_json::Value::String(s) => Node::string(s),
        serde_json::Value::Array(arr) => Node::sequence(arr.into_iter().map(json_to_node)),
        serde_json::Value::Object(obj) => {
            Node::mapping(obj.into_iter().map(|(k, v)| (k, json_to_node(v))))
        }
    }
}

/// Converts a YAML value. Non-string keys are stringified, and explicit tags
/// such as `!Ref` are kept on the node.
fn yaml_to_node(value: serde_yaml::Value) -> Node {
    match value {
        serde_yaml::Value::Null => Node::null(),
        serde_yaml::Value::Bool(b) => Node::bool(b),
        serde_yaml::Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                Node::scalar(Tag::Int, n.to_string())
            } else {
                Node::float(n.as_f64().unwrap_or_default())
            }
        }
        serde_yaml::Value::String(s) => Node::string(s),
        serde_yaml::Value::Sequence(seq) => Node::sequence(seq.into_iter().map(yaml_to_node)),
        serde_yaml::Value::Mapping(map) => Node::mapping(
            map.into_iter()
                .map(|(k, v)| (yaml_key(k), yaml_to_node(v))),
        ),
        serde_yaml::Value::Tagged(tagged) => {
            let tag = Tag::Custom(tagged.tag.to_string());
            match yaml_to_node(tagged.value) {
                Node::Mapping { entries, .. } => Node::Mapping { tag, entries },
                Node::Sequence { items, .. } => Node::Sequence { tag, items },
                Node::Scalar { value, .. } => Node::Scalar { tag, value },
                other => other,
            }
        }
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => match serde_yaml::to_string(&other) {
            Ok(rendered) => rendered.trim_end().to_string(),
            Err(_) => format!("{:?}", other),
        },
    }
}

fn toml_to_node(value: toml::Value) -> Node {
    match value {
        toml::Value::String(s) => Node::string(s),
        toml::Value::Integer(i) => Node::int(i),
        toml::Value::Float(f) => Node::float(f),
        toml::Value::Boolean(b) => Node::bool(b),
        toml::Value::Datetime(dt) => Node::scalar(Tag::Timestamp, dt.to_string()),
        toml::Value::Array(arr) => Node::sequence(arr.into_iter().map(toml_to_node)),
        toml::Value::Table(table) => {
            Node::mapping(table.into_iter().map(|(k, v)| (k, toml_to_node(v))))
        }
    }
}
