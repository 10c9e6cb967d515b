//! Report rendering.
//!
//! Two families of output exist:
//!
//! - **human**: a readable narrative, one block per diff, with a header and a
//!   summary line. [`OutputFormat::Human`] colours it with ANSI escape codes,
//!   [`OutputFormat::Plain`] does not.
//! - **raw**: the diff list serialized as JSON or YAML for machine consumption.
//!
//! # Examples
//!
//! ```
//! use docdiff::{compare_input_files, format_report, parse_yaml, CompareSettings};
//! use docdiff::{DocumentStream, OutputFormat, OutputOptions};
//!
//! let from = DocumentStream::new("old.yaml", parse_yaml("replicas: 1").unwrap());
//! let to = DocumentStream::new("new.yaml", parse_yaml("replicas: 3").unwrap());
//! let report = compare_input_files(from, to, &CompareSettings::default()).unwrap();
//!
//! let output = format_report(&report, &OutputFormat::Plain, &OutputOptions::default()).unwrap();
//! assert!(output.contains("/replicas"));
//! assert!(output.contains("± value change"));
//! ```

use crate::diff::{Detail, DetailKind, Diff, Report, ReportStats};
use crate::error::OutputError;
use crate::path::Path;
use crate::tree::{Node, Tag};
use colored::{Color, Colorize};
use serde_json::json;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Coloured narrative with ANSI escape codes
    Human,
    /// Narrative without colours (suitable for piping)
    Plain,
    /// Raw diff list as JSON
    Json,
    /// Raw diff list as YAML
    Yaml,
}

/// Options for controlling output formatting.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    /// Skip the "Found N differences" header
    pub omit_header: bool,
    /// Render paths as `spec.containers.web.image` instead of go-patch style
    pub dot_paths: bool,
    /// Render modified values in full instead of one-line previews
    pub show_values: bool,
    /// Maximum length of a value preview
    pub max_value_length: usize,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            omit_header: false,
            dot_paths: false,
            show_values: false,
            max_value_length: 80,
        }
    }
}

/// Formats a report according to the specified format and options.
///
/// # Errors
///
/// Returns an `OutputError` if a value cannot be serialized.
pub fn format_report(
    report: &Report,
    format: &OutputFormat,
    options: &OutputOptions,
) -> Result<String, OutputError> {
    match format {
        OutputFormat::Human => Human::new(options, true).report(report),
        OutputFormat::Plain => Human::new(options, false).report(report),
        OutputFormat::Json => serde_json::to_string_pretty(&raw_report(report, options))
            .map_err(|e| OutputError::JsonSerializationError { source: e }),
        OutputFormat::Yaml => serde_yaml::to_string(&raw_report(report, options))
            .map_err(|e| OutputError::YamlSerializationError { source: e }),
    }
}

struct Human<'a> {
    options: &'a OutputOptions,
    colorize: bool,
}

impl<'a> Human<'a> {
    fn new(options: &'a OutputOptions, colorize: bool) -> Self {
        Self { options, colorize }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.colorize {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        if self.colorize {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn report(&self, report: &Report) -> Result<String, OutputError> {
        if report.is_empty() {
            let message = "No differences found.";
            return Ok(if self.colorize {
                message.dimmed().to_string()
            } else {
                message.to_string()
            });
        }

        let mut output = String::new();
        if !self.options.omit_header {
            output.push_str(&self.bold(&format!(
                "Found {} between {} and {}",
                count_noun(report.len(), "difference", "differences"),
                report.from.location,
                report.to.location
            )));
            output.push_str("\n\n");
        }

        for diff in &report.diffs {
            output.push_str(&self.diff(report, diff)?);
            output.push('\n');
        }

        output.push_str(&format_summary(&report.stats()));
        Ok(output)
    }

    fn diff(&self, report: &Report, diff: &Diff) -> Result<String, OutputError> {
        let mut block = self.bold(&path_string(&diff.path, self.options));
        if report.from.len() > 1 {
            block.push_str("  ");
            block.push_str(&self.paint(&document_label(report, diff.path.document), Color::Cyan));
        }
        block.push('\n');

        for detail in &diff.details {
            block.push_str(&self.detail(detail)?);
        }
        Ok(block)
    }

    fn detail(&self, detail: &Detail) -> Result<String, OutputError> {
        match detail.kind {
            DetailKind::Addition => self.entries(detail.to.as_ref(), "added", "+", Color::Green),
            DetailKind::Removal => self.entries(detail.from.as_ref(), "removed", "-", Color::Red),
            DetailKind::Modification => self.modification(detail),
            DetailKind::OrderChange => Ok(self.order_change(detail)),
        }
    }

    /// `+ two map entries added:` followed by the entries as YAML.
    fn entries(
        &self,
        payload: Option<&Node>,
        verb: &str,
        symbol: &str,
        color: Color,
    ) -> Result<String, OutputError> {
        let Some(payload) = payload else {
            return Ok(String::new());
        };
        let (count, noun) = match payload {
            Node::Mapping { entries, .. } => (entries.len(), ("map entry", "map entries")),
            Node::Sequence { items, .. } => (items.len(), ("list entry", "list entries")),
            _ => (1, ("value", "values")),
        };

        let heading = format!(
            "  {} {} {}:\n",
            symbol,
            count_noun(count, noun.0, noun.1),
            verb
        );
        let mut section = self.paint(&heading, color);
        section.push_str(&self.paint(&indent(&to_yaml(payload)?, 4), color));
        Ok(section)
    }

    fn modification(&self, detail: &Detail) -> Result<String, OutputError> {
        let heading = match (&detail.from, &detail.to) {
            (Some(from), Some(to)) if from.type_name() != to.type_name() => format!(
                "  ± type change from {} to {}\n",
                from.type_name(),
                to.type_name()
            ),
            _ => "  ± value change\n".to_string(),
        };

        let mut section = self.paint(&heading, Color::Yellow);
        section.push_str(&self.paint(&self.value_line("-", detail.from.as_ref())?, Color::Red));
        section.push_str(&self.paint(&self.value_line("+", detail.to.as_ref())?, Color::Green));
        Ok(section)
    }

    fn value_line(&self, symbol: &str, node: Option<&Node>) -> Result<String, OutputError> {
        let Some(node) = node else {
            return Ok(format!("    {} (absent)\n", symbol));
        };
        if self.options.show_values && matches!(node, Node::Mapping { .. } | Node::Sequence { .. })
        {
            let body = to_yaml(node)?;
            return Ok(format!("    {}\n{}", symbol, indent(&body, 6)));
        }
        let value = if self.options.show_values {
            node.preview(usize::MAX)
        } else {
            node.preview(self.options.max_value_length)
        };
        Ok(format!("    {} {}\n", symbol, value))
    }

    fn order_change(&self, detail: &Detail) -> String {
        let mut section = self.paint("  ⇆ order changed\n", Color::Blue);
        for (symbol, node, color) in [
            ("-", &detail.from, Color::Red),
            ("+", &detail.to, Color::Green),
        ] {
            let line = format!("    {} {}\n", symbol, self.inline_list(node.as_ref()));
            section.push_str(&self.paint(&line, color));
        }
        section
    }

    fn inline_list(&self, node: Option<&Node>) -> String {
        match node {
            Some(Node::Sequence { items, .. }) => items
                .iter()
                .map(|item| match item {
                    Node::Scalar { value, .. } => value.clone(),
                    other => other.preview(self.options.max_value_length),
                })
                .collect::<Vec<_>>()
                .join(", "),
            Some(other) => other.preview(self.options.max_value_length),
            None => "(absent)".to_string(),
        }
    }
}

fn path_string(path: &Path, options: &OutputOptions) -> String {
    if options.dot_paths {
        path.to_dot_string()
    } else {
        path.to_string()
    }
}

/// Resource identity of a document, or its position when it has none.
fn document_label(report: &Report, document: usize) -> String {
    let identity = report
        .from
        .documents
        .get(document)
        .and_then(Node::resource_id)
        .or_else(|| report.to.documents.get(document).and_then(Node::resource_id));

    match identity {
        Some(id) => format!("({})", id),
        None => format!("(document #{})", document + 1),
    }
}

fn count_noun(count: usize, singular: &str, plural: &str) -> String {
    match count {
        1 => format!("one {}", singular),
        n => format!("{} {}", n, plural),
    }
}

fn indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.lines()
        .map(|line| format!("{}{}\n", pad, line))
        .collect()
}

fn to_yaml(node: &Node) -> Result<String, OutputError> {
    serde_yaml::to_string(&node_to_yaml_value(node))
        .map_err(|e| OutputError::YamlSerializationError { source: e })
}

/// Formats summary statistics.
fn format_summary(stats: &ReportStats) -> String {
    if stats.is_empty() {
        return "Summary: No changes".to_string();
    }

    let mut parts = Vec::new();
    if stats.additions > 0 {
        parts.push(format!("{} added", stats.additions));
    }
    if stats.removals > 0 {
        parts.push(format!("{} removed", stats.removals));
    }
    if stats.modifications > 0 {
        parts.push(format!("{} modified", stats.modifications));
    }
    if stats.order_changes > 0 {
        parts.push(format!("{} reordered", stats.order_changes));
    }

    format!("Summary: {}", parts.join(", "))
}

fn raw_report(report: &Report, options: &OutputOptions) -> serde_json::Value {
    let diffs: Vec<serde_json::Value> = report
        .diffs
        .iter()
        .map(|diff| {
            let details: Vec<serde_json::Value> = diff
                .details
                .iter()
                .map(|detail| {
                    json!({
                        "kind": detail.kind.as_str(),
                        "from": detail.from.as_ref().map(node_to_json_value),
                        "to": detail.to.as_ref().map(node_to_json_value),
                    })
                })
                .collect();
            json!({
                "document": diff.path.document,
                "path": path_string(&diff.path, options),
                "details": details,
            })
        })
        .collect();

    json!({
        "from": report.from.location,
        "to": report.to.location,
        "diffs": diffs,
    })
}

/// Converts a node to JSON. Integer and float scalars become numbers when
/// their text parses; custom tags are dropped.
pub fn node_to_json_value(node: &Node) -> serde_json::Value {
    match node {
        Node::Document(None) => serde_json::Value::Null,
        Node::Document(Some(root)) => node_to_json_value(root),
        Node::Alias(anchor) => json!(format!("*anchor{}", anchor.index())),
        Node::Mapping { entries, .. } => {
            let obj: serde_json::Map<String, serde_json::Value> = entries
                .iter()
                .map(|(k, v)| (k.clone(), node_to_json_value(v)))
                .collect();
            serde_json::Value::Object(obj)
        }
        Node::Sequence { items, .. } => {
            serde_json::Value::Array(items.iter().map(node_to_json_value).collect())
        }
        Node::Scalar { tag, value } => match tag {
            Tag::Null => serde_json::Value::Null,
            Tag::Bool => json!(value == "true"),
            Tag::Int => value
                .parse::<i64>()
                .map(|i| json!(i))
                .or_else(|_| value.parse::<u64>().map(|u| json!(u)))
                .unwrap_or_else(|_| json!(value)),
            Tag::Float => value
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| json!(value)),
            _ => json!(value),
        },
    }
}

/// Converts a node to YAML, keeping custom tags.
pub fn node_to_yaml_value(node: &Node) -> serde_yaml::Value {
    use serde_yaml::value::{Tag as YamlTag, TaggedValue};
    use serde_yaml::Value;

    let untagged = match node {
        Node::Document(None) => return Value::Null,
        Node::Document(Some(root)) => return node_to_yaml_value(root),
        Node::Alias(anchor) => return Value::String(format!("*anchor{}", anchor.index())),
        Node::Mapping { entries, .. } => Value::Mapping(
            entries
                .iter()
                .map(|(k, v)| (Value::String(k.clone()), node_to_yaml_value(v)))
                .collect(),
        ),
        Node::Sequence { items, .. } => {
            Value::Sequence(items.iter().map(node_to_yaml_value).collect())
        }
        Node::Scalar { tag, value } => match tag {
            Tag::Null => Value::Null,
            Tag::Bool => Value::Bool(value == "true"),
            Tag::Int => value
                .parse::<i64>()
                .map(|i| Value::Number(i.into()))
                .or_else(|_| value.parse::<u64>().map(|u| Value::Number(u.into())))
                .unwrap_or_else(|_| Value::String(value.clone())),
            Tag::Float => value
                .parse::<f64>()
                .map(|f| Value::Number(f.into()))
                .unwrap_or_else(|_| Value::String(value.clone())),
            _ => Value::String(value.clone()),
        },
    };

    match node.tag() {
        Some(Tag::Custom(tag)) if !tag.trim_start_matches('!').is_empty() => {
            Value::Tagged(Box::new(TaggedValue {
                tag: YamlTag::new(tag.trim_start_matches('!')),
                value: untagged,
            }))
        }
        _ => untagged,
    }
}
