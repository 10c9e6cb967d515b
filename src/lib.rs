//! docdiff - structural diff for multi-document YAML, JSON and TOML.
//!
//! Inputs are parsed into [`DocumentStream`]s, optionally normalized to strip
//! fields that are known to be noise, and compared document by document. The
//! result is a [`Report`] of per-path differences that renderers turn into a
//! readable narrative or a machine-readable listing.
//!
//! Lists of mappings are correlated by an identifier key (`name`, `key`,
//! `id`, or a guessed one) so reordering a list of containers or ports shows
//! up as an order change instead of a wall of modifications.
//!
//! # Example
//!
//! ```no_run
//! use docdiff::{compare_input_files, format_report, parse_file, CompareSettings};
//! use docdiff::{OutputFormat, OutputOptions};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let from = parse_file(Path::new("old.yaml"))?;
//! let to = parse_file(Path::new("new.yaml"))?;
//!
//! let report = compare_input_files(from, to, &CompareSettings::default())?;
//!
//! let output = format_report(&report, &OutputFormat::Human, &OutputOptions::default())?;
//! println!("{}", output);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod diff;
pub mod error;
pub mod filter;
pub mod hash;
mod list;
pub mod normalize;
pub mod output;
pub mod parser;
pub mod path;
pub mod tree;

// Re-export commonly used types for convenience
pub use config::{json_equal, Comparators, CompareSettings, ConfigFile, NormalizeRule};
pub use diff::{compare_input_files, compare_nodes, Detail, DetailKind, Diff, Report, ReportStats};
pub use error::{CompareError, ConfigError, Error, NormalizeError, OutputError, ParseError};
pub use filter::{filter_report, FilterConfig, PathPattern};
pub use list::STANDARD_IDENTIFIERS;
pub use normalize::{
    normalize_stream, IgnoreNormalizer, IgnoreRule, JsonPointer, Normalizer, ResourceFilter,
};
pub use output::{format_report, OutputFormat, OutputOptions};
pub use parser::{
    parse_content, parse_file, parse_json, parse_stdin, parse_toml, parse_yaml, FormatHint,
};
pub use path::{Path, PathElement};
pub use tree::{AnchorId, Anchors, DocumentStream, Node, NodeKind, ResourceId, Tag};
