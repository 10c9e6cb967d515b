//! Locations inside a document stream.
//!
//! A [`Path`] is a document index plus a list of [`PathElement`]s. Its
//! `Display` form is go-patch style (`/spec/containers/name=web/image`), with
//! `~` and `/` inside a token escaped as in JSON pointers. Ignore lists and
//! the comparator table are keyed by this rendering.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathElement {
    /// A mapping key.
    Key(String),
    /// A position in a list compared without identifiers.
    Index(usize),
    /// A list entry correlated through its identifier key.
    Named { key: String, value: String },
}

impl PathElement {
    /// Unescaped go-patch token for this element.
    pub fn token(&self) -> String {
        match self {
            PathElement::Key(key) => key.clone(),
            PathElement::Index(index) => index.to_string(),
            PathElement::Named { key, value } => format!("{}={}", key, value),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    pub document: usize,
    pub elements: Vec<PathElement>,
}

impl Path {
    /// The root of the document at `document`.
    pub fn root(document: usize) -> Self {
        Self {
            document,
            elements: Vec::new(),
        }
    }

    pub fn child(&self, element: PathElement) -> Self {
        let mut elements = Vec::with_capacity(self.elements.len() + 1);
        elements.extend(self.elements.iter().cloned());
        elements.push(element);
        Self {
            document: self.document,
            elements,
        }
    }

    pub fn key(&self, key: impl Into<String>) -> Self {
        self.child(PathElement::Key(key.into()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.child(PathElement::Index(index))
    }

    pub fn named(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.child(PathElement::Named {
            key: key.into(),
            value: value.into(),
        })
    }

    pub fn depth(&self) -> usize {
        self.elements.len()
    }

    pub fn is_root(&self) -> bool {
        self.elements.is_empty()
    }

    /// Unescaped tokens, one per element.
    pub fn tokens(&self) -> Vec<String> {
        self.elements.iter().map(PathElement::token).collect()
    }

    /// Dot-separated rendering: keys joined by `.`, indexes as `[n]`,
    /// correlated entries by their identifier value.
    pub fn to_dot_string(&self) -> String {
        if self.elements.is_empty() {
            return "(root)".to_string();
        }

        let mut result = String::new();
        for element in &self.elements {
            match element {
                PathElement::Index(index) => result.push_str(&format!("[{}]", index)),
                PathElement::Key(key) => {
                    if !result.is_empty() {
                        result.push('.');
                    }
                    result.push_str(key);
                }
                PathElement::Named { value, .. } => {
                    if !result.is_empty() {
                        result.push('.');
                    }
                    result.push_str(value);
                }
            }
        }
        result
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.elements.is_empty() {
            return f.write_str("/");
        }
        for element in &self.elements {
            write!(f, "/{}", escape_token(&element.token()))?;
        }
        Ok(())
    }
}

/// Escapes a token for use between `/` separators (`~` → `~0`, `/` → `~1`).
pub fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Reverses [`escape_token`].
pub fn unescape_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_renders_as_slash() {
        assert_eq!(Path::root(0).to_string(), "/");
        assert_eq!(Path::root(3).to_dot_string(), "(root)");
    }

    #[test]
    fn test_go_patch_rendering() {
        let path = Path::root(0)
            .key("spec")
            .key("containers")
            .named("name", "web")
            .key("image");
        assert_eq!(path.to_string(), "/spec/containers/name=web/image");
        assert_eq!(path.to_dot_string(), "spec.containers.web.image");
    }

    #[test]
    fn test_keys_with_slashes_are_escaped() {
        let path = Path::root(0)
            .key("metadata")
            .key("annotations")
            .key("kubectl.kubernetes.io/last-applied-configuration");
        assert_eq!(
            path.to_string(),
            "/metadata/annotations/kubectl.kubernetes.io~1last-applied-configuration"
        );
    }

    #[test]
    fn test_index_rendering() {
        let path = Path::root(0).key("items").index(2).key("id");
        assert_eq!(path.to_string(), "/items/2/id");
        assert_eq!(path.to_dot_string(), "items[2].id");
    }

    #[test]
    fn test_escape_round_trip() {
        let token = "a/b~c";
        assert_eq!(escape_token(token), "a~1b~0c");
        assert_eq!(unescape_token(&escape_token(token)), token);
    }

    #[test]
    fn test_document_index_not_rendered() {
        assert_eq!(Path::root(0).key("a"), Path::root(0).key("a"));
        assert_ne!(Path::root(0).key("a"), Path::root(1).key("a"));
        assert_eq!(
            Path::root(0).key("a").to_string(),
            Path::root(1).key("a").to_string()
        );
    }
}
