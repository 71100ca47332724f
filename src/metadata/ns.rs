//! Namespace table and predicate resolution.
//!
//! The table is parsed once at process start from the embedded JSON-LD
//! context document and is read-only afterwards. Only context values that are
//! plain strings starting with `http` become prefixes; term definitions in
//! the context are ignored here.

use std::collections::HashMap;
use std::sync::OnceLock;

use oxrdf::vocab::rdf;
use oxrdf::{IriParseError, NamedNode};

const CONTEXT_JSON: &str = include_str!("../../site/rdf/v1/context.json");

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The prefix of a `prefix:localName` predicate is not in the namespace
    /// table. This indicates a caller bug, not runtime data variance.
    #[error("unresolved namespace prefix in `{0}`")]
    UnresolvedPrefix(String),
    #[error("`{predicate}` does not expand to a valid IRI: {source}")]
    InvalidIri {
        predicate: String,
        #[source]
        source: IriParseError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

fn load_namespaces() -> HashMap<String, String> {
    let context: serde_json::Value =
        serde_json::from_str(CONTEXT_JSON).expect("embedded context.json is valid JSON");

    let mut table = HashMap::new();
    if let Some(entries) = context.get("@context").and_then(|ctx| ctx.as_object()) {
        for (key, value) in entries {
            if let Some(uri) = value.as_str() {
                if uri.starts_with("http") {
                    table.insert(key.clone(), uri.to_owned());
                }
            }
        }
    }
    table
}

/// The process-wide namespace table.
pub fn namespaces() -> &'static HashMap<String, String> {
    static NAMESPACES: OnceLock<HashMap<String, String>> = OnceLock::new();
    NAMESPACES.get_or_init(load_namespaces)
}

/// Expands a term in the given namespace, e.g. `expand("mini", "Service")`.
///
/// # Errors
///
/// Returns [`Error::UnresolvedPrefix`] for an unknown prefix and
/// [`Error::InvalidIri`] if the expansion is not a valid IRI.
pub fn expand(prefix: &str, local: &str) -> Result<NamedNode> {
    let base = namespaces()
        .get(prefix)
        .ok_or_else(|| Error::UnresolvedPrefix(format!("{prefix}:{local}")))?;
    NamedNode::new(format!("{base}{local}")).map_err(|source| Error::InvalidIri {
        predicate: format!("{prefix}:{local}"),
        source,
    })
}

/// Resolves a predicate given as the literal token `a` (sugar for
/// `rdf:type`), a full absolute identifier (passed through unchanged), or a
/// `prefix:localName` pair expanded via the namespace table.
///
/// # Errors
///
/// Returns [`Error::UnresolvedPrefix`] when the prefix is unknown or the
/// predicate has no `:` separator, and [`Error::InvalidIri`] when the result
/// is not a valid IRI.
pub fn resolve(predicate: &str) -> Result<NamedNode> {
    if predicate == "a" {
        return Ok(rdf::TYPE.into_owned());
    }
    if predicate.starts_with("http") {
        return NamedNode::new(predicate).map_err(|source| Error::InvalidIri {
            predicate: predicate.to_owned(),
            source,
        });
    }

    let (prefix, local) = predicate
        .split_once(':')
        .ok_or_else(|| Error::UnresolvedPrefix(predicate.to_owned()))?;
    expand(prefix, local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_type_sugar() {
        let predicate = resolve("a").unwrap();
        assert_eq!(
            predicate.as_str(),
            "http://www.w3.org/1999/02/22-rdf-syntax-ns#type"
        );
    }

    #[test]
    fn test_resolve_absolute_identifier_passes_through() {
        let predicate = resolve("http://example.org/term").unwrap();
        assert_eq!(predicate.as_str(), "http://example.org/term");
    }

    #[test]
    fn test_resolve_prefixed_name() {
        let predicate = resolve("dc:title").unwrap();
        assert_eq!(predicate.as_str(), "http://purl.org/dc/terms/title");

        let predicate = resolve("mini:storage").unwrap();
        assert_eq!(predicate.as_str(), "http://minipaas.org/rdf/v1#storage");
    }

    #[test]
    fn test_resolve_unknown_prefix_fails() {
        let err = resolve("nope:term").unwrap_err();
        assert!(matches!(err, Error::UnresolvedPrefix(_)));
    }

    #[test]
    fn test_resolve_missing_separator_fails() {
        let err = resolve("title").unwrap_err();
        assert!(matches!(err, Error::UnresolvedPrefix(_)));
    }

    #[test]
    fn test_term_definitions_are_not_prefixes() {
        assert!(!namespaces().contains_key("title"));
        assert!(namespaces().contains_key("foaf"));
    }
}
