//! Parsers for the embedded metadata documents.
//!
//! Turtle documents are handed to `oxttl` with the service's canonical IRI as
//! base. JSON documents follow the original metadata file contract: a plain
//! `.json` file without `@context` is interpreted against the embedded
//! namespace table, with a default subject and `rdf:type mini:Service`
//! patched in. The expansion supports the subset of JSON-LD these documents
//! use: string values, `@id` references, `@value` with `@language` or
//! `@type`, nested blank-node objects, and arrays.

use std::path::Path;

use oxrdf::vocab::{rdf, xsd};
use oxrdf::{BlankNode, Graph, Literal, NamedNode, Subject, Term, Triple};
use serde_json::Value;

use crate::fsutil;

use super::{Error, Metadata, Result, ns, service_id};

/// Parses the metadata file for the given image id into a [`Metadata`] store.
///
/// The parser is keyed by the file's extension: `.json`/`.jsonld` use the
/// JSON branch, `.ttl`/`.turtle` the Turtle branch.
///
/// # Errors
///
/// Returns [`Error::UnsupportedExtension`] for any other extension, and the
/// respective parse errors for malformed documents.
pub fn parse(image_id: &str, path: &Path) -> Result<Metadata> {
    let id = service_id(image_id)?;
    let reader = fsutil::open_file_reader(path)?;

    let extension = path.extension().and_then(|ext| ext.to_str());
    let graph = match extension {
        Some("ttl") | Some("turtle") => parse_turtle(&id, reader)?,
        Some("json") | Some("jsonld") => parse_json(&id, reader)?,
        _ => return Err(Error::UnsupportedExtension(path.to_path_buf())),
    };

    Ok(Metadata::new(id, graph))
}

fn parse_turtle(id: &NamedNode, reader: impl std::io::Read) -> Result<Graph> {
    let parser = oxttl::TurtleParser::new().with_base_iri(id.as_str())?;

    let mut graph = Graph::default();
    for triple in parser.for_reader(reader) {
        graph.insert(&triple?);
    }
    Ok(graph)
}

fn parse_json(id: &NamedNode, reader: impl std::io::Read) -> Result<Graph> {
    let doc: Value = serde_json::from_reader(reader)?;
    let Value::Object(ref map) = doc else {
        return Err(Error::Document(
            "top-level JSON value must be an object".to_owned(),
        ));
    };

    let mut graph = Graph::default();
    let subject = Subject::from(id.clone());

    if !declares_type(map) {
        let service_class = ns::expand("mini", "Service")?;
        graph.insert(&Triple::new(
            subject.clone(),
            rdf::TYPE.into_owned(),
            service_class,
        ));
    }

    expand_object(&mut graph, &subject, map)?;
    Ok(graph)
}

fn declares_type(map: &serde_json::Map<String, Value>) -> bool {
    map.contains_key("rdf:type")
        || map.contains_key("@type")
        || map.contains_key("a")
        || map.contains_key("http://www.w3.org/1999/02/22-rdf-syntax-ns#type")
}

fn expand_object(
    graph: &mut Graph,
    subject: &Subject,
    map: &serde_json::Map<String, Value>,
) -> Result<()> {
    for (key, value) in map {
        let predicate = match key.as_str() {
            "@id" | "@context" => continue,
            "@type" => rdf::TYPE.into_owned(),
            key => ns::resolve(key)?,
        };
        insert_value(graph, subject, &predicate, value)?;
    }
    Ok(())
}

fn insert_value(
    graph: &mut Graph,
    subject: &Subject,
    predicate: &NamedNode,
    value: &Value,
) -> Result<()> {
    let object: Term = match value {
        Value::Null => return Ok(()),
        Value::String(text) => {
            if predicate.as_ref() == rdf::TYPE {
                ns::resolve(text)?.into()
            } else {
                Literal::new_simple_literal(text.as_str()).into()
            }
        }
        Value::Bool(flag) => Literal::new_typed_literal(flag.to_string(), xsd::BOOLEAN).into(),
        Value::Number(number) => {
            if number.is_i64() || number.is_u64() {
                Literal::new_typed_literal(number.to_string(), xsd::INTEGER).into()
            } else {
                Literal::new_typed_literal(number.to_string(), xsd::DOUBLE).into()
            }
        }
        Value::Array(items) => {
            for item in items {
                insert_value(graph, subject, predicate, item)?;
            }
            return Ok(());
        }
        Value::Object(map) => {
            if let Some(text) = map.get("@value") {
                expanded_literal(map, text)?.into()
            } else if let Some(reference) = map.get("@id").and_then(Value::as_str) {
                NamedNode::new(reference)?.into()
            } else {
                let node = BlankNode::default();
                graph.insert(&Triple::new(
                    subject.clone(),
                    predicate.clone(),
                    node.clone(),
                ));
                expand_object(graph, &Subject::from(node), map)?;
                return Ok(());
            }
        }
    };

    graph.insert(&Triple::new(subject.clone(), predicate.clone(), object));
    Ok(())
}

fn expanded_literal(map: &serde_json::Map<String, Value>, value: &Value) -> Result<Literal> {
    let Some(text) = value.as_str() else {
        return Err(Error::Document("`@value` must be a string".to_owned()));
    };

    if let Some(language) = map.get("@language").and_then(Value::as_str) {
        Ok(Literal::new_language_tagged_literal(text, language)?)
    } else if let Some(datatype) = map.get("@type").and_then(Value::as_str) {
        Ok(Literal::new_typed_literal(text, ns::resolve(datatype)?))
    } else {
        Ok(Literal::new_simple_literal(text))
    }
}
