//! Queryable metadata about one service, parsed from the RDF document
//! embedded in its image.
//!
//! The store is built once by [`parse`] and never mutated afterwards. Lookups
//! resolve predicates through the process-wide namespace table; an unknown
//! prefix is a caller bug and fails loudly instead of returning "absent".

mod error;
pub mod ns;
mod parse;

pub use error::{Error, Result};
pub use parse::parse;

use oxrdf::{Graph, NamedNode, SubjectRef, Term};

/// Synthesizes the canonical subject IRI for a service from its image id.
///
/// # Errors
///
/// Returns [`Error::Iri`] if the image id does not form a valid IRI.
pub fn service_id(image_id: &str) -> Result<NamedNode> {
    Ok(NamedNode::new(format!(
        "http://id.minipaas.org/{image_id}/service"
    ))?)
}

/// An immutable fact set about exactly one service subject.
#[derive(Debug)]
pub struct Metadata {
    id: NamedNode,
    graph: Graph,
}

impl Metadata {
    pub(crate) fn new(id: NamedNode, graph: Graph) -> Self {
        Self { id, graph }
    }

    /// The service's canonical subject IRI.
    pub fn id(&self) -> &NamedNode {
        &self.id
    }

    /// Returns the first object for the given predicate on the store's own
    /// subject, or `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ns::Error`] when the predicate's prefix cannot be resolved.
    pub fn get(&self, predicate: &str) -> ns::Result<Option<Term>> {
        let predicate = ns::resolve(predicate)?;
        Ok(self
            .graph
            .objects_for_subject_predicate(&self.id, &predicate)
            .next()
            .map(|term| term.into_owned()))
    }

    /// Returns the first object for the given predicate on an arbitrary
    /// subject; used for blank-node traversal, e.g. a license sub-resource.
    ///
    /// A literal subject has no outgoing facts and yields `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ns::Error`] when the predicate's prefix cannot be resolved.
    pub fn get_for(&self, subject: &Term, predicate: &str) -> ns::Result<Option<Term>> {
        let predicate = ns::resolve(predicate)?;
        let subject: SubjectRef<'_> = match subject {
            Term::NamedNode(node) => node.as_ref().into(),
            Term::BlankNode(node) => node.as_ref().into(),
            _ => return Ok(None),
        };
        Ok(self
            .graph
            .objects_for_subject_predicate(subject, &predicate)
            .next()
            .map(|term| term.into_owned()))
    }

    /// The human title declared for the service, if any.
    pub fn title(&self) -> Option<String> {
        match self.get("dc:title") {
            Ok(Some(Term::Literal(literal))) => Some(literal.value().to_owned()),
            _ => None,
        }
    }
}
