use std::path::PathBuf;

use super::ns;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Open(#[from] crate::fsutil::FileOpenError),
    #[error("unsupported metadata file extension: `{0}`")]
    UnsupportedExtension(PathBuf),
    #[error("failed to parse Turtle metadata: {0}")]
    Turtle(#[from] oxttl::TurtleParseError),
    #[error("failed to parse JSON metadata: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid metadata document: {0}")]
    Document(String),
    #[error("invalid IRI in metadata: {0}")]
    Iri(#[from] oxrdf::IriParseError),
    #[error("invalid language tag in metadata: {0}")]
    LanguageTag(#[from] oxrdf::LanguageTagParseError),
    #[error(transparent)]
    Namespace(#[from] ns::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
