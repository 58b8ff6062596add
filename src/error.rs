use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::domain::{GroupId, TaxonId};

#[derive(Debug, Error, Diagnostic)]
pub enum OrthoError {
    #[error("invalid taxon id: {0}")]
    InvalidTaxonId(String),

    #[error("invalid gene id: {0}")]
    InvalidGeneId(String),

    #[error("invalid orthologous group id: {0}")]
    InvalidGroupId(String),

    #[error("invalid anatomical/developmental entity id: {0}")]
    InvalidEntityId(String),

    #[error("missing config file orthoscope.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to read input file at {0}")]
    InputRead(PathBuf),

    #[error("failed to parse input file: {0}")]
    InputParse(String),

    #[error("no orthology index found at {0} (run `orthoscope ingest` first)")]
    IndexNotFound(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("taxonomy filter resolves to zero species for taxon {0}")]
    UnknownTaxon(TaxonId),

    #[error("cyclic child references in orthology tree {0}")]
    CyclicHierarchy(GroupId),
}
