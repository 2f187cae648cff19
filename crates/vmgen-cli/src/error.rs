use std::io;
use std::path::PathBuf;

use thiserror::Error;
use vmgen_emit::EmitError;
use vmgen_schema::{DefinitionError, SizeError};

/// Errors surfaced to the invoking build.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("no input definition file given")]
    MissingInput,

    #[error("cannot read input {}: {source}", path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read config {}: {source}", path.display())]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot write output {}: {source}", path.display())]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no output artifact selected")]
    NoOutputs,

    #[error("--stdout needs exactly one output artifact, {0} selected")]
    AmbiguousStdout(usize),

    #[error("{}: {source}", path.display())]
    Definition {
        path: PathBuf,
        #[source]
        source: DefinitionError,
    },

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error(transparent)]
    Size(#[from] SizeError),

    #[error("cannot serialize schema: {0}")]
    Json(#[from] serde_json::Error),
}
