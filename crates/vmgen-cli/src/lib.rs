//! Driver for the vmgen instruction-set generator.
//!
//! The definition file is parsed once; every selected artifact is rendered
//! from that one schema, and files are only written after all of them
//! rendered successfully.

pub mod config;
mod error;

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};
use vmgen_emit::{emit_dispatch, emit_dump, emit_metadata, emit_opcodes};
use vmgen_schema::{Definition, parse_from};

pub use config::{Config, Overrides};
pub use error::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Dispatch,
    Metadata,
    Dump,
    Opcodes,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dispatch => "dispatch",
            Self::Metadata => "metadata",
            Self::Dump => "dump",
            Self::Opcodes => "opcodes",
        })
    }
}

/// One rendered output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub contents: String,
}

/// Read and parse the configured input.
pub fn load_definition(config: &Config) -> Result<Definition, CliError> {
    let path = config.input()?;
    let source = fs::read_to_string(path).map_err(|source| CliError::ReadInput {
        path: path.to_path_buf(),
        source,
    })?;
    let def = parse_from(&source, config.first_opcode).map_err(|source| CliError::Definition {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), opcodes = def.len(), "loaded definition");
    Ok(def)
}

/// Render every artifact selected in `config.outputs`.
pub fn render(config: &Config) -> Result<Vec<Artifact>, CliError> {
    if config.outputs.count() == 0 {
        return Err(CliError::NoOutputs);
    }
    let def = load_definition(config)?;
    let outputs = &config.outputs;

    let mut artifacts = Vec::with_capacity(outputs.count());
    if let Some(path) = &outputs.dispatch {
        artifacts.push(Artifact {
            kind: ArtifactKind::Dispatch,
            path: path.clone(),
            contents: emit_dispatch(&def, &config.dispatch_options())?,
        });
    }
    if let Some(path) = &outputs.metadata {
        artifacts.push(Artifact {
            kind: ArtifactKind::Metadata,
            path: path.clone(),
            contents: emit_metadata(&def, &config.metadata_options(path)?)?,
        });
    }
    if let Some(path) = &outputs.dump {
        artifacts.push(Artifact {
            kind: ArtifactKind::Dump,
            path: path.clone(),
            contents: emit_dump(&def, &config.dump_options(path)?)?,
        });
    }
    if let Some(path) = &outputs.opcodes {
        artifacts.push(Artifact {
            kind: ArtifactKind::Opcodes,
            path: path.clone(),
            contents: emit_opcodes(&def, &config.opcode_table_options(path)?)?,
        });
    }
    Ok(artifacts)
}

/// Write rendered artifacts, creating parent directories as needed.
pub fn write_artifacts(artifacts: &[Artifact]) -> Result<(), CliError> {
    for artifact in artifacts {
        let path = &artifact.path;
        let write_error = |source| CliError::WriteOutput {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        fs::write(path, &artifact.contents).map_err(write_error)?;
        info!(kind = %artifact.kind, path = %path.display(), "wrote artifact");
    }
    Ok(())
}

/// Render and write every selected artifact.
pub fn run(config: &Config) -> Result<Vec<PathBuf>, CliError> {
    let artifacts = render(config)?;
    write_artifacts(&artifacts)?;
    Ok(artifacts.into_iter().map(|a| a.path).collect())
}

/// Render the single selected artifact for printing instead of writing it.
pub fn render_single(config: &Config) -> Result<String, CliError> {
    match config.outputs.count() {
        0 => Err(CliError::NoOutputs),
        1 => {
            let mut artifacts = render(config)?;
            Ok(artifacts.remove(0).contents)
        }
        n => Err(CliError::AmbiguousStdout(n)),
    }
}

/// Per-opcode encoded sizes for the build configuration defining `defined`.
pub fn size_report(config: &Config, defined: &[String]) -> Result<String, CliError> {
    let def = load_definition(config)?;
    let widths = config.type_widths();
    let defined: BTreeSet<String> = defined.iter().cloned().collect();
    let width = def.opcodes.iter().map(|op| op.name.len()).max().unwrap_or(0);

    let mut out = String::new();
    for opcode in &def.opcodes {
        let size = opcode.encoded_size(config.header_size, &widths, &defined)?;
        out.push_str(&format!("{:<width$} {size}\n", opcode.name));
    }
    Ok(out)
}

/// The parsed schema as pretty-printed JSON.
pub fn schema_json(config: &Config) -> Result<String, CliError> {
    let def = load_definition(config)?;
    Ok(serde_json::to_string_pretty(&def)?)
}
