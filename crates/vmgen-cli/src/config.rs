//! Generator configuration.
//!
//! A TOML file provides the base configuration; command-line flags are
//! applied on top through [`Overrides`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use vmgen_emit::{
    DispatchOptions, DumpOptions, EmitError, MetadataOptions, OpcodeTableOptions, include_guard,
};
use vmgen_schema::{GuardMode, TypeWidths};

use crate::CliError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Instruction-definition file.
    pub input: Option<PathBuf>,
    /// Disambiguates function names and include guards between instruction families.
    pub prefix: Option<String>,
    /// Sequence number of the first opcode.
    pub first_opcode: u32,
    /// Width of the instruction header in bytes.
    pub header_size: u32,
    pub outputs: Outputs,
    pub dispatch: DispatchSection,
    pub metadata: MetadataSection,
    pub dump: DumpSection,
    pub opcodes: OpcodesSection,
    /// Extra or overriding operand widths for size reports.
    pub widths: BTreeMap<String, u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: None,
            prefix: None,
            first_opcode: 0,
            header_size: 1,
            outputs: Outputs::default(),
            dispatch: DispatchSection::default(),
            metadata: MetadataSection::default(),
            dump: DumpSection::default(),
            opcodes: OpcodesSection::default(),
            widths: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Outputs {
    pub dispatch: Option<PathBuf>,
    pub metadata: Option<PathBuf>,
    pub dump: Option<PathBuf>,
    pub opcodes: Option<PathBuf>,
}

impl Outputs {
    pub fn count(&self) -> usize {
        [&self.dispatch, &self.metadata, &self.dump, &self.opcodes]
            .into_iter()
            .filter(|path| path.is_some())
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchSection {
    pub case_macro: String,
    pub next: String,
    pub cursor: String,
    pub read_prefix: String,
    pub defined_guards: Option<Vec<String>>,
}

impl Default for DispatchSection {
    fn default() -> Self {
        let opts = DispatchOptions::default();
        Self {
            case_macro: opts.case_macro,
            next: opts.next,
            cursor: opts.cursor,
            read_prefix: opts.read_prefix,
            defined_guards: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataSection {
    pub feature: String,
    pub header_macro: String,
    pub defined_guards: Option<Vec<String>>,
}

impl Default for MetadataSection {
    fn default() -> Self {
        let opts = MetadataOptions::default();
        Self {
            feature: opts.feature,
            header_macro: opts.header_macro,
            defined_guards: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DumpSection {
    pub feature: String,
    pub context_type: String,
    pub print_prefix: String,
    pub name_routine: String,
    pub defined_guards: Option<Vec<String>>,
}

impl Default for DumpSection {
    fn default() -> Self {
        let opts = DumpOptions::default();
        Self {
            feature: opts.feature,
            context_type: opts.context_type,
            print_prefix: opts.print_prefix,
            name_routine: opts.name_routine,
            defined_guards: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OpcodesSection {
    pub enum_name: String,
    pub feature: String,
}

impl Default for OpcodesSection {
    fn default() -> Self {
        let opts = OpcodeTableOptions::default();
        Self {
            enum_name: opts.enum_name,
            feature: opts.feature,
        }
    }
}

/// Values given on the command line; each one that is set wins over the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub input: Option<PathBuf>,
    pub prefix: Option<String>,
    pub first_opcode: Option<u32>,
    pub header_size: Option<u32>,
    pub dispatch: Option<PathBuf>,
    pub metadata: Option<PathBuf>,
    pub dump: Option<PathBuf>,
    pub opcodes: Option<PathBuf>,
}

fn guard_mode(defined: &Option<Vec<String>>) -> GuardMode {
    match defined {
        Some(symbols) => GuardMode::resolved(symbols.iter().cloned()),
        None => GuardMode::Deferred,
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| CliError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if given, otherwise start from the defaults, then apply `overrides`.
    pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<Self, CliError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply(overrides);
        Ok(config)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        let Overrides {
            input,
            prefix,
            first_opcode,
            header_size,
            dispatch,
            metadata,
            dump,
            opcodes,
        } = overrides;

        if input.is_some() {
            self.input = input;
        }
        if prefix.is_some() {
            self.prefix = prefix;
        }
        if let Some(first) = first_opcode {
            self.first_opcode = first;
        }
        if let Some(size) = header_size {
            self.header_size = size;
        }
        if dispatch.is_some() {
            self.outputs.dispatch = dispatch;
        }
        if metadata.is_some() {
            self.outputs.metadata = metadata;
        }
        if dump.is_some() {
            self.outputs.dump = dump;
        }
        if opcodes.is_some() {
            self.outputs.opcodes = opcodes;
        }
    }

    pub fn input(&self) -> Result<&Path, CliError> {
        self.input.as_deref().ok_or(CliError::MissingInput)
    }

    /// Default widths extended with the `[widths]` table.
    pub fn type_widths(&self) -> TypeWidths {
        let mut widths = TypeWidths::default();
        widths.extend(self.widths.iter().map(|(ty, width)| (ty.clone(), *width)));
        widths
    }

    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            case_macro: self.dispatch.case_macro.clone(),
            next: self.dispatch.next.clone(),
            cursor: self.dispatch.cursor.clone(),
            read_prefix: self.dispatch.read_prefix.clone(),
            guards: guard_mode(&self.dispatch.defined_guards),
        }
    }

    pub fn metadata_options(&self, output: &Path) -> Result<MetadataOptions, EmitError> {
        Ok(MetadataOptions {
            include_guard: include_guard(output, self.prefix.as_deref())?,
            feature: self.metadata.feature.clone(),
            header_macro: self.metadata.header_macro.clone(),
            header_size: self.header_size,
            prefix: self.prefix.clone(),
            guards: guard_mode(&self.metadata.defined_guards),
        })
    }

    pub fn dump_options(&self, output: &Path) -> Result<DumpOptions, EmitError> {
        Ok(DumpOptions {
            include_guard: include_guard(output, self.prefix.as_deref())?,
            feature: self.dump.feature.clone(),
            context_type: self.dump.context_type.clone(),
            print_prefix: self.dump.print_prefix.clone(),
            name_routine: self.dump.name_routine.clone(),
            prefix: self.prefix.clone(),
            guards: guard_mode(&self.dump.defined_guards),
        })
    }

    pub fn opcode_table_options(&self, output: &Path) -> Result<OpcodeTableOptions, EmitError> {
        Ok(OpcodeTableOptions {
            include_guard: include_guard(output, self.prefix.as_deref())?,
            enum_name: self.opcodes.enum_name.clone(),
            feature: self.opcodes.feature.clone(),
            prefix: self.prefix.clone(),
        })
    }
}
