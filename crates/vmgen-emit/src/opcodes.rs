//! Opcode enum and name table.

use std::fmt::Write as FmtWrite;

use tracing::debug;
use vmgen_schema::Definition;

use crate::naming::prefixed;
use crate::{BANNER, EmitError, INDENT, check_symbol};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcodeTableOptions {
    pub include_guard: String,
    pub enum_name: String,
    /// Gate for the `opcode2str` name table.
    pub feature: String,
    pub prefix: Option<String>,
}

impl Default for OpcodeTableOptions {
    fn default() -> Self {
        Self {
            include_guard: "VM_OPCODE_H".into(),
            enum_name: "MozOpcode".into(),
            feature: "MOZVM_DUMP_OPCODE".into(),
            prefix: None,
        }
    }
}

/// Render the opcode enum, an opcode count and the gated `opcode2str`.
pub fn emit_opcodes(def: &Definition, opts: &OpcodeTableOptions) -> Result<String, EmitError> {
    check_symbol("include guard", &opts.include_guard)?;
    check_symbol("enum name", &opts.enum_name)?;
    check_symbol("feature gate", &opts.feature)?;
    let to_str = prefixed(opts.prefix.as_deref(), "opcode2str")?;
    let count = prefixed(opts.prefix.as_deref(), "opcode_count")?.to_ascii_uppercase();
    debug!(opcodes = def.len(), "emitting opcode table");

    let guard = &opts.include_guard;
    let width = def.opcodes.iter().map(|op| op.name.len()).max().unwrap_or(0);

    let mut out = String::new();
    writeln!(out, "{BANNER}")?;
    writeln!(out, "#ifndef {guard}")?;
    writeln!(out, "#define {guard}")?;
    writeln!(out)?;
    writeln!(out, "enum {} {{", opts.enum_name)?;
    for opcode in &def.opcodes {
        writeln!(out, "{INDENT}{:<width$} = {},", opcode.name, opcode.sequence)?;
    }
    writeln!(out, "}};")?;
    writeln!(out)?;
    writeln!(out, "#define {count} {}", def.len())?;
    writeln!(out)?;
    writeln!(out, "#ifdef {}", opts.feature)?;
    writeln!(out, "static const char *{to_str}(int opcode)")?;
    writeln!(out, "{{")?;
    writeln!(out, "{INDENT}switch (opcode) {{")?;
    for opcode in &def.opcodes {
        writeln!(out, "{INDENT}case {0}: return \"{0}\";", opcode.name)?;
    }
    writeln!(out, "{INDENT}default: break;")?;
    writeln!(out, "{INDENT}}}")?;
    writeln!(out, "{INDENT}return \"???\";")?;
    writeln!(out, "}}")?;
    writeln!(out, "#endif /* {} */", opts.feature)?;
    writeln!(out)?;
    writeln!(out, "#endif /* {guard} */")?;
    Ok(out)
}
