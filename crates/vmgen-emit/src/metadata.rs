//! Opcode size table.
//!
//! The generated `opcode_size` lets the runtime skip an instruction without
//! decoding it. The header width is added once, before the switch, and every
//! case accumulates `sizeof` of the operands present in the build.

use std::fmt::Write as FmtWrite;

use tracing::debug;
use vmgen_schema::{Definition, GuardMode};

use crate::naming::prefixed;
use crate::{EmitError, INDENT, check_symbol, write_epilogue, write_operands, write_prologue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataOptions {
    pub include_guard: String,
    /// The table is only compiled when this symbol is defined.
    pub feature: String,
    /// Macro holding the instruction-header width.
    pub header_macro: String,
    /// Fallback value for `header_macro` when the includer has not set it.
    pub header_size: u32,
    pub prefix: Option<String>,
    pub guards: GuardMode,
}

impl Default for MetadataOptions {
    fn default() -> Self {
        Self {
            include_guard: "VM_INST_H".into(),
            feature: "MOZVM_OPCODE_SIZE".into(),
            header_macro: "MOZVM_INST_HEADER_SIZE".into(),
            header_size: 1,
            prefix: None,
            guards: GuardMode::Deferred,
        }
    }
}

/// Render the size-table header.
///
/// Unknown opcodes return `-1`.
pub fn emit_metadata(def: &Definition, opts: &MetadataOptions) -> Result<String, EmitError> {
    check_symbol("include guard", &opts.include_guard)?;
    check_symbol("feature gate", &opts.feature)?;
    check_symbol("header macro", &opts.header_macro)?;
    let function = prefixed(opts.prefix.as_deref(), "opcode_size")?;
    debug!(opcodes = def.len(), function = %function, "emitting metadata");

    let mut out = String::new();
    write_prologue(&mut out, &opts.include_guard, &opts.feature)?;

    writeln!(out, "#ifndef {}", opts.header_macro)?;
    writeln!(out, "#define {} {}", opts.header_macro, opts.header_size)?;
    writeln!(out, "#endif")?;
    writeln!(out)?;
    writeln!(out, "static int {function}(int opcode)")?;
    writeln!(out, "{{")?;
    writeln!(out, "{INDENT}int size = {};", opts.header_macro)?;
    writeln!(out, "{INDENT}switch (opcode) {{")?;
    for opcode in &def.opcodes {
        writeln!(out, "{INDENT}case {}:", opcode.name)?;
        write_operands(&mut out, &opcode.operands, &opts.guards, |out, operand| {
            writeln!(out, "{INDENT}{INDENT}size += sizeof({});", operand.ty)
        })?;
        writeln!(out, "{INDENT}{INDENT}return size;")?;
    }
    writeln!(out, "{INDENT}default:")?;
    writeln!(out, "{INDENT}{INDENT}break;")?;
    writeln!(out, "{INDENT}}}")?;
    writeln!(out, "{INDENT}return -1;")?;
    writeln!(out, "}}")?;

    write_epilogue(&mut out, &opts.include_guard, &opts.feature)?;
    Ok(out)
}
