//! Disassembler backend.

use std::fmt::Write as FmtWrite;

use tracing::debug;
use vmgen_schema::{Definition, GuardMode};

use crate::naming::prefixed;
use crate::{EmitError, INDENT, check_symbol, write_epilogue, write_operands, write_prologue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpOptions {
    pub include_guard: String,
    pub feature: String,
    /// Type of the opaque handle passed through to every print routine.
    pub context_type: String,
    /// Operand printers are named `<print_prefix><type>`.
    pub print_prefix: String,
    /// Routine that prints the opcode name.
    pub name_routine: String,
    pub prefix: Option<String>,
    pub guards: GuardMode,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            include_guard: "VM_DUMP_H".into(),
            feature: "MOZVM_DUMP_INSTRUCTION".into(),
            context_type: "moz_runtime_t *".into(),
            print_prefix: "dump_".into(),
            name_routine: "dump_opcode".into(),
            prefix: None,
            guards: GuardMode::Deferred,
        }
    }
}

/// Render the `dump_instruction` function.
///
/// The generated function receives the cursor just past the opcode header,
/// prints each operand with its type's routine and returns the cursor of the
/// following instruction, or `NULL` for an opcode it does not know.
pub fn emit_dump(def: &Definition, opts: &DumpOptions) -> Result<String, EmitError> {
    check_symbol("include guard", &opts.include_guard)?;
    check_symbol("feature gate", &opts.feature)?;
    check_symbol("print prefix", &opts.print_prefix)?;
    check_symbol("name routine", &opts.name_routine)?;
    check_context_type(&opts.context_type)?;
    let function = prefixed(opts.prefix.as_deref(), "dump_instruction")?;
    debug!(opcodes = def.len(), function = %function, "emitting dump");

    let ctx = opts.context_type.trim_end();
    let sep = if ctx.ends_with('*') { "" } else { " " };

    let mut out = String::new();
    write_prologue(&mut out, &opts.include_guard, &opts.feature)?;

    writeln!(
        out,
        "static const uint8_t *{function}({ctx}{sep}ctx, const uint8_t *PC, int opcode)"
    )?;
    writeln!(out, "{{")?;
    writeln!(out, "{INDENT}switch (opcode) {{")?;
    for opcode in &def.opcodes {
        writeln!(out, "{INDENT}case {}:", opcode.name)?;
        writeln!(out, "{INDENT}{INDENT}{}(ctx, \"{}\");", opts.name_routine, opcode.name)?;
        write_operands(&mut out, &opcode.operands, &opts.guards, |out, operand| {
            writeln!(out, "{INDENT}{INDENT}{}{}(ctx, PC);", opts.print_prefix, operand.ty)?;
            writeln!(out, "{INDENT}{INDENT}PC += sizeof({});", operand.ty)
        })?;
        writeln!(out, "{INDENT}{INDENT}return PC;")?;
    }
    writeln!(out, "{INDENT}default:")?;
    writeln!(out, "{INDENT}{INDENT}break;")?;
    writeln!(out, "{INDENT}}}")?;
    writeln!(out, "{INDENT}return NULL;")?;
    writeln!(out, "}}")?;

    write_epilogue(&mut out, &opts.include_guard, &opts.feature)?;
    Ok(out)
}

/// Accepts one or more identifiers followed by optional `*`s, such as
/// `struct vm *` or `const ctx_t **`.
fn check_context_type(value: &str) -> Result<(), EmitError> {
    let base = value.trim_end_matches(|c: char| c == '*' || c.is_whitespace());
    let mut words = base.split_whitespace().peekable();
    if words.peek().is_some() && words.all(vmgen_schema::is_identifier) {
        Ok(())
    } else {
        Err(EmitError::InvalidSymbol {
            what: "context type",
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmgen_schema::parse;

    #[test]
    fn test_dump_case() {
        let def = parse("DEF(Str, STRING_t str, uint16_t len SMALL)\n{\n}\n").unwrap();
        let code = emit_dump(&def, &DumpOptions::default()).unwrap();

        assert!(code.contains(
            "static const uint8_t *dump_instruction(moz_runtime_t *ctx, const uint8_t *PC, int opcode)"
        ));
        let expected_case = "    case Str:
        dump_opcode(ctx, \"Str\");
        dump_STRING_t(ctx, PC);
        PC += sizeof(STRING_t);
#ifdef SMALL
        dump_uint16_t(ctx, PC);
        PC += sizeof(uint16_t);
#endif /* SMALL */
        return PC;
";
        assert!(code.contains(expected_case), "{code}");
        assert!(code.contains("    return NULL;\n}\n"));
    }

    #[test]
    fn test_dump_feature_gate() {
        let def = parse("DEF(Nop)\n{\n}\n").unwrap();
        let code = emit_dump(&def, &DumpOptions::default()).unwrap();
        assert!(code.contains("#ifdef MOZVM_DUMP_INSTRUCTION\n"));
        assert!(code.ends_with("#endif /* MOZVM_DUMP_INSTRUCTION */\n\n#endif /* VM_DUMP_H */\n"));
    }

    #[test]
    fn test_context_type_without_pointer() {
        let def = parse("DEF(Nop)\n{\n}\n").unwrap();
        let opts = DumpOptions {
            context_type: "ctx_t".into(),
            prefix: Some("re".into()),
            ..DumpOptions::default()
        };
        let code = emit_dump(&def, &opts).unwrap();
        assert!(code.contains("static const uint8_t *re_dump_instruction(ctx_t ctx, const uint8_t *PC, int opcode)"));
    }

    #[test]
    fn test_context_type_validation() {
        assert!(check_context_type("moz_runtime_t *").is_ok());
        assert!(check_context_type("const struct vm **").is_ok());
        assert!(check_context_type("ctx_t").is_ok());

        let def = parse("DEF(Nop)\n{\n}\n").unwrap();
        for bad in ["", " * ", "ctx_t); system(", "int[4]"] {
            let opts = DumpOptions {
                context_type: bad.into(),
                ..DumpOptions::default()
            };
            assert!(
                matches!(
                    emit_dump(&def, &opts),
                    Err(EmitError::InvalidSymbol {
                        what: "context type",
                        ..
                    })
                ),
                "{bad:?} accepted"
            );
        }
    }
}
