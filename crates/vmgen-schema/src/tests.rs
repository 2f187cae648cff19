//! Tests for the definition parser and schema.

use std::collections::BTreeSet;

use crate::{DefinitionError, Fragment, OperandSpec, TypeWidths, parse, parse_from};

const SMALL: &str = "\
#include \"prelude.h\"
DEF(Nop)
{
}
DEF(Byte, uint8_t ch)
{
    if (*CUR++ != ch) { FAIL(); }
}
// string match
DEF(Str, STRING_t str, uint16_t len MOZVM_SMALL_STRING_INST)
{
    MATCH(str);
}
";

#[test]
fn test_opcodes_in_file_order() {
    let def = parse(SMALL).expect("parse failed");
    let names: Vec<_> = def.opcodes.iter().map(|op| op.name.as_str()).collect();
    assert_eq!(names, vec!["Nop", "Byte", "Str"]);

    let sequences: Vec<_> = def.opcodes.iter().map(|op| op.sequence).collect();
    assert_eq!(sequences, vec![0, 1, 2]);
}

#[test]
fn test_first_opcode_offset() {
    let def = parse_from(SMALL, 1).expect("parse failed");
    let sequences: Vec<_> = def.opcodes.iter().map(|op| op.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
}

#[test]
fn test_operands_and_guards() {
    let def = parse(SMALL).unwrap();

    assert!(def.find("Nop").unwrap().operands.is_empty());
    assert_eq!(
        def.find("Byte").unwrap().operands,
        vec![OperandSpec::new("uint8_t", "ch")]
    );
    assert_eq!(
        def.find("Str").unwrap().operands,
        vec![
            OperandSpec::new("STRING_t", "str"),
            OperandSpec::guarded("uint16_t", "len", "MOZVM_SMALL_STRING_INST"),
        ]
    );
    assert_eq!(def.guards(), vec!["MOZVM_SMALL_STRING_INST"]);
}

#[test]
fn test_handler_bodies() {
    let def = parse(SMALL).unwrap();
    assert!(def.find("Nop").unwrap().body.is_empty());
    assert_eq!(
        def.find("Byte").unwrap().body,
        vec!["    if (*CUR++ != ch) { FAIL(); }".to_string()]
    );
}

#[test]
fn test_fragments_preserve_pass_through_text() {
    let def = parse(SMALL).unwrap();
    assert_eq!(
        def.fragments,
        vec![
            Fragment::Text("#include \"prelude.h\"".into()),
            Fragment::Header(0),
            Fragment::Open,
            Fragment::Close(0),
            Fragment::Header(1),
            Fragment::Open,
            Fragment::Text("    if (*CUR++ != ch) { FAIL(); }".into()),
            Fragment::Close(1),
            Fragment::Text("// string match".into()),
            Fragment::Header(2),
            Fragment::Open,
            Fragment::Text("    MATCH(str);".into()),
            Fragment::Close(2),
        ]
    );
}

#[test]
fn test_indented_braces_are_body_text() {
    let source = "DEF(Loop, int n)\n{\n    while (n--) {\n    }\n}\n";
    let def = parse(source).unwrap();
    assert_eq!(
        def.opcodes[0].body,
        vec!["    while (n--) {".to_string(), "    }".to_string()]
    );
}

#[test]
fn test_crlf_input() {
    let def = parse("DEF(Nop)\r\n{\r\n}\r\n").unwrap();
    assert_eq!(def.len(), 1);
    assert_eq!(def.fragments.len(), 3);
}

#[test]
fn test_whitespace_trimmed_per_token() {
    let def = parse("DEF(  Add ,  uint8 x ,uint16   y  )\n{\n}\n").unwrap();
    let add = &def.opcodes[0];
    assert_eq!(add.name, "Add");
    assert_eq!(
        add.operands,
        vec![OperandSpec::new("uint8", "x"), OperandSpec::new("uint16", "y")]
    );
}

#[test]
fn test_unterminated_block() {
    let err = parse("DEF(Nop)\n{\n    NOP();\n").unwrap_err();
    assert_eq!(
        err,
        DefinitionError::UnterminatedBlock {
            line: 2,
            opcode: "Nop".into()
        }
    );
}

#[test]
fn test_unmatched_close() {
    let err = parse("DEF(Nop)\n}\n").unwrap_err();
    assert_eq!(err, DefinitionError::UnexpectedClose { line: 2 });
}

#[test]
fn test_open_without_header() {
    assert_eq!(
        parse("{\n}\n").unwrap_err(),
        DefinitionError::UnexpectedOpen { line: 1 }
    );
    assert_eq!(
        parse("DEF(Nop)\n{\n}\n{\n}\n").unwrap_err(),
        DefinitionError::UnexpectedOpen { line: 4 }
    );
}

#[test]
fn test_header_inside_block() {
    let err = parse("DEF(A)\n{\nDEF(B)\n}\n").unwrap_err();
    assert_eq!(
        err,
        DefinitionError::HeaderInsideBlock {
            line: 3,
            opcode: "A".into()
        }
    );
}

#[test]
fn test_header_without_block() {
    assert_eq!(
        parse("DEF(A, uint8 x)\nDEF(B)\n{\n}\n").unwrap_err(),
        DefinitionError::MissingBlock {
            line: 1,
            opcode: "A".into()
        }
    );
    assert_eq!(
        parse("DEF(A)\n{\n}\n// trailing\nDEF(B)\n").unwrap_err(),
        DefinitionError::MissingBlock {
            line: 5,
            opcode: "B".into()
        }
    );
}

#[test]
fn test_text_between_header_and_block() {
    let def = parse("DEF(A)\n// note\n{\n}\n").unwrap();
    assert_eq!(def.len(), 1);
    assert!(def.opcodes[0].body.is_empty());
}

#[test]
fn test_sequence_overflow() {
    let source = "DEF(A)\n{\n}\nDEF(B)\n{\n}\n";
    assert_eq!(
        parse_from(source, u32::MAX).unwrap_err(),
        DefinitionError::SequenceOverflow {
            line: 4,
            first: u32::MAX
        }
    );

    let def = parse_from("DEF(A)\n{\n}\n", u32::MAX).unwrap();
    assert_eq!(def.opcodes[0].sequence, u32::MAX);
}

#[test]
fn test_malformed_headers() {
    assert!(matches!(
        parse("DEF()\n"),
        Err(DefinitionError::MalformedHeader { line: 1, .. })
    ));
    assert!(matches!(
        parse("DEF(, uint8_t x)\n"),
        Err(DefinitionError::MalformedHeader { line: 1, .. })
    ));
    assert!(matches!(
        parse("DEF(Bad Name)\n"),
        Err(DefinitionError::InvalidName { .. })
    ));
    assert_eq!(
        parse("DEF(Add, uint8_t x, )\n").unwrap_err(),
        DefinitionError::EmptyOperand {
            line: 1,
            opcode: "Add".into(),
            position: 2
        }
    );
}

#[test]
fn test_duplicate_opcode() {
    let err = parse("DEF(Nop)\n{\n}\n\nDEF(Nop)\n{\n}\n").unwrap_err();
    assert_eq!(
        err,
        DefinitionError::DuplicateOpcode {
            line: 5,
            name: "Nop".into(),
            first: 1
        }
    );
}

#[test]
fn test_encoded_size() {
    let def = parse("DEF(ADD, uint8 x, uint16 y)\n{\n END \n}\n").unwrap();
    let add = def.find("ADD").unwrap();
    let widths = TypeWidths::default();

    assert_eq!(add.encoded_size(1, &widths, &BTreeSet::new()), Ok(4));
}

#[test]
fn test_encoded_size_respects_guards() {
    let def = parse("DEF(ADD, uint8 x, uint16 y FOO)\n{\n}\n").unwrap();
    let add = def.find("ADD").unwrap();
    let widths = TypeWidths::default();

    let none = BTreeSet::new();
    let foo: BTreeSet<String> = ["FOO".to_string()].into_iter().collect();
    assert_eq!(add.encoded_size(1, &widths, &none), Ok(2));
    assert_eq!(add.encoded_size(1, &widths, &foo), Ok(4));
}

#[test]
fn test_encoded_size_unknown_type() {
    let def = parse("DEF(Str, STRING_t s)\n{\n}\n").unwrap();
    let err = def.opcodes[0]
        .encoded_size(1, &TypeWidths::default(), &BTreeSet::new())
        .unwrap_err();
    assert!(err.to_string().contains("STRING_t"));
}

#[test]
fn test_schema_json() {
    let def = parse(SMALL).unwrap();
    let json = serde_json::to_value(&def).unwrap();
    let str_op = &json["opcodes"][2];
    assert_eq!(str_op["name"], "Str");
    assert_eq!(str_op["sequence"], 2);
    assert_eq!(str_op["operands"][1]["type"], "uint16_t");
    assert_eq!(str_op["operands"][1]["guard"], "MOZVM_SMALL_STRING_INST");
    assert!(str_op["operands"][0].get("guard").is_none());
}
