//! Data model produced by the definition parser.

use serde::Serialize;

/// One typed field following the opcode byte in the instruction stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperandSpec {
    /// Primitive type name as written in the definition (e.g. `uint16_t`).
    #[serde(rename = "type")]
    pub ty: String,
    /// Variable the decoded value is bound to in the handler.
    pub name: String,
    /// Conditional-compilation symbol; the operand only exists when it is defined.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
}

impl OperandSpec {
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
            guard: None,
        }
    }

    pub fn guarded(ty: impl Into<String>, name: impl Into<String>, guard: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
            guard: Some(guard.into()),
        }
    }
}

/// A single instruction as declared by a `DEF(...)` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpcodeDefinition {
    pub name: String,
    /// Numeric encoding of the opcode, assigned in file order.
    pub sequence: u32,
    /// Operands in encoding order.
    pub operands: Vec<OperandSpec>,
    /// Handler lines between the block delimiters, verbatim.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<String>,
    /// 1-based line of the `DEF(` header.
    #[serde(skip)]
    pub line: usize,
}

impl OpcodeDefinition {
    /// Distinct guard symbols referenced by the operands, in first-use order.
    pub fn guards(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for guard in self.operands.iter().filter_map(|op| op.guard.as_deref()) {
            if !seen.contains(&guard) {
                seen.push(guard);
            }
        }
        seen
    }
}

/// Structural pieces of the definition file, in source order.
///
/// The dispatch emitter replays these to rebuild the interpreter source; the
/// other emitters only look at [`Definition::opcodes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// A `DEF(...)` header; the index points into [`Definition::opcodes`].
    Header(usize),
    /// A lone `{` line.
    Open,
    /// A lone `}` line closing the handler of the given opcode.
    Close(usize),
    /// Any other line, copied through untouched.
    Text(String),
}

/// The parsed instruction set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Definition {
    pub opcodes: Vec<OpcodeDefinition>,
    #[serde(skip)]
    pub fragments: Vec<Fragment>,
}

impl Definition {
    pub fn find(&self, name: &str) -> Option<&OpcodeDefinition> {
        self.opcodes.iter().find(|op| op.name == name)
    }

    pub fn len(&self) -> usize {
        self.opcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opcodes.is_empty()
    }

    /// Every guard symbol used anywhere in the instruction set, in first-use order.
    pub fn guards(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for guard in self.opcodes.iter().flat_map(|op| op.guards()) {
            if !seen.contains(&guard) {
                seen.push(guard);
            }
        }
        seen
    }
}

/// Returns true if `s` is usable as a C identifier.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
