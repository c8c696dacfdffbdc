use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    /// `export const`
    Value,
    /// `export type`
    Type,
}

impl DeclarationKind {
    pub fn keyword(self) -> &'static str {
        match self {
            DeclarationKind::Value => "const",
            DeclarationKind::Type => "type",
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeclarationKind::Value => write!(f, "value"),
            DeclarationKind::Type => write!(f, "type"),
        }
    }
}

/// A named top-level export from the schema file, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationBlock {
    pub name: String,
    pub kind: DeclarationKind,
    pub raw_text: String,
}
