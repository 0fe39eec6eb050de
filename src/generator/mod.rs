mod diagram;
mod expression;
mod flowlang;
mod graphviz;
mod mermaid;

pub use self::expression::expression_to_string;
pub use self::flowlang::FlowLangGenerator;
pub use self::graphviz::GraphvizGenerator;
pub use self::mermaid::MermaidGenerator;

use std::{error::Error, fmt::Display};

use crate::parser::ast::Program;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationErrorKind {
    BreakOutsideLoop,
    UnknownNode(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationError {
    pub kind: GenerationErrorKind,
}

impl GenerationError {
    pub fn break_outside_loop() -> GenerationError {
        GenerationError {
            kind: GenerationErrorKind::BreakOutsideLoop,
        }
    }

    pub fn unknown_node(kind: impl Into<String>) -> GenerationError {
        GenerationError {
            kind: GenerationErrorKind::UnknownNode(kind.into()),
        }
    }
}

impl Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            GenerationErrorKind::BreakOutsideLoop => {
                f.write_str("BREAK statement found outside of a loop")
            }
            GenerationErrorKind::UnknownNode(kind) => {
                write!(f, "cannot generate code for node kind '{kind}'")
            }
        }
    }
}

impl Error for GenerationError {}

/// Common interface of the AST-to-text generators. Implementations keep no
/// state across calls, so one generator value can serve many programs.
pub trait Generator {
    fn generate(&self, program: &Program) -> Result<String, GenerationError>;
}
