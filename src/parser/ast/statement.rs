use serde::{Deserialize, Serialize};

use super::{Block, Expression};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Statement {
    #[serde(rename = "AssignmentStatement")]
    Assignment(Assignment),
    #[serde(rename = "ExpressionStatement")]
    Expression(ExpressionStatement),
    #[serde(rename = "IfStatement")]
    If(IfStatement),
    #[serde(rename = "WhileStatement")]
    While(WhileLoop),
    #[serde(rename = "BreakStatement")]
    Break,
}

/// `left := right`. The left side is always an [`Identifier`] in ASTs built
/// by the parsers; the translators reject anything else.
///
/// [`Identifier`]: super::Identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub left: Expression,
    pub right: Expression,
}

/// A call in statement position. The only call allowed here is `Output`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionStatement {
    pub expression: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStatement {
    pub test: Expression,
    pub consequent: Block,
    #[serde(default)]
    pub alternate: Option<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhileLoop {
    pub test: Expression,
    pub body: Block,
}

impl Statement {
    pub fn assignment(left: Expression, right: Expression) -> Statement {
        Statement::Assignment(Assignment { left, right })
    }

    /// The canonical `OUTPUT` statement: an `Output` call wrapped in an
    /// expression statement.
    pub fn output(argument: Expression) -> Statement {
        Statement::Expression(ExpressionStatement {
            expression: Expression::call("Output", vec![argument]),
        })
    }
}
