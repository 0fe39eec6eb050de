mod expression;
mod statement;

pub use self::expression::*;
pub use self::statement::*;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Root node of every parsed program or flowchart. Owns its statements; no
/// node in the tree is shared or holds a back-reference.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Program {
    pub body: Vec<Statement>,
}

/// An ordered statement sequence inside a compound statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Block {
    pub body: Vec<Statement>,
}

impl Program {
    pub fn new(body: Vec<Statement>) -> Self {
        Self { body }
    }
}

impl Block {
    pub fn new(body: Vec<Statement>) -> Self {
        Self { body }
    }
}

// Statements and expressions get their `type` discriminator from the serde
// enum tag; Program and Block are plain structs, so the field is written by
// hand to keep the exported JSON uniform.
impl Serialize for Program {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Program", 2)?;
        state.serialize_field("type", "Program")?;
        state.serialize_field("body", &self.body)?;
        state.end()
    }
}

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Block", 2)?;
        state.serialize_field("type", "Block")?;
        state.serialize_field("body", &self.body)?;
        state.end()
    }
}
