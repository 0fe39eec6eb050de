//! AST-walking executor for FlowLang programs.
//!
//! The interpreter owns a flat variable store and talks to the outside world
//! through two callbacks: `input` receives the prompt of an `INPUT(…)` call
//! and returns the reply, `output` receives every value an `OUTPUT`
//! statement produces. After `run` the final store stays inspectable, which
//! is what the tests and the embedding API use.

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;
use std::fs;
use std::path::Path;

use crate::lexer::Lexer;
use crate::parser::ast::{
    BinaryExpression, BinaryOperator, Expression, Program, Statement, UnaryOperator, Value,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub message: String,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> RuntimeError {
        RuntimeError {
            message: message.into(),
        }
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for RuntimeError {}

/// Signal used to unwind a `BREAK` to the innermost enclosing loop.
enum Flow {
    Normal,
    Break,
}

pub struct Interpreter<'a> {
    program: Program,
    memory: HashMap<String, Value>,
    input: Box<dyn FnMut(&str) -> String + 'a>,
    output: Box<dyn FnMut(&Value) + 'a>,
}

impl<'a> Interpreter<'a> {
    pub fn from_program(
        program: Program,
        input: impl FnMut(&str) -> String + 'a,
        output: impl FnMut(&Value) + 'a,
    ) -> Self {
        Self {
            program,
            memory: HashMap::new(),
            input: Box::new(input),
            output: Box::new(output),
        }
    }

    pub fn run(&mut self) -> Result<(), RuntimeError> {
        let body = self.program.body.clone();
        match self.run_statements(&body)? {
            Flow::Normal => Ok(()),
            Flow::Break => Err(RuntimeError::new("BREAK outside of a loop")),
        }
    }

    /// The final variable store.
    pub fn memory(&self) -> &HashMap<String, Value> {
        &self.memory
    }

    fn run_statements(&mut self, statements: &[Statement]) -> Result<Flow, RuntimeError> {
        for statement in statements {
            if let Flow::Break = self.run_statement(statement)? {
                return Ok(Flow::Break);
            }
        }
        Ok(Flow::Normal)
    }

    fn run_statement(&mut self, statement: &Statement) -> Result<Flow, RuntimeError> {
        match statement {
            Statement::Assignment(assignment) => {
                let value = self.evaluate(&assignment.right)?;
                let Expression::Identifier(target) = &assignment.left else {
                    return Err(RuntimeError::new("assignment target must be a variable"));
                };
                self.memory.insert(target.name.clone(), value);
                Ok(Flow::Normal)
            }
            Statement::Expression(statement) => {
                let Expression::Call(call) = &statement.expression else {
                    return Err(RuntimeError::new("only calls may stand alone"));
                };
                if call.callee != "Output" {
                    return Err(RuntimeError::new(format!(
                        "call to undefined procedure '{}'",
                        call.callee
                    )));
                }
                let Some(argument) = call.arguments.first() else {
                    return Err(RuntimeError::new("OUTPUT requires an argument"));
                };
                let value = self.evaluate(argument)?;
                (self.output)(&value);
                Ok(Flow::Normal)
            }
            Statement::If(if_statement) => {
                if self.truthy(&if_statement.test)? {
                    self.run_statements(&if_statement.consequent.body)
                } else if let Some(alternate) = &if_statement.alternate {
                    self.run_statements(&alternate.body)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Statement::While(while_loop) => {
                while self.truthy(&while_loop.test)? {
                    if let Flow::Break = self.run_statements(&while_loop.body.body)? {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }
            Statement::Break => Ok(Flow::Break),
        }
    }

    fn truthy(&mut self, test: &Expression) -> Result<bool, RuntimeError> {
        match self.evaluate(test)? {
            Value::Boolean(value) => Ok(value),
            other => Err(RuntimeError::new(format!(
                "condition must be a boolean, found a {}",
                other.type_name()
            ))),
        }
    }

    fn evaluate(&mut self, expression: &Expression) -> Result<Value, RuntimeError> {
        match expression {
            Expression::Literal(literal) => Ok(literal.value.clone()),
            Expression::Identifier(identifier) => self
                .memory
                .get(&identifier.name)
                .cloned()
                .ok_or_else(|| {
                    RuntimeError::new(format!("use of undefined variable '{}'", identifier.name))
                }),
            Expression::Binary(binary) => self.run_binary(binary),
            Expression::Unary(unary) => {
                let value = self.evaluate(&unary.argument)?;
                match (unary.operator, value) {
                    (UnaryOperator::Minus, Value::Integer(value)) => Ok(Value::Integer(-value)),
                    (UnaryOperator::Minus, Value::Float(value)) => Ok(Value::Float(-value)),
                    (UnaryOperator::Not, Value::Boolean(value)) => Ok(Value::Boolean(!value)),
                    (operator, value) => Err(RuntimeError::new(format!(
                        "cannot apply '{operator}' to a {}",
                        value.type_name()
                    ))),
                }
            }
            Expression::Call(call) => {
                if call.callee != "Input" {
                    return Err(RuntimeError::new(format!(
                        "call to undefined function '{}'",
                        call.callee
                    )));
                }
                let prompt = match call.arguments.first() {
                    Some(argument) => match self.evaluate(argument)? {
                        Value::String(prompt) => prompt,
                        other => other.to_string(),
                    },
                    None => String::new(),
                };
                let reply = (self.input)(&prompt);
                Ok(coerce_input(reply))
            }
        }
    }

    fn run_binary(&mut self, binary: &BinaryExpression) -> Result<Value, RuntimeError> {
        // logical operators short-circuit; everything else is eager
        if matches!(binary.operator, BinaryOperator::And | BinaryOperator::Or) {
            let left = self.logical_operand(&binary.left, binary.operator)?;
            match (binary.operator, left) {
                (BinaryOperator::And, false) => return Ok(Value::Boolean(false)),
                (BinaryOperator::Or, true) => return Ok(Value::Boolean(true)),
                _ => {}
            }
            let right = self.logical_operand(&binary.right, binary.operator)?;
            return Ok(Value::Boolean(right));
        }

        let left = self.evaluate(&binary.left)?;
        let right = self.evaluate(&binary.right)?;
        apply_binary(binary.operator, left, right)
    }

    fn logical_operand(
        &mut self,
        expression: &Expression,
        operator: BinaryOperator,
    ) -> Result<bool, RuntimeError> {
        match self.evaluate(expression)? {
            Value::Boolean(value) => Ok(value),
            other => Err(RuntimeError::new(format!(
                "'{operator}' requires boolean operands, found a {}",
                other.type_name()
            ))),
        }
    }
}

/// `INPUT` replies are coerced the way the language expects: an integer when
/// the text parses as one, then a float, otherwise the raw string.
fn coerce_input(reply: String) -> Value {
    let trimmed = reply.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Value::Integer(value);
    }
    if let Ok(value) = trimmed.parse::<f64>() {
        return Value::Float(value);
    }
    Value::String(reply)
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(value) => Some(*value as f64),
        Value::Float(value) => Some(*value),
        _ => None,
    }
}

fn apply_binary(
    operator: BinaryOperator,
    left: Value,
    right: Value,
) -> Result<Value, RuntimeError> {
    use BinaryOperator::*;

    match operator {
        Add => {
            // `+` doubles as concatenation as soon as a string shows up
            if let (Value::String(_), _) | (_, Value::String(_)) = (&left, &right) {
                return Ok(Value::String(format!("{left}{right}")));
            }
            arithmetic(operator, left, right)
        }
        Subtract | Multiply | Divide | Modulo => arithmetic(operator, left, right),
        Equal => Ok(Value::Boolean(values_equal(&left, &right))),
        NotEqual => Ok(Value::Boolean(!values_equal(&left, &right))),
        LessThan | GreaterThan | LessOrEqual | GreaterOrEqual => compare(operator, left, right),
        And | Or => Err(RuntimeError::new(format!(
            "'{operator}' requires boolean operands"
        ))),
    }
}

fn arithmetic(operator: BinaryOperator, left: Value, right: Value) -> Result<Value, RuntimeError> {
    use BinaryOperator::*;

    if let (Value::Integer(l), Value::Integer(r)) = (&left, &right) {
        let (l, r) = (*l, *r);
        return match operator {
            Add => Ok(Value::Integer(l + r)),
            Subtract => Ok(Value::Integer(l - r)),
            Multiply => Ok(Value::Integer(l * r)),
            // division leaves the integers: FlowLang's `/` is real division
            Divide => {
                if r == 0 {
                    return Err(RuntimeError::new("division by zero"));
                }
                Ok(Value::Float(l as f64 / r as f64))
            }
            Modulo => {
                if r == 0 {
                    return Err(RuntimeError::new("division by zero"));
                }
                Ok(Value::Integer(l % r))
            }
            _ => Err(RuntimeError::new(format!("'{operator}' is not arithmetic"))),
        };
    }

    let (Some(l), Some(r)) = (as_number(&left), as_number(&right)) else {
        return Err(RuntimeError::new(format!(
            "cannot apply '{operator}' to a {} and a {}",
            left.type_name(),
            right.type_name()
        )));
    };

    match operator {
        Add => Ok(Value::Float(l + r)),
        Subtract => Ok(Value::Float(l - r)),
        Multiply => Ok(Value::Float(l * r)),
        Divide => {
            if r == 0.0 {
                return Err(RuntimeError::new("division by zero"));
            }
            Ok(Value::Float(l / r))
        }
        Modulo => {
            if r == 0.0 {
                return Err(RuntimeError::new("division by zero"));
            }
            Ok(Value::Float(l % r))
        }
        _ => Err(RuntimeError::new(format!("'{operator}' is not arithmetic"))),
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    if let (Some(l), Some(r)) = (as_number(left), as_number(right)) {
        return l == r;
    }
    left == right
}

fn compare(operator: BinaryOperator, left: Value, right: Value) -> Result<Value, RuntimeError> {
    use std::cmp::Ordering;

    let ordering = if let (Some(l), Some(r)) = (as_number(&left), as_number(&right)) {
        l.partial_cmp(&r)
    } else if let (Value::String(l), Value::String(r)) = (&left, &right) {
        Some(l.cmp(r))
    } else {
        None
    };

    let Some(ordering) = ordering else {
        return Err(RuntimeError::new(format!(
            "cannot compare a {} with a {}",
            left.type_name(),
            right.type_name()
        )));
    };

    let result = match operator {
        BinaryOperator::LessThan => ordering == Ordering::Less,
        BinaryOperator::GreaterThan => ordering == Ordering::Greater,
        BinaryOperator::LessOrEqual => ordering != Ordering::Greater,
        BinaryOperator::GreaterOrEqual => ordering != Ordering::Less,
        _ => return Err(RuntimeError::new(format!("'{operator}' is not a comparison"))),
    };

    Ok(Value::Boolean(result))
}

/// Execute FlowLang source and hand back the final variable store.
pub fn run_source(
    source: &str,
    input: impl FnMut(&str) -> String,
    output: impl FnMut(&Value),
) -> Result<HashMap<String, Value>, Box<dyn Error>> {
    let tokens = Lexer::new(source).lex()?;
    let program = crate::parser::parse(&mut tokens.into())?;

    let mut interpreter = Interpreter::from_program(program, input, output);
    interpreter.run()?;

    Ok(interpreter.memory().clone())
}

/// Execute a FlowLang program stored on disk.
pub fn run_file(
    path: impl AsRef<Path>,
    input: impl FnMut(&str) -> String,
    output: impl FnMut(&Value),
) -> Result<HashMap<String, Value>, Box<dyn Error>> {
    let source = fs::read_to_string(path)?;
    run_source(&source, input, output)
}
