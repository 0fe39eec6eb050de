use crate::parser::ast::{CallExpression, Expression, UnaryOperator, Value};

/// Render an expression as FlowLang surface text.
///
/// Binary expressions are always parenthesized so the printed form keeps its
/// structure when parsed back; re-quoted strings keep their stored content
/// verbatim.
pub fn expression_to_string(expression: &Expression) -> String {
    match expression {
        Expression::Literal(literal) => match &literal.value {
            Value::String(value) => format!("\"{value}\""),
            value => value.to_string(),
        },
        Expression::Identifier(identifier) => identifier.name.clone(),
        Expression::Binary(binary) => format!(
            "({} {} {})",
            expression_to_string(&binary.left),
            binary.operator,
            expression_to_string(&binary.right)
        ),
        Expression::Unary(unary) => match unary.operator {
            UnaryOperator::Not => format!("NOT {}", expression_to_string(&unary.argument)),
            UnaryOperator::Minus => format!("(-{})", expression_to_string(&unary.argument)),
        },
        Expression::Call(call) => call_to_string(call),
    }
}

fn call_to_string(call: &CallExpression) -> String {
    let arguments: Vec<String> = call.arguments.iter().map(expression_to_string).collect();

    if call.callee == "Input" {
        format!("INPUT({})", arguments.first().cloned().unwrap_or_default())
    } else {
        format!("{}({})", call.callee, arguments.join(", "))
    }
}
