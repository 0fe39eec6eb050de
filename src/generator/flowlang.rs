use super::{expression_to_string, GenerationError, Generator};
use crate::parser::ast::{Expression, Program, Statement};

/// Emits FlowLang source text, two spaces of indentation per block level.
///
/// A `while TRUE` loop is printed as `LOOP … ENDLOOP`; the rewritten
/// mid-test shape needs no further treatment because its `IF … BREAK` guard
/// is an ordinary statement in the body.
#[derive(Debug, Default, Clone, Copy)]
pub struct FlowLangGenerator;

impl Generator for FlowLangGenerator {
    fn generate(&self, program: &Program) -> Result<String, GenerationError> {
        let mut lines = vec![];
        write_statements(&program.body, 0, &mut lines)?;
        Ok(lines.join("\n"))
    }
}

fn write_statements(
    statements: &[Statement],
    level: usize,
    lines: &mut Vec<String>,
) -> Result<(), GenerationError> {
    let indent = "  ".repeat(level);

    for statement in statements {
        match statement {
            Statement::Assignment(assignment) => lines.push(format!(
                "{indent}{} := {}",
                expression_to_string(&assignment.left),
                expression_to_string(&assignment.right)
            )),
            Statement::Expression(statement) => {
                let Expression::Call(call) = &statement.expression else {
                    return Err(GenerationError::unknown_node("ExpressionStatement"));
                };
                if call.callee != "Output" {
                    return Err(GenerationError::unknown_node("ExpressionStatement"));
                }
                let argument = call
                    .arguments
                    .first()
                    .map(expression_to_string)
                    .unwrap_or_default();
                lines.push(format!("{indent}OUTPUT {argument}"));
            }
            Statement::If(if_statement) => {
                lines.push(format!(
                    "{indent}IF {} THEN",
                    expression_to_string(&if_statement.test)
                ));
                write_statements(&if_statement.consequent.body, level + 1, lines)?;
                if let Some(alternate) = &if_statement.alternate {
                    lines.push(format!("{indent}ELSE"));
                    write_statements(&alternate.body, level + 1, lines)?;
                }
                lines.push(format!("{indent}ENDIF"));
            }
            Statement::While(while_loop) => {
                if while_loop.test.is_literal_true() {
                    lines.push(format!("{indent}LOOP"));
                } else {
                    lines.push(format!(
                        "{indent}WHILE {} DO",
                        expression_to_string(&while_loop.test)
                    ));
                }
                write_statements(&while_loop.body.body, level + 1, lines)?;
                lines.push(format!("{indent}ENDLOOP"));
            }
            Statement::Break => lines.push(format!("{indent}BREAK")),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{Block, BinaryOperator, IfStatement, WhileLoop};

    #[test]
    fn test_generate_mid_test_loop() {
        let program = Program::new(vec![Statement::While(WhileLoop {
            test: Expression::literal(true),
            body: Block::new(vec![
                Statement::If(IfStatement {
                    test: Expression::binary(
                        BinaryOperator::Equal,
                        Expression::identifier("x"),
                        Expression::literal(10),
                    ),
                    consequent: Block::new(vec![Statement::Break]),
                    alternate: None,
                }),
                Statement::assignment(
                    Expression::identifier("x"),
                    Expression::binary(
                        BinaryOperator::Add,
                        Expression::identifier("x"),
                        Expression::literal(1),
                    ),
                ),
            ]),
        })]);

        let expected = "\
LOOP
  IF (x == 10) THEN
    BREAK
  ENDIF
  x := (x + 1)
ENDLOOP";

        assert_eq!(
            Ok(expected.to_string()),
            FlowLangGenerator.generate(&program)
        );
    }

    #[test]
    fn test_generate_if_else_and_while() {
        let program = Program::new(vec![
            Statement::If(IfStatement {
                test: Expression::binary(
                    BinaryOperator::GreaterThan,
                    Expression::identifier("a"),
                    Expression::literal(0),
                ),
                consequent: Block::new(vec![Statement::output(Expression::literal("p"))]),
                alternate: Some(Block::new(vec![Statement::output(Expression::literal(
                    "n",
                ))])),
            }),
            Statement::While(WhileLoop {
                test: Expression::binary(
                    BinaryOperator::LessThan,
                    Expression::identifier("i"),
                    Expression::literal(3),
                ),
                body: Block::new(vec![Statement::assignment(
                    Expression::identifier("i"),
                    Expression::binary(
                        BinaryOperator::Add,
                        Expression::identifier("i"),
                        Expression::literal(1),
                    ),
                )]),
            }),
        ]);

        let expected = "\
IF (a > 0) THEN
  OUTPUT \"p\"
ELSE
  OUTPUT \"n\"
ENDIF
WHILE (i < 3) DO
  i := (i + 1)
ENDLOOP";

        assert_eq!(
            Ok(expected.to_string()),
            FlowLangGenerator.generate(&program)
        );
    }

    #[test]
    fn test_non_output_call_statement_is_fatal() {
        use crate::parser::ast::ExpressionStatement;

        let program = Program::new(vec![Statement::Expression(ExpressionStatement {
            expression: Expression::call("Beep", vec![]),
        })]);

        assert_eq!(
            Err(GenerationError::unknown_node("ExpressionStatement")),
            FlowLangGenerator.generate(&program)
        );
    }
}
