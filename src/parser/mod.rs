pub mod ast;
mod expression;
mod parse_state;

pub use self::expression::*;
pub use self::parse_state::*;

use std::{error::Error, fmt::Display};

use crate::lexer::{Position, Terminal, Token};

use self::ast::{Assignment, Block, Expression, IfStatement, Program, Statement, WhileLoop};

#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    UnexpectedToken(String),
    UnexpectedEof,
    InvalidAssignmentTarget,
    EmptyExpression,
    MissingKeyword(String),
    XmlStructure(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub position: Option<Position>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind) -> ParseError {
        ParseError {
            kind,
            position: None,
        }
    }

    pub fn at(kind: ParseErrorKind, position: Position) -> ParseError {
        ParseError {
            kind,
            position: Some(position),
        }
    }

    pub fn unexpected(token: &Token) -> ParseError {
        ParseError::at(
            ParseErrorKind::UnexpectedToken(token.to_string()),
            token.position(),
        )
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ParseErrorKind::UnexpectedToken(token) => write!(f, "unexpected token '{token}'")?,
            ParseErrorKind::UnexpectedEof => f.write_str("unexpected end of input")?,
            ParseErrorKind::InvalidAssignmentTarget => {
                f.write_str("invalid left-hand side in assignment")?
            }
            ParseErrorKind::EmptyExpression => f.write_str("expected an expression")?,
            ParseErrorKind::MissingKeyword(expected) => write!(f, "expected '{expected}'")?,
            ParseErrorKind::XmlStructure(detail) => {
                write!(f, "malformed flowchart XML: {detail}")?
            }
        }

        if let Some(Position { line, col }) = self.position {
            write!(f, " (line {line}, column {col})")?;
        }

        Ok(())
    }
}

impl Error for ParseError {}

/// Parse a full token stream into a program.
///
/// The stream still contains the newline markers emitted by the lexer; they
/// delimit statements here and are skipped everywhere else.
pub fn parse(tokens: &mut ParseState) -> Result<Program, ParseError> {
    let mut body = vec![];

    tokens.skip_newlines();
    while tokens.peek().is_some() {
        body.push(parse_statement(tokens)?);
        tokens.skip_newlines();
    }

    Ok(Program::new(body))
}

fn parse_statement(tokens: &mut ParseState) -> Result<Statement, ParseError> {
    tokens.skip_newlines();

    match tokens.peek() {
        Some(Token::IfKeyword { .. }) => parse_if(tokens),
        Some(Token::LoopKeyword { .. }) | Some(Token::WhileKeyword { .. }) => parse_loop(tokens),
        Some(Token::BreakKeyword { .. }) => {
            tokens.next();
            Ok(Statement::Break)
        }
        Some(Token::OutputKeyword { .. }) => parse_output(tokens),
        Some(token) if starts_expression(&token) => parse_assignment(tokens),
        Some(token) => Err(ParseError::unexpected(&token)),
        None => Err(ParseError::new(ParseErrorKind::UnexpectedEof)),
    }
}

fn starts_expression(token: &Token) -> bool {
    matches!(
        token,
        Token::LParen { .. }
            | Token::NotKeyword { .. }
            | Token::Minus { .. }
            | Token::InputKeyword { .. }
            | Token::TrueKeyword { .. }
            | Token::FalseKeyword { .. }
            | Token::StringLiteral { .. }
            | Token::Integer { .. }
            | Token::FloatingPoint { .. }
            | Token::Id { .. }
    )
}

fn ends_expression(token: &Token) -> bool {
    matches!(
        token,
        Token::Newline { .. }
            | Token::Assign { .. }
            | Token::ThenKeyword { .. }
            | Token::DoKeyword { .. }
            | Token::EndLoopKeyword { .. }
            | Token::IfKeyword { .. }
            | Token::LoopKeyword { .. }
            | Token::WhileKeyword { .. }
            | Token::BreakKeyword { .. }
            | Token::OutputKeyword { .. }
    )
}

/// Split off the token run that forms one expression and parse it.
///
/// The run ends at the first boundary token (see [`ends_expression`]) found
/// at parenthesis depth 0. Newline markers inside parentheses are dropped,
/// which is the only place an expression may span lines.
fn require_expression(tokens: &mut ParseState) -> Result<Expression, ParseError> {
    let mut collected = vec![];
    let mut depth = 0usize;

    while let Some(token) = tokens.peek() {
        if depth == 0 && ends_expression(&token) {
            break;
        }
        tokens.next();

        match token {
            Token::LParen { .. } => depth += 1,
            // a stray closer ends the run; the expression parser reports it
            Token::RParen { .. } if depth == 0 => {
                collected.push(token);
                break;
            }
            Token::RParen { .. } => depth -= 1,
            Token::Newline { .. } => continue,
            _ => {}
        }
        collected.push(token);
    }

    if collected.is_empty() {
        let position = tokens.peek().map(|token| token.position());
        return Err(ParseError {
            kind: ParseErrorKind::EmptyExpression,
            position,
        });
    }

    parse_expression(&collected)?.ok_or_else(|| ParseError::new(ParseErrorKind::EmptyExpression))
}

fn expect(tokens: &mut ParseState, expected: Terminal) -> Result<(), ParseError> {
    match tokens.next() {
        Some(token) if token == expected.to_token(Position::default()) => Ok(()),
        Some(token) => Err(ParseError::at(
            ParseErrorKind::MissingKeyword(expected.lexeme().into()),
            token.position(),
        )),
        None => Err(ParseError::new(ParseErrorKind::UnexpectedEof)),
    }
}

fn parse_assignment(tokens: &mut ParseState) -> Result<Statement, ParseError> {
    let left = require_expression(tokens)?;

    if !matches!(tokens.peek(), Some(Token::Assign { .. })) {
        return match tokens.peek() {
            Some(token) => Err(ParseError::at(
                ParseErrorKind::MissingKeyword(":=".into()),
                token.position(),
            )),
            None => Err(ParseError::new(ParseErrorKind::MissingKeyword(":=".into()))),
        };
    }
    tokens.next();

    let right = require_expression(tokens)?;

    if !matches!(left, Expression::Identifier(_)) {
        return Err(ParseError::new(ParseErrorKind::InvalidAssignmentTarget));
    }

    Ok(Statement::Assignment(Assignment { left, right }))
}

fn parse_output(tokens: &mut ParseState) -> Result<Statement, ParseError> {
    tokens.next();
    let argument = require_expression(tokens)?;
    Ok(Statement::output(argument))
}

fn parse_if(tokens: &mut ParseState) -> Result<Statement, ParseError> {
    tokens.next();
    let test = require_expression(tokens)?;
    expect(tokens, Terminal::ThenKeyword)?;

    let mut consequent = vec![];
    loop {
        tokens.skip_newlines();
        match tokens.peek() {
            Some(Token::ElseKeyword { .. }) | Some(Token::EndIfKeyword { .. }) | None => break,
            _ => consequent.push(parse_statement(tokens)?),
        }
    }

    let mut alternate = None;
    if matches!(tokens.peek(), Some(Token::ElseKeyword { .. })) {
        tokens.next();
        let mut body = vec![];
        loop {
            tokens.skip_newlines();
            match tokens.peek() {
                Some(Token::EndIfKeyword { .. }) | None => break,
                _ => body.push(parse_statement(tokens)?),
            }
        }
        alternate = Some(Block::new(body));
    }

    expect(tokens, Terminal::EndIfKeyword)?;

    Ok(Statement::If(IfStatement {
        test,
        consequent: Block::new(consequent),
        alternate,
    }))
}

fn parse_loop(tokens: &mut ParseState) -> Result<Statement, ParseError> {
    let test = match tokens.next() {
        Some(Token::LoopKeyword { .. }) => Expression::literal(true),
        Some(Token::WhileKeyword { .. }) => {
            let test = require_expression(tokens)?;
            expect(tokens, Terminal::DoKeyword)?;
            test
        }
        _ => unreachable!(),
    };

    let mut body = vec![];
    loop {
        tokens.skip_newlines();
        match tokens.peek() {
            Some(Token::EndLoopKeyword { .. }) | None => break,
            _ => body.push(parse_statement(tokens)?),
        }
    }
    expect(tokens, Terminal::EndLoopKeyword)?;

    Ok(Statement::While(WhileLoop {
        test,
        body: Block::new(body),
    }))
}

#[cfg(test)]
mod tests {
    use super::ast::*;
    use super::*;
    use crate::lexer::Lexer;

    fn parse_str(input: &str) -> Result<Program, ParseError> {
        let tokens = Lexer::new(input).lex().expect("lexing should succeed");
        parse(&mut tokens.into())
    }

    #[test]
    fn test_parse_assignment_and_output() {
        let program = parse_str("radius := 2\n\nOUTPUT radius\n").expect("should parse");

        assert_eq!(
            Program::new(vec![
                Statement::assignment(Expression::identifier("radius"), Expression::literal(2)),
                Statement::output(Expression::identifier("radius")),
            ]),
            program
        );
    }

    #[test]
    fn test_parse_input_assignment() {
        let program = parse_str("x := INPUT(\"?\")").expect("should parse");

        assert_eq!(
            Program::new(vec![Statement::assignment(
                Expression::identifier("x"),
                Expression::input(Expression::literal("?")),
            )]),
            program
        );
    }

    #[test]
    fn test_parse_if_else() {
        let program =
            parse_str("IF (a > 0) THEN\n  OUTPUT \"p\"\nELSE\n  OUTPUT \"n\"\nENDIF\n")
                .expect("should parse");

        assert_eq!(
            Program::new(vec![Statement::If(IfStatement {
                test: Expression::binary(
                    BinaryOperator::GreaterThan,
                    Expression::identifier("a"),
                    Expression::literal(0),
                ),
                consequent: Block::new(vec![Statement::output(Expression::literal("p"))]),
                alternate: Some(Block::new(vec![Statement::output(Expression::literal("n"))])),
            })]),
            program
        );
    }

    #[test]
    fn test_parse_loop_and_break() {
        let program = parse_str("LOOP\n  BREAK\nENDLOOP\n").expect("should parse");

        assert_eq!(
            Program::new(vec![Statement::While(WhileLoop {
                test: Expression::literal(true),
                body: Block::new(vec![Statement::Break]),
            })]),
            program
        );
    }

    #[test]
    fn test_parse_while_do() {
        let program = parse_str("WHILE i < 10 DO\n  i := i + 1\nENDLOOP\n").expect("should parse");

        assert_eq!(
            Program::new(vec![Statement::While(WhileLoop {
                test: Expression::binary(
                    BinaryOperator::LessThan,
                    Expression::identifier("i"),
                    Expression::literal(10),
                ),
                body: Block::new(vec![Statement::assignment(
                    Expression::identifier("i"),
                    Expression::binary(
                        BinaryOperator::Add,
                        Expression::identifier("i"),
                        Expression::literal(1),
                    ),
                )]),
            })]),
            program
        );
    }

    #[test]
    fn test_expression_spans_lines_inside_parens() {
        let program = parse_str("x := (1 +\n  2)\n").expect("should parse");

        assert_eq!(
            Program::new(vec![Statement::assignment(
                Expression::identifier("x"),
                Expression::binary(
                    BinaryOperator::Add,
                    Expression::literal(1),
                    Expression::literal(2),
                ),
            )]),
            program
        );
    }

    #[test]
    fn test_output_without_argument() {
        let result = parse_str("OUTPUT");
        assert!(matches!(
            result,
            Err(ParseError {
                kind: ParseErrorKind::EmptyExpression,
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_assignment_target() {
        let result = parse_str("1 := 2");
        assert!(matches!(
            result,
            Err(ParseError {
                kind: ParseErrorKind::InvalidAssignmentTarget,
                ..
            })
        ));
    }

    #[test]
    fn test_bare_expression_statement_is_an_error() {
        let result = parse_str("x + 1\n");
        assert!(matches!(
            result,
            Err(ParseError {
                kind: ParseErrorKind::MissingKeyword(_),
                ..
            })
        ));
    }

    #[test]
    fn test_missing_endif() {
        let result = parse_str("IF TRUE THEN\n  OUTPUT \"dangling\"\n");
        assert_eq!(Err(ParseError::new(ParseErrorKind::UnexpectedEof)), result);
    }

    #[test]
    fn test_missing_then() {
        let result = parse_str("IF TRUE\n  OUTPUT 1\nENDIF\n");
        assert!(matches!(
            result,
            Err(ParseError {
                kind: ParseErrorKind::MissingKeyword(_),
                ..
            })
        ));
    }

    #[test]
    fn test_comments_are_transparent() {
        let with_comments = parse_str("-- header\nx := 1 -- trailing\nOUTPUT x\n");
        let without = parse_str("x := 1\nOUTPUT x\n");
        assert_eq!(without, with_comments);
    }

    #[test]
    fn test_stray_keyword_is_rejected() {
        let result = parse_str("ENDIF\n");
        assert!(matches!(
            result,
            Err(ParseError {
                kind: ParseErrorKind::UnexpectedToken(_),
                ..
            })
        ));
    }
}
