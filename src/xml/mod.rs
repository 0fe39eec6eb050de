//! FlowXML to AST translation.
//!
//! FlowXML models a flowchart as linked shapes: every shape points at its
//! `_Successor`, an `IF_Control` carries `_left_Child`/`_right_Child`
//! branches, and a `Loop` carries the two body halves around its exit test
//! as `_before_Child`/`_after_Child`. The translator walks those links and
//! produces the same AST the text parser builds, rewriting each mid-test
//! loop into `while TRUE { before; if exit BREAK; after }`.

mod element;

pub use self::element::*;

use log::warn;

use crate::lexer::{Lexer, Token};
use crate::parser::ast::{
    Assignment, Block, Expression, IfStatement, Program, Statement, Value, WhileLoop,
};
use crate::parser::{parse_expression, ParseError, ParseErrorKind};

/// Translate a FlowXML document into a program AST.
pub fn parse(document: &str) -> Result<Program, ParseError> {
    let root = Element::parse(document)?;

    let Some(start) = root.find_descendant("Start") else {
        return Err(ParseError::new(ParseErrorKind::XmlStructure(
            "could not find the Start element".into(),
        )));
    };

    let first = start.find("_Successor").and_then(Element::component);
    let body = translate_chain(first)?;

    Ok(Program::new(body))
}

/// Translate one shape and everything the successor chain reaches.
fn translate_chain(node: Option<&Element>) -> Result<Vec<Statement>, ParseError> {
    let Some(node) = node else {
        return Ok(vec![]);
    };
    if node.is_nil() {
        return Ok(vec![]);
    }

    let node_type = node.node_type();
    let mut statements = vec![];

    let translated = translate_shape(node, &node_type).map_err(|e| {
        ParseError::new(ParseErrorKind::XmlStructure(format!(
            "in {node_type} node: {e}"
        )))
    })?;
    if let Some(statement) = translated {
        statements.push(statement);
    }

    let successor = node.find("_Successor").and_then(Element::component);
    statements.extend(translate_chain(successor)?);

    Ok(statements)
}

fn translate_shape(node: &Element, node_type: &str) -> Result<Option<Statement>, ParseError> {
    match node_type {
        "Rectangle" => translate_rectangle(node),
        "Parallelogram" => translate_parallelogram(node).map(Some),
        "IF_Control" => translate_if(node).map(Some),
        "Loop" => translate_loop(node).map(Some),
        _ => Ok(None),
    }
}

fn translate_rectangle(node: &Element) -> Result<Option<Statement>, ParseError> {
    let text = node.text_of("_text_str", "");

    // a rectangle without `:=` is a procedure call we do not model
    let Some((left_text, right_text)) = text.split_once(":=") else {
        warn!("skipping flowchart rectangle without an assignment: '{}'", text.trim());
        return Ok(None);
    };

    let left = parse_field_expression(left_text.trim())?;
    if !matches!(left, Expression::Identifier(_)) {
        return Err(ParseError::new(ParseErrorKind::InvalidAssignmentTarget));
    }
    let right = parse_field_expression(right_text.trim())?;

    Ok(Some(Statement::Assignment(Assignment { left, right })))
}

fn translate_parallelogram(node: &Element) -> Result<Statement, ParseError> {
    let is_input = node.text_of("_is_input", "false").trim().to_lowercase() == "true";
    let text = node.text_of("_text_str", "").trim().to_owned();

    if is_input {
        let prompt = node.text_of("_prompt", "");
        Ok(Statement::Assignment(Assignment {
            left: Expression::identifier(text),
            right: Expression::input(Expression::literal(Value::from_quoted(prompt.trim()))),
        }))
    } else {
        Ok(Statement::output(parse_field_expression(&text)?))
    }
}

fn translate_if(node: &Element) -> Result<Statement, ParseError> {
    let test = parse_field_expression(&node.text_of("_text_str", ""))?;

    let consequent = translate_chain(node.find("_left_Child").and_then(Element::component))?;
    let alternate = translate_chain(node.find("_right_Child").and_then(Element::component))?;

    Ok(Statement::If(IfStatement {
        test,
        consequent: Block::new(consequent),
        alternate: if alternate.is_empty() {
            None
        } else {
            Some(Block::new(alternate))
        },
    }))
}

/// Rewrite a mid-test loop: the exit condition sits between the two body
/// halves, so the canonical form is an endless loop whose body is
/// `before ++ [if exit { BREAK }] ++ after`.
fn translate_loop(node: &Element) -> Result<Statement, ParseError> {
    let exit_test = parse_field_expression(&node.text_of("_text_str", ""))?;

    let before = translate_chain(node.find("_before_Child").and_then(Element::component))?;
    let after = translate_chain(node.find("_after_Child").and_then(Element::component))?;

    let mut body = before;
    body.push(Statement::If(IfStatement {
        test: exit_test,
        consequent: Block::new(vec![Statement::Break]),
        alternate: None,
    }));
    body.extend(after);

    Ok(Statement::While(WhileLoop {
        test: Expression::literal(true),
        body: Block::new(body),
    }))
}

/// Parse an expression out of a FlowXML text field.
///
/// The flowchart surface syntax differs slightly from FlowLang, so the text
/// is rewritten first (see [`rewrite_field_syntax`]), then lexed and handed
/// to the expression parser. Newline markers never delimit anything inside a
/// text field and are dropped.
fn parse_field_expression(text: &str) -> Result<Expression, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::new(ParseErrorKind::EmptyExpression));
    }

    let rewritten = rewrite_field_syntax(text);
    let tokens = Lexer::new(&rewritten).lex().map_err(|e| {
        ParseError::new(ParseErrorKind::XmlStructure(format!(
            "failed to read expression '{text}': {e}"
        )))
    })?;
    let tokens: Vec<Token> = tokens
        .into_iter()
        .filter(|token| !matches!(token, Token::Newline { .. }))
        .collect();

    parse_expression(&tokens)?.ok_or_else(|| ParseError::new(ParseErrorKind::EmptyExpression))
}

/// Map flowchart expression syntax onto FlowLang syntax:
/// lowercase `mod`/`and`/`or`/`not` become their uppercase operators, a lone
/// `=` becomes `==`, and `<>` becomes `!=`. String literals pass through
/// untouched, as do identifiers that merely contain an operator word.
fn rewrite_field_syntax(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '"' {
            out.push('"');
            i += 1;
            while i < chars.len() {
                let inner = chars[i];
                out.push(inner);
                i += 1;
                if inner == '\\' && i < chars.len() {
                    out.push(chars[i]);
                    i += 1;
                } else if inner == '"' {
                    break;
                }
            }
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            out.push_str(match word.as_str() {
                "mod" => "MOD",
                "and" => "AND",
                "or" => "OR",
                "not" => "NOT",
                _ => &word,
            });
            continue;
        }

        if c == '<' && chars.get(i + 1) == Some(&'>') {
            out.push_str("!=");
            i += 2;
            continue;
        }

        if c == '=' {
            let part_of_operator = matches!(
                i.checked_sub(1).and_then(|p| chars.get(p)),
                Some(':' | '!' | '<' | '>' | '=')
            ) || chars.get(i + 1) == Some(&'=');
            if part_of_operator {
                out.push('=');
            } else {
                out.push_str("==");
            }
            i += 1;
            continue;
        }

        out.push(c);
        i += 1;
    }

    out
}
