use super::diagram::{DiagramBackend, DiagramWalker, Shape};
use super::{GenerationError, Generator};
use crate::parser::ast::Program;

/// Renders a program as a Mermaid `graph TD` flowchart: node definitions
/// first, a blank line, then the edges.
#[derive(Debug, Default, Clone, Copy)]
pub struct MermaidGenerator;

impl Generator for MermaidGenerator {
    fn generate(&self, program: &Program) -> Result<String, GenerationError> {
        DiagramWalker::new(MermaidBackend::default()).run(program)
    }
}

#[derive(Debug, Default)]
struct MermaidBackend {
    nodes: Vec<String>,
    edges: Vec<String>,
}

impl DiagramBackend for MermaidBackend {
    fn node_id(&self, index: usize) -> String {
        format!("N{index}")
    }

    fn push_node(&mut self, id: &str, label: &str, shape: Shape) {
        let safe = label.replace('"', "#quot;");
        let (open, close) = match shape {
            Shape::Start => ("(\"", "\")"),
            Shape::Process | Shape::Unknown => ("[\"", "\"]"),
            Shape::Io => ("[/\"", "/\"]"),
            Shape::Decision => ("{\"", "\"}"),
            Shape::Merge => ("((\"", "\"))"),
        };
        self.nodes.push(format!("  {id}{open}{safe}{close}"));
    }

    fn push_edge(&mut self, from: &str, to: &str, label: Option<&str>) {
        let edge = match label {
            Some(label) => format!("  {from} --\"{label}\"--> {to}"),
            None => format!("  {from} --> {to}"),
        };
        self.edges.push(edge);
    }

    fn finish(self) -> String {
        format!(
            "graph TD;\n{}\n\n{}",
            self.nodes.join("\n"),
            self.edges.join("\n")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{
        BinaryOperator, Block, Expression, IfStatement, Statement, WhileLoop,
    };

    fn mid_test_program() -> Program {
        Program::new(vec![Statement::While(WhileLoop {
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
        })])
    }

    #[test]
    fn test_mid_test_loop_renders_one_decision() {
        let chart = MermaidGenerator.generate(&mid_test_program()).unwrap();

        // N0 start, N1 decision, N2 loop exit, N3 after-body, N4 end
        assert!(chart.starts_with("graph TD;\n"));
        assert!(chart.contains("N1{\"(x == 10)\"}"));
        assert!(chart.contains("N1 --\"True\"--> N2"));
        assert!(chart.contains("N1 --\"False\"--> N3"));
        assert!(chart.contains("N3 --> N1"));
        // the BREAK inside the guard is folded into the decision node
        assert_eq!(1, chart.matches('{').count());
        assert!(!chart.contains("N5"));
    }

    #[test]
    fn test_output_uses_io_shape_and_escapes_quotes() {
        let program = Program::new(vec![Statement::output(Expression::literal("hi"))]);
        let chart = MermaidGenerator.generate(&program).unwrap();

        assert!(chart.contains("N1[/\"OUTPUT: #quot;hi#quot;\"/]"));
        assert!(chart.contains("N0 --> N1"));
        assert!(chart.contains("N1 --> N2"));
    }

    #[test]
    fn test_if_else_joins_at_merge() {
        let program = Program::new(vec![Statement::If(IfStatement {
            test: Expression::binary(
                BinaryOperator::GreaterThan,
                Expression::identifier("a"),
                Expression::literal(0),
            ),
            consequent: Block::new(vec![Statement::output(Expression::literal("p"))]),
            alternate: Some(Block::new(vec![Statement::output(Expression::literal("n"))])),
        })]);

        let chart = MermaidGenerator.generate(&program).unwrap();

        // N1 decision, N2 merge, N3 true branch, N4 false branch
        assert!(chart.contains("N1 --\"True\"--> N3"));
        assert!(chart.contains("N3 --> N2"));
        assert!(chart.contains("N1 --\"False\"--> N4"));
        assert!(chart.contains("N4 --> N2"));
    }

    #[test]
    fn test_break_outside_loop_fails() {
        let program = Program::new(vec![Statement::Break]);

        assert_eq!(
            Err(GenerationError::break_outside_loop()),
            MermaidGenerator.generate(&program)
        );
    }

    #[test]
    fn test_break_targets_innermost_loop() {
        // LOOP LOOP BREAK ENDLOOP ENDLOOP; the guardless inner loop keeps
        // its standard rendering
        let inner = Statement::While(WhileLoop {
            test: Expression::literal(true),
            body: Block::new(vec![Statement::Break]),
        });
        let program = Program::new(vec![Statement::While(WhileLoop {
            test: Expression::literal(true),
            body: Block::new(vec![inner]),
        })]);

        let chart = MermaidGenerator.generate(&program).unwrap();

        // outer: N1 decision + N2 exit; inner: N3 decision + N4 exit;
        // break merge N5 targets N4, not N2
        assert!(chart.contains("N5 --> N4"));
        assert!(!chart.contains("N5 --> N2"));
    }

    #[test]
    fn test_empty_program_still_links_start_to_end() {
        let chart = MermaidGenerator.generate(&Program::new(vec![])).unwrap();

        assert!(chart.contains("N0(\"Start\")"));
        assert!(chart.contains("N1(\"End\")"));
        assert!(chart.contains("N0 --> N1"));
    }
}
