use super::diagram::{DiagramBackend, DiagramWalker, Shape};
use super::{GenerationError, Generator};
use crate::parser::ast::Program;

/// Renders a program as a Graphviz `digraph` with orthogonal edges.
#[derive(Debug, Default, Clone, Copy)]
pub struct GraphvizGenerator;

impl Generator for GraphvizGenerator {
    fn generate(&self, program: &Program) -> Result<String, GenerationError> {
        DiagramWalker::new(GraphvizBackend::new()).run(program)
    }
}

#[derive(Debug)]
struct GraphvizBackend {
    dot: String,
}

impl GraphvizBackend {
    fn new() -> Self {
        let mut dot = String::from("digraph Flowchart {\n");
        dot.push_str("  graph [splines=ortho];\n");
        dot.push_str(
            "  node [fontname=\"Helvetica\", fontsize=10, style=\"rounded,filled\", fillcolor=white];\n",
        );
        dot.push_str("  edge [fontname=\"Helvetica\", fontsize=9];\n\n");
        Self { dot }
    }
}

fn escape(label: &str) -> String {
    label
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

impl DiagramBackend for GraphvizBackend {
    fn node_id(&self, index: usize) -> String {
        format!("node{index}")
    }

    fn push_node(&mut self, id: &str, label: &str, shape: Shape) {
        let shape_name = match shape {
            Shape::Start => "ellipse",
            Shape::Process => "box",
            Shape::Io => "parallelogram",
            Shape::Decision => "diamond",
            Shape::Merge => "point",
            Shape::Unknown => "octagon",
        };

        let mut attrs = vec![format!("label=\"{}\"", escape(label)), format!("shape={shape_name}")];
        match shape {
            // merge points are invisible joints
            Shape::Merge => attrs.extend([
                "width=\"0.1\"".to_string(),
                "height=\"0.1\"".to_string(),
                "label=\"\"".to_string(),
            ]),
            Shape::Start => attrs.push("fillcolor=\"#f8f8f8\"".to_string()),
            Shape::Decision => attrs.push("fillcolor=\"#f0f8ff\"".to_string()),
            _ => {}
        }

        self.dot.push_str(&format!("  {id} [{}];\n", attrs.join(", ")));
    }

    fn push_edge(&mut self, from: &str, to: &str, label: Option<&str>) {
        let attrs = match label {
            Some(label) => format!("xlabel=\"{}\"", escape(label)),
            None => String::new(),
        };
        self.dot.push_str(&format!("  {from} -> {to} [{attrs}];\n"));
    }

    fn finish(mut self) -> String {
        self.dot.push_str("}\n");
        self.dot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{Expression, Statement};

    #[test]
    fn test_digraph_frame_and_styles() {
        let program = Program::new(vec![Statement::output(Expression::literal(42))]);
        let dot = GraphvizGenerator.generate(&program).unwrap();

        assert!(dot.starts_with("digraph Flowchart {\n"));
        assert!(dot.contains("graph [splines=ortho];"));
        assert!(dot.contains("style=\"rounded,filled\""));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn test_node_shapes_and_edges() {
        let program = Program::new(vec![
            Statement::assignment(Expression::identifier("x"), Expression::literal(1)),
            Statement::output(Expression::identifier("x")),
        ]);
        let dot = GraphvizGenerator.generate(&program).unwrap();

        assert!(dot.contains("node0 [label=\"Start\", shape=ellipse, fillcolor=\"#f8f8f8\"];"));
        assert!(dot.contains("node1 [label=\"x := 1\", shape=box];"));
        assert!(dot.contains("node2 [label=\"OUTPUT: x\", shape=parallelogram];"));
        assert!(dot.contains("node1 -> node2 [];"));
        assert!(dot.contains("node0 -> node1 [];"));
    }

    #[test]
    fn test_labels_are_escaped() {
        let program = Program::new(vec![Statement::output(Expression::literal("say \"hi\""))]);
        let dot = GraphvizGenerator.generate(&program).unwrap();

        assert!(dot.contains("label=\"OUTPUT: \\\"say \\\"hi\\\"\\\"\""));
    }

    #[test]
    fn test_decision_edges_carry_xlabels() {
        use crate::parser::ast::{Block, WhileLoop};

        let program = Program::new(vec![Statement::While(WhileLoop {
            test: Expression::binary(
                crate::parser::ast::BinaryOperator::LessThan,
                Expression::identifier("i"),
                Expression::literal(3),
            ),
            body: Block::new(vec![Statement::assignment(
                Expression::identifier("i"),
                Expression::literal(0),
            )]),
        })]);
        let dot = GraphvizGenerator.generate(&program).unwrap();

        assert!(dot.contains("[xlabel=\"True\"];"));
        assert!(dot.contains("[xlabel=\"False\"];"));
        assert!(dot.contains("shape=diamond"));
        assert!(dot.contains("shape=point"));
    }
}
