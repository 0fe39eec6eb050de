use super::{expression_to_string, GenerationError};
use crate::parser::ast::{Expression, IfStatement, Program, Statement, WhileLoop};

/// Node shapes shared by every diagram backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Shape {
    Start,
    Process,
    Io,
    Decision,
    Merge,
    Unknown,
}

/// Rendering target of a [`DiagramWalker`]: owns the output buffers and the
/// concrete node/edge syntax.
pub(super) trait DiagramBackend {
    fn node_id(&self, index: usize) -> String;
    fn push_node(&mut self, id: &str, label: &str, shape: Shape);
    fn push_edge(&mut self, from: &str, to: &str, label: Option<&str>);
    fn finish(self) -> String;
}

/// Shared AST walk behind the Mermaid and Graphviz generators.
///
/// Every statement maps to a chain with an entry node and an exit node
/// (either may be absent); sequencing links one statement's exit to the
/// next one's entry. The walker state lives for a single `run` call: the
/// monotonic node counter and the stack of loop-exit nodes that `BREAK`
/// edges target.
pub(super) struct DiagramWalker<B> {
    backend: B,
    node_count: usize,
    loop_exit_stack: Vec<String>,
}

type NodeChain = (Option<String>, Option<String>);

impl<B: DiagramBackend> DiagramWalker<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            node_count: 0,
            loop_exit_stack: vec![],
        }
    }

    pub fn run(mut self, program: &Program) -> Result<String, GenerationError> {
        let start = self.add_node("Start", Shape::Start);

        let (entry, exit) = self.walk_statements(&program.body)?;
        if let Some(entry) = &entry {
            self.backend.push_edge(&start, entry, None);
        }

        let last = exit.unwrap_or(start);
        let end = self.add_node("End", Shape::Start);
        self.backend.push_edge(&last, &end, None);

        Ok(self.backend.finish())
    }

    fn add_node(&mut self, label: &str, shape: Shape) -> String {
        let id = self.backend.node_id(self.node_count);
        self.node_count += 1;
        self.backend.push_node(&id, label, shape);
        id
    }

    fn walk_statements(&mut self, statements: &[Statement]) -> Result<NodeChain, GenerationError> {
        let mut chain = vec![];
        for statement in statements {
            chain.push(self.walk_statement(statement)?);
        }

        for window in chain.windows(2) {
            if let ((_, Some(exit)), (Some(entry), _)) = (&window[0], &window[1]) {
                self.backend.push_edge(exit, entry, None);
            }
        }

        Ok(match (chain.first(), chain.last()) {
            (Some(first), Some(last)) => (first.0.clone(), last.1.clone()),
            _ => (None, None),
        })
    }

    fn walk_statement(&mut self, statement: &Statement) -> Result<NodeChain, GenerationError> {
        match statement {
            Statement::Assignment(assignment) => {
                let label = format!(
                    "{} := {}",
                    expression_to_string(&assignment.left),
                    expression_to_string(&assignment.right)
                );
                let id = self.add_node(&label, Shape::Process);
                Ok((Some(id.clone()), Some(id)))
            }
            Statement::Expression(statement) => {
                if let Expression::Call(call) = &statement.expression {
                    if call.callee == "Output" {
                        let argument = call
                            .arguments
                            .first()
                            .map(expression_to_string)
                            .unwrap_or_default();
                        let id = self.add_node(&format!("OUTPUT: {argument}"), Shape::Io);
                        return Ok((Some(id.clone()), Some(id)));
                    }
                }
                // anything else in statement position is not modeled; keep
                // the chart connected instead of failing
                let id = self.add_node("Unknown Node:\nExpressionStatement", Shape::Unknown);
                Ok((Some(id.clone()), Some(id)))
            }
            Statement::Break => {
                let Some(exit) = self.loop_exit_stack.last().cloned() else {
                    return Err(GenerationError::break_outside_loop());
                };
                let id = self.add_node(" ", Shape::Merge);
                self.backend.push_edge(&id, &exit, None);
                // no exit: nothing ever follows a BREAK
                Ok((Some(id), None))
            }
            Statement::If(if_statement) => self.walk_if(if_statement),
            Statement::While(while_loop) => self.walk_while(while_loop),
        }
    }

    fn walk_if(&mut self, if_statement: &IfStatement) -> Result<NodeChain, GenerationError> {
        let decision = self.add_node(&expression_to_string(&if_statement.test), Shape::Decision);
        let merge = self.add_node(" ", Shape::Merge);

        let (true_entry, true_exit) = self.walk_statements(&if_statement.consequent.body)?;
        self.backend
            .push_edge(&decision, true_entry.as_deref().unwrap_or(&merge), Some("True"));
        if let Some(exit) = &true_exit {
            self.backend.push_edge(exit, &merge, None);
        }

        let alternate = if_statement
            .alternate
            .as_ref()
            .map(|block| block.body.as_slice())
            .unwrap_or(&[]);
        let (false_entry, false_exit) = self.walk_statements(alternate)?;
        self.backend.push_edge(
            &decision,
            false_entry.as_deref().unwrap_or(&merge),
            Some("False"),
        );
        if let Some(exit) = &false_exit {
            self.backend.push_edge(exit, &merge, None);
        }

        Ok((Some(decision), Some(merge)))
    }

    fn walk_while(&mut self, while_loop: &WhileLoop) -> Result<NodeChain, GenerationError> {
        if let Some(chain) = self.walk_mid_test_loop(while_loop)? {
            return Ok(chain);
        }

        let decision = self.add_node(&expression_to_string(&while_loop.test), Shape::Decision);
        let exit = self.add_node(" ", Shape::Merge);

        self.loop_exit_stack.push(exit.clone());
        let (body_entry, body_exit) = self.walk_statements(&while_loop.body.body)?;
        self.backend.push_edge(
            &decision,
            body_entry.as_deref().unwrap_or(&decision),
            Some("True"),
        );
        if let Some(body_exit) = &body_exit {
            self.backend.push_edge(body_exit, &decision, None);
        }
        self.loop_exit_stack.pop();

        self.backend.push_edge(&decision, &exit, Some("False"));
        Ok((Some(decision), Some(exit)))
    }

    /// Recognize the canonical rewrite of a mid-test loop and render it as
    /// one: a `while TRUE` whose body holds an `IF exit { BREAK }` guard with
    /// no alternate. The guard's decision node replaces the whole if; True
    /// leaves the loop, False continues into the rest of the body.
    fn walk_mid_test_loop(
        &mut self,
        while_loop: &WhileLoop,
    ) -> Result<Option<NodeChain>, GenerationError> {
        if !while_loop.test.is_literal_true() {
            return Ok(None);
        }

        let body = &while_loop.body.body;
        let guard = body.iter().enumerate().find_map(|(index, statement)| {
            match statement {
                Statement::If(guard)
                    if guard.alternate.is_none()
                        && matches!(guard.consequent.body.as_slice(), [Statement::Break]) =>
                {
                    Some((index, guard))
                }
                _ => None,
            }
        });
        let Some((index, guard)) = guard else {
            return Ok(None);
        };

        let decision = self.add_node(&expression_to_string(&guard.test), Shape::Decision);
        let exit = self.add_node(" ", Shape::Merge);

        self.loop_exit_stack.push(exit.clone());
        self.backend.push_edge(&decision, &exit, Some("True"));

        let (before_entry, before_exit) = self.walk_statements(&body[..index])?;
        let (after_entry, after_exit) = self.walk_statements(&body[index + 1..])?;

        let loop_entry = before_entry.unwrap_or_else(|| decision.clone());
        if let Some(before_exit) = &before_exit {
            self.backend.push_edge(before_exit, &decision, None);
        }
        self.backend.push_edge(
            &decision,
            after_entry.as_deref().unwrap_or(&loop_entry),
            Some("False"),
        );
        if let Some(after_exit) = &after_exit {
            self.backend.push_edge(after_exit, &loop_entry, None);
        }
        self.loop_exit_stack.pop();

        Ok(Some((Some(loop_entry), Some(exit))))
    }
}
