//! Statement Compiler
//!
//! Lowers a [`SelectStatement`] into a DAG of streaming operator nodes,
//! deciding per field what produces its values and wiring every producer to
//! per-source readers:
//!
//! ```text
//! Statement → compile fields → link auxiliary fields → validate → select
//! ```
//!
//! Raw field references share one [`AuxiliaryFields`](crate::node::PlanNode)
//! projection across the whole statement; each function call fans out across
//! every source through its own merge. Validation enforces the engine's
//! mixing rules: true aggregates never combine with raw fields, raw fields
//! ride along with at most one selector, and top/bottom exclude every other
//! function.

use crate::ast::{Call, Expr, Function, Literal, SelectStatement, Source, ValueType, VarRef};
use crate::error::{CompileError, CompileResult};
use crate::graph::{EdgeId, Graph, NodeId};
use crate::node::PlanNode;
use crate::plan::Plan;

/// A statement lowered to an operator DAG, ready to hand to the execution
/// engine
///
/// All nodes and edges are created during [`compile`] and are immutable
/// afterward. [`select`](CompiledStatement::select) registers the output
/// edges as plan targets.
#[derive(Debug)]
pub struct CompiledStatement {
    /// The operator DAG
    graph: Graph,
    /// Data sources, in statement order
    sources: Vec<Source>,
    /// Output edge of every compiled function call
    function_calls: Vec<EdgeId>,
    /// True while every compiled function is a selector
    only_selectors: bool,
    /// First top/bottom function used, if any
    top_bottom: Option<Function>,
    /// Shared projection of raw field references, if any were requested
    auxiliary_fields: Option<NodeId>,
    /// Distinct projection. Reserved: no compilation path sets it yet.
    distinct: Option<NodeId>,
    /// Output edges aligned 1:1 with the requested non-time fields
    output_edges: Vec<EdgeId>,
}

/// Compile a statement into an operator DAG
///
/// Fields compile in statement order; a bare `time` reference is skipped and
/// produces no node. The first error aborts the whole compile with no
/// partial result.
pub fn compile(stmt: &SelectStatement) -> CompileResult<CompiledStatement> {
    let mut compiled = CompiledStatement {
        graph: Graph::new(),
        sources: stmt.sources.clone(),
        function_calls: Vec::new(),
        only_selectors: true,
        top_bottom: None,
        distinct: None,
        auxiliary_fields: None,
        output_edges: Vec::with_capacity(stmt.fields.len()),
    };

    for field in &stmt.fields {
        // `time` is implicit in every result row and produces no node.
        if let Expr::VarRef(r) = &field.expr {
            if r.name == "time" {
                continue;
            }
        }

        let out = compiled.compile_expr(&field.expr)?;
        compiled.output_edges.push(out);
    }

    compiled.link_auxiliary_fields()?;
    compiled.validate_fields()?;

    tracing::debug!(
        "compiled statement: {} nodes, {} edges, {} outputs",
        compiled.graph.node_count(),
        compiled.graph.edge_count(),
        compiled.output_edges.len()
    );
    tracing::trace!("plan graph:\n{}", compiled.graph.describe());
    Ok(compiled)
}

impl CompiledStatement {
    /// Register every output edge as a plan target, in field order, and
    /// return the same list
    ///
    /// Cannot currently fail; the fallible signature is kept for forward
    /// compatibility.
    pub fn select(&self, plan: &mut Plan) -> CompileResult<Vec<EdgeId>> {
        for &out in &self.output_edges {
            plan.add_target(out);
        }
        Ok(self.output_edges.clone())
    }

    /// The operator DAG
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Data sources, in statement order
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Output edges aligned 1:1 with the requested non-time fields
    pub fn output_edges(&self) -> &[EdgeId] {
        &self.output_edges
    }

    /// Output edge of every compiled function call
    pub fn function_calls(&self) -> &[EdgeId] {
        &self.function_calls
    }

    /// True when no true aggregate (`count`, `sum`, `mean`) was compiled
    pub fn only_selectors(&self) -> bool {
        self.only_selectors
    }

    /// First top/bottom function used, if any
    pub fn top_bottom(&self) -> Option<Function> {
        self.top_bottom
    }

    /// The shared auxiliary-field projection node, if raw fields were
    /// requested
    pub fn auxiliary_fields(&self) -> Option<NodeId> {
        self.auxiliary_fields
    }

    /// The distinct projection node. Always `None` today; reserved for a
    /// `distinct()` compilation path.
    pub fn distinct(&self) -> Option<NodeId> {
        self.distinct
    }

    fn compile_expr(&mut self, expr: &Expr) -> CompileResult<EdgeId> {
        match expr {
            Expr::VarRef(reference) => Ok(self.auxiliary_iterator(reference)),
            Expr::Call(call) => self.compile_call(call),
            Expr::Binary { op, lhs, rhs } => {
                if lhs.is_literal() || rhs.is_literal() {
                    return Err(CompileError::LiteralOperand);
                }

                let lhs_edge = self.compile_expr(lhs)?;
                let rhs_edge = self.compile_expr(rhs)?;
                let value_type = common_type(
                    self.graph.edge(lhs_edge).value_type(),
                    self.graph.edge(rhs_edge).value_type(),
                );

                let node = self.graph.insert(PlanNode::Binary {
                    op: *op,
                    lhs: lhs_edge,
                    rhs: rhs_edge,
                });
                self.graph.connect(lhs_edge, node);
                self.graph.connect(rhs_edge, node);
                Ok(self.graph.new_typed_edge(node, value_type))
            }
            Expr::Literal(lit) => Err(CompileError::UnsupportedExpression(format!(
                "literal {}",
                lit
            ))),
        }
    }

    /// Return the shared output edge for a raw field reference, creating the
    /// auxiliary set and/or the edge on first sight of that field name
    fn auxiliary_iterator(&mut self, reference: &VarRef) -> EdgeId {
        let node = match self.auxiliary_fields {
            Some(node) => node,
            None => {
                let node = self
                    .graph
                    .insert(PlanNode::AuxiliaryFields { fields: Vec::new() });
                self.auxiliary_fields = Some(node);
                node
            }
        };

        // Dedup by field name: repeated references share one column read.
        if let PlanNode::AuxiliaryFields { fields } = self.graph.node(node) {
            if let Some((_, edge)) = fields.iter().find(|(f, _)| f.name == reference.name) {
                return *edge;
            }
        }

        let edge = self.graph.new_typed_edge(node, reference.value_type);
        if let PlanNode::AuxiliaryFields { fields } = self.graph.node_mut(node) {
            fields.push((reference.clone(), edge));
        }
        edge
    }

    fn compile_call(&mut self, call: &Call) -> CompileResult<EdgeId> {
        let func = match Function::from_name(&call.name) {
            Some(func) => func,
            None if call.name == "distinct" => {
                return Err(CompileError::UnsupportedFunction(call.name.clone()))
            }
            None => return Err(CompileError::UnknownFunction(call.name.clone())),
        };

        if matches!(func, Function::Percentile | Function::Sample) {
            return Err(CompileError::UnsupportedFunction(call.name.clone()));
        }

        self.compile_function(func, call)
    }

    /// Fan a function call out across every source through a merge and
    /// record the statement-shape metadata validation depends on
    fn compile_function(&mut self, func: Function, call: &Call) -> CompileResult<EdgeId> {
        let expected = if func.is_top_bottom() { 2 } else { 1 };
        if call.args.len() != expected {
            return Err(CompileError::ArgumentCount {
                function: call.name.clone(),
                expected,
                got: call.args.len(),
            });
        }

        // count(distinct(..)) parses as a nested call; there is no
        // compilation path for it yet.
        if func == Function::Count {
            if let Some(Expr::Call(inner)) = call.args.first() {
                if inner.name == "distinct" {
                    return Err(CompileError::UnsupportedFunction("distinct".to_string()));
                }
            }
        }

        let argument = match &call.args[0] {
            Expr::VarRef(reference) => reference.clone(),
            _ => return Err(CompileError::FieldArgument(call.name.clone())),
        };

        let limit = if func.is_top_bottom() {
            Some(limit_argument(func, &call.args[1])?)
        } else {
            None
        };

        let merge = self.source_merge(Some(&argument))?;
        let node = self.graph.insert(PlanNode::Call { func, limit });
        let input = self.graph.add_edge(merge, node);
        self.graph.set_value_type(input, argument.value_type);

        match func {
            Function::Top | Function::Bottom => {
                // First top/bottom wins; a second one still fails validation
                // through the call count.
                if self.top_bottom.is_none() {
                    self.top_bottom = Some(func);
                }
            }
            func if func.is_selector() => {}
            _ => self.only_selectors = false,
        }

        let value_type = match func {
            Function::Count => Some(ValueType::Integer),
            _ => self.graph.edge(input).value_type(),
        };
        let out = self.graph.new_typed_edge(node, value_type);
        self.function_calls.push(out);
        Ok(out)
    }

    /// Build a merge fanning in one reader per source, in statement order.
    /// With a field the readers project that single column; without one they
    /// read whole rows for the auxiliary set.
    fn source_merge(&mut self, field: Option<&VarRef>) -> CompileResult<NodeId> {
        let merge = self.graph.insert(PlanNode::Merge);
        for source in &self.sources {
            let measurement = match source {
                Source::Measurement(m) => m.clone(),
                other => {
                    return Err(CompileError::UnsupportedSource(other.kind().to_string()))
                }
            };

            let reader = self.graph.insert(PlanNode::IteratorCreator {
                measurement,
                field: field.cloned(),
            });
            let edge = self.graph.add_edge(reader, merge);
            self.graph
                .set_value_type(edge, field.and_then(|f| f.value_type));
        }
        Ok(merge)
    }

    /// Wire the shared auxiliary set's input and enforce the mixing rules.
    ///
    /// With exactly one function call the set is spliced after that call's
    /// output, so the selector determines which row's auxiliary values apply
    /// and sources are not read twice. With no calls the set gets its own
    /// per-source merge.
    fn link_auxiliary_fields(&mut self) -> CompileResult<()> {
        let aux = match self.auxiliary_fields {
            Some(aux) => aux,
            None => {
                if self.function_calls.is_empty() {
                    return Err(CompileError::NoFields);
                }
                return Ok(());
            }
        };

        if !self.only_selectors {
            return Err(CompileError::MixedAggregates);
        }
        if self.function_calls.len() > 1 {
            return Err(CompileError::MultipleSelectors);
        }

        if let Some(&call_out) = self.function_calls.first() {
            let spliced = self.graph.splice(call_out, aux);
            for out in &mut self.output_edges {
                if *out == call_out {
                    *out = spliced;
                }
            }
            self.function_calls[0] = spliced;
            tracing::trace!("spliced auxiliary fields after the function call");
        } else {
            let merge = self.source_merge(None)?;
            self.graph.add_edge(merge, aux);
            tracing::trace!("wired auxiliary fields from a source merge");
        }
        Ok(())
    }

    fn validate_fields(&self) -> CompileResult<()> {
        if self.function_calls.len() > 1 {
            if let Some(func) = self.top_bottom {
                return Err(CompileError::ExclusiveSelector(func));
            }
        }
        Ok(())
    }
}

/// Require a positive integer literal as the top/bottom limit
fn limit_argument(func: Function, arg: &Expr) -> CompileResult<u64> {
    match arg {
        Expr::Literal(Literal::Integer(n)) if *n > 0 => Ok(*n as u64),
        _ => Err(CompileError::LimitArgument(func.name().to_string())),
    }
}

fn common_type(lhs: Option<ValueType>, rhs: Option<ValueType>) -> Option<ValueType> {
    match (lhs, rhs) {
        (Some(lhs), Some(rhs)) if lhs == rhs => Some(lhs),
        _ => None,
    }
}
