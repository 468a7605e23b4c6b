//! Plan node variants
//!
//! Each variant is a unit of planned computation. Connectivity lives in the
//! [`Graph`](crate::graph::Graph) arena; nodes hold only their parameters,
//! except where an input role must be distinguished (a binary expression
//! names its left and right operand edges explicitly).

use crate::ast::{BinaryOp, Function, Measurement, VarRef};
use crate::graph::EdgeId;

/// A unit of planned computation in the operator DAG
#[derive(Debug, Clone)]
pub enum PlanNode {
    /// Leaf reader over one measurement. With a field, reads that single
    /// column; without one, reads every auxiliary field the statement
    /// requested (resolved through the compiled statement's shared set).
    IteratorCreator {
        measurement: Measurement,
        field: Option<VarRef>,
    },

    /// Fan-in of same-shaped streams from multiple sources into one stream.
    /// Inputs are merged by timestamp at execution time; the compiler only
    /// wires topology.
    Merge,

    /// An aggregate or selector function over its input stream. `limit` is
    /// set for top/bottom only.
    Call { func: Function, limit: Option<u64> },

    /// Binary arithmetic over two input streams
    Binary {
        op: BinaryOp,
        lhs: EdgeId,
        rhs: EdgeId,
    },

    /// Shared multi-output projection of every raw field/tag the statement
    /// references. One output edge per distinct field name.
    AuxiliaryFields { fields: Vec<(VarRef, EdgeId)> },

    /// Distinct-values projection. Reserved: no compilation path creates
    /// one yet; `distinct()` is rejected during compilation.
    Distinct,
}

impl PlanNode {
    /// Short name for this node kind, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::IteratorCreator { .. } => "read",
            Self::Merge => "merge",
            Self::Call { .. } => "call",
            Self::Binary { .. } => "binary",
            Self::AuxiliaryFields { .. } => "aux",
            Self::Distinct => "distinct",
        }
    }
}

impl std::fmt::Display for PlanNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IteratorCreator { measurement, field } => match field {
                Some(field) => write!(f, "read({}.{})", measurement, field.name),
                None => write!(f, "read({}.*)", measurement),
            },
            Self::Merge => write!(f, "merge"),
            Self::Call { func, limit } => match limit {
                Some(limit) => write!(f, "{}({})", func, limit),
                None => write!(f, "{}()", func),
            },
            Self::Binary { op, .. } => write!(f, "binary({})", op),
            Self::AuxiliaryFields { fields } => {
                write!(f, "aux(")?;
                for (i, (field, _)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", field.name)?;
                }
                write!(f, ")")
            }
            Self::Distinct => write!(f, "distinct"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let node = PlanNode::IteratorCreator {
            measurement: Measurement::new("cpu"),
            field: Some(VarRef::new("usage")),
        };
        assert_eq!(node.to_string(), "read(cpu.usage)");

        let node = PlanNode::IteratorCreator {
            measurement: Measurement::new("cpu"),
            field: None,
        };
        assert_eq!(node.to_string(), "read(cpu.*)");

        let node = PlanNode::Call {
            func: Function::Top,
            limit: Some(3),
        };
        assert_eq!(node.to_string(), "top(3)");

        assert_eq!(PlanNode::Merge.kind(), "merge");
    }
}
