//! # Confluence
//!
//! Time-series query compiler: lowers a parsed SELECT-style statement over
//! one or more measurements into an executable DAG of streaming operators.
//!
//! ## Features
//!
//! - **Per-field lowering**: raw field reads, aggregate/selector functions,
//!   and binary arithmetic each compile to their own operator subgraph
//! - **Multi-source fan-in**: every function call merges one dedicated
//!   reader per source into a single timestamp-ordered stream
//! - **Shared projections**: raw field references across the whole statement
//!   collapse into one multi-output read, deduplicated by field name
//! - **Shape validation**: aggregate/selector mixing rules and top/bottom
//!   exclusivity are enforced before a plan is handed out
//!
//! ## Modules
//!
//! - [`ast`]: statement and expression tree consumed from the parser
//! - [`graph`]: arena of plan nodes and single-producer/single-consumer edges
//! - [`node`]: operator node variants
//! - [`compile`]: the compiler and its entry point
//! - [`plan`]: target registry handed to the execution engine
//! - [`error`]: compile error taxonomy
//!
//! ## Pipeline
//!
//! ```text
//! Statement → compile fields → link auxiliary fields → validate → select
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use confluence::ast::{Expr, SelectStatement};
//! use confluence::{compile, Plan};
//!
//! # fn main() -> Result<(), confluence::CompileError> {
//! let stmt = SelectStatement::from_measurement("cpu")
//!     .field(Expr::call("max", vec![Expr::var("usage")]))
//!     .field(Expr::var("host"))
//!     .build();
//!
//! let compiled = compile(&stmt)?;
//!
//! let mut plan = Plan::new();
//! let outputs = compiled.select(&mut plan)?;
//! assert_eq!(outputs.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod ast;
pub mod compile;
pub mod error;
pub mod graph;
pub mod node;
pub mod plan;

// Re-export top-level types for convenience
pub use ast::{
    BinaryOp, Call, Expr, Field, Function, Literal, Measurement, SelectStatement, Source,
    StatementBuilder, ValueType, VarRef,
};

pub use compile::{compile, CompiledStatement};
pub use error::{CompileError, CompileResult};
pub use graph::{Edge, EdgeId, Graph, NodeId};
pub use node::PlanNode;
pub use plan::Plan;
