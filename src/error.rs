//! Compiler error types
//!
//! Every failure is terminal for the current compile: no retries, no partial
//! results. Unsupported-construct cases get distinct variants so callers can
//! tell "never valid" apart from "not yet supported".

use crate::ast::Function;
use thiserror::Error;

/// Errors that can occur while compiling a statement
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// Function name not in the recognized vocabulary
    #[error("unknown function {0}()")]
    UnknownFunction(String),

    /// Recognized function with no compilation path yet
    #[error("{0}() is not yet supported")]
    UnsupportedFunction(String),

    /// Wrong number of arguments to a function call
    #[error("invalid number of arguments for {function}, expected {expected}, got {got}")]
    ArgumentCount {
        function: String,
        expected: usize,
        got: usize,
    },

    /// Function argument must be a plain field reference
    #[error("expected field argument in {0}()")]
    FieldArgument(String),

    /// top/bottom limit argument must be a positive integer literal
    #[error("expected integer limit argument in {0}()")]
    LimitArgument(String),

    /// Literal operand in a binary expression (constant folding unimplemented)
    #[error("literal operands in binary expressions are not yet supported")]
    LiteralOperand,

    /// Expression shape with no compilation path
    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),

    /// Source kind other than a plain named measurement
    #[error("unsupported source kind: {0}")]
    UnsupportedSource(String),

    /// Statement projects nothing except (possibly) `time`
    #[error("at least 1 non-time field must be queried")]
    NoFields,

    /// True aggregates cannot be combined with raw field projections
    #[error("mixing aggregate and non-aggregate queries is not supported")]
    MixedAggregates,

    /// Raw fields share rows with at most one selector function
    #[error("mixing multiple selector functions with tags or fields is not supported")]
    MultipleSelectors,

    /// top/bottom cannot be combined with any other function call
    #[error("selector function {0}() cannot be combined with other functions")]
    ExclusiveSelector(Function),
}

/// Result type for compilation
pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CompileError::NoFields;
        assert_eq!(err.to_string(), "at least 1 non-time field must be queried");

        let err = CompileError::ArgumentCount {
            function: "max".to_string(),
            expected: 1,
            got: 2,
        };
        assert_eq!(
            err.to_string(),
            "invalid number of arguments for max, expected 1, got 2"
        );

        let err = CompileError::ExclusiveSelector(Function::Top);
        assert_eq!(
            err.to_string(),
            "selector function top() cannot be combined with other functions"
        );

        let err = CompileError::UnsupportedSource("subquery".to_string());
        assert_eq!(err.to_string(), "unsupported source kind: subquery");

        let err = CompileError::UnsupportedFunction("distinct".to_string());
        assert_eq!(err.to_string(), "distinct() is not yet supported");
    }
}
