//! Statement Abstract Syntax Tree
//!
//! Defines the statement and expression tree the compiler consumes. A
//! statement is what an upstream parser produces from a SELECT-style query
//! over one or more measurements:
//!
//! ```text
//! SELECT max(usage), host FROM cpu
//! SELECT value FROM cpu, gpu
//! SELECT usage_user + usage_system FROM cpu
//! ```
//!
//! Field expressions range over variable references, function calls, binary
//! arithmetic, and literals. The crate does not own a text parser; the
//! [`StatementBuilder`] is the programmatic construction surface a parser or
//! API layer targets.

use serde::{Deserialize, Serialize};

/// A parsed SELECT statement ready for compilation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectStatement {
    /// Data sources to read from, in statement order
    pub sources: Vec<Source>,
    /// Projected fields, in statement order
    pub fields: Vec<Field>,
}

impl SelectStatement {
    /// Start building a statement reading from a single measurement
    pub fn from_measurement(name: impl Into<String>) -> StatementBuilder {
        StatementBuilder::new().measurement(name)
    }
}

/// A data source in the FROM clause
///
/// Only plain named measurements compile today; other kinds are accepted
/// syntactically and rejected during compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// A named measurement
    Measurement(Measurement),
    /// A nested SELECT statement
    Subquery(Box<SelectStatement>),
}

impl Source {
    /// Short name for this source kind, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Measurement(_) => "measurement",
            Self::Subquery(_) => "subquery",
        }
    }
}

/// A named measurement (series container) to read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    /// Measurement name
    pub name: String,
}

impl Measurement {
    /// Create a measurement descriptor
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl std::fmt::Display for Measurement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A projected field: an expression with an optional alias
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// The expression producing this field's values
    pub expr: Expr,
    /// Optional alias for the result column
    #[serde(default)]
    pub alias: Option<String>,
}

impl Field {
    /// Create a field from an expression
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    /// Add an alias
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Get the display name for the result column (alias or derived name)
    pub fn display_name(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => self.expr.to_string(),
        }
    }
}

/// An expression in a projected field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expr {
    /// A reference to a field or tag by name
    VarRef(VarRef),
    /// A function call
    Call(Call),
    /// A binary arithmetic expression
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// A literal value
    Literal(Literal),
}

impl Expr {
    /// Reference a field or tag by name
    pub fn var(name: impl Into<String>) -> Self {
        Self::VarRef(VarRef::new(name))
    }

    /// Reference a field with a declared value type
    pub fn typed_var(name: impl Into<String>, value_type: ValueType) -> Self {
        Self::VarRef(VarRef::new(name).with_type(value_type))
    }

    /// Call a function with the given arguments
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::Call(Call {
            name: name.into(),
            args,
        })
    }

    /// Combine two expressions with a binary operator
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// An integer literal
    pub fn integer(value: i64) -> Self {
        Self::Literal(Literal::Integer(value))
    }

    /// A floating-point literal
    pub fn number(value: f64) -> Self {
        Self::Literal(Literal::Number(value))
    }

    /// Check whether this expression is a literal value
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VarRef(r) => write!(f, "{}", r.name),
            Self::Call(call) => {
                write!(f, "{}(", call.name)?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Self::Binary { op, lhs, rhs } => write!(f, "{} {} {}", lhs, op, rhs),
            Self::Literal(lit) => write!(f, "{}", lit),
        }
    }
}

/// A reference to a field or tag by name
///
/// The optional value type is a parser-supplied hint (e.g. from an explicit
/// cast) carried onto plan edges for downstream type inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarRef {
    /// Field or tag name
    pub name: String,
    /// Declared value type, if known
    #[serde(default)]
    pub value_type: Option<ValueType>,
}

impl VarRef {
    /// Create an untyped reference
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_type: None,
        }
    }

    /// Declare the value type
    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }
}

/// A function call expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    /// Function name as written in the query
    pub name: String,
    /// Argument expressions
    pub args: Vec<Expr>,
}

/// A literal value in an expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Literal {
    /// Integer literal
    Integer(i64),
    /// Floating-point literal
    Number(f64),
    /// String literal
    String(String),
    /// Boolean literal
    Boolean(bool),
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Number(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "'{}'", v),
            Self::Boolean(v) => write!(f, "{}", v),
        }
    }
}

/// Value types carried on plan edges for type inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// 64-bit float
    Float,
    /// 64-bit signed integer
    Integer,
    /// String
    String,
    /// Boolean
    Boolean,
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Float => write!(f, "float"),
            Self::Integer => write!(f, "integer"),
            Self::String => write!(f, "string"),
            Self::Boolean => write!(f, "boolean"),
        }
    }
}

/// Functions the compiler recognizes
///
/// `percentile` and `sample` are part of the selector vocabulary but are not
/// yet compilable; the compiler rejects them with a clear error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Function {
    /// Count of values (aggregate)
    Count,
    /// Sum of values (aggregate)
    Sum,
    /// Arithmetic mean (aggregate)
    Mean,
    /// Minimum value (selector)
    Min,
    /// Maximum value (selector)
    Max,
    /// First value by time (selector)
    First,
    /// Last value by time (selector)
    Last,
    /// Percentile value (selector, not yet compilable)
    Percentile,
    /// Random sample (selector, not yet compilable)
    Sample,
    /// N largest values (multi-value selector)
    Top,
    /// N smallest values (multi-value selector)
    Bottom,
}

impl Function {
    /// Parse from a function name
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "count" => Some(Self::Count),
            "sum" => Some(Self::Sum),
            "mean" => Some(Self::Mean),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "first" => Some(Self::First),
            "last" => Some(Self::Last),
            "percentile" => Some(Self::Percentile),
            "sample" => Some(Self::Sample),
            "top" => Some(Self::Top),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }

    /// The function name as written in queries
    pub fn name(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Max => "max",
            Self::First => "first",
            Self::Last => "last",
            Self::Percentile => "percentile",
            Self::Sample => "sample",
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }

    /// Selectors return an actual observed row's value; true aggregates
    /// (`count`, `sum`, `mean`) compute a derived value with no source row.
    pub fn is_selector(&self) -> bool {
        matches!(
            self,
            Self::Min | Self::Max | Self::First | Self::Last | Self::Percentile | Self::Sample
        )
    }

    /// `top` and `bottom` return multiple rows and are mutually exclusive
    /// with every other function in a statement.
    pub fn is_top_bottom(&self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }
}

impl std::fmt::Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Binary arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryOp {
    /// Addition
    Add,
    /// Subtraction
    Sub,
    /// Multiplication
    Mul,
    /// Division
    Div,
    /// Remainder
    Mod,
}

impl BinaryOp {
    /// Parse from an operator symbol
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "+" => Some(Self::Add),
            "-" => Some(Self::Sub),
            "*" => Some(Self::Mul),
            "/" => Some(Self::Div),
            "%" => Some(Self::Mod),
            _ => None,
        }
    }

    /// The operator symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
        }
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Builder for constructing statements programmatically
#[derive(Debug, Clone, Default)]
pub struct StatementBuilder {
    sources: Vec<Source>,
    fields: Vec<Field>,
}

impl StatementBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a measurement source
    pub fn measurement(mut self, name: impl Into<String>) -> Self {
        self.sources.push(Source::Measurement(Measurement::new(name)));
        self
    }

    /// Add an arbitrary source
    pub fn source(mut self, source: Source) -> Self {
        self.sources.push(source);
        self
    }

    /// Project an expression
    pub fn field(mut self, expr: Expr) -> Self {
        self.fields.push(Field::new(expr));
        self
    }

    /// Project an expression under an alias
    pub fn field_as(mut self, expr: Expr, alias: impl Into<String>) -> Self {
        self.fields.push(Field::new(expr).with_alias(alias));
        self
    }

    /// Build the statement
    pub fn build(self) -> SelectStatement {
        SelectStatement {
            sources: self.sources,
            fields: self.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_basic() {
        let stmt = SelectStatement::from_measurement("cpu")
            .field(Expr::var("usage"))
            .build();

        assert_eq!(stmt.sources.len(), 1);
        assert_eq!(stmt.sources[0].kind(), "measurement");
        assert_eq!(stmt.fields.len(), 1);
        assert!(stmt.fields[0].alias.is_none());
    }

    #[test]
    fn test_builder_multiple_sources() {
        let stmt = StatementBuilder::new()
            .measurement("cpu")
            .measurement("gpu")
            .field(Expr::call("max", vec![Expr::var("usage")]))
            .build();

        assert_eq!(stmt.sources.len(), 2);
        match &stmt.sources[1] {
            Source::Measurement(m) => assert_eq!(m.name, "gpu"),
            other => panic!("unexpected source: {:?}", other),
        }
    }

    #[test]
    fn test_field_display_name() {
        let field = Field::new(Expr::var("usage"));
        assert_eq!(field.display_name(), "usage");

        let field = Field::new(Expr::call("max", vec![Expr::var("usage")]));
        assert_eq!(field.display_name(), "max(usage)");

        let field = Field::new(Expr::var("usage")).with_alias("u");
        assert_eq!(field.display_name(), "u");
    }

    #[test]
    fn test_expr_display() {
        let expr = Expr::binary(BinaryOp::Add, Expr::var("a"), Expr::var("b"));
        assert_eq!(expr.to_string(), "a + b");

        let expr = Expr::call("top", vec![Expr::var("usage"), Expr::integer(3)]);
        assert_eq!(expr.to_string(), "top(usage, 3)");

        assert_eq!(Expr::number(2.5).to_string(), "2.5");
    }

    #[test]
    fn test_function_from_name() {
        assert_eq!(Function::from_name("mean"), Some(Function::Mean));
        assert_eq!(Function::from_name("top"), Some(Function::Top));
        assert_eq!(Function::from_name("median"), None);
    }

    #[test]
    fn test_function_classification() {
        assert!(Function::Max.is_selector());
        assert!(Function::Percentile.is_selector());
        assert!(!Function::Sum.is_selector());
        assert!(!Function::Count.is_selector());

        assert!(Function::Top.is_top_bottom());
        assert!(Function::Bottom.is_top_bottom());
        assert!(!Function::Min.is_top_bottom());
    }

    #[test]
    fn test_binary_op_symbols() {
        assert_eq!(BinaryOp::from_symbol("+"), Some(BinaryOp::Add));
        assert_eq!(BinaryOp::from_symbol("%"), Some(BinaryOp::Mod));
        assert_eq!(BinaryOp::from_symbol("^"), None);
        assert_eq!(BinaryOp::Div.symbol(), "/");
    }

    #[test]
    fn test_statement_serde_round_trip() {
        let stmt = SelectStatement::from_measurement("cpu")
            .field(Expr::call("max", vec![Expr::typed_var("usage", ValueType::Float)]))
            .field_as(Expr::var("host"), "h")
            .build();

        let json = serde_json::to_string(&stmt).unwrap();
        let back: SelectStatement = serde_json::from_str(&json).unwrap();
        assert_eq!(stmt, back);
    }
}
