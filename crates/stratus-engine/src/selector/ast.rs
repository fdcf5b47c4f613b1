//! Query AST.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    /// `@`, or the implicit right-hand side of a projection.
    Identity,
    Field(String),
    /// `lhs.rhs` and `lhs | rhs`: evaluate `rhs` against the result of `lhs`.
    Subexpr(Box<Ast>, Box<Ast>),
    Index(i64),
    Slice {
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
    },
    /// Evaluate `rhs` for each element of the array `lhs`, dropping nulls.
    Projection { lhs: Box<Ast>, rhs: Box<Ast> },
    FilterProjection {
        lhs: Box<Ast>,
        predicate: Box<Ast>,
        rhs: Box<Ast>,
    },
    /// `*` applied to an object.
    ObjectValues(Box<Ast>),
    Flatten(Box<Ast>),
    MultiList(Vec<Ast>),
    MultiHash(Vec<(String, Ast)>),
    Literal(Value),
    Not(Box<Ast>),
    And(Box<Ast>, Box<Ast>),
    Or(Box<Ast>, Box<Ast>),
    Compare {
        op: Comparator,
        lhs: Box<Ast>,
        rhs: Box<Ast>,
    },
    Function { name: String, args: Vec<Ast> },
    /// `&expr`, passed unevaluated to functions like `sort_by`.
    Expref(Box<Ast>),
}
