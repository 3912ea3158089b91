use crate::{
    Expression, Field, Operand, Result,
    writer::{Context, SqlWriter},
};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOpType {
    Multiplication,
    Division,
    Remainder,
    Addition,
    Subtraction,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    Is,
    IsNot,
    /// Case sensitive pattern match (`LIKE BINARY`).
    Like,
    NotLike,
    /// Case insensitive pattern match, following the column collation.
    ILike,
    NotILike,
    Regexp,
    NotRegexp,
    In,
    NotIn,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOpType {
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOpType::And | BinaryOpType::Or)
    }
}

#[derive(Debug)]
pub struct BinaryOp {
    pub op: BinaryOpType,
    pub lhs: Operand,
    pub rhs: Operand,
}

impl BinaryOp {
    pub fn new(op: BinaryOpType, lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Self {
        Self {
            op,
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }
}

impl Expression for BinaryOp {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context) -> Result<()> {
        writer.write_expression_binary_op(context, self)
    }
    fn field(&self) -> Option<&Arc<Field>> {
        if self.op.is_logical() {
            return None;
        }
        self.lhs.field().or_else(|| self.rhs.field())
    }
}
