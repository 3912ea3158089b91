use crate::{
    Expression, Field, Operand, Result,
    writer::{Context, SqlWriter},
};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOpType {
    Negative,
    Not,
    IsNull,
    IsNotNull,
    Exists,
    NotExists,
}

#[derive(Debug)]
pub struct UnaryOp {
    pub op: UnaryOpType,
    pub arg: Operand,
}

impl Expression for UnaryOp {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context) -> Result<()> {
        writer.write_expression_unary_op(context, self)
    }
    fn field(&self) -> Option<&Arc<Field>> {
        match self.op {
            UnaryOpType::Negative => self.arg.field(),
            _ => None,
        }
    }
}

/// `expression [NOT] BETWEEN low AND high`
#[derive(Debug)]
pub struct Between {
    pub negated: bool,
    pub operand: Operand,
    pub low: Operand,
    pub high: Operand,
}

impl Expression for Between {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context) -> Result<()> {
        writer.write_expression_between(context, self)
    }
}
