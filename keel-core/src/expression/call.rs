use crate::{
    Expression, Operand, Result,
    writer::{Context, SqlWriter},
};
use std::borrow::Cow;

/// SQL function call, mostly aggregates: `COUNT(1)`, `SUM(`price`)`.
#[derive(Debug)]
pub struct Call {
    pub function: Cow<'static, str>,
    pub distinct: bool,
    pub args: Vec<Operand>,
}

impl Call {
    pub fn new(function: impl Into<Cow<'static, str>>, args: Vec<Operand>) -> Self {
        Self {
            function: function.into(),
            distinct: false,
            args,
        }
    }
    pub fn count_all() -> Self {
        Self::new("COUNT", vec![Operand::raw("1")])
    }
    pub fn count(expression: impl Into<Operand>) -> Self {
        Self::new("COUNT", vec![expression.into()])
    }
    pub fn count_distinct(expression: impl Into<Operand>) -> Self {
        Self {
            distinct: true,
            ..Self::count(expression)
        }
    }
    pub fn sum(expression: impl Into<Operand>) -> Self {
        Self::new("SUM", vec![expression.into()])
    }
    pub fn avg(expression: impl Into<Operand>) -> Self {
        Self::new("AVG", vec![expression.into()])
    }
    pub fn min(expression: impl Into<Operand>) -> Self {
        Self::new("MIN", vec![expression.into()])
    }
    pub fn max(expression: impl Into<Operand>) -> Self {
        Self::new("MAX", vec![expression.into()])
    }
}

impl Expression for Call {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context) -> Result<()> {
        writer.write_expression_call(context, self)
    }
}
