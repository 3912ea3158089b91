use crate::{
    Expression, Field, Result,
    writer::{Context, SqlWriter},
};
use std::{borrow::Cow, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    ASC,
    DESC,
}

#[derive(Debug)]
pub struct Ordered {
    pub order: Order,
    pub expression: Box<dyn Expression>,
}

impl Expression for Ordered {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context) -> Result<()> {
        writer.write_expression_ordered(context, self)
    }
    fn field(&self) -> Option<&Arc<Field>> {
        self.expression.field()
    }
}

/// `expression AS alias`, used in projections.
#[derive(Debug)]
pub struct Aliased {
    pub expression: Box<dyn Expression>,
    pub alias: Cow<'static, str>,
}

impl Expression for Aliased {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context) -> Result<()> {
        self.expression.write_query(writer, context)?;
        context.push_str(" AS ");
        writer.write_identifier_quoted(context.out(), &self.alias);
        Ok(())
    }
    fn field(&self) -> Option<&Arc<Field>> {
        self.expression.field()
    }
}
