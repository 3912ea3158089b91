use crate::{
    Expression, Result,
    writer::{Context, SqlWriter},
};
use std::borrow::Cow;

/// SQL text written verbatim, e.g. `raw("NOW()")` in a projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raw(pub Cow<'static, str>);

pub fn raw(sql: impl Into<Cow<'static, str>>) -> Raw {
    Raw(sql.into())
}

impl Expression for Raw {
    fn write_query(&self, _writer: &dyn SqlWriter, context: &mut Context) -> Result<()> {
        context.push_str(&self.0);
        Ok(())
    }
}
