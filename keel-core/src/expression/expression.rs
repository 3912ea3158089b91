use crate::{
    Field, Result,
    writer::{Context, SqlWriter},
};
use std::{fmt::Debug, sync::Arc};

/// A renderable SQL expression node.
pub trait Expression: Send + Sync + Debug {
    /// Serialize the expression into the context using the sql writer.
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context) -> Result<()>;
    /// Field whose conversions apply to literal values compared against this
    /// expression.
    fn field(&self) -> Option<&Arc<Field>> {
        None
    }
    /// Whether the expression evaluates to a sequence (valid right side of `IN`).
    fn is_sequence(&self) -> bool {
        false
    }
}

impl<E: Expression + 'static> From<E> for Box<dyn Expression> {
    fn from(value: E) -> Self {
        Box::new(value)
    }
}
