use crate::{
    Aliased, AsValue, Between, BinaryOp, Call, Column, Expression, Field, Raw, Result, Select,
    UnaryOp, Value,
    writer::{Context, SqlWriter},
};
use std::{borrow::Cow, sync::Arc};

/// Leaf or subtree on either side of an operator.
#[derive(Debug)]
pub enum Operand {
    Value(Value),
    Expression(Box<dyn Expression>),
    /// SQL text written verbatim.
    Raw(Cow<'static, str>),
}

impl Operand {
    /// Sequence operand built from any collection of values.
    pub fn list<T: AsValue>(values: impl IntoIterator<Item = T>) -> Self {
        Operand::Value(Value::List(
            values.into_iter().map(AsValue::as_value).collect(),
        ))
    }

    pub fn raw(sql: impl Into<Cow<'static, str>>) -> Self {
        Operand::Raw(sql.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Operand::Value(Value::Null))
    }

    pub fn is_sequence(&self) -> bool {
        match self {
            Operand::Value(v) => v.is_list(),
            Operand::Expression(e) => e.is_sequence(),
            Operand::Raw(..) => false,
        }
    }

    pub fn field(&self) -> Option<&Arc<Field>> {
        match self {
            Operand::Expression(e) => e.field(),
            _ => None,
        }
    }

    pub fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context) -> Result<()> {
        match self {
            Operand::Value(v) => context.push_value(writer, v.clone()),
            Operand::Expression(e) => e.write_query(writer, context),
            Operand::Raw(v) => {
                context.push_str(v);
                Ok(())
            }
        }
    }
}

impl<T: AsValue> From<T> for Operand {
    fn from(value: T) -> Self {
        Operand::Value(value.as_value())
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Value(value)
    }
}

impl From<&str> for Operand {
    fn from(value: &str) -> Self {
        Operand::Value(Value::Text(value.into()))
    }
}

impl<T: AsValue, const N: usize> From<[T; N]> for Operand {
    fn from(value: [T; N]) -> Self {
        Operand::list(value)
    }
}

impl<T: AsValue + Clone> From<&[T]> for Operand {
    fn from(value: &[T]) -> Self {
        Operand::list(value.iter().cloned())
    }
}

impl From<Box<dyn Expression>> for Operand {
    fn from(value: Box<dyn Expression>) -> Self {
        Operand::Expression(value)
    }
}

macro_rules! impl_operand_from_expression {
    ($($source:ty),+ $(,)?) => {
        $(
            impl From<$source> for Operand {
                fn from(value: $source) -> Self {
                    Operand::Expression(Box::new(value))
                }
            }
        )+
    };
}
impl_operand_from_expression!(Aliased, Between, BinaryOp, Call, Column, Raw, Select, UnaryOp);
