use crate::{Field, Params, Query, Result, SqlWriter, Value};
use std::{
    mem,
    ops::{Deref, DerefMut},
    sync::Arc,
};

/// Statement clause currently being written.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fragment {
    #[default]
    None,
    SqlSelect,
    SqlSelectFrom,
    SqlJoin,
    SqlSelectWhere,
    SqlSelectGroupBy,
    SqlSelectHaving,
    SqlSelectOrderBy,
    SqlLimit,
    SqlInsertInto,
    SqlInsertIntoValues,
    SqlUpdateSet,
    SqlUpdateWhere,
    SqlDeleteFrom,
    SqlDeleteFromWhere,
    SqlCreateTable,
    SqlDropTable,
    SqlShow,
}

/// Rendering options of the innermost scope.
#[derive(Debug, Clone)]
pub struct Options {
    pub fragment: Fragment,
    /// Wrap the scope in parentheses.
    pub parenthesize: bool,
    /// Values become placeholders with a recorded parameter. When false they are
    /// written inline as literals.
    pub bind: bool,
    /// A list value is bound as one parameter instead of one per element.
    pub nested: bool,
    /// Column references are prefixed with their table.
    pub qualify_columns: bool,
    /// Field whose wire conversion applies to the values pushed in this scope.
    pub converter: Option<Arc<Field>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            fragment: Fragment::None,
            parenthesize: false,
            bind: true,
            nested: false,
            qualify_columns: false,
            converter: None,
        }
    }
}

/// Accumulates the statement text and its positional parameters.
///
/// Nested parts of an expression tweak the rendering options through
/// [`Context::with_options`]: the returned guard restores the previous options
/// (and closes the parenthesis, if it opened one) when dropped.
#[derive(Debug, Default)]
pub struct Context {
    out: String,
    params: Vec<Value>,
    current: Options,
    saved: Vec<Options>,
}

impl Context {
    pub fn new(fragment: Fragment) -> Self {
        Self {
            current: Options {
                fragment,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn options(&self) -> &Options {
        &self.current
    }

    pub fn fragment(&self) -> Fragment {
        self.current.fragment
    }

    pub fn with_options(&mut self, update: impl FnOnce(&mut Options)) -> ContextUpdater<'_> {
        let mut options = self.current.clone();
        update(&mut options);
        let parenthesized = options.parenthesize;
        // Parentheses belong to this scope only
        options.parenthesize = false;
        let previous = mem::replace(&mut self.current, options);
        self.saved.push(previous);
        if parenthesized {
            self.out.push('(');
        }
        ContextUpdater {
            context: self,
            parenthesized,
        }
    }

    pub fn switch_fragment(&mut self, fragment: Fragment) -> ContextUpdater<'_> {
        self.with_options(|o| o.fragment = fragment)
    }

    pub fn push_str(&mut self, value: &str) {
        self.out.push_str(value);
    }

    pub fn push(&mut self, value: char) {
        self.out.push(value);
    }

    pub fn out(&mut self) -> &mut String {
        &mut self.out
    }

    pub fn sql(&self) -> &str {
        &self.out
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Writes a value, converted through the scope's field when there is one.
    pub fn push_value(&mut self, writer: &dyn SqlWriter, value: Value) -> Result<()> {
        let value = match &self.current.converter {
            Some(field) => field.to_wire(value)?,
            None => value,
        };
        if !self.current.bind {
            writer.write_value(&mut self.out, &value);
            return Ok(());
        }
        match value {
            Value::List(values) if !self.current.nested => {
                for (i, value) in values.into_iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    writer.write_placeholder(&mut self.out);
                    self.params.push(value);
                }
            }
            value => {
                writer.write_placeholder(&mut self.out);
                self.params.push(value);
            }
        }
        Ok(())
    }

    /// Finishes the statement.
    pub fn query(mut self) -> Query {
        if !self.out.ends_with(';') {
            self.out.push(';');
        }
        Query {
            sql: self.out,
            params: Params::Single(self.params),
        }
    }
}

pub struct ContextUpdater<'a> {
    context: &'a mut Context,
    parenthesized: bool,
}

impl Deref for ContextUpdater<'_> {
    type Target = Context;
    fn deref(&self) -> &Self::Target {
        self.context
    }
}

impl DerefMut for ContextUpdater<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.context
    }
}

impl Drop for ContextUpdater<'_> {
    fn drop(&mut self) {
        if self.parenthesized {
            self.context.out.push(')');
        }
        if let Some(previous) = self.context.saved.pop() {
            self.context.current = previous;
        }
    }
}
