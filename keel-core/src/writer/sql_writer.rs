use crate::{
    Between, BinaryOp, BinaryOpType, Call, Expression, Field, FieldDefault, FieldKind, Fragment,
    Index, IndexKind, JoinKind, KeelError, Order, Ordered, Result, Select, ShowKind,
    Table, TableRef, UnaryOp, UnaryOpType, Update, Value, separated_by, write_escaped,
    writer::Context,
};
use std::fmt::Write;
use time::{Date, PrimitiveDateTime, Time, UtcOffset};

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}

/// Dialect printer converting statements and expressions into MySQL text.
///
/// Every method has a default implementation, a dialect tweak only overrides
/// what differs.
pub trait SqlWriter: Send + Sync {
    fn as_dyn(&self) -> &dyn SqlWriter;

    /// Quote identifiers (`name`) doubling inner backticks.
    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('`');
        for c in value.chars() {
            if c == '`' {
                out.push('`');
            }
            out.push(c);
        }
        out.push('`');
    }

    fn write_table_ref(&self, out: &mut String, value: &TableRef) {
        if let Some(db) = &value.db {
            self.write_identifier_quoted(out, db);
            out.push('.');
        }
        self.write_identifier_quoted(out, &value.name);
    }

    /// Column reference, qualified with its table when the scope asks for it.
    fn write_column_ref(&self, context: &mut Context, table: &TableRef, name: &str) {
        let qualify = context.options().qualify_columns;
        let out = context.out();
        if qualify {
            self.write_table_ref(out, table);
            out.push('.');
        }
        self.write_identifier_quoted(out, name);
    }

    fn write_placeholder(&self, out: &mut String) {
        out.push_str("%s");
    }

    /// Render a concrete value as a literal.
    fn write_value(&self, out: &mut String, value: &Value) {
        match value {
            Value::Null => out.push_str("NULL"),
            Value::Boolean(v) => out.push_str(if *v { "1" } else { "0" }),
            Value::Int(v) => write_integer!(out, *v),
            Value::UInt(v) => write_integer!(out, *v),
            Value::Float(v) => {
                if v.is_finite() {
                    let mut buffer = ryu::Buffer::new();
                    out.push_str(buffer.format(*v));
                } else {
                    log::error!("MySQL cannot represent the float value {}", v);
                    out.push_str("NULL");
                }
            }
            Value::Decimal(v) => {
                let _ = write!(out, "{}", v);
            }
            Value::Text(v) => self.write_value_string(out, v),
            Value::Bytes(v) => self.write_value_bytes(out, v),
            Value::Date(v) => {
                out.push('\'');
                self.write_value_date(out, v);
                out.push('\'');
            }
            Value::Time(v) => {
                out.push('\'');
                self.write_value_time(out, v);
                out.push('\'');
            }
            Value::DateTime(v) => {
                out.push('\'');
                self.write_value_datetime(out, v);
                out.push('\'');
            }
            Value::Timestamp(v) => {
                let v = v.to_offset(UtcOffset::UTC);
                out.push('\'');
                self.write_value_datetime(out, &PrimitiveDateTime::new(v.date(), v.time()));
                out.push('\'');
            }
            Value::Uuid(v) => {
                let _ = write!(out, "'{}'", v.simple());
            }
            Value::List(values) => {
                out.push('(');
                separated_by(out, values, |out, v| self.write_value(out, v), ", ");
                out.push(')');
            }
        }
    }

    fn write_value_string(&self, out: &mut String, value: &str) {
        out.push('\'');
        write_escaped(out, value);
        out.push('\'');
    }

    fn write_value_bytes(&self, out: &mut String, value: &[u8]) {
        out.push_str("X'");
        out.push_str(&hex::encode_upper(value));
        out.push('\'');
    }

    fn write_value_date(&self, out: &mut String, value: &Date) {
        let _ = write!(
            out,
            "{:04}-{:02}-{:02}",
            value.year(),
            value.month() as u8,
            value.day()
        );
    }

    fn write_value_time(&self, out: &mut String, value: &Time) {
        let _ = write!(
            out,
            "{:02}:{:02}:{:02}",
            value.hour(),
            value.minute(),
            value.second()
        );
        if value.microsecond() != 0 {
            let _ = write!(out, ".{:06}", value.microsecond());
        }
    }

    fn write_value_datetime(&self, out: &mut String, value: &PrimitiveDateTime) {
        self.write_value_date(out, &value.date());
        out.push(' ');
        self.write_value_time(out, &value.time());
    }

    fn binary_op_infix(&self, op: BinaryOpType) -> &'static str {
        match op {
            BinaryOpType::Multiplication => " * ",
            BinaryOpType::Division => " / ",
            BinaryOpType::Remainder => " % ",
            BinaryOpType::Addition => " + ",
            BinaryOpType::Subtraction => " - ",
            BinaryOpType::BitwiseAnd => " & ",
            BinaryOpType::BitwiseOr => " | ",
            BinaryOpType::BitwiseXor => " ^ ",
            BinaryOpType::Is => " IS ",
            BinaryOpType::IsNot => " IS NOT ",
            BinaryOpType::Like => " LIKE BINARY ",
            BinaryOpType::NotLike => " NOT LIKE BINARY ",
            BinaryOpType::ILike => " LIKE ",
            BinaryOpType::NotILike => " NOT LIKE ",
            BinaryOpType::Regexp => " REGEXP ",
            BinaryOpType::NotRegexp => " NOT REGEXP ",
            BinaryOpType::In => " IN ",
            BinaryOpType::NotIn => " NOT IN ",
            BinaryOpType::Equal => " = ",
            BinaryOpType::NotEqual => " != ",
            BinaryOpType::Less => " < ",
            BinaryOpType::Greater => " > ",
            BinaryOpType::LessEqual => " <= ",
            BinaryOpType::GreaterEqual => " >= ",
            BinaryOpType::And => " AND ",
            BinaryOpType::Or => " OR ",
        }
    }

    /// Always parenthesized: `(lhs op rhs)`.
    fn write_expression_binary_op(&self, context: &mut Context, value: &BinaryOp) -> Result<()> {
        let converter = value.field().cloned();
        let mut context = context.with_options(|o| {
            o.parenthesize = true;
            o.converter = converter;
        });
        value.lhs.write_query(self.as_dyn(), &mut context)?;
        context.push_str(self.binary_op_infix(value.op));
        match value.op {
            BinaryOpType::In | BinaryOpType::NotIn => {
                // A bound list is a single parameter, the executor expands it to `(?, ?)`
                let mut context = context.with_options(|o| o.nested = true);
                value.rhs.write_query(self.as_dyn(), &mut context)?;
            }
            BinaryOpType::Is | BinaryOpType::IsNot if value.rhs.is_null() => {
                context.push_str("NULL");
            }
            _ => value.rhs.write_query(self.as_dyn(), &mut context)?,
        }
        Ok(())
    }

    fn write_expression_unary_op(&self, context: &mut Context, value: &UnaryOp) -> Result<()> {
        let converter = value.arg.field().cloned();
        let mut context = context.with_options(|o| {
            o.parenthesize = true;
            o.converter = converter;
        });
        match value.op {
            UnaryOpType::Negative => {
                context.push('-');
                value.arg.write_query(self.as_dyn(), &mut context)?;
            }
            UnaryOpType::Not => {
                context.push_str("NOT ");
                value.arg.write_query(self.as_dyn(), &mut context)?;
            }
            UnaryOpType::IsNull | UnaryOpType::IsNotNull => {
                value.arg.write_query(self.as_dyn(), &mut context)?;
                context.push_str(if value.op == UnaryOpType::IsNull {
                    " IS NULL"
                } else {
                    " IS NOT NULL"
                });
            }
            UnaryOpType::Exists | UnaryOpType::NotExists => {
                context.push_str(if value.op == UnaryOpType::Exists {
                    "EXISTS "
                } else {
                    "NOT EXISTS "
                });
                let mut context = context.with_options(|o| o.nested = true);
                value.arg.write_query(self.as_dyn(), &mut context)?;
            }
        }
        Ok(())
    }

    fn write_expression_between(&self, context: &mut Context, value: &Between) -> Result<()> {
        let converter = value.operand.field().cloned();
        let mut context = context.with_options(|o| {
            o.parenthesize = true;
            o.converter = converter;
        });
        value.operand.write_query(self.as_dyn(), &mut context)?;
        context.push_str(if value.negated {
            " NOT BETWEEN "
        } else {
            " BETWEEN "
        });
        value.low.write_query(self.as_dyn(), &mut context)?;
        context.push_str(" AND ");
        value.high.write_query(self.as_dyn(), &mut context)
    }

    fn write_expression_ordered(&self, context: &mut Context, value: &Ordered) -> Result<()> {
        value.expression.write_query(self.as_dyn(), context)?;
        context.push_str(match value.order {
            Order::ASC => " ASC",
            Order::DESC => " DESC",
        });
        Ok(())
    }

    fn write_expression_call(&self, context: &mut Context, value: &Call) -> Result<()> {
        context.push_str(&value.function);
        context.push('(');
        if value.distinct {
            context.push_str("DISTINCT ");
        }
        let mut context = context.with_options(|o| o.converter = None);
        for (i, arg) in value.args.iter().enumerate() {
            if i > 0 {
                context.push_str(", ");
            }
            arg.write_query(self.as_dyn(), &mut context)?;
        }
        context.push(')');
        Ok(())
    }

    fn write_column_type(&self, out: &mut String, field: &Field) {
        match &field.kind {
            FieldKind::Integer { size, length } => {
                out.push_str(match size {
                    crate::IntegerSize::Tiny => "tinyint",
                    crate::IntegerSize::Small => "smallint",
                    crate::IntegerSize::Medium => "mediumint",
                    crate::IntegerSize::Int => "int",
                    crate::IntegerSize::Big => "bigint",
                });
                let length = length.unwrap_or_else(|| size.default_length(field.unsigned));
                let _ = write!(out, "({})", length);
            }
            FieldKind::Boolean => out.push_str("tinyint(1)"),
            FieldKind::Float { double, precision } => {
                out.push_str(if *double { "double" } else { "float" });
                if let Some((digits, decimals)) = precision {
                    let _ = write!(out, "({},{})", digits, decimals);
                }
            }
            FieldKind::Decimal {
                precision, scale, ..
            } => {
                let _ = write!(out, "decimal({},{})", precision, scale);
            }
            FieldKind::Char { length } => {
                let _ = write!(out, "char({})", length);
            }
            FieldKind::Varchar { length } => {
                let _ = write!(out, "varchar({})", length);
            }
            FieldKind::Text => out.push_str("text"),
            FieldKind::Date { .. } => out.push_str("date"),
            FieldKind::Time { .. } => out.push_str("time"),
            FieldKind::DateTime { .. } => out.push_str("datetime"),
            FieldKind::Timestamp { .. } => out.push_str("int(10)"),
            FieldKind::Uuid => out.push_str("varchar(40)"),
        }
    }

    /// Column definition inside `CREATE TABLE`.
    fn write_column_def(&self, out: &mut String, field: &Field) -> Result<()> {
        if field.name.is_empty() {
            return Err(KeelError::Usage(
                "Cannot render a field that is not bound to a column name".into(),
            )
            .into());
        }
        self.write_identifier_quoted(out, &field.name);
        out.push(' ');
        self.write_column_type(out, field);
        if field.unsigned {
            out.push_str(" unsigned");
        }
        if field.zerofill {
            out.push_str(" zerofill");
        }
        if let Some(charset) = &field.charset {
            let _ = write!(out, " CHARACTER SET {}", charset);
        }
        if !field.nullable {
            out.push_str(" NOT NULL");
        }
        if field.auto_increment {
            out.push_str(" AUTO_INCREMENT");
        }
        match &field.default {
            FieldDefault::Value(v) => {
                out.push_str(" DEFAULT ");
                out.push_str(&field.to_display_string(v));
            }
            FieldDefault::Raw(v) => {
                out.push_str(" DEFAULT ");
                out.push_str(v);
            }
            FieldDefault::None | FieldDefault::Generator(..) => {
                if field.nullable {
                    out.push_str(" DEFAULT NULL");
                } else if let Some(v) = field.implicit_default() {
                    out.push_str(" DEFAULT ");
                    out.push_str(v);
                }
            }
        }
        if !field.comment.is_empty() {
            out.push_str(" COMMENT ");
            self.write_value_string(out, &field.comment);
        }
        Ok(())
    }

    fn write_index_def(&self, out: &mut String, index: &Index) {
        if index.kind == IndexKind::Unique {
            out.push_str("UNIQUE ");
        }
        out.push_str("KEY ");
        self.write_identifier_quoted(out, &index.name);
        out.push_str(" (");
        separated_by(
            out,
            &index.columns,
            |out, v| self.write_identifier_quoted(out, v),
            ", ",
        );
        out.push(')');
        if !index.comment.is_empty() {
            out.push_str(" COMMENT ");
            self.write_value_string(out, &index.comment);
        }
    }

    fn write_create_table(
        &self,
        context: &mut Context,
        table: &Table,
        safe: bool,
        temporary: bool,
    ) -> Result<()> {
        let mut context = context.switch_fragment(Fragment::SqlCreateTable);
        let out = context.out();
        out.push_str("CREATE ");
        if temporary {
            out.push_str("TEMPORARY ");
        }
        out.push_str("TABLE ");
        if safe {
            out.push_str("IF NOT EXISTS ");
        }
        self.write_table_ref(out, table.table_ref());
        out.push_str(" (");
        for (i, (_, field)) in table.fields().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_column_def(out, field)?;
        }
        let primary_key = table.primary_key();
        out.push_str(", PRIMARY KEY (");
        self.write_identifier_quoted(out, primary_key.field.column_name());
        out.push(')');
        for index in table.indexes() {
            out.push_str(", ");
            self.write_index_def(out, index);
        }
        out.push_str(") ENGINE=");
        out.push_str(table.engine());
        if primary_key.auto_increment {
            let _ = write!(out, " AUTO_INCREMENT={}", primary_key.seed);
        }
        out.push_str(" DEFAULT CHARSET=");
        out.push_str(table.charset());
        out.push_str(" COMMENT=");
        self.write_value_string(out, table.comment());
        Ok(())
    }

    fn write_drop_table(
        &self,
        context: &mut Context,
        table: &TableRef,
        safe: bool,
        temporary: bool,
    ) {
        let mut context = context.switch_fragment(Fragment::SqlDropTable);
        let out = context.out();
        out.push_str("DROP ");
        if temporary {
            out.push_str("TEMPORARY ");
        }
        out.push_str("TABLE ");
        if safe {
            out.push_str("IF EXISTS ");
        }
        self.write_table_ref(out, table);
    }

    fn write_show(&self, context: &mut Context, table: &TableRef, kind: ShowKind) {
        let mut context = context.switch_fragment(Fragment::SqlShow);
        let out = context.out();
        out.push_str(match kind {
            ShowKind::CreateTable => "SHOW CREATE TABLE ",
            ShowKind::Columns => "SHOW FULL COLUMNS FROM ",
            ShowKind::Indexes => "SHOW INDEX FROM ",
        });
        self.write_table_ref(out, table);
    }

    /// `SELECT` without the trailing semicolon, so that it can be embedded as a
    /// subquery. `projection`, `limit` and `offset` override the ones of the
    /// builder.
    fn write_select(
        &self,
        context: &mut Context,
        select: &Select,
        projection: Option<&dyn Expression>,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<()> {
        let mut context = context.with_options(|o| {
            o.fragment = Fragment::SqlSelect;
            o.qualify_columns |= !select.joins.is_empty();
            o.bind = true;
            o.nested = false;
            o.converter = None;
        });
        context.push_str("SELECT ");
        if select.distinct {
            context.push_str("DISTINCT ");
        }
        match projection {
            Some(projection) => projection.write_query(self.as_dyn(), &mut context)?,
            None if select.columns.is_empty() => {
                for (i, column) in select.table.columns().enumerate() {
                    if i > 0 {
                        context.push_str(", ");
                    }
                    column.write_query(self.as_dyn(), &mut context)?;
                }
            }
            None => {
                for (i, column) in select.columns.iter().enumerate() {
                    if i > 0 {
                        context.push_str(", ");
                    }
                    column.write_query(self.as_dyn(), &mut context)?;
                }
            }
        }
        {
            let mut context = context.switch_fragment(Fragment::SqlSelectFrom);
            context.push_str(" FROM ");
            self.write_table_ref(context.out(), select.table.table_ref());
        }
        for join in &select.joins {
            let mut context = context.switch_fragment(Fragment::SqlJoin);
            context.push_str(match join.kind {
                JoinKind::Inner => " JOIN ",
                JoinKind::Left => " LEFT JOIN ",
            });
            self.write_table_ref(context.out(), join.table.table_ref());
            context.push_str(" ON ");
            join.on.write_query(self.as_dyn(), &mut context)?;
        }
        if let Some(filter) = &select.filter {
            let mut context = context.switch_fragment(Fragment::SqlSelectWhere);
            context.push_str(" WHERE ");
            filter.write_query(self.as_dyn(), &mut context)?;
        }
        if !select.group_by.is_empty() {
            let mut context = context.switch_fragment(Fragment::SqlSelectGroupBy);
            context.push_str(" GROUP BY ");
            for (i, column) in select.group_by.iter().enumerate() {
                if i > 0 {
                    context.push_str(", ");
                }
                column.write_query(self.as_dyn(), &mut context)?;
            }
        }
        if let Some(having) = &select.having {
            let mut context = context.switch_fragment(Fragment::SqlSelectHaving);
            context.push_str(" HAVING ");
            having.write_query(self.as_dyn(), &mut context)?;
        }
        if !select.order_by.is_empty() && projection.is_none() {
            let mut context = context.switch_fragment(Fragment::SqlSelectOrderBy);
            context.push_str(" ORDER BY ");
            for (i, column) in select.order_by.iter().enumerate() {
                if i > 0 {
                    context.push_str(", ");
                }
                column.write_query(self.as_dyn(), &mut context)?;
            }
        }
        if let Some(limit) = limit {
            let out = context.out();
            out.push_str(" LIMIT ");
            write_integer!(out, limit);
            if let Some(offset) = offset {
                out.push_str(" OFFSET ");
                write_integer!(out, offset);
            }
        }
        Ok(())
    }

    /// `INSERT` (or `REPLACE`). With `row` the values are bound, otherwise only
    /// the placeholders are written and the caller supplies the batch.
    fn write_insert(
        &self,
        context: &mut Context,
        table: &TableRef,
        columns: &[&Field],
        row: Option<&[Value]>,
        replace: bool,
    ) -> Result<()> {
        let mut context = context.switch_fragment(Fragment::SqlInsertInto);
        {
            let out = context.out();
            out.push_str(if replace { "REPLACE INTO " } else { "INSERT INTO " });
            self.write_table_ref(out, table);
            out.push_str(" (");
            separated_by(
                out,
                columns,
                |out, v| self.write_identifier_quoted(out, v.column_name()),
                ", ",
            );
            out.push_str(") VALUES (");
        }
        let mut context = context.switch_fragment(Fragment::SqlInsertIntoValues);
        match row {
            Some(row) => {
                for (i, value) in row.iter().enumerate() {
                    if i > 0 {
                        context.push_str(", ");
                    }
                    let mut context = context.with_options(|o| o.nested = true);
                    context.push_value(self.as_dyn(), value.clone())?;
                }
            }
            None => {
                for i in 0..columns.len() {
                    if i > 0 {
                        context.push_str(", ");
                    }
                    self.write_placeholder(context.out());
                }
            }
        }
        context.push(')');
        Ok(())
    }

    fn write_update(&self, context: &mut Context, update: &Update) -> Result<()> {
        let mut context = context.switch_fragment(Fragment::SqlUpdateSet);
        context.push_str("UPDATE ");
        self.write_table_ref(context.out(), update.table.table_ref());
        context.push_str(" SET ");
        for (i, (field, value)) in update.values.iter().enumerate() {
            if i > 0 {
                context.push_str(", ");
            }
            self.write_identifier_quoted(context.out(), field.column_name());
            context.push('=');
            let converter = Some(field.clone());
            let mut context = context.with_options(|o| o.converter = converter);
            value.write_query(self.as_dyn(), &mut context)?;
        }
        if let Some(filter) = &update.filter {
            let mut context = context.switch_fragment(Fragment::SqlUpdateWhere);
            context.push_str(" WHERE ");
            filter.write_query(self.as_dyn(), &mut context)?;
        }
        Ok(())
    }

    fn write_delete(
        &self,
        context: &mut Context,
        table: &TableRef,
        filter: Option<&dyn Expression>,
        limit: Option<u64>,
    ) -> Result<()> {
        let mut context = context.switch_fragment(Fragment::SqlDeleteFrom);
        context.push_str("DELETE FROM ");
        self.write_table_ref(context.out(), table);
        if let Some(filter) = filter {
            let mut context = context.switch_fragment(Fragment::SqlDeleteFromWhere);
            context.push_str(" WHERE ");
            filter.write_query(self.as_dyn(), &mut context)?;
        }
        if let Some(limit) = limit {
            let out = context.out();
            out.push_str(" LIMIT ");
            write_integer!(out, limit);
        }
        Ok(())
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct MySqlWriter;

impl MySqlWriter {
    pub fn new() -> Self {
        Self
    }
}

impl SqlWriter for MySqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }
}
