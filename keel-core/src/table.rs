use crate::{Column, Field, FieldDefault, FieldKind, Index, KeelError, Result};
use indexmap::IndexMap;
use std::{collections::HashMap, sync::Arc};

pub const DEFAULT_ENGINE: &str = "InnoDB";
pub const DEFAULT_CHARSET: &str = "utf8mb4";

/// Optionally database qualified table name.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub db: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct PrimaryKey {
    pub field: Arc<Field>,
    pub attribute: String,
    pub auto_increment: bool,
    /// First value of the auto-increment sequence.
    pub seed: u64,
}

/// Compiled table declaration.
///
/// Produced by [`TableBuilder::build`], which validates the declaration. A
/// `Table` exposes no way to alter its schema: compiled tables are shared
/// behind an `Arc` and stay as built.
#[derive(Debug)]
pub struct Table {
    table_ref: TableRef,
    fields: IndexMap<String, Arc<Field>>,
    columns: HashMap<String, String>,
    primary_key: PrimaryKey,
    indexes: Vec<Index>,
    engine: String,
    charset: String,
    comment: String,
}

impl Table {
    pub fn builder(class_name: impl Into<String>) -> TableBuilder {
        TableBuilder::new(class_name)
    }
    pub fn name(&self) -> &str {
        &self.table_ref.name
    }
    pub fn db(&self) -> Option<&str> {
        self.table_ref.db.as_deref()
    }
    pub fn table_ref(&self) -> &TableRef {
        &self.table_ref
    }
    /// Fields in declaration order, keyed by attribute name.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Arc<Field>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
    pub fn field(&self, attribute: &str) -> Result<&Arc<Field>> {
        self.fields
            .get(attribute)
            .ok_or_else(|| KeelError::unknown_column(self.name(), attribute).into())
    }
    pub fn has_field(&self, attribute: &str) -> bool {
        self.fields.contains_key(attribute)
    }
    /// Attribute bound to a column name.
    pub fn attribute_of(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(String::as_str)
    }
    pub fn column(&self, attribute: &str) -> Result<Column> {
        let (attribute, field) = self
            .fields
            .get_key_value(attribute)
            .ok_or_else(|| KeelError::unknown_column(self.name(), attribute))?;
        Ok(Column {
            table: self.table_ref.clone(),
            attribute: attribute.as_str().into(),
            field: field.clone(),
        })
    }
    pub fn columns(&self) -> impl Iterator<Item = Column> + '_ {
        self.fields.iter().map(|(attribute, field)| Column {
            table: self.table_ref.clone(),
            attribute: attribute.as_str().into(),
            field: field.clone(),
        })
    }
    pub fn primary_key(&self) -> &PrimaryKey {
        &self.primary_key
    }
    pub fn primary_key_column(&self) -> Column {
        Column {
            table: self.table_ref.clone(),
            attribute: self.primary_key.attribute.as_str().into(),
            field: self.primary_key.field.clone(),
        }
    }
    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }
    pub fn engine(&self) -> &str {
        &self.engine
    }
    pub fn charset(&self) -> &str {
        &self.charset
    }
    pub fn comment(&self) -> &str {
        &self.comment
    }
}

/// Declarative description of a table, compiled by [`TableBuilder::build`].
///
/// ```rust
/// use keel_core::{Field, Index, Table};
/// let table = Table::builder("User")
///     .name("user")
///     .field("id", Field::auto())
///     .field("name", Field::varchar(45).nullable())
///     .index(Index::key("idx_name", "name"))
///     .build()
///     .unwrap();
/// assert_eq!(table.primary_key().attribute, "id");
/// ```
#[derive(Debug, Clone)]
pub struct TableBuilder {
    class_name: String,
    name: Option<String>,
    db: Option<String>,
    base: Option<Arc<Table>>,
    fields: Vec<(String, Field)>,
    indexes: Vec<Index>,
    engine: Option<String>,
    charset: Option<String>,
    comment: Option<String>,
    auto_increment: Option<u64>,
}

impl TableBuilder {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            name: None,
            db: None,
            base: None,
            fields: Vec::new(),
            indexes: Vec::new(),
            engine: None,
            charset: None,
            comment: None,
            auto_increment: None,
        }
    }
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
    pub fn db(mut self, db: impl Into<String>) -> Self {
        self.db = Some(db.into());
        self
    }
    /// Inherit fields, indexes and table options from `base`. Declarations of
    /// this builder take precedence.
    pub fn extends(mut self, base: &Arc<Table>) -> Self {
        self.base = Some(base.clone());
        self
    }
    pub fn field(mut self, attribute: impl Into<String>, field: Field) -> Self {
        self.fields.push((attribute.into(), field));
        self
    }
    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }
    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
    /// Seed of the auto-increment sequence.
    pub fn auto_increment(mut self, seed: u64) -> Self {
        self.auto_increment = Some(seed);
        self
    }

    pub fn build(self) -> Result<Table> {
        let base = self.base.as_deref();
        let name = match self.name {
            Some(name) => name,
            None => {
                let name = self.class_name.to_lowercase();
                log::warn!(
                    "Table name not declared for `{}`, using `{}`",
                    self.class_name,
                    name
                );
                name
            }
        };
        let db = self.db.or_else(|| base.and_then(|b| b.table_ref.db.clone()));

        let mut fields: IndexMap<String, Arc<Field>> = base
            .map(|b| b.fields.clone())
            .unwrap_or_default();
        let mut declared = Vec::with_capacity(self.fields.len());
        for (attribute, mut field) in self.fields {
            if declared.contains(&attribute) {
                return Err(KeelError::DuplicateField {
                    table: name,
                    name: attribute,
                }
                .into());
            }
            if field.name.is_empty() {
                field.name = attribute.clone();
            }
            check_field(&name, &field)?;
            declared.push(attribute.clone());
            fields.insert(attribute, Arc::new(field));
        }

        let mut columns = HashMap::with_capacity(fields.len());
        let mut primary_key: Option<(&String, &Arc<Field>)> = None;
        for (attribute, field) in &fields {
            if columns
                .insert(field.name.clone(), attribute.clone())
                .is_some()
            {
                return Err(KeelError::DuplicateField {
                    table: name,
                    name: field.name.clone(),
                }
                .into());
            }
            if field.primary_key {
                if let Some((first, _)) = primary_key {
                    return Err(KeelError::DuplicatePrimaryKey {
                        table: name,
                        first: first.clone(),
                        second: attribute.clone(),
                    }
                    .into());
                }
                primary_key = Some((attribute, field));
            }
        }
        let Some((pk_attribute, pk_field)) = primary_key else {
            return Err(KeelError::MissingPrimaryKey { table: name }.into());
        };
        if pk_field.auto_increment && pk_field.name != "id" {
            log::warn!(
                "Auto-increment primary key of `{}` is named `{}` instead of `id`",
                name,
                pk_field.name
            );
        }
        let seed = self
            .auto_increment
            .or_else(|| base.map(|b| b.primary_key.seed))
            .unwrap_or(1);
        let primary_key = PrimaryKey {
            field: pk_field.clone(),
            attribute: pk_attribute.clone(),
            auto_increment: pk_field.auto_increment,
            seed,
        };

        let mut indexes: Vec<Index> = base.map(|b| b.indexes.clone()).unwrap_or_default();
        for mut index in self.indexes {
            if index.columns.is_empty() {
                return Err(KeelError::schema(
                    &name,
                    format!("index `{}` does not list any column", index.name),
                )
                .into());
            }
            for column in index.columns.iter_mut() {
                let field = fields
                    .get(column.as_str())
                    .or_else(|| columns.get(column.as_str()).and_then(|a| fields.get(a)));
                let Some(field) = field else {
                    return Err(KeelError::schema(
                        &name,
                        format!("index `{}` refers to unknown column `{}`", index.name, column),
                    )
                    .into());
                };
                if matches!(field.kind, FieldKind::Text) {
                    return Err(KeelError::schema(
                        &name,
                        format!(
                            "column `{}` of type text cannot be part of index `{}`",
                            field.name, index.name
                        ),
                    )
                    .into());
                }
                *column = field.name.clone();
            }
            indexes.retain(|v| v.name != index.name);
            indexes.push(index);
        }

        Ok(Table {
            table_ref: TableRef { db, name },
            fields,
            columns,
            primary_key,
            indexes,
            engine: self
                .engine
                .or_else(|| base.map(|b| b.engine.clone()))
                .unwrap_or_else(|| DEFAULT_ENGINE.into()),
            charset: self
                .charset
                .or_else(|| base.map(|b| b.charset.clone()))
                .unwrap_or_else(|| DEFAULT_CHARSET.into()),
            comment: self
                .comment
                .or_else(|| base.map(|b| b.comment.clone()))
                .unwrap_or_default(),
        })
    }
}

fn check_field(table: &str, field: &Field) -> Result<()> {
    if field.auto_increment {
        if !field.primary_key {
            return Err(KeelError::schema(
                table,
                format!("auto-increment column `{}` must be the primary key", field.name),
            )
            .into());
        }
        if !field.kind.is_integer() {
            return Err(KeelError::schema(
                table,
                format!("auto-increment column `{}` must be an integer", field.name),
            )
            .into());
        }
        if !matches!(field.default, FieldDefault::None) {
            return Err(KeelError::schema(
                table,
                format!("auto-increment column `{}` cannot have a default", field.name),
            )
            .into());
        }
    }
    if let FieldDefault::Value(value) = &field.default {
        field.to_wire(value.clone()).map_err(|e| {
            KeelError::schema(table, format!("invalid default of `{}`: {:#}", field.name, e))
        })?;
    }
    if !field.nullable
        && !field.primary_key
        && matches!(field.default, FieldDefault::None)
        && field.implicit_default().is_none()
    {
        log::warn!(
            "Column `{}`.`{}` is NOT NULL without a default",
            table,
            field.name
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, error_kind};

    #[test]
    fn inheritance_overrides_fields() {
        let base = Arc::new(
            Table::builder("Base")
                .name("base")
                .field("id", Field::auto())
                .field("created", Field::timestamp().default_now())
                .comment("base table")
                .build()
                .unwrap(),
        );
        let child = Table::builder("Child")
            .extends(&base)
            .field("created", Field::datetime().nullable())
            .field("label", Field::varchar(20).default("x"))
            .build()
            .unwrap();
        assert_eq!(child.name(), "child");
        assert_eq!(child.comment(), "base table");
        let attributes: Vec<_> = child.fields().map(|(a, _)| a).collect();
        assert_eq!(attributes, ["id", "created", "label"]);
        assert!(matches!(
            child.field("created").unwrap().kind(),
            FieldKind::DateTime { .. }
        ));
        assert_eq!(child.primary_key().attribute, "id");
    }

    #[test]
    fn auto_increment_must_be_integer_primary_key() {
        let error = Table::builder("T")
            .name("t")
            .field("id", Field::varchar(10).primary_key().auto_increment())
            .build()
            .unwrap_err();
        assert_eq!(error_kind(&error), Some(ErrorKind::Schema));

        let error = Table::builder("T")
            .name("t")
            .field("id", Field::int().primary_key())
            .field("seq", Field::int().auto_increment())
            .build()
            .unwrap_err();
        assert_eq!(error_kind(&error), Some(ErrorKind::Schema));
    }

    #[test]
    fn column_names_are_unique() {
        let error = Table::builder("T")
            .name("t")
            .field("id", Field::auto())
            .field("a", Field::int().name("value"))
            .field("b", Field::int().name("value"))
            .build()
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<KeelError>(),
            Some(KeelError::DuplicateField { name, .. }) if name == "value"
        ));
    }

    #[test]
    fn index_columns_resolve_to_column_names() {
        let table = Table::builder("T")
            .name("t")
            .field("id", Field::auto())
            .field("title", Field::varchar(10).name("book_title"))
            .index(Index::key("idx_title", "title"))
            .build()
            .unwrap();
        assert_eq!(table.indexes()[0].columns(), &["book_title".to_string()]);

        let error = Table::builder("T")
            .name("t")
            .field("id", Field::auto())
            .field("body", Field::text())
            .index(Index::key("idx_body", "body"))
            .build()
            .unwrap_err();
        assert_eq!(error_kind(&error), Some(ErrorKind::Schema));
    }
}
