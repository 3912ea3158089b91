use crate::{MySqlWriter, SqlWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Key,
    Unique,
}

/// Secondary index declared next to the fields of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub(crate) name: String,
    pub(crate) columns: Vec<String>,
    pub(crate) comment: String,
    pub(crate) kind: IndexKind,
}

impl Index {
    pub fn key(name: impl Into<String>, columns: impl IndexColumns) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_columns(),
            comment: String::new(),
            kind: IndexKind::Key,
        }
    }
    pub fn unique(name: impl Into<String>, columns: impl IndexColumns) -> Self {
        Self {
            kind: IndexKind::Unique,
            ..Self::key(name, columns)
        }
    }
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
    pub fn kind(&self) -> IndexKind {
        self.kind
    }
    pub fn get_comment(&self) -> &str {
        &self.comment
    }
    pub fn render_ddl(&self) -> String {
        let mut out = String::new();
        MySqlWriter.write_index_def(&mut out, self);
        out
    }
}

/// Column list of an index. A single name stands for a one element list.
pub trait IndexColumns {
    fn into_columns(self) -> Vec<String>;
}

impl IndexColumns for &str {
    fn into_columns(self) -> Vec<String> {
        vec![self.into()]
    }
}

impl IndexColumns for String {
    fn into_columns(self) -> Vec<String> {
        vec![self]
    }
}

impl<const N: usize> IndexColumns for [&str; N] {
    fn into_columns(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

impl IndexColumns for &[&str] {
    fn into_columns(self) -> Vec<String> {
        self.iter().map(|v| (*v).into()).collect()
    }
}

impl IndexColumns for Vec<String> {
    fn into_columns(self) -> Vec<String> {
        self
    }
}

impl IndexColumns for Vec<&str> {
    fn into_columns(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_column_is_wrapped() {
        let index = Index::key("idx_name", "name");
        assert_eq!(index.columns(), &["name".to_string()]);
        assert_eq!(index.render_ddl(), "KEY `idx_name` (`name`)");
    }

    #[test]
    fn unique_with_comment() {
        let index = Index::unique("uq_pair", ["a", "b"]).comment("pair");
        assert_eq!(
            index.render_ddl(),
            "UNIQUE KEY `uq_pair` (`a`, `b`) COMMENT 'pair'"
        );
    }
}
