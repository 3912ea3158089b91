/// Classification of a [`KeelError`], for callers that only care about the family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Raised while compiling a table declaration.
    Schema,
    /// Misuse of a builder or of a record (unknown column, forbidden write).
    Usage,
    /// A value does not fit its field.
    Data,
    /// No executor is bound, or the binding was used incorrectly.
    Binding,
}

/// Errors raised by keel itself. They travel inside [`crate::Error`] and can be
/// recovered with `error.downcast_ref::<KeelError>()`.
#[derive(Debug, thiserror::Error)]
pub enum KeelError {
    #[error("Table `{table}` declares more than one primary key (`{first}` and `{second}`)")]
    DuplicatePrimaryKey {
        table: String,
        first: String,
        second: String,
    },
    #[error("Table `{table}` does not declare a primary key")]
    MissingPrimaryKey { table: String },
    #[error("Table `{table}` declares `{name}` more than once")]
    DuplicateField { table: String, name: String },
    #[error("Invalid declaration for table `{table}`: {message}")]
    Schema { table: String, message: String },
    #[error("Column `{column}` does not exist in table `{table}`")]
    UnknownColumn { table: String, column: String },
    #[error("{0} is not allowed")]
    NotAllowed(String),
    #[error("Dangerous operation: {0}")]
    Dangerous(String),
    #[error("{0}")]
    Usage(String),
    #[error("Invalid operand type: {0}")]
    OperandType(String),
    #[error("Invalid value for column `{column}`: {message}")]
    Data { column: String, message: String },
    #[error("{0}")]
    Binding(String),
}

impl KeelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            KeelError::DuplicatePrimaryKey { .. }
            | KeelError::MissingPrimaryKey { .. }
            | KeelError::DuplicateField { .. }
            | KeelError::Schema { .. } => ErrorKind::Schema,
            KeelError::UnknownColumn { .. }
            | KeelError::NotAllowed(..)
            | KeelError::Dangerous(..)
            | KeelError::Usage(..) => ErrorKind::Usage,
            KeelError::Data { .. } | KeelError::OperandType(..) => ErrorKind::Data,
            KeelError::Binding(..) => ErrorKind::Binding,
        }
    }

    pub(crate) fn schema(table: &str, message: impl Into<String>) -> Self {
        KeelError::Schema {
            table: table.into(),
            message: message.into(),
        }
    }

    pub(crate) fn data(column: &str, message: impl Into<String>) -> Self {
        KeelError::Data {
            column: column.into(),
            message: message.into(),
        }
    }

    pub(crate) fn unknown_column(table: &str, column: &str) -> Self {
        KeelError::UnknownColumn {
            table: table.into(),
            column: column.into(),
        }
    }
}

/// Family of the keel error carried by `error`, if any.
pub fn error_kind(error: &crate::Error) -> Option<ErrorKind> {
    error.downcast_ref::<KeelError>().map(KeelError::kind)
}
