mod as_value;
mod column;
mod connector;
mod error;
mod executor;
mod expression;
mod field;
mod index;
mod loader;
mod mock;
mod model;
mod query;
mod record;
mod table;
mod util;
mod value;
pub mod writer;

pub use ::anyhow::Context as ErrorContext;
pub use ::indexmap;
pub use as_value::*;
pub use column::*;
pub use connector::*;
pub use error::*;
pub use executor::*;
pub use expression::*;
pub use field::*;
pub use index::*;
pub use loader::*;
pub use mock::*;
pub use model::*;
pub use query::*;
pub use record::*;
pub use table::*;
pub use util::*;
pub use value::*;
pub use writer::{Context, Fragment, MySqlWriter, SqlWriter};
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
