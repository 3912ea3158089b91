mod options;
mod placeholder;
mod pool;
mod row_wrap;
mod value_wrap;

pub use options::*;
pub use pool::*;
pub(crate) use row_wrap::*;
pub(crate) use value_wrap::*;
