mod ddl;
mod delete;
mod insert;
mod select;
mod update;

pub use ddl::*;
pub use delete::*;
pub use insert::*;
pub use select::*;
pub use update::*;
