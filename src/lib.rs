//! Declarative MySQL data layer.
//!
//! Tables are declared once, as Rust structs deriving [`Model`], and queried
//! through composable statement builders that render parameterized SQL.
//!
//! ```rust,ignore
//! use keel::{ExpressionExt, Model};
//!
//! #[derive(Model)]
//! #[keel(name = "user")]
//! struct User {
//!     #[keel(auto)]
//!     id: i64,
//!     #[keel(varchar = 45)]
//!     name: String,
//! }
//!
//! let adults = User::select()
//!     .filter(User::name().startswith("A"))
//!     .all_as::<User>(&pool)
//!     .await?;
//! ```
pub use keel_core::*;
pub use keel_macros::Model;
