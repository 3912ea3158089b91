mod binary_op;
mod call;
mod expression;
mod operand;
mod ops;
mod ordered;
mod raw;
mod unary_op;

pub use binary_op::*;
pub use call::*;
pub use expression::*;
pub use operand::*;
pub use ops::*;
pub use ordered::*;
pub use raw::*;
pub use unary_op::*;
