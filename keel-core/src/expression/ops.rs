use crate::{
    Aliased, Between, BinaryOp, BinaryOpType, Expression, KeelError, Operand, Order, Ordered,
    Result, UnaryOp, UnaryOpType, escape_like,
};
use std::borrow::Cow;

/// Operator vocabulary shared by every expression node.
///
/// Each method consumes the receiver and returns a new node, so conditions
/// compose left to right:
///
/// ```rust,ignore
/// User::age().greater(18).and(User::name().startswith("A"))
/// ```
pub trait ExpressionExt: Expression + Sized + 'static {
    fn boxed(self) -> Box<dyn Expression> {
        Box::new(self)
    }

    /// `=`, or `IS` when the right side is null.
    fn equal(self, rhs: impl Into<Operand>) -> BinaryOp {
        let rhs = rhs.into();
        let op = if rhs.is_null() {
            BinaryOpType::Is
        } else {
            BinaryOpType::Equal
        };
        BinaryOp::new(op, wrap(self), rhs)
    }
    /// `!=`, or `IS NOT` when the right side is null.
    fn not_equal(self, rhs: impl Into<Operand>) -> BinaryOp {
        let rhs = rhs.into();
        let op = if rhs.is_null() {
            BinaryOpType::IsNot
        } else {
            BinaryOpType::NotEqual
        };
        BinaryOp::new(op, wrap(self), rhs)
    }
    fn less(self, rhs: impl Into<Operand>) -> BinaryOp {
        BinaryOp::new(BinaryOpType::Less, wrap(self), rhs)
    }
    fn less_eq(self, rhs: impl Into<Operand>) -> BinaryOp {
        BinaryOp::new(BinaryOpType::LessEqual, wrap(self), rhs)
    }
    fn greater(self, rhs: impl Into<Operand>) -> BinaryOp {
        BinaryOp::new(BinaryOpType::Greater, wrap(self), rhs)
    }
    fn greater_eq(self, rhs: impl Into<Operand>) -> BinaryOp {
        BinaryOp::new(BinaryOpType::GreaterEqual, wrap(self), rhs)
    }

    fn and(self, rhs: impl Into<Box<dyn Expression>>) -> BinaryOp {
        BinaryOp::new(BinaryOpType::And, wrap(self), rhs.into())
    }
    fn or(self, rhs: impl Into<Box<dyn Expression>>) -> BinaryOp {
        BinaryOp::new(BinaryOpType::Or, wrap(self), rhs.into())
    }
    fn not(self) -> UnaryOp {
        UnaryOp {
            op: UnaryOpType::Not,
            arg: wrap(self),
        }
    }

    fn add(self, rhs: impl Into<Operand>) -> BinaryOp {
        BinaryOp::new(BinaryOpType::Addition, wrap(self), rhs)
    }
    fn sub(self, rhs: impl Into<Operand>) -> BinaryOp {
        BinaryOp::new(BinaryOpType::Subtraction, wrap(self), rhs)
    }
    fn mul(self, rhs: impl Into<Operand>) -> BinaryOp {
        BinaryOp::new(BinaryOpType::Multiplication, wrap(self), rhs)
    }
    fn div(self, rhs: impl Into<Operand>) -> BinaryOp {
        BinaryOp::new(BinaryOpType::Division, wrap(self), rhs)
    }
    fn rem(self, rhs: impl Into<Operand>) -> BinaryOp {
        BinaryOp::new(BinaryOpType::Remainder, wrap(self), rhs)
    }
    fn neg(self) -> UnaryOp {
        UnaryOp {
            op: UnaryOpType::Negative,
            arg: wrap(self),
        }
    }
    fn bit_and(self, rhs: impl Into<Operand>) -> BinaryOp {
        BinaryOp::new(BinaryOpType::BitwiseAnd, wrap(self), rhs)
    }
    fn bit_or(self, rhs: impl Into<Operand>) -> BinaryOp {
        BinaryOp::new(BinaryOpType::BitwiseOr, wrap(self), rhs)
    }
    fn bit_xor(self, rhs: impl Into<Operand>) -> BinaryOp {
        BinaryOp::new(BinaryOpType::BitwiseXor, wrap(self), rhs)
    }

    /// `IN`. The right side must be a list or a subquery.
    fn in_(self, rhs: impl Into<Operand>) -> Result<BinaryOp> {
        membership(BinaryOpType::In, self, rhs.into())
    }
    /// `NOT IN`. The right side must be a list or a subquery.
    fn not_in(self, rhs: impl Into<Operand>) -> Result<BinaryOp> {
        membership(BinaryOpType::NotIn, self, rhs.into())
    }

    /// Case sensitive `LIKE`.
    fn like(self, pattern: impl Into<Operand>) -> BinaryOp {
        BinaryOp::new(BinaryOpType::Like, wrap(self), pattern)
    }
    fn not_like(self, pattern: impl Into<Operand>) -> BinaryOp {
        BinaryOp::new(BinaryOpType::NotLike, wrap(self), pattern)
    }
    /// Case insensitive `LIKE`.
    fn ilike(self, pattern: impl Into<Operand>) -> BinaryOp {
        BinaryOp::new(BinaryOpType::ILike, wrap(self), pattern)
    }
    fn not_ilike(self, pattern: impl Into<Operand>) -> BinaryOp {
        BinaryOp::new(BinaryOpType::NotILike, wrap(self), pattern)
    }
    fn contains(self, fragment: &str) -> BinaryOp {
        self.like(format!("%{}%", escape_like(fragment)))
    }
    fn icontains(self, fragment: &str) -> BinaryOp {
        self.ilike(format!("%{}%", escape_like(fragment)))
    }
    fn startswith(self, fragment: &str) -> BinaryOp {
        self.like(format!("{}%", escape_like(fragment)))
    }
    fn istartswith(self, fragment: &str) -> BinaryOp {
        self.ilike(format!("{}%", escape_like(fragment)))
    }
    fn endswith(self, fragment: &str) -> BinaryOp {
        self.like(format!("%{}", escape_like(fragment)))
    }
    fn iendswith(self, fragment: &str) -> BinaryOp {
        self.ilike(format!("%{}", escape_like(fragment)))
    }
    fn regexp(self, pattern: impl Into<Operand>) -> BinaryOp {
        BinaryOp::new(BinaryOpType::Regexp, wrap(self), pattern)
    }
    fn not_regexp(self, pattern: impl Into<Operand>) -> BinaryOp {
        BinaryOp::new(BinaryOpType::NotRegexp, wrap(self), pattern)
    }

    fn between(self, low: impl Into<Operand>, high: impl Into<Operand>) -> Between {
        Between {
            negated: false,
            operand: wrap(self),
            low: low.into(),
            high: high.into(),
        }
    }
    fn not_between(self, low: impl Into<Operand>, high: impl Into<Operand>) -> Between {
        Between {
            negated: true,
            ..self.between(low, high)
        }
    }

    fn is_null(self) -> UnaryOp {
        UnaryOp {
            op: UnaryOpType::IsNull,
            arg: wrap(self),
        }
    }
    fn is_not_null(self) -> UnaryOp {
        UnaryOp {
            op: UnaryOpType::IsNotNull,
            arg: wrap(self),
        }
    }

    fn asc(self) -> Ordered {
        Ordered {
            order: Order::ASC,
            expression: Box::new(self),
        }
    }
    fn desc(self) -> Ordered {
        Ordered {
            order: Order::DESC,
            expression: Box::new(self),
        }
    }

    fn alias(self, alias: impl Into<Cow<'static, str>>) -> Aliased {
        Aliased {
            expression: Box::new(self),
            alias: alias.into(),
        }
    }
}

impl<E: Expression + 'static> ExpressionExt for E {}

fn wrap(expression: impl Expression + 'static) -> Operand {
    Operand::Expression(Box::new(expression))
}

fn require_sequence(operator: &str, operand: &Operand) -> Result<()> {
    if operand.is_sequence() {
        return Ok(());
    }
    let found = match operand {
        Operand::Value(v) => v.kind_name(),
        Operand::Expression(..) => "scalar expression",
        Operand::Raw(..) => "raw sql",
    };
    Err(KeelError::OperandType(format!(
        "the right side of `{operator}` must be a list or a subquery, found {found}"
    ))
    .into())
}

fn membership(op: BinaryOpType, lhs: impl Expression + 'static, rhs: Operand) -> Result<BinaryOp> {
    require_sequence(if op == BinaryOpType::In { "IN" } else { "NOT IN" }, &rhs)?;
    Ok(BinaryOp::new(op, wrap(lhs), rhs))
}

fn reduce<I>(op: BinaryOpType, items: I) -> Result<Box<dyn Expression>>
where
    I: IntoIterator,
    I::Item: Into<Box<dyn Expression>>,
{
    let mut items = items.into_iter().map(Into::into);
    let Some(first) = items.next() else {
        return Err(KeelError::Usage(format!(
            "Cannot combine an empty list of conditions with {}",
            if op == BinaryOpType::And { "AND" } else { "OR" }
        ))
        .into());
    };
    Ok(items.fold(first, |acc, item| {
        Box::new(BinaryOp::new(op, acc, item)) as Box<dyn Expression>
    }))
}

/// Joins the conditions with `AND`, left to right.
pub fn and_<I>(conditions: I) -> Result<Box<dyn Expression>>
where
    I: IntoIterator,
    I::Item: Into<Box<dyn Expression>>,
{
    reduce(BinaryOpType::And, conditions)
}

/// Joins the conditions with `OR`, left to right.
pub fn or_<I>(conditions: I) -> Result<Box<dyn Expression>>
where
    I: IntoIterator,
    I::Item: Into<Box<dyn Expression>>,
{
    reduce(BinaryOpType::Or, conditions)
}

/// `EXISTS`. The operand must be a list or a subquery.
pub fn exists(operand: impl Into<Operand>) -> Result<UnaryOp> {
    let arg = operand.into();
    require_sequence("EXISTS", &arg)?;
    Ok(UnaryOp {
        op: UnaryOpType::Exists,
        arg,
    })
}

/// `NOT EXISTS`. The operand must be a list or a subquery.
pub fn not_exists(operand: impl Into<Operand>) -> Result<UnaryOp> {
    let arg = operand.into();
    require_sequence("NOT EXISTS", &arg)?;
    Ok(UnaryOp {
        op: UnaryOpType::NotExists,
        arg,
    })
}
