use keel_core::{Error, Result, Value};

/// Rewrites the `%s` placeholders of a rendered statement to `?`.
///
/// A list parameter expands to `(?, ?, ...)` and contributes one bound value
/// per element, an empty one becomes `(NULL)`. `%%` is a literal percent sign.
pub(crate) fn translate(sql: &str, params: Vec<Value>) -> Result<(String, Vec<Value>)> {
    let mut out = String::with_capacity(sql.len() + params.len() * 2);
    let mut bound = Vec::with_capacity(params.len());
    let mut params = params.into_iter();
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('%') => {
                chars.next();
                out.push('%');
            }
            Some('s') => {
                chars.next();
                let Some(value) = params.next() else {
                    return Err(Error::msg(format!(
                        "The statement has more placeholders than the {} parameters provided",
                        bound.len()
                    )));
                };
                match value {
                    Value::List(values) if values.is_empty() => out.push_str("(NULL)"),
                    Value::List(values) => {
                        out.push('(');
                        for (i, value) in values.into_iter().enumerate() {
                            if i > 0 {
                                out.push_str(", ");
                            }
                            out.push('?');
                            bound.push(value);
                        }
                        out.push(')');
                    }
                    value => {
                        out.push('?');
                        bound.push(value);
                    }
                }
            }
            _ => out.push('%'),
        }
    }
    let left = params.count();
    if left > 0 {
        return Err(Error::msg(format!(
            "{left} parameters were provided without a matching placeholder"
        )));
    }
    Ok((out, bound))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars() {
        let (sql, params) = translate(
            "SELECT * FROM `t` WHERE (`a` = %s) AND (`b` > %s)",
            vec![Value::Int(1), Value::Text("x".into())],
        )
        .unwrap();
        assert_eq!(sql, "SELECT * FROM `t` WHERE (`a` = ?) AND (`b` > ?)");
        assert_eq!(params, vec![Value::Int(1), Value::Text("x".into())]);
    }

    #[test]
    fn lists_expand() {
        let (sql, params) = translate(
            "SELECT COUNT(*) FROM `user` WHERE (`id` IN %s)",
            vec![Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])],
        )
        .unwrap();
        assert_eq!(sql, "SELECT COUNT(*) FROM `user` WHERE (`id` IN (?, ?, ?))");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn empty_list_matches_nothing() {
        let (sql, params) =
            translate("DELETE FROM `t` WHERE (`id` IN %s)", vec![Value::List(vec![])]).unwrap();
        assert_eq!(sql, "DELETE FROM `t` WHERE (`id` IN (NULL))");
        assert!(params.is_empty());
    }

    #[test]
    fn percent_escapes() {
        let (sql, _) =
            translate("SELECT DATE_FORMAT(`d`, '%%Y') = %s", vec![Value::Int(1)]).unwrap();
        assert_eq!(sql, "SELECT DATE_FORMAT(`d`, '%Y') = ?");
    }

    #[test]
    fn count_mismatch() {
        assert!(translate("SELECT %s, %s", vec![Value::Int(1)]).is_err());
        assert!(translate("SELECT %s", vec![Value::Int(1), Value::Int(2)]).is_err());
    }
}
