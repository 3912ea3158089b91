use crate::{Record, Result, RowLabeled, Table, Value, Values};
use std::sync::Arc;

/// Materialization requested for fetched rows.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A [`Record`] of the table, values converted by their fields.
    #[default]
    Model,
    /// Attribute name to raw value.
    Map,
    /// Raw values by position.
    Tuple,
}

/// A fetched row in the requested shape.
#[derive(Debug, Clone)]
pub enum Row {
    Record(Record),
    Map(Values),
    Tuple(Vec<Value>),
}

impl Row {
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Row::Record(v) => v.get(name),
            Row::Map(v) => v.get(name),
            Row::Tuple(..) => None,
        }
    }
    pub fn into_record(self) -> Option<Record> {
        match self {
            Row::Record(v) => Some(v),
            _ => None,
        }
    }
    pub fn into_map(self) -> Option<Values> {
        match self {
            Row::Record(v) => Some(v.into_values()),
            Row::Map(v) => Some(v),
            Row::Tuple(..) => None,
        }
    }
    pub fn into_tuple(self) -> Vec<Value> {
        match self {
            Row::Record(v) => v.into_values().into_values().collect(),
            Row::Map(v) => v.into_values().collect(),
            Row::Tuple(v) => v,
        }
    }
}

fn rename(table: &Table, row: RowLabeled) -> Values {
    row.labels
        .iter()
        .zip(row.values.into_vec())
        .map(|(column, value)| {
            let name = table.attribute_of(column).unwrap_or(column);
            (name.to_string(), value)
        })
        .collect()
}

/// Converts a fetched row to `shape`.
///
/// A row meant to become a record falls back to [`Row::Map`] when one of its
/// columns is not a field of the table (aggregates, computed columns).
pub fn load(table: &Arc<Table>, row: RowLabeled, shape: Shape) -> Result<Row> {
    match shape {
        Shape::Tuple => Ok(Row::Tuple(row.values.into_vec())),
        Shape::Map => Ok(Row::Map(rename(table, row))),
        Shape::Model => {
            if row.labels.iter().any(|c| table.attribute_of(c).is_none()) {
                log::debug!(
                    "Row does not match the fields of `{}`, loading it as a map",
                    table.name()
                );
                return Ok(Row::Map(rename(table, row)));
            }
            let mut record = Record::new(table.clone());
            for (column, value) in row.labels.iter().zip(row.values.into_vec()) {
                let Some(attribute) = table.attribute_of(column) else {
                    continue;
                };
                let value = table.field(attribute)?.to_app(value)?;
                record.load(attribute.to_string(), value);
            }
            Ok(Row::Record(record))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Field;

    fn table() -> Arc<Table> {
        Arc::new(
            Table::builder("Item")
                .name("item")
                .field("id", Field::auto())
                .field("label", Field::varchar(20).name("item_label"))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn columns_map_to_attributes() {
        let table = table();
        let row = RowLabeled::from_pairs([
            ("id", Value::Int(3)),
            ("item_label", Value::Bytes(b"hat".to_vec())),
        ]);
        let Row::Record(record) = load(&table, row, Shape::Model).unwrap() else {
            panic!("expected a record");
        };
        assert_eq!(record.get("label"), Some(&Value::Text("hat".into())));
        assert_eq!(record.get_as::<i32>("id").unwrap(), 3);
    }

    #[test]
    fn unknown_columns_fall_back_to_map() {
        let table = table();
        let row = RowLabeled::from_pairs([("id", Value::Int(3)), ("total", Value::Int(9))]);
        let Row::Map(map) = load(&table, row, Shape::Model).unwrap() else {
            panic!("expected a map");
        };
        assert_eq!(map.get("total"), Some(&Value::Int(9)));

        let row = RowLabeled::from_pairs([("item_label", Value::Text("cap".into()))]);
        let Row::Map(map) = load(&table, row.clone(), Shape::Map).unwrap() else {
            panic!("expected a map");
        };
        assert_eq!(map.keys().collect::<Vec<_>>(), ["label"]);
        let Row::Tuple(tuple) = load(&table, row, Shape::Tuple).unwrap() else {
            panic!("expected a tuple");
        };
        assert_eq!(tuple, [Value::Text("cap".into())]);
    }
}
