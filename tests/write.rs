#[cfg(test)]
mod tests {
    use keel::{
        Connector, ErrorKind, Executor, ExpressionExt, Field, Insert, KeelError, MockExecutor,
        Model, Params, Record, RowLabeled, RowsAffected, Table, Value, error_kind, values,
    };
    use std::sync::Arc;
    use time::{PrimitiveDateTime, macros::datetime};

    #[derive(Model, Debug, Clone, PartialEq)]
    #[keel(name = "t")]
    struct Item {
        #[keel(auto)]
        id: i64,
        #[keel(varchar = 20)]
        name: String,
        #[keel(default_raw = "CURRENT_TIMESTAMP")]
        created_at: Option<PrimitiveDateTime>,
    }

    #[derive(Model, Debug, Clone, PartialEq)]
    #[keel(name = "setting")]
    struct Setting {
        #[keel(primary_key, varchar = 40)]
        key: String,
        #[keel(varchar = 200)]
        value: String,
        #[keel(default = 1)]
        version: i32,
    }

    fn item_table() -> Arc<Table> {
        Arc::new(
            Table::builder("T")
                .name("t")
                .field("id", Field::auto())
                .field("name", Field::varchar(20))
                .field("created_at", Field::datetime().default_raw("CURRENT_TIMESTAMP"))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn raw_defaults_are_left_to_the_server() {
        let query = Insert::new(item_table())
            .row(values! { "name" => "a" })
            .render()
            .unwrap();
        assert_eq!(query.sql, "INSERT INTO `t` (`name`) VALUES (%s);");
        assert_eq!(query.params, Params::Single(vec![Value::Text("a".into())]));
    }

    #[test]
    fn insert_errors() {
        let error = Insert::new(item_table())
            .row(values! { "name" => "a", "color" => "red" })
            .render()
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<KeelError>(),
            Some(KeelError::UnknownColumn { column, .. }) if column == "color"
        ));

        let error = Insert::new(item_table())
            .row(values! { "id" => 5, "name" => "a" })
            .render()
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<KeelError>(),
            Some(KeelError::NotAllowed(..))
        ));

        let error = Insert::new(item_table())
            .row(values! {})
            .render()
            .unwrap_err();
        assert_eq!(error_kind(&error), Some(ErrorKind::Data));
    }

    #[test]
    fn replace_keeps_the_primary_key() {
        let query = Insert::replace(item_table())
            .row(values! { "id" => 5, "name" => "a" })
            .render()
            .unwrap();
        assert_eq!(query.sql, "REPLACE INTO `t` (`id`, `name`) VALUES (%s, %s);");
        assert_eq!(
            query.params,
            Params::Single(vec![Value::Int(5), Value::Text("a".into())])
        );
    }

    #[test]
    fn derived_rows() {
        let item = Item {
            id: 0,
            name: "lamp".into(),
            created_at: None,
        };
        // `None` leaves the column to its server side default
        let query = Item::insert(&item).render().unwrap();
        assert_eq!(query.sql, "INSERT INTO `t` (`name`) VALUES (%s);");
        assert_eq!(
            query.params,
            Params::Single(vec![Value::Text("lamp".into())])
        );
        let query = Item::insert(values! { "name" => "lamp", "created_at" => Value::Null })
            .render()
            .unwrap();
        assert_eq!(
            query.sql,
            "INSERT INTO `t` (`name`, `created_at`) VALUES (%s, %s);"
        );
        let query = Item::minsert([&item, &item], &["name"]).render().unwrap();
        assert_eq!(query.sql, "INSERT INTO `t` (`name`) VALUES (%s);");
        assert_eq!(
            query.params,
            Params::Many(vec![
                vec![Value::Text("lamp".into())],
                vec![Value::Text("lamp".into())],
            ])
        );

        let setting = Setting {
            key: "theme".into(),
            value: "dark".into(),
            version: 3,
        };
        let query = Setting::mreplace([setting.clone()], &[]).render().unwrap();
        assert_eq!(
            query.sql,
            "REPLACE INTO `setting` (`key`, `value`, `version`) VALUES (%s, %s, %s);"
        );
        let query = Setting::replace(values! { "key" => "theme", "value" => "light" })
            .render()
            .unwrap();
        assert_eq!(
            query.params,
            Params::Single(vec![
                Value::Text("theme".into()),
                Value::Text("light".into()),
                Value::Int(1),
            ])
        );
    }

    #[test]
    fn update_statements() {
        let query = Setting::update(values! { "value" => "dark" })
            .unwrap()
            .set_expr("version", Setting::version().add(1))
            .unwrap()
            .filter(Setting::key().equal("theme"))
            .render()
            .unwrap();
        assert_eq!(
            query.sql,
            "UPDATE `setting` SET `value`=%s, `version`=(`version` + %s) WHERE (`key` = %s);"
        );
        assert_eq!(
            query.params,
            Params::Single(vec![
                Value::Text("dark".into()),
                Value::Int(1),
                Value::Text("theme".into()),
            ])
        );
        // Without a filter every row is updated
        let query = Setting::update(values! { "version" => 0 })
            .unwrap()
            .render()
            .unwrap();
        assert_eq!(query.sql, "UPDATE `setting` SET `version`=%s;");

        let error = Setting::update(values! { "owner" => "me" }).unwrap_err();
        assert_eq!(error_kind(&error), Some(ErrorKind::Usage));
        let error = Setting::update(values! {}).unwrap().render().unwrap_err();
        assert_eq!(error_kind(&error), Some(ErrorKind::Usage));
    }

    #[test]
    fn delete_statements() {
        let error = Setting::delete().render().unwrap_err();
        assert!(matches!(
            error.downcast_ref::<KeelError>(),
            Some(KeelError::Dangerous(..))
        ));
        assert_eq!(
            Setting::delete().allow_all().render().unwrap().sql,
            "DELETE FROM `setting`;"
        );
        let query = Setting::delete()
            .filter(Setting::version().less(2).or(Setting::value().is_null()))
            .limit(10)
            .render()
            .unwrap();
        assert_eq!(
            query.sql,
            "DELETE FROM `setting` WHERE ((`version` < %s) OR (`value` IS NULL)) LIMIT 10;"
        );
    }

    #[tokio::test]
    async fn model_helpers() {
        let mock = MockExecutor::new();
        mock.push_affected(RowsAffected {
            rows_affected: 1,
            last_insert_id: Some(7),
        });
        let result = Item::add(
            &mock,
            Item {
                id: 0,
                name: "desk".into(),
                created_at: Some(datetime!(2024-05-01 10:00)),
            },
        )
        .await
        .unwrap();
        assert_eq!(result.last_insert_id, Some(7));
        assert_eq!(
            mock.last_query().unwrap().params,
            Params::Single(vec![
                Value::Text("desk".into()),
                Value::DateTime(datetime!(2024-05-01 10:00)),
            ])
        );

        mock.push_rows([RowLabeled::from_pairs([
            ("id", Value::Int(7)),
            ("name", Value::Text("desk".into())),
            ("created_at", Value::Null),
        ])]);
        let item = Item::get(&mock, 7).await.unwrap().unwrap();
        assert_eq!(item.name, "desk");
        assert_eq!(item.created_at, None);
        assert_eq!(
            mock.last_query().unwrap().sql,
            "SELECT `id`, `name`, `created_at` FROM `t` WHERE (`id` = %s) LIMIT 1;"
        );

        let rows = Item::mget(&mock, [1, 2, 3], &["name"]).await.unwrap();
        assert!(rows.is_empty());
        let query = mock.last_query().unwrap();
        assert_eq!(
            query.sql,
            "SELECT `name` FROM `t` WHERE (`id` IN %s) LIMIT 3;"
        );
        mock.take_queries();
        assert!(
            Item::mget(&mock, Vec::<i64>::new(), &[])
                .await
                .unwrap()
                .is_empty()
        );
        assert!(mock.queries().is_empty());

        Setting::madd(
            &mock,
            [
                values! { "key" => "a", "value" => "1" },
                values! { "key" => "b", "value" => "2", "version" => 5 },
            ],
        )
        .await
        .unwrap();
        let query = mock.last_query().unwrap();
        assert_eq!(
            query.sql,
            "INSERT INTO `setting` (`key`, `value`, `version`) VALUES (%s, %s, %s);"
        );
        let Params::Many(rows) = query.params else {
            panic!("expected a batch");
        };
        assert_eq!(rows[0][2], Value::Int(1));
        assert_eq!(rows[1][2], Value::Int(5));
    }

    #[tokio::test]
    async fn record_lifecycle() {
        let mock = MockExecutor::new();
        let mut record = Record::new(Item::table());
        record.set("name", "chair").unwrap();
        assert!(record.set("weight", 3).is_err());
        mock.push_affected(RowsAffected {
            rows_affected: 1,
            last_insert_id: Some(11),
        });
        record.save(&mock).await.unwrap();
        assert_eq!(record.primary_key(), Some(&Value::Int(11)));
        assert_eq!(
            mock.last_query().unwrap().sql,
            "INSERT INTO `t` (`name`) VALUES (%s);"
        );
        // Same id as the generated one
        record.set("id", 11).unwrap();

        let error = record.set("id", 12).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<KeelError>(),
            Some(KeelError::NotAllowed(..))
        ));
        record.set("name", "stool").unwrap();
        record.save(&mock).await.unwrap();
        let query = mock.last_query().unwrap();
        assert_eq!(query.sql, "UPDATE `t` SET `name`=%s WHERE (`id` = %s);");
        assert_eq!(
            query.params,
            Params::Single(vec![Value::Text("stool".into()), Value::Int(11)])
        );

        record.remove(&mock).await.unwrap();
        assert_eq!(
            mock.last_query().unwrap().sql,
            "DELETE FROM `t` WHERE (`id` = %s) LIMIT 1;"
        );
        let item: Item = keel::FromRecord::from_record(record).unwrap();
        assert_eq!(item.name, "stool");

        let unsaved = Record::new(Item::table());
        assert_eq!(
            error_kind(&unsaved.remove(&mock).await.unwrap_err()),
            Some(ErrorKind::Usage)
        );

        let mut setting = Record::with_values(
            Setting::table(),
            values! { "key" => "lang", "value" => "en" },
        )
        .unwrap();
        setting.save(&mock).await.unwrap();
        assert_eq!(
            mock.last_query().unwrap().sql,
            "REPLACE INTO `setting` (`key`, `value`, `version`) VALUES (%s, %s, %s);"
        );
    }

    #[tokio::test]
    async fn saving_only_the_primary_key_is_a_no_op() {
        let mock = MockExecutor::new();
        let mut record = Record::with_values(Item::table(), values! { "id" => 4 }).unwrap();
        let result = record.save(&mock).await.unwrap();
        assert_eq!(result, RowsAffected::default());
        assert!(mock.queries().is_empty());
    }

    #[test]
    fn from_record_reports_the_attribute() {
        let record = Record::with_values(
            Setting::table(),
            values! { "key" => "lang", "value" => "en", "version" => "not a number" },
        )
        .unwrap();
        let error = <Setting as keel::FromRecord>::from_record(record).unwrap_err();
        assert!(format!("{:#}", error).contains("Cannot read `version` of `Setting`"));
    }

    #[tokio::test]
    async fn connector_binding() {
        let connector = Connector::<MockExecutor>::new();
        let error = Item::delete()
            .allow_all()
            .execute(&connector)
            .await
            .unwrap_err();
        assert_eq!(error_kind(&error), Some(ErrorKind::Binding));
        let mock = connector.bind(MockExecutor::new()).unwrap();
        assert_eq!(
            error_kind(&connector.bind(MockExecutor::new()).unwrap_err()),
            Some(ErrorKind::Binding)
        );
        connector
            .execute(Item::delete().allow_all().render().unwrap())
            .await
            .unwrap();
        assert_eq!(mock.queries().len(), 1);
        connector.unbind().unwrap();
        assert!(connector.unbind().is_err());
    }
}
