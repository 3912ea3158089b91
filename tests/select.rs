#[cfg(test)]
mod tests {
    use keel::{
        Call, ErrorKind, ExpressionExt, MockExecutor, Model, Params, Row, RowLabeled, Value,
        error_kind, exists, raw,
        stream::TryStreamExt,
    };

    #[derive(Model, Debug, PartialEq)]
    #[keel(name = "user")]
    struct User {
        #[keel(auto)]
        id: i32,
        #[keel(varchar = 45)]
        name: Option<String>,
        #[keel(default = 0)]
        age: i32,
    }

    #[derive(Model)]
    #[keel(name = "post")]
    struct Post {
        #[keel(auto)]
        id: i32,
        author: i32,
        #[keel(varchar = 80)]
        title: String,
    }

    fn user_row(id: i64, name: &str, age: i64) -> RowLabeled {
        RowLabeled::from_pairs([
            ("id", Value::Int(id)),
            ("name", Value::Bytes(name.as_bytes().to_vec())),
            ("age", Value::Int(age)),
        ])
    }

    #[test]
    fn projection_filter_order_limit() {
        let query = User::select()
            .columns([User::name()])
            .filter(User::age().greater(10))
            .order_by([User::id().desc()])
            .limit(5)
            .render()
            .unwrap();
        assert_eq!(
            query.sql,
            "SELECT `name` FROM `user` WHERE (`age` > %s) ORDER BY `id` DESC LIMIT 5;"
        );
        assert_eq!(query.params, Params::Single(vec![Value::Int(10)]));
    }

    #[test]
    fn clauses_keep_sql_order() {
        let select = User::select()
            .limit(2)
            .order_by([User::age().asc()])
            .having(Call::count_all().greater(1))
            .group_by([User::age()])
            .filter(User::age().greater(10))
            .columns([User::age().boxed(), Call::count_all().boxed()]);
        let query = select.render().unwrap();
        assert_eq!(
            query.sql,
            "SELECT `age`, COUNT(1) FROM `user` WHERE (`age` > %s) GROUP BY `age` HAVING (COUNT(1) > %s) ORDER BY `age` ASC LIMIT 2;"
        );
        assert_eq!(
            query.params,
            Params::Single(vec![Value::Int(10), Value::Int(1)])
        );
        assert_eq!(select.render().unwrap(), query);
    }

    #[test]
    fn filter_replaces_previous_one() {
        let query = User::select()
            .filter(User::age().greater(10))
            .filter(User::name().is_null())
            .render()
            .unwrap();
        assert_eq!(
            query.sql,
            "SELECT `id`, `name`, `age` FROM `user` WHERE (`name` IS NULL);"
        );
        let query = User::select()
            .filter_all([User::age().greater(1), User::age().less(5)])
            .unwrap()
            .render()
            .unwrap();
        assert_eq!(
            query.sql,
            "SELECT `id`, `name`, `age` FROM `user` WHERE ((`age` > %s) AND (`age` < %s));"
        );
        assert!(User::select().filter_all(Vec::<Box<dyn keel::Expression>>::new()).is_err());
    }

    #[test]
    fn distinct_projection() {
        let query = User::select()
            .columns([User::age()])
            .distinct()
            .render()
            .unwrap();
        assert_eq!(query.sql, "SELECT DISTINCT `age` FROM `user`;");
    }

    #[test]
    fn usage_errors() {
        let error = User::select().offset(10).unwrap_err();
        assert_eq!(error_kind(&error), Some(ErrorKind::Usage));
        let error = User::select().slice(5..5, 1).unwrap_err();
        assert_eq!(error_kind(&error), Some(ErrorKind::Usage));
        let error = User::select().slice(1..5, 0).unwrap_err();
        assert_eq!(error_kind(&error), Some(ErrorKind::Usage));
        let query = User::select().limit(10).offset(30).unwrap().render().unwrap();
        assert!(query.sql.ends_with(" LIMIT 10 OFFSET 30;"));
    }

    #[test]
    fn joins_qualify_columns() {
        let query = Post::select()
            .columns([Post::title().boxed(), User::name().boxed()])
            .join(&User::table(), User::id().equal(Post::author()))
            .filter(User::age().greater_eq(18))
            .render()
            .unwrap();
        assert_eq!(
            query.sql,
            "SELECT `post`.`title`, `user`.`name` FROM `post` JOIN `user` ON (`user`.`id` = `post`.`author`) WHERE (`user`.`age` >= %s);"
        );
        let query = Post::select()
            .columns([Post::title()])
            .left_join(&User::table(), User::id().equal(Post::author()))
            .render()
            .unwrap();
        assert_eq!(
            query.sql,
            "SELECT `post`.`title` FROM `post` LEFT JOIN `user` ON (`user`.`id` = `post`.`author`);"
        );
    }

    #[test]
    fn subqueries() {
        let query = User::select()
            .filter(
                User::id()
                    .in_(Post::select().columns([Post::author()]))
                    .unwrap(),
            )
            .render()
            .unwrap();
        assert_eq!(
            query.sql,
            "SELECT `id`, `name`, `age` FROM `user` WHERE (`id` IN (SELECT `post`.`author` FROM `post`));"
        );
        let query = User::select()
            .filter(
                exists(
                    Post::select()
                        .columns([raw("1")])
                        .filter(Post::author().equal(User::id())),
                )
                .unwrap(),
            )
            .render()
            .unwrap();
        assert_eq!(
            query.sql,
            "SELECT `id`, `name`, `age` FROM `user` WHERE (EXISTS (SELECT 1 FROM `post` WHERE (`post`.`author` = `user`.`id`)));"
        );
        assert!(query.params.is_empty());
    }

    #[tokio::test]
    async fn count_with_in_list() {
        let mock = MockExecutor::new();
        mock.push_rows([RowLabeled::from_pairs([("COUNT(1)", Value::Int(3))])]);
        let count = User::select()
            .filter(User::id().in_([1, 2, 3]).unwrap())
            .count(&mock)
            .await
            .unwrap();
        assert_eq!(count, 3);
        let query = mock.last_query().unwrap();
        assert_eq!(
            query.sql,
            "SELECT COUNT(1) FROM `user` WHERE (`id` IN %s);"
        );
        assert_eq!(
            query.params,
            Params::Single(vec![Value::List(vec![
                Value::Int(1),
                Value::Int(2),
                Value::Int(3)
            ])])
        );
    }

    #[tokio::test]
    async fn count_ignores_order_and_limit() {
        let mock = MockExecutor::new();
        mock.push_rows([RowLabeled::from_pairs([(
            "COUNT(1)",
            Value::Bytes(b"42".to_vec()),
        )])]);
        let count = User::select()
            .order_by([User::id().asc()])
            .limit(5)
            .count(&mock)
            .await
            .unwrap();
        assert_eq!(count, 42);
        assert_eq!(mock.last_query().unwrap().sql, "SELECT COUNT(1) FROM `user`;");
        // Nothing fetched
        assert_eq!(User::select().count(&mock).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn slice_visits_offsets() {
        let mock = MockExecutor::new();
        mock.push_rows([user_row(6, "f", 20)])
            .push_rows([user_row(8, "h", 21)])
            .push_rows([user_row(10, "j", 22)]);
        let select = User::select()
            .order_by([User::id().asc()])
            .slice(5..10, 2)
            .unwrap();
        let ids: Vec<i32> = select
            .iter(&mock)
            .and_then(|row| async move {
                row.into_record()
                    .expect("rows load as records")
                    .get_as::<i32>("id")
            })
            .try_collect()
            .await
            .unwrap();
        assert_eq!(ids, [6, 8, 10]);
        let sql: Vec<_> = mock.queries().into_iter().map(|q| q.sql).collect();
        assert_eq!(
            sql,
            [
                "SELECT `id`, `name`, `age` FROM `user` ORDER BY `id` ASC LIMIT 1 OFFSET 5;",
                "SELECT `id`, `name`, `age` FROM `user` ORDER BY `id` ASC LIMIT 1 OFFSET 7;",
                "SELECT `id`, `name`, `age` FROM `user` ORDER BY `id` ASC LIMIT 1 OFFSET 9;",
            ]
        );
    }

    #[tokio::test]
    async fn iteration_stops_on_missing_row() {
        let mock = MockExecutor::new();
        mock.push_rows([user_row(1, "a", 30)])
            .push_rows([user_row(2, "b", 31)]);
        let select = User::select();
        let rows: Vec<Row> = select.iter(&mock).try_collect().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(mock.queries().len(), 3);
        assert!(
            mock.last_query()
                .unwrap()
                .sql
                .ends_with("LIMIT 1 OFFSET 2;")
        );
    }

    #[tokio::test]
    async fn first_loads_a_model() {
        let mock = MockExecutor::new();
        mock.push_rows([user_row(1, "ann", 30), user_row(2, "bob", 40)]);
        let user = User::select()
            .filter(User::name().startswith("a"))
            .first_as::<User>(&mock)
            .await
            .unwrap();
        assert_eq!(
            user,
            Some(User {
                id: 1,
                name: Some("ann".into()),
                age: 30,
            })
        );
        let query = mock.last_query().unwrap();
        assert_eq!(
            query.sql,
            "SELECT `id`, `name`, `age` FROM `user` WHERE (`name` LIKE BINARY %s) LIMIT 1;"
        );
        assert_eq!(query.params, Params::Single(vec![Value::Text("a%".into())]));
        assert!(User::select().get(&mock).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn all_applies_the_row_cap() {
        let mock = MockExecutor::new();
        mock.push_rows([user_row(1, "a", 1), user_row(2, "b", 2)]);
        let rows = User::select().all(&mock).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(matches!(rows[0], Row::Record(..)));
        assert_eq!(
            mock.last_query().unwrap().sql,
            "SELECT `id`, `name`, `age` FROM `user` LIMIT 1000;"
        );
        User::select().limit(5000).all(&mock).await.unwrap();
        assert!(mock.last_query().unwrap().sql.ends_with(" LIMIT 5000;"));
    }

    #[tokio::test]
    async fn pagination() {
        let mock = MockExecutor::new();
        User::select().paginate(&mock, 3, 10).await.unwrap();
        assert!(
            mock.last_query()
                .unwrap()
                .sql
                .ends_with(" LIMIT 10 OFFSET 20;")
        );
        User::select().rows(&mock, 4, 8).await.unwrap();
        assert!(mock.last_query().unwrap().sql.ends_with(" LIMIT 4 OFFSET 8;"));
        let error = User::select().paginate(&mock, 0, 10).await.unwrap_err();
        assert_eq!(error_kind(&error), Some(ErrorKind::Usage));
    }

    #[tokio::test]
    async fn exist_and_scalar() {
        let mock = MockExecutor::new();
        mock.push_rows([RowLabeled::from_pairs([("1", Value::Int(1))])]);
        let select = User::select().filter(User::age().greater(99));
        assert!(select.exist(&mock).await.unwrap());
        assert_eq!(
            mock.last_query().unwrap().sql,
            "SELECT 1 FROM `user` WHERE (`age` > %s) LIMIT 1;"
        );
        assert!(!select.exist(&mock).await.unwrap());

        mock.push_rows([RowLabeled::from_pairs([("MAX(`age`)", Value::Int(77))])]);
        let oldest = User::select()
            .columns([Call::max(User::age())])
            .scalar(&mock)
            .await
            .unwrap();
        assert_eq!(oldest, Value::Int(77));
        assert_eq!(
            mock.last_query().unwrap().sql,
            "SELECT MAX(`age`) FROM `user`;"
        );
        assert_eq!(User::select().scalar(&mock).await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn row_shapes() {
        let mock = MockExecutor::new();
        mock.push_rows([user_row(1, "a", 5)])
            .push_rows([user_row(1, "a", 5)])
            .push_rows([RowLabeled::from_pairs([
                ("age", Value::Int(5)),
                ("total", Value::Int(2)),
            ])]);
        let rows = User::select().as_map().all(&mock).await.unwrap();
        let map = rows.into_iter().next().unwrap().into_map().unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), ["id", "name", "age"]);

        let rows = User::select().as_tuple().all(&mock).await.unwrap();
        let tuple = rows.into_iter().next().unwrap().into_tuple();
        assert_eq!(tuple[0], Value::Int(1));

        // Aggregates do not fit the model and come back as maps
        let rows = User::select()
            .columns([User::age().boxed(), Call::count_all().alias("total").boxed()])
            .group_by([User::age()])
            .all(&mock)
            .await
            .unwrap();
        assert_eq!(rows[0].get("total"), Some(&Value::Int(2)));
        assert!(rows[0].clone().into_record().is_none());
    }
}
