use keel::{
    AsValue, Executor, ExpressionExt, Model, Row, Value, values,
    stream::{StreamExt, TryStreamExt},
};
use std::{pin::pin, sync::LazyLock};
use tokio::sync::Mutex;

#[derive(Model, Debug, Clone, PartialEq)]
#[keel(name = "keel_user", comment = "registered people", key = ("idx_age", "age"))]
struct User {
    #[keel(auto)]
    id: i64,
    #[keel(varchar = 45)]
    name: Option<String>,
    #[keel(default = 18)]
    age: u32,
    #[keel(default = true)]
    active: bool,
}

fn user(name: &str, age: u32) -> User {
    User {
        id: 0,
        name: Some(name.into()),
        age,
        active: true,
    }
}

pub async fn users<E: Executor>(executor: &E) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    // Setup
    User::drop_table(executor, true)
        .await
        .expect("Failed to drop the user table");
    User::create(executor, false)
        .await
        .expect("Failed to create the user table");

    // Insert
    let result = User::add(executor, user("alice", 30))
        .await
        .expect("Failed to add alice");
    assert_eq!(result.rows_affected, 1);
    let alice_id = result.last_insert_id.expect("The server must assign an id");
    let result = User::madd(
        executor,
        [user("bob", 17), user("carol", 42), user("dave", 25), user("erin", 61)].iter(),
    )
    .await
    .expect("Failed to add the other users");
    assert_eq!(result.rows_affected, 4);

    // Primary key lookups
    let alice = User::get(executor, alice_id)
        .await
        .expect("Failed to get alice")
        .expect("Alice must exist");
    assert_eq!(alice.name.as_deref(), Some("alice"));
    assert_eq!(alice.age, 30);
    assert!(alice.active);
    assert!(
        User::get(executor, alice_id + 1000)
            .await
            .expect("Failed to query a missing user")
            .is_none()
    );
    let rows = User::mget(executor, [alice_id, alice_id + 1], &["name"])
        .await
        .expect("Failed to mget");
    assert_eq!(rows.len(), 2);

    // Filters
    let adults = User::select()
        .filter(User::age().greater_eq(18))
        .count(executor)
        .await
        .expect("Failed to count the adults");
    assert_eq!(adults, 4);
    let names: Vec<String> = User::select()
        .filter(
            User::name()
                .in_([String::from("bob"), String::from("dave")])
                .expect("A list is a valid IN operand"),
        )
        .order_by([User::id().asc()])
        .all_as::<User>(executor)
        .await
        .expect("Failed to select bob and dave")
        .into_iter()
        .filter_map(|v| v.name)
        .collect();
    assert_eq!(names, ["bob", "dave"]);
    let starting_with_c = User::select()
        .filter(User::name().startswith("c"))
        .first_as::<User>(executor)
        .await
        .expect("Failed to search by prefix")
        .expect("Carol must match");
    assert_eq!(starting_with_c.age, 42);
    assert!(
        !User::select()
            .filter(User::age().greater(100))
            .exist(executor)
            .await
            .expect("Failed to check existence")
    );

    // Pagination and iteration
    let page = User::select()
        .order_by([User::id().asc()])
        .paginate(executor, 2, 2)
        .await
        .expect("Failed to paginate");
    let page: Vec<_> = page
        .iter()
        .filter_map(|v| v.get("name").cloned())
        .collect();
    assert_eq!(
        page,
        [Value::Text("carol".into()), Value::Text("dave".into())]
    );
    let select = User::select()
        .order_by([User::id().asc()])
        .slice(1..5, 2)
        .expect("Valid slice");
    let names: Vec<_> = select
        .iter(executor)
        .map_ok(|row| row.get("name").cloned())
        .try_collect()
        .await
        .expect("Failed to iterate");
    assert_eq!(
        names,
        [
            Some(Value::Text("bob".into())),
            Some(Value::Text("dave".into()))
        ]
    );
    {
        let all = User::select();
        let mut stream = pin!(all.iter(executor));
        let mut seen = 0;
        while let Some(row) = stream.next().await {
            row.expect("Failed to read a row while iterating");
            seen += 1;
        }
        assert_eq!(seen, 5);
    }

    // Aggregates
    let oldest = User::select()
        .columns([keel::Call::max(User::age())])
        .scalar(executor)
        .await
        .expect("Failed to compute the max age");
    assert_eq!(u32::try_from_value(oldest).expect("The max age is an integer"), 61);

    // Update
    let result = User::update(values! { "age" => 31u32 })
        .expect("Valid update")
        .filter(User::id().equal(alice_id))
        .execute(executor)
        .await
        .expect("Failed to update alice");
    assert_eq!(result.rows_affected, 1);
    User::update(values! {})
        .expect("Empty values are accepted until render")
        .set_expr("age", User::age().add(1u32))
        .expect("Valid expression")
        .filter(User::name().equal("bob"))
        .execute(executor)
        .await
        .expect("Failed to increment bob");
    let bob = User::select()
        .filter(User::name().equal("bob"))
        .first_as::<User>(executor)
        .await
        .expect("Failed to read bob")
        .expect("Bob must exist");
    assert_eq!(bob.age, 18);

    // Records
    let mut record = User::select()
        .filter(User::id().equal(alice_id))
        .first(executor)
        .await
        .expect("Failed to load alice")
        .and_then(Row::into_record)
        .expect("Alice must load as a record");
    assert_eq!(record.get_as::<u32>("age").unwrap(), 31);
    assert!(record.set("id", alice_id + 1).is_err());
    record.set("name", "alicia").unwrap();
    record.save(executor).await.expect("Failed to save alicia");
    let mut fresh = keel::Record::new(User::table());
    fresh.set("name", "frank").unwrap().set("age", 50u32).unwrap();
    fresh.save(executor).await.expect("Failed to save frank");
    assert!(fresh.primary_key().is_some());
    fresh.remove(executor).await.expect("Failed to remove frank");
    assert_eq!(
        User::select()
            .count(executor)
            .await
            .expect("Failed to count the users"),
        5
    );

    // Delete
    assert!(User::delete().render().is_err());
    let result = User::delete()
        .filter(User::age().less(20))
        .execute(executor)
        .await
        .expect("Failed to delete the young users");
    assert_eq!(result.rows_affected, 1);
    User::delete()
        .allow_all()
        .execute(executor)
        .await
        .expect("Failed to clear the table");
    assert!(
        User::select()
            .all(executor)
            .await
            .expect("Failed to select from the empty table")
            .is_empty()
    );
}
