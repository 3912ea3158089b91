use keel::{Executor, ExpressionExt, Model, Record, ShowKind, exists};
use rust_decimal::Decimal;
use std::{str::FromStr, sync::LazyLock};
use time::{Date, Month, OffsetDateTime};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Model, Debug, Clone, PartialEq)]
#[keel(
    name = "keel_book",
    engine = "InnoDB",
    charset = "utf8mb4",
    unique = ("uk_title", ("title", "published")),
)]
struct Book {
    #[keel(primary_key, char = 13)]
    isbn: String,
    #[keel(varchar = 200)]
    title: String,
    #[keel(decimal = (8, 2))]
    price: Decimal,
    published: Date,
    reference: Uuid,
    #[keel(text)]
    summary: Option<String>,
    stocked: Option<OffsetDateTime>,
}

#[derive(Model, Debug, Clone, PartialEq)]
#[keel(name = "keel_review")]
struct Review {
    #[keel(auto)]
    id: u64,
    #[keel(char = 13)]
    isbn: String,
    #[keel(default = 3)]
    stars: i8,
}

fn book(isbn: &str, title: &str, price: &str, year: i32) -> Book {
    Book {
        isbn: isbn.into(),
        title: title.into(),
        price: Decimal::from_str(price).expect("Valid price"),
        published: Date::from_calendar_date(year, Month::March, 14).expect("Valid date"),
        reference: Uuid::new_v4(),
        summary: None,
        stocked: None,
    }
}

pub async fn books<E: Executor>(executor: &E) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    // Setup
    Review::drop_table(executor, true)
        .await
        .expect("Failed to drop the review table");
    Book::drop_table(executor, true)
        .await
        .expect("Failed to drop the book table");
    Book::create(executor, false)
        .await
        .expect("Failed to create the book table");
    Book::create(executor, true)
        .await
        .expect("Creating an existing table in safe mode must succeed");
    Review::create(executor, true)
        .await
        .expect("Failed to create the review table");
    let columns = Book::show(executor, ShowKind::Columns)
        .await
        .expect("Failed to show the book columns");
    assert_eq!(columns.len(), 7);

    // Replace
    let mut dune = book("9780441013593", "Dune", "9.99", 1965);
    dune.summary = Some("Spice must flow".into());
    dune.stocked = Some(
        OffsetDateTime::from_unix_timestamp(1_700_000_000).expect("Valid timestamp"),
    );
    Book::replace(&dune)
        .execute(executor)
        .await
        .expect("Failed to replace dune");
    Book::mreplace(
        [
            book("9780553283686", "Hyperion", "8.5", 1989),
            book("9780765326355", "The Way of Kings", "12.75", 2010),
        ]
        .iter(),
        &[],
    )
    .execute(executor)
    .await
    .expect("Failed to replace the other books");
    let loaded = Book::get(executor, "9780441013593")
        .await
        .expect("Failed to get dune")
        .expect("Dune must exist");
    assert_eq!(loaded, dune);

    // Replacing an existing key overwrites the row
    dune.price = Decimal::from_str("10.49").unwrap();
    Book::replace(&dune)
        .execute(executor)
        .await
        .expect("Failed to replace dune again");
    let price = Book::select()
        .columns([Book::price()])
        .filter(Book::isbn().equal("9780441013593"))
        .scalar(executor)
        .await
        .expect("Failed to read the price");
    assert_eq!(
        keel::AsValue::try_from_value(price).ok(),
        Some(Decimal::from_str("10.49").unwrap())
    );
    assert_eq!(
        Book::select()
            .count(executor)
            .await
            .expect("Failed to count the books"),
        3
    );

    // Unique index
    let mut duplicate = book("9999999999999", "Dune", "1", 1965);
    duplicate.published = dune.published;
    crate::silent_logs!(
        assert!(Book::add(executor, &duplicate).await.is_err());
    );

    // Ranges and patterns
    let recent: Vec<String> = Book::select()
        .filter(
            Book::published()
                .between(
                    Date::from_calendar_date(1980, Month::January, 1).unwrap(),
                    Date::from_calendar_date(2020, Month::January, 1).unwrap(),
                )
                .and(Book::title().not_like("%Kings%")),
        )
        .all_as::<Book>(executor)
        .await
        .expect("Failed to select the recent books")
        .into_iter()
        .map(|v| v.title)
        .collect();
    assert_eq!(recent, ["Hyperion"]);
    let without_summary = Book::select()
        .filter(Book::summary().is_null())
        .count(executor)
        .await
        .expect("Failed to count the books without summary");
    assert_eq!(without_summary, 2);

    // Subqueries and joins
    Review::madd(
        executor,
        [
            Review {
                id: 0,
                isbn: "9780441013593".into(),
                stars: 5,
            },
            Review {
                id: 0,
                isbn: "9780553283686".into(),
                stars: 4,
            },
        ]
        .iter(),
    )
    .await
    .expect("Failed to add the reviews");
    let reviewed = Book::select()
        .filter(
            Book::isbn()
                .in_(Review::select().columns([Review::isbn()]))
                .expect("A subquery is a valid IN operand"),
        )
        .count(executor)
        .await
        .expect("Failed to count the reviewed books");
    assert_eq!(reviewed, 2);
    let unreviewed = Book::select()
        .filter(
            exists(
                Review::select()
                    .columns([keel::raw("1")])
                    .filter(Review::isbn().equal(Book::isbn())),
            )
            .expect("A subquery is a valid EXISTS operand")
            .not(),
        )
        .first_as::<Book>(executor)
        .await
        .expect("Failed to select the unreviewed book")
        .expect("One book has no review");
    assert_eq!(unreviewed.title, "The Way of Kings");
    let stars = Book::select()
        .columns([Book::title().boxed(), Review::stars().boxed()])
        .join(&Review::table(), Review::isbn().equal(Book::isbn()))
        .order_by([Review::stars().desc()])
        .as_tuple()
        .all(executor)
        .await
        .expect("Failed to join the reviews");
    let stars: Vec<_> = stars.into_iter().map(keel::Row::into_tuple).collect();
    assert_eq!(stars.len(), 2);
    assert_eq!(stars[0][0].as_str(), Some("Dune"));

    // Records without auto increment are replaced
    let mut record = Record::new(Book::table());
    record
        .set("isbn", "9780000000001")
        .and_then(|r| r.set("title", "Draft"))
        .and_then(|r| r.set("price", Decimal::ONE))
        .and_then(|r| r.set("published", dune.published))
        .and_then(|r| r.set("reference", Uuid::nil()))
        .expect("Valid attributes");
    assert!(record.set("author", "nobody").is_err());
    record.save(executor).await.expect("Failed to save the draft");
    record.set("title", "Final").unwrap();
    record.save(executor).await.expect("Failed to save the final");
    let last = Book::get(executor, "9780000000001")
        .await
        .expect("Failed to get the final")
        .expect("The final must exist");
    assert_eq!(last.title, "Final");
    assert_eq!(last.reference, Uuid::nil());
    record.remove(executor).await.expect("Failed to remove");
    assert!(
        Book::get(executor, "9780000000001")
            .await
            .expect("Failed to query the removed book")
            .is_none()
    );

    // Cleanup
    Review::drop_table(executor, false)
        .await
        .expect("Failed to drop the review table");
    Book::drop_table(executor, false)
        .await
        .expect("Failed to drop the book table");
}
