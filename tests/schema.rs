#[cfg(test)]
mod tests {
    use keel::{
        CreateTable, DropTable, ErrorKind, Field, FieldKind, Index, IndexKind, KeelError, Model,
        Show, ShowKind, Table, error_kind,
    };
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use time::{OffsetDateTime, PrimitiveDateTime};
    use uuid::Uuid;

    #[derive(Model)]
    #[keel(name = "t")]
    struct Minimal {
        #[keel(auto)]
        id: i32,
        #[keel(varchar = 45)]
        name: Option<String>,
    }

    #[derive(Model)]
    #[keel(
        name = "account",
        db = "shop",
        comment = "customer accounts",
        auto_increment = 1000,
        key = ("idx_created", "created"),
        unique = ("uk_email", ("email", "region")),
    )]
    struct Account {
        #[keel(auto)]
        id: u64,
        #[keel(varchar = 120, comment = "login")]
        email: String,
        #[keel(char = 2, default = "EU")]
        region: String,
        #[keel(name = "is_active", default = true)]
        active: bool,
        #[keel(decimal = (10, 2), default = 0)]
        balance: Decimal,
        #[keel(unsigned, zerofill, length = 4)]
        pin: i32,
        #[keel(default_raw = "CURRENT_TIMESTAMP")]
        created: PrimitiveDateTime,
        #[keel(text, charset = "latin1")]
        notes: Option<String>,
        token: Uuid,
        seen: Option<OffsetDateTime>,
    }

    #[test]
    fn minimal_ddl() {
        let query = CreateTable::new(Minimal::table())
            .safe(true)
            .render()
            .unwrap();
        assert_eq!(
            query.sql,
            "CREATE TABLE IF NOT EXISTS `t` (`id` int(11) NOT NULL AUTO_INCREMENT, `name` varchar(45) DEFAULT NULL, PRIMARY KEY (`id`)) ENGINE=InnoDB AUTO_INCREMENT=1 DEFAULT CHARSET=utf8mb4 COMMENT='';"
        );
        assert!(query.params.is_empty());
    }

    #[test]
    fn full_ddl() {
        let query = CreateTable::new(Account::table()).render().unwrap();
        assert_eq!(
            query.sql,
            concat!(
                "CREATE TABLE `shop`.`account` (",
                "`id` bigint(20) unsigned NOT NULL AUTO_INCREMENT, ",
                "`email` varchar(120) NOT NULL COMMENT 'login', ",
                "`region` char(2) NOT NULL DEFAULT 'EU', ",
                "`is_active` tinyint(1) NOT NULL DEFAULT 1, ",
                "`balance` decimal(10,2) NOT NULL DEFAULT 0, ",
                "`pin` int(4) unsigned zerofill NOT NULL, ",
                "`created` datetime NOT NULL DEFAULT CURRENT_TIMESTAMP, ",
                "`notes` text CHARACTER SET latin1 DEFAULT NULL, ",
                "`token` varchar(40) NOT NULL, ",
                "`seen` int(10) unsigned DEFAULT NULL, ",
                "PRIMARY KEY (`id`), ",
                "KEY `idx_created` (`created`), ",
                "UNIQUE KEY `uk_email` (`email`, `region`)",
                ") ENGINE=InnoDB AUTO_INCREMENT=1000 DEFAULT CHARSET=utf8mb4 COMMENT='customer accounts';",
            )
        );
    }

    #[test]
    fn temporary_and_drop() {
        let query = CreateTable::new(Minimal::table())
            .temporary(true)
            .render()
            .unwrap();
        assert!(query.sql.starts_with("CREATE TEMPORARY TABLE `t` ("));
        assert_eq!(
            DropTable::new(&Minimal::table()).render().sql,
            "DROP TABLE `t`;"
        );
        assert_eq!(
            DropTable::new(&Account::table()).safe(true).render().sql,
            "DROP TABLE IF EXISTS `shop`.`account`;"
        );
    }

    #[test]
    fn show_statements() {
        let table = Account::table();
        assert_eq!(
            Show::new(&table, ShowKind::CreateTable).render().sql,
            "SHOW CREATE TABLE `shop`.`account`;"
        );
        assert_eq!(
            Show::new(&table, ShowKind::Columns).render().sql,
            "SHOW FULL COLUMNS FROM `shop`.`account`;"
        );
        assert_eq!(
            Show::new(&table, ShowKind::Indexes).render().sql,
            "SHOW INDEX FROM `shop`.`account`;"
        );
    }

    #[test]
    fn derived_metadata() {
        let table = Account::table();
        assert_eq!(table.name(), "account");
        assert_eq!(table.db(), Some("shop"));
        assert_eq!(table.comment(), "customer accounts");
        assert_eq!(table.primary_key().attribute, "id");
        assert!(table.primary_key().auto_increment);
        assert_eq!(table.primary_key().seed, 1000);
        let attributes: Vec<_> = table.fields().map(|(a, _)| a).collect();
        assert_eq!(
            attributes,
            [
                "id", "email", "region", "active", "balance", "pin", "created", "notes", "token",
                "seen"
            ]
        );
        assert_eq!(Account::active().name(), "is_active");
        assert_eq!(Account::active().attribute(), "active");
        assert_eq!(table.attribute_of("is_active"), Some("active"));
        assert!(matches!(
            table.field("balance").unwrap().kind(),
            FieldKind::Decimal {
                precision: 10,
                scale: 2,
                ..
            }
        ));
        assert!(table.field("notes").unwrap().is_nullable());
        assert!(!table.field("email").unwrap().is_nullable());
        assert!(table.field("pin").unwrap().is_zerofill());
        assert_eq!(table.indexes().len(), 2);
        assert_eq!(table.indexes()[1].kind(), IndexKind::Unique);
        assert_eq!(table.indexes()[1].columns(), ["email", "region"]);
    }

    #[test]
    fn unknown_attribute() {
        let error = Account::column("missing").unwrap_err();
        assert_eq!(error_kind(&error), Some(ErrorKind::Usage));
        assert!(matches!(
            error.downcast_ref::<KeelError>(),
            Some(KeelError::UnknownColumn { column, .. }) if column == "missing"
        ));
    }

    #[test]
    fn schema_errors() {
        let error = Table::builder("Twice")
            .name("twice")
            .field("a", Field::int().primary_key())
            .field("b", Field::int().primary_key())
            .build()
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<KeelError>(),
            Some(KeelError::DuplicatePrimaryKey { first, second, .. }) if first == "a" && second == "b"
        ));

        let error = Table::builder("Keyless")
            .name("keyless")
            .field("a", Field::int())
            .build()
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<KeelError>(),
            Some(KeelError::MissingPrimaryKey { .. })
        ));

        let error = Table::builder("Orphan")
            .name("orphan")
            .field("id", Field::auto())
            .index(Index::unique("uk_missing", ["id", "missing"]))
            .build()
            .unwrap_err();
        assert_eq!(error_kind(&error), Some(ErrorKind::Schema));

        let error = Table::builder("BadDefault")
            .name("bad_default")
            .field("id", Field::auto())
            .field("day", Field::date().default("not a date"))
            .build()
            .unwrap_err();
        assert_eq!(error_kind(&error), Some(ErrorKind::Schema));
    }

    #[test]
    fn inherited_declarations() {
        let base = Arc::new(
            Table::builder("Entity")
                .name("entity")
                .field("id", Field::big_auto())
                .field("created", Field::timestamp().default_now())
                .engine("MyISAM")
                .build()
                .unwrap(),
        );
        let table = Table::builder("Post")
            .name("post")
            .extends(&base)
            .field("title", Field::varchar(80))
            .index(Index::key("idx_title", "title"))
            .build()
            .unwrap();
        assert_eq!(table.engine(), "MyISAM");
        let query = CreateTable::new(Arc::new(table)).render().unwrap();
        assert_eq!(
            query.sql,
            "CREATE TABLE `post` (`id` bigint(20) NOT NULL AUTO_INCREMENT, `created` int(10) unsigned NOT NULL DEFAULT (UNIX_TIMESTAMP(UTC_TIMESTAMP())), `title` varchar(80) NOT NULL, PRIMARY KEY (`id`), KEY `idx_title` (`title`)) ENGINE=MyISAM AUTO_INCREMENT=1 DEFAULT CHARSET=utf8mb4 COMMENT='';"
        );
    }

    #[test]
    fn timestamp_default_follows_the_zone() {
        let ddl = |utc: bool| {
            let table = Table::builder("Event")
                .name("event")
                .field("id", Field::auto())
                .field("at", Field::timestamp().utc(utc))
                .build()
                .unwrap();
            CreateTable::new(Arc::new(table)).render().unwrap().sql
        };
        assert!(ddl(true).contains(
            "`at` int(10) unsigned NOT NULL DEFAULT (UNIX_TIMESTAMP(UTC_TIMESTAMP())),"
        ));
        assert!(ddl(false).contains("`at` int(10) unsigned NOT NULL DEFAULT (UNIX_TIMESTAMP()),"));
        let table = Table::builder("Event")
            .name("event")
            .field("id", Field::auto())
            .field("at", Field::timestamp().utc(false).default(0))
            .build()
            .unwrap();
        assert!(
            CreateTable::new(Arc::new(table))
                .render()
                .unwrap()
                .sql
                .contains("`at` int(10) unsigned NOT NULL DEFAULT 0,")
        );
    }
}
