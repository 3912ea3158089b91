#[cfg(test)]
mod tests {
    use keel_core::{AsValue, ErrorKind, Field, Value, error_kind};
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use time::{Date, Month, OffsetDateTime, Time, macros::datetime};
    use uuid::Uuid;

    #[test]
    fn value_bool() {
        assert_eq!(true.as_value(), Value::Boolean(true));
        assert!(bool::try_from_value(Value::Boolean(false)).is_ok_and(|v| !v));
        assert!(bool::try_from_value(Value::Int(1)).is_ok_and(|v| v));
        assert!(bool::try_from_value(Value::Bytes(b"0".to_vec())).is_ok_and(|v| !v));
        assert!(bool::try_from_value(Value::Int(2)).is_err());
        assert!(bool::try_from_value(Value::Text("yes".into())).is_err());
    }

    #[test]
    fn value_i8() {
        assert_eq!((-5i8).as_value(), Value::Int(-5));
        assert!(i8::try_from_value(Value::Int(127)).is_ok_and(|v| v == 127));
        assert!(i8::try_from_value(Value::Int(128)).is_err());
        assert!(i8::try_from_value(Value::UInt(3)).is_ok_and(|v| v == 3));
        assert!(i8::try_from_value(Value::Float(1.0)).is_err());
    }

    #[test]
    fn value_u32() {
        assert_eq!(7u32.as_value(), Value::UInt(7));
        assert!(u32::try_from_value(Value::Int(-1)).is_err());
        assert!(u32::try_from_value(Value::Text("4294967295".into())).is_ok_and(|v| v == u32::MAX));
        assert!(u32::try_from_value(Value::Text("4294967296".into())).is_err());
        assert!(u32::try_from_value(Value::Text("12a".into())).is_err());
    }

    #[test]
    fn value_i64_from_text_protocol() {
        let v = i64::try_from_value(Value::Bytes(b"-9000000000".to_vec()));
        assert!(v.is_ok_and(|v| v == -9_000_000_000));
    }

    #[test]
    fn value_f64() {
        assert_eq!(1.5f64.as_value(), Value::Float(1.5));
        assert!(f64::try_from_value(Value::Int(3)).is_ok_and(|v| v == 3.0));
        assert!(f64::try_from_value(Value::Bytes(b"2.25".to_vec())).is_ok_and(|v| v == 2.25));
        assert!(f32::try_from_value(Value::Text("x".into())).is_err());
    }

    #[test]
    fn value_decimal() {
        let d = Decimal::from_str("12.345").unwrap();
        assert_eq!(d.as_value(), Value::Decimal(d));
        assert!(
            Decimal::try_from_value(Value::Text("12.345".into())).is_ok_and(|v| v == d)
        );
        assert!(Decimal::try_from_value(Value::Int(4)).is_ok_and(|v| v == Decimal::from(4)));
    }

    #[test]
    fn value_string() {
        assert_eq!("abc".to_string().as_value(), Value::Text("abc".into()));
        assert!(
            String::try_from_value(Value::Bytes(b"hello".to_vec())).is_ok_and(|v| v == "hello")
        );
        assert!(String::try_from_value(Value::Bytes(vec![0xff, 0xfe])).is_err());
        assert!(String::try_from_value(Value::Int(1)).is_err());
    }

    #[test]
    fn value_uuid() {
        let uuid = Uuid::from_str("8b7c6a1e-3f0d-4c55-9a4e-2f1d0c9b8a77").unwrap();
        assert!(
            Uuid::try_from_value(Value::Text("8b7c6a1e3f0d4c559a4e2f1d0c9b8a77".into()))
                .is_ok_and(|v| v == uuid)
        );
        assert!(
            Uuid::try_from_value(Value::Bytes(uuid.as_bytes().to_vec())).is_ok_and(|v| v == uuid)
        );
        assert!(Uuid::try_from_value(Value::Text("nope".into())).is_err());
    }

    #[test]
    fn value_option() {
        assert_eq!(None::<i32>.as_value(), Value::Null);
        assert!(Option::<i32>::try_from_value(Value::Null).is_ok_and(|v| v.is_none()));
        assert!(Option::<i32>::try_from_value(Value::Int(9)).is_ok_and(|v| v == Some(9)));
    }

    #[test]
    fn field_timestamp_is_epoch_seconds() {
        let field = Field::timestamp().name("created");
        let instant = datetime!(2024-02-29 12:30:00 UTC);
        let wire = field.to_wire(Value::Timestamp(instant)).unwrap();
        assert_eq!(wire, Value::Int(1_709_209_800));
        let app = field.to_app(Value::Bytes(b"1709209800".to_vec())).unwrap();
        assert!(matches!(app, Value::Timestamp(v) if v == instant));
    }

    #[test]
    fn field_uuid_uses_simple_form() {
        let field = Field::uuid().name("token");
        let uuid = Uuid::from_str("8b7c6a1e-3f0d-4c55-9a4e-2f1d0c9b8a77").unwrap();
        let wire = field.to_wire(Value::Uuid(uuid)).unwrap();
        assert_eq!(wire, Value::Text("8b7c6a1e3f0d4c559a4e2f1d0c9b8a77".into()));
        assert_eq!(field.to_app(wire).unwrap(), Value::Uuid(uuid));
    }

    #[test]
    fn field_date_accepts_formats() {
        let field = Field::date().name("birthday");
        let expected = Date::from_calendar_date(1990, Month::March, 4).unwrap();
        assert_eq!(
            field.to_wire(Value::Text("1990/03/04".into())).unwrap(),
            Value::Date(expected)
        );
        assert_eq!(
            field.to_app(Value::Bytes(b"1990-03-04".to_vec())).unwrap(),
            Value::Date(expected)
        );
        let error = field.to_wire(Value::Text("04.03.1990".into())).unwrap_err();
        assert_eq!(error_kind(&error), Some(ErrorKind::Data));
    }

    #[test]
    fn field_time_from_text() {
        let field = Field::time().name("opens");
        assert_eq!(
            field.to_app(Value::Text("08:15:00".into())).unwrap(),
            Value::Time(Time::from_hms(8, 15, 0).unwrap())
        );
    }

    #[test]
    fn field_decimal_rounds_to_scale() {
        let field = Field::decimal(10, 2)
            .rounding(rust_decimal::RoundingStrategy::MidpointAwayFromZero)
            .name("price");
        assert_eq!(
            field.to_wire(Value::Text("2.345".into())).unwrap(),
            Value::Decimal(Decimal::from_str("2.35").unwrap())
        );
    }

    #[test]
    fn field_varchar_rejects_numbers() {
        let field = Field::varchar(10).name("label");
        let error = field.to_wire(Value::Int(3)).unwrap_err();
        assert_eq!(error_kind(&error), Some(ErrorKind::Data));
        assert!(error.to_string().contains("label"));
    }

    #[test]
    fn field_null_passes_through() {
        let field = Field::int().nullable().name("n");
        assert_eq!(field.to_wire(Value::Null).unwrap(), Value::Null);
        assert_eq!(field.to_app(Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn field_integer_from_text_protocol() {
        let field = Field::bigint().unsigned().name("big");
        assert_eq!(
            field.to_app(Value::Bytes(b"18446744073709551615".to_vec())).unwrap(),
            Value::UInt(u64::MAX)
        );
        assert_eq!(field.to_app(Value::Bytes(b"-4".to_vec())).unwrap(), Value::Int(-4));
    }

    #[test]
    fn offset_date_time_from_int() {
        let v = OffsetDateTime::try_from_value(Value::Int(0)).unwrap();
        assert_eq!(v, OffsetDateTime::UNIX_EPOCH);
    }
}
