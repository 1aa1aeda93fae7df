//! Name derivation tests

use super::*;
use crate::error::Error;
use test_case::test_case;

#[test_case("my_stage/orders.csv", "ORDERS" ; "simple csv")]
#[test_case("my_stage/2024/daily.sales.csv", "DAILY" ; "multiple dots keep first segment")]
#[test_case("my_stage/README", "README" ; "no extension")]
#[test_case("my_stage/Customers.CSV", "CUSTOMERS" ; "mixed case")]
#[test_case("my_stage/order items.csv", "ORDER_ITEMS" ; "space replaced")]
#[test_case("my_stage/sales-2024.csv", "SALES_2024" ; "dash replaced")]
#[test_case("my_stage/2024_orders.csv", "_2024_ORDERS" ; "leading digit prefixed")]
#[test_case("my_stage/$cash.csv", "_$CASH" ; "leading dollar prefixed")]
fn test_table_name_derivation(path: &str, expected: &str) {
    let names = derive_names(path).unwrap();
    assert_eq!(names.table.as_str(), expected);
}

#[test]
fn test_prefix_and_file_name() {
    let names = derive_names("my_stage/2024/01/orders.csv").unwrap();
    assert_eq!(names.staged.prefix(), "@my_stage/2024/01");
    assert_eq!(names.staged.file_name(), "orders.csv");
    assert_eq!(names.staged.location(), "@my_stage/2024/01/orders.csv");
}

#[test]
fn test_existing_stage_marker_not_doubled() {
    let names = derive_names("@my_stage/orders.csv").unwrap();
    assert_eq!(names.staged.prefix(), "@my_stage");
}

#[test]
fn test_prefix_round_trips_to_input() {
    for path in [
        "my_stage/a.csv",
        "my_stage/deep/nested/dir/b.tsv",
        "stage_x/daily.sales.csv",
    ] {
        let names = derive_names(path).unwrap();
        let rebuilt = format!("{}/{}", names.staged.prefix(), names.staged.file_name());
        assert_eq!(rebuilt, format!("@{path}"));
        assert_eq!(names.staged.to_string(), rebuilt);
    }
}

#[test]
fn test_derivation_is_deterministic() {
    let first = derive_names("my_stage/orders.csv").unwrap();
    let second = derive_names("my_stage/orders.csv").unwrap();
    assert_eq!(first, second);
}

#[test_case("" ; "empty")]
#[test_case("   " ; "blank")]
#[test_case("orders.csv" ; "no separator")]
#[test_case("/orders.csv" ; "empty prefix")]
#[test_case("my_stage/" ; "trailing separator")]
#[test_case("my_stage/.hidden" ; "empty base name")]
fn test_invalid_paths(path: &str) {
    let err = derive_names(path).unwrap_err();
    assert!(matches!(err, Error::InvalidPath { .. }), "got {err:?}");
}

#[test]
fn test_reserved_word_rejected() {
    let err = derive_names("my_stage/select.csv").unwrap_err();
    assert!(matches!(err, Error::InvalidTableName { .. }));

    let err = derive_names("my_stage/Table.csv").unwrap_err();
    assert!(matches!(err, Error::InvalidTableName { .. }));
}

#[test]
fn test_sanitized_names_are_plain_identifiers() {
    for raw in ["orders", "9lives", "a b c", "ünïcode", "x.y"] {
        let table = TableName::sanitize(raw).unwrap();
        assert!(is_plain_identifier(table.as_str()), "{table}");
    }
}

#[test]
fn test_plain_identifier() {
    assert!(is_plain_identifier("ID"));
    assert!(is_plain_identifier("order_id"));
    assert!(is_plain_identifier("_x$1"));
    assert!(!is_plain_identifier("1st"));
    assert!(!is_plain_identifier("first name"));
    assert!(!is_plain_identifier(""));
}

#[test]
fn test_reserved_word_case_insensitive() {
    assert!(is_reserved_word("from"));
    assert!(is_reserved_word("Where"));
    assert!(!is_reserved_word("ORDERS"));
}
