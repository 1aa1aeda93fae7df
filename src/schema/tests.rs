//! Schema descriptor tests

use super::*;
use crate::error::Error;

#[test]
fn test_descriptor_preserves_order() {
    let schema = SchemaDescriptor::from_pairs([
        ("ZIP", "TEXT"),
        ("ID", "NUMBER(38, 0)"),
        ("AMOUNT", "NUMBER(10, 2)"),
    ])
    .unwrap();

    assert_eq!(schema.len(), 3);
    let names: Vec<&str> = schema.column_names().collect();
    assert_eq!(names, vec!["ZIP", "ID", "AMOUNT"]);
}

#[test]
fn test_descriptor_keeps_types_verbatim() {
    let schema =
        SchemaDescriptor::from_pairs([("CREATED", "TIMESTAMP_NTZ"), ("BLOB", "weird type!")])
            .unwrap();

    assert_eq!(schema.columns()[0].data_type, "TIMESTAMP_NTZ");
    assert_eq!(schema.columns()[1].data_type, "weird type!");
}

#[test]
fn test_descriptor_allows_empty() {
    let schema = SchemaDescriptor::new(Vec::new()).unwrap();
    assert!(schema.is_empty());
}

#[test]
fn test_descriptor_rejects_empty_name() {
    let err = SchemaDescriptor::from_pairs([("ID", "NUMBER"), ("  ", "TEXT")]).unwrap_err();
    assert!(matches!(err, Error::InvalidSchema { .. }));
    assert!(err.to_string().contains("position 2"));
}

#[test]
fn test_descriptor_rejects_duplicate_name() {
    let err = SchemaDescriptor::from_pairs([("ID", "NUMBER"), ("ID", "TEXT")]).unwrap_err();
    assert!(matches!(err, Error::InvalidSchema { .. }));
    assert!(err.to_string().contains("duplicate column name 'ID'"));
}
