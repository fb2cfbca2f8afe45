use super::*;
use buffer::BufferPool;
use catalog::{Catalog, FieldInfo, TableInfo};
use common::{DbError, MAX_STRING, Row};
use expr::{CompareOp, Condition};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tempfile::tempdir;
use types::{FieldType, Value};

fn employee_schema() -> TableInfo {
    TableInfo::try_new(vec![
        FieldInfo::new("id", FieldType::Integer),
        FieldInfo::new("name", FieldType::Text),
    ])
    .unwrap()
}

fn employee(id: i32, name: &str) -> Row {
    Row::new(vec![Value::Int(id), Value::Text(name.into())])
}

/// A catalog + pool with one `employees` table already created.
fn setup(dir: &std::path::Path) -> (Catalog, BufferPool) {
    let catalog = Catalog::new(dir);
    let mut pool = BufferPool::new();
    catalog
        .create_table(&mut pool, "employees", &employee_schema())
        .unwrap();
    (catalog, pool)
}

#[test]
fn layout_counts_flag_and_field_widths() {
    let layout = RecordLayout::for_table(&employee_schema()).unwrap();
    assert_eq!(layout.record_size, 1 + 4 + MAX_STRING);
    assert_eq!(layout.slots_per_page, 4096 / 25);

    let ints = TableInfo::try_new(vec![FieldInfo::new("x", FieldType::Integer)]).unwrap();
    let layout = RecordLayout::for_table(&ints).unwrap();
    assert_eq!(layout.record_size, 5);
    assert_eq!(layout.slots_per_page, 819);
}

#[test]
fn layout_rejects_unknown_field_type() {
    let schema = TableInfo::try_new(vec![FieldInfo::new("x", FieldType::Unknown)]).unwrap();
    let err = RecordLayout::for_table(&schema).unwrap_err();
    assert!(matches!(err, DbError::Schema(_)));
}

#[test]
fn record_codec_round_trip() {
    let schema = employee_schema();
    let row = employee(-12, "alice");

    let image = encode_record(&schema, &row).unwrap();
    assert_eq!(image.len(), 25);
    assert_eq!(image[0], 1); // live flag
    assert_eq!(&image[1..5], &(-12i32).to_le_bytes());
    assert_eq!(&image[5..10], b"alice");
    assert!(image[10..].iter().all(|&b| b == 0)); // NUL padding

    let back = decode_record(&schema, &image).unwrap();
    assert_eq!(back, row);
}

#[test]
fn encode_rejects_arity_and_type_mismatches() {
    let schema = employee_schema();

    let err = encode_record(&schema, &Row::new(vec![Value::Int(1)])).unwrap_err();
    assert!(matches!(err, DbError::Schema(_)));

    let swapped = Row::new(vec![Value::Text("alice".into()), Value::Int(1)]);
    let err = encode_record(&schema, &swapped).unwrap_err();
    assert!(matches!(err, DbError::Schema(_)));
}

#[test]
fn encode_rejects_text_that_cannot_keep_its_terminator() {
    let schema = employee_schema();
    let long = "x".repeat(MAX_STRING); // one byte too many
    let err = encode_record(&schema, &employee(1, &long)).unwrap_err();
    assert!(matches!(err, DbError::Schema(_)));

    // MAX_STRING - 1 bytes is the longest value that fits.
    let longest = "x".repeat(MAX_STRING - 1);
    let image = encode_record(&schema, &employee(1, &longest)).unwrap();
    let back = decode_record(&schema, &image).unwrap();
    assert_eq!(back.values[1], Value::Text(longest));
}

#[test]
fn insert_then_select_round_trip() {
    let dir = tempdir().unwrap();
    let (catalog, mut pool) = setup(dir.path());

    insert(&mut pool, &catalog, "employees", &employee(1, "alice")).unwrap();
    insert(&mut pool, &catalog, "employees", &employee(2, "bob")).unwrap();

    let cond = Condition::new("id", CompareOp::Eq, Value::Int(2));
    let set = select(&mut pool, &catalog, "employees", &cond).unwrap();
    assert_eq!(set.columns, vec!["id".to_string(), "name".to_string()]);
    assert_eq!(set.rows, vec![employee(2, "bob")]);
}

#[test]
fn select_on_empty_table_returns_empty_set() {
    let dir = tempdir().unwrap();
    let (catalog, mut pool) = setup(dir.path());

    let cond = Condition::new("id", CompareOp::Ne, Value::Int(0));
    let set = select(&mut pool, &catalog, "employees", &cond).unwrap();
    assert!(set.is_empty());
}

#[test]
fn insert_reuses_freed_slots_in_order() {
    let dir = tempdir().unwrap();
    let (catalog, mut pool) = setup(dir.path());

    insert(&mut pool, &catalog, "employees", &employee(1, "alice")).unwrap();
    insert(&mut pool, &catalog, "employees", &employee(2, "bob")).unwrap();

    let gone = Condition::new("name", CompareOp::Eq, Value::Text("alice".into()));
    assert_eq!(delete(&mut pool, &catalog, "employees", &gone).unwrap(), 1);

    insert(&mut pool, &catalog, "employees", &employee(3, "carol")).unwrap();

    // Carol claimed alice's slot 0, so she scans out ahead of bob.
    let all = Condition::new("id", CompareOp::Gt, Value::Int(0));
    let set = select(&mut pool, &catalog, "employees", &all).unwrap();
    assert_eq!(set.rows, vec![employee(3, "carol"), employee(2, "bob")]);

    // The file did not grow to place carol.
    assert_eq!(
        storage::num_pages(&catalog.dat_path("employees")).unwrap(),
        Some(1)
    );
}

#[test]
fn delete_reports_and_removes_all_matches() {
    let dir = tempdir().unwrap();
    let (catalog, mut pool) = setup(dir.path());

    for id in 0..6 {
        let name = if id % 2 == 0 { "even" } else { "odd" };
        insert(&mut pool, &catalog, "employees", &employee(id, name)).unwrap();
    }

    let evens = Condition::new("name", CompareOp::Eq, Value::Text("even".into()));
    assert_eq!(delete(&mut pool, &catalog, "employees", &evens).unwrap(), 3);

    let remaining = select(&mut pool, &catalog, "employees", &evens).unwrap();
    assert!(remaining.is_empty());

    let odds = Condition::new("name", CompareOp::Eq, Value::Text("odd".into()));
    assert_eq!(
        select(&mut pool, &catalog, "employees", &odds).unwrap().len(),
        3
    );
}

#[test]
fn delete_with_no_matches_removes_nothing() {
    let dir = tempdir().unwrap();
    let (catalog, mut pool) = setup(dir.path());

    insert(&mut pool, &catalog, "employees", &employee(1, "alice")).unwrap();
    let cond = Condition::new("id", CompareOp::Eq, Value::Int(99));
    assert_eq!(delete(&mut pool, &catalog, "employees", &cond).unwrap(), 0);

    let all = Condition::new("id", CompareOp::Gt, Value::Int(0));
    assert_eq!(select(&mut pool, &catalog, "employees", &all).unwrap().len(), 1);
}

#[test]
fn distinct_drops_exact_duplicates_only() {
    let dir = tempdir().unwrap();
    let catalog = Catalog::new(dir.path());
    let mut pool = BufferPool::new();
    let schema = TableInfo::try_new(vec![FieldInfo::new("x", FieldType::Integer)]).unwrap();
    catalog.create_table(&mut pool, "nums", &schema).unwrap();

    for v in [1, 1, 2] {
        insert(&mut pool, &catalog, "nums", &Row::new(vec![Value::Int(v)])).unwrap();
    }

    let ones = Condition::new("x", CompareOp::Eq, Value::Int(1));
    assert_eq!(select(&mut pool, &catalog, "nums", &ones).unwrap().len(), 2);

    let distinct_ones = ones.clone().distinct();
    let set = select(&mut pool, &catalog, "nums", &distinct_ones).unwrap();
    assert_eq!(set.rows, vec![Row::new(vec![Value::Int(1)])]);
}

#[test]
fn condition_on_unknown_field_is_an_error() {
    let dir = tempdir().unwrap();
    let (catalog, mut pool) = setup(dir.path());

    let cond = Condition::new("salary", CompareOp::Eq, Value::Int(1));
    let err = select(&mut pool, &catalog, "employees", &cond).unwrap_err();
    assert!(matches!(err, DbError::Schema(_)));
    let err = delete(&mut pool, &catalog, "employees", &cond).unwrap_err();
    assert!(matches!(err, DbError::Schema(_)));
}

#[test]
fn insert_into_missing_table_is_catalog_missing() {
    let dir = tempdir().unwrap();
    let catalog = Catalog::new(dir.path());
    let mut pool = BufferPool::new();

    let err = insert(&mut pool, &catalog, "ghosts", &employee(1, "x")).unwrap_err();
    assert!(matches!(err, DbError::Catalog(_)));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    // Select with `>` returns exactly the inserted values above the pivot,
    // in insertion order.
    #[test]
    fn select_gt_matches_a_filter_model(values in prop::collection::vec(-100i32..100, 0..20), pivot in -100i32..100) {
        let dir = tempdir().unwrap();
        let catalog = Catalog::new(dir.path());
        let mut pool = BufferPool::new();
        let schema = TableInfo::try_new(vec![FieldInfo::new("x", FieldType::Integer)]).unwrap();
        catalog.create_table(&mut pool, "nums", &schema).unwrap();

        for v in &values {
            insert(&mut pool, &catalog, "nums", &Row::new(vec![Value::Int(*v)])).unwrap();
        }

        let cond = Condition::new("x", CompareOp::Gt, Value::Int(pivot));
        let set = select(&mut pool, &catalog, "nums", &cond).unwrap();

        let expected: Vec<Row> = values
            .iter()
            .filter(|v| **v > pivot)
            .map(|v| Row::new(vec![Value::Int(*v)]))
            .collect();
        prop_assert_eq!(set.rows, expected);
    }
}
