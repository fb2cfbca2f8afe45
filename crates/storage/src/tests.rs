use super::*;
use tempfile::tempdir;

#[test]
fn write_and_read_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.dat");
    create_file(&path).unwrap();

    let mut file = DbFile::open(&path).unwrap();
    let mut page = *zeroed_page();
    page[0..4].copy_from_slice(&[1, 2, 3, 4]);
    file.write_page(PageId(0), &page).unwrap();

    let mut back = *zeroed_page();
    file.read_page(PageId(0), &mut back).unwrap();
    assert_eq!(back[0..4], [1, 2, 3, 4]);
    assert_eq!(&back[4..], &page[4..]);
}

#[test]
fn create_rejects_existing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.dat");
    create_file(&path).unwrap();

    let err = create_file(&path).unwrap_err();
    assert!(matches!(err, DbError::Io(_)));
}

#[test]
fn delete_missing_file_fails() {
    let dir = tempdir().unwrap();
    let err = delete_file(&dir.path().join("absent.dat")).unwrap_err();
    assert!(matches!(err, DbError::Io(_)));
}

#[test]
fn num_pages_sentinel_for_missing_file() {
    let dir = tempdir().unwrap();
    assert_eq!(num_pages(&dir.path().join("absent.dat")).unwrap(), None);
}

#[test]
fn write_at_page_count_extends_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.dat");
    create_file(&path).unwrap();
    assert_eq!(num_pages(&path).unwrap(), Some(0));

    let mut file = DbFile::open(&path).unwrap();
    let page = *zeroed_page();
    file.write_page(PageId(0), &page).unwrap();
    file.write_page(PageId(1), &page).unwrap();

    assert_eq!(file.num_pages().unwrap(), 2);
    assert_eq!(num_pages(&path).unwrap(), Some(2));
}

#[test]
fn short_read_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.dat");
    create_file(&path).unwrap();

    let mut file = DbFile::open(&path).unwrap();
    let mut page = *zeroed_page();
    let err = file.read_page(PageId(0), &mut page).unwrap_err();
    assert!(matches!(err, DbError::Storage(_)));
}

#[test]
fn open_requires_existing_file() {
    let dir = tempdir().unwrap();
    let err = DbFile::open(&dir.path().join("absent.dat")).unwrap_err();
    assert!(matches!(err, DbError::Io(_)));
}

#[test]
fn over_long_file_name_is_a_capacity_error() {
    let dir = tempdir().unwrap();
    let name = "x".repeat(MAX_FILENAME + 1);
    let err = create_file(&dir.path().join(name)).unwrap_err();
    assert!(matches!(err, DbError::Capacity(_)));
}
