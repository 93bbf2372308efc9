use crate::error::FormatError;
use crate::hashtable::Hashtable;
use crate::parser::Parser;
use crate::reader::Reader;

/// Two buckets, 1-byte boundaries, one entry each.
///
/// ```text
/// offset 0   header 4            (bucket_shift 1, size code 0)
/// offset 1   boundaries 3, 5, 7  (relative to offset 1)
/// offset 4   bucket 0: low 0x10, delta +3 -> offset 8
/// offset 6   bucket 1: low 0x20, delta +2 -> offset 9
/// offset 8   payload VarInt 7
/// offset 9   payload VarInt 9
/// ```
const TWO_BUCKETS: [u8; 10] = [4, 3, 5, 7, 0x10, 6, 0x20, 4, 14, 18];

fn table_at<'a>(data: &'a [u8]) -> Hashtable<'a> {
    let mut parser = Parser::new(Reader::new(data).unwrap(), 0);
    Hashtable::new(&mut parser).unwrap()
}

#[test]
fn header_decodes_shift_and_width() {
    let table = table_at(&TWO_BUCKETS);
    assert_eq!(table.bucket_count(), 2);
}

#[test]
fn lookup_finds_the_matching_entry() {
    let table = table_at(&TWO_BUCKETS);

    // Hashcode 0x10: bucket (0x10 >> 8) & 1 = 0, low byte 0x10.
    let mut cursor = table.lookup(0x10).unwrap();
    let mut payload = cursor.next_match().unwrap().expect("entry");
    assert_eq!(payload.get_unsigned(), Ok(7));
    assert_eq!(cursor.next_match(), Ok(None));

    // Hashcode 0x120: bucket 1, low byte 0x20.
    let mut cursor = table.lookup(0x120).unwrap();
    let mut payload = cursor.next_match().unwrap().expect("entry");
    assert_eq!(payload.get_unsigned(), Ok(9));
    assert_eq!(cursor.next_match(), Ok(None));
}

#[test]
fn lookup_misses_cleanly() {
    let table = table_at(&TWO_BUCKETS);

    // Bucket 1 holds only low byte 0x20; 0x10 sorts before it, so the
    // scan terminates early on the greater low byte.
    let mut cursor = table.lookup(0x110).unwrap();
    assert_eq!(cursor.next_match(), Ok(None));

    // Low byte greater than everything in the bucket runs off its end.
    let mut cursor = table.lookup(0x1FF).unwrap();
    assert_eq!(cursor.next_match(), Ok(None));

    // An exhausted cursor stays exhausted.
    assert_eq!(cursor.next_match(), Ok(None));
}

#[test]
fn all_entries_walks_every_bucket() {
    let table = table_at(&TWO_BUCKETS);
    let mut cursor = table.all_entries();

    let mut first = cursor.next_entry().unwrap().expect("first entry");
    assert_eq!(first.get_unsigned(), Ok(7));
    let mut second = cursor.next_entry().unwrap().expect("second entry");
    assert_eq!(second.get_unsigned(), Ok(9));
    assert_eq!(cursor.next_entry(), Ok(None));
    assert_eq!(cursor.next_entry(), Ok(None));
}

#[test]
fn single_bucket_table() {
    // Header 0: one bucket, 1-byte boundaries. Boundaries 2, 4; one
    // entry (low 0x42, delta +1 -> payload at offset 5).
    let data = [0u8, 2, 4, 0x42, 2, 10];
    let table = table_at(&data);
    assert_eq!(table.bucket_count(), 1);

    let mut cursor = table.lookup(0xABCD_EF42).unwrap();
    let mut payload = cursor.next_match().unwrap().expect("entry");
    assert_eq!(payload.get_unsigned(), Ok(5));
}

#[test]
fn empty_bucket_lookup() {
    // One bucket whose boundary range is empty.
    let data = [0u8, 2, 2];
    let table = table_at(&data);
    let mut cursor = table.lookup(0).unwrap();
    assert_eq!(cursor.next_match(), Ok(None));
    assert_eq!(table.all_entries().next_entry(), Ok(None));
}

#[test]
fn rejects_invalid_headers() {
    let mut parser = Parser::new(Reader::new(&[128u8]).unwrap(), 0);
    // Shift 32 would overflow the mask computation.
    assert!(matches!(
        Hashtable::new(&mut parser),
        Err(FormatError::Malformed)
    ));

    let mut parser = Parser::new(Reader::new(&[3u8]).unwrap(), 0);
    // Width code 3 is reserved.
    assert!(matches!(
        Hashtable::new(&mut parser),
        Err(FormatError::Malformed)
    ));

    let mut parser = Parser::new(Reader::new(&[]).unwrap(), 0);
    assert!(matches!(
        Hashtable::new(&mut parser),
        Err(FormatError::Malformed)
    ));
}

#[test]
fn truncated_boundaries_are_malformed() {
    // Header says two buckets but only one boundary byte follows.
    let data = [4u8, 3];
    let table = table_at(&data);
    assert!(table.lookup(0).is_err());
}
