mod common;

use primescan::prime::count_primes_in;

use common::{encode, scan_bytes};

#[test]
fn empty_input_produces_zero() {
    let summary = scan_bytes(&[], 2, 64, 8);
    assert_eq!(summary.total_primes, 0);
    assert_eq!(summary.segments_processed, 0);
    assert_eq!(summary.bytes_scanned, 0);
}

#[test]
fn trailing_partial_record_is_ignored() {
    let values: Vec<u64> = (0..300).collect();
    let aligned = encode(&values);
    let mut ragged = aligned.clone();
    // 8k + 3 bytes; the tail would decode as 2 if padded with zeros.
    ragged.extend_from_slice(&[2, 0, 0]);

    let base = scan_bytes(&aligned, 2, 256, 64);
    let with_tail = scan_bytes(&ragged, 2, 256, 64);
    assert_eq!(with_tail.total_primes, base.total_primes);
    assert_eq!(with_tail.records_scanned, base.records_scanned);
    assert_eq!(with_tail.bytes_scanned, aligned.len() as u64 + 3);
}

#[test]
fn file_shorter_than_one_record() {
    let summary = scan_bytes(&[7, 0, 0, 0, 0], 1, 64, 8);
    assert_eq!(summary.segments_processed, 1);
    assert_eq!(summary.records_scanned, 0);
    assert_eq!(summary.total_primes, 0);
}

#[test]
fn chunk_larger_than_segment() {
    let values: Vec<u64> = (0..200).collect();
    let summary = scan_bytes(&encode(&values), 3, 64, 4096);
    assert_eq!(summary.total_primes, count_primes_in(0..200));
    assert_eq!(summary.segments_processed, 25);
}

#[test]
fn huge_chunk_size_is_bounded_by_segment() {
    // A terabyte chunk size must not be allocated; segments cap the buffer.
    let summary = scan_bytes(&encode(&[2, 4, 7]), 2, 16, 1u64 << 40);
    assert_eq!(summary.total_primes, 2);
    assert_eq!(summary.records_scanned, 3);
    assert_eq!(summary.segments_processed, 2);
}

#[test]
fn segment_equal_to_file_length() {
    let values = [2u64, 3, 5, 7, 11, 13, 17, 19];
    let summary = scan_bytes(&encode(&values), 4, 64, 16);
    assert_eq!(summary.segments_processed, 1);
    assert_eq!(summary.total_primes, 8);
}

#[test]
fn unaligned_chunk_size_undercounts() {
    // Chunks of 12 bytes split every other record; those records are never
    // decoded. The config layer warns about this setting.
    let values: Vec<u64> = vec![3; 64];
    let bytes = encode(&values);

    let aligned = scan_bytes(&bytes, 2, 512, 16);
    let unaligned = scan_bytes(&bytes, 2, 512, 12);
    assert_eq!(aligned.total_primes, 64);
    assert!(unaligned.total_primes < aligned.total_primes);
    assert!(unaligned.records_scanned < aligned.records_scanned);
}

#[test]
fn unaligned_segment_size_drops_straddling_records() {
    let values: Vec<u64> = vec![5; 10];
    let bytes = encode(&values);
    // Segments of 12 bytes: [0,12) decodes the first 5, [12,24) decodes the
    // misaligned value 5 << 32 built from two neighbouring records.
    let summary = scan_bytes(&bytes, 2, 12, 12);
    assert!(summary.total_primes < 10);
    assert_eq!(summary.bytes_scanned, 80);
}

#[test]
fn full_range_values_decode_correctly() {
    let values = [u64::MAX, u64::MAX - 1, 4_294_967_291, 999_999_999_989, 1, 0];
    let summary = scan_bytes(&encode(&values), 2, 16, 8);
    assert_eq!(summary.total_primes, 2);
    assert_eq!(summary.records_scanned, 6);
}
