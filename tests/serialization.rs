//! Integration tests for the binary and text matrix/vector codecs.

use tkaldi_matrix::io::{read_stored, InputStream, StoredMatrix};
use tkaldi_matrix::math::{Matrix, MatrixStride, ResizePolicy, Transpose, Vector};
use tkaldi_matrix::{MatrixError, Real, SpecialValue};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write_mat<T: Real>(m: &Matrix<T>, binary: bool) -> Vec<u8> {
    let mut out = Vec::new();
    m.write(&mut out, binary).unwrap();
    out
}

fn read_mat<T: Real>(bytes: &[u8], binary: bool) -> tkaldi_matrix::Result<Matrix<T>> {
    let mut m = Matrix::default();
    let mut input = InputStream::from_bytes(bytes);
    m.read(&mut input, binary, false)?;
    Ok(m)
}

fn sample_f32() -> Matrix<f32> {
    Matrix::from_vec(2, 3, vec![1.5, -2.0, 3.25, 1e-7, 4e20, -0.0]).unwrap()
}

// ---------------------------------------------------------------------------
// Binary round trips
// ---------------------------------------------------------------------------

#[test]
fn binary_round_trip_f32_is_bit_exact() {
    let m = sample_f32();
    let back: Matrix<f32> = read_mat(&write_mat(&m, true), true).unwrap();
    assert_eq!(back.shape(), (2, 3));
    for (a, b) in m.to_vec().iter().zip(back.to_vec().iter()) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn binary_round_trip_f64_padded_storage() {
    let m = Matrix::<f64>::from_mat(
        &Matrix::from_vec(3, 3, (0..9).map(|i| i as f64 / 7.0).collect()).unwrap(),
        Transpose::NoTrans,
    );
    assert!(!m.is_contiguous());
    let bytes = write_mat(&m, true);
    assert_eq!(bytes.len(), 3 + 5 + 5 + 9 * 8);
    let back: Matrix<f64> = read_mat(&bytes, true).unwrap();
    assert_eq!(back, m);
}

#[test]
fn binary_sub_matrix_writes_only_its_elements() {
    let m = Matrix::from_vec(3, 3, (1..=9).map(|i| i as f32).collect()).unwrap();
    let sub = m.range(1, 2, 0, 2).unwrap();
    let mut out = Vec::new();
    sub.write(&mut out, true).unwrap();
    let back: Matrix<f32> = read_mat(&out, true).unwrap();
    assert_eq!(back.to_vec(), vec![4.0, 5.0, 7.0, 8.0]);
}

#[test]
fn binary_empty_matrix_round_trip() {
    let m = Matrix::<f32>::default();
    let back: Matrix<f32> = read_mat(&write_mat(&m, true), true).unwrap();
    assert_eq!(back.shape(), (0, 0));
}

#[test]
fn consecutive_objects_share_a_stream() {
    let a = sample_f32();
    let b = Matrix::from_vec(1, 1, vec![42.0f32]).unwrap();
    let mut bytes = write_mat(&a, true);
    bytes.extend(write_mat(&b, true));

    let mut input = InputStream::from_bytes(&bytes);
    let mut first = Matrix::<f32>::default();
    first.read(&mut input, true, false).unwrap();
    let mut second = Matrix::<f32>::default();
    second.read(&mut input, true, false).unwrap();
    assert_eq!(first, a);
    assert_eq!(second.get(0, 0).unwrap(), 42.0);
    assert_eq!(input.peek().unwrap(), None);
}

// ---------------------------------------------------------------------------
// Cross-precision reads
// ---------------------------------------------------------------------------

#[test]
fn single_archive_into_double_matrix() {
    let m = sample_f32();
    let back: Matrix<f64> = read_mat(&write_mat(&m, true), true).unwrap();
    assert_eq!(back.shape(), m.shape());
    for (a, b) in m.to_vec().iter().zip(back.to_vec().iter()) {
        assert_eq!(*a as f64, *b);
    }
}

#[test]
fn double_archive_into_single_matrix() {
    let m = Matrix::from_vec(1, 3, vec![0.1f64, 1.0 / 3.0, -1e10]).unwrap();
    let back: Matrix<f32> = read_mat(&write_mat(&m, true), true).unwrap();
    assert_eq!(back.shape(), (1, 3));
    for (a, b) in m.to_vec().iter().zip(back.to_vec().iter()) {
        assert_eq!(*a as f32, *b);
    }
}

#[test]
fn read_stored_reports_the_variant() {
    let m = sample_f32();
    let bytes = write_mat(&m, true);
    let mut input = InputStream::from_bytes(&bytes);
    match read_stored::<f64, _>(&mut input).unwrap() {
        StoredMatrix::Foreign(inner) => assert_eq!(inner, m),
        other => panic!("expected foreign precision, got {:?}", other),
    }
}

// ---------------------------------------------------------------------------
// Binary failures
// ---------------------------------------------------------------------------

#[test]
fn wrong_token_reports_truncated_token_and_offsets() {
    let mut bytes = b"  ".to_vec();
    bytes.extend_from_slice(b"XMabcdefghijklmnopqrstuvwxyz ");
    let err = read_mat::<f32>(&bytes, true).unwrap_err();
    match &err {
        MatrixError::Format {
            detail,
            start,
            current,
            ..
        } => {
            assert!(detail.contains("Expected token FM"));
            assert!(detail.contains("XMabcdefghijklmno..."));
            assert!(!detail.contains("xyz"));
            assert_eq!(*start, 0);
            assert!(*current > *start);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(err.to_string().contains("File position at start is 0"));
}

#[test]
fn truncated_payload_is_fatal() {
    let mut bytes = write_mat(&sample_f32(), true);
    bytes.truncate(bytes.len() - 3);
    assert!(matches!(
        read_mat::<f32>(&bytes, true),
        Err(MatrixError::Format { .. })
    ));
}

#[test]
fn oversized_header_fails_without_allocating() {
    let mut huge = b"FM ".to_vec();
    huge.extend_from_slice(&[4, 0xff, 0xff, 0xff, 0x7f, 4, 0xff, 0xff, 0xff, 0x7f]);
    assert!(matches!(
        read_mat::<f32>(&huge, true),
        Err(MatrixError::Format { .. })
    ));

    let mut overflowing = b"DM ".to_vec();
    overflowing.extend_from_slice(&[4, 0xff, 0xff, 0xff, 0x7f, 4, 0xff, 0xff, 0xff, 0x7f]);
    let err = read_mat::<f64>(&overflowing, true).unwrap_err();
    assert!(err.to_string().contains("overflows"), "{}", err);

    // 100000 x 100000 floats declared, a few bytes supplied.
    let mut plausible = b"FM ".to_vec();
    plausible.push(4);
    plausible.extend_from_slice(&100_000i32.to_le_bytes());
    plausible.push(4);
    plausible.extend_from_slice(&100_000i32.to_le_bytes());
    plausible.extend_from_slice(&1.0f32.to_le_bytes());
    let err = read_mat::<f32>(&plausible, true).unwrap_err();
    assert!(err.to_string().contains("Stream failure/EOF"), "{}", err);
}

#[test]
fn oversized_vector_header_is_fatal() {
    let mut bytes = b"FV ".to_vec();
    bytes.extend_from_slice(&[4, 0xff, 0xff, 0xff, 0x7f]);
    let mut v = Vector::<f32>::default();
    let err = v.read(&mut InputStream::from_bytes(&bytes), true, false).unwrap_err();
    assert!(matches!(err, MatrixError::Format { .. }));
}

#[test]
fn bad_integer_size_byte_is_fatal() {
    let mut bytes = b"FM ".to_vec();
    bytes.extend_from_slice(&[8, 1, 0, 0, 0, 0, 0, 0, 0]);
    let err = read_mat::<f32>(&bytes, true).unwrap_err();
    assert!(err.to_string().contains("did not get expected integer type"));
}

// ---------------------------------------------------------------------------
// Text round trips
// ---------------------------------------------------------------------------

#[test]
fn text_round_trip() {
    let m = sample_f32();
    let text = write_mat(&m, false);
    let back: Matrix<f32> = read_mat(&text, false).unwrap();
    assert_eq!(back, m);
}

#[test]
fn text_round_trip_specials_with_advisories() {
    init_logging();
    let m = Matrix::from_vec(1, 3, vec![f64::INFINITY, f64::NEG_INFINITY, f64::NAN]).unwrap();
    let text = write_mat(&m, false);

    let mut back = Matrix::<f64>::default();
    let mut input = InputStream::from_bytes(&text);
    let advisories = back.read(&mut input, false, false).unwrap();
    assert_eq!(advisories.len(), 3);
    assert_eq!(advisories[0].value, SpecialValue::Infinity);
    assert_eq!(advisories[2].value, SpecialValue::NaN);
    assert_eq!(back.get(0, 0).unwrap(), f64::INFINITY);
    assert_eq!(back.get(0, 1).unwrap(), f64::NEG_INFINITY);
    assert!(back.get(0, 2).unwrap().is_nan());
}

#[test]
fn text_accepts_semicolons_and_case_insensitive_specials() {
    init_logging();
    let m: Matrix<f32> = read_mat(b"[ 1 2 ; 3 INF ;\n; -4 nan ]\r\n", false).unwrap();
    assert_eq!(m.shape(), (3, 2));
    assert_eq!(m.get(1, 1).unwrap(), f32::INFINITY);
    assert_eq!(m.get(2, 0).unwrap(), -4.0);
    assert!(m.get(2, 1).unwrap().is_nan());
}

#[test]
fn text_trailing_line_terminator_is_consumed() {
    let mut bytes = write_mat(&sample_f32(), false);
    bytes.extend(write_mat(&sample_f32(), false));
    let mut input = InputStream::from_bytes(&bytes);
    let mut m = Matrix::<f32>::default();
    m.read(&mut input, false, false).unwrap();
    let after_first = input.position();
    assert_eq!(bytes[after_first as usize - 1], b'\n');
    m.read(&mut input, false, false).unwrap();
    assert_eq!(m, sample_f32());
}

#[test]
fn inconsistent_row_lengths_are_fatal() {
    let err = read_mat::<f32>(b"[ 1 2 ; 3 ]", false).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("inconsistent #cols: 2 vs. 1"), "{}", msg);
    assert!(msg.contains("processing row 1"), "{}", msg);
}

#[test]
fn empty_shorthand_and_empty_write() {
    let m: Matrix<f64> = read_mat(b"  []\n", false).unwrap();
    assert_eq!(m.shape(), (0, 0));

    let zero_cols = Matrix::<f32>::new(3, 0);
    assert_eq!(write_mat(&zero_cols, false), b" [ ]\n");

    let back: Matrix<f32> = read_mat(b" [ ]\n", false).unwrap();
    assert_eq!(back.shape(), (0, 0));
}

#[test]
fn text_errors() {
    let missing = read_mat::<f32>(b"   ", false).unwrap_err();
    assert!(missing.to_string().contains("Expected \"[\", got EOF"));

    let wrong_open = read_mat::<f32>(b"{ 1 2 }", false).unwrap_err();
    assert!(wrong_open.to_string().contains("Expected \"[\", got \"{\""));

    let garbage = read_mat::<f32>(b"[ 1 abc ]", false).unwrap_err();
    assert!(garbage.to_string().contains("Expecting numeric matrix data, got abc"));

    let unterminated = read_mat::<f32>(b"[ 1 2 ", false).unwrap_err();
    assert!(unterminated.to_string().contains("Got EOF while reading matrix data"));

    let bad_number = read_mat::<f32>(b"[ 1-2 ]", false).unwrap_err();
    assert!(matches!(bad_number, MatrixError::Format { .. }));
}

#[test]
fn text_error_offsets_account_for_leading_bytes() {
    let mut bytes = Vec::new();
    Matrix::from_vec(1, 1, vec![1.0f32])
        .unwrap()
        .write(&mut bytes, false)
        .unwrap();
    let first_len = bytes.len() as u64;
    bytes.extend_from_slice(b" [ 1 oops ]");

    let mut input = InputStream::from_bytes(&bytes);
    let mut m = Matrix::<f32>::default();
    m.read(&mut input, false, false).unwrap();
    match m.read(&mut input, false, false).unwrap_err() {
        MatrixError::Format { start, current, .. } => {
            assert_eq!(start, first_len);
            assert!(current > start);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

// ---------------------------------------------------------------------------
// Read with add
// ---------------------------------------------------------------------------

#[test]
fn add_into_empty_adopts_shape() {
    let m = sample_f32();
    let bytes = write_mat(&m, true);
    let mut acc = Matrix::<f32>::default();
    acc.read(&mut InputStream::from_bytes(&bytes), true, true).unwrap();
    assert_eq!(acc, m);
}

#[test]
fn add_accumulates_matching_shapes() {
    let m = Matrix::from_vec(1, 2, vec![1.0f64, 2.0]).unwrap();
    let bytes = write_mat(&m, false);
    let mut acc = Matrix::from_vec(1, 2, vec![10.0f64, 20.0]).unwrap();
    acc.read(&mut InputStream::from_bytes(&bytes), false, true).unwrap();
    assert_eq!(acc.to_vec(), vec![11.0, 22.0]);
}

#[test]
fn add_of_empty_read_is_noop_and_mismatch_fails() {
    let mut acc = Matrix::from_vec(1, 2, vec![1.0f32, 2.0]).unwrap();
    acc.read(&mut InputStream::from_bytes(b"[]"), false, true).unwrap();
    assert_eq!(acc.to_vec(), vec![1.0, 2.0]);

    let err = acc
        .read(&mut InputStream::from_bytes(b"[ 1 2 3 ]\n"), false, true)
        .unwrap_err();
    assert!(matches!(err, MatrixError::ShapeMismatch { .. }));
}

// ---------------------------------------------------------------------------
// Vectors
// ---------------------------------------------------------------------------

#[test]
fn vector_binary_and_text_round_trip() {
    let v = Vector::from_vec(vec![0.25f32, -8.0, 1e-3]);
    for binary in [true, false] {
        let mut out = Vec::new();
        v.write(&mut out, binary).unwrap();
        let mut back = Vector::<f32>::default();
        back.read(&mut InputStream::from_bytes(&out), binary, false).unwrap();
        assert_eq!(back, v);
    }
}

#[test]
fn vector_binary_layout_and_cross_precision() {
    let v = Vector::from_vec(vec![1.0f64, 2.0]);
    let mut out = Vec::new();
    v.write(&mut out, true).unwrap();
    assert_eq!(&out[..3], b"DV ");
    assert_eq!(&out[3..8], &[4, 2, 0, 0, 0]);
    assert_eq!(out.len(), 8 + 16);

    let mut back = Vector::<f32>::default();
    back.read(&mut InputStream::from_bytes(&out), true, false).unwrap();
    assert_eq!(back.to_vec(), vec![1.0f32, 2.0]);
}

#[test]
fn vector_text_specials_and_add() {
    init_logging();
    let mut v = Vector::from_vec(vec![1.0f64, 1.0]);
    let advisories = v
        .read(&mut InputStream::from_bytes(b" [ 2 Infinity ]\n"), false, true)
        .unwrap();
    assert_eq!(advisories.len(), 1);
    assert_eq!(v.get(0).unwrap(), 3.0);
    assert_eq!(v.get(1).unwrap(), f64::INFINITY);

    let err = v
        .read(&mut InputStream::from_bytes(b"[ 1 ]"), false, true)
        .unwrap_err();
    assert!(matches!(err, MatrixError::DimMismatch { .. }));
}

#[test]
fn vector_empty_forms() {
    let mut v = Vector::from_vec(vec![1.0f32]);
    v.read(&mut InputStream::from_bytes(b"[]"), false, false).unwrap();
    assert!(v.is_empty());

    let mut out = Vec::new();
    v.write(&mut out, false).unwrap();
    assert_eq!(out, b" [ ]\n");
}

#[test]
fn explicit_stride_round_trip() {
    let m = Matrix::<f32>::with_policy(2, 4, ResizePolicy::ZeroFill, MatrixStride::EqualNumCols);
    let back: Matrix<f32> = read_mat(&write_mat(&m, true), true).unwrap();
    assert_eq!(back.shape(), (2, 4));
    assert!(back.is_contiguous());
}
