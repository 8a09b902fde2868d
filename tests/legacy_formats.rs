//! Decoding of quantized matrices and the HTK feature format.

use tkaldi_matrix::io::htk::{HTK_COMPRESSED, HTK_FBANK, HTK_USER};
use tkaldi_matrix::io::{read_htk, read_stored, write_htk, HtkHeader, InputStream, StoredMatrix};
use tkaldi_matrix::math::{CompressedMatrix, CompressionFormat, GlobalHeader, Matrix};
use tkaldi_matrix::MatrixError;

fn global_header(token: &str, min: f32, range: f32, rows: i32, cols: i32) -> Vec<u8> {
    let mut out = format!("{} ", token).into_bytes();
    out.extend_from_slice(&min.to_le_bytes());
    out.extend_from_slice(&range.to_le_bytes());
    out.extend_from_slice(&rows.to_le_bytes());
    out.extend_from_slice(&cols.to_le_bytes());
    out
}

fn read_binary<T: tkaldi_matrix::Real>(bytes: &[u8]) -> tkaldi_matrix::Result<Matrix<T>> {
    let mut m = Matrix::default();
    m.read(&mut InputStream::from_bytes(bytes), true, false)?;
    Ok(m)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-5 * (1.0 + b.abs())
}

// ---------------------------------------------------------------------------
// Uniform quantization
// ---------------------------------------------------------------------------

#[test]
fn cm3_one_byte_decodes_row_major() {
    let mut bytes = global_header("CM3", 0.0, 255.0, 2, 2);
    bytes.extend_from_slice(&[0, 1, 128, 255]);
    let m: Matrix<f32> = read_binary(&bytes).unwrap();
    assert_eq!(m.shape(), (2, 2));
    let got: Vec<f64> = m.to_vec().iter().map(|v| *v as f64).collect();
    for (g, e) in got.iter().zip([0.0, 1.0, 128.0, 255.0]) {
        assert!(close(*g, e), "{} vs {}", g, e);
    }
}

#[test]
fn cm2_two_byte_decodes_into_double() {
    let mut bytes = global_header("CM2", -1.0, 2.0, 1, 3);
    for q in [0u16, 32768, 65535] {
        bytes.extend_from_slice(&q.to_le_bytes());
    }
    let m: Matrix<f64> = read_binary(&bytes).unwrap();
    assert!(close(m.get(0, 0).unwrap(), -1.0));
    assert!(close(m.get(0, 1).unwrap(), -1.0 + 2.0 * 32768.0 / 65535.0));
    assert!(close(m.get(0, 2).unwrap(), 1.0));
}

// ---------------------------------------------------------------------------
// Per-column percentile headers
// ---------------------------------------------------------------------------

#[test]
fn cm_column_headers_and_column_major_bytes() {
    let mut bytes = global_header("CM", 0.0, 65535.0, 3, 2);
    for col in [[0u16, 100, 300, 400], [1000, 1000, 2000, 2000]] {
        for q in col {
            bytes.extend_from_slice(&q.to_le_bytes());
        }
    }
    // column 0 then column 1
    bytes.extend_from_slice(&[0, 64, 255]);
    bytes.extend_from_slice(&[128, 192, 0]);

    let m: Matrix<f32> = read_binary(&bytes).unwrap();
    assert_eq!(m.shape(), (3, 2));
    let at = |r, c| m.get(r, c).unwrap() as f64;
    assert!(close(at(0, 0), 0.0));
    assert!(close(at(1, 0), 100.0));
    assert!(close(at(2, 0), 400.0));
    assert!(close(at(0, 1), 1500.0));
    assert!(close(at(1, 1), 2000.0));
    assert!(close(at(2, 1), 1000.0));
}

#[test]
fn compressed_zero_rows_is_empty() {
    let bytes = global_header("CM2", 0.0, 1.0, 0, 5);
    let m: Matrix<f32> = read_binary(&bytes).unwrap();
    assert_eq!(m.shape(), (0, 0));
}

#[test]
fn compressed_variant_is_visible_before_decoding() {
    let mut bytes = global_header("CM3", 1.0, 0.0, 1, 1);
    bytes.push(7);
    match read_stored::<f32, _>(&mut InputStream::from_bytes(&bytes)).unwrap() {
        StoredMatrix::Compressed(c) => {
            assert_eq!(c.format(), CompressionFormat::OneByte);
            assert_eq!((c.num_rows(), c.num_cols()), (1, 1));
            assert_eq!(
                *c.header(),
                GlobalHeader {
                    min_value: 1.0,
                    range: 0.0,
                    num_rows: 1,
                    num_cols: 1
                }
            );
            let m = StoredMatrix::<f32>::Compressed(c).into_dense();
            assert_eq!(m.get(0, 0).unwrap(), 1.0);
        }
        other => panic!("expected compressed, got {:?}", other),
    }
}

#[test]
fn compressed_errors() {
    let bad_token = global_header("CM9", 0.0, 1.0, 1, 1);
    let err = read_binary::<f32>(&bad_token).unwrap_err();
    assert!(err.to_string().contains("expecting CM, CM2 or CM3"));

    let mut short = global_header("CM3", 0.0, 1.0, 2, 2);
    short.push(1);
    assert!(matches!(
        read_binary::<f32>(&short),
        Err(MatrixError::Format { .. })
    ));

    let negative = global_header("CM2", 0.0, 1.0, -1, 2);
    assert!(read_binary::<f64>(&negative).is_err());
}

#[test]
fn compressed_oversized_header_is_fatal() {
    for token in ["CM", "CM2", "CM3"] {
        let mut bytes = global_header(token, 0.0, 1.0, i32::MAX, i32::MAX);
        bytes.extend_from_slice(&[0, 1, 2, 3]);
        assert!(
            matches!(read_binary::<f32>(&bytes), Err(MatrixError::Format { .. })),
            "{}",
            token
        );
    }
}

#[test]
fn copy_to_mat_checks_shape() {
    let header = GlobalHeader {
        min_value: 0.0,
        range: 1.0,
        num_rows: 1,
        num_cols: 2,
    };
    let c = CompressedMatrix::two_byte(header, vec![0, 65535]).unwrap();
    let mut wrong = Matrix::<f64>::new(2, 1);
    assert!(matches!(
        c.copy_to_mat(&mut wrong),
        Err(MatrixError::ShapeMismatch { .. })
    ));
    let mut right = Matrix::<f64>::new(1, 2);
    c.copy_to_mat(&mut right).unwrap();
    assert!(close(right.get(0, 1).unwrap(), 1.0));
}

// ---------------------------------------------------------------------------
// HTK
// ---------------------------------------------------------------------------

#[test]
fn htk_round_trip() {
    let m = Matrix::from_vec(3, 2, vec![0.5f32, -1.0, 2.0, 3.5, 1e-3, 7.0]).unwrap();
    let template = HtkHeader {
        num_samples: 0,
        sample_period: 100_000,
        sample_size: 0,
        sample_kind: HTK_FBANK,
    };
    let mut out = Vec::new();
    write_htk(&mut out, &m, template).unwrap();
    assert_eq!(out.len(), HtkHeader::SIZE + 3 * 2 * 4);
    assert_eq!(&out[0..4], &3i32.to_be_bytes());
    assert_eq!(&out[12..16], &0.5f32.to_be_bytes());

    let (back, header) = read_htk::<f64, _>(&mut InputStream::from_bytes(&out)).unwrap();
    assert_eq!(header.num_samples, 3);
    assert_eq!(header.sample_size, 8);
    assert_eq!(header.sample_period, 100_000);
    assert_eq!(header.sample_kind, HTK_FBANK);
    let expected: Vec<f64> = m.to_vec().iter().map(|v| *v as f64).collect();
    assert_eq!(back.to_vec(), expected);
}

#[test]
fn htk_rejects_compressed_and_bad_headers() {
    let compressed = HtkHeader {
        num_samples: 1,
        sample_period: 1,
        sample_size: 4,
        sample_kind: HTK_USER | HTK_COMPRESSED,
    };
    let mut out = Vec::new();
    write_htk(&mut out, &Matrix::<f32>::new(1, 1), compressed).unwrap();
    let err = read_htk::<f32, _>(&mut InputStream::from_bytes(&out)).unwrap_err();
    assert!(err.to_string().contains("Compressed HTK"));

    let mut odd = Vec::new();
    odd.extend_from_slice(&1i32.to_be_bytes());
    odd.extend_from_slice(&1i32.to_be_bytes());
    odd.extend_from_slice(&6i16.to_be_bytes());
    odd.extend_from_slice(&HTK_USER.to_be_bytes());
    assert!(read_htk::<f32, _>(&mut InputStream::from_bytes(&odd)).is_err());

    let truncated = &out[..HtkHeader::SIZE - 1];
    assert!(matches!(
        read_htk::<f32, _>(&mut InputStream::from_bytes(truncated)),
        Err(MatrixError::Format { .. })
    ));
}

#[test]
fn htk_oversized_header_is_fatal() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&i32::MAX.to_be_bytes());
    bytes.extend_from_slice(&100_000i32.to_be_bytes());
    bytes.extend_from_slice(&32_764i16.to_be_bytes());
    bytes.extend_from_slice(&HTK_USER.to_be_bytes());
    bytes.extend_from_slice(&[0; 16]);
    let err = read_htk::<f32, _>(&mut InputStream::from_bytes(&bytes)).unwrap_err();
    assert!(err.to_string().contains("Stream failure/EOF"), "{}", err);
}

#[test]
fn htk_write_rejects_frames_wider_than_the_header_allows() {
    let template = HtkHeader {
        num_samples: 0,
        sample_period: 100_000,
        sample_size: 0,
        sample_kind: HTK_USER,
    };
    let wide = Matrix::<f32>::new(1, 8192);
    let mut out = Vec::new();
    match write_htk(&mut out, &wide, template).unwrap_err() {
        MatrixError::TooLarge { value, limit, .. } => {
            assert_eq!(value, 8192);
            assert_eq!(limit, 8191);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(out.is_empty());

    let widest = Matrix::<f32>::new(1, 8191);
    write_htk(&mut out, &widest, template).unwrap();
    assert_eq!(out.len(), HtkHeader::SIZE + 8191 * 4);
}
