/// Integration tests for the `.jvol` container: a payload written through
/// [`Writer`] comes back field-for-field through [`Reader`], and every kind of
/// damage to the file is reported instead of decoding garbage.
use std::io::Cursor;
use std::sync::Arc;

use jvol_codecs::{codec_by_id, Lz4Codec, PassThroughCodec, ZstdCodec};
use jvol_core::format::{
    CODEC_ZSTD, FOOTER_SIZE, HEADER_SIZE, SECTION_ENTRY_SIZE, TAG_BLOCK_SHAPE, TAG_IJK_TO_RAS,
    TAG_QUANTIZATION_TABLE,
};
use jvol_core::{
    decode_array, encode_array, peek_header, quantization_table, Dtype, JvolError, JvolPayload,
    Reader, Volume, Writer,
};

// ── helpers ───────────────────────────────────────────────────────────────

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("jvol_test_{}_{}.jvol", name, std::process::id()))
}

/// A smooth ramp with some texture, not a multiple of the block size.
fn sample_volume() -> Volume {
    Volume::from_fn([9, 10, 11], |i, j, k| {
        (i * 300 + j * 20 + k * 3 + (i * j * k) % 7) as u16
    })
    .unwrap()
}

fn sample_payload() -> JvolPayload {
    let table = quantization_table([4, 4, 4], 60).unwrap();
    let array = encode_array(&sample_volume(), &table).unwrap();
    JvolPayload {
        ijk_to_ras: [
            [-0.5, 0.0, 0.0, 12.0],
            [0.0, -0.5, 0.0, 8.0],
            [0.0, 0.0, 1.25, -40.0],
        ],
        quantization_table: table,
        array,
    }
}

fn write_to_memory(payload: &JvolPayload, codec: Box<dyn jvol_core::SectionCodec>) -> Vec<u8> {
    let mut w = Writer::new(Cursor::new(Vec::new()), codec).unwrap();
    payload.write_to(&mut w).unwrap();
    w.finish().unwrap().into_inner()
}

// ── tests ──────────────────────────────────────────────────────────────────

#[test]
fn test_roundtrip_file_zstd() {
    let payload = sample_payload();
    let path = temp_path("zstd");

    let mut w = Writer::create(&path, Box::new(ZstdCodec::default())).unwrap();
    payload.write_to(&mut w).unwrap();
    w.finish().unwrap();

    // The header alone tells which codec to open with.
    let header = peek_header(&path).unwrap();
    assert_eq!(header.codec_id, CODEC_ZSTD);
    assert_eq!(header.section_count, 15);

    let mut r = Reader::open(&path, codec_by_id(header.codec_id).unwrap()).unwrap();
    let decoded = JvolPayload::read_from(&mut r).unwrap();
    assert_eq!(decoded, payload);

    let volume = decode_array(&decoded.array, &decoded.quantization_table).unwrap();
    assert_eq!(volume.shape(), [9, 10, 11]);
    assert_eq!(volume.dtype(), Dtype::U16);

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_roundtrip_in_memory_every_codec() {
    let payload = sample_payload();
    let codecs: Vec<Box<dyn jvol_core::SectionCodec>> = vec![
        Box::new(PassThroughCodec),
        Box::new(ZstdCodec::new(9)),
        Box::new(Lz4Codec),
    ];
    for codec in codecs {
        let id = codec.id();
        let bytes = write_to_memory(&payload, codec);
        let mut r = Reader::new(Cursor::new(bytes), codec_by_id(id).unwrap()).unwrap();
        assert_eq!(r.section_count(), 15);
        assert_eq!(JvolPayload::read_from(&mut r).unwrap(), payload, "codec {id}");
    }
}

#[test]
fn test_zstd_shrinks_sections() {
    let bytes = write_to_memory(&sample_payload(), Box::new(ZstdCodec::default()));
    let r = Reader::new(Cursor::new(bytes), Arc::new(ZstdCodec::default())).unwrap();
    // The f64 quantization table is 64 small integers: plenty of redundancy.
    let table = r.entry(TAG_QUANTIZATION_TABLE).unwrap();
    assert!(table.compressed_len < table.raw_len, "{table:?}");
    eprintln!("zstd ratio: {:.2}x", r.ratio());
}

#[test]
fn test_checksum_corruption_detected() {
    let mut bytes = write_to_memory(&sample_payload(), Box::new(PassThroughCodec));

    let offset = {
        let r = Reader::new(Cursor::new(bytes.clone()), Arc::new(PassThroughCodec)).unwrap();
        r.entry(TAG_IJK_TO_RAS).unwrap().offset as usize
    };
    assert_eq!(offset as u64, HEADER_SIZE);
    bytes[offset + 3] ^= 0x40;

    let mut r = Reader::new(Cursor::new(bytes), Arc::new(PassThroughCodec)).unwrap();
    let err = JvolPayload::read_from(&mut r).unwrap_err().to_string();
    assert!(err.contains("checksum mismatch"), "got: {err}");
    assert!(err.contains("ijk_to_ras"), "got: {err}");
}

#[test]
fn test_missing_field_reported() {
    let mut w = Writer::new(Cursor::new(Vec::new()), Box::new(PassThroughCodec)).unwrap();
    let affine: Vec<u8> = [1.0f64, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    w.write_section(TAG_IJK_TO_RAS, Dtype::F64.tag(), &affine).unwrap();
    let bytes = w.finish().unwrap().into_inner();

    let mut r = Reader::new(Cursor::new(bytes), Arc::new(PassThroughCodec)).unwrap();
    let err = JvolPayload::read_from(&mut r).unwrap_err();
    match err.downcast_ref::<JvolError>() {
        Some(JvolError::Format { field, .. }) => assert_eq!(*field, "block_shape"),
        other => panic!("expected a format error, got {other:?} ({err})"),
    }
}

#[test]
fn test_malformed_field_reported() {
    let mut w = Writer::new(Cursor::new(Vec::new()), Box::new(PassThroughCodec)).unwrap();
    // Only 4 of the 12 affine entries.
    let affine: Vec<u8> = [1.0f64; 4].iter().flat_map(|v| v.to_le_bytes()).collect();
    w.write_section(TAG_IJK_TO_RAS, Dtype::F64.tag(), &affine).unwrap();
    w.write_section(TAG_BLOCK_SHAPE, Dtype::U64.tag(), &[0u8; 24]).unwrap();
    let bytes = w.finish().unwrap().into_inner();

    let mut r = Reader::new(Cursor::new(bytes), Arc::new(PassThroughCodec)).unwrap();
    let err = JvolPayload::read_from(&mut r).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<JvolError>(),
        Some(JvolError::Format { field: "ijk_to_ras", .. })
    ));
}

#[test]
fn test_duplicate_section_rejected() {
    let mut w = Writer::new(Cursor::new(Vec::new()), Box::new(PassThroughCodec)).unwrap();
    w.write_section(TAG_BLOCK_SHAPE, Dtype::U64.tag(), &[0u8; 24]).unwrap();
    let err = w
        .write_section(TAG_BLOCK_SHAPE, Dtype::U64.tag(), &[0u8; 24])
        .unwrap_err()
        .to_string();
    assert!(err.contains("written twice"), "got: {err}");
}

/// Test that codec mismatch on open returns a clear error.
#[test]
fn test_codec_mismatch_error() {
    let bytes = write_to_memory(&sample_payload(), Box::new(ZstdCodec::default()));

    let result = Reader::new(Cursor::new(bytes), Arc::new(Lz4Codec));
    assert!(result.is_err(), "opening with wrong codec should fail");
    let err = result.err().unwrap().to_string();
    assert!(
        err.contains("codec mismatch"),
        "error message should mention codec mismatch, got: {err}"
    );
}

#[test]
fn test_truncated_file_rejected() {
    let bytes = write_to_memory(&sample_payload(), Box::new(ZstdCodec::default()));
    let truncated = bytes[..bytes.len() - 5].to_vec();
    assert!(Reader::new(Cursor::new(truncated), Arc::new(ZstdCodec::default())).is_err());

    let header_only = bytes[..HEADER_SIZE as usize].to_vec();
    assert!(Reader::new(Cursor::new(header_only), Arc::new(ZstdCodec::default())).is_err());
}

#[test]
fn test_corrupt_index_rejected() {
    let bytes = write_to_memory(&sample_payload(), Box::new(PassThroughCodec));
    let footer_at = bytes.len() - FOOTER_SIZE as usize;
    let index_offset = u64::from_le_bytes(bytes[footer_at..].try_into().unwrap()) as usize;

    // A section offset that wraps when its length is added.
    let mut wrapped = bytes.clone();
    wrapped[index_offset + 4..index_offset + 12].copy_from_slice(&(u64::MAX - 2).to_le_bytes());
    let err = Reader::new(Cursor::new(wrapped), Arc::new(PassThroughCodec))
        .err()
        .unwrap()
        .to_string();
    assert!(err.contains("outside the data region"), "got: {err}");
    assert!(err.contains("ijk_to_ras"), "got: {err}");

    // A section that runs into the index.
    let mut overlapping = bytes.clone();
    let last = index_offset + 14 * SECTION_ENTRY_SIZE as usize;
    overlapping[last + 12..last + 16].copy_from_slice(&u32::MAX.to_le_bytes());
    assert!(Reader::new(Cursor::new(overlapping), Arc::new(PassThroughCodec)).is_err());

    // A footer pointing near the top of the address space.
    let mut footer = bytes;
    footer[footer_at..].copy_from_slice(&(u64::MAX - 8).to_le_bytes());
    let err = Reader::new(Cursor::new(footer), Arc::new(PassThroughCodec))
        .err()
        .unwrap()
        .to_string();
    assert!(err.contains("inconsistent with file size"), "got: {err}");
}

#[test]
fn test_not_a_jvol_file() {
    let path = temp_path("not_jvol");
    std::fs::write(&path, vec![7u8; 200]).unwrap();
    let err = peek_header(&path).unwrap_err().to_string();
    assert!(err.contains("magic"), "got: {err}");
    std::fs::remove_file(&path).ok();
}
