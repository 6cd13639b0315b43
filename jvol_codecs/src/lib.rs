mod lz4_codec;
mod passthrough;
mod zstd_codec;

pub use lz4_codec::Lz4Codec;
pub use passthrough::PassThroughCodec;
pub use zstd_codec::ZstdCodec;

use jvol_core::format::{CODEC_LZ4, CODEC_PASSTHROUGH, CODEC_ZSTD};
use jvol_core::SectionCodec;
use std::sync::Arc;

/// Resolve a section codec from its on-disk `codec_id`.
///
/// Used when opening an existing `.jvol` file, so the reader can be
/// initialized with the codec named in the header.
pub fn codec_by_id(id: u16) -> anyhow::Result<Arc<dyn SectionCodec>> {
    match id {
        CODEC_PASSTHROUGH => Ok(Arc::new(PassThroughCodec)),
        CODEC_ZSTD => Ok(Arc::new(ZstdCodec::default())),
        CODEC_LZ4 => Ok(Arc::new(Lz4Codec)),
        _ => anyhow::bail!(
            "unknown codec id {}; supported: 0 (passthrough), 1 (zstd), 2 (lz4)",
            id
        ),
    }
}

/// Owned variant of [`codec_by_id`] for [`jvol_core::Writer`].
pub fn boxed_codec_by_id(id: u16) -> anyhow::Result<Box<dyn SectionCodec>> {
    match id {
        CODEC_PASSTHROUGH => Ok(Box::new(PassThroughCodec)),
        CODEC_ZSTD => Ok(Box::new(ZstdCodec::default())),
        CODEC_LZ4 => Ok(Box::new(Lz4Codec)),
        _ => anyhow::bail!(
            "unknown codec id {}; supported: 0 (passthrough), 1 (zstd), 2 (lz4)",
            id
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_resolve_to_matching_codecs() {
        for id in [CODEC_PASSTHROUGH, CODEC_ZSTD, CODEC_LZ4] {
            assert_eq!(codec_by_id(id).unwrap().id(), id);
            assert_eq!(boxed_codec_by_id(id).unwrap().id(), id);
        }
        assert!(codec_by_id(9).is_err());
    }

    #[test]
    fn every_codec_round_trips_a_section() {
        let raw: Vec<u8> = (0..5000u32).map(|i| (i % 17) as u8).collect();
        for id in [CODEC_PASSTHROUGH, CODEC_ZSTD, CODEC_LZ4] {
            let codec = codec_by_id(id).unwrap();
            let packed = codec.compress_section(&raw).unwrap();
            let unpacked = codec.decompress_section(&packed, raw.len()).unwrap();
            assert_eq!(unpacked, raw, "{}", codec.name());
        }
    }

    #[test]
    fn empty_sections_round_trip() {
        for id in [CODEC_PASSTHROUGH, CODEC_ZSTD, CODEC_LZ4] {
            let codec = codec_by_id(id).unwrap();
            let packed = codec.compress_section(&[]).unwrap();
            assert!(codec.decompress_section(&packed, 0).unwrap().is_empty());
        }
    }
}
