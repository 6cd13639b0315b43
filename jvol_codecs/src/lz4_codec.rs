use jvol_core::format::CODEC_LZ4;
use jvol_core::SectionCodec;
use lz4_flex::{compress_prepend_size, decompress_size_prepended};

/// LZ4 section codec.
///
/// Fastest to decode; worth it when the volume is reopened often and file
/// size matters less.
pub struct Lz4Codec;

impl SectionCodec for Lz4Codec {
    fn id(&self) -> u16 {
        CODEC_LZ4
    }

    fn name(&self) -> &'static str {
        "lz4"
    }

    fn compress_section(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        Ok(compress_prepend_size(raw))
    }

    fn decompress_section(&self, compressed: &[u8], _raw_len: usize) -> anyhow::Result<Vec<u8>> {
        let raw = decompress_size_prepended(compressed)
            .map_err(|e| anyhow::anyhow!("lz4 decompress error: {}", e))?;
        Ok(raw)
    }
}
