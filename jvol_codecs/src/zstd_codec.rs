use jvol_core::format::CODEC_ZSTD;
use jvol_core::SectionCodec;

/// Zstandard section codec, the default for new files.
///
/// Each section is an independent zstd frame at the configured level
/// (default: 3), so any field decodes without touching the others.
pub struct ZstdCodec {
    /// Compression level (1 = fast / larger, 22 = slow / smallest).
    pub level: i32,
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self { level: 3 }
    }
}

impl ZstdCodec {
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl SectionCodec for ZstdCodec {
    fn id(&self) -> u16 {
        CODEC_ZSTD
    }

    fn name(&self) -> &'static str {
        "zstd"
    }

    fn compress_section(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        let compressed = zstd::bulk::compress(raw, self.level)?;
        Ok(compressed)
    }

    fn decompress_section(&self, compressed: &[u8], raw_len: usize) -> anyhow::Result<Vec<u8>> {
        // raw_len from the section index caps the output buffer.
        let raw = zstd::bulk::decompress(compressed, raw_len)?;
        Ok(raw)
    }
}
