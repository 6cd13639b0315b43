use jvol_core::format::CODEC_PASSTHROUGH;
use jvol_core::SectionCodec;

/// Stores sections verbatim.
///
/// Handy for inspecting a container with a hex dump, and for checking the
/// format round-trip independently of any compressor.
pub struct PassThroughCodec;

impl SectionCodec for PassThroughCodec {
    fn id(&self) -> u16 {
        CODEC_PASSTHROUGH
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn compress_section(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        Ok(raw.to_vec())
    }

    fn decompress_section(&self, compressed: &[u8], raw_len: usize) -> anyhow::Result<Vec<u8>> {
        if compressed.len() != raw_len {
            anyhow::bail!("stored section is {} bytes, expected {}", compressed.len(), raw_len);
        }
        Ok(compressed.to_vec())
    }
}
