/// Byte-level compression applied to every section of a JVOL container.
///
/// Each `SectionCodec` implementation:
/// - Is identified by a stable numeric `id()` stored in the JVOL header.
/// - Must compress/decompress individual sections independently, so any
///   field can be read without decoding the others.
///
/// The entropy coding of the volume itself happens before this layer; a
/// section codec only squeezes what the Huffman and run-length stages leave
/// behind (mostly the narrow integer arrays).
pub trait SectionCodec: Send + Sync {
    /// Stable codec ID stored in the JVOL file header.
    fn id(&self) -> u16;

    /// Human-readable codec name for logs.
    fn name(&self) -> &'static str;

    /// Compress a single section body.
    fn compress_section(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>>;

    /// Decompress a single section body.
    ///
    /// `raw_len` is the uncompressed length recorded in the section index.
    fn decompress_section(&self, compressed: &[u8], raw_len: usize) -> anyhow::Result<Vec<u8>>;
}
