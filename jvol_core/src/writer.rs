use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::trace;
use xxhash_rust::xxh3::xxh3_64;

use crate::codec::SectionCodec;
use crate::format::{
    tag_name, JvolHeader, SectionEntry, FLAG_HAS_CHECKSUM, FORMAT_VERSION, HEADER_SIZE,
    SECTION_ENTRY_SIZE,
};

/// Sequential writer for JVOL containers.
///
/// # Write contract
/// Call [`write_section`](Writer::write_section) once per field. Each section
/// is compressed with the writer's codec and written immediately. Call
/// [`finish`](Writer::finish) to append the section index and footer and to
/// write back the final header.
///
/// # Format layout written
/// ```text
/// [HEADER: 56 bytes placeholder]
/// [SECTION 0] [SECTION 1] ... [SECTION N-1]   ← independently compressed fields
/// [SECTION INDEX: 32 bytes × N]
/// [FOOTER: 8 bytes, u64 LE offset of section index]
/// ← seek back to 0, overwrite header with real values
/// ```
pub struct Writer<W: Write + Seek> {
    out: W,
    codec: Box<dyn SectionCodec>,
    /// In-memory section index, appended on `finish()`.
    entries: Vec<SectionEntry>,
    /// Current write position (mirrors the stream cursor).
    current_offset: u64,
}

impl Writer<BufWriter<File>> {
    /// Create a new JVOL file at `path`, overwriting any existing file.
    pub fn create(path: impl AsRef<Path>, codec: Box<dyn SectionCodec>) -> anyhow::Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file), codec)
    }
}

impl<W: Write + Seek> Writer<W> {
    /// Start a container at the current beginning of `out`.
    pub fn new(mut out: W, codec: Box<dyn SectionCodec>) -> anyhow::Result<Self> {
        out.seek(SeekFrom::Start(0))?;
        // Placeholder header, overwritten in finish()
        out.write_all(&[0u8; HEADER_SIZE as usize])?;
        Ok(Self {
            out,
            codec,
            entries: Vec::new(),
            current_offset: HEADER_SIZE,
        })
    }

    /// Number of sections written so far.
    pub fn section_count(&self) -> usize {
        self.entries.len()
    }

    /// Compress `raw` as the section for `tag` and write it.
    ///
    /// `elem` is the element type tag of `raw` (see `format::ELEM_BYTES`).
    pub fn write_section(&mut self, tag: u16, elem: u8, raw: &[u8]) -> anyhow::Result<()> {
        if self.entries.iter().any(|e| e.tag == tag) {
            anyhow::bail!("section `{}` (tag {}) written twice", tag_name(tag), tag);
        }
        let raw_len = u32::try_from(raw.len()).map_err(|_| {
            anyhow::anyhow!(
                "section `{}` is {} bytes, above the 4 GiB limit",
                tag_name(tag),
                raw.len()
            )
        })?;

        let compressed = self.codec.compress_section(raw)?;
        let compressed_len = u32::try_from(compressed.len()).map_err(|_| {
            anyhow::anyhow!("compressed section `{}` exceeds 4 GiB", tag_name(tag))
        })?;
        let checksum = xxh3_64(&compressed);

        self.out.write_all(&compressed)?;
        self.entries.push(SectionEntry {
            tag,
            elem,
            offset: self.current_offset,
            compressed_len,
            raw_len,
            checksum,
        });
        self.current_offset += compressed_len as u64;

        trace!(
            field = tag_name(tag),
            raw = raw_len,
            compressed = compressed_len,
            codec = self.codec.name(),
            "wrote section"
        );
        Ok(())
    }

    /// Write the section index + footer, seal the header, and return the
    /// underlying stream.
    pub fn finish(mut self) -> anyhow::Result<W> {
        // ── Section index ──────────────────────────────────────────────────
        let index_offset = self.current_offset;
        for entry in &self.entries {
            self.out.write_all(&entry.to_bytes())?;
        }
        self.current_offset += self.entries.len() as u64 * SECTION_ENTRY_SIZE;

        // ── Footer: 8-byte u64 LE offset of section index start ────────────
        self.out.write_all(&index_offset.to_le_bytes())?;

        // ── Seek back to 0 and write the real header ────────────────────────
        let header = JvolHeader {
            version: FORMAT_VERSION,
            codec_id: self.codec.id(),
            section_count: self.entries.len() as u32,
            flags: FLAG_HAS_CHECKSUM,
        };
        self.out.seek(SeekFrom::Start(0))?;
        self.out.write_all(&header.to_bytes())?;
        self.out.flush()?;

        Ok(self.out)
    }
}
