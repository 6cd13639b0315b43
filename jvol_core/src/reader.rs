use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use xxhash_rust::xxh3::xxh3_64;

use crate::codec::SectionCodec;
use crate::format::{
    tag_name, JvolHeader, SectionEntry, FLAG_HAS_CHECKSUM, FOOTER_SIZE, FORMAT_VERSION,
    HEADER_SIZE, SECTION_ENTRY_SIZE,
};

/// Random-access reader for JVOL containers.
///
/// # Open sequence
/// 1. Read the 56-byte header (magic check, version, codec_id, section_count).
/// 2. Seek to `end - 8`, read the `index_offset` u64.
/// 3. Seek to `index_offset`, load the section index into RAM.
///
/// [`read_section`](Reader::read_section) then seeks straight to one field
/// and decodes only that field.
pub struct Reader<R: Read + Seek> {
    input: R,
    pub header: JvolHeader,
    entries: Vec<SectionEntry>,
    codec: Arc<dyn SectionCodec>,
}

impl Reader<BufReader<File>> {
    /// Open a JVOL file.
    ///
    /// `codec` must match the `codec_id` stored in the header. Use
    /// [`peek_header`] plus `jvol_codecs::codec_by_id` when it is not known
    /// in advance.
    pub fn open(path: impl AsRef<Path>, codec: Arc<dyn SectionCodec>) -> anyhow::Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file), codec)
    }
}

/// Read and validate only the header of the container at `path`.
pub fn peek_header(path: impl AsRef<Path>) -> anyhow::Result<JvolHeader> {
    let mut file = File::open(path)?;
    read_header(&mut file)
}

fn read_header<R: Read>(input: &mut R) -> anyhow::Result<JvolHeader> {
    let mut header_buf = [0u8; HEADER_SIZE as usize];
    input
        .read_exact(&mut header_buf)
        .context("reading JVOL header")?;
    let header = JvolHeader::from_bytes(&header_buf)?;
    if header.version != FORMAT_VERSION {
        anyhow::bail!(
            "unsupported JVOL version {} (only version {} is supported)",
            header.version,
            FORMAT_VERSION
        );
    }
    Ok(header)
}

impl<R: Read + Seek> Reader<R> {
    pub fn new(mut input: R, codec: Arc<dyn SectionCodec>) -> anyhow::Result<Self> {
        // ── Read and validate header ────────────────────────────────────────
        input.seek(SeekFrom::Start(0))?;
        let header = read_header(&mut input)?;
        if header.codec_id != codec.id() {
            anyhow::bail!(
                "codec mismatch: file uses codec {} but provided codec has id {}",
                header.codec_id,
                codec.id()
            );
        }

        // ── Read footer → index offset ──────────────────────────────────────
        let end = input.seek(SeekFrom::End(0))?;
        let index_len = header.section_count as u64 * SECTION_ENTRY_SIZE;
        if end < HEADER_SIZE + index_len + FOOTER_SIZE {
            anyhow::bail!(
                "truncated JVOL file: {} bytes cannot hold {} sections",
                end,
                header.section_count
            );
        }
        input.seek(SeekFrom::Start(end - FOOTER_SIZE))?;
        let mut footer_buf = [0u8; FOOTER_SIZE as usize];
        input.read_exact(&mut footer_buf)?;
        let index_offset = u64::from_le_bytes(footer_buf);
        let index_end = index_offset
            .checked_add(index_len)
            .and_then(|n| n.checked_add(FOOTER_SIZE));
        if index_offset < HEADER_SIZE || index_end != Some(end) {
            anyhow::bail!(
                "section index offset {} is inconsistent with file size {}",
                index_offset,
                end
            );
        }

        // ── Load section index ──────────────────────────────────────────────
        input.seek(SeekFrom::Start(index_offset))?;
        let mut entries = Vec::with_capacity(header.section_count as usize);
        let mut entry_buf = [0u8; SECTION_ENTRY_SIZE as usize];
        for _ in 0..header.section_count {
            input.read_exact(&mut entry_buf)?;
            let entry = SectionEntry::from_bytes(&entry_buf)?;
            let section_end = entry.offset.checked_add(entry.compressed_len as u64);
            let in_range =
                entry.offset >= HEADER_SIZE && section_end.is_some_and(|e| e <= index_offset);
            if !in_range {
                anyhow::bail!(
                    "section `{}` at offset {} (+{} bytes) lies outside the data region",
                    tag_name(entry.tag),
                    entry.offset,
                    entry.compressed_len
                );
            }
            entries.push(entry);
        }

        Ok(Self {
            input,
            header,
            entries,
            codec,
        })
    }

    /// Total number of sections in the file.
    #[inline]
    pub fn section_count(&self) -> usize {
        self.entries.len()
    }

    /// Total uncompressed size of all sections in bytes.
    pub fn raw_size(&self) -> u64 {
        self.entries.iter().map(|e| e.raw_len as u64).sum()
    }

    /// Total compressed size of all sections in bytes (excluding index/header).
    pub fn compressed_size(&self) -> u64 {
        self.entries.iter().map(|e| e.compressed_len as u64).sum()
    }

    /// Compression ratio: raw_size / compressed_size. Returns 0.0 if empty.
    pub fn ratio(&self) -> f64 {
        let c = self.compressed_size();
        if c == 0 {
            0.0
        } else {
            self.raw_size() as f64 / c as f64
        }
    }

    /// Index entry for `tag`, if the file has that section.
    pub fn entry(&self, tag: u16) -> Option<&SectionEntry> {
        self.entries.iter().find(|e| e.tag == tag)
    }

    /// Decompress and return `(elem, raw bytes)` of the section for `tag`.
    pub fn read_section(&mut self, tag: u16) -> anyhow::Result<(u8, Vec<u8>)> {
        let entry = self
            .entry(tag)
            .ok_or_else(|| anyhow::anyhow!("missing section `{}` (tag {})", tag_name(tag), tag))?
            .clone();

        self.input.seek(SeekFrom::Start(entry.offset))?;
        let mut compressed = vec![0u8; entry.compressed_len as usize];
        self.input
            .read_exact(&mut compressed)
            .with_context(|| format!("reading section `{}`", tag_name(tag)))?;

        if self.header.has_flag(FLAG_HAS_CHECKSUM) {
            let computed = xxh3_64(&compressed);
            if computed != entry.checksum {
                anyhow::bail!(
                    "section `{}` checksum mismatch: expected {:016x}, got {:016x}",
                    tag_name(tag),
                    entry.checksum,
                    computed
                );
            }
        }

        let raw = self
            .codec
            .decompress_section(&compressed, entry.raw_len as usize)
            .with_context(|| format!("decompressing section `{}`", tag_name(tag)))?;
        if raw.len() != entry.raw_len as usize {
            anyhow::bail!(
                "section `{}` decompressed to {} bytes but index says {}",
                tag_name(tag),
                raw.len(),
                entry.raw_len
            );
        }

        Ok((entry.elem, raw))
    }
}
