/// Magic bytes for JVOL version 1 files.
/// 14 bytes: "JVOL1\n" followed by 8 null bytes.
pub const MAGIC: &[u8; 14] = b"JVOL1\n\x00\x00\x00\x00\x00\x00\x00\x00";

/// Current container version.
pub const FORMAT_VERSION: u16 = 1;

/// Fixed size of the JVOL file header in bytes.
///   magic[14] + version:u16 + codec_id:u16 + section_count:u32
///   + flags:u64 + reserved[26]
///   = 14 + 2 + 2 + 4 + 8 + 26 = 56
pub const HEADER_SIZE: u64 = 56;

/// Size of each SectionEntry in the section index, in bytes.
///   tag:u16 + elem:u8 + _pad:u8 + offset:u64 + compressed_len:u32
///   + raw_len:u32 + checksum:u64 + _pad[4]
///   = 2 + 1 + 1 + 8 + 4 + 4 + 8 + 4 = 32
pub const SECTION_ENTRY_SIZE: u64 = 32;

/// Size of the index footer (single u64 offset) in bytes.
pub const FOOTER_SIZE: u64 = 8;

/// File extension handled by the native codec.
pub const EXTENSION: &str = "jvol";

// ── Flags ──────────────────────────────────────────────────────────────────

/// Each section carries an xxhash3-64 checksum of its compressed bytes.
pub const FLAG_HAS_CHECKSUM: u64 = 1 << 0;

// ── Section codec IDs ──────────────────────────────────────────────────────

pub const CODEC_PASSTHROUGH: u16 = 0;
pub const CODEC_ZSTD: u16 = 1;
pub const CODEC_LZ4: u16 = 2;

// ── Section tags ───────────────────────────────────────────────────────────

pub const TAG_IJK_TO_RAS: u16 = 1;
pub const TAG_QUANTIZATION_TABLE: u16 = 2;
pub const TAG_DC_RLE_VALUES: u16 = 3;
pub const TAG_DC_RLE_COUNTS: u16 = 4;
pub const TAG_AC_HUFFMAN_EOF_SYMBOL: u16 = 5;
pub const TAG_AC_HUFFMAN_SYMBOLS_VALUES: u16 = 6;
pub const TAG_AC_HUFFMAN_SYMBOLS_COUNTS: u16 = 7;
pub const TAG_AC_HUFFMAN_BITSIZES: u16 = 8;
pub const TAG_AC_HUFFMAN_VALUES: u16 = 9;
pub const TAG_AC_HUFFMAN_DATA: u16 = 10;
pub const TAG_DTYPE: u16 = 11;
pub const TAG_INTERCEPT: u16 = 12;
pub const TAG_SLOPE: u16 = 13;
pub const TAG_SHAPE: u16 = 14;
pub const TAG_BLOCK_SHAPE: u16 = 15;

/// Element byte for sections holding opaque bytes rather than a typed array.
pub const ELEM_BYTES: u8 = 0;

/// Field name of a section tag, for error messages.
pub fn tag_name(tag: u16) -> &'static str {
    match tag {
        TAG_IJK_TO_RAS => "ijk_to_ras",
        TAG_QUANTIZATION_TABLE => "quantization_table",
        TAG_DC_RLE_VALUES => "dc_rle_values",
        TAG_DC_RLE_COUNTS => "dc_rle_counts",
        TAG_AC_HUFFMAN_EOF_SYMBOL => "ac_huffman_eof_symbol",
        TAG_AC_HUFFMAN_SYMBOLS_VALUES => "ac_huffman_symbols_values",
        TAG_AC_HUFFMAN_SYMBOLS_COUNTS => "ac_huffman_symbols_counts",
        TAG_AC_HUFFMAN_BITSIZES => "ac_huffman_bitsizes",
        TAG_AC_HUFFMAN_VALUES => "ac_huffman_values",
        TAG_AC_HUFFMAN_DATA => "ac_huffman_data",
        TAG_DTYPE => "dtype",
        TAG_INTERCEPT => "intercept",
        TAG_SLOPE => "slope",
        TAG_SHAPE => "shape",
        TAG_BLOCK_SHAPE => "block_shape",
        _ => "unknown",
    }
}

// ── Header ─────────────────────────────────────────────────────────────────

/// Decoded representation of the 56-byte JVOL file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JvolHeader {
    pub version: u16,
    /// Section codec applied to every section body.
    pub codec_id: u16,
    pub section_count: u32,
    pub flags: u64,
}

impl JvolHeader {
    /// Serialize to exactly `HEADER_SIZE` bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE as usize] {
        let mut buf = [0u8; HEADER_SIZE as usize];
        buf[..14].copy_from_slice(MAGIC);
        buf[14..16].copy_from_slice(&self.version.to_le_bytes());
        buf[16..18].copy_from_slice(&self.codec_id.to_le_bytes());
        buf[18..22].copy_from_slice(&self.section_count.to_le_bytes());
        buf[22..30].copy_from_slice(&self.flags.to_le_bytes());
        // reserved[26] stays zero
        buf
    }

    /// Deserialize from `HEADER_SIZE` bytes, checking the magic.
    pub fn from_bytes(buf: &[u8; HEADER_SIZE as usize]) -> anyhow::Result<Self> {
        if &buf[..14] != MAGIC {
            anyhow::bail!("invalid JVOL magic bytes, not a JVOL1 file");
        }
        Ok(Self {
            version: u16::from_le_bytes(buf[14..16].try_into()?),
            codec_id: u16::from_le_bytes(buf[16..18].try_into()?),
            section_count: u32::from_le_bytes(buf[18..22].try_into()?),
            flags: u64::from_le_bytes(buf[22..30].try_into()?),
        })
    }

    pub fn has_flag(&self, flag: u64) -> bool {
        self.flags & flag != 0
    }
}

// ── Section index entry ─────────────────────────────────────────────────────

/// One entry in the section index: locates and describes a single field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionEntry {
    /// Which field this section holds (`TAG_*`).
    pub tag: u16,
    /// Element type tag of the raw bytes, or `ELEM_BYTES`.
    pub elem: u8,
    /// Byte offset of the section from the start of the file.
    pub offset: u64,
    /// Length of the compressed section in bytes.
    pub compressed_len: u32,
    /// Length of the raw section in bytes.
    pub raw_len: u32,
    /// xxhash3-64 of the compressed bytes.
    pub checksum: u64,
}

impl SectionEntry {
    /// Serialize to exactly `SECTION_ENTRY_SIZE` bytes.
    pub fn to_bytes(&self) -> [u8; SECTION_ENTRY_SIZE as usize] {
        let mut buf = [0u8; SECTION_ENTRY_SIZE as usize];
        buf[0..2].copy_from_slice(&self.tag.to_le_bytes());
        buf[2] = self.elem;
        // buf[3] = padding
        buf[4..12].copy_from_slice(&self.offset.to_le_bytes());
        buf[12..16].copy_from_slice(&self.compressed_len.to_le_bytes());
        buf[16..20].copy_from_slice(&self.raw_len.to_le_bytes());
        buf[20..28].copy_from_slice(&self.checksum.to_le_bytes());
        // buf[28..32] = padding
        buf
    }

    /// Deserialize from `SECTION_ENTRY_SIZE` bytes.
    pub fn from_bytes(buf: &[u8; SECTION_ENTRY_SIZE as usize]) -> anyhow::Result<Self> {
        Ok(Self {
            tag: u16::from_le_bytes(buf[0..2].try_into()?),
            elem: buf[2],
            offset: u64::from_le_bytes(buf[4..12].try_into()?),
            compressed_len: u32::from_le_bytes(buf[12..16].try_into()?),
            raw_len: u32::from_le_bytes(buf[16..20].try_into()?),
            checksum: u64::from_le_bytes(buf[20..28].try_into()?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip() {
        let header = JvolHeader {
            version: FORMAT_VERSION,
            codec_id: CODEC_ZSTD,
            section_count: 15,
            flags: FLAG_HAS_CHECKSUM,
        };
        let bytes = header.to_bytes();
        assert_eq!(&bytes[..14], MAGIC);
        let decoded = JvolHeader::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, header);
        assert!(decoded.has_flag(FLAG_HAS_CHECKSUM));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = [0u8; HEADER_SIZE as usize];
        bytes[..4].copy_from_slice(b"NRRD");
        let err = JvolHeader::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("magic"));
    }

    #[test]
    fn entry_round_trip() {
        let entry = SectionEntry {
            tag: TAG_AC_HUFFMAN_DATA,
            elem: ELEM_BYTES,
            offset: 56,
            compressed_len: 1234,
            raw_len: 5678,
            checksum: 0xDEAD_BEEF_0123_4567,
        };
        assert_eq!(SectionEntry::from_bytes(&entry.to_bytes()).unwrap(), entry);
    }

    #[test]
    fn every_tag_has_a_name() {
        for tag in TAG_IJK_TO_RAS..=TAG_BLOCK_SHAPE {
            assert_ne!(tag_name(tag), "unknown", "tag {tag}");
        }
        assert_eq!(tag_name(0), "unknown");
    }
}
