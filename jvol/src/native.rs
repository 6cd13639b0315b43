//! The native `.jvol` path: volume → payload → container and back.

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use anyhow::Context;
use tracing::debug;

use jvol_codecs::{boxed_codec_by_id, codec_by_id};
use jvol_core::format::{CODEC_ZSTD, HEADER_SIZE};
use jvol_core::{
    decode_array, encode_array, quantization_table, JvolHeader, JvolPayload, Reader, Volume, Writer,
};

use crate::transform::IjkToRas;

/// Encoder settings for [`save_jvol`] and [`crate::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// Edge length of the cubic blocks.
    pub block_size: usize,
    /// 1 (smallest file) to 100 (finest quantization).
    pub quality: u8,
    /// Section codec applied to the container (`format::CODEC_*`).
    pub codec_id: u16,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            block_size: 4,
            quality: 60,
            codec_id: CODEC_ZSTD,
        }
    }
}

/// Encode `volume` into the bytes of a `.jvol` container.
///
/// Usage errors (quality, block size, non-finite samples, unknown codec)
/// surface before any bytes are produced.
pub fn write_jvol(
    volume: &Volume,
    transform: &IjkToRas,
    options: &SaveOptions,
) -> anyhow::Result<Vec<u8>> {
    let block_shape = [options.block_size; 3];
    let table = quantization_table(block_shape, options.quality)?;
    let codec = boxed_codec_by_id(options.codec_id)?;
    let array = encode_array(volume, &table)?;

    let payload = JvolPayload {
        ijk_to_ras: transform.top_rows(),
        quantization_table: table,
        array,
    };
    let mut writer = Writer::new(Cursor::new(Vec::new()), codec)?;
    payload.write_to(&mut writer)?;
    Ok(writer.finish()?.into_inner())
}

/// Decode a `.jvol` container from any seekable source.
pub fn read_jvol_from<R: Read + Seek>(mut input: R) -> anyhow::Result<(Volume, IjkToRas)> {
    let mut header_buf = [0u8; HEADER_SIZE as usize];
    input.read_exact(&mut header_buf).context("reading JVOL header")?;
    let header = JvolHeader::from_bytes(&header_buf)?;

    let mut reader = Reader::new(input, codec_by_id(header.codec_id)?)?;
    let payload = JvolPayload::read_from(&mut reader)?;
    let volume = decode_array(&payload.array, &payload.quantization_table)?;
    debug!(
        shape = ?volume.shape(),
        dtype = volume.dtype().name(),
        sections = reader.section_count(),
        ratio = reader.ratio(),
        "read jvol container"
    );
    Ok((volume, IjkToRas::from_top_rows(payload.ijk_to_ras)))
}

/// Decode a `.jvol` container held in memory.
pub fn read_jvol(bytes: &[u8]) -> anyhow::Result<(Volume, IjkToRas)> {
    read_jvol_from(Cursor::new(bytes))
}

/// Read a `.jvol` file regardless of its extension.
pub fn open_jvol(path: impl AsRef<Path>) -> anyhow::Result<(Volume, IjkToRas)> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_jvol_from(std::io::BufReader::new(file))
        .with_context(|| format!("reading {}", path.display()))
}

/// Write `volume` as a `.jvol` file regardless of the extension of `path`.
///
/// The container is built in memory first, so a failed encode leaves no file
/// behind.
pub fn save_jvol(
    volume: &Volume,
    transform: &IjkToRas,
    path: impl AsRef<Path>,
    options: &SaveOptions,
) -> anyhow::Result<()> {
    let path = path.as_ref();
    let bytes = write_jvol(volume, transform, options)?;
    std::fs::write(path, &bytes).with_context(|| format!("writing {}", path.display()))?;
    debug!(
        path = %path.display(),
        bytes = bytes.len(),
        raw_bytes = volume.len() * volume.dtype().size(),
        quality = options.quality,
        block_size = options.block_size,
        "saved jvol file"
    );
    Ok(())
}
