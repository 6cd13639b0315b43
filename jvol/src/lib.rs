//! Open and save volumetric images.
//!
//! Paths ending in `.jvol` go through the native lossy codec; every other
//! path is handed to an [`ImageAdapter`].

mod adapter;
mod native;
mod transform;

use std::path::Path;

pub use adapter::{ImageAdapter, NoAdapter};
pub use jvol_core::{Dtype, Element, JvolError, Volume, VolumeData};
pub use native::{open_jvol, read_jvol, read_jvol_from, save_jvol, write_jvol, SaveOptions};
pub use transform::IjkToRas;

use jvol_core::format::EXTENSION;

/// True if `path` has the native extension (case-insensitive).
pub fn is_jvol_path(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(EXTENSION))
}

/// Read the volume at `path`, dispatching on its extension.
pub fn open(
    path: impl AsRef<Path>,
    adapter: &dyn ImageAdapter,
) -> anyhow::Result<(Volume, IjkToRas)> {
    let path = path.as_ref();
    if is_jvol_path(path) {
        open_jvol(path)
    } else {
        adapter.read(path)
    }
}

/// Write `volume` to `path`, dispatching on its extension.
///
/// `options` only applies to `.jvol` paths.
pub fn save(
    volume: &Volume,
    transform: &IjkToRas,
    path: impl AsRef<Path>,
    adapter: &dyn ImageAdapter,
    options: &SaveOptions,
) -> anyhow::Result<()> {
    let path = path.as_ref();
    if is_jvol_path(path) {
        save_jvol(volume, transform, path, options)
    } else {
        adapter.write(volume, transform, path)
    }
}
