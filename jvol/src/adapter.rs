use std::path::Path;

use jvol_core::Volume;

use crate::transform::IjkToRas;

/// Reader/writer for every format other than `.jvol`.
///
/// [`crate::open`] and [`crate::save`] call through this trait for any path
/// whose extension is not `jvol`, so callers can plug in whatever imaging
/// library they already use.
pub trait ImageAdapter {
    fn read(&self, path: &Path) -> anyhow::Result<(Volume, IjkToRas)>;

    fn write(&self, volume: &Volume, transform: &IjkToRas, path: &Path) -> anyhow::Result<()>;
}

/// Adapter for callers that only handle `.jvol` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAdapter;

impl ImageAdapter for NoAdapter {
    fn read(&self, path: &Path) -> anyhow::Result<(Volume, IjkToRas)> {
        anyhow::bail!("no image adapter configured to read {}", path.display())
    }

    fn write(&self, _volume: &Volume, _transform: &IjkToRas, path: &Path) -> anyhow::Result<()> {
        anyhow::bail!("no image adapter configured to write {}", path.display())
    }
}
