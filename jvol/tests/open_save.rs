/// End-to-end tests for the caller-facing `open` / `save` entry points.
use std::cell::RefCell;
use std::path::{Path, PathBuf};

use jvol::{
    is_jvol_path, open, open_jvol, read_jvol, save, save_jvol, write_jvol, IjkToRas, ImageAdapter,
    JvolError, NoAdapter, SaveOptions, Volume,
};
use jvol_core::format::{CODEC_LZ4, CODEC_PASSTHROUGH};

fn temp_path(name: &str, ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!("jvol_api_{}_{}.{}", name, std::process::id(), ext))
}

fn ct_like_volume() -> Volume {
    // Air around a denser cylinder, in Hounsfield-like units.
    Volume::from_fn([12, 16, 16], |_, j, k| {
        let (dj, dk) = (j as i32 - 8, k as i32 - 8);
        if dj * dj + dk * dk < 25 {
            40i16 + (j as i16 % 3)
        } else {
            -1000
        }
    })
    .unwrap()
}

fn transform() -> IjkToRas {
    IjkToRas::from_top_rows([
        [-0.8, 0.0, 0.0, 100.0],
        [0.0, -0.8, 0.0, 120.0],
        [0.0, 0.0, 2.5, -300.0],
    ])
}

/// Records what the entry points route to it.
#[derive(Default)]
struct RecordingAdapter {
    reads: RefCell<Vec<PathBuf>>,
    writes: RefCell<Vec<PathBuf>>,
}

impl ImageAdapter for RecordingAdapter {
    fn read(&self, path: &Path) -> anyhow::Result<(Volume, IjkToRas)> {
        self.reads.borrow_mut().push(path.to_path_buf());
        Ok((Volume::new([1, 1, 1], vec![7u8])?, IjkToRas::identity()))
    }

    fn write(&self, _volume: &Volume, _transform: &IjkToRas, path: &Path) -> anyhow::Result<()> {
        self.writes.borrow_mut().push(path.to_path_buf());
        Ok(())
    }
}

#[test]
fn save_then_open_native() {
    let path = temp_path("native", "jvol");
    let volume = ct_like_volume();

    save(&volume, &transform(), &path, &NoAdapter, &SaveOptions::default()).unwrap();
    let (decoded, t) = open(&path, &NoAdapter).unwrap();

    assert_eq!(decoded.shape(), volume.shape());
    assert_eq!(decoded.dtype(), volume.dtype());
    assert_eq!(t, transform());

    // Flat regions of air come back close to the original value.
    let air = decoded.get_f64([0, 0, 0]).unwrap();
    assert!((air + 1000.0).abs() < 50.0, "air decoded as {air}");

    let raw_bytes = volume.len() * volume.dtype().size();
    let file_bytes = std::fs::metadata(&path).unwrap().len() as usize;
    assert!(file_bytes < raw_bytes, "file {file_bytes} bytes, raw {raw_bytes}");

    std::fs::remove_file(&path).ok();
}

#[test]
fn lossless_settings_round_trip_exactly() {
    let volume = ct_like_volume();
    let options = SaveOptions {
        block_size: 1,
        quality: 100,
        codec_id: CODEC_LZ4,
    };
    let bytes = write_jvol(&volume, &transform(), &options).unwrap();
    let (decoded, t) = read_jvol(&bytes).unwrap();
    assert_eq!(decoded, volume);
    assert_eq!(t, transform());
}

#[test]
fn float_volume_keeps_dtype() {
    let volume =
        Volume::from_fn([5, 6, 7], |i, j, k| (i as f32 * 0.25) - (j * k) as f32 * 0.01).unwrap();
    let options = SaveOptions {
        codec_id: CODEC_PASSTHROUGH,
        ..SaveOptions::default()
    };
    let bytes = write_jvol(&volume, &IjkToRas::identity(), &options).unwrap();
    let (decoded, _) = read_jvol(&bytes).unwrap();
    assert_eq!(decoded.shape(), [5, 6, 7]);
    assert!(decoded.as_slice::<f32>().is_some());
}

#[test]
fn other_extensions_go_to_adapter() {
    let adapter = RecordingAdapter::default();
    let volume = ct_like_volume();

    save(&volume, &transform(), "out/scan.nii.gz", &adapter, &SaveOptions::default()).unwrap();
    let (read_back, _) = open("in/scan.nrrd", &adapter).unwrap();

    assert_eq!(adapter.writes.borrow().as_slice(), &[PathBuf::from("out/scan.nii.gz")]);
    assert_eq!(adapter.reads.borrow().as_slice(), &[PathBuf::from("in/scan.nrrd")]);
    assert_eq!(read_back.get_f64([0, 0, 0]), Some(7.0));
}

#[test]
fn no_adapter_rejects_foreign_paths() {
    let err = open("scan.nii.gz", &NoAdapter).unwrap_err().to_string();
    assert!(err.contains("no image adapter"), "got: {err}");
    let options = SaveOptions::default();
    assert!(save(&ct_like_volume(), &transform(), "scan.mha", &NoAdapter, &options).is_err());
}

#[test]
fn explicit_native_calls_ignore_extension() {
    let path = temp_path("explicit", "bin");
    assert!(!is_jvol_path(&path));
    let volume = Volume::new([2, 2, 2], vec![0u32, 1, 2, 3, 4, 5, 6, 7]).unwrap();
    let options = SaveOptions {
        block_size: 1,
        quality: 100,
        ..SaveOptions::default()
    };
    save_jvol(&volume, &IjkToRas::identity(), &path, &options).unwrap();
    assert_eq!(open_jvol(&path).unwrap().0, volume);
    std::fs::remove_file(&path).ok();
}

#[test]
fn invalid_quality_writes_nothing() {
    let path = temp_path("bad_quality", "jvol");
    std::fs::remove_file(&path).ok();

    let options = SaveOptions {
        quality: 0,
        ..SaveOptions::default()
    };
    let err = save(&ct_like_volume(), &transform(), &path, &NoAdapter, &options).unwrap_err();
    assert_eq!(err.downcast_ref::<JvolError>(), Some(&JvolError::InvalidQuality(0)));
    assert!(!path.exists());
}

#[test]
fn zero_block_size_is_a_usage_error() {
    let options = SaveOptions {
        block_size: 0,
        ..SaveOptions::default()
    };
    let err = write_jvol(&ct_like_volume(), &transform(), &options).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<JvolError>(),
        Some(JvolError::InvalidBlockShape([0, 0, 0]))
    ));
}

#[test]
fn unknown_codec_is_rejected() {
    let options = SaveOptions {
        codec_id: 77,
        ..SaveOptions::default()
    };
    assert!(write_jvol(&ct_like_volume(), &transform(), &options).is_err());
}

#[test]
fn garbage_is_not_decoded() {
    assert!(read_jvol(b"definitely not a volume").is_err());
}
