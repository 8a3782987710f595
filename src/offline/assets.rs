use std::fs;
use std::path::Path;

use crate::error::{asset_copy_error, Error};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub copied: usize,
    pub skipped: usize,
}

/// Copies every file under `bundle` into `target`, keeping relative
/// paths. Files already present in `target` are never overwritten.
pub fn seed_assets(bundle: &Path, target: &Path) -> Result<SeedReport, Error> {
    let mut report = SeedReport::default();

    if !bundle.is_dir() {
        tracing::warn!("no bundled assets at {}", bundle.display());
        return Ok(report);
    }

    copy_dir(bundle, target, &mut report)?;
    Ok(report)
}

fn copy_dir(from: &Path, to: &Path, report: &mut SeedReport) -> Result<(), Error> {
    let entries = fs::read_dir(from).map_err(asset_copy_error)?;

    for entry in entries {
        let entry = entry.map_err(asset_copy_error)?;
        let source = entry.path();
        let destination = to.join(entry.file_name());

        if source.is_dir() {
            copy_dir(&source, &destination, report)?;
            continue;
        }

        if destination.exists() {
            tracing::debug!("keeping existing {}", destination.display());
            report.skipped += 1;
            continue;
        }

        fs::create_dir_all(to).map_err(asset_copy_error)?;
        fs::copy(&source, &destination).map_err(asset_copy_error)?;
        report.copied += 1;
    }

    Ok(())
}

#[test]
fn copies_tree_without_overwriting() {
    let bundle = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();

    fs::create_dir_all(bundle.path().join("map/tiles")).unwrap();
    fs::write(bundle.path().join("map/ROOT.NDS"), b"bundled").unwrap();
    fs::write(bundle.path().join("map/tiles/0.bin"), b"tile").unwrap();
    fs::write(bundle.path().join("keystore.sqlite"), b"bundled").unwrap();

    fs::write(target.path().join("keystore.sqlite"), b"existing").unwrap();

    let report = seed_assets(bundle.path(), target.path()).unwrap();

    assert_eq!(report, SeedReport { copied: 2, skipped: 1 });
    assert_eq!(
        fs::read(target.path().join("keystore.sqlite")).unwrap(),
        b"existing"
    );
    assert_eq!(fs::read(target.path().join("map/tiles/0.bin")).unwrap(), b"tile");

    let again = seed_assets(bundle.path(), target.path()).unwrap();
    assert_eq!(again, SeedReport { copied: 0, skipped: 3 });
}

#[test]
fn missing_bundle_copies_nothing() {
    let target = tempfile::tempdir().unwrap();
    let report = seed_assets(&target.path().join("absent"), target.path()).unwrap();

    assert_eq!(report, SeedReport::default());
}

#[test]
fn blocked_target_reports_copy_error() {
    let bundle = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();

    fs::create_dir_all(bundle.path().join("map")).unwrap();
    fs::write(bundle.path().join("map/ROOT.NDS"), b"bundled").unwrap();
    // a plain file where the map directory should go
    fs::write(target.path().join("map"), b"in the way").unwrap();

    let err = seed_assets(bundle.path(), target.path()).unwrap_err();

    assert!(err.is_asset_copy_error());
    assert!(err.is_fatal());
}
