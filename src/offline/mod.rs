//! On-device map data for the offline variant.

pub mod assets;
pub mod layout;
pub mod store;

pub use assets::{seed_assets, SeedReport};
pub use layout::OfflineLayout;
pub use store::{MapDataStoreConfig, OnDiskMapDataStore, UpdateConfig};

use crate::api::MapDataStore;
use crate::config::Config;
use crate::error::Error;

/// Seeds bundled map data, then opens the store with updates enabled.
/// Any failure here is fatal to the offline variant.
#[tracing::instrument(skip(config))]
pub fn bootstrap(config: &Config) -> Result<OnDiskMapDataStore, Error> {
    let layout = OfflineLayout::new(&config.offline.base_dir);
    let bundle = config.offline.asset_dir.join(layout::ONBOARD_DIR);

    let report = seed_assets(&bundle, layout.root())?;
    tracing::info!(
        copied = report.copied,
        skipped = report.skipped,
        "seeded offline map data"
    );

    let store = OnDiskMapDataStore::open(MapDataStoreConfig::new(&layout, config)?)?;
    store.set_updates_enabled(true);

    Ok(store)
}

#[test]
fn bootstrap_seeds_and_opens_store() {
    use std::fs;

    let assets = tempfile::tempdir().unwrap();
    let data = tempfile::tempdir().unwrap();

    fs::create_dir_all(assets.path().join("onboard/map")).unwrap();
    fs::write(assets.path().join("onboard/map/ROOT.NDS"), b"nds").unwrap();
    fs::write(assets.path().join("onboard/keystore.sqlite"), b"keys").unwrap();

    let mut config = Config::offline();
    config.offline.asset_dir = assets.path().into();
    config.offline.base_dir = data.path().into();
    config.offline.map_license = Some("license".into());

    let store = bootstrap(&config).unwrap();

    assert!(store.updates_enabled());
    assert!(data.path().join("onboard/map/ROOT.NDS").is_file());
    assert!(data.path().join("onboard/updates").is_dir());
    assert!(data.path().join("onboard/mapUpdatePersistence").is_dir());
}
