use chrono::{DateTime, Duration, Utc};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::OfflineLayout;
use crate::api::MapDataStore;
use crate::config::Config;
use crate::entities::GeoPoint;
use crate::error::{invalid_input_error, Error};
use crate::listeners::lock;

#[derive(Clone, Debug, PartialEq)]
pub struct UpdateConfig {
    pub update_storage_path: PathBuf,
    pub persistent_storage_path: PathBuf,
    pub relevant_regions_enabled: bool,
    /// Kilometers around the vehicle kept up to date.
    pub relevant_regions_radius: f64,
    pub relevant_regions_update_interval: Duration,
    pub update_server_url: String,
    pub update_server_api_key: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MapDataStoreConfig {
    pub store_path: PathBuf,
    pub keystore_path: PathBuf,
    pub map_license: String,
    pub update: UpdateConfig,
}

impl MapDataStoreConfig {
    pub fn new(layout: &OfflineLayout, config: &Config) -> Result<Self, Error> {
        let offline = &config.offline;

        let map_license = match &offline.map_license {
            Some(license) if !license.is_empty() => license.clone(),
            _ => {
                tracing::warn!("offline map data needs a map license");
                return Err(invalid_input_error());
            }
        };

        Ok(Self {
            store_path: layout.store_path(),
            keystore_path: layout.keystore_path(),
            map_license,
            update: UpdateConfig {
                update_storage_path: layout.update_storage_path(),
                persistent_storage_path: layout.update_persistence_path(),
                relevant_regions_enabled: offline.relevant_regions_enabled,
                relevant_regions_radius: offline.relevant_regions_radius_km,
                relevant_regions_update_interval: Duration::minutes(
                    offline.relevant_regions_update_interval_minutes as i64,
                ),
                update_server_url: offline.update_server_url.clone(),
                update_server_api_key: config.api_key.clone(),
            },
        })
    }
}

struct Inner {
    updates_enabled: bool,
    position: Option<GeoPoint>,
    last_refresh: Option<(GeoPoint, DateTime<Utc>)>,
    refreshes: usize,
}

/// Map data kept on disk. Tracks the vehicle position and decides when
/// the regions around it are due for an update.
#[derive(Clone)]
pub struct OnDiskMapDataStore {
    config: Arc<MapDataStoreConfig>,
    inner: Arc<Mutex<Inner>>,
}

impl OnDiskMapDataStore {
    /// Opens the store, creating the update directories when missing.
    pub fn open(config: MapDataStoreConfig) -> Result<Self, Error> {
        fs::create_dir_all(&config.store_path)?;
        fs::create_dir_all(&config.update.update_storage_path)?;
        fs::create_dir_all(&config.update.persistent_storage_path)?;

        tracing::info!("opened map data store at {}", config.store_path.display());

        Ok(Self {
            config: Arc::new(config),
            inner: Arc::new(Mutex::new(Inner {
                updates_enabled: false,
                position: None,
                last_refresh: None,
                refreshes: 0,
            })),
        })
    }

    pub fn config(&self) -> &MapDataStoreConfig {
        &self.config
    }

    pub fn updates_enabled(&self) -> bool {
        lock(&self.inner).updates_enabled
    }

    pub fn position(&self) -> Option<GeoPoint> {
        lock(&self.inner).position
    }

    /// Relevant-region updates scheduled so far.
    pub fn refreshes(&self) -> usize {
        lock(&self.inner).refreshes
    }

    fn record_position(&self, position: GeoPoint, now: DateTime<Utc>) {
        let update = &self.config.update;
        let mut inner = lock(&self.inner);
        inner.position = Some(position);

        if !inner.updates_enabled || !update.relevant_regions_enabled {
            return;
        }

        let due = match inner.last_refresh {
            None => true,
            Some((center, at)) => {
                center.distance_to(&position) > update.relevant_regions_radius * 1000.0
                    || now - at >= update.relevant_regions_update_interval
            }
        };

        if due {
            inner.last_refresh = Some((position, now));
            inner.refreshes += 1;
            tracing::info!(
                latitude = position.latitude,
                longitude = position.longitude,
                "scheduling relevant region update from {}",
                update.update_server_url
            );
        }
    }
}

impl MapDataStore for OnDiskMapDataStore {
    fn update_position(&self, position: GeoPoint) {
        self.record_position(position, Utc::now());
    }

    fn set_updates_enabled(&self, enabled: bool) {
        lock(&self.inner).updates_enabled = enabled;
    }
}

#[cfg(test)]
fn open_in(dir: &std::path::Path) -> OnDiskMapDataStore {
    let mut config = Config::offline();
    config.offline.map_license = Some("license".into());

    let layout = OfflineLayout::new(dir);
    OnDiskMapDataStore::open(MapDataStoreConfig::new(&layout, &config).unwrap()).unwrap()
}

#[test]
fn config_requires_license() {
    let layout = OfflineLayout::new("/data");
    let err = MapDataStoreConfig::new(&layout, &Config::offline()).unwrap_err();

    assert_eq!(err, invalid_input_error());
}

#[test]
fn config_carries_update_settings() {
    let mut config = Config::offline();
    config.offline.map_license = Some("license".into());
    config.api_key = Some("key".into());

    let store_config = MapDataStoreConfig::new(&OfflineLayout::new("/data"), &config).unwrap();

    assert_eq!(store_config.update.relevant_regions_radius, 20.0);
    assert_eq!(
        store_config.update.relevant_regions_update_interval,
        Duration::minutes(60)
    );
    assert_eq!(store_config.update.update_server_api_key.as_deref(), Some("key"));
}

#[test]
fn refreshes_when_leaving_radius_or_after_interval() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_in(dir.path());
    let start = Utc::now();
    let home = GeoPoint::new(52.0, 4.0);

    store.record_position(home, start);
    assert_eq!(store.refreshes(), 0);

    store.set_updates_enabled(true);
    store.record_position(home, start);
    store.record_position(GeoPoint::new(52.1, 4.0), start + Duration::minutes(5));
    assert_eq!(store.refreshes(), 1);

    // ~22 km north
    store.record_position(GeoPoint::new(52.2, 4.0), start + Duration::minutes(10));
    assert_eq!(store.refreshes(), 2);

    store.record_position(GeoPoint::new(52.2, 4.0), start + Duration::minutes(75));
    assert_eq!(store.refreshes(), 3);
    assert_eq!(store.position(), Some(GeoPoint::new(52.2, 4.0)));
}
