use std::path::{Path, PathBuf};

pub const ONBOARD_DIR: &str = "onboard";
const STORE_DIR: &str = "map";
const UPDATE_STORAGE_DIR: &str = "updates";
const UPDATE_PERSISTENCE_DIR: &str = "mapUpdatePersistence";
const KEYSTORE_FILE: &str = "keystore.sqlite";

/// Paths of the on-device data tree rooted at `<base>/onboard`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OfflineLayout {
    root: PathBuf,
}

impl OfflineLayout {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            root: base_dir.as_ref().join(ONBOARD_DIR),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store_path(&self) -> PathBuf {
        self.root.join(STORE_DIR)
    }

    pub fn update_storage_path(&self) -> PathBuf {
        self.root.join(UPDATE_STORAGE_DIR)
    }

    pub fn update_persistence_path(&self) -> PathBuf {
        self.root.join(UPDATE_PERSISTENCE_DIR)
    }

    pub fn keystore_path(&self) -> PathBuf {
        self.root.join(KEYSTORE_FILE)
    }
}

#[test]
fn paths_live_under_onboard() {
    let layout = OfflineLayout::new("/data");

    assert_eq!(layout.root(), Path::new("/data/onboard"));
    assert_eq!(layout.store_path(), Path::new("/data/onboard/map"));
    assert_eq!(layout.update_storage_path(), Path::new("/data/onboard/updates"));
    assert_eq!(
        layout.update_persistence_path(),
        Path::new("/data/onboard/mapUpdatePersistence")
    );
    assert_eq!(layout.keystore_path(), Path::new("/data/onboard/keystore.sqlite"));
}
