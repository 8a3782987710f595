use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::entities::{Padding, Vehicle};
use crate::error::{invalid_input_error, Error};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Online,
    Offline,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub variant: Variant,
    pub api_key: Option<String>,
    pub routing_api_base: String,
    pub vehicle: Vehicle,
    /// Zoom used when centering on the first location fix.
    pub initial_zoom: f64,
    /// Pixels kept free around routes when framing them.
    pub route_padding: u32,
    /// Bottom inset during guidance, in density-independent units.
    pub navigation_padding_bottom: u32,
    pub display_density: f64,
    /// Meters per second.
    pub simulation_speed: f64,
    pub simulation_tick_ms: u64,
    pub simulation_time_scale: f64,
    /// Standard deviation of simulated position noise, in meters.
    pub simulation_jitter: f64,
    pub offline: OfflineConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    /// Directory the on-device data tree is created in.
    pub base_dir: PathBuf,
    /// Bundled map data copied into `base_dir` on first start.
    pub asset_dir: PathBuf,
    pub map_license: Option<String>,
    pub update_server_url: String,
    pub relevant_regions_enabled: bool,
    pub relevant_regions_radius_km: f64,
    pub relevant_regions_update_interval_minutes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            variant: Variant::Online,
            api_key: None,
            routing_api_base: "api.tomtom.com".into(),
            vehicle: Vehicle::Car,
            initial_zoom: 8.0,
            route_padding: 100,
            navigation_padding_bottom: 263,
            display_density: 1.0,
            simulation_speed: 30.0,
            simulation_tick_ms: 1000,
            simulation_time_scale: 1.0,
            simulation_jitter: 0.0,
            offline: OfflineConfig::default(),
        }
    }
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("data"),
            asset_dir: PathBuf::from("assets"),
            map_license: None,
            update_server_url: "https://api.tomtom.com/nds-test/updates/1/fetch".into(),
            relevant_regions_enabled: true,
            relevant_regions_radius_km: 20.0,
            relevant_regions_update_interval_minutes: 60,
        }
    }
}

impl Config {
    pub fn offline() -> Self {
        Self {
            variant: Variant::Offline,
            initial_zoom: 12.0,
            ..Self::default()
        }
    }

    pub fn from_json(data: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(data)?;
        config.validated()
    }

    /// Defaults overridden by `WAYFINDER_*` environment variables, with a
    /// `.env` file loaded first when present.
    #[tracing::instrument]
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();

        let mut config = match var("WAYFINDER_VARIANT")?.as_deref() {
            None | Some("online") => Self::default(),
            Some("offline") => Self::offline(),
            Some(other) => {
                tracing::warn!("unknown variant {:?}", other);
                return Err(invalid_input_error());
            }
        };

        config.api_key = var("WAYFINDER_API_KEY")?;

        if let Some(base) = var("WAYFINDER_ROUTING_API_BASE")? {
            config.routing_api_base = base;
        }
        if let Some(speed) = parsed_var("WAYFINDER_SIMULATION_SPEED")? {
            config.simulation_speed = speed;
        }
        if let Some(tick) = parsed_var("WAYFINDER_SIMULATION_TICK_MS")? {
            config.simulation_tick_ms = tick;
        }
        if let Some(scale) = parsed_var("WAYFINDER_SIMULATION_TIME_SCALE")? {
            config.simulation_time_scale = scale;
        }
        if let Some(density) = parsed_var("WAYFINDER_DISPLAY_DENSITY")? {
            config.display_density = density;
        }
        if let Some(dir) = var("WAYFINDER_OFFLINE_DIR")? {
            config.offline.base_dir = dir.into();
        }
        if let Some(dir) = var("WAYFINDER_ASSET_DIR")? {
            config.offline.asset_dir = dir.into();
        }
        config.offline.map_license = var("WAYFINDER_MAP_LICENSE")?;

        config.validated()
    }

    /// Real interval between simulated steps and the simulated time each
    /// step covers.
    pub fn simulation_timing(&self) -> Result<(Duration, Duration), Error> {
        let tick = Duration::from_millis(self.simulation_tick_ms);

        if tick.is_zero() || !self.simulation_time_scale.is_finite() {
            return Err(invalid_input_error());
        }

        let step = Duration::try_from_secs_f64(tick.as_secs_f64() * self.simulation_time_scale)
            .map_err(|_| invalid_input_error())?;

        Ok((tick, step))
    }

    fn validated(self) -> Result<Self, Error> {
        if let Err(err) = self.simulation_timing() {
            tracing::warn!(
                "simulation tick {}ms at scale {} is not usable",
                self.simulation_tick_ms,
                self.simulation_time_scale
            );
            return Err(err);
        }

        Ok(self)
    }

    /// Bottom inset applied while navigating, in pixels.
    pub fn navigation_padding(&self) -> Padding {
        Padding::bottom(self.navigation_padding_bottom).scaled(self.display_density)
    }
}

fn var(name: &str) -> Result<Option<String>, Error> {
    match env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, Error> {
    match var(name)? {
        Some(value) => value.parse().map(Some).map_err(|_| {
            tracing::warn!("{} is not a valid value: {:?}", name, value);
            invalid_input_error()
        }),
        None => Ok(None),
    }
}

#[test]
fn defaults_match_online_variant() {
    let config = Config::default();

    assert_eq!(config.variant, Variant::Online);
    assert_eq!(config.route_padding, 100);
    assert_eq!(config.initial_zoom, 8.0);
    assert_eq!(config.simulation_speed, 30.0);
    assert_eq!(Config::offline().initial_zoom, 12.0);
}

#[test]
fn json_overrides_only_given_fields() {
    let config = Config::from_json(
        r#"{ "variant": "offline", "display_density": 2.0, "offline": { "map_license": "abc" } }"#,
    )
    .unwrap();

    assert_eq!(config.variant, Variant::Offline);
    assert_eq!(config.navigation_padding(), Padding::bottom(526));
    assert_eq!(config.offline.map_license.as_deref(), Some("abc"));
    assert_eq!(config.offline.relevant_regions_radius_km, 20.0);
    assert!(Config::from_json("{ \"route_padding\": -1 }").is_err());
}

#[test]
fn unusable_simulation_timing_is_rejected() {
    for data in [
        r#"{ "simulation_tick_ms": 0 }"#,
        r#"{ "simulation_time_scale": 1e30 }"#,
        r#"{ "simulation_time_scale": -1.0 }"#,
    ] {
        let err = Config::from_json(data).unwrap_err();
        assert_eq!(err.code, invalid_input_error().code, "{}", data);
    }

    let mut config = Config::default();
    config.simulation_time_scale = f64::INFINITY;
    assert!(config.simulation_timing().is_err());

    config.simulation_time_scale = 0.0;
    let (tick, step) = config.simulation_timing().unwrap();
    assert_eq!(tick, Duration::from_secs(1));
    assert!(step.is_zero());
}
