use futures::future::{self, Either};
use std::sync::Arc;

use wayfinder::api::DynMapDataStore;
use wayfinder::config::{Config, Variant};
use wayfinder::entities::GeoPoint;
use wayfinder::offline;
use wayfinder::simulation::Executor;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    let store: Option<DynMapDataStore> = match config.variant {
        Variant::Online => None,
        Variant::Offline => match offline::bootstrap(&config) {
            Ok(store) => Some(Arc::new(store)),
            Err(err) => {
                tracing::error!("offline map data unavailable: {}", err);
                std::process::exit(1);
            }
        },
    };

    let executor = match Executor::new(config, store) {
        Ok(executor) => executor,
        Err(err) => {
            tracing::error!("cannot start session: {}", err);
            std::process::exit(1);
        }
    };

    let origin = GeoPoint::new(52.3676, 4.9041);
    let destination = GeoPoint::new(52.3731, 4.8922);

    let session = Box::pin(executor.run(origin, destination));
    let interrupt = Box::pin(tokio::signal::ctrl_c());

    match future::select(session, interrupt).await {
        Either::Left((Ok(report), _)) => tracing::info!(
            length = report.route_length,
            travelled = report.travelled,
            "session finished"
        ),
        Either::Left((Err(err), _)) => {
            tracing::error!("session failed: {}", err);
            std::process::exit(1);
        }
        Either::Right(_) => tracing::info!("interrupted"),
    }
}
