pub mod routing_api;

pub use routing_api::OnlineRoutePlanner;
