pub mod api;
pub mod config;
pub mod controller;
pub mod entities;
pub mod error;
pub mod external;
pub mod headless;
pub mod location;
pub mod offline;

pub mod simulation;

mod listeners;
