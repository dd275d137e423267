//! Maps Unshort — expand Google Maps short links into coordinates and addresses.

pub mod config;
pub mod extract;
pub mod maps;
pub mod server;

pub use extract::{extract, is_google_maps_url, Coordinates, Pattern};
