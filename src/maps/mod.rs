//! Google Maps link subsystem.
//!
//! Resolves short links, pulls coordinates out of the expanded URL, and
//! optionally turns them into an address. Also offers free-text place search.

pub mod language;
pub mod providers;
pub mod resolver;
pub mod types;

pub use language::Language;
pub use providers::{HttpBackend, MapsBackend, SharedBackend};
pub use resolver::MapsResolver;
pub use types::{
    reshape_address, Address, AddressResult, ExpandError, ExpandErrorBody, Expansion, LookupError,
    Mode, PlaceSearchResult, RawLocationData, SearchError, SearchErrorBody,
};
