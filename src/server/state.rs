use crate::maps::{MapsResolver, SharedBackend};

pub struct AppState {
    pub resolver: MapsResolver<SharedBackend>,
}
