//! Endpoints and reconnection target selection

pub mod selector;
pub mod types;

pub use selector::{load_score, EndpointSelector};
pub use types::{
    EndpointCandidate, EndpointId, EndpointPreference, EndpointQuery, Region, RegionPreference,
    SelectionMode,
};
