// geomatch_service/src/lib.rs
//
// Geomatch engine: ranks care facilities for a patient location, either by
// plain great-circle distance or by a condition-aware match score. All
// queries are pure reads against the external facility catalog.

pub mod catalog;
pub mod conditions;
pub mod distance;
pub mod engine;

pub use catalog::{FacilityCatalog, InMemoryFacilityCatalog};
pub use engine::{CapabilityFilters, FacilityMatch, GeomatchEngine};
