//! Catalog discovery and reconciliation for repertoire.
//!
//! Resolves a songwriter against MusicBrainz, collects works from the
//! catalog and three PRO repertoires, merges and ranks them, enriches the
//! top candidates with attribution and registration gaps, and persists the
//! result. The whole run is exposed as a treadle `Stage`.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod discover;
pub mod engine;
pub mod error;
pub mod musicbrainz;
pub mod pipeline;
pub mod repertoire;
pub mod resilience;
pub mod services;
pub mod stage;
pub mod store;
pub mod verification;
pub mod wikipedia;
pub mod work_item;

pub use config::Config;
pub use engine::{
    DiscoveryEngine, DiscoveryOutcome, DiscoveryResponse, DiscoveryServices, DiscoverySettings,
    DiscoveryTrigger,
};
pub use error::{DiscoveryError, DiscoveryResult};
pub use pipeline::build_discovery_workflow;
pub use stage::DiscoveryStage;
pub use store::{DiscoveryStore, SqliteStore};
pub use work_item::DiscoveryJob;
