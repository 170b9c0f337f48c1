//! The reconciliation pipeline stages.
//!
//! Identity resolution, collection, merge, ranking, enrichment and
//! aggregation are separate modules so the pure stages (merge, ranking,
//! gap detection, aggregation) can be tested without any I/O.

pub mod aggregate;
pub mod collect;
pub mod enrich;
pub mod gaps;
pub mod merge;
pub mod rank;
pub mod resolve;

pub use aggregate::{DiscoveryStats, VerificationStrength};
pub use collect::{
    collect_by_identity, collect_by_name_search, collect_from_all_pros, collect_from_pro,
    Collected, PAGE_SIZE,
};
pub use enrich::{enrich_all, enrich_candidate, EnrichmentContext};
pub use gaps::detect_gaps;
pub use merge::{iswc_key, merge_candidates, title_key, CandidateSet};
pub use rank::select_top;
pub use resolve::resolve_identity;
