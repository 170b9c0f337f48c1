pub mod attribution;
pub mod candidate;
pub mod discovered;
pub mod identity;
pub mod ids;
pub mod request;
pub mod source;

pub use attribution::{normalize_name, Attribution};
pub use candidate::{clean_iswc, ProDetail, RawWork, WorkCandidate};
pub use discovered::{
    DiscoveredWorkRow, ProRegistrations, RegistrationGap, VerificationStatus,
    COMPLETENESS_WITHOUT_ISWC, COMPLETENESS_WITH_ISWC, METADATA_COMPLETE_THRESHOLD,
};
pub use identity::{CareerOverview, SongwriterIdentity, DEFAULT_TERRITORY};
pub use ids::{DiscoveredWorkId, RequestId};
pub use request::{DiscoveryRequest, RequestCompletion, RequestStatus};
pub use source::{SourceStatus, SourceTag};
