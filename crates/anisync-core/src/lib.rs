pub mod error;
pub mod filter;
pub mod id_lookup;
pub mod id_resolver;
pub mod mapping;
pub mod mapping_store;
pub mod matching;
pub mod reconcile;
pub mod side_story;
pub mod sync;
pub mod traversal;
pub mod update;

#[cfg(test)]
mod testing;

pub use error::{MappingError, SyncError};
pub use id_lookup::{identify, IdBridge, Identification};
pub use id_resolver::{AniDbMatch, IdentityResolver, ResolutionTier};
pub use mapping::{DefaultSeason, EpisodeRange, MappingEntry, MappingTable};
pub use mapping_store::MappingStore;
pub use reconcile::{
    plan, ListState, NoOpReason, PlannedUpdate, ReconcileContext, ReconciliationDecision,
    RewatchCount,
};
pub use sync::{RunSkip, ServiceDecision, ServiceOutcome, SyncOrchestrator, SyncReport};
pub use update::{AppliedUpdate, UpdateExecutor};
