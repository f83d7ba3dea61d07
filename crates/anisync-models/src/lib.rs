pub mod catalog;
pub mod ids;
pub mod media;
pub mod status;
pub mod update;

pub use catalog::{AiringStatus, AlternativeTitles, CatalogEntry, Relation, RelationKind};
pub use ids::{CatalogSource, IdentifierBundle};
pub use media::{EpisodeItem, LocalSeason, MediaItem, MovieItem, ProviderIds, ProviderSource};
pub use status::{ListStatus, WatchStatus};
pub use update::{UpdateRequest, UpdateResult};
