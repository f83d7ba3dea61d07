pub mod anime_lists;
pub mod arm;
pub mod capabilities;
pub mod error;
pub mod factory;
pub mod paging;
pub mod traits;

pub use anime_lists::{AnimeListsClient, MappingFetcher};
pub use arm::{ArmClient, IdAggregator};
pub use capabilities::{RewatchStyle, ServiceCapabilities};
pub use error::SourceError;
pub use factory::{ServiceFactoryRegistry, TrackingServiceFactory};
pub use paging::{paginate_search, PageLimits};
pub use traits::{ServiceUser, TrackingService};
