pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{
    BridgeConfig, Config, MappingConfig, SearchConfig, ServiceConfig, ServiceKind, SyncOptions,
    UserConfig, DEFAULT_BRIDGE_URL, DEFAULT_MAPPING_URL,
};
pub use credentials::{CredentialStore, ServiceToken};
pub use paths::{container_base_path, PathManager};
