pub mod app_config;
pub mod condition;
pub mod config;
pub mod message;
pub mod rank;
pub mod state;
pub mod targets;
pub mod transition;

use thiserror::Error;

pub use app_config::AppConfig;
pub use condition::{
    price_signature, Deal, DiscoveredItem, ObservedCondition, Observation, SignalOutcome,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use rank::{compute_discount, rank_deals};
pub use state::PersistedState;
pub use targets::{
    load_targets, parse_targets, sanitize_target_key, TargetConfig, TargetEntry, TargetKind, TargetsFile,
};
pub use transition::{decide, Transition, TransitionKind, TransitionPolicy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read targets file {path}: {source}")]
    TargetsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse targets file: {0}")]
    TargetsFileParse(#[source] serde_yaml::Error),

    #[error("invalid target config: {0}")]
    Validation(String),
}
