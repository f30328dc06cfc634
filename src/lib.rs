pub mod config;
pub mod models;
pub mod pipeline;
pub mod care_tip_cache;

use tracing_subscriber::EnvFilter;

pub use care_tip_cache::{
    CacheError, CareTipCache, CareTipKey, FileCareTipCache, InMemoryCareTipCache, SessionId,
};
pub use models::{Answer, AnswerValue, ComposedResponse, SeverityScore};
pub use pipeline::deferred::{DeferredCareTips, DeferredError};
pub use pipeline::follow_up::{FollowUpReply, FollowUpTopic};
pub use pipeline::orchestrator::{CareTipService, PollStatus};

/// Install the global `tracing` subscriber. `RUST_LOG` wins over the
/// default filter. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let initialized = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if initialized {
        tracing::info!("{} care tip pipeline v{}", config::APP_NAME, config::APP_VERSION);
    }
}
