//! Process diagnostics.
//!
//! # Responsibilities
//! - Install the `tracing` subscriber used for startup, reload and shutdown events
//! - Pick the output profile from the runtime environment
//!
//! # Design Decisions
//! - JSON format for production, human-readable format for `local`
//! - Filter from `RUST_LOG` when set, otherwise the configured level
//! - Idempotent: only the first call installs a subscriber

use std::sync::Once;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::env::RuntimeSettings;

/// Output profile of the diagnostics subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output
    Local,
    /// One JSON object per line
    Production,
    /// No output; tests install their own subscriber if they need one
    Test,
}

impl Profile {
    pub fn from_settings(settings: &RuntimeSettings) -> Self {
        if settings.local {
            Profile::Local
        } else {
            Profile::Production
        }
    }
}

static INIT_ONCE: Once = Once::new();

/// Install the global subscriber. Later calls are no-ops.
pub fn init(profile: Profile, settings: &RuntimeSettings) {
    let default_directive = format!("correlog={},tower_http=info", settings.level);
    INIT_ONCE.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive));
        let registry = tracing_subscriber::registry().with(filter);
        // try_init: an embedding application may already own the global subscriber
        let _ = match profile {
            Profile::Local => registry.with(tracing_subscriber::fmt::layer()).try_init(),
            Profile::Production => registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init(),
            Profile::Test => tracing_subscriber::registry().try_init(),
        };
    });
}
