//! Domain-level building blocks shared by the Chef wire codecs.
//!
//! Value types live in [`model`], environment loading in [`config`] and the
//! tracing bootstrap in [`services::telemetry`]. Nothing here touches the
//! network or parses wire formats; that is the job of `chef_wire_codec`.

pub mod config;
pub mod model;
pub mod services;

pub use config::{ClientConfig, ConfigError};
pub use model::*;
