use std::num::NonZeroU32;

use serde::{ser::Error as _, Deserialize, Serialize, Serializer};
use serde_json::value::RawValue;
use thiserror::Error;

/// Errors emitted when a bootstrap configuration fails validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BootstrapConfigError {
    #[error("chef-client interval must be a positive number of seconds")]
    ZeroInterval,
    #[error("chef-client splay must be a positive number of seconds")]
    ZeroSplay,
    #[error("attributes must be a json object: {0}")]
    InvalidAttributes(String),
}

/// Describes how the nodes of a group bootstrap against the Chef server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BootstrapConfigWire")]
pub struct BootstrapConfig {
    run_list: Vec<String>,
    environment: Option<String>,
    attributes: Option<String>,
    interval: Option<NonZeroU32>,
    splay: Option<NonZeroU32>,
    daemonize: bool,
}

impl BootstrapConfig {
    pub fn builder() -> BootstrapConfigBuilder {
        BootstrapConfigBuilder::default()
    }

    pub fn run_list(&self) -> &[String] {
        &self.run_list
    }

    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    /// Raw JSON object text merged into the node's first-boot document.
    pub fn attributes(&self) -> Option<&str> {
        self.attributes.as_deref()
    }

    /// Seconds between periodic chef-client runs.
    pub fn interval(&self) -> Option<NonZeroU32> {
        self.interval
    }

    pub fn splay(&self) -> Option<NonZeroU32> {
        self.splay
    }

    pub fn daemonize(&self) -> bool {
        self.daemonize
    }
}

#[derive(Debug, Default, Clone)]
pub struct BootstrapConfigBuilder {
    run_list: Vec<String>,
    environment: Option<String>,
    attributes: Option<String>,
    interval: Option<u32>,
    splay: Option<u32>,
    daemonize: bool,
}

impl BootstrapConfigBuilder {
    /// Appends recipes and roles to the run list executed on the nodes.
    pub fn run_list<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_list.extend(entries.into_iter().map(Into::into));
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn attributes(mut self, attributes: impl Into<String>) -> Self {
        self.attributes = Some(attributes.into());
        self
    }

    pub fn interval(mut self, seconds: u32) -> Self {
        self.interval = Some(seconds);
        self
    }

    pub fn splay(mut self, seconds: u32) -> Self {
        self.splay = Some(seconds);
        self
    }

    /// Schedules a background chef-client run after the first foreground one.
    pub fn daemonize(mut self, daemonize: bool) -> Self {
        self.daemonize = daemonize;
        self
    }

    pub fn build(self) -> Result<BootstrapConfig, BootstrapConfigError> {
        let interval = positive(self.interval, BootstrapConfigError::ZeroInterval)?;
        let splay = positive(self.splay, BootstrapConfigError::ZeroSplay)?;
        if let Some(raw) = &self.attributes {
            serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(raw)
                .map_err(|err| BootstrapConfigError::InvalidAttributes(err.to_string()))?;
        }

        Ok(BootstrapConfig {
            run_list: self.run_list,
            environment: self.environment,
            attributes: self.attributes,
            interval,
            splay,
            daemonize: self.daemonize,
        })
    }
}

fn positive(
    value: Option<u32>,
    err: BootstrapConfigError,
) -> Result<Option<NonZeroU32>, BootstrapConfigError> {
    match value {
        None => Ok(None),
        Some(raw) => NonZeroU32::new(raw).map(Some).ok_or(err),
    }
}

// Stored form of the configuration inside the bootstrap data bag.
#[derive(Serialize, Deserialize)]
struct BootstrapConfigWire {
    #[serde(default)]
    run_list: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attributes: Option<Box<RawValue>>,
    #[serde(rename = "chef-client", default)]
    chef_client: ChefClientWire,
}

#[derive(Default, Serialize, Deserialize)]
struct ChefClientWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    splay: Option<u32>,
    #[serde(default)]
    daemonize: bool,
}

impl TryFrom<BootstrapConfigWire> for BootstrapConfig {
    type Error = BootstrapConfigError;

    fn try_from(wire: BootstrapConfigWire) -> Result<Self, Self::Error> {
        let mut builder = BootstrapConfig::builder()
            .run_list(wire.run_list)
            .daemonize(wire.chef_client.daemonize);
        if let Some(environment) = wire.environment {
            builder = builder.environment(environment);
        }
        if let Some(attributes) = wire.attributes {
            builder = builder.attributes(attributes.get());
        }
        if let Some(interval) = wire.chef_client.interval {
            builder = builder.interval(interval);
        }
        if let Some(splay) = wire.chef_client.splay {
            builder = builder.splay(splay);
        }
        builder.build()
    }
}

impl Serialize for BootstrapConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let attributes = self
            .attributes
            .clone()
            .map(RawValue::from_string)
            .transpose()
            .map_err(S::Error::custom)?;

        BootstrapConfigWire {
            run_list: self.run_list.clone(),
            environment: self.environment.clone(),
            attributes,
            chef_client: ChefClientWire {
                interval: self.interval.map(NonZeroU32::get),
                splay: self.splay.map(NonZeroU32::get),
                daemonize: self.daemonize,
            },
        }
        .serialize(serializer)
    }
}
