//! Picks the cookbook wire format once per client, based on the server's
//! reported version.

mod cookbook;
mod source;

use std::collections::BTreeSet;

use chef_wire_domain::config::ClientConfig;
use metrics::counter;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::{record_failure, CodecError, CodecResult};

pub use source::{
    ConfiguredVersionSource, HttpVersionSource, StaticVersionSource, VersionSource,
};

/// First server generation that serves the object-of-objects cookbook shape.
pub const MODERN_THRESHOLD: u32 = 10;

/// `major.minor` pair reported by a Chef server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerVersion {
    major: u32,
    minor: u32,
}

impl ServerVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Reads the first `major.minor[.patch]` token found in `text`.
    pub fn parse(text: &str) -> CodecResult<Self> {
        text.char_indices()
            .filter(|(at, c)| {
                c.is_ascii_digit() && !text[..*at].ends_with(|p: char| p.is_ascii_digit())
            })
            .find_map(|(at, _)| leading_pair(&text[at..]))
            .map(|(major, minor)| Self::new(major, minor))
            .ok_or_else(|| {
                CodecError::VersionResolution(format!("no version number in `{}`", text.trim()))
            })
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    /// Pre-1.0 servers count generations in the minor component
    /// (`0.9.x`, `0.10.x`); later ones in the major.
    pub fn generation(&self) -> u32 {
        if self.major == 0 {
            self.minor
        } else {
            self.major
        }
    }
}

fn leading_pair(text: &str) -> Option<(u32, u32)> {
    let (major, rest) = leading_number(text)?;
    let (minor, _) = leading_number(rest.strip_prefix('.')?)?;
    Some((major, minor))
}

fn leading_number(text: &str) -> Option<(u32, &str)> {
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let value = text[..end].parse().ok()?;
    Some((value, &text[end..]))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    V09,
    V10,
}

impl WireFormat {
    pub fn for_version(version: ServerVersion) -> Self {
        if version.generation() >= MODERN_THRESHOLD {
            Self::V10
        } else {
            Self::V09
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V09 => "v09",
            Self::V10 => "v10",
        }
    }

    pub fn decode_cookbook_names(&self, body: &str) -> CodecResult<BTreeSet<String>> {
        match self {
            Self::V09 => cookbook::legacy_names(body),
            Self::V10 => cookbook::modern_names(body),
        }
    }

    pub fn decode_cookbook_versions(&self, body: &str) -> CodecResult<BTreeSet<String>> {
        match self {
            Self::V09 => cookbook::legacy_versions(body),
            Self::V10 => cookbook::modern_versions(body),
        }
    }
}

/// Resolves the wire format on first use and keeps it for the gate's lifetime.
///
/// Concurrent first callers wait on a single lookup. A failed lookup leaves
/// the gate unresolved so the next call asks the source again.
pub struct VersionGate<S> {
    source: S,
    format: OnceCell<WireFormat>,
}

impl<S: VersionSource> VersionGate<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            format: OnceCell::new(),
        }
    }

    pub async fn wire_format(&self) -> CodecResult<WireFormat> {
        self.format
            .get_or_try_init(|| self.resolve())
            .await
            .copied()
    }

    /// The cached decision, if a lookup already succeeded.
    pub fn resolved(&self) -> Option<WireFormat> {
        self.format.get().copied()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    async fn resolve(&self) -> CodecResult<WireFormat> {
        match self.source.server_version().await {
            Ok(version) => {
                let format = WireFormat::for_version(version);
                counter!("chef_version_resolutions_total", "result" => "resolved").increment(1);
                debug!(
                    major = version.major(),
                    minor = version.minor(),
                    format = format.as_str(),
                    "server version resolved"
                );
                Ok(format)
            }
            Err(err) => {
                counter!("chef_version_resolutions_total", "result" => "failed").increment(1);
                warn!(%err, "server version lookup failed");
                record_failure(&err);
                Err(err)
            }
        }
    }
}

/// Client-side entry point for cookbook listings; each instance owns its
/// own version gate.
pub struct CookbookClient<S> {
    gate: VersionGate<S>,
}

impl CookbookClient<ConfiguredVersionSource> {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(ConfiguredVersionSource::from_config(config))
    }
}

impl<S: VersionSource> CookbookClient<S> {
    pub fn new(source: S) -> Self {
        Self {
            gate: VersionGate::new(source),
        }
    }

    pub fn gate(&self) -> &VersionGate<S> {
        &self.gate
    }

    pub async fn cookbook_names(&self, body: &str) -> CodecResult<BTreeSet<String>> {
        self.gate.wire_format().await?.decode_cookbook_names(body)
    }

    pub async fn cookbook_versions(&self, body: &str) -> CodecResult<BTreeSet<String>> {
        self.gate.wire_format().await?.decode_cookbook_versions(body)
    }
}
