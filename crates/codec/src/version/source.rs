use async_trait::async_trait;
use chef_wire_domain::config::ClientConfig;
use reqwest::Client;
use tracing::debug;

use super::ServerVersion;
use crate::error::{CodecError, CodecResult};

/// Anything that can tell which Chef server generation sits on the other end.
#[async_trait]
pub trait VersionSource: Send + Sync {
    async fn server_version(&self) -> CodecResult<ServerVersion>;
}

/// Version pinned through configuration; no network round-trip.
#[derive(Debug, Clone)]
pub struct StaticVersionSource {
    raw: String,
}

impl StaticVersionSource {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

#[async_trait]
impl VersionSource for StaticVersionSource {
    async fn server_version(&self) -> CodecResult<ServerVersion> {
        ServerVersion::parse(&self.raw)
    }
}

/// Asks the server itself with one GET against its version endpoint.
#[derive(Debug, Clone)]
pub struct HttpVersionSource {
    client: Client,
    url: String,
}

impl HttpVersionSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), url)
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl VersionSource for HttpVersionSource {
    async fn server_version(&self) -> CodecResult<ServerVersion> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CodecError::VersionResolution(format!(
                "{} answered {status}",
                self.url
            )));
        }

        let body = response.text().await?;
        debug!(url = %self.url, "fetched server version document");
        ServerVersion::parse(&body)
    }
}

/// Source chosen from [`ClientConfig`]: a pinned API version wins over
/// discovery.
#[derive(Debug, Clone)]
pub enum ConfiguredVersionSource {
    Static(StaticVersionSource),
    Http(HttpVersionSource),
}

impl ConfiguredVersionSource {
    pub fn from_config(config: &ClientConfig) -> Self {
        match config.api_version() {
            Some(version) => Self::Static(StaticVersionSource::new(version)),
            None => Self::Http(HttpVersionSource::new(config.version_url())),
        }
    }
}

#[async_trait]
impl VersionSource for ConfiguredVersionSource {
    async fn server_version(&self) -> CodecResult<ServerVersion> {
        match self {
            Self::Static(source) => source.server_version().await,
            Self::Http(source) => source.server_version().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await.unwrap();
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        });
        format!("http://{addr}/version")
    }

    #[tokio::test]
    async fn static_source_parses_configured_version() {
        let source = StaticVersionSource::new("0.9.12");
        assert_eq!(source.server_version().await.unwrap().generation(), 9);
    }

    #[tokio::test]
    async fn http_source_reads_version_body() {
        let url = serve_once("200 OK", "Chef Server 11.1.3\n").await;
        let source = HttpVersionSource::new(url);
        assert_eq!(source.server_version().await.unwrap().generation(), 11);
    }

    #[tokio::test]
    async fn http_source_surfaces_error_status() {
        let url = serve_once("503 Service Unavailable", "").await;
        let err = HttpVersionSource::new(url)
            .server_version()
            .await
            .unwrap_err();
        assert!(matches!(err, CodecError::VersionResolution(message) if message.contains("503")));
    }

    #[tokio::test]
    async fn http_source_surfaces_transport_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = HttpVersionSource::new(format!("http://{addr}/version"))
            .server_version()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "version_resolution");
    }

    #[test]
    fn configuration_prefers_pinned_version() {
        let pinned = ClientConfig::new("https://chef.example.com").with_api_version("0.10.8");
        assert!(matches!(
            ConfiguredVersionSource::from_config(&pinned),
            ConfiguredVersionSource::Static(_)
        ));

        let discovered = ClientConfig::new("https://chef.example.com/");
        match ConfiguredVersionSource::from_config(&discovered) {
            ConfiguredVersionSource::Http(source) => {
                assert_eq!(source.url(), "https://chef.example.com/version")
            }
            other => panic!("unexpected source: {other:?}"),
        }
    }
}
