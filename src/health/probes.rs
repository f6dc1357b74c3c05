//! Probe adapters for the concrete backing services
//!
//! - [`SqlProbe`]: round-trip `SELECT 1` on the relational database
//! - [`RespPingProbe`]: `PING` against the cache over the RESP protocol
//! - [`HttpProbe`]: GET against a document store's ping/health endpoint

use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::trace;

use super::probe::Probe;

/// Trivial query against a SQLite pool
#[cfg(feature = "sqlite")]
#[derive(Debug, Clone)]
pub struct SqlProbe {
    pool: sqlx::SqlitePool,
}

#[cfg(feature = "sqlite")]
impl SqlProbe {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    /// Build a probe on a lazily connected pool
    ///
    /// Connection problems surface on the first probe, not here.
    pub fn connect_lazy(url: &str) -> Result<Self> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect_lazy(url)
            .with_context(|| format!("invalid database url: {url}"))?;
        Ok(Self { pool })
    }
}

#[cfg(feature = "sqlite")]
#[async_trait]
impl Probe for SqlProbe {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("database round-trip failed")?;
        Ok(())
    }
}

/// Deadline for one exchange with a backing service unless configured otherwise
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// `PING` over a fresh TCP connection to a RESP speaking cache
#[derive(Debug, Clone)]
pub struct RespPingProbe {
    addr: String,
    /// Covers connect, write and reply together
    timeout: Duration,
}

impl RespPingProbe {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn exchange(&self) -> Result<()> {
        let stream = TcpStream::connect(&self.addr)
            .await
            .with_context(|| format!("failed to connect to {}", self.addr))?;

        let mut stream = BufReader::new(stream);
        stream
            .get_mut()
            .write_all(b"*1\r\n$4\r\nPING\r\n")
            .await
            .context("failed to send PING")?;

        let mut reply = String::new();
        stream
            .read_line(&mut reply)
            .await
            .context("failed to read PING reply")?;

        trace!("{}: PING reply {:?}", self.addr, reply.trim_end());

        match reply.trim_end() {
            "+PONG" => Ok(()),
            "" => bail!("connection closed before PING reply"),
            other => bail!("unexpected PING reply: {other}"),
        }
    }
}

#[async_trait]
impl Probe for RespPingProbe {
    async fn ping(&self) -> Result<()> {
        tokio::time::timeout(self.timeout, self.exchange())
            .await
            .with_context(|| format!("no PING reply from {} within {:?}", self.addr, self.timeout))?
    }
}

/// HTTP ping against a document store
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
    body_pattern: Option<regex::Regex>,
    /// Covers the request and reading the body
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            body_pattern: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Require the response body to match a regex
    pub fn with_body_pattern(mut self, pattern: &str) -> Result<Self> {
        let pattern = regex::Regex::new(pattern)
            .with_context(|| format!("invalid body pattern '{pattern}'"))?;
        self.body_pattern = Some(pattern);
        Ok(self)
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn ping(&self) -> Result<()> {
        let response = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .context("HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("unexpected status code: {}", status.as_u16());
        }

        if let Some(pattern) = &self.body_pattern {
            let body = response
                .text()
                .await
                .context("Failed to read response body")?;
            if !pattern.is_match(&body) {
                bail!("response body does not match '{}'", pattern.as_str());
            }
        }

        Ok(())
    }
}
