use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::{Result, ensure};
use clap::Parser;

use crate::extractor::DEFAULT_PROBE_CONCURRENCY;
use crate::fetcher::FetchTimeouts;

#[derive(Debug, Clone, Parser)]
#[command(name = "hubcloud-extractor", version, about = "Resolve hubcloud share pages into direct stream links")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 10000)]
    pub port: u16,

    /// Per-request timeout for outbound fetches, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Connect timeout for outbound fetches, in seconds
    #[arg(long, env = "CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// Whole-extraction deadline, in seconds
    #[arg(long, env = "EXTRACT_TIMEOUT_SECS", default_value_t = 60)]
    pub extract_timeout_secs: u64,

    /// Extractions allowed to run at the same time
    #[arg(long, env = "MAX_CONCURRENT_EXTRACTIONS", default_value_t = 16)]
    pub max_concurrent_extractions: usize,

    /// Candidate links classified in parallel within one extraction
    #[arg(long, env = "PROBE_CONCURRENCY", default_value_t = DEFAULT_PROBE_CONCURRENCY)]
    pub probe_concurrency: usize,
}

impl Config {
    /// Parse flags and environment, loading `.env` first if present.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.max_concurrent_extractions > 0,
            "MAX_CONCURRENT_EXTRACTIONS must be at least 1"
        );
        ensure!(self.probe_concurrency > 0, "PROBE_CONCURRENCY must be at least 1");
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn fetch_timeouts(&self) -> FetchTimeouts {
        FetchTimeouts {
            connect: Duration::from_secs(self.connect_timeout_secs),
            request: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.extract_timeout_secs)
    }
}
