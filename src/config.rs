use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::cluster::fetch_config::FetchConfig;
use crate::cluster::polling::PollPolicy;

#[derive(Debug, Parser)]
#[command(name = "clustervis")]
#[command(about = "Fetches and caches container cluster state for visualisation", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Poll a running server until a cluster's state is fetched
    Poll(PollArgs),
}

#[derive(Debug, clap::Args)]
pub struct ServeArgs {
    #[arg(long, env = "CLUSTERVIS_LISTEN_ADDR", default_value = "0.0.0.0:3000")]
    pub listen_addr: String,

    /// Gateway speaking the orchestration provider's JSON protocol
    #[arg(long, env = "CLUSTERVIS_API_ENDPOINT", default_value = "http://127.0.0.1:4566")]
    pub api_endpoint: String,

    /// Gateway API token (Authorization: Bearer)
    #[arg(long, env = "CLUSTERVIS_API_TOKEN")]
    pub api_token: Option<String>,

    #[arg(long, env = "CLUSTERVIS_REGION", default_value = "us-east-1")]
    pub region: String,

    /// How long a cluster's state stays cached (default 30 min)
    #[arg(long, env = "CLUSTERVIS_CACHE_TTL_SECS", default_value_t = 1800)]
    pub cache_ttl_secs: u64,

    /// Pause after every describe call
    #[arg(long, env = "CLUSTERVIS_API_DELAY_MS", default_value_t = 100)]
    pub api_delay_ms: u64,

    /// Directory holding ecs_instance_summaries_with_tasks-<cluster>.json files
    #[arg(long, env = "CLUSTERVIS_STATIC_DATA_DIR")]
    pub static_data_dir: Option<PathBuf>,
}

impl ServeArgs {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            api_delay: Duration::from_millis(self.api_delay_ms),
            region: self.region.clone(),
            ..FetchConfig::default()
        }
    }
}

#[derive(Debug, clap::Args)]
pub struct PollArgs {
    #[arg(long, env = "CLUSTERVIS_SERVER_URL", default_value = "http://127.0.0.1:3000")]
    pub server_url: String,

    #[arg(long, required_unless_present = "list")]
    pub cluster: Option<String>,

    /// List the server's cluster names instead of polling
    #[arg(long)]
    pub list: bool,

    /// Ask the server to refetch instead of serving its cache
    #[arg(long)]
    pub force_refresh: bool,

    /// Use demonstration data
    #[arg(long = "static")]
    pub use_static: bool,

    #[arg(long, default_value_t = 5000)]
    pub interval_ms: u64,

    #[arg(long, default_value_t = 120)]
    pub max_attempts: u32,

    /// Report memory or cpu usage
    #[arg(long, default_value = "memory")]
    pub resource_type: String,
}

impl PollArgs {
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.interval_ms),
            max_attempts: self.max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_defaults() {
        let args = Args::parse_from(["clustervis", "serve"]);
        let Command::Serve(serve) = args.command else {
            panic!("expected serve");
        };
        assert_eq!(serve.listen_addr, "0.0.0.0:3000");
        assert_eq!(serve.cache_ttl(), Duration::from_secs(1800));

        let config = serve.fetch_config();
        assert_eq!(config.api_delay, Duration::from_millis(100));
        assert_eq!(config.region, "us-east-1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn poll_flags() {
        let args = Args::parse_from([
            "clustervis",
            "poll",
            "--cluster",
            "demo-cluster-8",
            "--static",
            "--force-refresh",
            "--interval-ms",
            "250",
        ]);
        let Command::Poll(poll) = args.command else {
            panic!("expected poll");
        };
        assert_eq!(poll.cluster.as_deref(), Some("demo-cluster-8"));
        assert!(poll.use_static);
        assert!(poll.force_refresh);
        assert!(!poll.list);
        let policy = poll.poll_policy();
        assert_eq!(policy.interval, Duration::from_millis(250));
        assert_eq!(policy.max_attempts, 120);
    }

    #[test]
    fn poll_needs_a_cluster_unless_listing() {
        assert!(Args::try_parse_from(["clustervis", "poll"]).is_err());

        let args = Args::try_parse_from(["clustervis", "poll", "--list", "--static"]).unwrap();
        let Command::Poll(poll) = args.command else {
            panic!("expected poll");
        };
        assert!(poll.list);
        assert_eq!(poll.cluster, None);
    }
}
