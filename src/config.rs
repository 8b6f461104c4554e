//! Runtime configuration for the keypair generation service.

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::category::{Category, VanityTarget, UNFILTERED_NAME};
use crate::matcher::validate_suffix;
use crate::store::StoreLocation;
use crate::worker::StreamSpec;

const SQLITE_SCHEME: &str = "sqlite://";
const SQLITE_MEMORY: &str = "sqlite::memory:";

/// Solana keypair generator with vanity suffix streams and a drain-on-read API
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Store connection string: `sqlite://<directory>` or `sqlite::memory:`
    #[arg(long, env = "DB_URL", default_value = "sqlite://data")]
    pub db_url: String,

    /// Database name; the file is `<directory>/<name>.sqlite3`
    #[arg(long, env = "DB_NAME", default_value = "solana-wallets-db")]
    pub db_name: String,

    /// HTTP listen port
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// HTTP bind address
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Vanity targets as NAME=SUFFIX (repeat or comma-separate)
    #[arg(
        short = 't',
        long = "target",
        env = "VANITY_TARGETS",
        value_delimiter = ',',
        default_values = ["pumpfun=pump", "letbonk=bonk"]
    )]
    pub targets: Vec<VanityTarget>,

    /// Minimum delay between unfiltered keypairs, in seconds
    #[arg(long, default_value = "60")]
    pub min_interval_secs: u64,

    /// Maximum delay between unfiltered keypairs, in seconds
    #[arg(long, default_value = "300")]
    pub max_interval_secs: u64,

    /// Search attempts between cooperative yields
    #[arg(short = 'y', long, default_value = "1000")]
    pub yield_every: u64,

    /// Delay before vanity streams start, in milliseconds
    #[arg(long, default_value = "1000")]
    pub vanity_start_delay_ms: u64,

    /// Number of runtime worker threads (default: number of CPU cores)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Progress report interval in seconds (0 disables)
    #[arg(short = 'r', long, default_value = "60")]
    pub report_interval: u64,
}

impl Config {
    /// Returns the number of runtime workers, defaulting to CPU count
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        names.insert(UNFILTERED_NAME);

        for target in &self.targets {
            let name = target.name();
            if name.is_empty()
                || !name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                return Err(ConfigError::InvalidTarget(format!(
                    "target name {:?} must be non-empty and use only [A-Za-z0-9_-]",
                    name
                )));
            }

            if !names.insert(name) {
                return Err(ConfigError::InvalidTarget(format!(
                    "target name {:?} is reserved or used twice",
                    name
                )));
            }

            validate_suffix(target.suffix()).map_err(ConfigError::InvalidTarget)?;
        }

        if self.min_interval_secs > self.max_interval_secs {
            return Err(ConfigError::InvalidInterval(format!(
                "minimum {}s exceeds maximum {}s",
                self.min_interval_secs, self.max_interval_secs
            )));
        }

        if self.yield_every == 0 {
            return Err(ConfigError::InvalidInterval(
                "yield interval must be at least 1".into(),
            ));
        }

        self.store_location()?;
        Ok(())
    }

    /// Resolves the store connection string
    pub fn store_location(&self) -> Result<StoreLocation, ConfigError> {
        if self.db_url == SQLITE_MEMORY {
            return Ok(StoreLocation::Memory);
        }

        let Some(dir) = self.db_url.strip_prefix(SQLITE_SCHEME) else {
            return Err(ConfigError::InvalidStoreUrl(self.db_url.clone()));
        };

        if self.db_name.is_empty() || self.db_name.contains(['/', '\\']) {
            return Err(ConfigError::InvalidStoreUrl(format!(
                "invalid database name {:?}",
                self.db_name
            )));
        }

        let dir = if dir.is_empty() { "." } else { dir };
        Ok(StoreLocation::File(
            PathBuf::from(dir).join(format!("{}.sqlite3", self.db_name)),
        ))
    }

    /// Returns the HTTP listen address
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// Returns every category served, unfiltered first
    pub fn categories(&self) -> Vec<Category> {
        std::iter::once(Category::Unfiltered)
            .chain(self.targets.iter().cloned().map(Category::Vanity))
            .collect()
    }

    /// Returns one stream spec per category
    pub fn stream_specs(&self) -> Vec<StreamSpec> {
        let start_delay = Duration::from_millis(self.vanity_start_delay_ms);

        std::iter::once(StreamSpec::unfiltered(
            Duration::from_secs(self.min_interval_secs),
            Duration::from_secs(self.max_interval_secs),
        ))
        .chain(
            self.targets
                .iter()
                .cloned()
                .map(|target| StreamSpec::vanity(target, start_delay)),
        )
        .collect()
    }

    /// Returns the progress report interval, if enabled
    pub fn report_interval(&self) -> Option<Duration> {
        (self.report_interval > 0).then(|| Duration::from_secs(self.report_interval))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid vanity target: {0}")]
    InvalidTarget(String),

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("Unsupported store URL: {0}")]
    InvalidStoreUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::Pacing;

    fn make_test_config(targets: &[&str]) -> Config {
        Config {
            db_url: "sqlite://data".into(),
            db_name: "solana-wallets-db".into(),
            port: 3000,
            bind: IpAddr::from([127, 0, 0, 1]),
            targets: targets.iter().map(|t| t.parse().unwrap()).collect(),
            min_interval_secs: 60,
            max_interval_secs: 300,
            yield_every: 1000,
            vanity_start_delay_ms: 1000,
            workers: None,
            report_interval: 60,
        }
    }

    #[test]
    fn test_defaults_parse() {
        let config = Config::parse_from(["sol_vanity_pool"]);
        assert_eq!(
            config.targets,
            vec![
                VanityTarget::new("pumpfun", "pump"),
                VanityTarget::new("letbonk", "bonk")
            ]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_targets_from_flags() {
        let config =
            Config::parse_from(["sol_vanity_pool", "--target", "moon=mo0n,sun=Sun"]);
        assert_eq!(config.targets.len(), 2);
        // '0' is not base58
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_config() {
        let config = make_test_config(&["pumpfun=pump"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_suffix() {
        assert!(make_test_config(&["bad=pOmp"]).validate().is_err());
        assert!(make_test_config(&["empty="]).validate().is_err());
    }

    #[test]
    fn test_reserved_and_duplicate_names() {
        assert!(make_test_config(&["random=pump"]).validate().is_err());
        assert!(make_test_config(&["a=pump", "a=bonk"]).validate().is_err());
        assert!(make_test_config(&["bad/name=pump"]).validate().is_err());
    }

    #[test]
    fn test_interval_bounds() {
        let mut config = make_test_config(&[]);
        config.min_interval_secs = 301;
        assert!(config.validate().is_err());

        let mut config = make_test_config(&[]);
        config.yield_every = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_store_location() {
        let config = make_test_config(&[]);
        assert_eq!(
            config.store_location().unwrap(),
            StoreLocation::File(PathBuf::from("data/solana-wallets-db.sqlite3"))
        );

        let mut config = make_test_config(&[]);
        config.db_url = "sqlite::memory:".into();
        assert_eq!(config.store_location().unwrap(), StoreLocation::Memory);

        let mut config = make_test_config(&[]);
        config.db_url = "mongodb://localhost:27017".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_stream_specs() {
        let config = make_test_config(&["pumpfun=pump", "letbonk=bonk"]);
        let specs = config.stream_specs();

        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0].category, Category::Unfiltered);
        assert_eq!(
            specs[0].pacing,
            Pacing::Random {
                min: Duration::from_secs(60),
                max: Duration::from_secs(300)
            }
        );
        assert_eq!(specs[1].category.name(), "pumpfun");
        assert_eq!(specs[1].pacing, Pacing::Immediate);
        assert_eq!(specs[2].initial_delay, Duration::from_millis(1000));
        assert_eq!(config.categories().len(), 3);
    }
}
