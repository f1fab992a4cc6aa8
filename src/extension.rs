use crate::config::{InfluxDbConfig, PropertiesError};
use crate::metrics::filter::parse_prefixes;
use crate::metrics::{MetricRegistry, NameSelector};
use crate::reporter::InfluxReporter;
use crate::sender::{FactoryError, Precision, build_sender};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Reasons startup is refused. The display text of each variant is the
/// message handed to the host's prevent-startup callback.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Could not read influxdb properties")]
    ConfigMissing(#[source] PropertiesError),
    #[error("At least one mandatory property not set")]
    ConfigInvalid,
    #[error("Couldn't create an influxdb sender. Please check that the configuration is correct")]
    NoSender(#[source] FactoryError),
}

/// Resolves the configuration file inside the extension home folder.
///
/// The nested `conf/config.properties` layout wins when it exists, the
/// legacy `influxdb.properties` directly under the home folder is the
/// fallback.
pub fn config_file_in(home: &Path) -> PathBuf {
    let nested = home.join("conf").join("config.properties");
    if nested.is_file() {
        nested
    } else {
        home.join("influxdb.properties")
    }
}

/// Plugin entry point: wires configuration, sender and reporter(s)
/// together and owns their lifetime.
#[derive(Default)]
pub struct InfluxDbExtension {
    reporters: Vec<InfluxReporter>,
}

impl InfluxDbExtension {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts reporting for `registry` using the configuration found in
    /// `home`. All setup failures are resolved here, before any
    /// reporter runs; afterwards reporting failures stay per-tick.
    ///
    /// When `metricsFilterList` names at least one prefix, two
    /// reporters run side by side: the matching metrics on the filtered
    /// interval and everything else on the regular one, each with its
    /// own sender.
    pub fn start(&mut self, home: &Path, registry: MetricRegistry) -> Result<(), StartupError> {
        if !self.reporters.is_empty() {
            debug!("InfluxDB extension already started, ignoring start request");
            return Ok(());
        }

        let path = config_file_in(home);
        let config = InfluxDbConfig::load(&path).map_err(StartupError::ConfigMissing)?;

        if !config.validate() {
            return Err(StartupError::ConfigInvalid);
        }

        let prefix = config.prefix();
        let tags = config.tags();
        let interval = Duration::from_secs(config.reporting_interval());
        let prefixes = config
            .metrics_filter_list()
            .map(parse_prefixes)
            .unwrap_or_default();

        if prefixes.is_empty() {
            let sender = build_sender(&config).map_err(StartupError::NoSender)?;
            let mut reporter = InfluxReporter::new(
                registry,
                sender,
                prefix,
                tags,
                NameSelector::All,
                Precision::Seconds,
            );
            reporter.start(interval);
            self.reporters.push(reporter);
        } else {
            let filtered_interval = Duration::from_secs(config.filtered_reporting_interval());
            info!(
                "Reporting metrics matching {prefixes:?} every {}s, all other metrics every {}s",
                filtered_interval.as_secs(),
                interval.as_secs()
            );

            let filtered_sender = build_sender(&config).map_err(StartupError::NoSender)?;
            let remaining_sender = build_sender(&config).map_err(StartupError::NoSender)?;

            let mut filtered = InfluxReporter::new(
                registry.clone(),
                filtered_sender,
                prefix.clone(),
                tags.clone(),
                NameSelector::Matching(prefixes.clone()),
                Precision::Seconds,
            );
            filtered.start(filtered_interval);

            let mut remaining = InfluxReporter::new(
                registry,
                remaining_sender,
                prefix,
                tags,
                NameSelector::NotMatching(prefixes),
                Precision::Seconds,
            );
            remaining.start(interval);

            self.reporters.push(filtered);
            self.reporters.push(remaining);
        }

        Ok(())
    }

    /// Stops all reporters. Safe to call repeatedly and without a prior
    /// successful start.
    pub fn stop(&mut self) {
        for reporter in &mut self.reporters {
            reporter.stop();
        }
        self.reporters.clear();
    }
}
