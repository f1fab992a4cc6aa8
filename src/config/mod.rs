pub mod properties;

pub use properties::{Properties, PropertiesError};

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{error, warn};

const HOST: &str = "host";
const PORT: &str = "port";
const MODE: &str = "mode";
const MODE_DEFAULT: &str = "http";
const VERSION: &str = "version";
const PROTOCOL: &str = "protocol";
const REPORTING_INTERVAL: &str = "reportingInterval";
const FILTERED_REPORTING_INTERVAL: &str = "filteredReportingInterval";
const REPORTING_INTERVAL_DEFAULT: u64 = 1;
const PREFIX: &str = "prefix";
const PREFIX_DEFAULT: &str = "";
const DATABASE: &str = "database";
const DATABASE_DEFAULT: &str = "hivemq";
const CONNECT_TIMEOUT: &str = "connectTimeout";
const CONNECT_TIMEOUT_DEFAULT: u64 = 5000;
const AUTH: &str = "auth";
const TAGS: &str = "tags";
const METRICS_FILTER_LIST: &str = "metricsFilterList";
const CONSOLE_DEBUG: &str = "consoleDebug";
const BUCKET: &str = "bucket";
const ORGANIZATION: &str = "organization";

const HOST_PLACEHOLDER: &str = "--INFLUX-DB-IP--";

/// Transport family selected by the `mode` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Http,
    Tcp,
    Udp,
    Cloud,
}

impl Mode {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "http" => Some(Self::Http),
            "tcp" => Some(Self::Tcp),
            "udp" => Some(Self::Udp),
            "cloud" => Some(Self::Cloud),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Cloud => "cloud",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed view over the InfluxDB property file.
///
/// All getters apply the default-with-warning policy: a missing key, or a
/// numeric value failing its range check, resolves to the documented
/// default with a WARN log instead of an error. The underlying properties
/// are never mutated after load.
#[derive(Debug, Clone)]
pub struct InfluxDbConfig {
    props: Properties,
}

impl InfluxDbConfig {
    pub fn new(props: Properties) -> Self {
        Self { props }
    }

    pub fn load(path: &Path) -> Result<Self, PropertiesError> {
        Ok(Self::new(Properties::load(path)?))
    }

    /// Check that mandatory properties exist and are valid. Mandatory
    /// properties are `host` and `port`; in cloud mode `auth`, `bucket`
    /// and `organization` are mandatory as well.
    ///
    /// Every violation produces its own ERROR line so all problems are
    /// visible in one run.
    pub fn validate(&self) -> bool {
        if self.console_debug() {
            return true;
        }

        let mut errors = 0;

        let host = self.props.get(HOST);
        let port = self.props.get(PORT);

        if host.is_none() {
            error!("Mandatory property {HOST} is not set.");
            errors += 1;
        }
        if port.is_none() {
            error!("Mandatory property {PORT} is not set.");
            errors += 1;
        }
        if errors != 0 {
            return false;
        }

        if let Some(port) = port {
            match port.parse::<i64>() {
                Ok(value) => {
                    if !(0..=65535).contains(&value) {
                        error!("Value for mandatory InfluxDB property {PORT} is not in valid port range.");
                        errors += 1;
                    }
                }
                Err(_) => {
                    error!("Value for mandatory InfluxDB property {PORT} is not a number.");
                    errors += 1;
                }
            }
        }

        if host == Some(HOST_PLACEHOLDER) {
            error!("Value for mandatory InfluxDB property {HOST} is still the placeholder.");
            errors += 1;
        }

        if self.mode() == Some(Mode::Cloud) {
            for key in [AUTH, BUCKET, ORGANIZATION] {
                if self.props.get(key).is_none() {
                    error!("Mandatory property {key} is not set for cloud mode.");
                    errors += 1;
                }
            }
        }

        errors == 0
    }

    /// Transport mode, defaulting to `http`. Returns `None` for an
    /// unrecognized mode string, which downstream treats as "no sender".
    pub fn mode(&self) -> Option<Mode> {
        let (raw, warning) = resolve_string(MODE, self.props.get(MODE), MODE_DEFAULT);
        if let Some(warning) = warning {
            warn!("{warning}");
        }
        let mode = Mode::parse(&raw);
        if mode.is_none() {
            error!("Unknown mode '{raw}' configured for InfluxDb");
        }
        mode
    }

    /// Explicitly configured wire-protocol generation, if any. Values
    /// outside {1, 2, 3} are warned about and treated as absent, leaving
    /// the choice to mode-based inference.
    pub fn version(&self) -> Option<u8> {
        let raw = self.props.get(VERSION)?;
        match raw.parse::<u8>() {
            Ok(version @ 1..=3) => Some(version),
            _ => {
                warn!(
                    "Value for InfluxDB property '{VERSION}' must be 1, 2 or 3, original value {raw}. Inferring the version from the mode"
                );
                None
            }
        }
    }

    pub fn host(&self) -> Option<&str> {
        self.props.get(HOST)
    }

    pub fn port(&self) -> Option<u16> {
        let raw = self.props.get(PORT)?;
        match raw.parse::<u16>() {
            Ok(port) => Some(port),
            Err(_) => {
                error!("Value for {PORT} is not a number");
                None
            }
        }
    }

    pub fn database(&self) -> String {
        self.resolve_string_logged(DATABASE, DATABASE_DEFAULT)
    }

    pub fn prefix(&self) -> String {
        self.resolve_string_logged(PREFIX, PREFIX_DEFAULT)
    }

    pub fn auth(&self) -> Option<&str> {
        self.props.get(AUTH)
    }

    pub fn bucket(&self) -> Option<&str> {
        self.props.get(BUCKET)
    }

    pub fn organization(&self) -> Option<&str> {
        self.props.get(ORGANIZATION)
    }

    /// Configured protocol, or the caller-supplied default (which differs
    /// by mode) with a WARN naming the active mode.
    pub fn protocol_or_default(&self, default: &str) -> String {
        match self.props.get(PROTOCOL) {
            Some(protocol) => protocol.to_string(),
            None => {
                let mode = self.props.get(MODE).unwrap_or(MODE_DEFAULT);
                warn!("No protocol configured for InfluxDb in mode '{mode}', using default: '{default}'");
                default.to_string()
            }
        }
    }

    /// Reporting interval in seconds, default 1. Zero and negative values
    /// fall back to the default.
    pub fn reporting_interval(&self) -> u64 {
        self.resolve_positive_logged(REPORTING_INTERVAL, REPORTING_INTERVAL_DEFAULT)
    }

    /// Interval for the filtered partition's reporter, in seconds.
    pub fn filtered_reporting_interval(&self) -> u64 {
        self.resolve_positive_logged(FILTERED_REPORTING_INTERVAL, REPORTING_INTERVAL_DEFAULT)
    }

    /// Connect timeout in milliseconds, default 5000. Also used as the
    /// read timeout by the HTTP senders.
    pub fn connect_timeout(&self) -> u64 {
        self.resolve_positive_logged(CONNECT_TIMEOUT, CONNECT_TIMEOUT_DEFAULT)
    }

    /// Tags applied to every record, parsed from `key=value` pairs
    /// separated by `;`. Malformed pairs are dropped with a WARN; the
    /// remaining pairs are kept.
    pub fn tags(&self) -> BTreeMap<String, String> {
        let mut tags = BTreeMap::new();

        let Some(raw) = self.props.get(TAGS) else {
            return tags;
        };

        for segment in raw.split(';') {
            let parts: Vec<&str> = segment.split('=').collect();
            if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
                warn!("Invalid tag format {segment} for InfluxDB");
                continue;
            }
            tags.insert(parts[0].to_string(), parts[1].to_string());
        }

        tags
    }

    /// Raw semicolon-separated prefix list for metric filtering, if set.
    pub fn metrics_filter_list(&self) -> Option<&str> {
        self.props.get(METRICS_FILTER_LIST)
    }

    pub fn console_debug(&self) -> bool {
        self.props
            .get(CONSOLE_DEBUG)
            .is_some_and(|raw| raw.eq_ignore_ascii_case("true"))
    }

    fn resolve_string_logged(&self, key: &str, default: &str) -> String {
        let (value, warning) = resolve_string(key, self.props.get(key), default);
        if let Some(warning) = warning {
            warn!("{warning}");
        }
        value
    }

    fn resolve_positive_logged(&self, key: &str, default: u64) -> u64 {
        let (value, warning) = resolve_positive(key, self.props.get(key), default);
        if let Some(warning) = warning {
            warn!("{warning}");
        }
        value
    }
}

/// Resolves an optional string property against its default. Returns the
/// value and, when the default was substituted for a non-empty default,
/// the warning to log. Logging stays with the caller.
fn resolve_string(key: &str, raw: Option<&str>, default: &str) -> (String, Option<String>) {
    match raw {
        Some(value) => (value.to_string(), None),
        None => {
            let warning = if default.is_empty() {
                None
            } else {
                Some(format!("No '{key}' configured for InfluxDb, using default: {default}"))
            };
            (default.to_string(), warning)
        }
    }
}

/// Resolves an optional numeric property that must be a positive integer.
/// Missing, unparsable, zero and negative values all resolve to the
/// default together with the warning to log.
fn resolve_positive(key: &str, raw: Option<&str>, default: u64) -> (u64, Option<String>) {
    let Some(raw) = raw else {
        return (
            default,
            Some(format!("No '{key}' configured for InfluxDb, using default: {default}")),
        );
    };

    let Ok(value) = raw.parse::<i64>() else {
        return (
            default,
            Some(format!(
                "Value for InfluxDB property '{key}' is not a number, original value {raw}. Using default: {default}"
            )),
        );
    };

    if value == 0 {
        return (
            default,
            Some(format!("Value for InfluxDB property '{key}' can't be zero. Using default: {default}")),
        );
    }
    if value < 0 {
        return (
            default,
            Some(format!(
                "Value for InfluxDB property '{key}' can't be negative. Using default: {default}"
            )),
        );
    }

    (value as u64, None)
}
