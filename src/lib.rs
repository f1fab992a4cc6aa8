#![deny(warnings, rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_lossless,            // Infallible casts are clear enough with `as`
    clippy::cast_possible_truncation, // Safe within realistic value bounds (durations, sizes)
    clippy::cast_precision_loss,      // Acceptable for metrics/display
    clippy::cast_sign_loss,           // Safe where values are known non-negative
    clippy::missing_errors_doc,       // Internal API
    clippy::missing_panics_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. SenderError in sender module
    clippy::must_use_candidate,       // Annotated selectively on critical APIs
    clippy::doc_markdown              // Internal API
)]

//! Forwards an in-process metric registry to InfluxDB on a fixed schedule.
//!
//! The pipeline is: property-file configuration -> sender construction
//! (one of five wire variants across InfluxDB v1/v2/v3) -> periodic
//! reporter that snapshots the registry, encodes line protocol, and
//! hands the batch to the sender.

pub mod config;
pub mod extension;
pub mod metrics;
pub mod reporter;
pub mod sender;

// Re-export main types for easy access
pub use config::{InfluxDbConfig, Mode};
pub use extension::InfluxDbExtension;
pub use metrics::MetricRegistry;
pub use reporter::InfluxReporter;
pub use sender::{InfluxSender, Precision, build_sender};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
