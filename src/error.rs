//! Error taxonomy for the arrivals pipeline.
//!
//! Each variant family is handled at a different boundary: fetch failures
//! are swallowed per source, pipeline errors reach the HTTP caller as a
//! generic 500, delivery failures are only ever logged.

use thiserror::Error;

/// Failure to obtain a decoded snapshot from one feed source.
#[derive(Error, Debug)]
pub enum FetchFailure {
    #[error("invalid feed url {url:?}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("feed responded with HTTP {status}")]
    Status { status: u16 },

    #[error("could not decode feed: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("could not read feed file: {0}")]
    Io(#[from] std::io::Error),
}

/// Any failure while turning fetched snapshots into an arrival list.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("fetch task for source {source_tag:?} did not complete: {message}")]
    TaskFailed { source_tag: String, message: String },

    #[error("no feed sources configured")]
    NoSources,
}

/// Failure to speak an announcement on the delivery device.
#[derive(Error, Debug)]
pub enum DeliveryFailure {
    #[error("delivery device address not set")]
    NotConfigured,

    #[error("announcement text is empty")]
    EmptyText,

    #[error("invalid delivery url {url:?}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("announcement text is {len} characters, limit is {limit}")]
    TextTooLong { len: usize, limit: usize },

    #[error("cast gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("cast gateway responded with HTTP {status}")]
    Status { status: u16 },
}
