//! Pipeline configuration.

use std::time::Duration;

use super::retry::ReportRetryPolicy;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Bound on each source image fetch.
    pub fetch_timeout: Duration,

    /// Global cap on in-flight fetch-transform units.
    pub max_concurrent_units: usize,

    /// JPEG quality for the default compressor.
    pub jpeg_quality: u8,

    /// Bound on each callback delivery request.
    pub callback_timeout: Duration,

    /// How unit reports are retried toward the aggregator.
    pub report_retry: ReportRetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
            max_concurrent_units: 16,
            jpeg_quality: 50,
            callback_timeout: Duration::from_secs(10),
            report_retry: ReportRetryPolicy::default(),
        }
    }
}
