use tracing::info;

use wo_core::ports::AnalyticsPort;

/// Analytics sink that records events as structured log lines under the
/// `analytics` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAnalytics;

impl AnalyticsPort for TracingAnalytics {
    fn track(&self, event: &str) {
        info!(target: "analytics", event, "track");
    }

    fn page(&self, action: &str, path: &str) {
        info!(target: "analytics", action, path, "page");
    }
}
