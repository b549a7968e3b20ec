/// Fire-and-forget analytics sink. Never awaited for control flow.
pub trait AnalyticsPort: Send + Sync {
    /// Record a named event (`submit_valid_password`, ...).
    fn track(&self, event: &str);
    /// Record a page interaction, e.g. a view of `/set-password`.
    fn page(&self, action: &str, path: &str);
}
