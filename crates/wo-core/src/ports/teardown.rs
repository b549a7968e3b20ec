use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownSignal {
    /// The extension window is being unloaded (closed, reloaded).
    WindowUnload,
    /// The tab of the requesting app was closed.
    OriginTabClosed,
}

/// Window and tab lifecycle notifications.
pub trait TeardownPort: Send + Sync {
    /// A fresh receiver; signals fired before subscribing are not seen.
    fn subscribe(&self) -> broadcast::Receiver<TeardownSignal>;
}
