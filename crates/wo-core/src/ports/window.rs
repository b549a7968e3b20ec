/// The extension popup window hosting the flow.
pub trait WindowPort: Send + Sync {
    /// Close the popup. Closing an already closed window does nothing.
    fn close(&self);
}
