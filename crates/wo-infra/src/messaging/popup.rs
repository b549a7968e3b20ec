use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info};

use wo_core::ports::{
    NavigationPort, OnboardingEventPort, TeardownPort, TeardownSignal, WindowPort,
};
use wo_core::{OnboardingState, RouteUrl};

const TEARDOWN_CAPACITY: usize = 16;

/// Forwards route changes to the popup's router.
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<RouteUrl>,
}

impl ChannelNavigator {
    pub fn new(tx: mpsc::UnboundedSender<RouteUrl>) -> Self {
        Self { tx }
    }
}

impl NavigationPort for ChannelNavigator {
    fn navigate_to(&self, route: RouteUrl) {
        debug!(path = route.path(), "navigate");
        if self.tx.send(route).is_err() {
            debug!(path = route.path(), "router gone, navigation dropped");
        }
    }
}

/// Window and tab lifecycle notifications.
#[derive(Debug, Clone)]
pub struct BroadcastTeardownSource {
    tx: broadcast::Sender<TeardownSignal>,
}

impl BroadcastTeardownSource {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(TEARDOWN_CAPACITY);
        Self { tx }
    }

    /// Notify listeners. Returns the number of listeners reached.
    pub fn fire(&self, signal: TeardownSignal) -> usize {
        let reached = self.tx.send(signal).unwrap_or(0);
        debug!(?signal, reached, "teardown signal fired");
        reached
    }
}

impl Default for BroadcastTeardownSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TeardownPort for BroadcastTeardownSource {
    fn subscribe(&self) -> broadcast::Receiver<TeardownSignal> {
        self.tx.subscribe()
    }
}

/// The extension popup. Closing it unloads the page, which is a teardown.
pub struct PopupWindow {
    closed: AtomicBool,
    teardown: Arc<BroadcastTeardownSource>,
}

impl PopupWindow {
    pub fn new(teardown: Arc<BroadcastTeardownSource>) -> Self {
        Self {
            closed: AtomicBool::new(false),
            teardown,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl WindowPort for PopupWindow {
    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("popup window closed");
        self.teardown.fire(TeardownSignal::WindowUnload);
    }
}

/// Publishes onboarding state changes to the page.
pub struct WatchStateEvents {
    tx: watch::Sender<OnboardingState>,
}

impl WatchStateEvents {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(OnboardingState::Idle);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<OnboardingState> {
        self.tx.subscribe()
    }
}

impl Default for WatchStateEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OnboardingEventPort for WatchStateEvents {
    async fn emit_state_changed(&self, state: OnboardingState) {
        debug!(?state, "onboarding state changed");
        self.tx.send_replace(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closing_window_fires_unload_once() {
        let teardown = Arc::new(BroadcastTeardownSource::new());
        let mut signals = teardown.subscribe();
        let window = PopupWindow::new(teardown.clone());

        window.close();
        window.close();

        assert!(window.is_closed());
        assert_eq!(signals.recv().await.unwrap(), TeardownSignal::WindowUnload);
        assert!(signals.try_recv().is_err());
    }

    #[test]
    fn firing_without_listeners_reaches_nobody() {
        let teardown = BroadcastTeardownSource::new();
        assert_eq!(teardown.fire(TeardownSignal::OriginTabClosed), 0);
    }

    #[tokio::test]
    async fn navigator_forwards_routes_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let navigator = ChannelNavigator::new(tx);

        navigator.navigate_to(RouteUrl::ChooseAccount);
        navigator.navigate_to(RouteUrl::Home);

        assert_eq!(rx.recv().await, Some(RouteUrl::ChooseAccount));
        assert_eq!(rx.recv().await, Some(RouteUrl::Home));
    }

    #[tokio::test]
    async fn state_events_are_observable() {
        let events = WatchStateEvents::new();
        let rx = events.subscribe();

        events.emit_state_changed(OnboardingState::DerivingKey).await;

        assert_eq!(*rx.borrow(), OnboardingState::DerivingKey);
    }
}
