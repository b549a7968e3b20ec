//! Channel-backed adapters standing in for extension messaging.

mod origin;
mod popup;

pub use origin::{ChannelOriginMessenger, OriginMessage};
pub use popup::{BroadcastTeardownSource, ChannelNavigator, PopupWindow, WatchStateEvents};
