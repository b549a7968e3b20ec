use crate::routes::RouteUrl;

/// Router of the extension pages. Fire-and-forget.
pub trait NavigationPort: Send + Sync {
    fn navigate_to(&self, route: RouteUrl);
}
