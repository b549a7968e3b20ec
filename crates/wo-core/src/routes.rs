use serde::Serialize;

/// Extension routes the flow navigates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RouteUrl {
    Home,
    SetPassword,
    ChooseAccount,
    UnauthorizedRequest,
    /// History back (header close button).
    Back,
}

impl RouteUrl {
    pub fn path(&self) -> &'static str {
        match self {
            RouteUrl::Home => "/",
            RouteUrl::SetPassword => "/set-password",
            RouteUrl::ChooseAccount => "/choose-account",
            RouteUrl::UnauthorizedRequest => "/unauthorized-request",
            RouteUrl::Back => "..",
        }
    }
}
