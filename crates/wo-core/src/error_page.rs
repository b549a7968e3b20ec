//! Content for generic error pages.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenericErrorPage {
    pub title: String,
    pub body: String,
    pub help_text: Vec<String>,
}

impl GenericErrorPage {
    /// Shown when a transaction request is not authorized by any account.
    pub fn unauthorized_request() -> Self {
        Self {
            title: "Unauthorized request".to_string(),
            body: "The transaction request was not properly authorized by any of your wallet \
                   accounts. This typically happens if you've logged into this app before \
                   using another account."
                .to_string(),
            help_text: vec![
                "Sign out of the app and sign back in to re-authenticate into the application. \
                 This should help you successfully sign your transaction."
                    .to_string(),
            ],
        }
    }
}
