//! Decoder for `?authRequest=<token>` launch URLs.
//!
//! The token is a JWT; only the payload segment is read here. Signature
//! verification belongs to the requesting app's SDK.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tracing::debug;
use url::Url;

use wo_core::ports::AuthRequestDecoderPort;
use wo_core::RequestPayload;

pub const AUTH_REQUEST_PARAM: &str = "authRequest";
pub const ORIGIN_PARAM: &str = "origin";

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("auth request token is not a JWT")]
    MalformedToken,
    #[error("auth request payload is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("auth request payload is not valid JSON: {0}")]
    Payload(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default)]
pub struct TokenAuthRequestDecoder {
    origin: Option<Url>,
    decoded: Option<RequestPayload>,
}

impl TokenAuthRequestDecoder {
    /// Decode the request carried by the popup's launch URL.
    ///
    /// A URL without an `authRequest` parameter yields a decoder with no
    /// pending request.
    pub fn from_url(url: &Url) -> Result<Self, DecodeError> {
        let mut token = None;
        let mut origin = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                AUTH_REQUEST_PARAM => token = Some(value.into_owned()),
                ORIGIN_PARAM => origin = Url::parse(&value).ok(),
                _ => {}
            }
        }

        let Some(token) = token else {
            debug!("launch url carries no auth request");
            return Ok(Self::default());
        };

        let decoded = decode_token(&token)?;
        let origin = origin.or_else(|| Url::parse(&decoded.domain_name).ok());
        debug!(domain = %decoded.domain_name, origin = ?origin.as_ref().map(Url::as_str), "auth request decoded");
        Ok(Self {
            origin,
            decoded: Some(decoded),
        })
    }
}

impl AuthRequestDecoderPort for TokenAuthRequestDecoder {
    fn get_decoded_request(&self) -> Option<RequestPayload> {
        self.decoded.clone()
    }

    fn get_origin(&self) -> Option<Url> {
        self.origin.clone()
    }
}

fn decode_token(token: &str) -> Result<RequestPayload, DecodeError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(DecodeError::MalformedToken);
    };
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    Ok(serde_json::from_slice(&bytes)?)
}
