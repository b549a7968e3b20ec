mod token_decoder;

pub use token_decoder::{DecodeError, TokenAuthRequestDecoder, AUTH_REQUEST_PARAM, ORIGIN_PARAM};
