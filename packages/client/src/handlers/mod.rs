//! Ready-made handlers

pub mod authorization;
pub mod basic;

pub use authorization::{
    AuthOutcome, AuthorizationHeaderHandler, AuthorizationHeaderHandlerOptions,
    AuthorizationHeaderOptions, authorization_header_handler,
};
pub use basic::{
    BASIC_AUTH_HANDLER, BasicAuthOptions, BasicCredentials, basic_auth_handler, basic_auth_header,
    decode_basic_auth, encode_basic_auth,
};
