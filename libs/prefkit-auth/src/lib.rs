#![forbid(unsafe_code)]
//! Authentication for the preference service HTTP surface.
//!
//! Tokens are opaque here: a [`TokenValidator`] turns a bearer token into a
//! [`prefkit_security::Principal`] or rejects it. The [`axum_ext`] middleware
//! runs the validator and makes the principal available to handlers through
//! the [`axum_ext::Authz`] extractor.

pub mod axum_ext;
pub mod config;
pub mod errors;
pub mod static_validator;
pub mod traits;

pub use config::{AuthConfig, StaticTokenConfig};
pub use errors::AuthError;
pub use static_validator::StaticTokenValidator;
pub use traits::TokenValidator;
