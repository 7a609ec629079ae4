#![forbid(unsafe_code)]
//! Security primitives shared by the preference service crates.
//!
//! A [`Principal`] is the opaque result of authenticating a request: a
//! username plus the authority strings granted to it. Authorities follow the
//! `SCOPE_<scope>` / `ROLE_<role>` convention, see [`Authority`].

pub mod authority;
pub mod principal;

pub use authority::Authority;
pub use principal::{Principal, PrincipalBuilder};
