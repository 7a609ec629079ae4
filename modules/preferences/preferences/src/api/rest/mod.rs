//! HTTP surface of the preferences module.

pub mod codec;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;

#[cfg(test)]
mod dto_test;
