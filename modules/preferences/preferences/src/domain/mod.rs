pub mod access;
pub mod error;
pub mod fields;
pub mod projection;
pub mod repo;
pub mod service;
pub mod visibility;
