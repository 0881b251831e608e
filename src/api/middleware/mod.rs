//! HTTP middleware.

pub mod audit;
