//! Cluster objects as served by the apiserver, plus the streaming helper the
//! scheduler uses to follow watch endpoints.

pub mod api;
pub mod models;
pub mod utils;
