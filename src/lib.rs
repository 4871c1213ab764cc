//! Async client for the AutoPay payment API.
//!
//! Payments, refunds and channel lookups go through [`AutoPayClient`]. Batches
//! fan out over a bounded worker pool and every request, batched or not,
//! passes the client's shared rate gate.

pub mod app;
pub mod batch;
pub mod client;
pub mod config;
pub mod context;
pub mod domain;
pub mod http;
pub mod io;
pub mod prelude;
pub mod ratelimit;
pub mod services;

pub use client::{AutoPayClient, BatchRequest, BatchResult};
