//! Client for the anime relations aggregator (arm.haglund.dev)

pub mod api;
pub mod client;

pub use client::{ArmClient, IdAggregator};
