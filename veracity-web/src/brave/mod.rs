//! Brave Search API provider (web vertical only).
pub mod client;
pub mod types;

pub use client::BraveApi;
