//! Twitter/X API v2 single-post lookup.
//!
//! `client` wraps the shared HTTP client, `extract` turns status URLs into
//! ids and lookup payloads into plain post text, and `types` holds the
//! response models.
pub mod client;
pub mod extract;
pub mod types;

pub use client::TwitterApi;
pub use extract::{PostText, is_twitter_host, tweet_id_from_url};
