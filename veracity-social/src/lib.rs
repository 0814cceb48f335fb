//! Social network clients used by Veracity.
//!
//! Only Twitter/X is implemented: when a user submits a status link, the
//! content extractor looks the post up through the API v2 instead of
//! scraping the JavaScript-rendered page.
pub mod twitter;
