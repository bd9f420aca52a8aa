//! HTTP request handlers
//!
//! - `api` - Health check endpoint
//! - `signed_url` - Signed ElevenLabs conversation URLs for browser clients

pub mod api;
pub mod signed_url;

pub use signed_url::get_signed_url;
