//! HTTP record source for the repository platform API
//!
//! Authentication is OAuth against `/oauth/token` with the API key sent on
//! every request; instances are read page by page from the
//! `essential-utility/v3` endpoints.

mod auth;
mod client;

pub use auth::{TokenResponse, TokenState};
pub use client::EasClient;
