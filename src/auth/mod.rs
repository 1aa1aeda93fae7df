//! Authentication module
//!
//! Supports the Snowflake SQL API token types: OAuth, programmatic access token and key-pair JWT.
//!
//! The `Authenticator` applies the bearer token plus the token-type header to each request and
//! caches generated key-pair JWTs until shortly before they expire.

mod authenticator;
mod types;

pub use authenticator::{qualified_user, Authenticator, TOKEN_TYPE_HEADER};
pub use types::{AuthConfig, CachedToken};
