//! Common types shared by the interview session components.

#![warn(clippy::pedantic)]

/// Module for the session grant: claims, permissions and verification
pub mod grant;

/// Module for shared domain types (interview categories, participant roles)
pub mod types;

/// Module for secret types that prevent accidental logging
pub mod secret;
