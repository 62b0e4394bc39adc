//! # Session Test Utilities
//!
//! Shared test utilities for the grant service and the session client.
//!
//! This crate provides:
//! - Fixed signing credentials and service configurations
//! - Grant builders (`TestGrantBuilder`)
//! - An in-process grant server (`TestGrantServer`)
//! - Grant assertions (`GrantAssertions` trait)
//! - Mocks for the client seams: `MockGrantSource`, `MockTransport`,
//!   `MockMicrophone`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use session_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let server = TestGrantServer::spawn(test_config()).await?;
//!     let body: serde_json::Value = reqwest::get(server.token_url()).await?.json().await?;
//!
//!     body["token"]
//!         .as_str()
//!         .unwrap()
//!         .assert_valid_grant()
//!         .assert_interview_permissions();
//! }
//! ```

pub mod assertions;
pub mod crypto_fixtures;
pub mod mock_grant_source;
pub mod mock_microphone;
pub mod mock_transport;
pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use assertions::*;
pub use crypto_fixtures::*;
pub use mock_grant_source::*;
pub use mock_microphone::*;
pub use mock_transport::*;
pub use server_harness::*;
pub use token_builders::*;
