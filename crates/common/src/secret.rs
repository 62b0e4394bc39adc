//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports [`secrecy`] types. Signing secrets and issued grant tokens are
//! held as `SecretString` so that any struct deriving `Debug` over them
//! prints a redacted placeholder instead of the value.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct SigningCredentials {
//!     key_id: String,
//!     secret: SecretString,
//! }
//!
//! let creds = SigningCredentials {
//!     key_id: "APIkey01".to_string(),
//!     secret: SecretString::from("signing-secret"),
//! };
//!
//! assert!(!format!("{creds:?}").contains("signing-secret"));
//! assert_eq!(creds.secret.expose_secret(), "signing-secret");
//! ```

pub use secrecy::{ExposeSecret, SecretBox, SecretString};
