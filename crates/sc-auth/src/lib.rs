//! # sc-auth
//!
//! Bearer-token authentication for Service Center RS.
//!
//! Tokens are issued elsewhere; this crate verifies them and turns the claims
//! into a [`CurrentUser`] the services trust.

pub mod jwt;
pub mod principal;

pub use jwt::{extract_bearer_token, Claims, JwtError, JwtService};
pub use principal::{AuthError, Authenticator, CurrentUser};
