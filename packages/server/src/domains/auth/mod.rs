//! Auth domain - verification-token lifecycle and credential issuance.

pub mod actions;
pub mod data;
pub mod errors;
pub mod jwt;
pub mod models;

pub use actions::{Authenticator, LoginResult, RefreshResult};
pub use data::PgTokenStore;
pub use errors::AuthError;
pub use jwt::{Claims, JwtService, TokenKind};
