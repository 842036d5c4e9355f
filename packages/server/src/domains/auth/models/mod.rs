pub mod refresh_token;
pub mod session;
pub mod user;
pub mod verification_token;

pub use refresh_token::RefreshToken;
pub use session::{Session, SessionStatus};
pub use user::User;
pub use verification_token::{hash_token, VerificationToken};
