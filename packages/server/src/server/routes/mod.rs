// HTTP routes
pub mod auth;
pub mod health;
pub mod webhook;

pub use auth::*;
pub use health::*;
pub use webhook::*;
