// Chat-link verification service.
//
// Authenticates end users by phone number through single-use verification
// links delivered over WhatsApp, and processes inbound chat webhooks to
// drive the signup conversation.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
