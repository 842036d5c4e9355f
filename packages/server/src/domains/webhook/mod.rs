//! Webhook domain - inbound chat event processing.

pub mod arena;
pub mod hub;
pub mod models;
pub mod processor;

pub use arena::{PgArenaFactory, PROCESSING_STATUS_KEY};
pub use hub::ProcessorHub;
pub use models::{
    ActorStatus, Change, ChangeValue, Contact, Entry, Message, ProcessingRecord,
    ProcessingResult, ProcessingState, TextBody, WebhookPayload,
};
pub use processor::WebhookProcessor;
