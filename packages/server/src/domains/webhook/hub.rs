//! Hands out one webhook processor per conversation partition.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domains::webhook::processor::WebhookProcessor;
use crate::kernel::{BaseArenaFactory, BaseMessagingGateway, BaseSignupService};

/// Registry of live actor instances, keyed by partition (normalized
/// sender phone number). Each instance serializes its own events; the hub
/// itself only guards the map.
pub struct ProcessorHub {
    processors: RwLock<HashMap<String, Arc<WebhookProcessor>>>,
    gateway: Arc<dyn BaseMessagingGateway>,
    signup: Arc<dyn BaseSignupService>,
    arenas: Arc<dyn BaseArenaFactory>,
    verification_base_url: String,
}

impl ProcessorHub {
    pub fn new(
        gateway: Arc<dyn BaseMessagingGateway>,
        signup: Arc<dyn BaseSignupService>,
        arenas: Arc<dyn BaseArenaFactory>,
        verification_base_url: String,
    ) -> Self {
        Self {
            processors: RwLock::new(HashMap::new()),
            gateway,
            signup,
            arenas,
            verification_base_url,
        }
    }

    /// Get or create the processor for a partition key
    pub async fn processor_for(&self, partition_key: &str) -> Arc<WebhookProcessor> {
        if let Some(processor) = self.processors.read().await.get(partition_key) {
            return processor.clone();
        }

        let mut processors = self.processors.write().await;
        processors
            .entry(partition_key.to_string())
            .or_insert_with(|| {
                Arc::new(WebhookProcessor::new(
                    partition_key.to_string(),
                    self.arenas.arena_for(partition_key),
                    self.gateway.clone(),
                    self.signup.clone(),
                    self.verification_base_url.clone(),
                ))
            })
            .clone()
    }
}
