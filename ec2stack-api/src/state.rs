use crate::config::Config;
use ec2stack_cloudstack::{CloudStackTransport, InMemoryCloudStack, Requester, RequesterConfig};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub requester: Requester,
    pub config: Arc<Config>,
}

impl AppState {
    /// State backed by an in-memory CloudStack seeded with the configured
    /// sandbox volumes (`id` or `id:name`).
    pub fn new(config: Config) -> Self {
        let backend = config
            .sandbox_volumes
            .iter()
            .fold(InMemoryCloudStack::new(), |backend, entry| {
                let (id, name) = entry.split_once(':').unwrap_or((entry, entry));
                backend.with_volume(id, name)
            });

        Self::with_transport(config, Arc::new(backend))
    }

    pub fn with_transport(config: Config, transport: Arc<dyn CloudStackTransport>) -> Self {
        let requester_config = RequesterConfig {
            poll_interval: config.job_poll_interval(),
            max_polls: config.job_max_polls,
        };

        Self {
            requester: Requester::new(transport, requester_config),
            config: Arc::new(config),
        }
    }
}
