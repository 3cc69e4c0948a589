use std::sync::Arc;

use triage_service::TriageService;
use triage_store::StoreClient;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<TriageService>,
}
impl AppState {
	pub fn new(config: triage_config::Config) -> color_eyre::Result<Self> {
		let store = StoreClient::new(&config.store)?;
		let service = TriageService::new(config, Arc::new(store));

		Ok(Self { service: Arc::new(service) })
	}

	pub fn from_service(service: Arc<TriageService>) -> Self {
		Self { service }
	}
}
