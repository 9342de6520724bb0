//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! Services are generic over the repository and LLM traits, but AppState pins
//! them to the concrete infra implementations.

use std::sync::Arc;
use std::time::Duration;

use caradvisor_core::advisor::service::AdvisorService;
use caradvisor_core::llm::LlmSettings;
use caradvisor_core::llm::box_provider::BoxLlmProvider;
use caradvisor_core::service::car::CarService;
use caradvisor_infra::catalog::CatalogStore;
use caradvisor_infra::llm::create_provider;
use caradvisor_types::config::AppConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteCarService = CarService<CatalogStore>;

pub type ConcreteAdvisorService = AdvisorService<CatalogStore, BoxLlmProvider>;

/// Identity reported by `GET /`.
#[derive(Debug, Clone)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub model: String,
}

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub car_service: Arc<ConcreteCarService>,
    pub advisor_service: Arc<ConcreteAdvisorService>,
    pub info: Arc<AppInfo>,
}

impl AppState {
    /// Connect to the catalog and the language model described by `config`.
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let store = CatalogStore::connect(&config.database).await?;
        let llm = create_provider(&config.llm)?;
        Ok(Self::new(config, store, llm))
    }

    /// Wire services around an already-opened catalog and provider.
    pub fn new(config: &AppConfig, store: CatalogStore, llm: BoxLlmProvider) -> Self {
        let store = Arc::new(store);
        let settings = LlmSettings {
            model: config.llm.model.clone(),
            timeout: Duration::from_secs(config.llm.timeout_secs),
        };

        let car_service = CarService::new(Arc::clone(&store));
        let advisor_service = AdvisorService::new(
            store,
            Arc::new(llm),
            settings,
            config.chat.max_history_turns,
        );

        Self {
            car_service: Arc::new(car_service),
            advisor_service: Arc::new(advisor_service),
            info: Arc::new(AppInfo {
                name: config.app.name.clone(),
                version: config.app.version.clone(),
                model: config.llm.model.clone(),
            }),
        }
    }
}
