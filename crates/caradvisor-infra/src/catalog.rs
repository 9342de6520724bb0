//! Catalog store selection.
//!
//! The database URL decides the backend: `sqlite:` opens the embedded SQLite
//! catalog (running migrations), `http(s)://` talks to a hosted PostgREST
//! endpoint. `CarRepository` uses native async traits and is not object-safe,
//! so the two backends are dispatched through an enum.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use caradvisor_core::repository::car::CarRepository;
use caradvisor_types::car::{Car, CarId};
use caradvisor_types::config::{DatabaseBackend, DatabaseSection};
use caradvisor_types::error::RepositoryError;
use caradvisor_types::filter::FilterSet;

use crate::rest::car::RestCarRepository;
use crate::sqlite::car::SqliteCarRepository;
use crate::sqlite::pool::DatabasePool;

pub enum CatalogStore {
    Sqlite(SqliteCarRepository),
    Rest(RestCarRepository),
}

impl CatalogStore {
    /// Open the catalog described by `config`.
    pub async fn connect(config: &DatabaseSection) -> Result<Self, RepositoryError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        match config.backend() {
            Some(DatabaseBackend::Sqlite) => {
                let pool = DatabasePool::new(&config.url, timeout)
                    .await
                    .map_err(|e| RepositoryError::Connection(e.to_string()))?;
                tracing::info!(url = %config.url, "opened SQLite catalog");
                Ok(Self::Sqlite(SqliteCarRepository::new(pool)))
            }
            Some(DatabaseBackend::Rest) => {
                let key = config.key.as_ref().ok_or_else(|| {
                    RepositoryError::Connection("DATABASE_KEY is required for a hosted catalog".to_string())
                })?;
                let key = SecretString::from(key.expose_secret().to_string());
                let repo = RestCarRepository::new(&config.url, key, timeout)?;
                tracing::info!(url = %config.url, "using hosted catalog");
                Ok(Self::Rest(repo))
            }
            None => Err(RepositoryError::Connection(format!(
                "unsupported database URL: {}",
                config.url
            ))),
        }
    }

    pub fn backend(&self) -> DatabaseBackend {
        match self {
            Self::Sqlite(_) => DatabaseBackend::Sqlite,
            Self::Rest(_) => DatabaseBackend::Rest,
        }
    }
}

impl CarRepository for CatalogStore {
    async fn find(&self, filters: &FilterSet) -> Result<Vec<Car>, RepositoryError> {
        match self {
            Self::Sqlite(repo) => repo.find(filters).await,
            Self::Rest(repo) => repo.find(filters).await,
        }
    }

    async fn get(&self, id: &CarId) -> Result<Option<Car>, RepositoryError> {
        match self {
            Self::Sqlite(repo) => repo.get(id).await,
            Self::Rest(repo) => repo.get(id).await,
        }
    }

    async fn create(&self, car: &Car) -> Result<Car, RepositoryError> {
        match self {
            Self::Sqlite(repo) => repo.create(car).await,
            Self::Rest(repo) => repo.create(car).await,
        }
    }

    async fn update(&self, car: &Car) -> Result<Car, RepositoryError> {
        match self {
            Self::Sqlite(repo) => repo.update(car).await,
            Self::Rest(repo) => repo.update(car).await,
        }
    }

    async fn delete(&self, id: &CarId) -> Result<(), RepositoryError> {
        match self {
            Self::Sqlite(repo) => repo.delete(id).await,
            Self::Rest(repo) => repo.delete(id).await,
        }
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        match self {
            Self::Sqlite(repo) => repo.ping().await,
            Self::Rest(repo) => repo.ping().await,
        }
    }
}
