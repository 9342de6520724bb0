//! Car catalog repository trait definition.

use caradvisor_types::car::{Car, CarId};
use caradvisor_types::error::RepositoryError;
use caradvisor_types::filter::FilterSet;

/// Repository trait for the car catalog.
///
/// Implementations live in caradvisor-infra (SqliteCarRepository,
/// RestCarRepository). Uses native async fn in traits (Rust 2024 edition,
/// no async_trait macro).
pub trait CarRepository: Send + Sync {
    /// Every car satisfying all constraints in `filters`, newest first.
    ///
    /// An empty filter set returns the whole catalog.
    fn find(
        &self,
        filters: &FilterSet,
    ) -> impl std::future::Future<Output = Result<Vec<Car>, RepositoryError>> + Send;

    /// Get a car by its unique ID.
    fn get(
        &self,
        id: &CarId,
    ) -> impl std::future::Future<Output = Result<Option<Car>, RepositoryError>> + Send;

    /// Insert a new car. Returns the stored record.
    fn create(
        &self,
        car: &Car,
    ) -> impl std::future::Future<Output = Result<Car, RepositoryError>> + Send;

    /// Overwrite an existing car. `RepositoryError::NotFound` if it is gone.
    fn update(
        &self,
        car: &Car,
    ) -> impl std::future::Future<Output = Result<Car, RepositoryError>> + Send;

    /// Permanently delete a car. `RepositoryError::NotFound` if absent.
    fn delete(
        &self,
        id: &CarId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Cheap connectivity probe.
    fn ping(&self) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
