//! PostgREST car repository implementation.
//!
//! Implements `CarRepository` against the `cars` table exposed by a PostgREST
//! server. Supabase projects serve it under `{project_url}/rest/v1`.
//!
//! The service key is wrapped in [`SecretString`] and only exposed when
//! building request headers.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use caradvisor_core::repository::car::CarRepository;
use caradvisor_types::car::{Car, CarId, FuelType, Transmission};
use caradvisor_types::error::RepositoryError;
use caradvisor_types::filter::FilterSet;

use super::query::{ORDER, filter_params};

/// PostgREST-backed implementation of `CarRepository`.
///
/// Does NOT derive Debug: it holds the service key.
pub struct RestCarRepository {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
}

/// Writable columns sent on update; id and created_at never change.
#[derive(Serialize)]
struct CarPatch<'a> {
    brand: &'a str,
    model: &'a str,
    year: i32,
    price: f64,
    fuel_type: FuelType,
    transmission: Transmission,
    seats: i32,
    doors: i32,
    color: &'a str,
    updated_at: String,
}

impl<'a> From<&'a Car> for CarPatch<'a> {
    fn from(car: &'a Car) -> Self {
        Self {
            brand: &car.brand,
            model: &car.model,
            year: car.year,
            price: car.price,
            fuel_type: car.fuel_type,
            transmission: car.transmission,
            seats: car.seats,
            doors: car.doors,
            color: &car.color,
            updated_at: car.updated_at.to_rfc3339(),
        }
    }
}

impl RestCarRepository {
    /// Create a repository for the PostgREST server at `base_url`.
    ///
    /// A URL without a `/rest/v1` suffix is treated as a Supabase project URL.
    pub fn new(base_url: &str, api_key: SecretString, timeout: Duration) -> Result<Self, RepositoryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RepositoryError::Connection(format!("failed to build HTTP client: {e}")))?;

        let base = base_url.trim_end_matches('/');
        let endpoint = if base.ends_with("/rest/v1") {
            format!("{base}/cars")
        } else {
            format!("{base}/rest/v1/cars")
        };

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    fn request(&self, method: Method) -> RequestBuilder {
        let key = self.api_key.expose_secret();
        self.client
            .request(method, &self.endpoint)
            .header("apikey", key)
            .bearer_auth(key)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, RepositoryError> {
        let response = builder
            .send()
            .await
            .map_err(|e| RepositoryError::Connection(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::CONFLICT => RepositoryError::Conflict(body),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                RepositoryError::Connection(format!("catalog rejected credentials (HTTP {status})"))
            }
            s if s.is_server_error() => RepositoryError::Connection(format!("HTTP {status}: {body}")),
            _ => RepositoryError::Query(format!("HTTP {status}: {body}")),
        })
    }

    async fn cars(&self, builder: RequestBuilder) -> Result<Vec<Car>, RepositoryError> {
        self.send(builder)
            .await?
            .json::<Vec<Car>>()
            .await
            .map_err(|e| RepositoryError::Query(format!("failed to parse catalog response: {e}")))
    }
}

fn id_eq(id: &CarId) -> [(&'static str, String); 1] {
    [("id", format!("eq.{id}"))]
}

impl CarRepository for RestCarRepository {
    async fn find(&self, filters: &FilterSet) -> Result<Vec<Car>, RepositoryError> {
        let builder = self
            .request(Method::GET)
            .query(&[("select", "*"), ("order", ORDER)])
            .query(&filter_params(filters));
        self.cars(builder).await
    }

    async fn get(&self, id: &CarId) -> Result<Option<Car>, RepositoryError> {
        let builder = self
            .request(Method::GET)
            .query(&[("select", "*")])
            .query(&id_eq(id));
        Ok(self.cars(builder).await?.into_iter().next())
    }

    async fn create(&self, car: &Car) -> Result<Car, RepositoryError> {
        let builder = self
            .request(Method::POST)
            .header("Prefer", "return=representation")
            .json(car);
        self.cars(builder)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::Query("insert returned no row".to_string()))
    }

    async fn update(&self, car: &Car) -> Result<Car, RepositoryError> {
        let builder = self
            .request(Method::PATCH)
            .header("Prefer", "return=representation")
            .query(&id_eq(&car.id))
            .json(&CarPatch::from(car));
        self.cars(builder)
            .await?
            .into_iter()
            .next()
            .ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: &CarId) -> Result<(), RepositoryError> {
        let builder = self
            .request(Method::DELETE)
            .header("Prefer", "return=representation")
            .query(&id_eq(id));
        if self.cars(builder).await?.is_empty() {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        let builder = self
            .request(Method::GET)
            .query(&[("select", "id"), ("limit", "1")]);
        self.send(builder).await.map(|_| ())
    }
}
