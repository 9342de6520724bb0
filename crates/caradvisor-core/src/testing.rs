//! In-memory fakes for the core ports, shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use caradvisor_types::car::{Car, CarId, FuelType, NewCar, Transmission};
use caradvisor_types::error::RepositoryError;
use caradvisor_types::filter::FilterSet;
use caradvisor_types::llm::{CompletionRequest, CompletionResponse, LlmError, StopReason, Usage};

use crate::llm::provider::LlmProvider;
use crate::repository::car::CarRepository;

/// LLM fake that replays canned replies in order and records every request.
#[derive(Clone)]
pub struct ScriptedLlm {
    replies: Arc<Mutex<VecDeque<Result<String, LlmError>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    delay: Option<Duration>,
}

impl ScriptedLlm {
    pub fn new<S: Into<String>>(replies: impl IntoIterator<Item = S>) -> Self {
        Self::from_results(replies.into_iter().map(|r| Ok(r.into())))
    }

    pub fn from_results(replies: impl IntoIterator<Item = Result<String, LlmError>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().collect())),
            requests: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.requests.lock().unwrap().push(request.clone());
        let reply = self.replies.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(LlmError::Provider {
                message: "script exhausted".to_string(),
            })
        })?;
        Ok(CompletionResponse {
            id: "scripted-1".to_string(),
            content: reply,
            model: request.model.clone(),
            stop_reason: StopReason::EndTurn,
            usage: Usage::default(),
        })
    }
}

/// Catalog fake evaluating filters with [`FilterSet::matches`].
#[derive(Clone, Default)]
pub struct InMemoryCarRepository {
    cars: Arc<Mutex<Vec<Car>>>,
    unavailable: bool,
}

impl InMemoryCarRepository {
    pub fn with_cars(cars: Vec<Car>) -> Self {
        Self {
            cars: Arc::new(Mutex::new(cars)),
            unavailable: false,
        }
    }

    /// A repository whose every call fails with a connection error.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.unavailable {
            return Err(RepositoryError::Connection("catalog offline".to_string()));
        }
        Ok(())
    }
}

impl CarRepository for InMemoryCarRepository {
    async fn find(&self, filters: &FilterSet) -> Result<Vec<Car>, RepositoryError> {
        self.check()?;
        let cars = self.cars.lock().unwrap();
        Ok(cars.iter().filter(|c| filters.matches(c)).cloned().collect())
    }

    async fn get(&self, id: &CarId) -> Result<Option<Car>, RepositoryError> {
        self.check()?;
        let cars = self.cars.lock().unwrap();
        Ok(cars.iter().find(|c| &c.id == id).cloned())
    }

    async fn create(&self, car: &Car) -> Result<Car, RepositoryError> {
        self.check()?;
        self.cars.lock().unwrap().push(car.clone());
        Ok(car.clone())
    }

    async fn update(&self, car: &Car) -> Result<Car, RepositoryError> {
        self.check()?;
        let mut cars = self.cars.lock().unwrap();
        let slot = cars
            .iter_mut()
            .find(|c| c.id == car.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = car.clone();
        Ok(car.clone())
    }

    async fn delete(&self, id: &CarId) -> Result<(), RepositoryError> {
        self.check()?;
        let mut cars = self.cars.lock().unwrap();
        let before = cars.len();
        cars.retain(|c| &c.id != id);
        if cars.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.check()
    }
}

pub fn car(brand: &str, model: &str, color: &str, price: f64, fuel_type: FuelType) -> Car {
    Car::from_new(NewCar {
        brand: brand.to_string(),
        model: model.to_string(),
        year: 2021,
        price,
        fuel_type,
        transmission: Transmission::Automatic,
        seats: 5,
        doors: 5,
        color: color.to_string(),
    })
}

/// A small mixed catalog: two red cars under 20k, one red above, one blue.
pub fn sample_catalog() -> Vec<Car> {
    vec![
        car("Renault", "Clio", "red", 15_000.0, FuelType::Petrol),
        car("Fiat", "500e", "Red", 19_900.0, FuelType::Electric),
        car("Tesla", "Model 3", "red", 42_000.0, FuelType::Electric),
        car("Peugeot", "308", "blue", 18_000.0, FuelType::Diesel),
    ]
}
