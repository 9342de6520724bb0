//! Car catalog service.
//!
//! CRUD over the catalog with input validation, plus side-by-side comparison.
//! Ids arrive as raw strings from the HTTP layer; a string that is not a UUID
//! cannot name a car, so it is reported as not found.

use std::collections::HashSet;
use std::sync::Arc;

use caradvisor_types::car::{Car, CarColumn, CarId, CarUpdate, NewCar};
use caradvisor_types::compare::{
    CarComparison, CompareRequest, ComparisonRow, MAX_COMPARED_CARS, MIN_COMPARED_CARS,
};
use caradvisor_types::error::{AdvisorError, RepositoryError};
use caradvisor_types::filter::FilterSet;

use crate::repository::car::CarRepository;

pub struct CarService<R: CarRepository> {
    repo: Arc<R>,
}

impl<R: CarRepository> CarService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Every car matching `filters`, newest first.
    pub async fn list(&self, filters: &FilterSet) -> Result<Vec<Car>, AdvisorError> {
        Ok(self.repo.find(filters).await?)
    }

    pub async fn get(&self, id: &str) -> Result<Car, AdvisorError> {
        let id = parse_id(id)?;
        self.repo.get(&id).await?.ok_or_else(car_not_found)
    }

    pub async fn create(&self, new: NewCar) -> Result<Car, AdvisorError> {
        new.validate()?;
        let car = Car::from_new(new);
        let created = self.repo.create(&car).await?;
        tracing::info!(car_id = %created.id, brand = %created.brand, model = %created.model, "Car created");
        Ok(created)
    }

    /// Apply a partial update. Only the fields present in `update` change.
    pub async fn update(&self, id: &str, update: CarUpdate) -> Result<Car, AdvisorError> {
        update.validate()?;
        let mut car = self.get(id).await?;
        car.apply(update);
        self.repo.update(&car).await.map_err(not_found_as_car)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AdvisorError> {
        let id = parse_id(id)?;
        self.repo.delete(&id).await.map_err(not_found_as_car)?;
        tracing::info!(car_id = %id, "Car deleted");
        Ok(())
    }

    /// Compare 2 to 5 distinct cars attribute by attribute.
    pub async fn compare(&self, request: CompareRequest) -> Result<CarComparison, AdvisorError> {
        let count = request.car_ids.len();
        if count < MIN_COMPARED_CARS {
            return Err(AdvisorError::Validation(format!(
                "at least {MIN_COMPARED_CARS} cars are required for comparison"
            )));
        }
        if count > MAX_COMPARED_CARS {
            return Err(AdvisorError::Validation(format!(
                "at most {MAX_COMPARED_CARS} cars can be compared at once"
            )));
        }

        let priority_columns = match request.priority_columns {
            Some(names) if !names.is_empty() => parse_columns(&names)?,
            _ => CarColumn::DEFAULT_PRIORITY.to_vec(),
        };

        let mut seen = HashSet::with_capacity(count);
        let mut cars = Vec::with_capacity(count);
        for raw in &request.car_ids {
            let id = parse_id(raw)?;
            if !seen.insert(id) {
                return Err(AdvisorError::Validation(format!(
                    "car {id} is listed more than once"
                )));
            }
            let car = self
                .repo
                .get(&id)
                .await?
                .ok_or_else(|| AdvisorError::NotFound(format!("car {id}")))?;
            cars.push(car);
        }

        let table = comparison_table(&cars, &priority_columns);
        Ok(CarComparison {
            comparison_count: cars.len(),
            cars,
            priority_columns,
            table,
        })
    }

    /// Connectivity probe for health checks.
    pub async fn ping(&self) -> Result<(), AdvisorError> {
        Ok(self.repo.ping().await?)
    }
}

fn car_not_found() -> AdvisorError {
    AdvisorError::NotFound("car".to_string())
}

fn parse_id(raw: &str) -> Result<CarId, AdvisorError> {
    raw.parse::<CarId>().map_err(|_| car_not_found())
}

fn not_found_as_car(e: RepositoryError) -> AdvisorError {
    match e {
        RepositoryError::NotFound => car_not_found(),
        other => other.into(),
    }
}

fn parse_columns(names: &[String]) -> Result<Vec<CarColumn>, AdvisorError> {
    let mut columns = Vec::with_capacity(names.len());
    for name in names {
        let column: CarColumn = name
            .parse()
            .map_err(|_| AdvisorError::Validation(format!("unknown column '{name}'")))?;
        if !columns.contains(&column) {
            columns.push(column);
        }
    }
    Ok(columns)
}

/// One row per column: the priority columns first, then every other
/// comparable column in table order.
fn comparison_table(cars: &[Car], priority: &[CarColumn]) -> Vec<ComparisonRow> {
    let rest = CarColumn::COMPARABLE
        .into_iter()
        .filter(|c| !priority.contains(c));
    priority
        .iter()
        .copied()
        .chain(rest)
        .map(|column| ComparisonRow {
            column,
            values: cars.iter().map(|car| car.column_value(column)).collect(),
        })
        .collect()
}
