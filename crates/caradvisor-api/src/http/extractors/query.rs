//! Query parameters for the car list endpoint.

use serde::Deserialize;

use caradvisor_types::car::{FuelType, MAX_SEATS, MIN_SEATS, Transmission};
use caradvisor_types::error::AdvisorError;
use caradvisor_types::filter::{CarAttribute, Constraint, FilterSet, FilterValue};

/// Query parameters for `GET /cars`. Every parameter is optional.
#[derive(Debug, Deserialize, Default)]
pub struct CarListQuery {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_seats: Option<i32>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
}

impl CarListQuery {
    /// Translate the parameters into a filter set.
    pub fn to_filters(&self) -> Result<FilterSet, AdvisorError> {
        let mut filters = FilterSet::new();

        let texts = [
            (CarAttribute::Brand, &self.brand),
            (CarAttribute::Model, &self.model),
            (CarAttribute::Color, &self.color),
        ];
        for (attribute, value) in texts {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                filters.insert(attribute, Constraint::text(value));
            }
        }

        if let Some(fuel) = &self.fuel_type {
            let fuel: FuelType = fuel.parse().map_err(AdvisorError::Validation)?;
            filters.insert(CarAttribute::FuelType, Constraint::fuel(fuel));
        }
        if let Some(transmission) = &self.transmission {
            let gearbox: Transmission = transmission.parse().map_err(AdvisorError::Validation)?;
            filters.insert(
                CarAttribute::Transmission,
                Constraint::Equals(FilterValue::Gearbox(gearbox)),
            );
        }

        for (name, bound) in [("min_price", self.min_price), ("max_price", self.max_price)] {
            if let Some(price) = bound.filter(|p| !p.is_finite() || *p < 0.0) {
                return Err(AdvisorError::Validation(format!(
                    "{name} must be a non-negative number, got {price}"
                )));
            }
        }
        if let Some(range) = range("price", self.min_price, self.max_price)? {
            filters.insert(CarAttribute::Price, range);
        }
        if let Some(seats) = self.min_seats {
            if !(MIN_SEATS..=MAX_SEATS).contains(&seats) {
                return Err(AdvisorError::Validation(format!(
                    "min_seats must be between {MIN_SEATS} and {MAX_SEATS}, got {seats}"
                )));
            }
            filters.insert(CarAttribute::Seats, Constraint::min(f64::from(seats)));
        }
        let (min_year, max_year) = (self.min_year.map(f64::from), self.max_year.map(f64::from));
        if let Some(range) = range("year", min_year, max_year)? {
            filters.insert(CarAttribute::Year, range);
        }

        Ok(filters)
    }
}

fn range(name: &str, min: Option<f64>, max: Option<f64>) -> Result<Option<Constraint>, AdvisorError> {
    match (min, max) {
        (None, None) => Ok(None),
        (Some(lo), Some(hi)) if lo > hi => Err(AdvisorError::Validation(format!(
            "min_{name} cannot exceed max_{name}"
        ))),
        (min, max) => Ok(Some(Constraint::Range { min, max })),
    }
}
