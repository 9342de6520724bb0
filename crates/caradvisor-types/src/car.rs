use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::error::AdvisorError;

/// Earliest accepted year of manufacture.
pub const MIN_YEAR: i32 = 1900;
/// Latest accepted year of manufacture.
pub const MAX_YEAR: i32 = 2030;
pub const MIN_SEATS: i32 = 2;
pub const MAX_SEATS: i32 = 9;
pub const MIN_DOORS: i32 = 2;
pub const MAX_DOORS: i32 = 5;

/// Unique identifier for a car, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CarId(pub Uuid);

impl CarId {
    /// Create a new CarId using UUID v7.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for CarId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CarId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

/// Fuel types accepted by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    Petrol,
    Diesel,
    Electric,
    Hybrid,
    PlugInHybrid,
}

impl FuelType {
    pub const ALL: [FuelType; 5] = [
        FuelType::Petrol,
        FuelType::Diesel,
        FuelType::Electric,
        FuelType::Hybrid,
        FuelType::PlugInHybrid,
    ];
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FuelType::Petrol => write!(f, "petrol"),
            FuelType::Diesel => write!(f, "diesel"),
            FuelType::Electric => write!(f, "electric"),
            FuelType::Hybrid => write!(f, "hybrid"),
            FuelType::PlugInHybrid => write!(f, "plug_in_hybrid"),
        }
    }
}

impl FromStr for FuelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "petrol" | "gasoline" => Ok(FuelType::Petrol),
            "diesel" => Ok(FuelType::Diesel),
            "electric" => Ok(FuelType::Electric),
            "hybrid" => Ok(FuelType::Hybrid),
            "plug_in_hybrid" => Ok(FuelType::PlugInHybrid),
            other => Err(format!("invalid fuel type: '{other}'")),
        }
    }
}

/// Gearbox types accepted by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transmission {
    Manual,
    Automatic,
}

impl fmt::Display for Transmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transmission::Manual => write!(f, "manual"),
            Transmission::Automatic => write!(f, "automatic"),
        }
    }
}

impl FromStr for Transmission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Ok(Transmission::Manual),
            "automatic" => Ok(Transmission::Automatic),
            other => Err(format!("invalid transmission: '{other}'")),
        }
    }
}

/// Current time at microsecond precision, the finest the catalog stores.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A car in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub id: CarId,
    pub brand: String,
    pub model: String,
    /// Year of manufacture.
    pub year: i32,
    /// Price in euros.
    pub price: f64,
    pub fuel_type: FuelType,
    pub transmission: Transmission,
    pub seats: i32,
    pub doors: i32,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Car {
    /// Build a new catalog record from a validated creation request.
    pub fn from_new(new: NewCar) -> Self {
        let now = timestamp_now();
        Self {
            id: CarId::new(),
            brand: new.brand.trim().to_string(),
            model: new.model.trim().to_string(),
            year: new.year,
            price: new.price,
            fuel_type: new.fuel_type,
            transmission: new.transmission,
            seats: new.seats,
            doors: new.doors,
            color: new.color.trim().to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update in place and bump `updated_at`.
    pub fn apply(&mut self, update: CarUpdate) {
        if let Some(brand) = update.brand {
            self.brand = brand.trim().to_string();
        }
        if let Some(model) = update.model {
            self.model = model.trim().to_string();
        }
        if let Some(year) = update.year {
            self.year = year;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(fuel_type) = update.fuel_type {
            self.fuel_type = fuel_type;
        }
        if let Some(transmission) = update.transmission {
            self.transmission = transmission;
        }
        if let Some(seats) = update.seats {
            self.seats = seats;
        }
        if let Some(doors) = update.doors {
            self.doors = doors;
        }
        if let Some(color) = update.color {
            self.color = color.trim().to_string();
        }
        self.updated_at = timestamp_now();
    }

    /// The value of a single column, as it appears in API payloads.
    pub fn column_value(&self, column: CarColumn) -> serde_json::Value {
        use serde_json::json;
        match column {
            CarColumn::Id => json!(self.id.to_string()),
            CarColumn::Brand => json!(self.brand),
            CarColumn::Model => json!(self.model),
            CarColumn::Year => json!(self.year),
            CarColumn::Price => json!(self.price),
            CarColumn::FuelType => json!(self.fuel_type.to_string()),
            CarColumn::Transmission => json!(self.transmission.to_string()),
            CarColumn::Seats => json!(self.seats),
            CarColumn::Doors => json!(self.doors),
            CarColumn::Color => json!(self.color),
            CarColumn::CreatedAt => json!(self.created_at.to_rfc3339()),
            CarColumn::UpdatedAt => json!(self.updated_at.to_rfc3339()),
        }
    }
}

/// Request to add a car to the catalog. Every field is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCar {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    pub fuel_type: FuelType,
    pub transmission: Transmission,
    pub seats: i32,
    pub doors: i32,
    pub color: String,
}

impl NewCar {
    pub fn validate(&self) -> Result<(), AdvisorError> {
        check_text("brand", &self.brand, 100)?;
        check_text("model", &self.model, 100)?;
        check_range("year", self.year, MIN_YEAR, MAX_YEAR)?;
        check_price(self.price)?;
        check_range("seats", self.seats, MIN_SEATS, MAX_SEATS)?;
        check_range("doors", self.doors, MIN_DOORS, MAX_DOORS)?;
        check_text("color", &self.color, 50)
    }
}

/// Partial update of a car. Only provided fields change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<FuelType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmission: Option<Transmission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seats: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doors: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl CarUpdate {
    pub fn is_empty(&self) -> bool {
        self == &CarUpdate::default()
    }

    /// Validate the fields that are present; an update with no fields is rejected.
    pub fn validate(&self) -> Result<(), AdvisorError> {
        if self.is_empty() {
            return Err(AdvisorError::Validation("no fields to update".to_string()));
        }
        if let Some(ref brand) = self.brand {
            check_text("brand", brand, 100)?;
        }
        if let Some(ref model) = self.model {
            check_text("model", model, 100)?;
        }
        if let Some(year) = self.year {
            check_range("year", year, MIN_YEAR, MAX_YEAR)?;
        }
        if let Some(price) = self.price {
            check_price(price)?;
        }
        if let Some(seats) = self.seats {
            check_range("seats", seats, MIN_SEATS, MAX_SEATS)?;
        }
        if let Some(doors) = self.doors {
            check_range("doors", doors, MIN_DOORS, MAX_DOORS)?;
        }
        if let Some(ref color) = self.color {
            check_text("color", color, 50)?;
        }
        Ok(())
    }
}

fn check_text(field: &str, value: &str, max_len: usize) -> Result<(), AdvisorError> {
    let len = value.trim().chars().count();
    if len == 0 || len > max_len {
        return Err(AdvisorError::Validation(format!(
            "{field} must be between 1 and {max_len} characters"
        )));
    }
    Ok(())
}

fn check_range(field: &str, value: i32, min: i32, max: i32) -> Result<(), AdvisorError> {
    if !(min..=max).contains(&value) {
        return Err(AdvisorError::Validation(format!(
            "{field} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

fn check_price(price: f64) -> Result<(), AdvisorError> {
    if !price.is_finite() || price < 0.0 {
        return Err(AdvisorError::Validation(format!(
            "price must be a non-negative number, got {price}"
        )));
    }
    Ok(())
}

/// Columns of the car table, used for comparison tables and priority ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarColumn {
    Id,
    Brand,
    Model,
    Year,
    Price,
    FuelType,
    Transmission,
    Seats,
    Doors,
    Color,
    CreatedAt,
    UpdatedAt,
}

impl CarColumn {
    /// Every column shown in a comparison table, in table order.
    pub const COMPARABLE: [CarColumn; 11] = [
        CarColumn::Brand,
        CarColumn::Model,
        CarColumn::Price,
        CarColumn::FuelType,
        CarColumn::Transmission,
        CarColumn::Seats,
        CarColumn::Doors,
        CarColumn::Color,
        CarColumn::Year,
        CarColumn::CreatedAt,
        CarColumn::UpdatedAt,
    ];

    /// Default comparison priority when the caller sends none.
    pub const DEFAULT_PRIORITY: [CarColumn; 9] = [
        CarColumn::Brand,
        CarColumn::Model,
        CarColumn::Price,
        CarColumn::FuelType,
        CarColumn::Transmission,
        CarColumn::Seats,
        CarColumn::Doors,
        CarColumn::Color,
        CarColumn::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CarColumn::Id => "id",
            CarColumn::Brand => "brand",
            CarColumn::Model => "model",
            CarColumn::Year => "year",
            CarColumn::Price => "price",
            CarColumn::FuelType => "fuel_type",
            CarColumn::Transmission => "transmission",
            CarColumn::Seats => "seats",
            CarColumn::Doors => "doors",
            CarColumn::Color => "color",
            CarColumn::CreatedAt => "created_at",
            CarColumn::UpdatedAt => "updated_at",
        }
    }
}

impl fmt::Display for CarColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CarColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "id" => Ok(CarColumn::Id),
            "brand" => Ok(CarColumn::Brand),
            "model" => Ok(CarColumn::Model),
            "year" => Ok(CarColumn::Year),
            "price" => Ok(CarColumn::Price),
            "fuel_type" => Ok(CarColumn::FuelType),
            "transmission" => Ok(CarColumn::Transmission),
            "seats" => Ok(CarColumn::Seats),
            "doors" => Ok(CarColumn::Doors),
            "color" => Ok(CarColumn::Color),
            "created_at" => Ok(CarColumn::CreatedAt),
            "updated_at" => Ok(CarColumn::UpdatedAt),
            other => Err(format!("unknown column: '{other}'")),
        }
    }
}
