//! Side-by-side comparison types.

use serde::{Deserialize, Serialize};

use crate::car::{Car, CarColumn};

/// Fewest cars a comparison accepts.
pub const MIN_COMPARED_CARS: usize = 2;
/// Most cars a comparison accepts.
pub const MAX_COMPARED_CARS: usize = 5;

/// Body of `POST /cars/compare`.
///
/// Ids and column names stay raw strings here; the car service validates them
/// so that a malformed id is reported as "not found" rather than a bad body.
#[derive(Debug, Clone, Deserialize)]
pub struct CompareRequest {
    pub car_ids: Vec<String>,
    #[serde(default)]
    pub priority_columns: Option<Vec<String>>,
}

/// One attribute across every compared car, in request order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub column: CarColumn,
    pub values: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CarComparison {
    pub cars: Vec<Car>,
    pub priority_columns: Vec<CarColumn>,
    pub comparison_count: usize,
    /// Priority columns first, then the remaining comparable columns.
    pub table: Vec<ComparisonRow>,
}
