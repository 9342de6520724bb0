//! SQLite car repository implementation.
//!
//! Implements `CarRepository` from `caradvisor-core` using sqlx with split
//! read/write pools. Numeric and enum constraints become a parameterized
//! WHERE clause. Text constraints are case-insensitive substring matches and
//! are applied to the fetched rows, since SQLite's `LOWER` only folds ASCII.

use caradvisor_core::repository::car::CarRepository;
use caradvisor_types::car::{Car, CarId, FuelType, Transmission};
use caradvisor_types::error::RepositoryError;
use caradvisor_types::filter::{AttributeKind, Constraint, FilterSet, FilterValue};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `CarRepository`.
pub struct SqliteCarRepository {
    pool: DatabasePool,
}

impl SqliteCarRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Car.
struct CarRow {
    id: String,
    brand: String,
    model: String,
    year: i32,
    price: f64,
    fuel_type: String,
    transmission: String,
    seats: i32,
    doors: i32,
    color: String,
    created_at: String,
    updated_at: String,
}

impl CarRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            brand: row.try_get("brand")?,
            model: row.try_get("model")?,
            year: row.try_get("year")?,
            price: row.try_get("price")?,
            fuel_type: row.try_get("fuel_type")?,
            transmission: row.try_get("transmission")?,
            seats: row.try_get("seats")?,
            doors: row.try_get("doors")?,
            color: row.try_get("color")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_car(self) -> Result<Car, RepositoryError> {
        let id = self
            .id
            .parse::<CarId>()
            .map_err(|e| RepositoryError::Query(format!("invalid car id: {e}")))?;

        let fuel_type: FuelType = self
            .fuel_type
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        let transmission: Transmission = self
            .transmission
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(Car {
            id,
            brand: self.brand,
            model: self.model,
            year: self.year,
            price: self.price,
            fuel_type,
            transmission,
            seats: self.seats,
            doors: self.doors,
            color: self.color,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width RFC 3339, so that text order is chronological order.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn rows_to_cars(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Car>, RepositoryError> {
    let mut cars = Vec::with_capacity(rows.len());
    for row in rows {
        let car_row = CarRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
        cars.push(car_row.into_car()?);
    }
    Ok(cars)
}

/// A value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
enum SqlArg {
    Text(String),
    Number(f64),
}

/// Split a filter set into the part SQLite evaluates and the text
/// constraints matched in Rust.
fn split_text_filters(filters: &FilterSet) -> (FilterSet, FilterSet) {
    let mut sql = FilterSet::new();
    let mut text = FilterSet::new();
    for (attribute, constraint) in filters.iter() {
        let target = match attribute.kind() {
            AttributeKind::Text => &mut text,
            _ => &mut sql,
        };
        target.insert(attribute, constraint.clone());
    }
    (sql, text)
}

/// Translate a filter set into a WHERE clause (empty when there are no
/// filters) and its positional arguments. Expects no text constraints.
fn where_clause(filters: &FilterSet) -> (String, Vec<SqlArg>) {
    let mut conditions = Vec::with_capacity(filters.len());
    let mut args = Vec::new();

    for (attribute, constraint) in filters.iter() {
        // Column names come from a closed enum, never from input.
        let column = attribute.column().as_str();
        let condition = match constraint {
            Constraint::Equals(value) => predicate(column, value, &mut args),
            Constraint::Range { min, max } => {
                let mut bounds = Vec::with_capacity(2);
                if let Some(lo) = min {
                    bounds.push(format!("{column} >= ?"));
                    args.push(SqlArg::Number(*lo));
                }
                if let Some(hi) = max {
                    bounds.push(format!("{column} <= ?"));
                    args.push(SqlArg::Number(*hi));
                }
                bounds.join(" AND ")
            }
            Constraint::OneOf(values) => {
                let alternatives: Vec<String> = values
                    .iter()
                    .map(|v| predicate(column, v, &mut args))
                    .collect();
                format!("({})", alternatives.join(" OR "))
            }
        };
        conditions.push(condition);
    }

    if conditions.is_empty() {
        (String::new(), args)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), args)
    }
}

fn predicate(column: &str, value: &FilterValue, args: &mut Vec<SqlArg>) -> String {
    match value {
        FilterValue::Number(n) => args.push(SqlArg::Number(*n)),
        other => args.push(SqlArg::Text(other.to_string())),
    }
    format!("{column} = ?")
}

impl CarRepository for SqliteCarRepository {
    async fn find(&self, filters: &FilterSet) -> Result<Vec<Car>, RepositoryError> {
        let (sql_filters, text_filters) = split_text_filters(filters);
        let (clause, args) = where_clause(&sql_filters);
        let sql = format!("SELECT * FROM cars{clause} ORDER BY created_at DESC, id DESC");

        let mut query = sqlx::query(&sql);
        for arg in args {
            query = match arg {
                SqlArg::Text(s) => query.bind(s),
                SqlArg::Number(n) => query.bind(n),
            };
        }

        let rows = query
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut cars = rows_to_cars(&rows)?;
        if !text_filters.is_empty() {
            cars.retain(|car| text_filters.matches(car));
        }
        Ok(cars)
    }

    async fn get(&self, id: &CarId) -> Result<Option<Car>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM cars WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let car_row =
                    CarRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(car_row.into_car()?))
            }
            None => Ok(None),
        }
    }

    async fn create(&self, car: &Car) -> Result<Car, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO cars (id, brand, model, year, price, fuel_type, transmission, seats, doors, color, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(car.id.to_string())
        .bind(&car.brand)
        .bind(&car.model)
        .bind(car.year)
        .bind(car.price)
        .bind(car.fuel_type.to_string())
        .bind(car.transmission.to_string())
        .bind(car.seats)
        .bind(car.doors)
        .bind(&car.color)
        .bind(format_datetime(&car.created_at))
        .bind(format_datetime(&car.updated_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(car.clone()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => Err(
                RepositoryError::Conflict(format!("car '{}' already exists", car.id)),
            ),
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn update(&self, car: &Car) -> Result<Car, RepositoryError> {
        let result = sqlx::query(
            "UPDATE cars SET brand = ?, model = ?, year = ?, price = ?, fuel_type = ?, transmission = ?, seats = ?, doors = ?, color = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&car.brand)
        .bind(&car.model)
        .bind(car.year)
        .bind(car.price)
        .bind(car.fuel_type.to_string())
        .bind(car.transmission.to_string())
        .bind(car.seats)
        .bind(car.doors)
        .bind(&car.color)
        .bind(format_datetime(&car.updated_at))
        .bind(car.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(car.clone())
    }

    async fn delete(&self, id: &CarId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cars WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;
        Ok(())
    }
}
