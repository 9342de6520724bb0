//! Car catalog handlers: CRUD and side-by-side comparison.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Serialize;

use caradvisor_types::car::{Car, CarUpdate, NewCar};
use caradvisor_types::compare::{CarComparison, CompareRequest};

use crate::http::error::AppError;
use crate::http::extractors::json::{AppJson, AppQuery};
use crate::http::extractors::query::CarListQuery;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: String,
    pub deleted: bool,
}

/// GET /cars - List cars, optionally filtered by query parameters.
pub async fn list_cars(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CarListQuery>,
) -> Result<Json<ApiResponse<Vec<Car>>>, AppError> {
    let clock = RequestClock::start();
    let filters = query.to_filters()?;
    let cars = state.car_service.list(&filters).await?;
    Ok(Json(clock.respond(cars).with_link("self", "/cars")))
}

/// GET /cars/{id} - Fetch one car.
pub async fn get_car(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Car>>, AppError> {
    let clock = RequestClock::start();
    let car = state.car_service.get(&id).await?;
    let href = format!("/cars/{}", car.id);
    Ok(Json(clock.respond(car).with_link("self", &href)))
}

/// POST /cars - Add a car to the catalog.
pub async fn create_car(
    State(state): State<AppState>,
    AppJson(body): AppJson<NewCar>,
) -> Result<(StatusCode, Json<ApiResponse<Car>>), AppError> {
    let clock = RequestClock::start();
    let car = state.car_service.create(body).await?;
    let href = format!("/cars/{}", car.id);
    Ok((StatusCode::CREATED, Json(clock.respond(car).with_link("self", &href))))
}

/// PUT /cars/{id} - Partial update; only provided fields change.
pub async fn update_car(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(body): AppJson<CarUpdate>,
) -> Result<Json<ApiResponse<Car>>, AppError> {
    let clock = RequestClock::start();
    let car = state.car_service.update(&id, body).await?;
    let href = format!("/cars/{}", car.id);
    Ok(Json(clock.respond(car).with_link("self", &href)))
}

/// DELETE /cars/{id} - Remove a car.
pub async fn delete_car(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Deleted>>, AppError> {
    let clock = RequestClock::start();
    state.car_service.delete(&id).await?;
    Ok(Json(clock.respond(Deleted { id, deleted: true })))
}

/// POST /cars/compare - Compare 2 to 5 cars attribute by attribute.
pub async fn compare_cars(
    State(state): State<AppState>,
    AppJson(body): AppJson<CompareRequest>,
) -> Result<Json<ApiResponse<CarComparison>>, AppError> {
    let clock = RequestClock::start();
    let comparison = state.car_service.compare(body).await?;
    Ok(Json(clock.respond(comparison)))
}
