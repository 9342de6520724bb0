//! Keyword satisfaction detection and comparison column ordering.

use caradvisor_types::car::CarColumn;
use caradvisor_types::filter::{CarAttribute, FilterSet};

const SATISFACTION_KEYWORDS: &[&str] = &[
    "perfect",
    "great",
    "thanks",
    "thank you",
    "looks good",
    "i'll think",
    "i will think",
    "let me think",
    "appreciate",
    "parfait",
    "merci",
    "super",
    "génial",
    "je vais réfléchir",
];

/// Constrained attributes that promote their column, in display order.
const PROMOTED: [CarAttribute; 7] = [
    CarAttribute::Price,
    CarAttribute::FuelType,
    CarAttribute::Transmission,
    CarAttribute::Seats,
    CarAttribute::Color,
    CarAttribute::Year,
    CarAttribute::Doors,
];

const TRAILING: [CarColumn; 4] = [
    CarColumn::Year,
    CarColumn::Doors,
    CarColumn::CreatedAt,
    CarColumn::UpdatedAt,
];

/// Whether the message sounds like the user is happy with what they saw.
pub fn detect_user_satisfaction(message: &str) -> bool {
    let lower = message.to_lowercase();
    SATISFACTION_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Columns to lead a comparison table with, given the filters in play.
///
/// Brand and model always come first, then the columns the user filtered on,
/// then the remaining descriptive columns. No column appears twice.
pub fn priority_columns(filters: &FilterSet) -> Vec<CarColumn> {
    let mut columns = vec![CarColumn::Brand, CarColumn::Model];
    let promoted = PROMOTED
        .into_iter()
        .filter(|a| filters.contains(*a))
        .map(|a| a.column());
    for column in promoted.chain(TRAILING) {
        if !columns.contains(&column) {
            columns.push(column);
        }
    }
    columns
}
