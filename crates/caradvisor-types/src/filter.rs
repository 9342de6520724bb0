//! Predicate sets used to query the car catalog.
//!
//! A [`FilterSet`] maps a [`CarAttribute`] to a single [`Constraint`]. Filter
//! sets come from two places: manual filters sent by the caller (parsed
//! strictly, bad input is a validation error) and filters extracted from chat
//! messages by the language model (parsed leniently, bad entries are dropped).
//!
//! JSON form, keyed by attribute name:
//!
//! ```json
//! { "color": "red", "price": { "max": 20000 }, "fuel_type": ["electric", "hybrid"] }
//! ```
//!
//! A scalar is an equality, an object with `min`/`max` is an inclusive range,
//! an array is set membership. The flat keys of the first API version
//! (`min_price`, `max_price`, `min_seats`, `max_seats`, `min_year`,
//! `max_year`) are folded into ranges.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value, json};

use crate::car::{Car, CarColumn, FuelType, Transmission};
use crate::error::AdvisorError;

/// Attributes of a car that can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CarAttribute {
    Brand,
    Model,
    Year,
    Price,
    FuelType,
    Transmission,
    Seats,
    Doors,
    Color,
}

/// How values of an attribute are typed and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// Case-insensitive substring match.
    Text,
    Fuel,
    Gearbox,
    Numeric,
}

impl CarAttribute {
    pub const ALL: [CarAttribute; 9] = [
        CarAttribute::Brand,
        CarAttribute::Model,
        CarAttribute::Year,
        CarAttribute::Price,
        CarAttribute::FuelType,
        CarAttribute::Transmission,
        CarAttribute::Seats,
        CarAttribute::Doors,
        CarAttribute::Color,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CarAttribute::Brand => "brand",
            CarAttribute::Model => "model",
            CarAttribute::Year => "year",
            CarAttribute::Price => "price",
            CarAttribute::FuelType => "fuel_type",
            CarAttribute::Transmission => "transmission",
            CarAttribute::Seats => "seats",
            CarAttribute::Doors => "doors",
            CarAttribute::Color => "color",
        }
    }

    pub fn kind(&self) -> AttributeKind {
        match self {
            CarAttribute::Brand | CarAttribute::Model | CarAttribute::Color => AttributeKind::Text,
            CarAttribute::FuelType => AttributeKind::Fuel,
            CarAttribute::Transmission => AttributeKind::Gearbox,
            CarAttribute::Year | CarAttribute::Price | CarAttribute::Seats | CarAttribute::Doors => {
                AttributeKind::Numeric
            }
        }
    }

    /// The catalog column backing this attribute.
    pub fn column(&self) -> CarColumn {
        match self {
            CarAttribute::Brand => CarColumn::Brand,
            CarAttribute::Model => CarColumn::Model,
            CarAttribute::Year => CarColumn::Year,
            CarAttribute::Price => CarColumn::Price,
            CarAttribute::FuelType => CarColumn::FuelType,
            CarAttribute::Transmission => CarColumn::Transmission,
            CarAttribute::Seats => CarColumn::Seats,
            CarAttribute::Doors => CarColumn::Doors,
            CarAttribute::Color => CarColumn::Color,
        }
    }

    /// Read this attribute from a car.
    pub fn value_of(&self, car: &Car) -> FilterValue {
        match self {
            CarAttribute::Brand => FilterValue::Text(car.brand.clone()),
            CarAttribute::Model => FilterValue::Text(car.model.clone()),
            CarAttribute::Color => FilterValue::Text(car.color.clone()),
            CarAttribute::Year => FilterValue::Number(car.year as f64),
            CarAttribute::Price => FilterValue::Number(car.price),
            CarAttribute::Seats => FilterValue::Number(car.seats as f64),
            CarAttribute::Doors => FilterValue::Number(car.doors as f64),
            CarAttribute::FuelType => FilterValue::Fuel(car.fuel_type),
            CarAttribute::Transmission => FilterValue::Gearbox(car.transmission),
        }
    }
}

impl fmt::Display for CarAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CarAttribute {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CarAttribute::ALL
            .into_iter()
            .find(|a| a.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| FilterError::UnknownAttribute(s.to_string()))
    }
}

/// A typed filter operand.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Number(f64),
    Fuel(FuelType),
    Gearbox(Transmission),
}

impl FilterValue {
    fn to_json(&self) -> Value {
        match self {
            FilterValue::Text(s) => json!(s),
            FilterValue::Number(n) => number_json(*n),
            FilterValue::Fuel(f) => json!(f.to_string()),
            FilterValue::Gearbox(t) => json!(t.to_string()),
        }
    }

    /// Whether a car's value satisfies this operand under equality semantics.
    fn accepts(&self, actual: &FilterValue) -> bool {
        match (self, actual) {
            (FilterValue::Text(wanted), FilterValue::Text(have)) => {
                have.to_lowercase().contains(&wanted.to_lowercase())
            }
            (FilterValue::Number(wanted), FilterValue::Number(have)) => {
                (wanted - have).abs() < f64::EPSILON
            }
            (FilterValue::Fuel(wanted), FilterValue::Fuel(have)) => wanted == have,
            (FilterValue::Gearbox(wanted), FilterValue::Gearbox(have)) => wanted == have,
            _ => false,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(s) => f.write_str(s),
            FilterValue::Number(n) => write!(f, "{}", number_json(*n)),
            FilterValue::Fuel(v) => write!(f, "{v}"),
            FilterValue::Gearbox(v) => write!(f, "{v}"),
        }
    }
}

/// A constraint on one attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Equals(FilterValue),
    /// Inclusive bounds; at least one is set.
    Range { min: Option<f64>, max: Option<f64> },
    /// Set membership; never empty.
    OneOf(Vec<FilterValue>),
}

impl Constraint {
    pub fn max(max: f64) -> Self {
        Constraint::Range { min: None, max: Some(max) }
    }

    pub fn min(min: f64) -> Self {
        Constraint::Range { min: Some(min), max: None }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Constraint::Equals(FilterValue::Text(value.into()))
    }

    pub fn fuel(fuel: FuelType) -> Self {
        Constraint::Equals(FilterValue::Fuel(fuel))
    }

    /// Evaluate the constraint against a car attribute value.
    pub fn accepts(&self, actual: &FilterValue) -> bool {
        match self {
            Constraint::Equals(wanted) => wanted.accepts(actual),
            Constraint::Range { min, max } => match *actual {
                FilterValue::Number(n) => {
                    (*min).is_none_or(|lo| n >= lo) && (*max).is_none_or(|hi| n <= hi)
                }
                _ => false,
            },
            Constraint::OneOf(values) => values.iter().any(|v| v.accepts(actual)),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Constraint::Equals(v) => v.to_json(),
            Constraint::Range { min, max } => {
                let mut obj = Map::new();
                if let Some(lo) = min {
                    obj.insert("min".to_string(), number_json(*lo));
                }
                if let Some(hi) = max {
                    obj.insert("max".to_string(), number_json(*hi));
                }
                Value::Object(obj)
            }
            Constraint::OneOf(values) => Value::Array(values.iter().map(FilterValue::to_json).collect()),
        }
    }
}

/// Errors produced while parsing a filter set.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("filters must be a JSON object")]
    NotAnObject,

    #[error("unknown filter attribute: '{0}'")]
    UnknownAttribute(String),

    #[error("invalid value for '{attribute}': {message}")]
    InvalidValue { attribute: String, message: String },
}

impl From<FilterError> for AdvisorError {
    fn from(e: FilterError) -> Self {
        AdvisorError::Validation(e.to_string())
    }
}

/// Mapping from attribute to constraint. Transient, built per request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    constraints: BTreeMap<CarAttribute, Constraint>,
}

/// Which side of a range a flat key contributes to.
#[derive(Clone, Copy)]
enum Bound {
    Min,
    Max,
}

fn legacy_key(key: &str) -> Option<(CarAttribute, Bound)> {
    match key {
        "min_price" => Some((CarAttribute::Price, Bound::Min)),
        "max_price" => Some((CarAttribute::Price, Bound::Max)),
        "min_seats" => Some((CarAttribute::Seats, Bound::Min)),
        "max_seats" => Some((CarAttribute::Seats, Bound::Max)),
        "min_year" => Some((CarAttribute::Year, Bound::Min)),
        "max_year" => Some((CarAttribute::Year, Bound::Max)),
        _ => None,
    }
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and fixed filter sets.
    pub fn with(mut self, attribute: CarAttribute, constraint: Constraint) -> Self {
        self.constraints.insert(attribute, constraint);
        self
    }

    /// Insert or replace the constraint for an attribute.
    pub fn insert(&mut self, attribute: CarAttribute, constraint: Constraint) -> Option<Constraint> {
        self.constraints.insert(attribute, constraint)
    }

    pub fn get(&self, attribute: CarAttribute) -> Option<&Constraint> {
        self.constraints.get(&attribute)
    }

    pub fn contains(&self, attribute: CarAttribute) -> bool {
        self.constraints.contains_key(&attribute)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CarAttribute, &Constraint)> {
        self.constraints.iter().map(|(a, c)| (*a, c))
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Whether a car satisfies every constraint in the set.
    pub fn matches(&self, car: &Car) -> bool {
        self.iter()
            .all(|(attribute, constraint)| constraint.accepts(&attribute.value_of(car)))
    }

    /// Parse a filter object, rejecting anything malformed.
    pub fn parse(value: &Value) -> Result<FilterSet, FilterError> {
        let (set, _) = Self::parse_with(value, true)?;
        Ok(set)
    }

    /// Parse a filter object, dropping malformed entries.
    ///
    /// Returns the usable filters along with the errors for every dropped entry.
    pub fn parse_lenient(value: &Value) -> (FilterSet, Vec<FilterError>) {
        match Self::parse_with(value, false) {
            Ok(parsed) => parsed,
            Err(e) => (FilterSet::new(), vec![e]),
        }
    }

    fn parse_with(value: &Value, strict: bool) -> Result<(FilterSet, Vec<FilterError>), FilterError> {
        let obj = match value {
            Value::Null => return Ok((FilterSet::new(), Vec::new())),
            Value::Object(obj) => obj,
            _ => return Err(FilterError::NotAnObject),
        };

        let mut set = FilterSet::new();
        let mut dropped = Vec::new();
        let mut bounds: BTreeMap<CarAttribute, (Option<f64>, Option<f64>)> = BTreeMap::new();

        let reject = |err: FilterError, dropped: &mut Vec<FilterError>| {
            if strict {
                Err(err)
            } else {
                dropped.push(err);
                Ok(())
            }
        };

        for (key, raw) in obj {
            if raw.is_null() {
                continue;
            }
            let key = key.trim().to_lowercase();

            if let Some((attribute, bound)) = legacy_key(&key) {
                match parse_number(attribute, raw) {
                    Ok(n) => {
                        let entry = bounds.entry(attribute).or_default();
                        match bound {
                            Bound::Min => entry.0 = Some(n),
                            Bound::Max => entry.1 = Some(n),
                        }
                    }
                    Err(e) => reject(e, &mut dropped)?,
                }
                continue;
            }

            let parsed = key
                .parse::<CarAttribute>()
                .and_then(|attribute| parse_constraint(attribute, raw).map(|c| (attribute, c)));
            match parsed {
                Ok((attribute, constraint)) => {
                    set.insert(attribute, constraint);
                }
                Err(e) => reject(e, &mut dropped)?,
            }
        }

        for (attribute, (min, max)) in bounds {
            let merged = match set.get(attribute) {
                None => Some((min, max)),
                Some(&Constraint::Range { min: lo, max: hi }) => Some((lo.or(min), hi.or(max))),
                Some(_) => None,
            };
            let result = match merged {
                Some((min, max)) => check_range(attribute, min, max),
                None => Err(invalid(attribute, "conflicts with an explicit constraint")),
            };
            match result {
                Ok(constraint) => {
                    set.insert(attribute, constraint);
                }
                Err(e) => reject(e, &mut dropped)?,
            }
        }

        Ok((set, dropped))
    }

    pub fn to_json(&self) -> Value {
        let obj: Map<String, Value> = self
            .iter()
            .map(|(a, c)| (a.as_str().to_string(), c.to_json()))
            .collect();
        Value::Object(obj)
    }
}

impl fmt::Display for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for FilterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FilterSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        FilterSet::parse(&value).map_err(D::Error::custom)
    }
}

fn invalid(attribute: CarAttribute, message: impl Into<String>) -> FilterError {
    FilterError::InvalidValue {
        attribute: attribute.as_str().to_string(),
        message: message.into(),
    }
}

fn number_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        json!(n as i64)
    } else {
        json!(n)
    }
}

fn parse_number(attribute: CarAttribute, raw: &Value) -> Result<f64, FilterError> {
    let n = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(invalid(attribute, format!("expected a number, got {raw}"))),
    }
}

fn parse_scalar(attribute: CarAttribute, raw: &Value) -> Result<FilterValue, FilterError> {
    match attribute.kind() {
        AttributeKind::Numeric => parse_number(attribute, raw).map(FilterValue::Number),
        kind => {
            let s = raw
                .as_str()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| invalid(attribute, format!("expected a non-empty string, got {raw}")))?;
            match kind {
                AttributeKind::Fuel => s
                    .parse::<FuelType>()
                    .map(FilterValue::Fuel)
                    .map_err(|e| invalid(attribute, e)),
                AttributeKind::Gearbox => s
                    .parse::<Transmission>()
                    .map(FilterValue::Gearbox)
                    .map_err(|e| invalid(attribute, e)),
                _ => Ok(FilterValue::Text(s.to_string())),
            }
        }
    }
}

fn check_range(
    attribute: CarAttribute,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<Constraint, FilterError> {
    if attribute.kind() != AttributeKind::Numeric {
        return Err(invalid(attribute, "ranges are only allowed on numeric attributes"));
    }
    match (min, max) {
        (None, None) => Err(invalid(attribute, "range needs 'min' or 'max'")),
        (Some(lo), Some(hi)) if lo > hi => {
            Err(invalid(attribute, format!("min {lo} is greater than max {hi}")))
        }
        _ => Ok(Constraint::Range { min, max }),
    }
}

fn parse_constraint(attribute: CarAttribute, raw: &Value) -> Result<Constraint, FilterError> {
    match raw {
        Value::Object(obj) => {
            let mut min = None;
            let mut max = None;
            for (key, bound) in obj {
                if bound.is_null() {
                    continue;
                }
                match key.as_str() {
                    "min" => min = Some(parse_number(attribute, bound)?),
                    "max" => max = Some(parse_number(attribute, bound)?),
                    other => return Err(invalid(attribute, format!("unknown range key '{other}'"))),
                }
            }
            check_range(attribute, min, max)
        }
        Value::Array(items) => {
            let mut values: Vec<FilterValue> = Vec::with_capacity(items.len());
            for item in items {
                let value = parse_scalar(attribute, item)?;
                if !values.contains(&value) {
                    values.push(value);
                }
            }
            if values.is_empty() {
                return Err(invalid(attribute, "empty list"));
            }
            Ok(Constraint::OneOf(values))
        }
        scalar => parse_scalar(attribute, scalar).map(Constraint::Equals),
    }
}
