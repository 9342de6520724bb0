//! Translation of filter sets into PostgREST query parameters.
//!
//! Text attributes become `ilike` substring patterns (`color=ilike.*red*`),
//! ranges become `gte`/`lte` pairs, and set membership becomes `in.(...)`.
//! Text set membership has no single-column operator and goes through an
//! `or=(...)` logic tree.

use caradvisor_types::filter::{AttributeKind, CarAttribute, Constraint, FilterSet, FilterValue};

/// Newest first, id as a tiebreaker.
pub const ORDER: &str = "created_at.desc,id.desc";

/// Query parameters selecting the cars that satisfy `filters`.
pub fn filter_params(filters: &FilterSet) -> Vec<(String, String)> {
    let mut params = Vec::with_capacity(filters.len() + 1);
    let mut or_groups = Vec::new();

    for (attribute, constraint) in filters.iter() {
        let column = attribute.column().as_str().to_string();
        match constraint {
            Constraint::Equals(value) => params.push((column, equals(attribute, value))),
            Constraint::Range { min, max } => {
                if let Some(lo) = min {
                    params.push((column.clone(), format!("gte.{}", number(*lo))));
                }
                if let Some(hi) = max {
                    params.push((column, format!("lte.{}", number(*hi))));
                }
            }
            Constraint::OneOf(values) if attribute.kind() == AttributeKind::Text => {
                let alternatives: Vec<String> = values
                    .iter()
                    .map(|v| format!("{column}.ilike.{}", quote(&pattern(&v.to_string()))))
                    .collect();
                or_groups.push(format!("or({})", alternatives.join(",")));
            }
            Constraint::OneOf(values) => {
                let list: Vec<String> = values.iter().map(scalar).collect();
                params.push((column, format!("in.({})", list.join(","))));
            }
        }
    }

    match or_groups.len() {
        0 => {}
        1 => {
            // "or(a,b)" -> "(a,b)"
            let group = or_groups.remove(0);
            params.push(("or".to_string(), group["or".len()..].to_string()));
        }
        _ => params.push(("and".to_string(), format!("({})", or_groups.join(",")))),
    }

    params
}

fn equals(attribute: CarAttribute, value: &FilterValue) -> String {
    match (attribute.kind(), value) {
        (AttributeKind::Text, FilterValue::Text(s)) => format!("ilike.{}", pattern(s)),
        _ => format!("eq.{}", scalar(value)),
    }
}

fn scalar(value: &FilterValue) -> String {
    match value {
        FilterValue::Number(n) => number(*n),
        other => other.to_string(),
    }
}

/// `*` is PostgREST's URL-safe LIKE wildcard.
fn pattern(s: &str) -> String {
    format!("*{}*", s.replace('*', ""))
}

/// Double-quote a value inside a logic tree so commas and parentheses survive.
fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

fn number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
