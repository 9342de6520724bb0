//! `caradvisor cars` commands.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use caradvisor_core::service::car::CarService;
use caradvisor_infra::catalog::CatalogStore;
use caradvisor_types::car::{Car, FuelType};

use crate::http::extractors::query::CarListQuery;

/// Print the catalog, filtered by `query`, as a table or JSON.
pub async fn list_cars(service: &CarService<CatalogStore>, query: CarListQuery, json: bool) -> Result<()> {
    let filters = query.to_filters()?;
    let cars = service.list(&filters).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&cars)?);
        return Ok(());
    }

    if cars.is_empty() {
        println!();
        println!(
            "  {} No cars match{}.",
            style("i").blue().bold(),
            if filters.is_empty() { "" } else { " these filters" }
        );
        println!();
        return Ok(());
    }

    println!();
    println!("{}", car_table(&cars));
    println!();
    println!(
        "  {} car{}{}",
        style(cars.len()).bold(),
        if cars.len() == 1 { "" } else { "s" },
        if filters.is_empty() {
            String::new()
        } else {
            format!(" matching {filters}")
        }
    );
    println!();
    Ok(())
}

fn car_table(cars: &[Car]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Car").fg(Color::White),
        Cell::new("Year").fg(Color::White),
        Cell::new("Price").fg(Color::White),
        Cell::new("Fuel").fg(Color::White),
        Cell::new("Gearbox").fg(Color::White),
        Cell::new("Seats").fg(Color::White),
        Cell::new("Color").fg(Color::White),
        Cell::new("ID").fg(Color::White),
    ]);

    for car in cars {
        let fuel = match car.fuel_type {
            FuelType::Electric => Cell::new(car.fuel_type).fg(Color::Green),
            FuelType::Hybrid | FuelType::PlugInHybrid => Cell::new(car.fuel_type).fg(Color::Cyan),
            _ => Cell::new(car.fuel_type),
        };
        table.add_row(vec![
            Cell::new(format!("{} {}", car.brand, car.model)).fg(Color::Cyan),
            Cell::new(car.year),
            Cell::new(format!("{:.0} EUR", car.price)),
            fuel,
            Cell::new(car.transmission),
            Cell::new(car.seats),
            Cell::new(&car.color),
            Cell::new(car.id).fg(Color::DarkGrey),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use caradvisor_types::car::{NewCar, Transmission};

    #[test]
    fn test_car_table_has_one_row_per_car() {
        let car = Car::from_new(NewCar {
            brand: "Fiat".to_string(),
            model: "500e".to_string(),
            year: 2023,
            price: 19_900.0,
            fuel_type: FuelType::Electric,
            transmission: Transmission::Automatic,
            seats: 4,
            doors: 3,
            color: "red".to_string(),
        });
        let table = car_table(&[car.clone(), car]);
        assert_eq!(table.row_iter().count(), 2);
        assert!(table.to_string().contains("Fiat 500e"));
    }
}
