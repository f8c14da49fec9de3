use std::fmt::Write;

use crate::data::{Address, Restaurant};

pub const HEADERS: [&str; 5] = ["Name", "Cuisine", "Borough", "Address", "Average Rating"];

pub const SPINNER: &str = "Loading...";

/// `building street, zipcode`
pub fn format_address(address: &Address) -> String {
    format!("{} {}, {}", address.building, address.street, address.zipcode)
}

pub fn format_rating(rating: f64) -> String {
    format!("{rating:.2}")
}

fn row(restaurant: &Restaurant) -> [String; 5] {
    [
        restaurant.name.clone(),
        restaurant.cuisine.clone(),
        restaurant.borough.clone(),
        format_address(&restaurant.address),
        format_rating(restaurant.average_rating),
    ]
}

/// Plain text table, one line per restaurant under a header and rule.
pub fn render(restaurants: &[Restaurant]) -> String {
    let rows: Vec<[String; 5]> = restaurants.iter().map(row).collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for cells in &rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &HEADERS, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths);
    for cells in &rows {
        push_line(&mut out, cells, &widths);
    }
    out
}

fn push_line<S: AsRef<str>>(out: &mut String, cells: &[S], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let cell = cell.as_ref();
            let pad = width - cell.chars().count();
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join(" | ");
    let _ = writeln!(out, "{}", line.trim_end());
}
