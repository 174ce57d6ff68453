//! Plain-text rendering of controller state for the terminal.

use std::fmt::Write as _;

use client_core::ProductSnapshot;
use shared::{domain::Product, protocol::Forecast};

pub fn render_product(product: &Product) -> String {
    let mut line = format!("{:>5}  {:<14} {}", product.id, product.sku, product.name);
    if let Some(category) = &product.category {
        let _ = write!(line, "  [{category}]");
    }
    if let Some(price) = product.selling_price {
        let _ = write!(line, "  @ {price:.2}");
    }
    line
}

pub fn render_snapshot(snapshot: &ProductSnapshot) -> String {
    let mut out = String::new();
    let marker = if snapshot.is_fresh() { "" } else { " (stale)" };
    let _ = writeln!(out, "Products: {}{marker}", snapshot.len());
    if snapshot.is_empty() {
        out.push_str("  (none)\n");
        return out;
    }
    for product in snapshot.products() {
        let _ = writeln!(out, "{}", render_product(product));
    }
    out
}

pub fn render_forecast(forecast: &Forecast) -> String {
    let join = |values: &[f64]| {
        values
            .iter()
            .map(|v| format!("{v:.2}"))
            .collect::<Vec<_>>()
            .join(" ")
    };
    format!(
        "Forecast for product {} over {} days\n  moving average:    {}\n  linear regression: {}\n",
        forecast.product_id,
        forecast.horizon,
        join(&forecast.moving_average),
        join(&forecast.linear_regression),
    )
}
