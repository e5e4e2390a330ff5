// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::Item;

/// Transient form state for the add and edit surfaces. The numeric fields
/// stay raw strings until submit; `parse_amount` decides what they mean.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemDraft {
    pub name: String,
    pub quantity: String,
    pub price: String,
}

impl ItemDraft {
    pub fn blank() -> Self {
        Self::default()
    }

    /// Draft prefilled from an existing item. Zero amounts render as empty
    /// fields; zero is the "unset" convention throughout.
    pub fn from_item(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            quantity: format_amount_field(item.quantity),
            price: format_amount_field(item.price),
        }
    }

    pub fn quantity_value(&self) -> f64 {
        parse_amount(&self.quantity)
    }

    pub fn price_value(&self) -> f64 {
        parse_amount(&self.price)
    }

    pub fn is_blank(&self) -> bool {
        self.name.is_empty() && self.quantity.is_empty() && self.price.is_empty()
    }
}

/// Free-text numeric input. Empty, unparsable, or non-finite text all become
/// `0.0`; nothing a user types can put NaN into the tallies.
pub fn parse_amount(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

fn format_amount_field(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return String::new();
    }
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}
