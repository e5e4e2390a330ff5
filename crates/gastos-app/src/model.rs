// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::ids::ItemId;

/// A single expense line. `expanded` is display state but persists with the
/// record, matching the stored wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub quantity: f64,
    pub price: f64,
    pub expanded: bool,
}

impl Item {
    pub fn new(id: ItemId, name: impl Into<String>, quantity: f64, price: f64) -> Self {
        Self {
            id,
            name: name.into(),
            quantity,
            price,
            expanded: false,
        }
    }
}

/// Sum of `price * quantity` over the list. Non-finite contributions are
/// skipped so a bad record can never poison the total.
pub fn total(items: &[Item]) -> f64 {
    items
        .iter()
        .map(|item| item.price * item.quantity)
        .filter(|value| value.is_finite())
        .sum()
}

/// Grand total rendered with zero decimal places.
pub fn format_total(items: &[Item]) -> String {
    format!("{:.0}", total(items))
}

/// Share of the total attributed to `price`, rendered with two decimals.
/// Returns `"0"` whenever the total is zero or non-finite, so there is no
/// division by zero and no NaN in the output.
pub fn percentage(price: f64, items: &[Item]) -> String {
    let total = total(items);
    if total == 0.0 || !total.is_finite() || !price.is_finite() {
        return "0".to_owned();
    }
    format!("{:.2}", price / total * 100.0)
}

/// Per-item display total: `floor(price * quantity)`.
pub fn line_total(item: &Item) -> f64 {
    let value = item.price * item.quantity;
    if value.is_finite() { value.floor() } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::{Item, format_total, line_total, percentage, total};
    use crate::ids::ItemId;

    fn item(id: i64, quantity: f64, price: f64) -> Item {
        Item::new(ItemId::new(id), format!("item-{id}"), quantity, price)
    }

    #[test]
    fn total_sums_price_times_quantity() {
        let items = [item(1, 2.0, 3.0), item(2, 1.0, 2.0)];
        assert_eq!(total(&items), 8.0);
        assert_eq!(format_total(&items), "8");
    }

    #[test]
    fn zero_quantity_or_price_leaves_total_unchanged() {
        let mut items = vec![item(1, 2.0, 3.0)];
        let before = total(&items);
        items.push(item(2, 0.0, 9.99));
        items.push(item(3, 4.0, 0.0));
        assert_eq!(total(&items), before);
    }

    #[test]
    fn percentages_cover_the_milk_and_bread_scenario() {
        let items = [
            Item::new(ItemId::new(1), "Milk", 2.0, 3.0),
            Item::new(ItemId::new(2), "Bread", 1.0, 2.0),
        ];
        assert_eq!(format_total(&items), "8");
        assert_eq!(percentage(6.0, &items), "75.00");
        assert_eq!(percentage(2.0, &items), "25.00");
    }

    #[test]
    fn percentages_sum_to_one_hundred_within_rounding() {
        let items = [item(1, 1.0, 3.0), item(2, 1.0, 5.0), item(3, 1.0, 7.0)];
        let sum: f64 = items
            .iter()
            .map(|entry| {
                percentage(entry.price * entry.quantity, &items)
                    .parse::<f64>()
                    .expect("percentage parses")
            })
            .sum();
        assert!((sum - 100.0).abs() < 0.05, "sum was {sum}");
    }

    #[test]
    fn percentage_is_zero_for_empty_or_zero_total() {
        assert_eq!(percentage(5.0, &[]), "0");
        let items = [item(1, 0.0, 0.0)];
        assert_eq!(percentage(5.0, &items), "0");
    }

    #[test]
    fn line_total_floors_the_product() {
        assert_eq!(line_total(&item(1, 1.5, 3.33)), 4.0);
        assert_eq!(line_total(&item(2, 2.0, 3.0)), 6.0);
    }

    #[test]
    fn non_finite_fields_do_not_poison_the_tallies() {
        let items = [item(1, 2.0, 3.0), item(2, f64::NAN, 4.0)];
        assert_eq!(total(&items), 6.0);
        assert_eq!(line_total(&items[1]), 0.0);
        assert_eq!(percentage(f64::NAN, &items), "0");
    }
}
