// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use gastos_app::{Item, ItemId};

const PRODUCT_NAMES: [&str; 24] = [
    "Leche",
    "Pan",
    "Huevos",
    "Arroz",
    "Frijoles",
    "Café",
    "Azúcar",
    "Aceite",
    "Tomates",
    "Cebollas",
    "Queso",
    "Pollo",
    "Carne",
    "Pescado",
    "Manzanas",
    "Plátanos",
    "Naranjas",
    "Pasta",
    "Harina",
    "Mantequilla",
    "Yogur",
    "Jabón",
    "Detergente",
    "Papel",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Deterministic generator for demo expense items. Same seed, same basket.
#[derive(Debug, Clone)]
pub struct GroceryFaker {
    rng: DeterministicRng,
}

impl GroceryFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn product_name(&mut self) -> String {
        PRODUCT_NAMES[self.rng.int_n(PRODUCT_NAMES.len())].to_owned()
    }

    /// Quantity in half-unit steps, 0.5 through 6.0.
    pub fn quantity(&mut self) -> f64 {
        (self.rng.int_n(12) as f64 + 1.0) / 2.0
    }

    /// Unit price in 25-cent steps, 0.25 through 50.00.
    pub fn price(&mut self) -> f64 {
        (self.rng.int_n(200) as f64 + 1.0) / 4.0
    }

    pub fn item(&mut self, id: i64) -> Item {
        let mut item = Item::new(ItemId::new(id), self.product_name(), self.quantity(), self.price());
        item.expanded = self.rng.bool();
        item
    }

    /// A demo basket with ids assigned the way the store assigns them:
    /// position plus one.
    pub fn basket(&mut self, count: usize) -> Vec<Item> {
        (0..count).map(|index| self.item(index as i64 + 1)).collect()
    }
}
