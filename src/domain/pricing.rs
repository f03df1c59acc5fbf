//! Pricing table and calculator
//!
//! Unit prices, delivery tiers and special treatments are fixed catalogs in
//! whole currency units. Nothing here rounds: every input is already an integer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::Money;

/// Price used for any item type missing from the catalog.
pub const DEFAULT_UNIT_PRICE: Money = Money::new(50);

const STANDARD_CATALOG: &[(&str, i64)] = &[
    ("shirt", 100),
    ("pants", 120),
    ("saree", 250),
    ("bedsheet", 150),
    ("towel", 80),
    ("jacket", 200),
    ("t_shirt", 80),
    ("jeans", 130),
    ("shorts", 70),
    ("silk_saree", 400),
    ("kurta", 110),
    ("salwar_suit", 180),
    ("lehenga", 500),
    ("dress", 150),
    ("skirt", 100),
    ("blouse", 90),
    ("suit_2_piece", 350),
    ("suit_3_piece", 450),
    ("blazer", 250),
    ("coat", 300),
    ("sweater", 150),
    ("hoodie", 140),
    ("tie", 50),
    ("scarf", 60),
    ("double_bedsheet", 200),
    ("pillow_cover", 40),
    ("blanket", 300),
    ("quilt", 350),
    ("curtain", 200),
    ("bath_robe", 150),
    ("table_cloth", 100),
    ("sofa_cover", 250),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOption {
    #[default]
    Regular,
    Express,
    SameDay,
}

impl DeliveryOption {
    pub const ALL: [DeliveryOption; 3] = [Self::Regular, Self::Express, Self::SameDay];

    pub fn fee(self) -> Money {
        match self {
            Self::Regular => Money::ZERO,
            Self::Express => Money::new(50),
            Self::SameDay => Money::new(100),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialTreatment {
    StainRemoval,
    OdorRemoval,
    Antibacterial,
    Sanitization,
    Waterproofing,
    WrinkleFree,
}

impl SpecialTreatment {
    pub const ALL: [SpecialTreatment; 6] = [
        Self::StainRemoval,
        Self::OdorRemoval,
        Self::Antibacterial,
        Self::Sanitization,
        Self::Waterproofing,
        Self::WrinkleFree,
    ];

    pub fn fee(self) -> Money {
        match self {
            Self::StainRemoval => Money::new(30),
            Self::OdorRemoval => Money::new(20),
            Self::Antibacterial => Money::new(25),
            Self::Sanitization => Money::new(40),
            Self::Waterproofing => Money::new(60),
            Self::WrinkleFree => Money::new(35),
        }
    }

    /// Drops repeated treatments, keeping first-occurrence order.
    pub fn dedupe(treatments: &[SpecialTreatment]) -> Vec<SpecialTreatment> {
        let mut unique = Vec::with_capacity(treatments.len());
        for t in treatments {
            if !unique.contains(t) {
                unique.push(*t);
            }
        }
        unique
    }

    /// Surcharge for a set of treatments; each type is charged once.
    pub fn total_charge(treatments: &[SpecialTreatment]) -> Money {
        Self::dedupe(treatments).into_iter().map(Self::fee).sum()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPricing {
    pub unit_price: Money,
    pub line_total: Money,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPricing {
    pub subtotal: Money,
    pub delivery_charge: Money,
    pub treatment_charge: Money,
    pub total_amount: Money,
}

impl OrderPricing {
    pub fn from_lines(
        line_totals: impl IntoIterator<Item = Money>,
        delivery: DeliveryOption,
        treatments: &[SpecialTreatment],
    ) -> Self {
        let subtotal: Money = line_totals.into_iter().sum();
        let delivery_charge = delivery.fee();
        let treatment_charge = SpecialTreatment::total_charge(treatments);
        Self { subtotal, delivery_charge, treatment_charge, total_amount: subtotal + delivery_charge + treatment_charge }
    }
}

/// Item type to unit price lookup with a lenient fallback.
#[derive(Clone, Debug)]
pub struct PricingTable {
    prices: HashMap<String, Money>,
    default_price: Money,
}

impl PricingTable {
    pub fn new(prices: impl IntoIterator<Item = (String, Money)>, default_price: Money) -> Self {
        let prices = prices.into_iter().map(|(k, v)| (normalize_item_type(&k), v)).collect();
        Self { prices, default_price }
    }

    pub fn standard() -> Self {
        Self::new(
            STANDARD_CATALOG.iter().map(|(name, price)| (name.to_string(), Money::new(*price))),
            DEFAULT_UNIT_PRICE,
        )
    }

    pub fn default_price(&self) -> Money { self.default_price }

    pub fn contains(&self, item_type: &str) -> bool { self.prices.contains_key(&normalize_item_type(item_type)) }

    pub fn unit_price(&self, item_type: &str) -> Money {
        self.prices.get(&normalize_item_type(item_type)).copied().unwrap_or(self.default_price)
    }

    pub fn price_item(&self, item_type: &str, quantity: u32) -> ItemPricing {
        let unit_price = self.unit_price(item_type);
        ItemPricing { unit_price, line_total: unit_price.multiply(quantity) }
    }

    pub fn price_order<'a>(
        &self,
        items: impl IntoIterator<Item = (&'a str, u32)>,
        delivery: DeliveryOption,
        treatments: &[SpecialTreatment],
    ) -> OrderPricing {
        let lines = items.into_iter().map(|(item_type, qty)| self.price_item(item_type, qty).line_total);
        OrderPricing::from_lines(lines, delivery, treatments)
    }

    /// Catalog entries sorted by item type.
    pub fn entries(&self) -> Vec<(&str, Money)> {
        let mut entries: Vec<_> = self.prices.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl Default for PricingTable {
    fn default() -> Self { Self::standard() }
}

/// `" T-Shirt "` and `"t_shirt"` name the same catalog entry.
pub fn normalize_item_type(item_type: &str) -> String {
    item_type.trim().to_lowercase().replace([' ', '-'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total_is_unit_price_times_quantity() {
        let table = PricingTable::standard();
        for (name, price) in STANDARD_CATALOG {
            for qty in [1, 2, 7] {
                let p = table.price_item(name, qty);
                assert_eq!(p.unit_price, Money::new(*price));
                assert_eq!(p.line_total, Money::new(price * i64::from(qty)));
            }
        }
    }

    #[test]
    fn test_unknown_item_falls_back_to_default() {
        let table = PricingTable::standard();
        assert!(!table.contains("spacesuit"));
        let p = table.price_item("spacesuit", 3);
        assert_eq!(p.unit_price, DEFAULT_UNIT_PRICE);
        assert_eq!(p.line_total, Money::new(150));
    }

    #[test]
    fn test_item_type_normalization() {
        let table = PricingTable::standard();
        assert_eq!(table.unit_price(" T-Shirt "), Money::new(80));
        assert_eq!(table.unit_price("Silk Saree"), Money::new(400));
    }

    #[test]
    fn test_order_pricing_regular_no_treatments() {
        let table = PricingTable::standard();
        let p = table.price_order([("shirt", 2), ("towel", 1)], DeliveryOption::Regular, &[]);
        assert_eq!(p.subtotal, Money::new(280));
        assert_eq!(p.delivery_charge, Money::ZERO);
        assert_eq!(p.treatment_charge, Money::ZERO);
        assert_eq!(p.total_amount, Money::new(280));
    }

    #[test]
    fn test_total_is_sum_of_parts() {
        let table = PricingTable::standard();
        for delivery in DeliveryOption::ALL {
            let p = table.price_order(
                [("saree", 1), ("jacket", 2)],
                delivery,
                &[SpecialTreatment::StainRemoval, SpecialTreatment::Waterproofing],
            );
            assert_eq!(p.subtotal, Money::new(650));
            assert_eq!(p.treatment_charge, Money::new(90));
            assert_eq!(p.total_amount, p.subtotal + p.delivery_charge + p.treatment_charge);
        }
    }

    #[test]
    fn test_duplicate_treatments_charged_once() {
        let treatments = [
            SpecialTreatment::Sanitization,
            SpecialTreatment::OdorRemoval,
            SpecialTreatment::Sanitization,
        ];
        assert_eq!(
            SpecialTreatment::dedupe(&treatments),
            vec![SpecialTreatment::Sanitization, SpecialTreatment::OdorRemoval]
        );
        assert_eq!(SpecialTreatment::total_charge(&treatments), Money::new(60));
    }

    #[test]
    fn test_delivery_fees() {
        assert_eq!(DeliveryOption::Regular.fee(), Money::ZERO);
        assert_eq!(DeliveryOption::Express.fee(), Money::new(50));
        assert_eq!(DeliveryOption::SameDay.fee(), Money::new(100));
    }
}
