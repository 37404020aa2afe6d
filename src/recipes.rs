//! Recipe book: how much of each raw material one plate of a product takes.
//!
//! This table is the only copy. Clients read it from `GET /api/recipes`
//! and should compare `RECIPE_BOOK_VERSION` rather than keep their own.
//! Bump the version whenever an entry changes.

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

pub const RECIPE_BOOK_VERSION: u32 = 1;

/// Material name → amount needed per plate
pub type Recipe = BTreeMap<String, Decimal>;

/// Material name → total amount needed
pub type MaterialRequirement = BTreeMap<String, Decimal>;

static RECIPES: Lazy<BTreeMap<String, Recipe>> = Lazy::new(|| {
    let entries: [(&str, &[(&str, Decimal)]); 4] = [
        (
            "จานสี่เหลี่ยม",
            &[("ใบตองตึง", dec!(4)), ("แป้งข้าวเหนียว", dec!(2))],
        ),
        (
            "จานกลม",
            &[("ใบตองตึง", dec!(3)), ("แป้งข้าวเหนียว", dec!(1.5))],
        ),
        (
            "จานหัวใจ",
            &[("ใบตองตึง", dec!(3)), ("แป้งข้าวเหนียว", dec!(2))],
        ),
        (
            "ถ้วย",
            &[("ใบตองตึง", dec!(2)), ("แป้งข้าวเหนียว", dec!(1))],
        ),
    ];

    entries
        .iter()
        .map(|(product, materials)| {
            let recipe = materials
                .iter()
                .map(|(name, amount)| (name.to_string(), *amount))
                .collect();
            (product.to_string(), recipe)
        })
        .collect()
});

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeBook {
    pub version: u32,
    #[schema(value_type = Object)]
    pub recipes: BTreeMap<String, Recipe>,
}

impl RecipeBook {
    pub fn current() -> Self {
        Self {
            version: RECIPE_BOOK_VERSION,
            recipes: RECIPES.clone(),
        }
    }

    pub fn get(product: &str) -> Option<&'static Recipe> {
        RECIPES.get(product.trim())
    }

    pub fn products() -> impl Iterator<Item = &'static str> {
        RECIPES.keys().map(String::as_str)
    }
}

/// Scales a product's recipe linearly by `quantity`.
///
/// Unknown products need nothing, so the result is empty rather than an error.
pub fn calculate_material_needed(product: &str, quantity: i64) -> MaterialRequirement {
    let Some(recipe) = RecipeBook::get(product) else {
        return MaterialRequirement::new();
    };

    let quantity = Decimal::from(quantity);
    recipe
        .iter()
        .map(|(name, per_unit)| (name.clone(), *per_unit * quantity))
        .collect()
}
