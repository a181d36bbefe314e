use tracing::debug;

use super::record::NutritionRecord;
use super::source::NutritionSource;

pub const DEFAULT_QUANTITY_G: u32 = 100;

/// Unscaled (per 100 g) record for `food_name`.
pub async fn lookup(
    source: &dyn NutritionSource,
    food_name: &str,
) -> anyhow::Result<Option<NutritionRecord>> {
    let found = source.get_nutrition(food_name).await?;
    debug!(food = %food_name, hit = found.is_some(), "nutrition lookup");
    Ok(found)
}

/// Record for `food_name` scaled to `quantity` grams.
pub async fn lookup_scaled(
    source: &dyn NutritionSource,
    food_name: &str,
    quantity: f64,
) -> anyhow::Result<Option<NutritionRecord>> {
    Ok(lookup(source, food_name).await?.map(|r| r.scaled(quantity)))
}
