use std::io::Read;
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::{Number, Value};
use tracing::{info, warn};

use super::record::NutritionRecord;

#[async_trait]
pub trait NutritionSource: Send + Sync {
    /// Per-100 g record for `food_name`, if the source knows the food.
    async fn get_nutrition(&self, food_name: &str) -> anyhow::Result<Option<NutritionRecord>>;
}

/// In-memory nutrient table loaded from a slim USDA CSV export.
#[derive(Debug, Clone, Default)]
pub struct CsvNutritionSource {
    rows: Vec<NutritionRecord>,
}

impl CsvNutritionSource {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<NutritionRecord>) -> Self {
        Self { rows }
    }

    pub fn from_reader<R: Read>(reader: R) -> anyhow::Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = rdr.headers().context("read csv headers")?.clone();
        anyhow::ensure!(
            headers.iter().any(|h| h == "food_name"),
            "csv has no food_name column"
        );

        let mut rows = Vec::new();
        for (line, record) in rdr.records().enumerate() {
            let record = record.with_context(|| format!("csv row {}", line + 2))?;
            if let Some(row) = row_to_record(&headers, &record) {
                rows.push(row);
            }
        }
        Ok(Self { rows })
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("open nutrition table {}", path.display()))?;
        Self::from_reader(file)
    }

    /// Like [`load`](Self::load), but a broken table yields an empty source.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(src) => {
                info!(path = %path.display(), rows = src.len(), "nutrition table loaded");
                src
            }
            Err(e) => {
                warn!(error = %e, "nutrition table unavailable; every lookup will miss");
                Self::empty()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Exact (case-insensitive) name first, then first row containing the query.
    pub fn find(&self, food_name: &str) -> Option<&NutritionRecord> {
        let needle = food_name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.rows
            .iter()
            .find(|r| r.food_name.to_lowercase() == needle)
            .or_else(|| {
                self.rows
                    .iter()
                    .find(|r| r.food_name.to_lowercase().contains(&needle))
            })
    }
}

#[async_trait]
impl NutritionSource for CsvNutritionSource {
    async fn get_nutrition(&self, food_name: &str) -> anyhow::Result<Option<NutritionRecord>> {
        Ok(self.find(food_name).cloned())
    }
}

fn row_to_record(headers: &csv::StringRecord, row: &csv::StringRecord) -> Option<NutritionRecord> {
    let mut rec = NutritionRecord::named(String::new());
    for (header, cell) in headers.iter().zip(row.iter()) {
        let number = cell.parse::<f64>().ok().filter(|x| x.is_finite());
        match header {
            "food_name" => rec.food_name = cell.to_string(),
            "energy_kcal" => rec.energy_kcal = number,
            "protein_g" => rec.protein_g = number,
            "fat_g" => rec.fat_g = number,
            "carbs_g" => rec.carbs_g = number,
            "fiber_g" => rec.fiber_g = number,
            other => {
                let value = match number.and_then(Number::from_f64) {
                    Some(n) => Value::Number(n),
                    None if cell.is_empty() => Value::Null,
                    None => Value::String(cell.to_string()),
                };
                rec.extra.insert(other.to_string(), value);
            }
        }
    }
    (!rec.food_name.is_empty()).then_some(rec)
}
