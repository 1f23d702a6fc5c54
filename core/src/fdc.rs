//! FoodData Central search records and the lookups the rest of the crate
//! performs on them. No I/O happens here; transports implement
//! [`FoodSearchProvider`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::round1;

/// Nutrients the app reads from a search record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NutrientKind {
    Energy,
    Protein,
    Fat,
    Carbs,
    Fiber,
    Sugar,
}

impl NutrientKind {
    #[must_use]
    pub fn fdc_name(self) -> &'static str {
        match self {
            Self::Energy => "Energy",
            Self::Protein => "Protein",
            Self::Fat => "Total lipid (fat)",
            Self::Carbs => "Carbohydrate, by difference",
            Self::Fiber => "Fiber, total dietary",
            Self::Sugar => "Sugars, total",
        }
    }

    #[must_use]
    pub fn fdc_id(self) -> u32 {
        match self {
            Self::Energy => 1008,
            Self::Protein => 1003,
            Self::Fat => 1004,
            Self::Carbs => 1005,
            Self::Fiber => 1079,
            Self::Sugar => 2000,
        }
    }

    /// Resolve a nutrient by its FDC name.
    #[must_use]
    pub fn from_fdc_name(name: &str) -> Option<Self> {
        [
            Self::Energy,
            Self::Protein,
            Self::Fat,
            Self::Carbs,
            Self::Fiber,
            Self::Sugar,
        ]
        .into_iter()
        .find(|k| k.fdc_name() == name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub foods: Vec<FoodRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodRecord {
    pub fdc_id: u64,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gtin_upc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serving_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serving_size_unit: Option<String>,
    #[serde(default)]
    pub food_nutrients: Vec<FoodNutrient>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodNutrient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrient_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl FoodNutrient {
    fn is(&self, kind: NutrientKind) -> bool {
        self.nutrient_name.as_deref() == Some(kind.fdc_name())
            || self.nutrient_id == Some(kind.fdc_id())
    }
}

impl FoodRecord {
    #[must_use]
    pub fn nutrient(&self, kind: NutrientKind) -> Option<&FoodNutrient> {
        self.food_nutrients.iter().find(|n| n.is(kind))
    }

    /// Protein, carbs, and fat in grams per serving as listed.
    #[must_use]
    pub fn macro_grams(&self) -> (f64, f64, f64) {
        (
            get_nutrient_value(self, NutrientKind::Protein),
            get_nutrient_value(self, NutrientKind::Carbs),
            get_nutrient_value(self, NutrientKind::Fat),
        )
    }
}

/// Value of `kind` in `food`, matched by FDC name or id, rounded to one
/// decimal. Missing nutrients and entries without a value read as 0.
#[must_use]
pub fn get_nutrient_value(food: &FoodRecord, kind: NutrientKind) -> f64 {
    food.nutrient(kind)
        .and_then(|n| n.value)
        .filter(|v| v.is_finite())
        .map_or(0.0, round1)
}

/// Name-keyed variant of [`get_nutrient_value`]; unknown names only match by
/// exact nutrient name.
#[must_use]
pub fn get_nutrient_value_by_name(food: &FoodRecord, name: &str) -> f64 {
    if let Some(kind) = NutrientKind::from_fdc_name(name) {
        return get_nutrient_value(food, kind);
    }
    food.food_nutrients
        .iter()
        .find(|n| n.nutrient_name.as_deref() == Some(name))
        .and_then(|n| n.value)
        .filter(|v| v.is_finite())
        .map_or(0.0, round1)
}

/// A record is usable when it lists both energy and protein.
#[must_use]
pub fn has_core_nutrients(food: &FoodRecord) -> bool {
    food.nutrient(NutrientKind::Energy).is_some() && food.nutrient(NutrientKind::Protein).is_some()
}

#[must_use]
pub fn filter_complete(foods: Vec<FoodRecord>) -> Vec<FoodRecord> {
    foods.into_iter().filter(has_core_nutrients).collect()
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search query must not be empty")]
    EmptyQuery,
    #[error("Food search timed out")]
    Timeout,
    #[error("Could not reach the food database: {0}")]
    Network(String),
    #[error("Food database returned HTTP {0}")]
    Status(u16),
    #[error("Unexpected response from the food database: {0}")]
    Decode(String),
}

impl SearchError {
    /// Whether asking again later could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Network(_) => true,
            Self::Status(code) => *code == 429 || *code >= 500,
            Self::EmptyQuery | Self::Decode(_) => false,
        }
    }
}

/// Remote food lookup. The CLI implements this over HTTP; tests use canned
/// records.
#[async_trait]
pub trait FoodSearchProvider: Send + Sync {
    async fn search_by_name(&self, query: &str) -> Result<Vec<FoodRecord>, SearchError>;
    async fn search_by_barcode(&self, code: &str) -> Result<Vec<FoodRecord>, SearchError>;
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn nutrient_by_name(name: &str, value: f64) -> FoodNutrient {
        FoodNutrient {
            nutrient_name: Some(name.to_string()),
            value: Some(value),
            ..FoodNutrient::default()
        }
    }

    pub fn nutrient_by_id(id: u32, value: f64) -> FoodNutrient {
        FoodNutrient {
            nutrient_id: Some(id),
            value: Some(value),
            ..FoodNutrient::default()
        }
    }

    /// Greek yogurt, per 170 g serving.
    pub fn yogurt() -> FoodRecord {
        FoodRecord {
            fdc_id: 170_903,
            description: "Yogurt, Greek, plain, nonfat".to_string(),
            data_type: Some("SR Legacy".to_string()),
            serving_size: Some(170.0),
            food_nutrients: vec![
                nutrient_by_name("Energy", 100.0),
                nutrient_by_name("Protein", 17.3),
                nutrient_by_name("Carbohydrate, by difference", 6.1),
                nutrient_by_name("Total lipid (fat)", 0.7),
            ],
            ..FoodRecord::default()
        }
    }
}
