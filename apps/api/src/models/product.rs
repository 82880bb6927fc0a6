use serde::{Deserialize, Serialize};

/// A normalized product record. Constructed once per input item and never
/// mutated after it enters the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl Product {
    /// Checks the record invariants that must hold before generation:
    /// non-empty id and title, non-negative finite price, non-empty tags.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("id must be a non-empty string".to_string());
        }
        if self.title.trim().is_empty() {
            return Err("title must be a non-empty string".to_string());
        }
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Err(format!("price must be a non-negative number, got {price}"));
            }
        }
        if let Some(rating) = self.rating {
            if !rating.is_finite() {
                return Err("rating must be a finite number".to_string());
            }
        }
        if let Some(tags) = &self.tags {
            if tags.iter().any(|t| t.trim().is_empty()) {
                return Err("tags must be non-empty strings".to_string());
            }
        }
        Ok(())
    }
}
