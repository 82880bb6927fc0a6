use serde::{Deserialize, Serialize};

/// Whether a query is a short keyword phrase or a full natural-language
/// sentence. The model's free-text labels are forced onto this closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStyle {
    Short,
    Natural,
}

impl QueryStyle {
    /// Normalizes a raw style label. `natural` and `long` (and anything
    /// beginning with them, e.g. "natural language") are the only long-form
    /// synonyms; everything else is `short`.
    pub fn from_raw(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        if lowered.starts_with("natural") || lowered.starts_with("long") {
            QueryStyle::Natural
        } else {
            QueryStyle::Short
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStyle::Short => "short",
            QueryStyle::Natural => "natural",
        }
    }
}

/// Topical category of a query. Closed set; unknown labels collapse to
/// `Misc` so no other value is ever surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryBucket {
    Price,
    Occasion,
    Material,
    Fit,
    Brand,
    Rating,
    Misc,
}

impl QueryBucket {
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "price" => QueryBucket::Price,
            "occasion" => QueryBucket::Occasion,
            "material" => QueryBucket::Material,
            "fit" => QueryBucket::Fit,
            "brand" => QueryBucket::Brand,
            "rating" => QueryBucket::Rating,
            _ => QueryBucket::Misc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryBucket::Price => "price",
            QueryBucket::Occasion => "occasion",
            QueryBucket::Material => "material",
            QueryBucket::Fit => "fit",
            QueryBucket::Brand => "brand",
            QueryBucket::Rating => "rating",
            QueryBucket::Misc => "misc",
        }
    }
}

/// One accepted search query. Created by the response interpreter; never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuery {
    pub text: String,
    pub style: QueryStyle,
    pub bucket: QueryBucket,
}

/// Queries for one product, earliest-accepted-first with duplicates removed.
#[derive(Debug, Clone, Serialize)]
pub struct ProductQueries {
    pub product_id: String,
    pub queries: Vec<GeneratedQuery>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_long_form_synonyms() {
        assert_eq!(QueryStyle::from_raw("natural"), QueryStyle::Natural);
        assert_eq!(QueryStyle::from_raw("Natural language"), QueryStyle::Natural);
        assert_eq!(QueryStyle::from_raw("LONG"), QueryStyle::Natural);
    }

    #[test]
    fn test_style_everything_else_is_short() {
        assert_eq!(QueryStyle::from_raw("short"), QueryStyle::Short);
        assert_eq!(QueryStyle::from_raw("keyword"), QueryStyle::Short);
        assert_eq!(QueryStyle::from_raw(""), QueryStyle::Short);
        // "lengthy" is not an accepted synonym
        assert_eq!(QueryStyle::from_raw("lengthy"), QueryStyle::Short);
    }

    #[test]
    fn test_bucket_case_and_whitespace_normalized() {
        assert_eq!(QueryBucket::from_raw(" MATERIAL "), QueryBucket::Material);
        assert_eq!(QueryBucket::from_raw("Price"), QueryBucket::Price);
    }

    #[test]
    fn test_unknown_bucket_collapses_to_misc() {
        assert_eq!(QueryBucket::from_raw("color"), QueryBucket::Misc);
        assert_eq!(QueryBucket::from_raw(""), QueryBucket::Misc);
        assert_eq!(QueryBucket::from_raw("misc"), QueryBucket::Misc);
    }

    #[test]
    fn test_query_serializes_lowercase() {
        let query = GeneratedQuery {
            text: "red dress".to_string(),
            style: QueryStyle::Natural,
            bucket: QueryBucket::Material,
        };
        let json = serde_json::to_string(&query).unwrap();
        assert_eq!(
            json,
            r#"{"text":"red dress","style":"natural","bucket":"material"}"#
        );
    }
}
