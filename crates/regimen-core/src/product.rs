//! Catalog products and category filtering.

use serde::{Deserialize, Deserializer, Serialize};

/// A purchasable product. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog identifier. Numeric ids in the catalog file are read as strings.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    /// Display name.
    pub name: String,

    /// Brand name.
    pub brand: String,

    /// Category used by the catalog filter (e.g. "cleanser").
    pub category: String,

    /// Longer description, when the catalog has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Image URL.
    #[serde(default)]
    pub image: String,
}

impl Product {
    /// Create a product with no description or image.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        brand: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            brand: brand.into(),
            category: category.into(),
            description: None,
            image: String::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the image URL.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }
}

/// The catalog document: `{ "products": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub products: Vec<Product>,
}

impl Catalog {
    /// Parse a catalog document.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// Products whose category equals `category` exactly, in catalog order.
pub fn filter_by_category(products: &[Product], category: &str) -> Vec<Product> {
    products
        .iter()
        .filter(|p| p.category == category)
        .cloned()
        .collect()
}

/// Distinct categories in order of first appearance.
pub fn categories(products: &[Product]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for product in products {
        if !seen.iter().any(|c| c == &product.category) {
            seen.push(product.category.clone());
        }
    }
    seen
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_preserves_order() {
        let catalog = Catalog::from_json(
            r#"{"products": [
                {"id": 1, "name": "Foam", "brand": "A", "category": "cleanser"},
                {"id": 2, "name": "Cream", "brand": "B", "category": "moisturizer"},
                {"id": 3, "name": "Gel", "brand": "C", "category": "moisturizer"}
            ]}"#,
        )
        .unwrap();

        let filtered = filter_by_category(&catalog.products, "moisturizer");
        let ids: Vec<&str> = filtered.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[test]
    fn test_filter_is_exact_match() {
        let products = vec![
            Product::new("1", "Foam", "A", "cleanser"),
            Product::new("2", "Cream", "B", "Moisturizer"),
        ];
        assert!(filter_by_category(&products, "moisturizer").is_empty());
        assert!(filter_by_category(&products, "").is_empty());
    }

    #[test]
    fn test_numeric_and_string_ids_agree() {
        let numeric: Product = serde_json::from_str(
            r#"{"id": 7, "name": "n", "brand": "b", "category": "c"}"#,
        )
        .unwrap();
        let text: Product = serde_json::from_str(
            r#"{"id": "7", "name": "n", "brand": "b", "category": "c"}"#,
        )
        .unwrap();
        assert_eq!(numeric, text);

        let json = serde_json::to_value(&numeric).unwrap();
        assert_eq!(json["id"], "7");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_categories_first_appearance() {
        let products = vec![
            Product::new("1", "a", "x", "toner"),
            Product::new("2", "b", "x", "cleanser"),
            Product::new("3", "c", "x", "toner"),
        ];
        assert_eq!(categories(&products), vec!["toner", "cleanser"]);
    }
}
