//! Prompt text sent to the completion endpoint.

use serde::Serialize;

use crate::error::Result;
use crate::product::Product;

/// Persona and topic restriction for the assistant.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful beauty and skincare expert. \
Give friendly, knowledgeable advice about beauty products, skincare routines, haircare, \
makeup, fragrance, and product recommendations. Be concise but informative. Only answer \
questions related to beauty, skincare, haircare, makeup, fragrance, and wellness topics.";

/// Used when a selected product has no description.
pub const MISSING_DESCRIPTION: &str = "No description available";

/// The fields of a product the assistant sees.
#[derive(Debug, Serialize)]
struct RoutineItem<'a> {
    name: &'a str,
    brand: &'a str,
    category: &'a str,
    description: &'a str,
}

impl<'a> From<&'a Product> for RoutineItem<'a> {
    fn from(product: &'a Product) -> Self {
        Self {
            name: &product.name,
            brand: &product.brand,
            category: &product.category,
            description: product.description.as_deref().unwrap_or(MISSING_DESCRIPTION),
        }
    }
}

/// Build the user turn that asks for a routine over `products`.
pub fn routine_request(products: &[Product]) -> Result<String> {
    let items: Vec<RoutineItem<'_>> = products.iter().map(RoutineItem::from).collect();
    let listing = serde_json::to_string_pretty(&items)?;

    Ok(format!(
        "Create a personalized beauty routine using these products:\n\n{listing}\n\n\
         Provide a step-by-step routine with specific instructions on when and how to use \
         each product for optimal results."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routine_request_lists_products() {
        let products = vec![
            Product::new("p1", "Foaming Cleanser", "CeraVe", "cleanser")
                .with_description("Gentle foam")
                .with_image("https://example.com/p1.png"),
            Product::new("p2", "Night Cream", "Lancome", "moisturizer"),
        ];

        let prompt = routine_request(&products).unwrap();
        assert!(prompt.starts_with("Create a personalized beauty routine"));
        assert!(prompt.contains("\"name\": \"Foaming Cleanser\""));
        assert!(prompt.contains("\"description\": \"Gentle foam\""));
        assert!(prompt.contains("\"description\": \"No description available\""));
        assert!(!prompt.contains("p1.png"));
        assert!(prompt.ends_with("for optimal results."));
    }
}
