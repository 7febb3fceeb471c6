//! The structured object an agent returns at the end of a turn.
//!
//! Backend field names overlap and drift (`color` vs `colors`, `price.current`
//! vs `price.value`), so every type here is normalized once while decoding and
//! carries only the normalized shape afterwards.

use serde_json::Value;

use crate::profile::UserProfile;
use crate::value::{first_list, first_text, lenient_text, lenient_vec, number, text, text_list};

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AgentPayload {
    /// Conversational reply shown in the transcript
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    stylist_response: Option<String>,

    #[serde(default, deserialize_with = "lenient_vec")]
    products: Vec<Product>,

    #[serde(default, deserialize_with = "lenient_vec")]
    outfits: Vec<Outfit>,

    /// Partial profile update inferred by the agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_profile: Option<UserProfile>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    clarification: Option<Clarification>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    disambiguation: Option<Disambiguation>,

    /// Opaque presentation hint, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ui_event: Option<Value>,
}

impl AgentPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stylist_response(mut self, text: &str) -> Self {
        self.stylist_response = Some(text.to_string());
        self
    }

    pub fn with_products(mut self, products: Vec<Product>) -> Self {
        self.products = products;
        self
    }

    pub fn with_user_profile(mut self, profile: UserProfile) -> Self {
        self.user_profile = Some(profile);
        self
    }

    pub fn with_clarification(mut self, clarification: Clarification) -> Self {
        self.clarification = Some(clarification);
        self
    }

    pub fn stylist_response(&self) -> Option<&str> {
        self.stylist_response.as_deref()
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn outfits(&self) -> &[Outfit] {
        &self.outfits
    }

    pub fn user_profile(&self) -> Option<&UserProfile> {
        self.user_profile.as_ref()
    }

    /// The clarification block, only when it offers at least one option.
    pub fn clarification(&self) -> Option<&Clarification> {
        self.clarification
            .as_ref()
            .filter(|clarification| !clarification.options().is_empty())
    }

    pub fn disambiguation(&self) -> Option<&Disambiguation> {
        self.disambiguation.as_ref()
    }

    pub fn ui_event(&self) -> Option<&Value> {
        self.ui_event.as_ref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "Value")]
pub struct Product {
    id: Option<String>,
    title: Option<String>,
    brand: Option<String>,
    price: Option<Price>,
    image_url: Option<String>,
    url: Option<String>,
    colors: Vec<String>,
    tags: Vec<String>,
}

impl From<Value> for Product {
    fn from(value: Value) -> Self {
        let Value::Object(object) = value else {
            return Self {
                title: text(Some(&value)),
                ..Self::default()
            };
        };
        let price = ["price", "price_inr"]
            .iter()
            .find_map(|key| object.get(*key).and_then(Price::from_value));

        Self {
            id: first_text(&object, &["id", "product_id"]),
            title: first_text(&object, &["title", "name"]),
            brand: first_text(&object, &["brand"]),
            price,
            image_url: first_text(&object, &["image_url", "primary_image", "image"]),
            url: first_text(&object, &["url", "link"]),
            colors: first_list(&object, &["colors", "color"]),
            tags: text_list(object.get("tags")),
        }
    }
}

impl Product {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    pub fn price(&self) -> Option<&Price> {
        self.price.as_ref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Price {
    current: Option<f64>,
    /// Pre-discount price, when the catalog reports one
    original: Option<f64>,
    currency: Option<String>,
}

impl Price {
    /// Accepts `{current|value, original|compare_at|mrp, currency}` or a bare amount.
    pub fn from_value(value: &Value) -> Option<Self> {
        let price = match value {
            Value::Object(object) => Self {
                current: number(object.get("current")).or_else(|| number(object.get("value"))),
                original: ["original", "compare_at", "mrp"]
                    .iter()
                    .find_map(|key| number(object.get(*key))),
                currency: first_text(object, &["currency"]),
            },
            other => Self {
                current: number(Some(other)),
                ..Self::default()
            },
        };
        (price.current.is_some() || price.original.is_some()).then_some(price)
    }

    pub fn current(&self) -> Option<f64> {
        self.current
    }

    pub fn original(&self) -> Option<f64> {
        self.original
    }

    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }

    pub fn display(&self) -> Option<String> {
        let amount = format_amount(self.current?);
        Some(match self.currency() {
            Some(currency) => format!("{} {}", currency, amount),
            None => amount,
        })
    }
}

fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{:.0}", amount)
    } else {
        format!("{:.2}", amount)
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "Value")]
pub struct Outfit {
    title: Option<String>,
    occasion: Option<String>,
    vibe: Option<String>,
    /// Product ids or titles making up the look
    items: Vec<String>,
}

impl From<Value> for Outfit {
    fn from(value: Value) -> Self {
        let Value::Object(object) = value else {
            return Self::default();
        };
        let items = match object.get("items") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(product) => first_text(product, &["id", "title", "name"]),
                    other => text(Some(other)),
                })
                .collect(),
            _ => Vec::new(),
        };

        Self {
            title: first_text(&object, &["title", "name"]),
            occasion: first_text(&object, &["occasion"]),
            vibe: first_text(&object, &["vibe"]),
            items,
        }
    }
}

impl Outfit {
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn occasion(&self) -> Option<&str> {
        self.occasion.as_deref()
    }

    pub fn vibe(&self) -> Option<&str> {
        self.vibe.as_deref()
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// First of title, occasion, vibe.
    pub fn label(&self) -> Option<&str> {
        self.title()
            .or_else(|| self.occasion())
            .or_else(|| self.vibe())
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "Value")]
pub struct Clarification {
    question: Option<String>,
    options: Vec<ClarificationOption>,
}

impl From<Value> for Clarification {
    fn from(value: Value) -> Self {
        let Value::Object(mut object) = value else {
            return Self::default();
        };
        Self {
            question: first_text(&object, &["question"]),
            options: options(object.remove("options")),
        }
    }
}

impl Clarification {
    pub fn new(question: &str, options: Vec<ClarificationOption>) -> Self {
        Self {
            question: Some(question.to_string()),
            options,
        }
    }

    pub fn question(&self) -> Option<&str> {
        self.question.as_deref()
    }

    pub fn options(&self) -> &[ClarificationOption] {
        &self.options
    }
}

/// Disambiguation cards share the option shape of a clarification.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "Value")]
pub struct Disambiguation {
    options: Vec<ClarificationOption>,
}

impl From<Value> for Disambiguation {
    fn from(value: Value) -> Self {
        let Value::Object(mut object) = value else {
            return Self::default();
        };
        Self {
            options: options(object.remove("options")),
        }
    }
}

impl Disambiguation {
    pub fn options(&self) -> &[ClarificationOption] {
        &self.options
    }
}

fn options(value: Option<Value>) -> Vec<ClarificationOption> {
    match value {
        Some(Value::Array(items)) => items.into_iter().map(ClarificationOption::from).collect(),
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "Value")]
pub struct ClarificationOption {
    id: Option<String>,
    label: Option<String>,
    short_description: Option<String>,
}

impl From<Value> for ClarificationOption {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(object) => Self {
                id: first_text(&object, &["id"]),
                label: first_text(&object, &["label", "title", "name"]),
                short_description: first_text(
                    &object,
                    &["shortDescription", "short_description", "description"],
                ),
            },
            other => Self {
                label: text(Some(&other)),
                ..Self::default()
            },
        }
    }
}

impl ClarificationOption {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_short_description(mut self, description: &str) -> Self {
        self.short_description = Some(description.to_string());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn short_description(&self) -> Option<&str> {
        self.short_description.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn product_normalizes_overlapping_fields() {
        let product: Product = serde_json::from_value(json!({
            "product_id": 17,
            "name": "Linen Shirt",
            "price": {"current": "1,499", "original": 1999, "currency": "INR"},
            "color": "white",
            "tags": ["summer", null, "breathable"]
        }))
        .unwrap();

        assert_eq!(product.id(), Some("17"));
        assert_eq!(product.title(), Some("Linen Shirt"));
        assert_eq!(product.colors(), ["white"]);
        assert_eq!(product.tags(), ["summer", "breathable"]);
        let price = product.price().unwrap();
        assert_eq!(price.current(), Some(1499.0));
        assert_eq!(price.original(), Some(1999.0));
        assert_eq!(price.display().as_deref(), Some("INR 1499"));
    }

    #[test]
    fn price_value_is_an_alias_for_current() {
        let price = Price::from_value(&json!({"value": 799.5, "currency": "INR"})).unwrap();
        assert_eq!(price.current(), Some(799.5));
        assert_eq!(price.display().as_deref(), Some("INR 799.50"));
        assert!(Price::from_value(&json!({"value": null, "currency": null})).is_none());
    }

    #[test]
    fn payload_tolerates_nulls_and_odd_shapes() {
        let payload: AgentPayload = serde_json::from_value(json!({
            "stylist_response": "  ",
            "products": null,
            "outfits": {"not": "a list"},
            "clarification": null,
            "disambiguation": {"options": ["Kurta", {"id": "d2", "title": "Sherwani"}]}
        }))
        .unwrap();

        assert_eq!(payload.stylist_response(), None);
        assert!(payload.products().is_empty());
        assert!(payload.outfits().is_empty());
        assert!(payload.clarification().is_none());
        let options = payload.disambiguation().unwrap().options();
        assert_eq!(options[0].label(), Some("Kurta"));
        assert_eq!(options[1].id(), Some("d2"));
        assert_eq!(options[1].label(), Some("Sherwani"));
    }

    #[test]
    fn clarification_without_options_is_not_offered() {
        let payload: AgentPayload = serde_json::from_value(json!({
            "clarification": {"question": "Which occasion?", "options": []}
        }))
        .unwrap();
        assert!(payload.clarification().is_none());
    }

    #[test]
    fn clarification_option_reads_camel_case_description() {
        let option: ClarificationOption = serde_json::from_value(json!({
            "id": "a1",
            "label": "Smart casual",
            "shortDescription": "Chinos and a crisp shirt"
        }))
        .unwrap();
        assert_eq!(option.short_description(), Some("Chinos and a crisp shirt"));
    }

    #[test]
    fn outfit_label_falls_back_to_occasion_then_vibe() {
        let outfit: Outfit =
            serde_json::from_value(json!({"occasion": "Wedding", "vibe": "festive"})).unwrap();
        assert_eq!(outfit.label(), Some("Wedding"));
        let outfit: Outfit = serde_json::from_value(json!({"vibe": "festive"})).unwrap();
        assert_eq!(outfit.label(), Some("festive"));
    }
}
