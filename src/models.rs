use crate::sync::UpdateSource;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Coupon {
    #[serde(deserialize_with = "string_or_number")]
    pub discount_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub terms_and_conditions: String,
    #[serde(default)]
    pub image_link: String,
    #[serde(default)]
    pub valid_until: Option<String>,
    #[serde(default)]
    pub usage_limit: Option<i64>,
    #[serde(default)]
    pub discount_type: Option<String>,
    #[serde(default)]
    pub price_type: Option<String>,
    #[serde(default)]
    pub price: Option<serde_json::Value>,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub provider_link: Option<String>,
    #[serde(default)]
    pub discount_link: Option<String>,
    #[serde(default)]
    pub club_name: Vec<String>,
    #[serde(default)]
    pub category: Vec<String>,
}

impl Coupon {
    /// `discount_type` wins over the legacy `price_type` field.
    pub fn type_name(&self) -> &str {
        self.discount_type
            .as_deref()
            .filter(|value| !value.is_empty())
            .or(self.price_type.as_deref())
            .unwrap_or("")
    }

    pub fn price_text(&self) -> String {
        match &self.price {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(value)) => value.clone(),
            Some(other) => other.to_string(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(value) => value,
        Raw::Int(value) => value.to_string(),
        Raw::Float(value) => value.to_string(),
    })
}

/// Browser-style key-value store; values are opaque strings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LocalStorage {
    pub entries: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Add,
    Remove,
}

impl Direction {
    /// The direction that flips the current membership.
    pub fn toggling(is_favorite: bool) -> Self {
        if is_favorite {
            Direction::Remove
        } else {
            Direction::Add
        }
    }

    pub fn endpoint(self) -> &'static str {
        match self {
            Direction::Add => "add_favorite/",
            Direction::Remove => "remove_favorite/",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FavoriteRequest<'a> {
    pub discount_id: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FavoriteReply {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteStatusReply {
    #[serde(default)]
    pub is_favorite: bool,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    #[serde(deserialize_with = "string_or_number")]
    pub discount_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub discount_id: String,
    pub is_favorite: bool,
    pub source: UpdateSource,
    pub message: String,
    pub card_html: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemoveResponse {
    pub discount_id: String,
    pub remaining: usize,
    pub message: String,
}

/// `view=favorites` renders the card with the remove affordance.
#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub view: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub discount_id: String,
    pub is_favorite: bool,
    pub card_html: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FavoritesResponse {
    pub favorites: Vec<String>,
}
