use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One product shown on a calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRef {
    /// Path relative to the asset base URL
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A named group of products in the order the backend sent them
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub products: Vec<ProductRef>,
}

/// A dated entry of the backend's calendar list
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CalendarItem {
    pub date: String,

    /// `None` when the backend sent something other than an object or array
    #[serde(default, deserialize_with = "deserialize_categories")]
    pub items: Option<Vec<Category>>,
}

impl CalendarItem {
    pub fn new(date: impl Into<String>, items: Vec<Category>) -> Self {
        Self {
            date: date.into(),
            items: Some(items),
        }
    }
}

fn deserialize_categories<'de, D>(deserializer: D) -> Result<Option<Vec<Category>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;

    let categories = match value {
        Some(Value::Object(map)) => Some(
            map.into_iter()
                .map(|(name, entry)| Category {
                    name,
                    products: products_of(entry),
                })
                .collect(),
        ),
        // Arrays behave like objects keyed by index
        Some(Value::Array(list)) => Some(
            list.into_iter()
                .enumerate()
                .map(|(i, entry)| Category {
                    name: i.to_string(),
                    products: products_of(entry),
                })
                .collect(),
        ),
        _ => None,
    };

    Ok(categories)
}

/// A category holds either one product or a list of them
fn products_of(entry: Value) -> Vec<ProductRef> {
    match entry {
        Value::Array(list) => list.into_iter().filter_map(product_of).collect(),
        single => product_of(single).into_iter().collect(),
    }
}

fn product_of(value: Value) -> Option<ProductRef> {
    match value {
        Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    }
}
