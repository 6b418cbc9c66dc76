use lookbook_domain::calendar::CalendarItem;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// `login.php` reply
#[derive(Debug, Deserialize)]
pub(super) struct LoginResponse {
    #[serde(deserialize_with = "truthy")]
    pub success: bool,
    #[serde(default)]
    pub user: Option<Value>,
    #[serde(default, deserialize_with = "lenient_message")]
    pub message: Option<String>,
}

/// `fetch_calendar.php` reply
#[derive(Debug, Deserialize)]
pub(super) struct CalendarResponse {
    #[serde(deserialize_with = "truthy")]
    pub success: bool,
    #[serde(default)]
    pub calendar: Option<Value>,
    #[serde(default, deserialize_with = "lenient_message")]
    pub message: Option<String>,
}

impl CalendarResponse {
    /// Entries that look like calendar items; anything else is dropped
    pub fn items(self) -> (Vec<CalendarItem>, usize) {
        let Some(Value::Array(entries)) = self.calendar else {
            return (Vec::new(), 0);
        };

        let total = entries.len();
        let items: Vec<CalendarItem> = entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect();
        let dropped = total - items.len();
        (items, dropped)
    }
}

/// `favorites.php` GET reply
#[derive(Debug, Deserialize)]
pub(super) struct FavoritesResponse {
    #[serde(deserialize_with = "truthy")]
    pub success: bool,
    #[serde(default)]
    pub favorites: Vec<FavoriteEntry>,
    #[serde(default, deserialize_with = "lenient_message")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum FavoriteEntry {
    Object {
        #[serde(default)]
        image_url: Option<String>,
    },
    Url(String),
    Other(Value),
}

impl FavoriteEntry {
    pub fn into_url(self) -> Option<String> {
        match self {
            FavoriteEntry::Object { image_url } => image_url,
            FavoriteEntry::Url(url) => Some(url),
            FavoriteEntry::Other(_) => None,
        }
        .filter(|url| !url.trim().is_empty())
    }
}

/// `favorites.php` POST body
#[derive(Debug, Serialize)]
pub(super) struct FavoriteSyncRequest<'a> {
    pub image_url: &'a str,
    pub action: &'static str,
}

/// `favorites.php` POST reply
#[derive(Debug, Deserialize)]
pub(super) struct FavoriteSyncResponse {
    #[serde(deserialize_with = "truthy")]
    pub success: bool,
    #[serde(default, deserialize_with = "lenient_message")]
    pub message: Option<String>,
}

/// Interpret `success` the way a loosely-typed PHP backend means it
fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// Keep string messages, ignore anything else
fn lenient_message<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}
