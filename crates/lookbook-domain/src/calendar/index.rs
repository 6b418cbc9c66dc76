use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::items::CalendarItem;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Per-day list of fully-qualified image URLs
///
/// Always rebuilt from a complete item list; never patched in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarIndex {
    days: BTreeMap<NaiveDate, Vec<String>>,
    skipped: usize,
}

impl CalendarIndex {
    /// Flatten backend items into a date-keyed index.
    ///
    /// Within a day, URLs keep category order, then product order. Items with
    /// a malformed date or a non-object `items` field are skipped and counted.
    /// A later item for the same date replaces an earlier one.
    pub fn ingest(items: &[CalendarItem], asset_base: &str) -> Self {
        let mut days = BTreeMap::new();
        let mut skipped = 0;

        for item in items {
            let Ok(date) = NaiveDate::parse_from_str(item.date.trim(), DATE_FORMAT) else {
                skipped += 1;
                continue;
            };
            let Some(categories) = &item.items else {
                skipped += 1;
                continue;
            };

            let urls = categories
                .iter()
                .flat_map(|category| category.products.iter())
                .filter_map(|product| product.image_url.as_deref())
                .filter(|path| !path.trim().is_empty())
                .map(|path| join_asset_url(asset_base, path))
                .collect();

            days.insert(date, urls);
        }

        Self { days, skipped }
    }

    /// Images for a day; empty when the day has none
    pub fn images_for(&self, date: NaiveDate) -> &[String] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_image(&self, url: &str) -> bool {
        self.days.values().flatten().any(|u| u == url)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Number of items dropped during ingestion
    pub fn skipped_items(&self) -> usize {
        self.skipped
    }
}

/// Join a relative asset path onto the asset base; absolute URLs pass through
pub fn join_asset_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
