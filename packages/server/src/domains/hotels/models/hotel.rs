use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::common::{GroupId, HotelId};

/// A stored hotel row.
///
/// Identity is `(name, location, source)`; at most one row exists per key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Hotel {
    pub id: HotelId,
    pub name: String,
    pub location: String,
    pub price: Option<String>,
    pub rating: Option<String>,
    pub image_url: Option<String>,
    pub hotel_url: Option<String>,
    pub source: String,
    /// Most recent group that observed this hotel.
    pub search_task_id: GroupId,
    pub scraped_at: DateTime<Utc>,
}

/// Borrowed identity key of a hotel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HotelIdentity<'a> {
    pub name: &'a str,
    pub location: &'a str,
    pub source: &'a str,
}

/// A hotel ready to be upserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHotel {
    pub name: String,
    pub location: String,
    pub price: Option<String>,
    pub rating: Option<String>,
    pub image_url: Option<String>,
    pub hotel_url: Option<String>,
    pub source: String,
    pub search_task_id: GroupId,
}

impl NewHotel {
    pub fn identity(&self) -> HotelIdentity<'_> {
        HotelIdentity {
            name: &self.name,
            location: &self.location,
            source: &self.source,
        }
    }
}

/// Result of an upsert: the stored row and whether it was newly created.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOutcome {
    pub hotel: Hotel,
    pub created: bool,
}

/// One item as emitted by a crawl, before validation.
///
/// Crawl tools are loose about types, so numeric fields are accepted as
/// JSON numbers or strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapedHotel {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub rating: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub hotel_url: Option<String>,
}

impl ScrapedHotel {
    /// Tag the item for persistence. Returns `None` when the name or location
    /// needed for the identity key is missing or blank.
    pub fn into_new_hotel(self, group_id: GroupId, source: &str) -> Option<NewHotel> {
        let name = non_blank(self.name)?;
        let location = non_blank(self.location)?;

        Some(NewHotel {
            name,
            location,
            price: non_blank(self.price),
            rating: non_blank(self.rating),
            image_url: non_blank(self.image_url),
            hotel_url: non_blank(self.hotel_url),
            source: source.to_string(),
            search_task_id: group_id,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    }))
}

/// A hotel as returned by the poll endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelView {
    pub id: HotelId,
    pub name: String,
    pub location: String,
    pub price: Option<String>,
    pub rating: Option<String>,
    pub image_url: Option<String>,
    pub hotel_url: Option<String>,
    pub source: String,
    pub is_bookmarked: bool,
}

impl HotelView {
    pub fn from_hotel(hotel: Hotel, is_bookmarked: bool) -> Self {
        Self {
            id: hotel.id,
            name: hotel.name,
            location: hotel.location,
            price: hotel.price,
            rating: hotel.rating,
            image_url: hotel.image_url,
            hotel_url: hotel.hotel_url,
            source: hotel.source,
            is_bookmarked,
        }
    }
}
