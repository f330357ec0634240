//! In-memory hotel store for tests and local development.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{BookmarkReader, HotelStore};
use crate::common::{ActorId, GroupId, HotelId};
use crate::domains::hotels::error::PersistenceError;
use crate::domains::hotels::models::{Hotel, HotelIdentity, NewHotel, UpsertOutcome};

type IdentityKey = (String, String, String);

fn identity_key(identity: HotelIdentity<'_>) -> IdentityKey {
    (
        identity.name.to_string(),
        identity.location.to_string(),
        identity.source.to_string(),
    )
}

#[derive(Default)]
struct Tables {
    next_id: HotelId,
    hotels: HashMap<HotelId, Hotel>,
    by_identity: HashMap<IdentityKey, HotelId>,
    bookmarks: HashMap<ActorId, HashSet<HotelId>>,
    last_scraped_at: Option<DateTime<Utc>>,
}

impl Tables {
    /// `scraped_at` never goes backwards within the store, so "newest first"
    /// is stable even when the clock ties.
    fn next_scraped_at(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let at = match self.last_scraped_at {
            Some(last) if last >= now => last + chrono::Duration::microseconds(1),
            _ => now,
        };
        self.last_scraped_at = Some(at);
        at
    }
}

/// In-memory storage for hotels and bookmarks.
///
/// Data is lost on restart. The whole lookup-and-write of an upsert runs
/// under one write lock.
#[derive(Default)]
pub struct MemoryHotelStore {
    tables: RwLock<Tables>,
}

impl MemoryHotelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a bookmark. Bookmarks are otherwise managed outside this service.
    pub async fn add_bookmark(&self, actor: &ActorId, hotel_id: HotelId) {
        self.tables
            .write()
            .await
            .bookmarks
            .entry(actor.clone())
            .or_default()
            .insert(hotel_id);
    }

    pub async fn hotel_count(&self) -> usize {
        self.tables.read().await.hotels.len()
    }
}

fn newest_first(hotels: &mut [Hotel]) {
    hotels.sort_by(|a, b| {
        b.scraped_at
            .cmp(&a.scraped_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[async_trait]
impl HotelStore for MemoryHotelStore {
    async fn upsert(&self, hotel: &NewHotel) -> Result<UpsertOutcome, PersistenceError> {
        let mut tables = self.tables.write().await;
        let scraped_at = tables.next_scraped_at();
        let key = identity_key(hotel.identity());

        if let Some(id) = tables.by_identity.get(&key).copied() {
            let row = tables
                .hotels
                .get_mut(&id)
                .ok_or_else(|| PersistenceError::InvalidRecord(format!("dangling hotel id {}", id)))?;
            row.price = hotel.price.clone();
            row.rating = hotel.rating.clone();
            row.image_url = hotel.image_url.clone();
            row.hotel_url = hotel.hotel_url.clone();
            row.search_task_id = hotel.search_task_id;
            row.scraped_at = scraped_at;
            return Ok(UpsertOutcome {
                hotel: row.clone(),
                created: false,
            });
        }

        tables.next_id += 1;
        let row = Hotel {
            id: tables.next_id,
            name: hotel.name.clone(),
            location: hotel.location.clone(),
            price: hotel.price.clone(),
            rating: hotel.rating.clone(),
            image_url: hotel.image_url.clone(),
            hotel_url: hotel.hotel_url.clone(),
            source: hotel.source.clone(),
            search_task_id: hotel.search_task_id,
            scraped_at,
        };
        tables.by_identity.insert(key, row.id);
        tables.hotels.insert(row.id, row.clone());

        Ok(UpsertOutcome {
            hotel: row,
            created: true,
        })
    }

    async fn find_by_group(&self, group_id: GroupId) -> Result<Vec<Hotel>, PersistenceError> {
        let tables = self.tables.read().await;
        let mut hotels: Vec<Hotel> = tables
            .hotels
            .values()
            .filter(|h| h.search_task_id == group_id)
            .cloned()
            .collect();
        newest_first(&mut hotels);
        Ok(hotels)
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Hotel>, PersistenceError> {
        let tables = self.tables.read().await;
        let mut hotels: Vec<Hotel> = tables.hotels.values().cloned().collect();
        newest_first(&mut hotels);
        hotels.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        Ok(hotels)
    }

    async fn health_check(&self) -> Result<(), PersistenceError> {
        Ok(())
    }
}

#[async_trait]
impl BookmarkReader for MemoryHotelStore {
    async fn bookmarked_hotel_ids(&self, actor: &ActorId) -> Result<HashSet<HotelId>, PersistenceError> {
        Ok(self
            .tables
            .read()
            .await
            .bookmarks
            .get(actor)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_hotel(name: &str, group_id: GroupId) -> NewHotel {
        NewHotel {
            name: name.to_string(),
            location: "London".to_string(),
            price: Some("£120".to_string()),
            rating: None,
            image_url: None,
            hotel_url: None,
            source: "booking_spider".to_string(),
            search_task_id: group_id,
        }
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates() {
        let store = MemoryHotelStore::new();
        let first_group = GroupId::new();
        let second_group = GroupId::new();

        let created = store.upsert(&new_hotel("The Savoy", first_group)).await.unwrap();
        assert!(created.created);

        let mut changed = new_hotel("The Savoy", second_group);
        changed.price = Some("£140".to_string());
        let updated = store.upsert(&changed).await.unwrap();

        assert!(!updated.created);
        assert_eq!(updated.hotel.id, created.hotel.id);
        assert_eq!(updated.hotel.price.as_deref(), Some("£140"));
        assert_eq!(updated.hotel.search_task_id, second_group);
        assert!(updated.hotel.scraped_at > created.hotel.scraped_at);
        assert_eq!(store.hotel_count().await, 1);

        // The record moved to the newer group
        assert!(store.find_by_group(first_group).await.unwrap().is_empty());
        assert_eq!(store.find_by_group(second_group).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_upserts_never_duplicate() {
        let store = std::sync::Arc::new(MemoryHotelStore::new());
        let group_id = GroupId::new();

        let writes = (0..16).map(|i| {
            let store = store.clone();
            let mut hotel = new_hotel("The Ritz", group_id);
            hotel.price = Some(format!("£{}", 100 + i));
            tokio::spawn(async move { store.upsert(&hotel).await })
        });
        let outcomes: Vec<_> = futures::future::join_all(writes)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .collect();

        assert_eq!(outcomes.iter().filter(|o| o.created).count(), 1);
        let first_id = outcomes[0].hotel.id;
        assert!(outcomes.iter().all(|o| o.hotel.id == first_id));
        assert_eq!(store.hotel_count().await, 1);
        assert_eq!(store.find_by_group(group_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_identity_includes_source() {
        let store = MemoryHotelStore::new();
        let group_id = GroupId::new();
        let mut other_source = new_hotel("The Savoy", group_id);
        other_source.source = "agoda_spider".to_string();

        store.upsert(&new_hotel("The Savoy", group_id)).await.unwrap();
        store.upsert(&other_source).await.unwrap();
        assert_eq!(store.hotel_count().await, 2);
    }

    #[tokio::test]
    async fn test_find_by_group_is_newest_first() {
        let store = MemoryHotelStore::new();
        let group_id = GroupId::new();
        for name in ["A", "B", "C"] {
            store.upsert(&new_hotel(name, group_id)).await.unwrap();
        }

        let names: Vec<String> = store
            .find_by_group(group_id)
            .await
            .unwrap()
            .into_iter()
            .map(|h| h.name)
            .collect();
        assert_eq!(names, vec!["C", "B", "A"]);
    }

    #[tokio::test]
    async fn test_list_recent_limits() {
        let store = MemoryHotelStore::new();
        let group_id = GroupId::new();
        for name in ["A", "B", "C"] {
            store.upsert(&new_hotel(name, group_id)).await.unwrap();
        }
        let recent = store.list_recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].name, "C");
        assert!(store.list_recent(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bookmarks_are_per_actor() {
        let store = MemoryHotelStore::new();
        let alice = ActorId::new("alice").unwrap();
        let bob = ActorId::new("bob").unwrap();
        store.add_bookmark(&alice, 7).await;

        assert!(store.bookmarked_hotel_ids(&alice).await.unwrap().contains(&7));
        assert!(store.bookmarked_hotel_ids(&bob).await.unwrap().is_empty());
    }
}
