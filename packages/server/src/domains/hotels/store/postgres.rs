//! PostgreSQL hotel store.

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::PgPool;

use super::{BookmarkReader, HotelStore};
use crate::common::{ActorId, GroupId, HotelId};
use crate::domains::hotels::error::PersistenceError;
use crate::domains::hotels::models::{Hotel, NewHotel, UpsertOutcome};

#[derive(sqlx::FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    hotel: Hotel,
    created: bool,
}

/// Hotel store backed by the `hotels` and `bookmarks` tables.
#[derive(Clone)]
pub struct PostgresHotelStore {
    pool: PgPool,
}

impl PostgresHotelStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HotelStore for PostgresHotelStore {
    async fn upsert(&self, hotel: &NewHotel) -> Result<UpsertOutcome, PersistenceError> {
        // xmax is 0 only for a freshly inserted tuple
        let row = sqlx::query_as::<_, UpsertRow>(
            r#"
            INSERT INTO hotels (name, location, price, rating, image_url, hotel_url, source, search_task_id, scraped_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            ON CONFLICT (name, location, source) DO UPDATE SET
                price = EXCLUDED.price,
                rating = EXCLUDED.rating,
                image_url = EXCLUDED.image_url,
                hotel_url = EXCLUDED.hotel_url,
                search_task_id = EXCLUDED.search_task_id,
                scraped_at = NOW()
            RETURNING *, (xmax = 0) AS created
            "#,
        )
        .bind(&hotel.name)
        .bind(&hotel.location)
        .bind(&hotel.price)
        .bind(&hotel.rating)
        .bind(&hotel.image_url)
        .bind(&hotel.hotel_url)
        .bind(&hotel.source)
        .bind(hotel.search_task_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(UpsertOutcome {
            hotel: row.hotel,
            created: row.created,
        })
    }

    async fn find_by_group(&self, group_id: GroupId) -> Result<Vec<Hotel>, PersistenceError> {
        let hotels = sqlx::query_as::<_, Hotel>(
            r#"
            SELECT * FROM hotels
            WHERE search_task_id = $1
            ORDER BY scraped_at DESC, id DESC
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(hotels)
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Hotel>, PersistenceError> {
        let hotels = sqlx::query_as::<_, Hotel>(
            r#"
            SELECT * FROM hotels
            ORDER BY scraped_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;
        Ok(hotels)
    }

    async fn health_check(&self) -> Result<(), PersistenceError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl BookmarkReader for PostgresHotelStore {
    async fn bookmarked_hotel_ids(&self, actor: &ActorId) -> Result<HashSet<HotelId>, PersistenceError> {
        let ids = sqlx::query_scalar::<_, HotelId>("SELECT hotel_id FROM bookmarks WHERE actor_id = $1")
            .bind(actor)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().collect())
    }
}
