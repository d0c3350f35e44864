//! ABOUTME: Stream repository for demo live-stream rows
//! ABOUTME: Seeded at startup via upsert, read by the streams API

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use vg_core::{time::now_iso8601, Error, Result};

/// Live stream entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Stream {
    pub id: String,
    pub name: String,
    pub status: String,
    pub thumbnail: String,
    pub uptime: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Request to create or refresh a stream row (seeding)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertStreamRequest {
    pub id: String,
    pub name: String,
    pub status: String,
    pub thumbnail: String,
    pub uptime: String,
}

pub struct StreamRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> StreamRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert the stream or refresh its fields if it already exists
    pub async fn upsert(&self, request: UpsertStreamRequest) -> Result<Stream> {
        let now = now_iso8601();

        let stream = sqlx::query_as::<_, Stream>(
            r#"
            INSERT INTO streams (id, name, status, thumbnail, uptime, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                status = excluded.status,
                thumbnail = excluded.thumbnail,
                uptime = excluded.uptime,
                updated_at = excluded.updated_at
            RETURNING id, name, status, thumbnail, uptime, created_at, updated_at
            "#,
        )
        .bind(&request.id)
        .bind(&request.name)
        .bind(&request.status)
        .bind(&request.thumbnail)
        .bind(&request.uptime)
        .bind(&now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to upsert stream: {}", e)))?;

        Ok(stream)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Stream>> {
        let stream = sqlx::query_as::<_, Stream>(
            r#"
            SELECT id, name, status, thumbnail, uptime, created_at, updated_at
            FROM streams WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to find stream: {}", e)))?;

        Ok(stream)
    }

    pub async fn list(&self) -> Result<Vec<Stream>> {
        let streams = sqlx::query_as::<_, Stream>(
            r#"
            SELECT id, name, status, thumbnail, uptime, created_at, updated_at
            FROM streams ORDER BY id
            "#,
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to list streams: {}", e)))?;

        Ok(streams)
    }
}
