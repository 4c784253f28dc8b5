use nexus_core::model::{Profile, ProfileId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, id_i64, map_profile_row, ser};
use crate::repository::{ProfileRepository, StorageError};

#[async_trait::async_trait]
impl ProfileRepository for SqliteRepository {
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        let points = i64::try_from(profile.points())
            .map_err(|_| StorageError::Serialization("points overflow".into()))?;
        sqlx::query(
            r"
                INSERT INTO profiles (id, name, points)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    points = excluded.points
            ",
        )
        .bind(id_i64("id", profile.id().value())?)
        .bind(profile.name())
        .bind(points)
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn get_profile(&self, id: ProfileId) -> Result<Option<Profile>, StorageError> {
        let row = sqlx::query("SELECT id, name, points FROM profiles WHERE id = ?1")
            .bind(id_i64("id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        row.as_ref().map(map_profile_row).transpose()
    }

    async fn add_points(&self, id: ProfileId, amount: u32) -> Result<u64, StorageError> {
        let row = sqlx::query(
            r"
                UPDATE profiles SET points = points + ?1
                WHERE id = ?2
                RETURNING points
            ",
        )
        .bind(i64::from(amount))
        .bind(id_i64("id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        let total: i64 = row.try_get("points").map_err(ser)?;
        u64::try_from(total).map_err(ser)
    }
}
