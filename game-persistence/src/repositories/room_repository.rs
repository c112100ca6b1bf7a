use async_trait::async_trait;
use chrono::{Duration, Utc};
use game_core::GameRoom;
use sea_orm::sea_query::OnConflict;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};

use crate::entities::{prelude::*, rooms};
use crate::room_store::{RoomStore, StoreError, decode_room, encode_room, DEFAULT_RETENTION_HOURS};

/// Room store backed by the `rooms` table, one JSON document per row
pub struct RoomRepository {
    db: DatabaseConnection,
    retention: Duration,
}

impl RoomRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_retention(db, Duration::hours(DEFAULT_RETENTION_HOURS))
    }

    pub fn with_retention(db: DatabaseConnection, retention: Duration) -> Self {
        Self { db, retention }
    }
}

#[async_trait]
impl RoomStore for RoomRepository {
    async fn get(&self, room_id: &str) -> Result<Option<GameRoom>, StoreError> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let model = Rooms::find_by_id(room_id.to_string())
            .filter(rooms::Column::ExpiresAt.gt(now))
            .one(&self.db)
            .await?;

        model
            .map(|model| decode_room(&model.id, &model.document))
            .transpose()
    }

    async fn save(&self, room: &GameRoom) -> Result<(), StoreError> {
        let document = encode_room(room)?;
        let now = Utc::now();

        let room_model = rooms::ActiveModel {
            id: sea_orm::ActiveValue::Set(room.id.clone()),
            document: sea_orm::ActiveValue::Set(document),
            expires_at: sea_orm::ActiveValue::Set((now + self.retention).into()),
            updated_at: sea_orm::ActiveValue::Set(now.into()),
        };

        Rooms::insert(room_model)
            .on_conflict(
                OnConflict::column(rooms::Column::Id)
                    .update_columns([
                        rooms::Column::Document,
                        rooms::Column::ExpiresAt,
                        rooms::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    async fn list_room_ids(&self) -> Result<Vec<String>, StoreError> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let ids = Rooms::find()
            .select_only()
            .column(rooms::Column::Id)
            .filter(rooms::Column::ExpiresAt.gt(now))
            .into_tuple::<String>()
            .all(&self.db)
            .await?;

        Ok(ids)
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let result = Rooms::delete_many()
            .filter(rooms::Column::ExpiresAt.lte(now))
            .exec(&self.db)
            .await?;

        if result.rows_affected > 0 {
            tracing::debug!("Purged {} expired rooms", result.rows_affected);
        }
        Ok(result.rows_affected)
    }
}
