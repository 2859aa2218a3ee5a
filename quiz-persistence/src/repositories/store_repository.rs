use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue, DatabaseConnection, EntityTrait};
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

use crate::entities::{prelude::StoreEntries, store_entry};
use quiz_types::{PersonalRecords, StoredPerformance};

pub const HIGHEST_SCORE_KEY: &str = "highestScore";
pub const HIGHEST_STREAK_KEY: &str = "highestStreak";
pub const USER_PERFORMANCE_KEY: &str = "userPerformance";
pub const MASTERY_KEY: &str = "masteryByQuestionId";

/// String-keyed store behind the session engine.
///
/// Reads are forgiving: a missing or unreadable value falls back to its
/// default so a corrupt store never blocks a session from starting.
pub struct StoreRepository {
    db: DatabaseConnection,
}

impl StoreRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let entry = StoreEntries::find_by_id(key).one(&self.db).await?;
        Ok(entry.map(|model| model.value))
    }

    pub async fn set(&self, key: &str, value: String) -> Result<()> {
        let entry = store_entry::ActiveModel {
            key: ActiveValue::Set(key.to_string()),
            value: ActiveValue::Set(value),
            updated_at: ActiveValue::Set(chrono::Utc::now().into()),
        };

        StoreEntries::insert(entry)
            .on_conflict(
                OnConflict::column(store_entry::Column::Key)
                    .update_columns([store_entry::Column::Value, store_entry::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn get_counter(&self, key: &str) -> Result<u32> {
        match self.get(key).await? {
            Some(raw) => match raw.trim().parse() {
                Ok(value) => Ok(value),
                Err(_) => {
                    warn!("Stored value for '{}' is not an integer, using 0", key);
                    Ok(0)
                }
            },
            None => Ok(0),
        }
    }

    pub async fn load_records(&self) -> Result<PersonalRecords> {
        Ok(PersonalRecords {
            highest_score: self.get_counter(HIGHEST_SCORE_KEY).await?,
            highest_streak: self.get_counter(HIGHEST_STREAK_KEY).await?,
        })
    }

    pub async fn save_records(&self, records: &PersonalRecords) -> Result<()> {
        self.set(HIGHEST_SCORE_KEY, records.highest_score.to_string())
            .await?;
        self.set(HIGHEST_STREAK_KEY, records.highest_streak.to_string())
            .await
    }

    pub async fn load_performance(&self) -> Result<Option<StoredPerformance>> {
        let Some(raw) = self.get(USER_PERFORMANCE_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(stored) => Ok(Some(stored)),
            Err(e) => {
                warn!("Stored performance is unreadable, treating as absent: {}", e);
                Ok(None)
            }
        }
    }

    pub async fn save_performance(&self, performance: &StoredPerformance) -> Result<()> {
        let raw = serde_json::to_string(performance)?;
        self.set(USER_PERFORMANCE_KEY, raw).await
    }

    pub async fn load_mastery(&self) -> Result<HashMap<Uuid, u8>> {
        let Some(raw) = self.get(MASTERY_KEY).await? else {
            return Ok(HashMap::new());
        };
        match serde_json::from_str(&raw) {
            Ok(levels) => Ok(levels),
            Err(e) => {
                warn!("Stored mastery map is unreadable, treating as absent: {}", e);
                Ok(HashMap::new())
            }
        }
    }

    pub async fn save_mastery(&self, levels: &HashMap<Uuid, u8>) -> Result<()> {
        let raw = serde_json::to_string(levels)?;
        self.set(MASTERY_KEY, raw).await
    }
}
