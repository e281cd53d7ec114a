use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where an application on the shortlist currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Considering,
    Applying,
    Interview,
    Offer,
    Declined,
}

/// One row of a student's university shortlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortlistEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub university: String,
    pub course: String,
    pub ucas_code: Option<String>,
    pub status: ApplicationStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShortlistEntry {
    /// Create a new entry in the default `Considering` state.
    pub fn new(user_id: Uuid, university: String, course: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            university,
            course,
            ucas_code: None,
            status: ApplicationStatus::Considering,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}
