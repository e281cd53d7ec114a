use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Student profile - the editable portal profile form.
///
/// This is the entity behind the auto-saving profile editor; every field
/// except the identifiers may change between saves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub phone: Option<String>,
    pub school: Option<String>,
    pub target_course: Option<String>,
    /// UCAS application cycle, e.g. 2027 for 2027 entry.
    pub application_year: Option<i32>,
    pub personal_statement: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StudentProfile {
    /// Create an empty profile for a user.
    pub fn new(user_id: Uuid, full_name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            full_name,
            phone: None,
            school: None,
            target_course: None,
            application_year: None,
            personal_statement: None,
            created_at: now,
            updated_at: now,
        }
    }
}
