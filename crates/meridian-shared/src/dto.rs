//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Request to register a new portal account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Response containing a user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub display_name: String,
}

/// Which public form an enquiry was submitted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnquiryKindDto {
    General,
    Consultation,
}

/// A marketing-site form submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnquiryRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub message: String,
    #[serde(default)]
    pub kind: Option<EnquiryKindDto>,
}

/// Acknowledgement returned for an accepted enquiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnquiryAccepted {
    pub id: String,
    pub received_at: DateTime<Utc>,
}

/// Profile form payload - used both for direct updates and for the
/// auto-saved draft endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileForm {
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub target_course: Option<String>,
    #[serde(default)]
    pub application_year: Option<i32>,
    #[serde(default)]
    pub personal_statement: Option<String>,
}

/// Auto-save state of the profile draft, for the portal's status badge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftStatusResponse {
    /// One of `idle`, `saving`, `saved`, `error`.
    pub status: String,
    pub last_saved: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// New UCAT sitting for the score tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUcatAttemptRequest {
    pub sat_on: NaiveDate,
    pub verbal_reasoning: u16,
    pub decision_making: u16,
    pub quantitative_reasoning: u16,
    pub abstract_reasoning: u16,
    pub situational_judgement_band: u8,
}

/// New university shortlist row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewShortlistEntryRequest {
    pub university: String,
    pub course: String,
    #[serde(default)]
    pub ucas_code: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}
