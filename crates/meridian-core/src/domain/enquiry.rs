use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which marketing-site form an enquiry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnquiryKind {
    General,
    Consultation,
}

/// Enquiry entity - a submission from one of the public contact forms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enquiry {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    pub kind: EnquiryKind,
    pub received_at: DateTime<Utc>,
}

impl Enquiry {
    pub fn new(
        name: String,
        email: String,
        phone: Option<String>,
        message: String,
        kind: EnquiryKind,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            phone,
            message,
            kind,
            received_at: Utc::now(),
        }
    }
}
