//! Per-user auto-save sessions for the portal profile editor.
//!
//! Each user editing their profile gets one [`AutosaveController`] that
//! debounce-persists the draft through the profile repository. Sessions are
//! created lazily on the first draft update and live for the process.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use meridian_core::domain::StudentProfile;
use meridian_core::ports::{BaseRepository, ProfileRepository};
use meridian_infra::{AutosaveConfig, AutosaveController, AutosaveError, SaveFuture, SaveState};
use meridian_shared::dto::ProfileForm;

pub struct DraftSessions {
    profiles: Arc<dyn ProfileRepository>,
    config: AutosaveConfig,
    sessions: Mutex<HashMap<Uuid, AutosaveController<ProfileForm>>>,
}

impl DraftSessions {
    pub fn new(profiles: Arc<dyn ProfileRepository>, config: AutosaveConfig) -> Self {
        Self {
            profiles,
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// The user's controller, spawned on first use.
    pub async fn controller(&self, user_id: Uuid) -> AutosaveController<ProfileForm> {
        let mut sessions = self.sessions.lock().await;
        if let Some(controller) = sessions.get(&user_id) {
            return controller.clone();
        }

        let profiles = self.profiles.clone();
        let controller =
            AutosaveController::spawn(self.config.clone(), move |form: ProfileForm| {
                let profiles = profiles.clone();
                Box::pin(async move { persist_draft(profiles, user_id, form).await })
                    as SaveFuture
            });
        sessions.insert(user_id, controller.clone());
        controller
    }

    /// Save state of the user's session, if one exists.
    pub async fn status(&self, user_id: Uuid) -> Option<SaveState> {
        let sessions = self.sessions.lock().await;
        sessions.get(&user_id).map(|c| c.state())
    }
}

async fn persist_draft(
    profiles: Arc<dyn ProfileRepository>,
    user_id: Uuid,
    form: ProfileForm,
) -> Result<bool, AutosaveError> {
    let mut profile = profiles
        .find_by_user(user_id)
        .await
        .map_err(|e| AutosaveError::Failed(e.to_string()))?
        .unwrap_or_else(|| StudentProfile::new(user_id, form.full_name.clone()));

    apply_form(&mut profile, &form);

    profiles
        .save(profile)
        .await
        .map_err(|e| AutosaveError::Failed(e.to_string()))?;
    Ok(true)
}

/// Copy a submitted form onto a profile entity.
pub fn apply_form(profile: &mut StudentProfile, form: &ProfileForm) {
    profile.full_name = form.full_name.clone();
    profile.phone = form.phone.clone();
    profile.school = form.school.clone();
    profile.target_course = form.target_course.clone();
    profile.application_year = form.application_year;
    profile.personal_statement = form.personal_statement.clone();
    profile.updated_at = Utc::now();
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_infra::{InMemoryProfileRepository, SaveStatus};
    use std::time::Duration;
    use tokio::time::sleep;

    fn form(name: &str, school: Option<&str>) -> ProfileForm {
        ProfileForm {
            full_name: name.to_string(),
            phone: None,
            school: school.map(str::to_string),
            target_course: Some("Medicine".to_string()),
            application_year: Some(2027),
            personal_statement: None,
        }
    }

    #[tokio::test]
    async fn draft_edits_reach_the_repository_once_settled() {
        let profiles = Arc::new(InMemoryProfileRepository::new());
        let sessions = DraftSessions::new(
            profiles.clone(),
            AutosaveConfig {
                debounce: Duration::from_millis(30),
                ..AutosaveConfig::default()
            },
        );
        let user_id = Uuid::new_v4();

        let controller = sessions.controller(user_id).await;
        controller.update(form("Priya Shah", None)).await;
        controller
            .update(form("Priya Shah", Some("King Edward VI College")))
            .await;
        sleep(Duration::from_millis(100)).await;

        let saved = profiles.find_by_user(user_id).await.unwrap().unwrap();
        assert_eq!(saved.school.as_deref(), Some("King Edward VI College"));
        assert_eq!(
            sessions.status(user_id).await.map(|s| s.status),
            Some(SaveStatus::Saved)
        );
    }

    #[tokio::test]
    async fn status_is_none_before_any_draft() {
        let sessions = DraftSessions::new(
            Arc::new(InMemoryProfileRepository::new()),
            AutosaveConfig::default(),
        );
        assert!(sessions.status(Uuid::new_v4()).await.is_none());
    }
}
