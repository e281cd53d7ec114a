//! Application state - shared across all handlers.

use std::sync::Arc;

use meridian_core::ports::{
    EnquiryRepository, Mailer, ProfileRepository, ShortlistRepository, UcatRepository,
    UserRepository,
};
use meridian_infra::store::{
    DataApiClient, DataApiEnquiryRepository, DataApiProfileRepository,
    DataApiShortlistRepository, DataApiUcatRepository, DataApiUserRepository,
};
use meridian_infra::{
    HttpMailer, InMemoryEnquiryRepository, InMemoryMailer, InMemoryProfileRepository,
    InMemoryShortlistRepository, InMemoryUcatRepository, InMemoryUserRepository,
};

use crate::config::AppConfig;
use crate::drafts::DraftSessions;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub ucat: Arc<dyn UcatRepository>,
    pub shortlist: Arc<dyn ShortlistRepository>,
    pub enquiries: Arc<dyn EnquiryRepository>,
    pub mailer: Arc<dyn Mailer>,
    pub enquiry_inbox: String,
    pub drafts: Arc<DraftSessions>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub fn new(config: &AppConfig) -> Self {
        let (users, profiles, ucat, shortlist, enquiries): (
            Arc<dyn UserRepository>,
            Arc<dyn ProfileRepository>,
            Arc<dyn UcatRepository>,
            Arc<dyn ShortlistRepository>,
            Arc<dyn EnquiryRepository>,
        ) = match &config.data_api {
            Some(data_config) => {
                let client = Arc::new(DataApiClient::new(data_config.clone()));
                tracing::info!("Using hosted data service repositories");
                (
                    Arc::new(DataApiUserRepository::new(client.clone())),
                    Arc::new(DataApiProfileRepository::new(client.clone())),
                    Arc::new(DataApiUcatRepository::new(client.clone())),
                    Arc::new(DataApiShortlistRepository::new(client.clone())),
                    Arc::new(DataApiEnquiryRepository::new(client)),
                )
            }
            None => {
                tracing::warn!("DATA_API_URL not set. Running with in-memory repositories.");
                (
                    Arc::new(InMemoryUserRepository::new()),
                    Arc::new(InMemoryProfileRepository::new()),
                    Arc::new(InMemoryUcatRepository::new()),
                    Arc::new(InMemoryShortlistRepository::new()),
                    Arc::new(InMemoryEnquiryRepository::new()),
                )
            }
        };

        let mailer: Arc<dyn Mailer> = match &config.mailer {
            Some(mailer_config) => Arc::new(HttpMailer::new(mailer_config.clone())),
            None => {
                tracing::warn!("MAILER_API_KEY not set. Capturing outbound email in memory.");
                Arc::new(InMemoryMailer::new())
            }
        };

        let drafts = Arc::new(DraftSessions::new(profiles.clone(), config.autosave.clone()));

        tracing::info!("Application state initialized");

        Self {
            users,
            profiles,
            ucat,
            shortlist,
            enquiries,
            mailer,
            enquiry_inbox: config.enquiry_inbox.clone(),
            drafts,
        }
    }
}
