//! Hosted data service adapter.
//!
//! The production database is a hosted relational-database-as-a-service
//! exposing PostgREST-style row endpoints. Repositories here are thin
//! wrappers over one shared [`DataApiClient`]; row-level access rules live
//! in the service itself.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use meridian_core::domain::{Enquiry, ShortlistEntry, StudentProfile, UcatAttempt, User};
use meridian_core::error::RepoError;
use meridian_core::ports::{
    BaseRepository, EnquiryRepository, ProfileRepository, ShortlistRepository, UcatRepository,
    UserRepository,
};

/// Hosted data service configuration.
#[derive(Debug, Clone)]
pub struct DataApiConfig {
    /// Project base URL, e.g. `https://abc123.supabase.co`.
    pub base_url: String,
    /// Service-role key. The server bypasses row-level rules; per-user
    /// scoping is enforced by the handlers.
    pub service_key: String,
}

impl DataApiConfig {
    /// Load from environment. `None` when the data service is not
    /// configured; callers fall back to the in-memory repositories.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("DATA_API_URL").ok()?;
        let service_key = std::env::var("DATA_API_SERVICE_KEY").ok()?;
        Some(Self {
            base_url,
            service_key,
        })
    }
}

/// Shared HTTP client for the hosted data service.
pub struct DataApiClient {
    http: reqwest::Client,
    config: DataApiConfig,
}

impl DataApiClient {
    pub fn new(config: DataApiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            table
        )
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
    }

    async fn parse_rows<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Vec<T>, RepoError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RepoError::Query(format!("{status}: {body}")));
        }
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| RepoError::Query(e.to_string()))
    }

    async fn rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, RepoError> {
        let response = self
            .authed(self.http.get(self.endpoint(table)))
            .query(query)
            .send()
            .await
            .map_err(|e| RepoError::Connection(e.to_string()))?;
        Self::parse_rows(response).await
    }

    async fn upsert<T: Serialize + DeserializeOwned>(
        &self,
        table: &str,
        row: &T,
    ) -> Result<T, RepoError> {
        let response = self
            .authed(self.http.post(self.endpoint(table)))
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(row)
            .send()
            .await
            .map_err(|e| RepoError::Connection(e.to_string()))?;

        let mut rows: Vec<T> = Self::parse_rows(response).await?;
        rows.pop()
            .ok_or_else(|| RepoError::Query("Upsert returned no row".to_string()))
    }

    async fn delete_rows(&self, table: &str, query: &[(&str, &str)]) -> Result<(), RepoError> {
        let response = self
            .authed(self.http.delete(self.endpoint(table)))
            .query(query)
            .send()
            .await
            .map_err(|e| RepoError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RepoError::Query(format!("{status}: {body}")));
        }
        Ok(())
    }
}

/// Entities persisted as rows of a data service table.
pub trait TableRow: Serialize + DeserializeOwned + Send + Sync + 'static {
    const TABLE: &'static str;
}

impl TableRow for User {
    const TABLE: &'static str = "users";
}
impl TableRow for StudentProfile {
    const TABLE: &'static str = "student_profiles";
}
impl TableRow for UcatAttempt {
    const TABLE: &'static str = "ucat_attempts";
}
impl TableRow for ShortlistEntry {
    const TABLE: &'static str = "shortlist_entries";
}
impl TableRow for Enquiry {
    const TABLE: &'static str = "enquiries";
}

/// Generic repository over one data service table.
pub struct DataApiBaseRepository<T> {
    client: Arc<DataApiClient>,
    _row: PhantomData<T>,
}

impl<T> DataApiBaseRepository<T> {
    pub fn new(client: Arc<DataApiClient>) -> Self {
        Self {
            client,
            _row: PhantomData,
        }
    }
}

#[async_trait]
impl<T> BaseRepository<T, Uuid> for DataApiBaseRepository<T>
where
    T: TableRow,
{
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, RepoError> {
        let filter = format!("eq.{id}");
        Ok(self
            .client
            .rows(T::TABLE, &[("id", filter.as_str()), ("limit", "1")])
            .await?
            .pop())
    }

    async fn save(&self, entity: T) -> Result<T, RepoError> {
        self.client.upsert(T::TABLE, &entity).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let filter = format!("eq.{id}");
        self.client
            .delete_rows(T::TABLE, &[("id", filter.as_str())])
            .await
    }
}

/// Data service user repository.
pub type DataApiUserRepository = DataApiBaseRepository<User>;

/// Data service profile repository.
pub type DataApiProfileRepository = DataApiBaseRepository<StudentProfile>;

/// Data service UCAT score repository.
pub type DataApiUcatRepository = DataApiBaseRepository<UcatAttempt>;

/// Data service shortlist repository.
pub type DataApiShortlistRepository = DataApiBaseRepository<ShortlistEntry>;

/// Data service enquiry repository.
pub type DataApiEnquiryRepository = DataApiBaseRepository<Enquiry>;

#[async_trait]
impl UserRepository for DataApiUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        // Mask email for logging to avoid PII in logs
        let masked = match email.find('@') {
            Some(at) if at > 1 => format!("{}***{}", &email[..1], &email[at..]),
            _ => "***".to_string(),
        };
        tracing::debug!(user_email = %masked, "Finding user by email");

        let filter = format!("eq.{email}");
        Ok(self
            .client
            .rows(User::TABLE, &[("email", filter.as_str()), ("limit", "1")])
            .await?
            .pop())
    }
}

#[async_trait]
impl ProfileRepository for DataApiProfileRepository {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<StudentProfile>, RepoError> {
        let filter = format!("eq.{user_id}");
        Ok(self
            .client
            .rows(
                StudentProfile::TABLE,
                &[("user_id", filter.as_str()), ("limit", "1")],
            )
            .await?
            .pop())
    }
}

#[async_trait]
impl UcatRepository for DataApiUcatRepository {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<UcatAttempt>, RepoError> {
        let filter = format!("eq.{user_id}");
        self.client
            .rows(
                UcatAttempt::TABLE,
                &[("user_id", filter.as_str()), ("order", "sat_on.desc")],
            )
            .await
    }
}

#[async_trait]
impl ShortlistRepository for DataApiShortlistRepository {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ShortlistEntry>, RepoError> {
        let filter = format!("eq.{user_id}");
        self.client
            .rows(
                ShortlistEntry::TABLE,
                &[("user_id", filter.as_str()), ("order", "created_at.asc")],
            )
            .await
    }
}

#[async_trait]
impl EnquiryRepository for DataApiEnquiryRepository {}
