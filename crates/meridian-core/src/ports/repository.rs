use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Enquiry, ShortlistEntry, StudentProfile, UcatAttempt, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
}

/// Student profile repository. A user has at most one profile.
#[async_trait]
pub trait ProfileRepository: BaseRepository<StudentProfile, Uuid> {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<StudentProfile>, RepoError>;
}

/// UCAT score tracker repository.
#[async_trait]
pub trait UcatRepository: BaseRepository<UcatAttempt, Uuid> {
    /// All attempts for a user, most recent sitting first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<UcatAttempt>, RepoError>;
}

/// University shortlist repository.
#[async_trait]
pub trait ShortlistRepository: BaseRepository<ShortlistEntry, Uuid> {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ShortlistEntry>, RepoError>;
}

/// Enquiry repository - public form submissions.
#[async_trait]
pub trait EnquiryRepository: BaseRepository<Enquiry, Uuid> {}
