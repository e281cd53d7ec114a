//! In-memory repositories - fallback when the hosted data service is not
//! configured. Data is lost on process restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use meridian_core::domain::{Enquiry, ShortlistEntry, StudentProfile, UcatAttempt, User};
use meridian_core::error::RepoError;
use meridian_core::ports::{
    BaseRepository, EnquiryRepository, ProfileRepository, ShortlistRepository, UcatRepository,
    UserRepository,
};

#[derive(Default)]
pub struct InMemoryUserRepository {
    rows: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: User) -> Result<User, RepoError> {
        self.rows.write().await.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.rows.write().await.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryProfileRepository {
    rows: RwLock<HashMap<Uuid, StudentProfile>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<StudentProfile, Uuid> for InMemoryProfileRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<StudentProfile>, RepoError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: StudentProfile) -> Result<StudentProfile, RepoError> {
        self.rows.write().await.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.rows.write().await.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<StudentProfile>, RepoError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|p| p.user_id == user_id)
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryUcatRepository {
    rows: RwLock<HashMap<Uuid, UcatAttempt>>,
}

impl InMemoryUcatRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<UcatAttempt, Uuid> for InMemoryUcatRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UcatAttempt>, RepoError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: UcatAttempt) -> Result<UcatAttempt, RepoError> {
        self.rows.write().await.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.rows.write().await.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl UcatRepository for InMemoryUcatRepository {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<UcatAttempt>, RepoError> {
        let mut attempts: Vec<_> = self
            .rows
            .read()
            .await
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        attempts.sort_by(|a, b| b.sat_on.cmp(&a.sat_on));
        Ok(attempts)
    }
}

#[derive(Default)]
pub struct InMemoryShortlistRepository {
    rows: RwLock<HashMap<Uuid, ShortlistEntry>>,
}

impl InMemoryShortlistRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<ShortlistEntry, Uuid> for InMemoryShortlistRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ShortlistEntry>, RepoError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: ShortlistEntry) -> Result<ShortlistEntry, RepoError> {
        self.rows.write().await.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.rows.write().await.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ShortlistRepository for InMemoryShortlistRepository {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ShortlistEntry>, RepoError> {
        let mut entries: Vec<_> = self
            .rows
            .read()
            .await
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(entries)
    }
}

#[derive(Default)]
pub struct InMemoryEnquiryRepository {
    rows: RwLock<HashMap<Uuid, Enquiry>>,
}

impl InMemoryEnquiryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<Enquiry, Uuid> for InMemoryEnquiryRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Enquiry>, RepoError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: Enquiry) -> Result<Enquiry, RepoError> {
        self.rows.write().await.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.rows.write().await.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl EnquiryRepository for InMemoryEnquiryRepository {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn user_lookup_by_email() {
        let repo = InMemoryUserRepository::new();
        let user = User::new(
            "student@example.com".to_string(),
            "hash".to_string(),
            "Sam".to_string(),
        );
        repo.save(user.clone()).await.unwrap();

        let found = repo.find_by_email("student@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
        assert!(repo.find_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ucat_attempts_listed_most_recent_first() {
        let repo = InMemoryUcatRepository::new();
        let user_id = Uuid::new_v4();

        for (year, month) in [(2025, 7), (2026, 7), (2024, 8)] {
            let attempt = UcatAttempt::new(
                user_id,
                NaiveDate::from_ymd_opt(year, month, 15).unwrap(),
                650,
                650,
                650,
                650,
                2,
            )
            .unwrap();
            repo.save(attempt).await.unwrap();
        }

        let attempts = repo.list_for_user(user_id).await.unwrap();
        let years: Vec<_> = attempts.iter().map(|a| a.sat_on.format("%Y").to_string()).collect();
        assert_eq!(years, ["2026", "2025", "2024"]);
    }

    #[tokio::test]
    async fn shortlist_scoped_per_user() {
        let repo = InMemoryShortlistRepository::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        repo.save(ShortlistEntry::new(alice, "Bristol".into(), "Medicine".into()))
            .await
            .unwrap();
        let entry = repo
            .save(ShortlistEntry::new(bob, "Cardiff".into(), "Medicine".into()))
            .await
            .unwrap();

        assert_eq!(repo.list_for_user(alice).await.unwrap().len(), 1);
        repo.delete(entry.id).await.unwrap();
        assert!(repo.list_for_user(bob).await.unwrap().is_empty());
    }
}
