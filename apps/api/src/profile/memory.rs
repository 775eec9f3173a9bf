//! In-process `ProfileStore` used by the router tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{
    AccountRemoval, Education, Experience, Profile, ProfileFields, Upserted,
};
use crate::models::user::Owner;
use crate::profile::store::ProfileStore;

#[derive(Default)]
struct Data {
    users: HashMap<Uuid, Owner>,
    posts: HashMap<Uuid, u64>,
    /// Profiles keyed by owning user id, in insertion order.
    profiles: Vec<(Uuid, Profile)>,
}

impl Data {
    fn joined(&self, owner_id: Uuid, profile: &Profile) -> Profile {
        let mut profile = profile.clone();
        profile.user = self.users.get(&owner_id).cloned();
        profile
    }

    fn profile_mut(&mut self, user_id: Uuid) -> Option<&mut Profile> {
        self.profiles
            .iter_mut()
            .find(|(owner, _)| *owner == user_id)
            .map(|(_, p)| p)
    }

    fn find(&self, user_id: Uuid) -> Option<Profile> {
        self.profiles
            .iter()
            .find(|(owner, _)| *owner == user_id)
            .map(|(owner, p)| self.joined(*owner, p))
    }
}

#[derive(Default)]
pub struct InMemoryProfileStore {
    data: Mutex<Data>,
}

impl InMemoryProfileStore {
    pub fn add_user(&self, name: &str, avatar: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.data.lock().unwrap().users.insert(
            id,
            Owner {
                id,
                name: Some(name.to_string()),
                avatar: Some(avatar.to_string()),
            },
        );
        id
    }

    pub fn add_posts(&self, user_id: Uuid, count: u64) {
        *self.data.lock().unwrap().posts.entry(user_id).or_default() += count;
    }

    pub fn post_count(&self, user_id: Uuid) -> u64 {
        self.data
            .lock()
            .unwrap()
            .posts
            .get(&user_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn has_user(&self, user_id: Uuid) -> bool {
        self.data.lock().unwrap().users.contains_key(&user_id)
    }

    pub fn has_profile(&self, user_id: Uuid) -> bool {
        self.data.lock().unwrap().find(user_id).is_some()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn find_by_owner(&self, user_id: Uuid) -> Result<Option<Profile>, AppError> {
        Ok(self.data.lock().unwrap().find(user_id))
    }

    async fn find_all(&self) -> Result<Vec<Profile>, AppError> {
        let data = self.data.lock().unwrap();
        Ok(data
            .profiles
            .iter()
            .map(|(owner, p)| data.joined(*owner, p))
            .collect())
    }

    async fn upsert(&self, user_id: Uuid, fields: ProfileFields) -> Result<Upserted, AppError> {
        let mut data = self.data.lock().unwrap();
        let created = match data.profile_mut(user_id) {
            Some(profile) => {
                if let Some(v) = fields.company {
                    profile.company = Some(v);
                }
                if let Some(v) = fields.website {
                    profile.website = Some(v);
                }
                if let Some(v) = fields.location {
                    profile.location = Some(v);
                }
                if let Some(v) = fields.status {
                    profile.status = v;
                }
                if let Some(v) = fields.skills {
                    profile.skills = v;
                }
                if let Some(v) = fields.bio {
                    profile.bio = Some(v);
                }
                if let Some(v) = fields.githubusername {
                    profile.githubusername = Some(v);
                }
                profile.social = fields.social;
                false
            }
            None => {
                let profile = Profile {
                    id: Uuid::new_v4(),
                    user: None,
                    company: fields.company,
                    website: fields.website,
                    location: fields.location,
                    status: fields.status.unwrap_or_default(),
                    skills: fields.skills.unwrap_or_default(),
                    bio: fields.bio,
                    githubusername: fields.githubusername,
                    social: fields.social,
                    experience: Vec::new(),
                    education: Vec::new(),
                    date: Utc::now(),
                };
                data.profiles.push((user_id, profile));
                true
            }
        };
        let profile = data
            .find(user_id)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("upserted profile missing")))?;
        Ok(Upserted { profile, created })
    }

    async fn prepend_experience(
        &self,
        user_id: Uuid,
        entry: Experience,
    ) -> Result<Option<Profile>, AppError> {
        let mut data = self.data.lock().unwrap();
        match data.profile_mut(user_id) {
            Some(profile) => profile.experience.insert(0, entry),
            None => return Ok(None),
        }
        Ok(data.find(user_id))
    }

    async fn remove_experience(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
    ) -> Result<Option<Profile>, AppError> {
        let mut data = self.data.lock().unwrap();
        match data.profile_mut(user_id) {
            Some(profile) => profile.experience.retain(|e| e.id != entry_id),
            None => return Ok(None),
        }
        Ok(data.find(user_id))
    }

    async fn prepend_education(
        &self,
        user_id: Uuid,
        entry: Education,
    ) -> Result<Option<Profile>, AppError> {
        let mut data = self.data.lock().unwrap();
        match data.profile_mut(user_id) {
            Some(profile) => profile.education.insert(0, entry),
            None => return Ok(None),
        }
        Ok(data.find(user_id))
    }

    async fn remove_education(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
    ) -> Result<Option<Profile>, AppError> {
        let mut data = self.data.lock().unwrap();
        match data.profile_mut(user_id) {
            Some(profile) => profile.education.retain(|e| e.id != entry_id),
            None => return Ok(None),
        }
        Ok(data.find(user_id))
    }

    async fn delete_account(&self, user_id: Uuid) -> Result<AccountRemoval, AppError> {
        let mut data = self.data.lock().unwrap();
        let posts = data.posts.remove(&user_id).unwrap_or(0);
        let before = data.profiles.len();
        data.profiles.retain(|(owner, _)| *owner != user_id);
        let profiles = (before - data.profiles.len()) as u64;
        let users = u64::from(data.users.remove(&user_id).is_some());
        Ok(AccountRemoval {
            posts,
            profiles,
            users,
        })
    }
}

/// A store whose every call fails, for exercising the 500 path.
pub struct FailingProfileStore;

fn unavailable() -> AppError {
    AppError::Internal(anyhow::anyhow!("store unavailable"))
}

#[async_trait]
impl ProfileStore for FailingProfileStore {
    async fn find_by_owner(&self, _user_id: Uuid) -> Result<Option<Profile>, AppError> {
        Err(unavailable())
    }

    async fn find_all(&self) -> Result<Vec<Profile>, AppError> {
        Err(unavailable())
    }

    async fn upsert(&self, _user_id: Uuid, _fields: ProfileFields) -> Result<Upserted, AppError> {
        Err(unavailable())
    }

    async fn prepend_experience(
        &self,
        _user_id: Uuid,
        _entry: Experience,
    ) -> Result<Option<Profile>, AppError> {
        Err(unavailable())
    }

    async fn remove_experience(
        &self,
        _user_id: Uuid,
        _entry_id: Uuid,
    ) -> Result<Option<Profile>, AppError> {
        Err(unavailable())
    }

    async fn prepend_education(
        &self,
        _user_id: Uuid,
        _entry: Education,
    ) -> Result<Option<Profile>, AppError> {
        Err(unavailable())
    }

    async fn remove_education(
        &self,
        _user_id: Uuid,
        _entry_id: Uuid,
    ) -> Result<Option<Profile>, AppError> {
        Err(unavailable())
    }

    async fn delete_account(&self, _user_id: Uuid) -> Result<AccountRemoval, AppError> {
        Err(unavailable())
    }
}
