//! Profile persistence.
//!
//! `AppState` holds an `Arc<dyn ProfileStore>`. [`PgProfileStore`] keeps each
//! profile as one row with its social links and embedded lists in JSONB, so
//! every mutation below is a single statement: concurrent appends to the same
//! profile cannot drop each other's entries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{
    AccountRemoval, Education, Experience, Profile, ProfileFields, SocialLinks, Upserted,
};
use crate::models::user::Owner;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// The profile owned by `user_id`, with owner name/avatar joined in.
    async fn find_by_owner(&self, user_id: Uuid) -> Result<Option<Profile>, AppError>;

    /// Every profile, each with its owner joined in. Unordered, unpaginated.
    async fn find_all(&self) -> Result<Vec<Profile>, AppError>;

    /// Creates the caller's profile or merges the supplied fields into it.
    async fn upsert(&self, user_id: Uuid, fields: ProfileFields) -> Result<Upserted, AppError>;

    /// Prepends an entry. `None` when the user has no profile.
    async fn prepend_experience(
        &self,
        user_id: Uuid,
        entry: Experience,
    ) -> Result<Option<Profile>, AppError>;

    /// Removes the entry with `entry_id` if present. `None` when the user has no profile.
    async fn remove_experience(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
    ) -> Result<Option<Profile>, AppError>;

    async fn prepend_education(
        &self,
        user_id: Uuid,
        entry: Education,
    ) -> Result<Option<Profile>, AppError>;

    async fn remove_education(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
    ) -> Result<Option<Profile>, AppError>;

    /// Deletes the user's posts, then profile, then account.
    /// Steps are not transactional: a failure leaves earlier steps applied.
    async fn delete_account(&self, user_id: Uuid) -> Result<AccountRemoval, AppError>;
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: Uuid,
    owner_id: Option<Uuid>,
    owner_name: Option<String>,
    owner_avatar: Option<String>,
    company: Option<String>,
    website: Option<String>,
    location: Option<String>,
    status: String,
    skills: Vec<String>,
    bio: Option<String>,
    githubusername: Option<String>,
    social: Json<SocialLinks>,
    experience: Json<Vec<Experience>>,
    education: Json<Vec<Education>>,
    date: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            id: row.id,
            user: row.owner_id.map(|id| Owner {
                id,
                name: row.owner_name,
                avatar: row.owner_avatar,
            }),
            company: row.company,
            website: row.website,
            location: row.location,
            status: row.status,
            skills: row.skills,
            bio: row.bio,
            githubusername: row.githubusername,
            social: row.social.0,
            experience: row.experience.0,
            education: row.education.0,
            date: row.date,
        }
    }
}

const SELECT_PROFILE: &str = r#"
    SELECT p.id, u.id AS owner_id, u.name AS owner_name, u.avatar AS owner_avatar,
           p.company, p.website, p.location, p.status, p.skills, p.bio,
           p.githubusername, p.social, p.experience, p.education, p.date
    FROM profiles p
    LEFT JOIN users u ON u.id = p.user_id
"#;

/// Embedded list columns. Only these names are ever interpolated into SQL.
#[derive(Debug, Clone, Copy)]
enum EntryList {
    Experience,
    Education,
}

impl EntryList {
    fn column(self) -> &'static str {
        match self {
            EntryList::Experience => "experience",
            EntryList::Education => "education",
        }
    }
}

#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn prepend_entry(
        &self,
        user_id: Uuid,
        list: EntryList,
        entry: serde_json::Value,
    ) -> Result<Option<Profile>, AppError> {
        let column = list.column();
        let updated: Option<Uuid> = sqlx::query_scalar(&format!(
            "UPDATE profiles SET {column} = jsonb_build_array($2::jsonb) || {column} \
             WHERE user_id = $1 RETURNING id"
        ))
        .bind(user_id)
        .bind(Json(entry))
        .fetch_optional(&self.pool)
        .await?;

        if updated.is_none() {
            return Ok(None);
        }
        self.find_by_owner(user_id).await
    }

    async fn remove_entry(
        &self,
        user_id: Uuid,
        list: EntryList,
        entry_id: Uuid,
    ) -> Result<Option<Profile>, AppError> {
        let column = list.column();
        let updated: Option<Uuid> = sqlx::query_scalar(&format!(
            r#"
            UPDATE profiles SET {column} = COALESCE(
                (SELECT jsonb_agg(e ORDER BY ord)
                 FROM jsonb_array_elements({column}) WITH ORDINALITY AS t(e, ord)
                 WHERE e->>'id' IS DISTINCT FROM $2),
                '[]'::jsonb)
            WHERE user_id = $1
            RETURNING id
            "#
        ))
        .bind(user_id)
        .bind(entry_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        if updated.is_none() {
            return Ok(None);
        }
        self.find_by_owner(user_id).await
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn find_by_owner(&self, user_id: Uuid) -> Result<Option<Profile>, AppError> {
        let row: Option<ProfileRow> =
            sqlx::query_as(&format!("{SELECT_PROFILE} WHERE p.user_id = $1"))
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Profile::from))
    }

    async fn find_all(&self) -> Result<Vec<Profile>, AppError> {
        let rows: Vec<ProfileRow> = sqlx::query_as(SELECT_PROFILE)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Profile::from).collect())
    }

    async fn upsert(&self, user_id: Uuid, fields: ProfileFields) -> Result<Upserted, AppError> {
        let ProfileFields {
            company,
            website,
            location,
            status,
            skills,
            bio,
            githubusername,
            social,
        } = fields;

        // Unsupplied fields bind as NULL and fall back to the stored value.
        let (profile_id, created): (Uuid, bool) = sqlx::query_as(
            r#"
            INSERT INTO profiles
                (id, user_id, company, website, location, status, skills, bio,
                 githubusername, social)
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, '{}'::text[]), $8, $9, $10)
            ON CONFLICT (user_id) DO UPDATE SET
                company        = COALESCE($3, profiles.company),
                website        = COALESCE($4, profiles.website),
                location       = COALESCE($5, profiles.location),
                status         = COALESCE($6, profiles.status),
                skills         = COALESCE($7, profiles.skills),
                bio            = COALESCE($8, profiles.bio),
                githubusername = COALESCE($9, profiles.githubusername),
                social         = $10
            RETURNING id, (xmax = 0) AS created
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(company)
        .bind(website)
        .bind(location)
        .bind(status)
        .bind(skills)
        .bind(bio)
        .bind(githubusername)
        .bind(Json(social))
        .fetch_one(&self.pool)
        .await?;

        let profile = self.find_by_owner(user_id).await?.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "profile {profile_id} vanished right after upsert"
            ))
        })?;

        Ok(Upserted { profile, created })
    }

    async fn prepend_experience(
        &self,
        user_id: Uuid,
        entry: Experience,
    ) -> Result<Option<Profile>, AppError> {
        let entry = serde_json::to_value(entry).map_err(|e| AppError::Internal(e.into()))?;
        self.prepend_entry(user_id, EntryList::Experience, entry).await
    }

    async fn remove_experience(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
    ) -> Result<Option<Profile>, AppError> {
        self.remove_entry(user_id, EntryList::Experience, entry_id)
            .await
    }

    async fn prepend_education(
        &self,
        user_id: Uuid,
        entry: Education,
    ) -> Result<Option<Profile>, AppError> {
        let entry = serde_json::to_value(entry).map_err(|e| AppError::Internal(e.into()))?;
        self.prepend_entry(user_id, EntryList::Education, entry).await
    }

    async fn remove_education(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
    ) -> Result<Option<Profile>, AppError> {
        self.remove_entry(user_id, EntryList::Education, entry_id)
            .await
    }

    async fn delete_account(&self, user_id: Uuid) -> Result<AccountRemoval, AppError> {
        let posts = sqlx::query("DELETE FROM posts WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        let profiles = sqlx::query("DELETE FROM profiles WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        let users = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(AccountRemoval {
            posts,
            profiles,
            users,
        })
    }
}
