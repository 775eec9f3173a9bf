use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::Owner;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SocialLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Experience {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub from: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub current: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Education {
    pub id: Uuid,
    pub school: String,
    pub degree: String,
    pub fieldofstudy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub current: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A developer profile with its owner joined in.
/// Experience and education are kept newest-first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    /// `None` once the owning account row is gone.
    pub user: Option<Owner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub status: String,
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub githubusername: Option<String>,
    pub social: SocialLinks,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub date: DateTime<Utc>,
}

/// Partial profile document built from an upsert request.
///
/// `None` means "not supplied": the stored value is left as-is on update and
/// omitted on create. `social` is always supplied and replaces the stored
/// links wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileFields {
    pub company: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub skills: Option<Vec<String>>,
    pub bio: Option<String>,
    pub githubusername: Option<String>,
    pub social: SocialLinks,
}

/// Outcome of an upsert: the stored profile and whether it was newly created.
#[derive(Debug, Clone)]
pub struct Upserted {
    pub profile: Profile,
    pub created: bool,
}

/// Row counts removed by the account-delete cascade, in execution order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountRemoval {
    pub posts: u64,
    pub profiles: u64,
    pub users: u64,
}
