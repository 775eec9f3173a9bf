use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The slice of a user account joined into profile responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Owner {
    pub id: Uuid,
    pub name: Option<String>,
    pub avatar: Option<String>,
}
