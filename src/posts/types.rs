//! Wire types for volunteer-need posts and applications. Field names follow
//! the backend's JSON casing; `_id` is backend-assigned and absent on create.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerPost {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub thumbnail: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub volunteers_needed: i64,
    pub deadline: DateTime<Utc>,
    pub organizer_name: Option<String>,
    pub organizer_email: String,
    pub created_at: DateTime<Utc>,
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerApplication {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub post_id: String,
    pub volunteer_id: String,
    pub volunteer_name: Option<String>,
    pub volunteer_email: String,
    pub status: String,
    pub applied_at: DateTime<Utc>,
}

impl VolunteerApplication {
    /// A pending application from `identity` for `post_id`.
    #[must_use]
    pub fn pending(post_id: &str, identity: &crate::auth::types::Identity) -> Self {
        Self {
            id: None,
            post_id: post_id.to_string(),
            volunteer_id: identity.uid.clone(),
            volunteer_name: identity.display_name.clone(),
            volunteer_email: identity.email.clone(),
            status: "pending".to_string(),
            applied_at: Utc::now(),
        }
    }
}
