//! Client wrappers for the volunteer-post and application endpoints. All of
//! them ride the shared pipeline, so a rejected token redirects to login here
//! exactly as it does anywhere else.

use crate::api::{ApiClient, ApiError};
use crate::posts::types::{VolunteerApplication, VolunteerPost};

/// Fetches every active post.
///
/// # Errors
/// Returns `ApiError` on transport, authorization, or decoding failure.
pub async fn list_posts(api: &ApiClient) -> Result<Vec<VolunteerPost>, ApiError> {
    api.get_json("/volunteer-posts").await
}

/// Title search over posts with future deadlines.
///
/// # Errors
/// Returns `ApiError` on transport, authorization, or decoding failure.
pub async fn search_posts(api: &ApiClient, title: &str) -> Result<Vec<VolunteerPost>, ApiError> {
    api.get_json_with_query("/volunteer-posts/search", &[("title", title)])
        .await
}

/// The home view's subset: upcoming posts ordered by deadline.
///
/// # Errors
/// Returns `ApiError` on transport, authorization, or decoding failure.
pub async fn upcoming_posts(api: &ApiClient) -> Result<Vec<VolunteerPost>, ApiError> {
    api.get_json("/volunteer-posts/upcoming").await
}

/// # Errors
/// Returns `ApiError` on transport, authorization, or decoding failure.
pub async fn get_post(api: &ApiClient, id: &str) -> Result<VolunteerPost, ApiError> {
    api.get_json(&format!("/volunteer-posts/{id}")).await
}

/// # Errors
/// Returns `ApiError` on transport, authorization, or HTTP failure.
pub async fn create_post(api: &ApiClient, post: &VolunteerPost) -> Result<(), ApiError> {
    api.post_json_unit("/volunteer-posts", post).await
}

/// # Errors
/// Returns `ApiError` on transport, authorization, or HTTP failure.
pub async fn update_post(api: &ApiClient, id: &str, post: &VolunteerPost) -> Result<(), ApiError> {
    api.patch_json(&format!("/volunteer-posts/{id}"), post).await
}

/// # Errors
/// Returns `ApiError` on transport, authorization, or HTTP failure.
pub async fn delete_post(api: &ApiClient, id: &str) -> Result<(), ApiError> {
    api.delete(&format!("/volunteer-posts/{id}")).await
}

/// Posts organized by `email`; a protected view.
///
/// # Errors
/// Returns `ApiError` on transport, authorization, or decoding failure.
pub async fn posts_by_organizer(
    api: &ApiClient,
    email: &str,
) -> Result<Vec<VolunteerPost>, ApiError> {
    api.get_json(&format!("/volunteer-posts/user/{email}")).await
}

/// # Errors
/// Returns `ApiError` on transport, authorization, or HTTP failure.
pub async fn apply(api: &ApiClient, application: &VolunteerApplication) -> Result<(), ApiError> {
    api.post_json_unit("/volunteer-applications", application)
        .await
}

/// # Errors
/// Returns `ApiError` on transport, authorization, or HTTP failure.
pub async fn withdraw_application(api: &ApiClient, id: &str) -> Result<(), ApiError> {
    api.delete(&format!("/volunteer-applications/{id}")).await
}

/// Applications submitted by `email`; a protected view.
///
/// # Errors
/// Returns `ApiError` on transport, authorization, or decoding failure.
pub async fn applications_by_volunteer(
    api: &ApiClient,
    email: &str,
) -> Result<Vec<VolunteerApplication>, ApiError> {
    api.get_json(&format!("/volunteer-applications/user/{email}"))
        .await
}

#[cfg(test)]
mod tests {
    use super::{list_posts, search_posts};
    use crate::api::ApiClient;
    use crate::auth::guards::MemoryNavigator;
    use crate::auth::state::SessionStore;
    use crate::config::AppConfig;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Arc;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        let config = AppConfig::new(&server.uri(), "http://identity.test", "key", PathBuf::new());
        ApiClient::new(
            &config,
            Arc::new(SessionStore::in_memory()),
            Arc::new(MemoryNavigator::new()),
        )
        .unwrap()
    }

    fn sample_post(title: &str) -> serde_json::Value {
        json!({
            "_id": "1",
            "thumbnail": "t",
            "title": title,
            "description": "d",
            "category": "social",
            "location": "Dhaka",
            "volunteersNeeded": 5,
            "deadline": "2026-10-01T00:00:00Z",
            "organizerEmail": "o@x.com",
            "createdAt": "2026-08-01T00:00:00Z",
            "status": "active"
        })
    }

    #[tokio::test]
    async fn list_posts_decodes_the_collection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/volunteer-posts"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([sample_post("Beach cleanup")])),
            )
            .mount(&server)
            .await;

        let api = client_for(&server);
        let posts = list_posts(&api).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Beach cleanup");
    }

    #[tokio::test]
    async fn search_sends_the_title_parameter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/volunteer-posts/search"))
            .and(query_param("title", "clean"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([sample_post("Beach cleanup")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let api = client_for(&server);
        let posts = search_posts(&api, "clean").await.unwrap();
        assert_eq!(posts.len(), 1);
    }
}
