use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::api::traits::{AuthApi, Gazetteer, ListingSearch, ListingStore, ReverseGeocoder};
use crate::api::upload::{validate_uploads, ImageUpload};
use crate::config::Config;
use crate::error::ApiError;
use crate::models::{
    AuthResponse, Comment, Coordinates, FavoriteStatus, GeocodeResult, LikeStatus, ListingSummary,
    ListingUpdate, LoginRequest, NewListing, PlaceSuggestion, RegisterRequest, UploadedImages,
    UserProfile,
};
use crate::search::types::SearchQuery;
use crate::session::Session;

const USER_AGENT: &str = concat!("immoco-client/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the IMMO&CO backend
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    uploads_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            uploads_url: config.uploads_url(),
            token: None,
        })
    }

    /// Attaches the session's bearer token (if any) to every later request
    pub fn with_session(mut self, session: &Session) -> Self {
        self.set_session(session);
        self
    }

    pub fn set_session(&mut self, session: &Session) {
        self.token = session.token().map(str::to_string);
    }

    pub fn image_url(&self, filename: &str) -> String {
        format!("{}/{}", self.uploads_url, filename)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn attach(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        match &self.token {
            Some(token) => Ok(request.bearer_auth(token)),
            None => Err(ApiError::Unauthorized("sign in required".to_string())),
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!("Backend returned status: {}", status);
        Err(ApiError::from_status(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await?;
        debug!("Received {} bytes", bytes.len());
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ListingSearch for ApiClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<ListingSummary>, ApiError> {
        debug!("GET /listings?{}", query);
        let request = self
            .attach(self.client.get(self.url("/listings")))
            .query(&query.to_query_pairs());
        let listings: Vec<ListingSummary> = self.send_json(request).await?;
        info!("Search returned {} listings", listings.len());
        Ok(listings)
    }
}

#[async_trait]
impl ReverseGeocoder for ApiClient {
    async fn reverse_geocode(&self, at: Coordinates) -> Result<GeocodeResult, ApiError> {
        debug!("Reverse geocoding {}", at);
        let request = self
            .client
            .get(self.url("/reverse-geocode"))
            .query(&[("lat", at.lat()), ("lon", at.lon())]);
        let found: GeocodeResult = self.send_json(request).await?;
        Ok(found.normalized())
    }
}

#[derive(Deserialize)]
struct LikedCheck {
    liked: bool,
}

#[async_trait]
impl ListingStore for ApiClient {
    async fn get_listing(&self, id: &str) -> Result<ListingSummary, ApiError> {
        let request = self.attach(self.client.get(self.url(&format!("/listings/{}", id))));
        self.send_json(request).await
    }

    async fn create_listing(&self, listing: &NewListing) -> Result<ListingSummary, ApiError> {
        let request = self.authorized(self.client.post(self.url("/listings")))?.json(listing);
        let created: ListingSummary = self.send_json(request).await?;
        info!("Published listing {}", created.id);
        Ok(created)
    }

    async fn update_listing(
        &self,
        id: &str,
        changes: &ListingUpdate,
    ) -> Result<ListingSummary, ApiError> {
        let request = self
            .authorized(self.client.put(self.url(&format!("/listings/{}", id))))?
            .json(changes);
        self.send_json(request).await
    }

    async fn delete_listing(&self, id: &str) -> Result<(), ApiError> {
        let request = self.authorized(self.client.delete(self.url(&format!("/listings/{}", id))))?;
        self.send(request).await?;
        info!("Deleted listing {}", id);
        Ok(())
    }

    async fn toggle_like(&self, id: &str) -> Result<LikeStatus, ApiError> {
        let request =
            self.authorized(self.client.post(self.url(&format!("/listings/{}/like", id))))?;
        self.send_json(request).await
    }

    async fn is_liked(&self, id: &str) -> Result<bool, ApiError> {
        let request =
            self.authorized(self.client.get(self.url(&format!("/listings/{}/liked", id))))?;
        let check: LikedCheck = self.send_json(request).await?;
        Ok(check.liked)
    }

    async fn comments(&self, listing_id: &str) -> Result<Vec<Comment>, ApiError> {
        let request = self.client.get(self.url(&format!("/listings/{}/comments", listing_id)));
        self.send_json(request).await
    }

    async fn add_comment(&self, listing_id: &str, text: &str) -> Result<Comment, ApiError> {
        let request = self
            .authorized(
                self.client
                    .post(self.url(&format!("/listings/{}/comments", listing_id))),
            )?
            .json(&serde_json::json!({ "text": text }));
        self.send_json(request).await
    }

    async fn delete_comment(&self, comment_id: &str) -> Result<(), ApiError> {
        let request =
            self.authorized(self.client.delete(self.url(&format!("/comments/{}", comment_id))))?;
        self.send(request).await?;
        Ok(())
    }

    async fn add_favorite(&self, id: &str) -> Result<(), ApiError> {
        let request = self.authorized(self.client.post(self.url(&format!("/favorites/{}", id))))?;
        self.send(request).await?;
        Ok(())
    }

    async fn remove_favorite(&self, id: &str) -> Result<(), ApiError> {
        let request =
            self.authorized(self.client.delete(self.url(&format!("/favorites/{}", id))))?;
        self.send(request).await?;
        Ok(())
    }

    async fn is_favorite(&self, id: &str) -> Result<bool, ApiError> {
        let request =
            self.authorized(self.client.get(self.url(&format!("/favorites/{}/check", id))))?;
        let status: FavoriteStatus = self.send_json(request).await?;
        Ok(status.is_favorite)
    }

    async fn favorites(&self) -> Result<Vec<ListingSummary>, ApiError> {
        let request = self.authorized(self.client.get(self.url("/favorites")))?;
        self.send_json(request).await
    }

    async fn my_listings(&self) -> Result<Vec<ListingSummary>, ApiError> {
        let request = self.authorized(self.client.get(self.url("/my-listings")))?;
        self.send_json(request).await
    }

    async fn upload_images(
        &self,
        listing_id: &str,
        files: Vec<ImageUpload>,
    ) -> Result<UploadedImages, ApiError> {
        let listing = self.get_listing(listing_id).await?;
        validate_uploads(listing.images.len(), &files)?;

        let count = files.len();
        let mut form = Form::new();
        for file in files {
            let part = Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.content_type)?;
            form = form.part("files", part);
        }
        let request = self
            .authorized(
                self.client
                    .post(self.url(&format!("/listings/{}/images", listing_id))),
            )?
            .multipart(form);
        let uploaded: UploadedImages = self.send_json(request).await?;
        info!("Uploaded {} files to listing {}", count, listing_id);
        Ok(uploaded)
    }

    async fn delete_image(&self, listing_id: &str, filename: &str) -> Result<(), ApiError> {
        let request = self.authorized(
            self.client
                .delete(self.url(&format!("/listings/{}/images/{}", listing_id, filename))),
        )?;
        self.send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let http = self.client.post(self.url("/auth/register")).json(request);
        self.send_json(http).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let http = self.client.post(self.url("/auth/login")).json(request);
        self.send_json(http).await
    }

    async fn me(&self) -> Result<UserProfile, ApiError> {
        let request = self.authorized(self.client.get(self.url("/auth/me")))?;
        self.send_json(request).await
    }
}

#[async_trait]
impl Gazetteer for ApiClient {
    async fn cities(&self) -> Result<Vec<String>, ApiError> {
        self.send_json(self.client.get(self.url("/cities"))).await
    }

    async fn neighborhoods(&self, city: Option<&str>) -> Result<Vec<String>, ApiError> {
        let mut request = self.client.get(self.url("/neighborhoods"));
        if let Some(city) = city.map(str::trim).filter(|c| !c.is_empty()) {
            request = request.query(&[("city", city)]);
        }
        self.send_json(request).await
    }

    async fn geocode(&self, query: &str) -> Result<Vec<PlaceSuggestion>, ApiError> {
        let request = self.client.get(self.url("/geocode")).query(&[("q", query)]);
        self.send_json(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;
    use reqwest::StatusCode;

    fn client() -> ApiClient {
        ApiClient::new(&Config::default()).unwrap()
    }

    #[test]
    fn image_urls_point_at_uploads() {
        assert_eq!(
            client().image_url("abc_1.jpg"),
            "http://localhost:8001/uploads/abc_1.jpg"
        );
    }

    #[tokio::test]
    async fn authenticated_calls_fail_locally_without_token() {
        let session = Session::new(SessionStore::new("/nonexistent/immoco-session.json"));
        let api = client().with_session(&session);

        assert!(matches!(api.favorites().await, Err(ApiError::Unauthorized(_))));
        assert!(matches!(api.delete_listing("x").await, Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn status_mapping_reads_detail() {
        let err = ApiError::from_status(StatusCode::NOT_FOUND, r#"{"detail":"Listing not found"}"#);
        assert!(matches!(err, ApiError::NotFound(ref d) if d == "Listing not found"));

        let err = ApiError::from_status(StatusCode::UNPROCESSABLE_ENTITY, r#"{"detail":[{"loc":["query","price_min"]}]}"#);
        assert!(matches!(err, ApiError::Validation { .. }));

        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(matches!(err, ApiError::Status { ref body, .. } if body == "upstream down"));
    }
}
