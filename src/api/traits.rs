use async_trait::async_trait;

use crate::api::upload::ImageUpload;
use crate::error::ApiError;
use crate::models::{
    AuthResponse, Comment, Coordinates, GeocodeResult, LikeStatus, ListingSummary, ListingUpdate,
    LoginRequest, NewListing, PlaceSuggestion, RegisterRequest, UploadedImages, UserProfile,
};
use crate::search::types::SearchQuery;

/// Listing search endpoint. Results come back in backend order and must be
/// kept that way.
#[async_trait]
pub trait ListingSearch: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<ListingSummary>, ApiError>;
}

/// Coordinates to locality lookup
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse_geocode(&self, at: Coordinates) -> Result<GeocodeResult, ApiError>;
}

/// Listing CRUD and the like/comment/favorite sub-resources
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn get_listing(&self, id: &str) -> Result<ListingSummary, ApiError>;
    async fn create_listing(&self, listing: &NewListing) -> Result<ListingSummary, ApiError>;
    async fn update_listing(
        &self,
        id: &str,
        changes: &ListingUpdate,
    ) -> Result<ListingSummary, ApiError>;
    async fn delete_listing(&self, id: &str) -> Result<(), ApiError>;

    async fn toggle_like(&self, id: &str) -> Result<LikeStatus, ApiError>;
    async fn is_liked(&self, id: &str) -> Result<bool, ApiError>;

    async fn comments(&self, listing_id: &str) -> Result<Vec<Comment>, ApiError>;
    async fn add_comment(&self, listing_id: &str, text: &str) -> Result<Comment, ApiError>;
    async fn delete_comment(&self, comment_id: &str) -> Result<(), ApiError>;

    async fn add_favorite(&self, id: &str) -> Result<(), ApiError>;
    async fn remove_favorite(&self, id: &str) -> Result<(), ApiError>;
    async fn is_favorite(&self, id: &str) -> Result<bool, ApiError>;
    async fn favorites(&self) -> Result<Vec<ListingSummary>, ApiError>;
    async fn my_listings(&self) -> Result<Vec<ListingSummary>, ApiError>;

    async fn upload_images(
        &self,
        listing_id: &str,
        files: Vec<ImageUpload>,
    ) -> Result<UploadedImages, ApiError>;
    async fn delete_image(&self, listing_id: &str, filename: &str) -> Result<(), ApiError>;
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError>;
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError>;
    async fn me(&self) -> Result<UserProfile, ApiError>;
}

/// Place names known to the backend, used to fill filter pickers
#[async_trait]
pub trait Gazetteer: Send + Sync {
    async fn cities(&self) -> Result<Vec<String>, ApiError>;
    async fn neighborhoods(&self, city: Option<&str>) -> Result<Vec<String>, ApiError>;
    async fn geocode(&self, query: &str) -> Result<Vec<PlaceSuggestion>, ApiError>;
}
