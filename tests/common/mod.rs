// Mock collaborators for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use immoco::api::{ImageUpload, ListingSearch, ListingStore, ReverseGeocoder};
use immoco::error::ApiError;
use immoco::models::{
    Comment, Coordinates, GeocodeResult, LikeStatus, ListingSummary, ListingType, ListingUpdate,
    NewListing, UploadedImages,
};
use immoco::search::SearchQuery;

pub fn listing(id: &str, city: &str, at: Option<(f64, f64)>) -> ListingSummary {
    ListingSummary {
        id: id.to_string(),
        title: format!("Maison {}", id),
        description: "Belle maison".to_string(),
        price: 75_000_000.0,
        currency: "XAF".to_string(),
        listing_type: ListingType::Sale,
        city: city.to_string(),
        neighborhood: None,
        address: None,
        surface: Some(120),
        rooms: Some(4),
        lat: at.map(|p| p.0),
        lon: at.map(|p| p.1),
        owner_id: "owner".to_string(),
        owner_name: "Owner".to_string(),
        created_at: Utc::now(),
        updated_at: None,
        likes_count: 0,
        comments_count: 0,
        images: vec![],
    }
}

/// Search mock: answers by city, optionally after a per-city delay, and
/// records every query it receives.
#[derive(Default)]
pub struct MockSearch {
    by_city: Mutex<HashMap<String, Vec<ListingSummary>>>,
    delays: Mutex<HashMap<String, Duration>>,
    fail: Mutex<bool>,
    calls: Arc<Mutex<Vec<Vec<(&'static str, String)>>>>,
}

impl MockSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_city(self, city: &str, listings: Vec<ListingSummary>) -> Self {
        self.by_city.lock().unwrap().insert(city.to_string(), listings);
        self
    }

    pub fn with_delay(self, city: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(city.to_string(), delay);
        self
    }

    pub fn failing(self) -> Self {
        *self.fail.lock().unwrap() = true;
        self
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub fn calls(&self) -> Vec<Vec<(&'static str, String)>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ListingSearch for MockSearch {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<ListingSummary>, ApiError> {
        self.calls.lock().unwrap().push(query.to_query_pairs());
        let city = query.filters.city.clone().unwrap_or_default();

        let delay = self.delays.lock().unwrap().get(&city).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if *self.fail.lock().unwrap() {
            return Err(ApiError::NotFound("search unavailable".to_string()));
        }
        Ok(self
            .by_city
            .lock()
            .unwrap()
            .get(&city)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ReverseGeocoder for MockSearch {
    async fn reverse_geocode(&self, _at: Coordinates) -> Result<GeocodeResult, ApiError> {
        if *self.fail.lock().unwrap() {
            return Err(ApiError::NotFound("geocoder down".to_string()));
        }
        Ok(GeocodeResult {
            city: Some("Libreville".to_string()),
            neighborhood: Some("Nombakélé".to_string()),
            address: Some("Boulevard Triomphal".to_string()),
        })
    }
}

/// Geocoder answering from a queue of scripted results
pub struct ScriptedGeocoder {
    answers: Mutex<VecDeque<Result<GeocodeResult, ApiError>>>,
    calls: Mutex<Vec<Coordinates>>,
}

impl ScriptedGeocoder {
    pub fn new(answers: Vec<Result<GeocodeResult, ApiError>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Coordinates> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReverseGeocoder for ScriptedGeocoder {
    async fn reverse_geocode(&self, at: Coordinates) -> Result<GeocodeResult, ApiError> {
        self.calls.lock().unwrap().push(at);
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(GeocodeResult::default()))
    }
}

/// In-memory listing store
#[derive(Default)]
pub struct MockStore {
    pub created: Mutex<Vec<NewListing>>,
    pub updated: Mutex<Vec<(String, ListingUpdate)>>,
    pub deleted: Mutex<Vec<String>>,
    pub favorites: Mutex<Vec<ListingSummary>>,
    pub reject_writes: Mutex<bool>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_writes(&self) -> Result<(), ApiError> {
        if *self.reject_writes.lock().unwrap() {
            return Err(ApiError::Unauthorized("Not authorized".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ListingStore for MockStore {
    async fn get_listing(&self, id: &str) -> Result<ListingSummary, ApiError> {
        Ok(listing(id, "Libreville", None))
    }

    async fn create_listing(&self, new: &NewListing) -> Result<ListingSummary, ApiError> {
        self.check_writes()?;
        self.created.lock().unwrap().push(new.clone());
        let mut created = listing("new-1", &new.city, new.lat.zip(new.lon));
        created.title = new.title.clone();
        created.price = new.price;
        Ok(created)
    }

    async fn update_listing(
        &self,
        id: &str,
        changes: &ListingUpdate,
    ) -> Result<ListingSummary, ApiError> {
        self.check_writes()?;
        self.updated
            .lock()
            .unwrap()
            .push((id.to_string(), changes.clone()));
        Ok(listing(id, "Libreville", None))
    }

    async fn delete_listing(&self, id: &str) -> Result<(), ApiError> {
        self.check_writes()?;
        self.deleted.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn toggle_like(&self, _id: &str) -> Result<LikeStatus, ApiError> {
        self.check_writes()?;
        Ok(LikeStatus {
            liked: true,
            likes_count: Some(1),
        })
    }

    async fn is_liked(&self, _id: &str) -> Result<bool, ApiError> {
        Ok(false)
    }

    async fn comments(&self, _listing_id: &str) -> Result<Vec<Comment>, ApiError> {
        Ok(Vec::new())
    }

    async fn add_comment(&self, listing_id: &str, text: &str) -> Result<Comment, ApiError> {
        self.check_writes()?;
        Ok(Comment {
            id: "c1".to_string(),
            listing_id: listing_id.to_string(),
            author_id: "me".to_string(),
            author_name: "Me".to_string(),
            text: text.to_string(),
            created_at: Utc::now(),
        })
    }

    async fn delete_comment(&self, _comment_id: &str) -> Result<(), ApiError> {
        self.check_writes()
    }

    async fn add_favorite(&self, id: &str) -> Result<(), ApiError> {
        self.check_writes()?;
        self.favorites
            .lock()
            .unwrap()
            .push(listing(id, "Libreville", None));
        Ok(())
    }

    async fn remove_favorite(&self, id: &str) -> Result<(), ApiError> {
        self.check_writes()?;
        self.favorites.lock().unwrap().retain(|l| l.id != id);
        Ok(())
    }

    async fn is_favorite(&self, id: &str) -> Result<bool, ApiError> {
        Ok(self.favorites.lock().unwrap().iter().any(|l| l.id == id))
    }

    async fn favorites(&self) -> Result<Vec<ListingSummary>, ApiError> {
        Ok(self.favorites.lock().unwrap().clone())
    }

    async fn my_listings(&self) -> Result<Vec<ListingSummary>, ApiError> {
        Ok(vec![listing("mine", "Franceville", Some((-1.63, 13.58)))])
    }

    async fn upload_images(
        &self,
        _listing_id: &str,
        files: Vec<ImageUpload>,
    ) -> Result<UploadedImages, ApiError> {
        Ok(UploadedImages {
            message: format!("{} files uploaded successfully", files.len()),
            images: files.into_iter().map(|f| f.file_name).collect(),
        })
    }

    async fn delete_image(&self, _listing_id: &str, _filename: &str) -> Result<(), ApiError> {
        self.check_writes()
    }
}
