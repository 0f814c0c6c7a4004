pub mod client;
pub mod traits;
pub mod upload;

pub use client::ApiClient;
pub use traits::{AuthApi, Gazetteer, ListingSearch, ListingStore, ReverseGeocoder};
pub use upload::ImageUpload;
