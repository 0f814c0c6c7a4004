use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::models::{Coordinates, ListingSummary, ListingType};

/// Libreville, where the map opens when nothing is selected or placed
pub const DEFAULT_MAP_CENTER: Coordinates = Coordinates::LIBREVILLE;

/// Which perspective of the listings is on screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewState {
    #[default]
    Browse,
    Map,
    Favorites,
    Profile,
}

impl FromStr for ViewState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "browse" | "list" => Ok(ViewState::Browse),
            "map" => Ok(ViewState::Map),
            "favorites" | "favourites" => Ok(ViewState::Favorites),
            "profile" => Ok(ViewState::Profile),
            other => Err(format!("unknown view '{}'", other)),
        }
    }
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewState::Browse => "browse",
            ViewState::Map => "map",
            ViewState::Favorites => "favorites",
            ViewState::Profile => "profile",
        };
        f.write_str(name)
    }
}

/// The one modal that may be open
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ActiveDialog {
    #[default]
    None,
    Login,
    Register,
    Publish,
    Edit(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient message for the user, dismissed explicitly
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// What a list card shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingCard {
    pub id: String,
    pub title: String,
    pub price: String,
    pub listing_type: ListingType,
    pub locality: String,
    pub surface: Option<u32>,
    pub rooms: Option<u32>,
    pub likes: u32,
    pub comments: u32,
    pub cover_image: Option<String>,
    pub selected: bool,
}

impl ListingCard {
    pub fn from_listing(listing: &ListingSummary, selected: bool) -> Self {
        Self {
            id: listing.id.clone(),
            title: listing.title.clone(),
            price: listing.price_label(),
            listing_type: listing.listing_type,
            locality: listing.locality(),
            surface: listing.surface,
            rooms: listing.rooms,
            likes: listing.likes_count,
            comments: listing.comments_count,
            cover_image: listing.images.first().cloned(),
            selected,
        }
    }
}

/// What a map pin shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub listing_id: String,
    pub position: Coordinates,
    pub title: String,
    pub price: String,
    pub selected: bool,
}
