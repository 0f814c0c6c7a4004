//! Listing publish/edit form state, including the map pin and the locality
//! fields a reverse-geocode lookup may fill in.

use serde::Serialize;

use crate::error::DraftError;
use crate::models::{Coordinates, GeocodeResult, ListingSummary, ListingType, ListingUpdate, NewListing};
use crate::search::types::normalize_number;

/// Pin dropped on the map while authoring
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarkerPlacement {
    pub coordinates: Coordinates,
}

/// Where the current value of a locality field came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum FieldOrigin {
    #[default]
    Unset,
    Suggested,
    Manual,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocalityField {
    value: Option<String>,
    origin: FieldOrigin,
}

impl LocalityField {
    fn seeded(value: Option<String>) -> Self {
        let value = value.filter(|v| !v.trim().is_empty());
        let origin = if value.is_some() {
            FieldOrigin::Suggested
        } else {
            FieldOrigin::Unset
        };
        Self { value, origin }
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn origin(&self) -> FieldOrigin {
        self.origin
    }

    fn edit(&mut self, raw: &str) {
        let raw = raw.trim();
        self.value = (!raw.is_empty()).then(|| raw.to_string());
        self.origin = FieldOrigin::Manual;
    }

    /// Manual values are never replaced by a lookup.
    fn suggest(&mut self, suggestion: Option<String>) -> bool {
        match suggestion {
            Some(v) if self.origin != FieldOrigin::Manual => {
                self.value = Some(v);
                self.origin = FieldOrigin::Suggested;
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftField {
    Title,
    Description,
    ListingType,
    Price,
    Surface,
    Rooms,
    City,
    Neighborhood,
    Address,
}

impl std::str::FromStr for DraftField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "title" => Ok(DraftField::Title),
            "description" => Ok(DraftField::Description),
            "type" | "listing_type" => Ok(DraftField::ListingType),
            "price" => Ok(DraftField::Price),
            "surface" => Ok(DraftField::Surface),
            "rooms" => Ok(DraftField::Rooms),
            "city" => Ok(DraftField::City),
            "neighborhood" => Ok(DraftField::Neighborhood),
            "address" => Ok(DraftField::Address),
            other => Err(format!("unknown listing field '{}'", other)),
        }
    }
}

/// The publish/edit form as typed so far
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListingDraft {
    editing: Option<String>,
    pub title: String,
    pub description: String,
    pub listing_type: Option<ListingType>,
    pub price: String,
    pub surface: String,
    pub rooms: String,
    pub city: LocalityField,
    pub neighborhood: LocalityField,
    pub address: LocalityField,
    pub coordinates: Option<Coordinates>,
}

/// A validated form, ready to send
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Create(NewListing),
    Update { id: String, changes: ListingUpdate },
}

impl ListingDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Form prefilled from an existing listing
    pub fn for_listing(listing: &ListingSummary) -> Self {
        Self {
            editing: Some(listing.id.clone()),
            title: listing.title.clone(),
            description: listing.description.clone(),
            listing_type: Some(listing.listing_type),
            price: listing.price.to_string(),
            surface: listing.surface.map(|s| s.to_string()).unwrap_or_default(),
            rooms: listing.rooms.map(|r| r.to_string()).unwrap_or_default(),
            city: LocalityField::seeded(Some(listing.city.clone())),
            neighborhood: LocalityField::seeded(listing.neighborhood.clone()),
            address: LocalityField::seeded(listing.address.clone()),
            coordinates: listing.coordinates(),
        }
    }

    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn edit(&mut self, field: DraftField, raw: &str) {
        match field {
            DraftField::Title => self.title = raw.trim().to_string(),
            DraftField::Description => self.description = raw.trim().to_string(),
            DraftField::ListingType => self.listing_type = raw.parse().ok(),
            DraftField::Price => self.price = raw.trim().to_string(),
            DraftField::Surface => self.surface = raw.trim().to_string(),
            DraftField::Rooms => self.rooms = raw.trim().to_string(),
            DraftField::City => self.city.edit(raw),
            DraftField::Neighborhood => self.neighborhood.edit(raw),
            DraftField::Address => self.address.edit(raw),
        }
    }

    /// Fills locality fields from a lookup; returns how many changed.
    pub fn apply_suggestion(&mut self, found: GeocodeResult) -> usize {
        let found = found.normalized();
        [
            self.city.suggest(found.city),
            self.neighborhood.suggest(found.neighborhood),
            self.address.suggest(found.address),
        ]
        .into_iter()
        .filter(|changed| *changed)
        .count()
    }

    pub fn submission(&self) -> Result<Submission, DraftError> {
        if self.title.is_empty() {
            return Err(DraftError::Missing("title"));
        }
        if self.description.is_empty() {
            return Err(DraftError::Missing("description"));
        }
        let listing_type = self.listing_type.ok_or(DraftError::Missing("listing type"))?;
        let price = parse_price(&self.price)?;
        let city = self
            .city
            .value()
            .map(str::to_string)
            .ok_or(DraftError::Missing("city"))?;
        let surface = parse_optional_count("surface", &self.surface)?;
        let rooms = parse_optional_count("rooms", &self.rooms)?;
        let neighborhood = self.neighborhood.value().map(str::to_string);
        let address = self.address.value().map(str::to_string);
        let lat = self.coordinates.map(|c| c.lat());
        let lon = self.coordinates.map(|c| c.lon());

        Ok(match &self.editing {
            None => Submission::Create(NewListing {
                title: self.title.clone(),
                description: self.description.clone(),
                listing_type,
                price,
                city,
                neighborhood,
                address,
                lat,
                lon,
                surface,
                rooms,
            }),
            Some(id) => Submission::Update {
                id: id.clone(),
                changes: ListingUpdate {
                    title: Some(self.title.clone()),
                    description: Some(self.description.clone()),
                    price: Some(price),
                    city: Some(city),
                    neighborhood,
                    address,
                    lat,
                    lon,
                    surface,
                    rooms,
                },
            },
        })
    }
}

fn parse_price(raw: &str) -> Result<f64, DraftError> {
    if raw.is_empty() {
        return Err(DraftError::Missing("price"));
    }
    let price: f64 = normalize_number(raw)
        .parse()
        .ok()
        .filter(|p: &f64| p.is_finite())
        .ok_or_else(|| DraftError::InvalidNumber {
            field: "price",
            value: raw.to_string(),
        })?;
    if price <= 0.0 {
        return Err(DraftError::NotPositive("price"));
    }
    Ok(price)
}

fn parse_optional_count(field: &'static str, raw: &str) -> Result<Option<u32>, DraftError> {
    if raw.is_empty() {
        return Ok(None);
    }
    let value: u32 = normalize_number(raw).parse().map_err(|_| DraftError::InvalidNumber {
        field,
        value: raw.to_string(),
    })?;
    if value == 0 {
        return Err(DraftError::NotPositive(field));
    }
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> ListingDraft {
        let mut draft = ListingDraft::new();
        draft.edit(DraftField::Title, "Studio meublé");
        draft.edit(DraftField::Description, "Proche du marché Mont-Bouët");
        draft.edit(DraftField::ListingType, "rent");
        draft.edit(DraftField::Price, "150 000");
        draft.edit(DraftField::City, "Libreville");
        draft
    }

    #[test]
    fn suggestion_fills_untouched_fields() {
        let mut draft = ListingDraft::new();
        let changed = draft.apply_suggestion(GeocodeResult {
            city: Some("Port-Gentil".into()),
            neighborhood: Some("Balise".into()),
            address: Some("".into()),
        });

        assert_eq!(changed, 2);
        assert_eq!(draft.city.value(), Some("Port-Gentil"));
        assert_eq!(draft.city.origin(), FieldOrigin::Suggested);
        assert_eq!(draft.address.value(), None);
    }

    #[test]
    fn manual_edit_survives_later_suggestion() {
        let mut draft = ListingDraft::new();
        draft.apply_suggestion(GeocodeResult {
            city: Some("Libreville".into()),
            neighborhood: Some("Glass".into()),
            address: None,
        });
        draft.edit(DraftField::Neighborhood, "Quartier Louis");

        draft.apply_suggestion(GeocodeResult {
            city: Some("Owendo".into()),
            neighborhood: Some("Alénakiri".into()),
            address: Some("Route nationale 1".into()),
        });

        assert_eq!(draft.city.value(), Some("Owendo"));
        assert_eq!(draft.neighborhood.value(), Some("Quartier Louis"));
        assert_eq!(draft.address.value(), Some("Route nationale 1"));
    }

    #[test]
    fn complete_form_becomes_create_payload() {
        let Submission::Create(listing) = filled().submission().unwrap() else {
            panic!("expected a create submission");
        };
        assert_eq!(listing.price, 150_000.0);
        assert_eq!(listing.listing_type, ListingType::Rent);
        assert_eq!(listing.surface, None);
    }

    #[test]
    fn grouped_digits_are_accepted_in_every_number_field() {
        let mut draft = filled();
        draft.edit(DraftField::Surface, "1 200");
        draft.edit(DraftField::Rooms, "1_2");
        draft.edit(DraftField::Price, "1 500_000");

        let Ok(Submission::Create(listing)) = draft.submission() else {
            panic!("expected a create submission");
        };
        assert_eq!(listing.surface, Some(1200));
        assert_eq!(listing.rooms, Some(12));
        assert_eq!(listing.price, 1_500_000.0);
    }

    #[test]
    fn missing_or_bad_fields_block_submission() {
        let mut draft = filled();
        draft.edit(DraftField::City, "");
        assert_eq!(draft.submission(), Err(DraftError::Missing("city")));

        let mut draft = filled();
        draft.edit(DraftField::Price, "0");
        assert_eq!(draft.submission(), Err(DraftError::NotPositive("price")));

        let mut draft = filled();
        draft.edit(DraftField::Rooms, "trois");
        assert!(matches!(
            draft.submission(),
            Err(DraftError::InvalidNumber { field: "rooms", .. })
        ));
    }
}
