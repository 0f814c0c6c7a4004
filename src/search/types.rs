use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FilterError;
use crate::models::{Coordinates, ListingType};

/// Page size used by the listing feed
pub const DEFAULT_LIMIT: u32 = 20;

/// One editable field of the filter panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    City,
    Neighborhood,
    ListingType,
    PriceMin,
    PriceMax,
    SurfaceMin,
    SurfaceMax,
    RoomsMin,
    RoomsMax,
}

impl FilterField {
    pub const ALL: [FilterField; 9] = [
        FilterField::City,
        FilterField::Neighborhood,
        FilterField::ListingType,
        FilterField::PriceMin,
        FilterField::PriceMax,
        FilterField::SurfaceMin,
        FilterField::SurfaceMax,
        FilterField::RoomsMin,
        FilterField::RoomsMax,
    ];

    /// Query parameter name understood by the backend
    pub fn key(&self) -> &'static str {
        match self {
            FilterField::City => "city",
            FilterField::Neighborhood => "neighborhood",
            FilterField::ListingType => "listing_type",
            FilterField::PriceMin => "price_min",
            FilterField::PriceMax => "price_max",
            FilterField::SurfaceMin => "surface_min",
            FilterField::SurfaceMax => "surface_max",
            FilterField::RoomsMin => "rooms_min",
            FilterField::RoomsMax => "rooms_max",
        }
    }
}

impl FromStr for FilterField {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_lowercase();
        FilterField::ALL
            .into_iter()
            .find(|f| f.key() == wanted || (wanted == "type" && *f == FilterField::ListingType))
            .ok_or_else(|| FilterError::UnknownField(s.to_string()))
    }
}

/// Geographic radius constraint around a point
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RadiusFilter {
    pub center: Coordinates,
    pub radius_km: f64,
}

impl RadiusFilter {
    pub fn new(center: Coordinates, radius_km: f64) -> Result<Self, FilterError> {
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(FilterError::InvalidRadius);
        }
        Ok(Self { center, radius_km })
    }
}

/// Structured search constraints. `None` means "no constraint", so the
/// default value matches every listing.
///
/// Bounds are stored exactly as entered: a minimum above its maximum is kept
/// and left for the backend to judge.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FilterPredicate {
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    pub listing_type: Option<ListingType>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub surface_min: Option<u32>,
    pub surface_max: Option<u32>,
    pub rooms_min: Option<u32>,
    pub rooms_max: Option<u32>,
    pub near: Option<RadiusFilter>,
}

impl FilterPredicate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies raw user input to one field. Blank input clears the field; on
    /// error the previous value is kept.
    pub fn set(&mut self, field: FilterField, raw: &str) -> Result<(), FilterError> {
        let raw = raw.trim();
        if raw.is_empty() {
            self.clear(field);
            return Ok(());
        }

        match field {
            FilterField::City => self.city = Some(raw.to_string()),
            FilterField::Neighborhood => self.neighborhood = Some(raw.to_string()),
            FilterField::ListingType => self.listing_type = Some(raw.parse()?),
            FilterField::PriceMin => self.price_min = Some(parse_amount(field, raw)?),
            FilterField::PriceMax => self.price_max = Some(parse_amount(field, raw)?),
            FilterField::SurfaceMin => self.surface_min = Some(parse_count(field, raw)?),
            FilterField::SurfaceMax => self.surface_max = Some(parse_count(field, raw)?),
            FilterField::RoomsMin => self.rooms_min = Some(parse_count(field, raw)?),
            FilterField::RoomsMax => self.rooms_max = Some(parse_count(field, raw)?),
        }
        Ok(())
    }

    pub fn clear(&mut self, field: FilterField) {
        match field {
            FilterField::City => self.city = None,
            FilterField::Neighborhood => self.neighborhood = None,
            FilterField::ListingType => self.listing_type = None,
            FilterField::PriceMin => self.price_min = None,
            FilterField::PriceMax => self.price_max = None,
            FilterField::SurfaceMin => self.surface_min = None,
            FilterField::SurfaceMax => self.surface_max = None,
            FilterField::RoomsMin => self.rooms_min = None,
            FilterField::RoomsMax => self.rooms_max = None,
        }
    }

    /// Current value of a field rendered as query text
    pub fn value(&self, field: FilterField) -> Option<String> {
        match field {
            FilterField::City => self.city.clone(),
            FilterField::Neighborhood => self.neighborhood.clone(),
            FilterField::ListingType => self.listing_type.map(|t| t.to_string()),
            FilterField::PriceMin => self.price_min.map(|v| v.to_string()),
            FilterField::PriceMax => self.price_max.map(|v| v.to_string()),
            FilterField::SurfaceMin => self.surface_min.map(|v| v.to_string()),
            FilterField::SurfaceMax => self.surface_max.map(|v| v.to_string()),
            FilterField::RoomsMin => self.rooms_min.map(|v| v.to_string()),
            FilterField::RoomsMax => self.rooms_max.map(|v| v.to_string()),
        }
    }
}

// Accepts "1 500 000" and "1_500_000" as typed in the price inputs.
pub(crate) fn normalize_number(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace() && *c != '_').collect()
}

fn parse_amount(field: FilterField, raw: &str) -> Result<f64, FilterError> {
    let value: f64 = normalize_number(raw)
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| FilterError::InvalidNumber {
            field: field.key(),
            value: raw.to_string(),
        })?;
    if value < 0.0 {
        return Err(FilterError::Negative { field: field.key() });
    }
    Ok(value)
}

fn parse_count(field: FilterField, raw: &str) -> Result<u32, FilterError> {
    let invalid = || FilterError::InvalidNumber {
        field: field.key(),
        value: raw.to_string(),
    };
    let value: i64 = normalize_number(raw).parse().map_err(|_| invalid())?;
    if value < 0 {
        return Err(FilterError::Negative { field: field.key() });
    }
    u32::try_from(value).map_err(|_| invalid())
}

/// How the backend should order the result set
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResultOrder {
    /// Backend-side shuffle for the discovery feed
    #[default]
    Discovery,
    /// Newest first, pageable with `skip`
    Newest,
}

/// Everything sent to the listing search endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub text: Option<String>,
    pub filters: FilterPredicate,
    pub limit: u32,
    pub order: ResultOrder,
    pub skip: u32,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            text: None,
            filters: FilterPredicate::default(),
            limit: DEFAULT_LIMIT,
            order: ResultOrder::Discovery,
            skip: 0,
        }
    }
}

impl SearchQuery {
    /// Query parameters in a fixed order, with every unset field left out.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(text) = self.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            pairs.push(("search", text.to_string()));
        }

        for field in FilterField::ALL {
            if let Some(value) = self.filters.value(field).filter(|v| !v.trim().is_empty()) {
                pairs.push((field.key(), value));
            }
        }

        if let Some(near) = &self.filters.near {
            pairs.push(("lat", near.center.lat().to_string()));
            pairs.push(("lon", near.center.lon().to_string()));
            pairs.push(("radius", near.radius_km.to_string()));
        }

        pairs.push(("limit", self.limit.to_string()));
        if self.order == ResultOrder::Newest && self.skip > 0 {
            pairs.push(("skip", self.skip.to_string()));
        }
        pairs.push((
            "random_order",
            (self.order == ResultOrder::Discovery).to_string(),
        ));

        pairs
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .to_query_pairs()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        f.write_str(&rendered.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(query: &SearchQuery) -> Vec<&'static str> {
        query.to_query_pairs().into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn empty_query_only_sends_paging() {
        let query = SearchQuery::default();
        assert_eq!(
            query.to_query_pairs(),
            vec![("limit", "20".to_string()), ("random_order", "true".to_string())]
        );
    }

    #[test]
    fn blank_input_clears_instead_of_sending_empty_string() {
        let mut filters = FilterPredicate::default();
        filters.set(FilterField::City, "Libreville").unwrap();
        filters.set(FilterField::City, "   ").unwrap();
        assert!(filters.is_empty());

        let query = SearchQuery {
            text: Some("  ".into()),
            filters,
            ..Default::default()
        };
        assert_eq!(keys(&query), vec!["limit", "random_order"]);
    }

    #[test]
    fn pairs_follow_a_stable_order() {
        let mut filters = FilterPredicate::default();
        filters.set(FilterField::RoomsMax, "4").unwrap();
        filters.set(FilterField::City, "Libreville").unwrap();
        filters.set(FilterField::PriceMin, "1 000 000").unwrap();
        filters.set(FilterField::ListingType, "rent").unwrap();
        let query = SearchQuery {
            text: Some("villa".into()),
            filters,
            ..Default::default()
        };

        assert_eq!(
            query.to_string(),
            "search=villa&city=Libreville&listing_type=rent&price_min=1000000&rooms_max=4&limit=20&random_order=true"
        );
    }

    #[test]
    fn negative_numbers_are_rejected_and_keep_previous_value() {
        let mut filters = FilterPredicate::default();
        filters.set(FilterField::PriceMax, "500000").unwrap();

        assert_eq!(
            filters.set(FilterField::PriceMax, "-1"),
            Err(FilterError::Negative { field: "price_max" })
        );
        assert_eq!(
            filters.set(FilterField::RoomsMin, "-2"),
            Err(FilterError::Negative { field: "rooms_min" })
        );
        assert!(matches!(
            filters.set(FilterField::SurfaceMin, "big"),
            Err(FilterError::InvalidNumber { .. })
        ));
        assert_eq!(filters.price_max, Some(500_000.0));
        assert_eq!(filters.rooms_min, None);
    }

    #[test]
    fn inverted_bounds_pass_through_unchanged() {
        let mut filters = FilterPredicate::default();
        filters.set(FilterField::PriceMin, "900").unwrap();
        filters.set(FilterField::PriceMax, "100").unwrap();
        let pairs = SearchQuery {
            filters,
            ..Default::default()
        }
        .to_query_pairs();

        assert!(pairs.contains(&("price_min", "900".to_string())));
        assert!(pairs.contains(&("price_max", "100".to_string())));
    }

    #[test]
    fn newest_order_pages_with_skip() {
        let query = SearchQuery {
            order: ResultOrder::Newest,
            skip: 40,
            ..Default::default()
        };
        assert_eq!(query.to_string(), "limit=20&skip=40&random_order=false");
    }

    #[test]
    fn radius_adds_center_and_distance() {
        let center = Coordinates::new(0.39, 9.45).unwrap();
        let filters = FilterPredicate {
            near: Some(RadiusFilter::new(center, 5.0).unwrap()),
            ..Default::default()
        };
        let query = SearchQuery {
            filters,
            ..Default::default()
        };
        assert_eq!(
            keys(&query),
            vec!["lat", "lon", "radius", "limit", "random_order"]
        );
        assert_eq!(RadiusFilter::new(center, 0.0), Err(FilterError::InvalidRadius));
    }

    #[test]
    fn field_names_parse_from_cli_spelling() {
        assert_eq!("price-min".parse::<FilterField>(), Ok(FilterField::PriceMin));
        assert_eq!("type".parse::<FilterField>(), Ok(FilterField::ListingType));
        assert!("colour".parse::<FilterField>().is_err());
    }
}
