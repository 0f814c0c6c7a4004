use tracing::{debug, info, warn};

use crate::error::{ApiError, DraftError, FilterError};
use crate::models::{Coordinates, GeocodeResult, ListingSummary};
use crate::search::authoring::{DraftField, ListingDraft, MarkerPlacement, Submission};
use crate::search::types::{FilterField, FilterPredicate, RadiusFilter, ResultOrder, SearchQuery};
use crate::search::view::{
    ActiveDialog, ListingCard, MapMarker, Notice, ViewState, DEFAULT_MAP_CENTER,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchStatus {
    #[default]
    Idle,
    Loading,
}

/// An issued search request. Only the most recently issued ticket may
/// replace the result set.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchTicket {
    seq: u64,
    query: SearchQuery,
}

impl SearchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }
}

/// An issued reverse-geocode lookup for a placed pin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeocodeTicket {
    seq: u64,
    at: Coordinates,
}

impl GeocodeTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn at(&self) -> Coordinates {
        self.at
    }
}

/// What became of a completed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketOutcome {
    Applied,
    Failed,
    /// Superseded by a later request; the response was dropped.
    Stale,
}

/// Owns the search inputs, the result sets and everything the list and map
/// perspectives render from them.
#[derive(Debug)]
pub struct Coordinator {
    query_text: String,
    filters: FilterPredicate,
    order: ResultOrder,
    limit: u32,
    skip: u32,

    results: Vec<ListingSummary>,
    favorites: Vec<ListingSummary>,
    my_listings: Vec<ListingSummary>,

    view: ViewState,
    selected: Option<String>,
    dialog: ActiveDialog,
    draft: Option<ListingDraft>,
    marker: Option<MarkerPlacement>,

    status: SearchStatus,
    search_seq: u64,
    geocode_seq: u64,
    notices: Vec<Notice>,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(crate::search::types::DEFAULT_LIMIT)
    }
}

impl Coordinator {
    pub fn new(limit: u32) -> Self {
        Self {
            query_text: String::new(),
            filters: FilterPredicate::default(),
            order: ResultOrder::Discovery,
            limit: limit.max(1),
            skip: 0,
            results: Vec::new(),
            favorites: Vec::new(),
            my_listings: Vec::new(),
            view: ViewState::Browse,
            selected: None,
            dialog: ActiveDialog::None,
            draft: None,
            marker: None,
            status: SearchStatus::Idle,
            search_seq: 0,
            geocode_seq: 0,
            notices: Vec::new(),
        }
    }

    // ---- search inputs -------------------------------------------------

    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    pub fn set_query_text(&mut self, text: impl Into<String>) {
        self.query_text = text.into();
    }

    pub fn filters(&self) -> &FilterPredicate {
        &self.filters
    }

    /// Edits one filter field from raw input; the old value stays on error.
    pub fn set_filter_field(&mut self, field: FilterField, raw: &str) -> Result<(), FilterError> {
        self.filters.set(field, raw).map_err(|e| {
            debug!("Rejected {} = {:?}: {}", field.key(), raw, e);
            e
        })
    }

    pub fn set_near(&mut self, near: Option<RadiusFilter>) {
        self.filters.near = near;
    }

    pub fn reset_filters(&mut self) {
        self.filters = FilterPredicate::default();
    }

    pub fn order(&self) -> ResultOrder {
        self.order
    }

    pub fn set_order(&mut self, order: ResultOrder) {
        self.order = order;
        self.skip = 0;
    }

    /// Changes the page size and goes back to the first page.
    pub fn set_limit(&mut self, limit: u32) {
        self.limit = limit.max(1);
        self.skip = 0;
    }

    /// Moves to the next page of the newest-first feed. The discovery feed
    /// is shuffled server-side and has no pages.
    pub fn next_page(&mut self) -> bool {
        if self.order != ResultOrder::Newest {
            return false;
        }
        match self.skip.checked_add(self.limit) {
            Some(skip) => {
                self.skip = skip;
                true
            }
            None => false,
        }
    }

    /// Jumps to a 1-based page of the newest-first feed.
    pub fn set_page(&mut self, page: u32) -> bool {
        if self.order != ResultOrder::Newest {
            return false;
        }
        match page.saturating_sub(1).checked_mul(self.limit) {
            Some(skip) => {
                self.skip = skip;
                true
            }
            None => false,
        }
    }

    pub fn current_query(&self) -> SearchQuery {
        let text = self.query_text.trim();
        SearchQuery {
            text: (!text.is_empty()).then(|| text.to_string()),
            filters: self.filters.clone(),
            limit: self.limit,
            order: self.order,
            skip: self.skip,
        }
    }

    // ---- search lifecycle ----------------------------------------------

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == SearchStatus::Loading
    }

    /// Issues a search. The current results stay visible until the ticket
    /// completes.
    pub fn begin_search(&mut self) -> SearchTicket {
        self.search_seq += 1;
        self.status = SearchStatus::Loading;
        let ticket = SearchTicket {
            seq: self.search_seq,
            query: self.current_query(),
        };
        info!("Search #{}: {}", ticket.seq, ticket.query);
        ticket
    }

    pub fn complete_search(
        &mut self,
        ticket: &SearchTicket,
        outcome: Result<Vec<ListingSummary>, ApiError>,
    ) -> TicketOutcome {
        if ticket.seq != self.search_seq {
            debug!(
                "Discarding search #{} (latest is #{})",
                ticket.seq, self.search_seq
            );
            return TicketOutcome::Stale;
        }

        self.status = SearchStatus::Idle;
        match outcome {
            Ok(listings) => {
                info!("Search #{} returned {} listings", ticket.seq, listings.len());
                let previous = std::mem::replace(&mut self.results, listings);
                self.drop_departed_selection(&previous);
                TicketOutcome::Applied
            }
            Err(e) => {
                warn!("Search #{} failed: {}", ticket.seq, e);
                self.notices.push(Notice::error(format!("Search failed: {}", e)));
                TicketOutcome::Failed
            }
        }
    }

    pub fn results(&self) -> &[ListingSummary] {
        &self.results
    }

    /// Records the outcome of a create/update/delete/like/comment/favorite
    /// call. Success refreshes the search.
    pub fn after_mutation<T>(
        &mut self,
        outcome: &Result<T, ApiError>,
        done: &str,
    ) -> Option<SearchTicket> {
        match outcome {
            Ok(_) => {
                self.notices.push(Notice::info(done));
                Some(self.begin_search())
            }
            Err(e) => {
                warn!("Action failed: {}", e);
                self.notices.push(Notice::error(e.to_string()));
                None
            }
        }
    }

    // ---- views -----------------------------------------------------------

    pub fn view(&self) -> ViewState {
        self.view
    }

    /// Never fetches: browse and map render the same result set.
    pub fn set_view(&mut self, view: ViewState) {
        if self.view != view {
            debug!("View {} -> {}", self.view, view);
            self.view = view;
        }
    }

    pub fn apply_favorites(&mut self, listings: Vec<ListingSummary>) {
        self.favorites = listings;
    }

    pub fn apply_my_listings(&mut self, listings: Vec<ListingSummary>) {
        self.my_listings = listings;
    }

    pub fn visible_listings(&self) -> &[ListingSummary] {
        match self.view {
            ViewState::Browse | ViewState::Map => &self.results,
            ViewState::Favorites => &self.favorites,
            ViewState::Profile => &self.my_listings,
        }
    }

    pub fn select_listing(&mut self, id: Option<&str>) {
        self.selected = id.map(str::to_string);
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected(&self) -> Option<&ListingSummary> {
        let id = self.selected.as_deref()?;
        self.visible_listings().iter().find(|l| l.id == id)
    }

    pub fn find_listing(&self, id: &str) -> Option<&ListingSummary> {
        self.results
            .iter()
            .chain(self.my_listings.iter())
            .chain(self.favorites.iter())
            .find(|l| l.id == id)
    }

    /// Removes a deleted listing from the favorites and profile sets.
    pub(crate) fn forget_listing(&mut self, id: &str) {
        self.my_listings.retain(|l| l.id != id);
        self.favorites.retain(|l| l.id != id);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
    }

    // Clears a selection that was in the previous result set but not in
    // the new one. Selections made in the favorites or profile views stay.
    fn drop_departed_selection(&mut self, previous: &[ListingSummary]) {
        let Some(id) = self.selected.as_deref() else {
            return;
        };
        let was_shown = previous.iter().any(|l| l.id == id);
        let still_shown = self.results.iter().any(|l| l.id == id);
        if was_shown && !still_shown {
            debug!("Selected listing {} left the result set", id);
            self.selected = None;
        }
    }

    pub fn cards(&self) -> Vec<ListingCard> {
        let selected = self.selected.as_deref();
        self.visible_listings()
            .iter()
            .map(|l| ListingCard::from_listing(l, Some(l.id.as_str()) == selected))
            .collect()
    }

    /// Pins for the visible listings, in list order; listings without a
    /// position get no pin.
    pub fn markers(&self) -> Vec<MapMarker> {
        let selected = self.selected.as_deref();
        self.visible_listings()
            .iter()
            .filter_map(|l| {
                Some(MapMarker {
                    listing_id: l.id.clone(),
                    position: l.coordinates()?,
                    title: l.title.clone(),
                    price: l.price_label(),
                    selected: Some(l.id.as_str()) == selected,
                })
            })
            .collect()
    }

    pub fn map_center(&self) -> Coordinates {
        if let Some(marker) = &self.marker {
            return marker.coordinates;
        }
        self.selected()
            .and_then(ListingSummary::coordinates)
            .or_else(|| self.visible_listings().iter().find_map(ListingSummary::coordinates))
            .unwrap_or(DEFAULT_MAP_CENTER)
    }

    // ---- dialogs and authoring -------------------------------------------

    pub fn dialog(&self) -> &ActiveDialog {
        &self.dialog
    }

    /// Opens a dialog, replacing whichever one was open. Publish starts an
    /// empty draft; edit seeds it from a known listing.
    pub fn open_dialog(&mut self, dialog: ActiveDialog) -> bool {
        let draft = match &dialog {
            ActiveDialog::Publish => Some(ListingDraft::new()),
            ActiveDialog::Edit(id) => match self.find_listing(id) {
                Some(listing) => Some(ListingDraft::for_listing(listing)),
                None => {
                    self.notices.push(Notice::error(format!("Listing {} is not loaded", id)));
                    return false;
                }
            },
            _ => None,
        };
        self.marker = draft
            .as_ref()
            .and_then(|d| d.coordinates)
            .map(|coordinates| MarkerPlacement { coordinates });
        self.draft = draft;
        self.dialog = dialog;
        true
    }

    /// Closes the dialog; any authoring draft and pin go with it.
    pub fn close_dialog(&mut self) {
        self.dialog = ActiveDialog::None;
        self.draft = None;
        self.marker = None;
    }

    pub fn draft(&self) -> Option<&ListingDraft> {
        self.draft.as_ref()
    }

    pub fn edit_draft_field(&mut self, field: DraftField, raw: &str) -> bool {
        match self.draft.as_mut() {
            Some(draft) => {
                draft.edit(field, raw);
                true
            }
            None => false,
        }
    }

    pub fn submission(&self) -> Result<Submission, DraftError> {
        self.draft.as_ref().ok_or(DraftError::NoDraft)?.submission()
    }

    pub fn marker(&self) -> Option<&MarkerPlacement> {
        self.marker.as_ref()
    }

    /// Drops a pin and issues one reverse-geocode lookup for it.
    pub fn on_map_marker_placed(&mut self, at: Coordinates) -> GeocodeTicket {
        self.geocode_seq += 1;
        self.marker = Some(MarkerPlacement { coordinates: at });
        if let Some(draft) = self.draft.as_mut() {
            draft.coordinates = Some(at);
        }
        debug!("Marker #{} placed at {}", self.geocode_seq, at);
        GeocodeTicket {
            seq: self.geocode_seq,
            at,
        }
    }

    pub fn complete_geocode(
        &mut self,
        ticket: &GeocodeTicket,
        outcome: Result<GeocodeResult, ApiError>,
    ) -> TicketOutcome {
        let current = self.marker.map(|m| m.coordinates);
        if ticket.seq != self.geocode_seq || current != Some(ticket.at) {
            debug!("Discarding reverse geocode #{}", ticket.seq);
            return TicketOutcome::Stale;
        }

        match outcome {
            Ok(found) => {
                if let Some(draft) = self.draft.as_mut() {
                    let filled = draft.apply_suggestion(found);
                    debug!("Reverse geocode #{} filled {} fields", ticket.seq, filled);
                }
                TicketOutcome::Applied
            }
            Err(e) => {
                warn!("Reverse geocoding failed: {}", e);
                self.notices.push(Notice::error(
                    "Could not look up this address; fill in the location by hand",
                ));
                TicketOutcome::Failed
            }
        }
    }

    // ---- notices -----------------------------------------------------------

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn dismiss_notice(&mut self, index: usize) -> Option<Notice> {
        (index < self.notices.len()).then(|| self.notices.remove(index))
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
