//! Async flows that pair a coordinator transition with a backend call.
//!
//! Each flow awaits a single collaborator and then hands the outcome back to
//! the coordinator, so callers that need several requests in flight at once
//! should use the `begin_*`/`complete_*` pairs directly instead.

use tracing::info;

use crate::api::{ListingSearch, ListingStore, ReverseGeocoder};
use crate::error::ApiError;
use crate::models::{Comment, Coordinates, LikeStatus, ListingSummary};
use crate::search::authoring::Submission;
use crate::search::coordinator::{Coordinator, SearchTicket, TicketOutcome};
use crate::search::view::Notice;

impl Coordinator {
    /// Runs a search to completion.
    pub async fn search(&mut self, api: &dyn ListingSearch) -> TicketOutcome {
        let ticket = self.begin_search();
        self.run(ticket, api).await
    }

    async fn run(&mut self, ticket: SearchTicket, api: &dyn ListingSearch) -> TicketOutcome {
        let outcome = api.search(ticket.query()).await;
        self.complete_search(&ticket, outcome)
    }

    async fn refresh_after<T>(
        &mut self,
        outcome: &Result<T, ApiError>,
        done: &str,
        api: &dyn ListingSearch,
    ) {
        if let Some(ticket) = self.after_mutation(outcome, done) {
            self.run(ticket, api).await;
        }
    }

    /// Drops a pin and fills the draft's locality from the lookup.
    pub async fn place_marker(
        &mut self,
        at: Coordinates,
        geocoder: &dyn ReverseGeocoder,
    ) -> TicketOutcome {
        let ticket = self.on_map_marker_placed(at);
        let outcome = geocoder.reverse_geocode(ticket.at()).await;
        self.complete_geocode(&ticket, outcome)
    }

    pub async fn refresh_favorites(&mut self, store: &dyn ListingStore) {
        match store.favorites().await {
            Ok(listings) => self.apply_favorites(listings),
            Err(e) => self.push_notice(Notice::error(format!("Could not load favorites: {}", e))),
        }
    }

    pub async fn refresh_my_listings(&mut self, store: &dyn ListingStore) {
        match store.my_listings().await {
            Ok(listings) => self.apply_my_listings(listings),
            Err(e) => self.push_notice(Notice::error(format!("Could not load your listings: {}", e))),
        }
    }

    /// Sends the publish/edit form. On success the dialog closes and the
    /// search is refreshed; on failure the form stays open as typed.
    pub async fn submit_draft(
        &mut self,
        store: &dyn ListingStore,
        api: &dyn ListingSearch,
    ) -> Option<ListingSummary> {
        let submission = match self.submission() {
            Ok(submission) => submission,
            Err(e) => {
                self.push_notice(Notice::error(e.to_string()));
                return None;
            }
        };

        let (outcome, done) = match &submission {
            Submission::Create(listing) => (store.create_listing(listing).await, "Listing published"),
            Submission::Update { id, changes } => {
                (store.update_listing(id, changes).await, "Listing updated")
            }
        };
        if outcome.is_ok() {
            self.close_dialog();
        }
        self.refresh_after(&outcome, done, api).await;
        outcome.ok()
    }

    pub async fn delete_listing(
        &mut self,
        id: &str,
        store: &dyn ListingStore,
        api: &dyn ListingSearch,
    ) -> bool {
        let outcome = store.delete_listing(id).await;
        if outcome.is_ok() {
            self.forget_listing(id);
        }
        self.refresh_after(&outcome, "Listing deleted", api).await;
        outcome.is_ok()
    }

    pub async fn toggle_like(
        &mut self,
        id: &str,
        store: &dyn ListingStore,
        api: &dyn ListingSearch,
    ) -> Option<LikeStatus> {
        let outcome = store.toggle_like(id).await;
        let done = match &outcome {
            Ok(status) if status.liked => "Liked",
            _ => "Like removed",
        };
        self.refresh_after(&outcome, done, api).await;
        outcome.ok()
    }

    /// Adds or removes a favorite depending on its current state; returns
    /// whether the listing is a favorite afterwards.
    pub async fn toggle_favorite(
        &mut self,
        id: &str,
        store: &dyn ListingStore,
        api: &dyn ListingSearch,
    ) -> Option<bool> {
        let outcome = match store.is_favorite(id).await {
            Ok(true) => store.remove_favorite(id).await.map(|_| false),
            Ok(false) => store.add_favorite(id).await.map(|_| true),
            Err(e) => Err(e),
        };
        let done = match &outcome {
            Ok(true) => "Added to favorites",
            _ => "Removed from favorites",
        };
        self.refresh_after(&outcome, done, api).await;
        if outcome.is_ok() {
            self.refresh_favorites(store).await;
        }
        outcome.ok()
    }

    pub async fn post_comment(
        &mut self,
        listing_id: &str,
        text: &str,
        store: &dyn ListingStore,
        api: &dyn ListingSearch,
    ) -> Option<Comment> {
        let text = text.trim();
        if text.is_empty() {
            self.push_notice(Notice::error("Comment is empty"));
            return None;
        }
        let outcome = store.add_comment(listing_id, text).await;
        self.refresh_after(&outcome, "Comment posted", api).await;
        if let Ok(comment) = &outcome {
            info!("Comment {} posted on {}", comment.id, listing_id);
        }
        outcome.ok()
    }
}
