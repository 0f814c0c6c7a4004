pub mod actions;
pub mod authoring;
pub mod coordinator;
pub mod types;
pub mod view;

pub use authoring::{DraftField, ListingDraft, MarkerPlacement, Submission};
pub use coordinator::{Coordinator, GeocodeTicket, SearchStatus, SearchTicket, TicketOutcome};
pub use types::{FilterField, FilterPredicate, RadiusFilter, ResultOrder, SearchQuery};
pub use view::{ActiveDialog, ListingCard, MapMarker, Notice, NoticeLevel, ViewState};
