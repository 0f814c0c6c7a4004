//! Line-driven event loop over a [`Coordinator`].
//!
//! User commands are applied synchronously; searches and reverse-geocode
//! lookups run as spawned tasks whose completions come back over a channel,
//! so a new search can be issued while an older one is still in flight.

use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::debug;

use crate::api::{ListingSearch, ReverseGeocoder};
use crate::error::ApiError;
use crate::models::{Coordinates, GeocodeResult, ListingSummary};
use crate::search::{
    ActiveDialog, Coordinator, DraftField, FilterField, GeocodeTicket, NoticeLevel, ResultOrder,
    SearchTicket, TicketOutcome, ViewState,
};

const HELP: &str = "\
commands:
  text <words>            set the free-text search
  filter <field> <value>  set a filter (empty value clears it)
  reset                   clear all filters
  order discovery|newest  result ordering
  next                    next page (newest order)
  search                  run the search
  view browse|map|favorites|profile
  select <id>|none        highlight a listing
  new                     start a new listing
  set <field> <value>     edit the listing being written
  pin <lat> <lon>         place the listing on the map
  cancel                  close the open form
  show                    print the current view
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Text(String),
    Filter(FilterField, String),
    Reset,
    Order(ResultOrder),
    Next,
    Search,
    View(ViewState),
    Select(Option<String>),
    New,
    Set(DraftField, String),
    Pin(Coordinates),
    Cancel,
    Show,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match word {
            "text" => Ok(Command::Text(rest.to_string())),
            "filter" => {
                let (field, value) = rest.split_once(' ').unwrap_or((rest, ""));
                let field = field.parse().map_err(|e: crate::error::FilterError| e.to_string())?;
                Ok(Command::Filter(field, value.trim().to_string()))
            }
            "reset" => Ok(Command::Reset),
            "order" => match rest {
                "discovery" | "random" => Ok(Command::Order(ResultOrder::Discovery)),
                "newest" => Ok(Command::Order(ResultOrder::Newest)),
                other => Err(format!("unknown order '{}'", other)),
            },
            "next" => Ok(Command::Next),
            "search" => Ok(Command::Search),
            "view" => rest.parse().map(Command::View),
            "select" => match rest {
                "" | "none" => Ok(Command::Select(None)),
                id => Ok(Command::Select(Some(id.to_string()))),
            },
            "new" => Ok(Command::New),
            "set" => {
                let (field, value) = rest.split_once(' ').unwrap_or((rest, ""));
                Ok(Command::Set(field.parse()?, value.trim().to_string()))
            }
            "pin" => {
                let mut parts = rest.split_whitespace().map(str::parse::<f64>);
                match (parts.next(), parts.next()) {
                    (Some(Ok(lat)), Some(Ok(lon))) => Coordinates::new(lat, lon)
                        .map(Command::Pin)
                        .map_err(|e| e.to_string()),
                    _ => Err("usage: pin <lat> <lon>".to_string()),
                }
            }
            "cancel" => Ok(Command::Cancel),
            "show" => Ok(Command::Show),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!("unknown command '{}' (try help)", other)),
        }
    }
}

enum Completion {
    Search(SearchTicket, Result<Vec<ListingSummary>, ApiError>),
    Geocode(GeocodeTicket, Result<GeocodeResult, ApiError>),
}

/// Reads commands until `quit`, or until the input ends and every issued
/// request has completed.
pub async fn run<A, R, W>(
    coordinator: &mut Coordinator,
    api: Arc<A>,
    input: R,
    out: &mut W,
) -> Result<()>
where
    A: ListingSearch + ReverseGeocoder + 'static,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();
    let mut lines = input.lines();
    let mut input_open = true;
    let mut in_flight = 0usize;

    loop {
        if !input_open && in_flight == 0 {
            break;
        }

        tokio::select! {
            line = lines.next_line(), if input_open => {
                let Some(line) = line? else {
                    input_open = false;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let command = match line.parse::<Command>() {
                    Ok(command) => command,
                    Err(e) => {
                        writeln!(out, "error: {}", e)?;
                        continue;
                    }
                };
                if command == Command::Quit {
                    break;
                }
                in_flight += dispatch(coordinator, &api, &tx, command, out)?;
            }
            Some(done) = rx.recv() => {
                in_flight -= 1;
                match done {
                    Completion::Search(ticket, outcome) => {
                        match coordinator.complete_search(&ticket, outcome) {
                            TicketOutcome::Applied => {
                                writeln!(out, "search #{}: {} listings", ticket.seq(), coordinator.results().len())?;
                                render(coordinator, out)?;
                            }
                            TicketOutcome::Failed => writeln!(out, "search #{}: failed", ticket.seq())?,
                            TicketOutcome::Stale => writeln!(out, "search #{}: superseded", ticket.seq())?,
                        }
                    }
                    Completion::Geocode(ticket, outcome) => {
                        if coordinator.complete_geocode(&ticket, outcome) == TicketOutcome::Applied {
                            render_draft(coordinator, out)?;
                        }
                    }
                }
            }
        }

        flush_notices(coordinator, out)?;
    }

    Ok(())
}

/// Applies one command; returns how many requests it issued.
fn dispatch<A, W>(
    coordinator: &mut Coordinator,
    api: &Arc<A>,
    tx: &mpsc::UnboundedSender<Completion>,
    command: Command,
    out: &mut W,
) -> Result<usize>
where
    A: ListingSearch + ReverseGeocoder + 'static,
    W: Write,
{
    match command {
        Command::Text(text) => coordinator.set_query_text(text),
        Command::Filter(field, value) => {
            if let Err(e) = coordinator.set_filter_field(field, &value) {
                writeln!(out, "error: {}", e)?;
            }
        }
        Command::Reset => coordinator.reset_filters(),
        Command::Order(order) => coordinator.set_order(order),
        Command::Next => {
            if !coordinator.next_page() {
                writeln!(out, "paging needs 'order newest'")?;
            }
        }
        Command::Search => {
            let ticket = coordinator.begin_search();
            writeln!(out, "search #{}: {}", ticket.seq(), ticket.query())?;
            let api = Arc::clone(api);
            let tx = tx.clone();
            tokio::spawn(async move {
                let outcome = api.search(ticket.query()).await;
                let _ = tx.send(Completion::Search(ticket, outcome));
            });
            return Ok(1);
        }
        Command::View(view) => {
            coordinator.set_view(view);
            render(coordinator, out)?;
        }
        Command::Select(id) => coordinator.select_listing(id.as_deref()),
        Command::New => {
            coordinator.open_dialog(ActiveDialog::Publish);
        }
        Command::Set(field, value) => {
            if !coordinator.edit_draft_field(field, &value) {
                writeln!(out, "no listing form is open (use 'new')")?;
            }
        }
        Command::Pin(at) => {
            let ticket = coordinator.on_map_marker_placed(at);
            debug!("Looking up pin #{}", ticket.seq());
            let api = Arc::clone(api);
            let tx = tx.clone();
            tokio::spawn(async move {
                let outcome = api.reverse_geocode(ticket.at()).await;
                let _ = tx.send(Completion::Geocode(ticket, outcome));
            });
            return Ok(1);
        }
        Command::Cancel => coordinator.close_dialog(),
        Command::Show => {
            render(coordinator, out)?;
            render_draft(coordinator, out)?;
        }
        Command::Help => writeln!(out, "{}", HELP)?,
        Command::Quit => {}
    }
    Ok(0)
}

/// Prints the active view: cards for lists, pins for the map.
pub fn render<W: Write>(coordinator: &Coordinator, out: &mut W) -> Result<()> {
    let loading = if coordinator.is_loading() { " (loading)" } else { "" };
    writeln!(out, "[{}]{}", coordinator.view(), loading)?;

    if coordinator.view() == ViewState::Map {
        let center = coordinator.map_center();
        writeln!(out, "  center {}", center)?;
        for marker in coordinator.markers() {
            let flag = if marker.selected { "*" } else { " " };
            writeln!(
                out,
                " {}{} @ {} | {} | {}",
                flag, marker.listing_id, marker.position, marker.title, marker.price
            )?;
        }
        return Ok(());
    }

    for (i, card) in coordinator.cards().iter().enumerate() {
        let flag = if card.selected { "*" } else { " " };
        writeln!(out, "{}{}. {} ({})", flag, i + 1, card.title, card.price)?;
        let mut details = vec![card.listing_type.to_string(), card.locality.clone()];
        if let Some(rooms) = card.rooms {
            details.push(format!("{} pièces", rooms));
        }
        if let Some(surface) = card.surface {
            details.push(format!("{} m²", surface));
        }
        writeln!(out, "   {}", details.join(", "))?;
        writeln!(out, "   ♥ {}  💬 {}  ID: {}", card.likes, card.comments, card.id)?;
    }
    Ok(())
}

fn render_draft<W: Write>(coordinator: &Coordinator, out: &mut W) -> Result<()> {
    let Some(draft) = coordinator.draft() else {
        return Ok(());
    };
    match draft.editing() {
        Some(id) => writeln!(out, "editing {}:", id)?,
        None => writeln!(out, "listing form:")?,
    }
    if let Some(marker) = coordinator.marker() {
        writeln!(out, "  pin: {}", marker.coordinates)?;
    }
    writeln!(out, "  city: {}", draft.city.value().unwrap_or("-"))?;
    writeln!(out, "  neighborhood: {}", draft.neighborhood.value().unwrap_or("-"))?;
    writeln!(out, "  address: {}", draft.address.value().unwrap_or("-"))?;
    Ok(())
}

fn flush_notices<W: Write>(coordinator: &mut Coordinator, out: &mut W) -> Result<()> {
    for notice in coordinator.drain_notices() {
        let tag = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Error => "error",
        };
        writeln!(out, "{}: {}", tag, notice.message)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(
            "filter city Port-Gentil".parse::<Command>(),
            Ok(Command::Filter(FilterField::City, "Port-Gentil".into()))
        );
        assert_eq!(
            "filter price_min".parse::<Command>(),
            Ok(Command::Filter(FilterField::PriceMin, String::new()))
        );
        assert_eq!("view map".parse::<Command>(), Ok(Command::View(ViewState::Map)));
        assert_eq!("select none".parse::<Command>(), Ok(Command::Select(None)));
        assert!("pin 95 9".parse::<Command>().is_err());
        assert!("fly".parse::<Command>().is_err());
    }
}
