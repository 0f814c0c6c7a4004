use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use immoco::api::{AuthApi, Gazetteer, ImageUpload, ListingStore, ReverseGeocoder};
use immoco::models::{Coordinates, LoginRequest, RegisterRequest};
use immoco::search::{
    ActiveDialog, DraftField, FilterField, NoticeLevel, RadiusFilter, ResultOrder, TicketOutcome,
    ViewState,
};
use immoco::{shell, ApiClient, Config, Coordinator, Session, SessionStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "immoco", about = "IMMO&CO real-estate listings client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search listings
    Search(SearchArgs),
    /// Interactive search session
    Shell,
    /// Publish a new listing
    Publish(PublishArgs),
    /// Change one of your listings
    Edit(EditArgs),
    /// Delete one of your listings
    Delete { id: String },
    /// Like or unlike a listing
    Like { id: String },
    /// Show whether you like a listing
    Liked { id: String },
    /// Add or remove a listing from your favorites
    Favorite { id: String },
    /// List your favorites
    Favorites,
    /// List your own listings
    Mine,
    /// Show the comments on a listing
    Comments { id: String },
    /// Comment on a listing
    Comment { id: String, text: String },
    /// Remove one of your comments
    DeleteComment { comment_id: String },
    /// Attach images to one of your listings
    Upload { id: String, files: Vec<PathBuf> },
    /// Remove an image from one of your listings
    DeleteImage { id: String, filename: String },
    /// Look up the locality at a map position
    Locate {
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lon: f64,
    },
    /// Look up places by name
    Geocode { query: String },
    /// Cities with published listings
    Cities,
    /// Neighborhoods with published listings
    Neighborhoods {
        #[arg(long)]
        city: Option<String>,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        phone: Option<String>,
    },
    Logout,
    Whoami,
}

#[derive(Args)]
struct SearchArgs {
    /// Free text matched against title and description
    text: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    neighborhood: Option<String>,
    /// sale or rent
    #[arg(long = "type")]
    listing_type: Option<String>,
    #[arg(long)]
    price_min: Option<String>,
    #[arg(long)]
    price_max: Option<String>,
    #[arg(long)]
    surface_min: Option<String>,
    #[arg(long)]
    surface_max: Option<String>,
    #[arg(long)]
    rooms_min: Option<String>,
    #[arg(long)]
    rooms_max: Option<String>,
    /// Only listings within this many km of --near-lat/--near-lon
    #[arg(long, requires_all = ["near_lat", "near_lon"])]
    radius: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    near_lat: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    near_lon: Option<f64>,
    /// Newest first instead of the shuffled discovery feed
    #[arg(long)]
    newest: bool,
    /// Page number for --newest (starting at 1)
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long)]
    limit: Option<u32>,
    /// Print map pins instead of cards
    #[arg(long)]
    map: bool,
    /// Also write the results to this JSON file
    #[arg(long)]
    save: Option<PathBuf>,
}

#[derive(Args)]
struct PublishArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: String,
    /// sale or rent
    #[arg(long = "type")]
    listing_type: String,
    #[arg(long)]
    price: String,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    neighborhood: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    surface: Option<String>,
    #[arg(long)]
    rooms: Option<String>,
    /// Map position; city/neighborhood/address are looked up from it
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    lat: Option<f64>,
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    lon: Option<f64>,
    /// Images to attach once published
    #[arg(long = "image")]
    images: Vec<PathBuf>,
}

#[derive(Args)]
struct EditArgs {
    id: String,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    price: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    neighborhood: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    surface: Option<String>,
    #[arg(long)]
    rooms: Option<String>,
    /// Move the pin; the locality is looked up again
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    lat: Option<f64>,
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    lon: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    let mut session = Session::new(SessionStore::new(&config.session_path));
    session.rehydrate().await.context("Failed to read stored session")?;

    let mut api = ApiClient::new(&config)
        .context("Failed to create HTTP client")?
        .with_session(&session);
    if session.is_authenticated() {
        session.verify(&api).await?;
        api.set_session(&session);
    }

    let mut coordinator = Coordinator::new(config.page_limit);

    match cli.command {
        Command::Search(args) => search(&mut coordinator, &api, args).await?,
        Command::Shell => {
            info!("🏠 IMMO&CO interactive search (type 'help')");
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            shell::run(&mut coordinator, Arc::new(api), stdin, &mut stdout).await?;
        }
        Command::Publish(args) => publish(&mut coordinator, &api, args).await?,
        Command::Edit(args) => edit(&mut coordinator, &api, args).await?,
        Command::Delete { id } => {
            coordinator.delete_listing(&id, &api, &api).await;
        }
        Command::Like { id } => {
            if let Some(status) = coordinator.toggle_like(&id, &api, &api).await {
                println!("liked: {} ({} likes)", status.liked, status.likes_count.unwrap_or_default());
            }
        }
        Command::Liked { id } => {
            println!("liked: {}", api.is_liked(&id).await?);
        }
        Command::Favorite { id } => {
            if let Some(is_favorite) = coordinator.toggle_favorite(&id, &api, &api).await {
                println!("favorite: {}", is_favorite);
            }
        }
        Command::Favorites => {
            coordinator.refresh_favorites(&api).await;
            coordinator.set_view(ViewState::Favorites);
            print_view(&coordinator)?;
        }
        Command::Mine => {
            coordinator.refresh_my_listings(&api).await;
            coordinator.set_view(ViewState::Profile);
            print_view(&coordinator)?;
        }
        Command::Comments { id } => {
            let comments = api.comments(&id).await?;
            info!("{} comments on {}", comments.len(), id);
            for comment in comments {
                println!(
                    "{}: {} ({})",
                    comment.author_name,
                    comment.text,
                    comment.created_at.format("%d/%m/%Y %H:%M")
                );
            }
        }
        Command::Comment { id, text } => {
            coordinator.post_comment(&id, &text, &api, &api).await;
        }
        Command::DeleteComment { comment_id } => {
            api.delete_comment(&comment_id).await?;
            println!("Comment {} deleted", comment_id);
        }
        Command::DeleteImage { id, filename } => {
            api.delete_image(&id, &filename).await?;
            println!("Removed {} from {}", filename, id);
        }
        Command::Upload { id, files } => {
            let mut uploads = Vec::with_capacity(files.len());
            for path in &files {
                uploads.push(ImageUpload::from_path(path).await?);
            }
            let uploaded = api.upload_images(&id, uploads).await?;
            for image in uploaded.images {
                println!("{}", api.image_url(&image));
            }
        }
        Command::Locate { lat, lon } => {
            let at = Coordinates::new(lat, lon)?;
            let found = api.reverse_geocode(at).await?;
            println!("city: {}", found.city.as_deref().unwrap_or("-"));
            println!("neighborhood: {}", found.neighborhood.as_deref().unwrap_or("-"));
            println!("address: {}", found.address.as_deref().unwrap_or("-"));
        }
        Command::Geocode { query } => {
            for place in api.geocode(&query).await? {
                match place.coordinates() {
                    Some(at) => println!("{} @ {}", place.display_name, at),
                    None => println!("{}", place.display_name),
                }
            }
        }
        Command::Cities => {
            for city in api.cities().await? {
                println!("{}", city);
            }
        }
        Command::Neighborhoods { city } => {
            for neighborhood in api.neighborhoods(city.as_deref()).await? {
                println!("{}", neighborhood);
            }
        }
        Command::Login { email, password } => {
            coordinator.open_dialog(ActiveDialog::Login);
            let auth = api.login(&LoginRequest { email, password }).await?;
            session.sign_in(auth).await?;
            coordinator.close_dialog();
            println!("Signed in as {}", session.user().map(|u| u.name.as_str()).unwrap_or("?"));
        }
        Command::Register {
            email,
            name,
            password,
            phone,
        } => {
            coordinator.open_dialog(ActiveDialog::Register);
            let auth = api
                .register(&RegisterRequest {
                    email,
                    name,
                    phone,
                    password,
                })
                .await?;
            session.sign_in(auth).await?;
            coordinator.close_dialog();
            println!("Welcome {}", session.user().map(|u| u.name.as_str()).unwrap_or("?"));
        }
        Command::Logout => {
            session.logout().await?;
            println!("Signed out");
        }
        Command::Whoami => match session.user() {
            Some(user) => println!("{} <{}>", user.name, user.email),
            None => println!("Not signed in"),
        },
    }

    print_notices(&mut coordinator);
    Ok(())
}

async fn search(coordinator: &mut Coordinator, api: &ApiClient, args: SearchArgs) -> Result<()> {
    if let Some(text) = &args.text {
        coordinator.set_query_text(text.as_str());
    }
    let fields = [
        (FilterField::City, &args.city),
        (FilterField::Neighborhood, &args.neighborhood),
        (FilterField::ListingType, &args.listing_type),
        (FilterField::PriceMin, &args.price_min),
        (FilterField::PriceMax, &args.price_max),
        (FilterField::SurfaceMin, &args.surface_min),
        (FilterField::SurfaceMax, &args.surface_max),
        (FilterField::RoomsMin, &args.rooms_min),
        (FilterField::RoomsMax, &args.rooms_max),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            coordinator.set_filter_field(field, value)?;
        }
    }
    if let (Some(radius), Some(lat), Some(lon)) = (args.radius, args.near_lat, args.near_lon) {
        coordinator.set_near(Some(RadiusFilter::new(Coordinates::new(lat, lon)?, radius)?));
    }
    if let Some(limit) = args.limit {
        coordinator.set_limit(limit);
    }
    if args.newest {
        coordinator.set_order(ResultOrder::Newest);
        if !coordinator.set_page(args.page) {
            anyhow::bail!("Page {} is out of range", args.page);
        }
    }

    if coordinator.search(api).await != TicketOutcome::Applied {
        return Ok(());
    }

    if args.map {
        coordinator.set_view(ViewState::Map);
    }
    print_view(coordinator)?;

    if let Some(path) = args.save {
        let json = serde_json::to_string_pretty(coordinator.results())?;
        tokio::fs::write(&path, json).await?;
        info!("💾 Saved {} listings to {}", coordinator.results().len(), path.display());
    }
    Ok(())
}

async fn publish(coordinator: &mut Coordinator, api: &ApiClient, args: PublishArgs) -> Result<()> {
    coordinator.open_dialog(ActiveDialog::Publish);

    if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        let at = Coordinates::new(lat, lon)?;
        if coordinator.place_marker(at, api).await == TicketOutcome::Failed {
            warn!("Continuing without address lookup");
        }
    }

    let fields = [
        (DraftField::Title, Some(args.title)),
        (DraftField::Description, Some(args.description)),
        (DraftField::ListingType, Some(args.listing_type)),
        (DraftField::Price, Some(args.price)),
        (DraftField::City, args.city),
        (DraftField::Neighborhood, args.neighborhood),
        (DraftField::Address, args.address),
        (DraftField::Surface, args.surface),
        (DraftField::Rooms, args.rooms),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            coordinator.edit_draft_field(field, &value);
        }
    }

    let Some(listing) = coordinator.submit_draft(api, api).await else {
        return Ok(());
    };
    println!("Published {} ({})", listing.id, listing.price_label());

    if !args.images.is_empty() {
        let mut uploads = Vec::with_capacity(args.images.len());
        for path in &args.images {
            uploads.push(ImageUpload::from_path(path).await?);
        }
        let uploaded = api.upload_images(&listing.id, uploads).await?;
        info!("Attached {} images", uploaded.images.len());
    }
    Ok(())
}

async fn edit(coordinator: &mut Coordinator, api: &ApiClient, args: EditArgs) -> Result<()> {
    coordinator.refresh_my_listings(api).await;
    if !coordinator.open_dialog(ActiveDialog::Edit(args.id)) {
        return Ok(());
    }

    if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        let at = Coordinates::new(lat, lon)?;
        if coordinator.place_marker(at, api).await == TicketOutcome::Failed {
            warn!("Keeping the previous address");
        }
    }

    let fields = [
        (DraftField::Title, args.title),
        (DraftField::Description, args.description),
        (DraftField::Price, args.price),
        (DraftField::City, args.city),
        (DraftField::Neighborhood, args.neighborhood),
        (DraftField::Address, args.address),
        (DraftField::Surface, args.surface),
        (DraftField::Rooms, args.rooms),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            coordinator.edit_draft_field(field, &value);
        }
    }

    if let Some(listing) = coordinator.submit_draft(api, api).await {
        println!("Updated {} ({})", listing.id, listing.price_label());
    }
    Ok(())
}

fn print_view(coordinator: &Coordinator) -> Result<()> {
    let mut stdout = std::io::stdout();
    shell::render(coordinator, &mut stdout)
}

fn print_notices(coordinator: &mut Coordinator) {
    for notice in coordinator.drain_notices() {
        match notice.level {
            NoticeLevel::Info => info!("{}", notice.message),
            NoticeLevel::Error => eprintln!("error: {}", notice.message),
        }
    }
}
