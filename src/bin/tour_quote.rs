// Headless booking form: prices a tour for a date and group size, optionally books it

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

use tour_booking_client::{
    catalog::TourDetails, estimate::format_price, telemetry, ActiveLanguages, BookingWorkflow,
    ClientConfig, ContactDetails, EstimationMode, HttpApiClient, Lang, MemoryLanguageCache,
    TracingNotifier, WorkflowOptions,
};

#[derive(Parser, Debug)]
#[command(name = "tour_quote", about = "Estimate the price of a Morocco tour")]
struct Args {
    /// Tour id
    #[arg(long)]
    tour: String,

    /// First day of the trip (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,

    #[arg(long, default_value_t = 1)]
    participants: u32,

    /// Language code for tour content
    #[arg(long, env = "TOUR_LANG")]
    lang: Option<String>,

    /// Check availability and use seasonal pricing from the bookings service
    #[arg(long)]
    legacy: bool,

    /// Submit a booking request under this name once the quote is in
    #[arg(long, requires = "email")]
    name: Option<String>,

    #[arg(long)]
    email: Option<String>,

    #[arg(long)]
    phone: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();
    let args = Args::parse();

    let config = ClientConfig::from_env().context("reading client configuration")?;
    let client = Arc::new(HttpApiClient::new(&config)?);

    let lang = match args.lang {
        Some(code) => {
            let languages = ActiveLanguages::new(client.clone(), MemoryLanguageCache::from_config(&config));
            if !languages.get().await.iter().any(|l| l.code == code) {
                warn!(lang = %code, "language is not active, content may be untranslated");
            }
            Lang::new(code)
        }
        None => Lang::any(),
    };

    let details = TourDetails::load(client.as_ref(), &args.tour, &lang)
        .await
        .with_context(|| format!("loading tour {}", args.tour))?;
    println!("{} ({})", details.tour.title, details.tour.duration);
    if let Some(rating) = details.rating_label() {
        println!("  {}", rating);
    }
    for label in details.tier_labels() {
        println!("  {}", label);
    }

    let mode = if args.legacy {
        EstimationMode::Legacy
    } else {
        EstimationMode::GroupPricing
    };
    let workflow = BookingWorkflow::new(
        client.clone(),
        client.clone(),
        Arc::new(TracingNotifier),
        WorkflowOptions::from_config(&config).with_mode(mode),
    );
    workflow.set_tour(details.tour.clone());
    workflow.set_start_date(args.start);
    workflow.set_participants(args.participants)?;

    let state = workflow.settled().await;
    if let Some(end_date) = state.end_date {
        println!("Dates: {} to {}", args.start, end_date);
    }
    if let Some(availability) = &state.availability {
        println!("Availability: {}", availability.message);
    }
    let Some(quote) = state.quote else {
        bail!("no price available for {} participants", state.participants);
    };
    println!(
        "Price: {} per person, {} total for {} ({})",
        format_price(quote.price_per_person),
        format_price(quote.total_price),
        quote.participants,
        quote.pricing_tier
    );

    if let (Some(name), Some(email)) = (args.name, args.email) {
        let mut contact = ContactDetails::new(name, email);
        if let Some(phone) = args.phone {
            contact = contact.with_phone(phone);
        }
        workflow.set_contact(contact);
        let booking = workflow.submit().await.context("submitting booking")?;
        info!(booking_id = %booking.id, "booking created");
        println!("Booking {} is {:?}", booking.id, booking.status);
    }

    let stats = client.stats();
    info!(
        requests = stats.requests_sent,
        failed = stats.requests_failed,
        avg_ms = stats.average_response_time_ms,
        "done"
    );
    Ok(())
}
