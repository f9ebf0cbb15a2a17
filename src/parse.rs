use crate::record::RadiusKm;
use crate::util::flexible_datetime;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "parawatch")]
#[command(about = "A CLI client for browsing, rating and locating paranormal sighting reports")]
#[command(version)]
pub(crate) struct Args {
    /// Base URL of the sightings API [env: PARA_API_URL]
    #[arg(short, long, global = true)]
    pub api_url: Option<String>,

    /// User id attached to submitted ratings [env: PARA_USER_ID]
    #[arg(short, long, global = true)]
    pub user_id: Option<String>,

    /// Request timeout in seconds
    #[arg(short, long, default_value = "10", global = true)]
    pub timeout: u64,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// List reported sightings, newest first
    List {
        /// Only show this category (see `categories`)
        #[arg(short, long)]
        category: Option<String>,

        /// Only show verified (true) or unverified (false) sightings
        #[arg(long)]
        verified: Option<bool>,

        #[arg(short, long, default_value = "100")]
        limit: u32,

        #[arg(short, long, default_value = "0")]
        skip: u32,

        /// Also write the listing to this CSV file
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Show one or more sightings with ratings and AI analysis
    Show {
        #[arg(required = true)]
        ids: Vec<String>,

        /// Maximum number of concurrent requests
        #[arg(short, long, default_value = "5")]
        concurrent: usize,
    },

    /// Rate a sighting from 1 to 5 stars
    Rate {
        id: String,

        /// Star rating; 0 leaves it unset
        #[arg(short, long, default_value = "0", value_parser = clap::value_parser!(u8).range(0..=5))]
        score: u8,

        #[arg(short, long)]
        comment: Option<String>,
    },

    /// Find sightings near a location
    Nearby {
        /// Search radius in km: 10, 25, 50, 100 or 250
        #[arg(short, long, default_value = "50")]
        radius: RadiusKm,

        /// Latitude of an explicitly chosen search centre
        #[arg(long, allow_negative_numbers = true, requires = "lon")]
        lat: Option<f64>,

        /// Longitude of an explicitly chosen search centre
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lon: Option<f64>,

        /// Also write the results to this CSV file
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Report a new sighting; the backend analyses it on arrival
    Report {
        #[arg(long)]
        title: String,

        #[arg(long)]
        description: String,

        /// One of the names listed by `categories`
        #[arg(short, long)]
        category: String,

        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        #[arg(long)]
        address: Option<String>,

        /// When it happened, e.g. 2024-10-31T23:15 (defaults to now)
        #[arg(long, value_parser = parse_occurred)]
        occurred: Option<DateTime<Utc>>,

        #[arg(short, long, default_value = "1")]
        witnesses: u32,

        #[arg(long)]
        reporter_name: Option<String>,

        #[arg(long)]
        reporter_email: Option<String>,

        /// Evidence photo URL; repeat for several
        #[arg(long = "photo")]
        photos: Vec<String>,
    },

    /// Re-run the AI analysis of a sighting
    Analyze { id: String },

    /// List the categories known to the backend
    Categories,

    /// Show platform-wide statistics
    Stats,
}

fn parse_occurred(raw: &str) -> Result<DateTime<Utc>, String> {
    flexible_datetime::parse(raw).ok_or_else(|| format!("unrecognised date `{raw}`"))
}
