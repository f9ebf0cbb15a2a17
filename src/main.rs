mod client;
mod config;
mod detail;
mod error;
mod geo;
mod location;
#[cfg(test)]
mod mock;
mod notice;
mod parse;
mod rating;
mod record;
mod report;
mod session;
mod token;
mod traits;
mod util;

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::detail::SightingDetail;
use crate::geo::{GeoProximityClient, QueryOutcome};
use crate::location::FixedLocation;
use crate::notice::{ConsoleNotices, Notice, NoticeSink};
use crate::parse::{Args, Command};
use crate::rating::{RatingAggregator, RatingSummary, SubmitOutcome, render_stars};
use crate::record::{
    Coordinate, Location, NearbyResult, RadiusKm, Sighting, SightingCreate, SightingFilter,
    SightingRow, Stats,
};
use crate::report::{ReportOutcome, SightingReporter};
use crate::session::SessionContext;
use crate::traits::SightingsApi;
use crate::util::{format_hms, save_to_csv, with_spinner};
use chrono::Utc;
use clap::Parser;
use dotenvy::dotenv;
use futures::future::join_all;
use indicatif::MultiProgress;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

type CliResult = Result<bool, Box<dyn std::error::Error>>;

/// Ids that were asked for but did not come back
pub fn get_failed_ids(requested: &[String], loaded: &[Sighting]) -> Vec<String> {
    let loaded_ids: HashSet<&str> = loaded.iter().map(|s| s.id.as_str()).collect();

    requested
        .iter()
        .filter(|id| !loaded_ids.contains(id.as_str()))
        .cloned()
        .collect()
}

/// Most reported categories, largest first
pub fn top_categories(sightings: &[Sighting], n: usize) -> Vec<(&str, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for sighting in sightings {
        if !sighting.category.is_empty() {
            *counts.entry(sighting.category.as_str()).or_insert(0) += 1;
        }
    }

    let mut sorted: Vec<_> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    sorted.truncate(n);
    sorted
}

pub fn print_summary(sightings: &[Sighting]) {
    if sightings.is_empty() {
        println!("No sightings to summarize");
        return;
    }

    println!("\nSummary:");
    println!("Total sightings: {}", sightings.len());
    let verified = sightings.iter().filter(|s| s.verified).count();
    println!("Verified: {}", verified);

    let dates = sightings.iter().map(|s| s.date_occurred.date_naive());
    if let (Some(first), Some(last)) = (dates.clone().min(), dates.max()) {
        println!("Date range: {} to {}", first, last);
    }

    println!("Top categories:");
    for (category, count) in top_categories(sightings, 3) {
        println!("  {}: {}", category, count);
    }
}

fn print_listing_line(sighting: &Sighting) {
    let marker = if sighting.verified { "✔" } else { " " };
    println!(
        "{} {}  {:<40}  {:<22}  {}",
        marker,
        sighting.id,
        sighting.title,
        sighting.category,
        RatingSummary::of(&sighting.ratings)
    );
}

fn print_sighting(sighting: &Sighting) {
    println!("\n{} [{}]", sighting.title, sighting.id);
    println!("Category: {}", sighting.category);
    match (&sighting.location.address, sighting.location.coordinate()) {
        (Some(address), _) => println!("Location: {}", address),
        (None, Some(coordinate)) => println!("Location: {}", coordinate),
        (None, None) => println!("Location: unknown"),
    }
    println!(
        "Occurred: {}  Witnesses: {}  Verified: {}",
        sighting.date_occurred.format("%Y-%m-%d %H:%M"),
        sighting.witness_count,
        if sighting.verified { "yes" } else { "no" }
    );
    println!("{}", sighting.description);
    println!("Rating: {}", RatingSummary::of(&sighting.ratings));

    for rating in sighting.ratings.iter().rev().take(5) {
        let comment = rating.comment.as_deref().unwrap_or("");
        println!(
            "  {} {} ({}) {}",
            "★".repeat(usize::from(rating.score)),
            rating.user_id,
            rating.timestamp.format("%Y-%m-%d"),
            comment
        );
    }

    if let Some(analysis) = &sighting.ai_analysis {
        println!("AI credibility: {}/100", analysis.credibility_score);
        println!("  {}", analysis.analysis_summary);
        for step in &analysis.suggested_investigation_steps {
            println!("  - {}", step);
        }
        if !analysis.similar_cases.is_empty() {
            println!("  Similar cases: {}", analysis.similar_cases.join("; "));
        }
    }
}

fn print_nearby(results: &[NearbyResult]) {
    for result in results {
        println!(
            "{:>8.1} km  {}  {}  ({})",
            result.distance_km, result.sighting_id, result.title, result.category
        );
    }
}

fn print_stats(stats: &Stats) {
    println!("Total sightings: {}", stats.total_sightings);
    println!("Verified sightings: {}", stats.verified_sightings);
    println!("Haunting reports: {}", stats.haunting_reports);
    println!("Active investigators: {}", stats.active_investigators);
    println!("Equipment reviews: {}", stats.equipment_reviews);
    let mut categories: Vec<_> = stats.categories.iter().collect();
    categories.sort_by(|a, b| b.1.cmp(a.1));
    println!("By category:");
    for (category, count) in categories {
        println!("  {}: {}", category, count);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

/// What every command runner talks to.
struct Console {
    api: Arc<dyn SightingsApi>,
    notices: Arc<dyn NoticeSink>,
    progress: MultiProgress,
}

async fn run_list(console: &Console, filter: SightingFilter, output: Option<&str>) -> CliResult {
    let start = Instant::now();
    let listing = with_spinner(
        &console.progress,
        "Loading sightings",
        console.api.list_sightings(&filter),
    )
    .await;
    let sightings = match listing {
        Ok(sightings) => sightings,
        Err(e) => {
            warn!("Listing failed: {}", e);
            console.notices.notify(Notice::failure("Failed to load sightings"));
            return Ok(false);
        }
    };
    info!("Fetched {} sightings in {}", sightings.len(), format_hms(&start));

    for sighting in &sightings {
        print_listing_line(sighting);
    }
    print_summary(&sightings);

    if let Some(path) = output {
        let rows: Vec<SightingRow> = sightings.iter().map(SightingRow::from).collect();
        save_to_csv(&rows, path)?;
        println!("Saved {} sightings to {}", rows.len(), path);
    }
    Ok(true)
}

async fn run_show(console: &Console, ids: &[String], max_concurrent: usize) -> CliResult {
    let views: Vec<SightingDetail> = ids
        .iter()
        .map(|id| {
            SightingDetail::new(id.clone(), Arc::clone(&console.api), Arc::clone(&console.notices))
        })
        .collect();

    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let tasks = views.iter().map(|view| {
        let permit = Arc::clone(&semaphore);
        async move {
            let _permit = permit.acquire().await.ok();
            view.load().await
        }
    });
    with_spinner(&console.progress, "Loading sightings", join_all(tasks)).await;

    let sightings: Vec<Sighting> = views.iter().filter_map(SightingDetail::sighting).collect();
    for sighting in &sightings {
        print_sighting(sighting);
    }
    for view in &views {
        view.teardown();
    }

    let failed = get_failed_ids(ids, &sightings);
    if !failed.is_empty() {
        println!("\nCould not load: {}", failed.join(", "));
    }
    Ok(failed.is_empty())
}

async fn run_rate(
    console: &Console,
    session: SessionContext,
    id: String,
    score: u8,
    comment: Option<String>,
) -> CliResult {
    let ratings = RatingAggregator::new(
        id,
        Arc::clone(&console.api),
        session,
        Arc::clone(&console.notices),
    );
    if !with_spinner(&console.progress, "Loading sighting", ratings.refresh()).await {
        return Ok(false);
    }

    ratings.select_score(score)?;
    if let Some(comment) = comment {
        ratings.set_comment(comment);
    }

    let outcome = with_spinner(&console.progress, "Submitting rating", ratings.submit()).await;
    debug!("Rating finished as {:?}, now {:?}", outcome, ratings.phase());
    match outcome {
        SubmitOutcome::Submitted => {
            if let Some(item) = ratings.item() {
                println!("{}: {}", item.title, ratings.summary());
            }
            for rating in ratings.ratings().iter().rev().take(3) {
                println!("  {} {}", render_stars(rating.score), rating.user_id);
            }
        }
        SubmitOutcome::Failed => {
            let kept = ratings.controls();
            println!("Your {}-star rating was not recorded; run the command again to retry", kept.score);
        }
        SubmitOutcome::Rejected | SubmitOutcome::Busy | SubmitOutcome::Discarded => {}
    }
    ratings.teardown();
    Ok(outcome == SubmitOutcome::Submitted)
}

/// `device` is the best-effort position from the environment; `chosen` is
/// an explicit `--lat/--lon` selection and must be valid.
async fn run_nearby(
    console: &Console,
    device: Option<(f64, f64)>,
    chosen: Option<(f64, f64)>,
    radius: RadiusKm,
    output: Option<&str>,
) -> CliResult {
    let geo = GeoProximityClient::new(
        Arc::clone(&console.api),
        Arc::new(FixedLocation::new(device)),
        Arc::clone(&console.notices),
    );
    geo.acquire_location().await;

    if let Some((latitude, longitude)) = chosen {
        match Coordinate::new(latitude, longitude) {
            Ok(coordinate) => geo.select_location(coordinate),
            Err(e) => {
                console
                    .notices
                    .notify(Notice::failure(format!("Invalid location: {}", e)));
                geo.teardown();
                return Ok(false);
            }
        }
    }

    let message = format!("Searching within {}", radius);
    let outcome = with_spinner(&console.progress, &message, geo.query_nearby(radius)).await;
    let results = geo.results();
    let shown_radius = geo.radius();
    geo.teardown();

    let QueryOutcome::Displayed(count) = outcome else {
        return Ok(false);
    };
    debug!("Showing {} nearby sightings", count);
    if let (Some(center), Some(shown_radius)) = (geo.location(), shown_radius) {
        println!("Within {} of {}:", shown_radius, center);
    }
    print_nearby(&results);
    if let Some(path) = output {
        save_to_csv(&results, path)?;
        println!("Saved {} results to {}", results.len(), path);
    }
    Ok(true)
}

async fn run_report(console: &Console, report: SightingCreate) -> CliResult {
    let reporter = SightingReporter::new(Arc::clone(&console.api), Arc::clone(&console.notices));
    let outcome =
        with_spinner(&console.progress, "Submitting report", reporter.submit(&report)).await;
    match outcome {
        ReportOutcome::Created(created) => {
            print_sighting(&created);
            Ok(true)
        }
        ReportOutcome::Rejected | ReportOutcome::Failed => Ok(false),
    }
}

async fn run_analyze(console: &Console, id: String) -> CliResult {
    let view = SightingDetail::new(id, Arc::clone(&console.api), Arc::clone(&console.notices));
    let updated = with_spinner(&console.progress, "Re-running AI analysis", view.reanalyze()).await;
    if let Some(sighting) = view.sighting() {
        print_sighting(&sighting);
    }
    view.teardown();
    Ok(updated)
}

async fn run_categories(console: &Console) -> CliResult {
    match with_spinner(&console.progress, "Loading categories", console.api.categories()).await {
        Ok(categories) => {
            println!("Sighting categories:\n  {}", categories.categories.join("\n  "));
            println!("Haunting types:\n  {}", categories.haunting_types.join("\n  "));
            Ok(true)
        }
        Err(e) => {
            warn!("Categories failed: {}", e);
            console.notices.notify(Notice::failure("Failed to load categories"));
            Ok(false)
        }
    }
}

async fn run_stats(console: &Console) -> CliResult {
    match with_spinner(&console.progress, "Loading statistics", console.api.stats()).await {
        Ok(stats) => {
            print_stats(&stats);
            Ok(true)
        }
        Err(e) => {
            warn!("Stats failed: {}", e);
            console.notices.notify(Notice::failure("Failed to load statistics"));
            Ok(false)
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    dotenv().ok();
    let args = Args::parse();
    init_logging(args.verbose);

    let config = ClientConfig::from_args(&args);
    let client = ApiClient::new(&config)?;
    debug!("Talking to {}", client.base_url());
    let progress = MultiProgress::new();
    let console = Console {
        api: Arc::new(client),
        notices: Arc::new(ConsoleNotices::new(progress.clone())),
        progress,
    };

    let succeeded = match args.command {
        Command::List {
            category,
            verified,
            limit,
            skip,
            output,
        } => {
            let filter = SightingFilter {
                category,
                verified,
                limit,
                skip,
            };
            run_list(&console, filter, output.as_deref()).await?
        }
        Command::Show { ids, concurrent } => run_show(&console, &ids, concurrent).await?,
        Command::Rate { id, score, comment } => {
            run_rate(&console, config.session(), id, score, comment).await?
        }
        Command::Nearby {
            radius,
            lat,
            lon,
            output,
        } => {
            let chosen = lat.zip(lon);
            run_nearby(&console, config.position, chosen, radius, output.as_deref()).await?
        }
        Command::Report {
            title,
            description,
            category,
            lat,
            lon,
            address,
            occurred,
            witnesses,
            reporter_name,
            reporter_email,
            photos,
        } => {
            let report = SightingCreate {
                title,
                description,
                category,
                location: Location {
                    latitude: lat,
                    longitude: lon,
                    address,
                },
                date_occurred: occurred.unwrap_or_else(Utc::now),
                witness_count: witnesses,
                reporter_name,
                reporter_email,
                evidence_photos: photos,
            };
            run_report(&console, report).await?
        }
        Command::Analyze { id } => run_analyze(&console, id).await?,
        Command::Categories => run_categories(&console).await?,
        Command::Stats => run_stats(&console).await?,
    };

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
