use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use callpilot::models::{BookingRequest, BookingStatus, Preferences};
use callpilot::{BookingClient, BookingError, ClientConfig};

#[derive(Parser)]
#[command(name = "callpilot", about = "Book appointments through the CallPilot backend")]
struct Cli {
    /// Backend base URL (overrides CALLPILOT_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the backend is up
    Health,
    /// Start a booking and follow it until the agents finish
    Book(BookArgs),
    /// Print the current status of a booking once
    Status { booking_id: String },
    /// Poll a booking until it finishes
    Watch {
        booking_id: String,
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Commit to one of a booking's results
    Confirm {
        booking_id: String,
        provider_id: String,
    },
}

#[derive(Args)]
struct BookArgs {
    #[arg(long)]
    service_type: String,
    #[arg(long)]
    timeframe: String,
    #[arg(long)]
    location: String,
    #[arg(long)]
    rating_weight: Option<f64>,
    #[arg(long)]
    distance_weight: Option<f64>,
    #[arg(long)]
    availability_weight: Option<f64>,
    #[arg(long)]
    preferred_slots: Option<String>,
    /// Return right after the booking is created
    #[arg(long)]
    no_wait: bool,
    /// Confirm the top-ranked result once the booking completes
    #[arg(long)]
    confirm_best: bool,
}

impl BookArgs {
    fn to_request(&self) -> BookingRequest {
        let request = BookingRequest::new(&self.service_type, &self.timeframe, &self.location);
        let preferences = Preferences {
            rating_weight: self.rating_weight,
            distance_weight: self.distance_weight,
            availability_weight: self.availability_weight,
            preferred_slots: self.preferred_slots.clone(),
        };
        if preferences == Preferences::default() {
            request
        } else {
            request.with_preferences(preferences)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    let client = BookingClient::new(&config).context("failed to create booking client")?;
    tracing::debug!(?client, "client ready");

    match cli.command {
        Command::Health => {
            let health = client.health_check().await.context("health check failed")?;
            println!("{} ({})", health.status, health.service);
        }
        Command::Book(args) => {
            let created = client
                .create_booking_request(&args.to_request())
                .await
                .context("failed to create booking request")?;
            println!("booking {} is {}", created.booking_id, created.status);

            if args.no_wait {
                return Ok(());
            }

            let finished = watch(&client, &created.booking_id, client.poll_timeout()).await?;
            if args.confirm_best {
                let Some(best) = finished.best_result() else {
                    anyhow::bail!("booking {} finished without results", finished.booking_id);
                };
                confirm(&client, &finished.booking_id, &best.provider_id).await?;
            }
        }
        Command::Status { booking_id } => {
            let status = client
                .get_booking_status(&booking_id)
                .await
                .with_context(|| format!("failed to get status of booking {booking_id}"))?;
            print_status(&status);
        }
        Command::Watch {
            booking_id,
            timeout_ms,
        } => {
            let timeout = timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| client.poll_timeout());
            watch(&client, &booking_id, timeout).await?;
        }
        Command::Confirm {
            booking_id,
            provider_id,
        } => {
            confirm(&client, &booking_id, &provider_id).await?;
        }
    }

    Ok(())
}

async fn watch(
    client: &BookingClient,
    booking_id: &str,
    timeout: Duration,
) -> anyhow::Result<BookingStatus> {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    let result = client
        .poll_booking_status_until(
            booking_id,
            |status| {
                let note = status.message.as_deref().unwrap_or("");
                println!("[{}] {note}", status.status);
            },
            timeout,
            ctrl_c,
        )
        .await;

    match result {
        Ok(status) => {
            print_status(&status);
            Ok(status)
        }
        Err(BookingError::Waitlist(msg)) => {
            anyhow::bail!("your account is on the waitlist: {msg}")
        }
        Err(e) => Err(e).with_context(|| format!("failed while waiting for booking {booking_id}")),
    }
}

async fn confirm(client: &BookingClient, booking_id: &str, provider_id: &str) -> anyhow::Result<()> {
    let confirmation = client
        .confirm_booking(booking_id, provider_id)
        .await
        .with_context(|| format!("failed to confirm booking {booking_id} with {provider_id}"))?;

    println!("{}", confirmation.message);
    if let Some(event_id) = &confirmation.calendar_event_id {
        println!("calendar event: {event_id}");
    }
    Ok(())
}

fn print_status(status: &BookingStatus) {
    println!("booking {}: {}", status.booking_id, status.status);
    if let Some(message) = &status.message {
        println!("  {message}");
    }
    for (rank, result) in status.results.iter().enumerate() {
        println!(
            "  {}. {} [{}] score {} | {:.1} stars | {:.1} mi, {} min | {}",
            rank + 1,
            result.provider_name,
            result.provider_id,
            result.score,
            result.rating,
            result.distance,
            result.travel_time,
            result.availability(),
        );
    }
}
