use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{BackendClient, GarageController, GarageState, VEHICLE_ADDED_ACK};
use shared::domain::Condition;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, prepare_backend_url, DEFAULT_SETTINGS_FILE};

#[derive(Parser, Debug)]
#[command(about = "List and add vehicles in your garage")]
struct Cli {
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,
    #[arg(long)]
    backend_url: Option<String>,
    #[arg(long)]
    anon_key: Option<String>,
    #[arg(long)]
    access_token: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the signed-in user's vehicles.
    List,
    /// Add a vehicle and link it to the signed-in user.
    Add(AddArgs),
    /// Print the signed-in user's id.
    Whoami,
}

#[derive(Args, Debug, Default)]
struct AddArgs {
    #[arg(long)]
    make: Option<String>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    year: Option<String>,
    #[arg(long)]
    mileage: Option<String>,
    #[arg(long)]
    color: Option<String>,
    #[arg(long)]
    vin: Option<String>,
    #[arg(long)]
    nickname: Option<String>,
    #[arg(long, value_parser = parse_condition)]
    condition: Option<Condition>,
}

fn parse_condition(raw: &str) -> Result<Condition, String> {
    raw.parse().map_err(|err: shared::error::DraftError| err.to_string())
}

impl AddArgs {
    /// Form inputs the user actually supplied, keyed by field name.
    fn draft_inputs(&self) -> Vec<(&'static str, String)> {
        let text_fields = [
            ("make", &self.make),
            ("model", &self.model),
            ("year", &self.year),
            ("mileage", &self.mileage),
            ("color", &self.color),
            ("vin", &self.vin),
            ("nickname", &self.nickname),
        ];
        let mut inputs = text_fields
            .into_iter()
            .filter_map(|(name, value)| value.clone().map(|value| (name, value)))
            .collect::<Vec<_>>();
        if let Some(condition) = self.condition {
            inputs.push(("condition", condition.to_string()));
        }
        inputs
    }
}

fn render_garage(state: &GarageState) -> String {
    let mut out = String::from("Your Garage\n");
    if state.vehicles.is_empty() {
        out.push_str("No vehicles yet.\n");
        return out;
    }
    for card in state.cards() {
        out.push('\n');
        out.push_str(&card.to_string());
        out.push('\n');
    }
    out
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings(&cli.config);
    if let Some(v) = cli.backend_url {
        settings.backend_url = v;
    }
    if let Some(v) = cli.anon_key {
        settings.anon_key = v;
    }
    if let Some(v) = cli.access_token {
        settings.access_token = Some(v);
    }

    let backend_url = prepare_backend_url(&settings.backend_url)?;
    let mut client = BackendClient::new(backend_url, settings.anon_key);
    if let Some(token) = settings.access_token {
        client = client.with_access_token(token);
    }
    let garage = GarageController::with_backend(client);
    garage.initialize().await;

    match cli.command {
        Command::Whoami => match garage.snapshot().await.user_id {
            Some(user_id) => println!("{user_id}"),
            None => bail!("no active session; sign in and pass an access token"),
        },
        Command::List => {
            print!("{}", render_garage(&garage.snapshot().await));
        }
        Command::Add(args) => {
            garage.toggle_form().await;
            for (field, value) in args.draft_inputs() {
                garage.update_draft(field, value).await?;
            }
            match garage.submit().await {
                Ok(vehicle) => {
                    println!("{VEHICLE_ADDED_ACK} (id {})", vehicle.id);
                    print!("{}", render_garage(&garage.snapshot().await));
                }
                Err(err) => bail!("{err}"),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
