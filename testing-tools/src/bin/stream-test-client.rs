use anyhow::Result;
use clap::Parser;
use colored::*;
use std::time::Duration;

use testing_tools::output::print_test_summary;
use testing_tools::scenarios::{self, Location};

#[derive(Parser)]
#[command(name = "stream-test-client")]
#[command(about = "Event stream integration testing tool")]
struct Cli {
    /// Base URL of the backend (e.g., http://localhost:4000)
    #[arg(long)]
    base_url: String,

    /// Latitude to subscribe to
    #[arg(long, default_value_t = 23.8103, allow_hyphen_values = true)]
    lat: f64,

    /// Longitude to subscribe to
    #[arg(long, default_value_t = 90.4125, allow_hyphen_values = true)]
    lon: f64,

    /// Seconds to wait for a reading or for a campaign to finish
    #[arg(long, default_value_t = 20)]
    wait_secs: u64,

    /// Test scenario to run
    #[arg(long, value_enum)]
    scenario: ScenarioChoice,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone)]
enum ScenarioChoice {
    /// Open a weather stream and check the handshake
    ConnectionTest,
    /// Wait for a weather reading (needs upstream access on the server)
    WeatherTest,
    /// Replay the campaign stream
    CampaignTest,
    /// Run all tests
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }

    println!("{}", "=== SETUP PHASE ===".bright_white().bold());

    println!("{} Checking server health...", "→".blue());
    let client = reqwest::Client::new();
    scenarios::check_health(&client, &cli.base_url).await?;
    println!("{} Server is healthy", "✓".green());

    let location = Location {
        lat: cli.lat,
        lon: cli.lon,
    };
    let wait = Duration::from_secs(cli.wait_secs);

    println!("\n{}", "=== TEST PHASE ===".bright_white().bold());

    let mut results = Vec::new();

    match cli.scenario {
        ScenarioChoice::ConnectionTest => {
            results.push(scenarios::test_connection(&cli.base_url, location).await?);
        }
        ScenarioChoice::WeatherTest => {
            results.push(scenarios::test_weather(&cli.base_url, location, wait).await?);
        }
        ScenarioChoice::CampaignTest => {
            results.push(scenarios::test_campaign(&cli.base_url, wait).await?);
        }
        ScenarioChoice::All => {
            results.push(scenarios::test_connection(&cli.base_url, location).await?);
            results.push(scenarios::test_weather(&cli.base_url, location, wait).await?);
            results.push(scenarios::test_campaign(&cli.base_url, wait).await?);
        }
    }

    println!("\n{}", "=== RESULTS ===".bright_white().bold());
    print_test_summary(&results);

    let all_passed = results.iter().all(|r| r.passed);

    if all_passed {
        println!("\n{}", "All tests passed! ✓".bright_green().bold());
    } else {
        println!("\n{}", "Some tests failed! ✗".bright_red().bold());
    }

    std::process::exit(if all_passed { 0 } else { 1 });
}
