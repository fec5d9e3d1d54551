use anyhow::Result;
use colored::*;
use std::time::{Duration, Instant};

use crate::output::{print_event, TestResult};
use crate::sse_client::Connection;

/// Location the weather scenarios subscribe to.
#[derive(Debug, Clone, Copy)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

pub fn weather_url(base_url: &str, location: Location, interval_secs: u64) -> String {
    format!(
        "{}/api/stream_weather?lat={}&lon={}&interval={}",
        base_url.trim_end_matches('/'),
        location.lat,
        location.lon,
        interval_secs
    )
}

pub fn campaign_url(base_url: &str) -> String {
    format!("{}/api/stream_campaign", base_url.trim_end_matches('/'))
}

pub async fn check_health(client: &reqwest::Client, base_url: &str) -> Result<()> {
    let url = format!("{}/health", base_url.trim_end_matches('/'));
    let response = client.get(&url).send().await?.error_for_status()?;
    let body = response.text().await?;

    if body != "healthy" {
        anyhow::bail!("Unexpected health response: {}", body);
    }
    Ok(())
}

pub async fn test_connection(base_url: &str, location: Location) -> Result<TestResult> {
    let start = Instant::now();
    let scenario = "connection_test";

    println!("\n{}", "=== TEST: Connection Test ===".bright_cyan().bold());
    println!(
        "{}",
        "Opening a weather stream and checking the handshake".bright_white()
    );

    let mut conn = Connection::establish(
        &weather_url(base_url, location, 60),
        "Weather".to_string(),
    )
    .await?;

    let event = match conn.next_event(Duration::from_secs(5)).await {
        Ok(event) => event,
        Err(e) => {
            println!("{} No handshake: {}", "✗".red(), e);
            return Ok(TestResult::fail(scenario, e.to_string(), start.elapsed()));
        }
    };
    print_event(&conn.label, &event);

    let lat = event.data["lat"].as_f64();
    let lon = event.data["lon"].as_f64();
    if event.kind != "connected" || lat != Some(location.lat) || lon != Some(location.lon) {
        println!("{} Handshake mismatch!", "✗".red());
        return Ok(TestResult::fail(
            scenario,
            format!(
                "Expected connected at ({}, {}), got {}",
                location.lat, location.lon, event.data
            ),
            start.elapsed(),
        ));
    }

    println!("{} Handshake verified", "✓".green());
    Ok(TestResult::pass(
        scenario,
        Some("Stream opened and echoed the requested location".to_string()),
        start.elapsed(),
    ))
}

pub async fn test_weather(base_url: &str, location: Location, wait: Duration) -> Result<TestResult> {
    let start = Instant::now();
    let scenario = "weather_test";

    println!("\n{}", "=== TEST: Weather Reading ===".bright_cyan().bold());

    let mut conn = Connection::establish(
        &weather_url(base_url, location, 60),
        "Weather".to_string(),
    )
    .await?;
    conn.wait_for_event("connected", Duration::from_secs(5)).await?;

    println!(
        "{} Waiting up to {:?} for the first reading...",
        "→".blue(),
        wait
    );

    let event = match conn.next_event(wait).await {
        Ok(event) => event,
        Err(e) => {
            println!("{} No reading: {}", "✗".red(), e);
            return Ok(TestResult::fail(scenario, e.to_string(), start.elapsed()));
        }
    };
    print_event(&conn.label, &event);

    match event.kind.as_str() {
        "weather" if event.data["timestamp"].is_i64() && event.data["raw"].is_object() => {
            println!("{} Reading has the documented shape", "✓".green());
            Ok(TestResult::pass(scenario, None, start.elapsed()))
        }
        "error" => {
            println!("{} Server reported a poll failure", "✗".red());
            Ok(TestResult::fail(
                scenario,
                format!("{}: {}", event.data["msg"], event.data["detail"]),
                start.elapsed(),
            ))
        }
        _ => Ok(TestResult::fail(
            scenario,
            format!("Unexpected event: {}", event.data),
            start.elapsed(),
        )),
    }
}

pub async fn test_campaign(base_url: &str, wait: Duration) -> Result<TestResult> {
    let start = Instant::now();
    let scenario = "campaign_test";

    println!("\n{}", "=== TEST: Campaign Replay ===".bright_cyan().bold());

    let mut conn = Connection::establish(&campaign_url(base_url), "Campaign".to_string()).await?;
    let connected = conn.wait_for_event("connected", Duration::from_secs(5)).await?;
    print_event(&conn.label, &connected);

    println!(
        "{} Collecting messages for up to {:?}...",
        "→".blue(),
        wait
    );

    match conn.wait_for_close(wait).await {
        Some(messages) if !messages.is_empty() => {
            for message in &messages {
                print_event(&conn.label, message);
            }
            println!(
                "{} Received {} messages before the server closed the stream",
                "✓".green(),
                messages.len()
            );
            Ok(TestResult::pass(
                scenario,
                Some(format!("{} messages, finite replay", messages.len())),
                start.elapsed(),
            ))
        }
        Some(_) => Ok(TestResult::fail(
            scenario,
            "Stream closed without any messages".to_string(),
            start.elapsed(),
        )),
        None => {
            println!(
                "{} Stream still open, assuming heartbeat mode",
                "→".blue()
            );
            Ok(TestResult::pass(
                scenario,
                Some("Stream kept alive after replay".to_string()),
                start.elapsed(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_url_carries_location_and_interval() {
        let url = weather_url(
            "http://localhost:4000/",
            Location {
                lat: 51.5,
                lon: -0.1,
            },
            15,
        );
        assert_eq!(
            url,
            "http://localhost:4000/api/stream_weather?lat=51.5&lon=-0.1&interval=15"
        );
    }

    #[test]
    fn test_campaign_url() {
        assert_eq!(
            campaign_url("http://localhost:4000"),
            "http://localhost:4000/api/stream_campaign"
        );
    }
}
