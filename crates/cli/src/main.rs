//! `automon-cli` -- interactive client for `automon-daemon`.
//!
//! Reads the status device, injects workload values through the device or
//! the `current_workload` attribute, and reads the remaining attributes.
//!
//! # Environment variables
//!
//! | Variable      | Required | Default                 | Description      |
//! |---------------|----------|-------------------------|------------------|
//! | `AUTOMON_URL` | no       | `http://127.0.0.1:7070` | Daemon base URL  |

mod client;
mod menu;

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use client::MonitorClient;
use menu::{parse_choice, parse_level, Choice, MENU};

const DEFAULT_URL: &str = "http://127.0.0.1:7070";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "automon_cli=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let url = std::env::var("AUTOMON_URL").unwrap_or_else(|_| DEFAULT_URL.into());
    tracing::debug!(url = %url, "Using daemon");
    let client = MonitorClient::new(url);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt(MENU)?;
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        let Some(choice) = parse_choice(&line) else {
            println!("Invalid choice. Please enter a number from the menu.");
            continue;
        };

        let outcome = match choice {
            Choice::Exit => {
                println!("Exiting.");
                return Ok(());
            }
            Choice::ReadDevice => client
                .read_device()
                .await
                .map(|text| print!("\n--- Device Status ---\n{text}")),
            Choice::InjectViaDevice => match read_level(&mut lines).await? {
                Some(level) => client
                    .write_device(&level.to_string())
                    .await
                    .map(|()| println!("Workload {level} injected via the device.")),
                None => Ok(()),
            },
            Choice::ReadWorkload => show_attribute(&client, "current_workload").await,
            Choice::InjectViaAttribute => match read_level(&mut lines).await? {
                Some(level) => client
                    .write_attribute("current_workload", &level.to_string())
                    .await
                    .map(|()| println!("Workload {level} injected via the attribute.")),
                None => Ok(()),
            },
            Choice::ReadResourceFactor => show_attribute(&client, "resource_factor").await,
            Choice::ReadCriticalAlerts => show_attribute(&client, "critical_alerts").await,
            Choice::ViewLogs => client.recent_logs().await.map(|lines| {
                println!("\n--- Daemon Logs ---");
                for line in lines {
                    println!("{line}");
                }
            }),
        };

        if let Err(e) = outcome {
            tracing::error!(error = %e, "Request failed");
            println!("Error: {e:#}");
        }
    }
}

fn prompt(text: &str) -> std::io::Result<()> {
    print!("{text}");
    std::io::stdout().flush()
}

/// Ask for a workload; `None` when the input was rejected or stdin closed.
async fn read_level(lines: &mut Lines<BufReader<Stdin>>) -> anyhow::Result<Option<u64>> {
    prompt("Enter simulated workload (0-100): ")?;
    let Some(line) = lines.next_line().await? else {
        return Ok(None);
    };
    match parse_level(&line) {
        Ok(level) => Ok(Some(level)),
        Err(msg) => {
            println!("{msg}");
            Ok(None)
        }
    }
}

async fn show_attribute(client: &MonitorClient, name: &str) -> anyhow::Result<()> {
    let value = client.read_attribute(name).await?;
    print!("\n{name}: {value}");
    Ok(())
}
