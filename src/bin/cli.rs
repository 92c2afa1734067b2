//! Reject CLI
//!
//! Command-line interface for Reject operations:
//! - Estimate structure ages offline from a CSV
//! - Query a running server (age, lookup)
//! - Reload the server's age index
//! - Inspect a database schema
//! - Generate a config file

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use reject::age::{loader, parse_structure_id};
use reject::api::dto::AgeResponse;
use reject::store::{format_isk_short, SystemStore};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reject-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator tool for the Reject ransom service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:4000", global = true)]
    pub api_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Estimate ages offline from a first-seen CSV
    Estimate {
        /// Path to the CSV (structure_id,first_seen)
        csv: PathBuf,
        /// Structure IDs to estimate
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Ask the server for a structure's age
    Age {
        /// Structure ID
        id: String,
    },

    /// Show the ransom notice for a system
    Lookup {
        /// J-code, e.g. J123456
        jcode: String,
    },

    /// Reload the server's age index
    Reload {
        /// Admin user
        #[arg(long, env = "ADMIN_USER")]
        user: String,
        /// Admin password
        #[arg(long, env = "ADMIN_PASS")]
        pass: String,
    },

    /// Report on a local database's schema
    Schema {
        /// Path to the SQLite database
        #[arg(long)]
        db: PathBuf,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let json_output = cli.format == "json";

    match cli.command {
        Commands::Estimate { csv, ids } => {
            let (index, stats) =
                loader::load_path(&csv).with_context(|| format!("reading {:?}", csv))?;

            if !json_output {
                println!(
                    "Loaded {} entries ({} skipped) from {:?}",
                    index.len(),
                    stats.skipped,
                    csv
                );
                println!();
            }

            let mut results = Vec::new();
            for raw in &ids {
                let response = parse_structure_id(raw)
                    .ok()
                    .and_then(|id| index.estimate(id))
                    .and_then(|est| AgeResponse::from_estimate(raw.trim(), &est));

                match response {
                    Some(r) => results.push(serde_json::to_value(r)?),
                    None => results.push(serde_json::json!({ "id": raw, "error": "not estimable" })),
                }
            }

            if json_output {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print_age_table(&results);
            }
        }

        Commands::Age { id } => {
            let response = client
                .get(format!("{}/api/age/{}", cli.api_url, id.trim()))
                .send()
                .await
                .with_context(|| format!("cannot reach {}", cli.api_url))?;

            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                bail!("Age query failed ({}): {}", status, text);
            }

            let data: serde_json::Value = response.json().await?;
            if json_output {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                print_age_table(&[data]);
            }
        }

        Commands::Lookup { jcode } => {
            let response = client
                .get(format!("{}/api/lookup/{}", cli.api_url, jcode.trim()))
                .send()
                .await
                .with_context(|| format!("cannot reach {}", cli.api_url))?;

            if response.status() == reqwest::StatusCode::NOT_FOUND {
                println!("No notice for {}", jcode.to_uppercase());
                return Ok(());
            }
            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                bail!("Lookup failed ({}): {}", status, text);
            }

            let data: serde_json::Value = response.json().await?;
            if json_output {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                print_notice(&data);
            }
        }

        Commands::Reload { user, pass } => {
            let response = client
                .post(format!("{}/api/admin/age/reload", cli.api_url))
                .basic_auth(user, Some(pass))
                .send()
                .await
                .with_context(|| format!("cannot reach {}", cli.api_url))?;

            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                bail!("Reload failed ({}): {}", status, text);
            }

            let report: serde_json::Value = response.json().await?;
            if json_output {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "Reloaded {} rows ({} skipped) from {}",
                    report["rows"].as_u64().unwrap_or(0),
                    report["skipped"].as_u64().unwrap_or(0),
                    report["source"].as_str().unwrap_or("-")
                );
            }
        }

        Commands::Schema { db } => {
            if !db.exists() {
                bail!("Database not found: {:?}", db);
            }

            let store = SystemStore::open(&db, false)?;
            let report = store.inspect()?;

            if json_output {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Schema: {}", if report.ok { "ok" } else { "incomplete" });
                println!("Tables: {}", report.present_tables.join(", "));
                if !report.missing_tables.is_empty() {
                    println!("Missing tables: {}", report.missing_tables.join(", "));
                }
                for (table, columns) in &report.missing_columns {
                    println!("Missing columns in {}: {}", table, columns.join(", "));
                }
            }
        }

        Commands::Config { output } => {
            let config = reject::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

fn print_age_table(rows: &[serde_json::Value]) {
    println!(
        "{:<16} {:<18} {:<26} {:<26} {:<26} {}",
        "ID", "Method", "Mid", "Low", "High", "Days"
    );
    println!("{}", "-".repeat(122));

    for row in rows {
        let id = row["id"].as_str().unwrap_or("-");
        if let Some(err) = row["error"].as_str() {
            println!("{:<16} {}", id, err);
            continue;
        }
        println!(
            "{:<16} {:<18} {:<26} {:<26} {:<26} {}",
            id,
            row["method"].as_str().unwrap_or("-"),
            row["midISO"].as_str().unwrap_or("-"),
            row["lowISO"].as_str().unwrap_or("-"),
            row["highISO"].as_str().unwrap_or("-"),
            row["daysWide"].as_str().unwrap_or("-"),
        );
    }
}

fn print_notice(data: &serde_json::Value) {
    let isk = |key: &str| {
        data[key]
            .as_i64()
            .map(format_isk_short)
            .unwrap_or_else(|| "-".to_string())
    };

    println!("{}", data["jcode"].as_str().unwrap_or("-"));
    println!("  Ransom:      {} ISK", isk("ransomISK"));
    println!("  Structures:  {} ISK", isk("totalStructuresISK"));
    println!("  Contact:     {}", data["pilot"].as_str().unwrap_or("-"));
    println!(
        "  Evicted: {}  Ransomed: {}",
        data["evicted"].as_bool().unwrap_or(false),
        data["ransomed"].as_bool().unwrap_or(false)
    );
    if let Some(notes) = data["notes"].as_str().filter(|n| !n.is_empty()) {
        println!("  Notes: {}", notes);
    }

    if let Some(structures) = data["structures"].as_array() {
        for s in structures {
            println!(
                "  - {:<16} {} ISK",
                s["kind"].as_str().unwrap_or("-"),
                s["estimatedISK"]
                    .as_i64()
                    .map(format_isk_short)
                    .unwrap_or_else(|| "-".to_string())
            );
        }
    }
}
