use clap::{Parser, Subcommand};
use failover_proxy::admin::StatusReport;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "balancer-cli")]
#[command(about = "Operator CLI for the failover proxy", long_about = None)]
struct Cli {
    /// Base URL of the running load balancer.
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Path of the JSON status report.
    #[arg(long, default_value = "/status.json")]
    status_path: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the raw status report
    Status,
    /// List upstream liveness as a table
    Upstreams,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let url = format!("{}{}", cli.url.trim_end_matches('/'), cli.status_path);

    let res = client.get(&url).send().await?;
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: status endpoint returned {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    match cli.command {
        Commands::Status => {
            let json: Value = res.json().await?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Commands::Upstreams => {
            let report: StatusReport = res.json().await?;
            print_table(&report);
        }
    }

    Ok(())
}

fn print_table(report: &StatusReport) {
    println!("{:<40} {:<6} {:<9} {:>10} {:>10}", "UPSTREAM", "STATE", "ELIGIBLE", "DOWN(s)", "RETRY(s)");
    for u in &report.upstreams {
        println!(
            "{:<40} {:<6} {:<9} {:>10} {:>10}",
            u.address,
            u.status,
            if u.eligible { "yes" } else { "no" },
            u.downtime_secs.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
            u.retry_in_secs.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
        );
    }
    println!(
        "\n{} of {} upstreams healthy, {} eligible (retry interval {}s)",
        report.healthy, report.total, report.eligible, report.retry_interval_secs
    );
}
