use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use shared::{wizard, ArxivClient, ConfigStore, Credentials, CycleOutcome, Mailer};
use std::io as stdio;
use std::path::PathBuf;
use std::time::Duration;

// Startup-mode connectivity wait: a fixed grace period, then bounded
// fixed-interval probes before giving up.
const STARTUP_GRACE: Duration = Duration::from_secs(20);
const PROBE_INTERVAL: Duration = Duration::from_secs(10);
const MAX_PROBES: u32 = 20;

#[derive(Parser)]
#[command(name = "arxiv-scan")]
#[command(about = "Scan arXiv for new papers matching your interests and email a digest")]
struct Args {
    /// Path to the config file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Enter interactive interest entry before querying
    #[arg(long)]
    interests: bool,

    /// Wait for network availability before querying (for boot-time runs)
    #[arg(long = "on_startup")]
    on_startup: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.on_startup && args.interests {
        anyhow::bail!("--on_startup cannot be combined with --interests");
    }

    // Credentials come first: a missing variable must fail before any
    // network or config-file access.
    let credentials = Credentials::from_env()?;

    let mut store = ConfigStore::load(&args.config)?;

    if store.is_first_run() {
        if args.on_startup {
            anyhow::bail!("--on_startup cannot be combined with first-run setup");
        }
        let stdin = stdio::stdin();
        let answers = wizard::run_setup(&mut stdin.lock(), &mut stdio::stdout())?;
        let email = answers
            .email
            .unwrap_or_else(|| credentials.email.clone());
        store.register_personal_details(
            answers.name,
            email,
            answers.notification_schedule,
            answers.email_title,
        );
        for filter in answers.interests {
            store.register_interest(filter);
        }
    } else if args.interests {
        let stdin = stdio::stdin();
        wizard::run_interest_session(&mut stdin.lock(), &mut stdio::stdout(), &mut store)?;
    }

    // Persist setup changes now so a later delivery failure cannot lose
    // freshly entered interests.
    store.save_if_dirty()?;

    let client = ArxivClient::new()?;
    if args.on_startup {
        wait_for_network(&client).await?;
    }

    let mailer = Mailer::new(&credentials)?;
    match shared::run_query_cycle(&client, &mailer, &mut store, Utc::now()).await? {
        CycleOutcome::NotDue => println!("Not time to update yet!"),
        CycleOutcome::NoNewPapers => println!("No new papers in this window."),
        CycleOutcome::Delivered { papers } => {
            println!("✓ Sent {} papers to {}", papers, store.config().email);
        }
    }

    Ok(())
}

async fn wait_for_network(client: &ArxivClient) -> Result<()> {
    println!("Waiting for network...");
    tokio::time::sleep(STARTUP_GRACE).await;

    for _ in 0..MAX_PROBES {
        if client.probe().await {
            println!("✓ Network is up");
            return Ok(());
        }
        tokio::time::sleep(PROBE_INTERVAL).await;
    }

    anyhow::bail!(
        "Network did not come up after {} probes; giving up.",
        MAX_PROBES
    );
}
