use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use boardwalk::{api, client::BoardwalkClient, db, mcp, models::Dashboard};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 17020;

#[derive(Parser)]
#[command(name = "bwk")]
#[command(about = "Project boards with checklists, activity history, sprints and analytics")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Address to bind
        #[arg(long, default_value = DEFAULT_HOST)]
        host: String,

        /// Port for HTTP API
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Start MCP server via stdio
    Mcp,
    /// Check that a server is reachable (uses BOARDWALK_URL)
    Status,
    /// List boards on a running server
    Boards,
    /// Print a board's dashboard from a running server
    Dashboard {
        /// Board UUID
        board_id: Uuid,
    },
}

/// Initialize tracing with output to stderr (for MCP mode) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "boardwalk=debug,tower_http=debug".into()),
    );

    if use_stderr {
        // stdout carries the protocol
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn serve(host: &str, port: u16) -> anyhow::Result<()> {
    let db = db::Database::open_default()?;
    db.migrate()?;

    let config = api::SecurityConfig::from_env();
    if config.api_key.is_some() {
        tracing::info!("API key authentication enabled");
    }
    if let Some(limiter) = &config.rate_limiter {
        limiter.spawn_cleanup();
    }

    let app = api::create_router_with_config(db, config);

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    tracing::info!("Boardwalk listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;
    Ok(())
}

fn print_dashboard(dashboard: &Dashboard) {
    let stats = &dashboard.stats;
    println!("{} (as of {})", dashboard.board.name, stats.as_of);
    println!(
        "  cards: {} total, {} done ({:.0}%), {} overdue",
        stats.total_cards,
        stats.completed_cards,
        stats.completion_rate * 100.0,
        stats.overdue_cards
    );
    println!(
        "  points: {}/{}  checklist: {}/{}  time logged: {}m",
        stats.completed_story_points,
        stats.total_story_points,
        stats.checklist_completed,
        stats.checklist_total,
        stats.minutes_logged
    );
    for s in &stats.by_status {
        println!("    {:<12} {:>4}", s.status.as_str(), s.count);
    }

    println!("  weekly:");
    for bucket in &dashboard.weekly {
        println!(
            "    {}  +{} created  {} done  {}m",
            bucket.period_start, bucket.created, bucket.completed, bucket.minutes_logged
        );
    }

    if let Some(sprint) = &dashboard.active_sprint {
        let remaining = sprint
            .days
            .iter()
            .rev()
            .find_map(|d| d.remaining_points)
            .unwrap_or(sprint.total_points);
        println!(
            "  active sprint {}..{}: {} of {} points remaining",
            sprint.start_date, sprint.end_date, remaining, sprint.total_points
        );
    }

    if !dashboard.due_soon.is_empty() {
        println!("  due soon:");
        for card in &dashboard.due_soon {
            if let Some(due) = card.due_date {
                println!("    {}  {}", due, card.title);
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let use_stderr = matches!(cli.command, Some(Commands::Mcp));
    init_tracing(use_stderr);

    match cli.command {
        Some(Commands::Serve { host, port }) => serve(&host, port).await?,
        None => serve(DEFAULT_HOST, DEFAULT_PORT).await?,
        Some(Commands::Mcp) => {
            let db = db::Database::open_default()?;
            db.migrate()?;

            mcp::run_stdio_server(db).await?;
        }
        Some(Commands::Status) => {
            let client = BoardwalkClient::from_env();
            match client.health().await {
                Ok(_) => println!("Boardwalk is running at {}", client.base_url()),
                Err(e) => {
                    eprintln!("Boardwalk is not reachable at {}: {}", client.base_url(), e);
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Boards) => {
            let boards = BoardwalkClient::from_env().list_boards().await?;
            if boards.is_empty() {
                println!("No boards");
            }
            for board in boards {
                println!("{}  {}", board.id, board.name);
            }
        }
        Some(Commands::Dashboard { board_id }) => {
            let dashboard = BoardwalkClient::from_env().dashboard(board_id).await?;
            print_dashboard(&dashboard);
        }
    }

    Ok(())
}
