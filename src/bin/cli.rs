//! Place Explorer CLI
//!
//! Interactive explorer plus one-shot commands for progress, reviews and the
//! leaderboard. `--offline` swaps the remote API for a local catalog file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use explorer::{
    engine::{Direction, Event, ExploreContext, ExploreView, Explorer, VisitedSet, progress},
    error::{AppError, Result},
    map::{HeadlessSurface, MapSync},
    models::{Config, Profile, ReviewDraft, Session, UserId},
    notify::LogSpeaker,
    runtime::Runtime,
    services::{
        ApiClient, CatalogSource, CommunityClient, HttpCatalog, HttpLedger, MemoryCatalog,
        MemoryLedger, VisitLedger,
    },
};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Place Explorer - search places, mark visits, level up
#[derive(Parser, Debug)]
#[command(name = "explorer", version, about = "Place exploration client")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "explorer.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Sign in with this username
    #[arg(short, long, conflicts_with = "guest")]
    user: Option<String>,

    /// Continue as a guest
    #[arg(long)]
    guest: bool,

    /// Use a local catalog JSON file instead of the remote API
    #[arg(long, value_name = "CATALOG")]
    offline: Option<PathBuf>,

    /// Seed for spin, for reproducible sessions
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive explorer reading commands from stdin
    Explore,

    /// Show XP, level and milestones
    Progress {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the traveler leaderboard
    Leaderboard,

    /// List reviews for a place
    Reviews { place: String },

    /// Leave a review for a place
    Review {
        place: String,

        /// Rating from 1 to 5
        #[arg(short, long, default_value_t = 5)]
        rating: u8,

        comment: String,
    },

    /// Start a session (guest unless --user is given) and print it
    Login,

    /// Update the signed-in user's profile
    Profile {
        username: String,

        #[arg(long, default_value = "")]
        email: String,

        #[arg(long, default_value = "")]
        bio: String,

        /// Profile picture URL
        #[arg(long, default_value = "")]
        picture: String,
    },

    /// Delete the signed-in user's account
    DeleteAccount {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Validate the configuration file
    Validate,

    /// Print the effective configuration as TOML
    Config,
}

/// Initialize logging based on verbosity flag and configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Remote or offline collaborators plus the resolved user.
struct Backend {
    catalog: Arc<dyn CatalogSource>,
    ledger: Arc<dyn VisitLedger>,
    community: Option<CommunityClient>,
    session: Option<Session>,
    user: Option<UserId>,
}

impl Backend {
    async fn connect(cli: &Cli, config: &Config) -> Result<Self> {
        if let Some(path) = &cli.offline {
            return Self::offline(cli, path).await;
        }

        let api = Arc::new(ApiClient::new(&config.api)?);
        let community = CommunityClient::new(Arc::clone(&api));
        let session = if cli.user.is_some() || cli.guest {
            Some(community.login(cli.user.as_deref()).await?)
        } else {
            None
        };

        Ok(Self {
            catalog: Arc::new(HttpCatalog::new(Arc::clone(&api))),
            ledger: Arc::new(HttpLedger::new(api)),
            community: Some(community),
            user: session.as_ref().map(|s| s.id.clone()),
            session,
        })
    }

    async fn offline(cli: &Cli, path: &Path) -> Result<Self> {
        let catalog = MemoryCatalog::from_json_file(path).await?;
        let user = match (&cli.user, cli.guest) {
            (Some(name), _) => UserId::new(name.as_str()),
            (None, true) => UserId::new("guest"),
            (None, false) => None,
        };
        log::info!("Offline mode: catalog from {}", path.display());

        Ok(Self {
            catalog: Arc::new(catalog),
            ledger: Arc::new(MemoryLedger::new()),
            community: None,
            session: None,
            user,
        })
    }

    fn community(&self) -> Result<&CommunityClient> {
        self.community
            .as_ref()
            .ok_or_else(|| AppError::config("Not available in offline mode"))
    }

    fn user(&self) -> Result<&UserId> {
        self.user.as_ref().ok_or(AppError::IdentityRequired)
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_found = cli.config.exists();
    let config = if config_found {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };
    init_logging(cli.verbose, &config.logging.level);

    if config_found {
        log::info!("Loaded configuration from {}", cli.config.display());
    } else {
        log::info!("No config at {}, using defaults", cli.config.display());
    }

    match &cli.command {
        Command::Validate => {
            config.validate()?;
            println!("Configuration OK");
            return Ok(());
        }
        Command::Config => {
            print!("{}", config.to_toml()?);
            return Ok(());
        }
        _ => config.validate()?,
    }

    let backend = Backend::connect(&cli, &config).await?;

    match &cli.command {
        Command::Explore => explore(&cli, &config, backend).await?,

        Command::Progress { json } => {
            let records = backend.ledger.fetch_visits(backend.user()?).await?;
            let mut visited = VisitedSet::new();
            visited.replace_from_records(&records);

            let progress = progress::compute(visited.len());
            let milestones = progress::milestone_chips(visited.len());
            if *json {
                let out = serde_json::json!({ "progress": progress, "milestones": milestones });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!(
                    "Level {} | {} XP | {}% to {} XP | {} places",
                    progress.level,
                    progress.points,
                    progress.progress_percent,
                    progress.next_cap,
                    progress.visits
                );
                let chips: Vec<_> = milestones
                    .iter()
                    .map(|m| format!("{}{}", m.threshold, if m.unlocked { "*" } else { "" }))
                    .collect();
                println!("Milestones: {}", chips.join(" "));
            }
        }

        Command::Leaderboard => {
            let entries = backend.community()?.leaderboard().await?;
            for (rank, entry) in entries.iter().enumerate() {
                let visits = entry.visits.map(|v| format!(" | {} places", v)).unwrap_or_default();
                let rating = entry
                    .avg_rating
                    .map(|r| format!(" | avg {:.1}", r))
                    .unwrap_or_default();
                println!(
                    "{:>3}. {} | Level {} | {} XP{}{}",
                    rank + 1,
                    entry.username,
                    entry.level,
                    entry.points,
                    visits,
                    rating
                );
            }
        }

        Command::Reviews { place } => {
            let reviews = backend.community()?.reviews(place).await?;
            if reviews.is_empty() {
                println!("No reviews for {} yet", place);
            }
            for review in reviews {
                println!("{} ({}/5): {}", review.user, review.rating, review.comment);
            }
        }

        Command::Review {
            place,
            rating,
            comment,
        } => {
            let draft = ReviewDraft {
                rating: *rating,
                comment: comment.clone(),
            };
            let community = backend.community()?;
            match community
                .submit_review(backend.user.as_ref(), place, &draft)
                .await?
            {
                Some(review) => println!("Posted review of {} ({}/5)", place, review.rating),
                None => println!("Review submitted for {}", place),
            }
        }

        Command::Login => {
            let session = match &backend.session {
                Some(session) => session.clone(),
                None => backend.community()?.login(None).await?,
            };
            println!("{}", serde_json::to_string_pretty(&session)?);
        }

        Command::Profile {
            username,
            email,
            bio,
            picture,
        } => {
            let profile = Profile {
                username: username.clone(),
                email: email.clone(),
                bio: bio.clone(),
                profile_pic: picture.clone(),
            };
            let saved = backend
                .community()?
                .update_profile(backend.user.as_ref(), &profile)
                .await?;
            println!("{}", serde_json::to_string_pretty(&saved)?);
        }

        Command::DeleteAccount { yes } => {
            if !*yes {
                return Err(AppError::validation("Pass --yes to delete the account"));
            }
            backend.community()?.delete_user(backend.user.as_ref()).await?;
            println!("Account deleted");
        }

        Command::Validate | Command::Config => {}
    }

    Ok(())
}

/// Interactive loop: stdin commands and async completions share one task.
async fn explore(cli: &Cli, config: &Config, backend: Backend) -> Result<()> {
    let mut ctx = ExploreContext::from_config(config, backend.user.clone());
    ctx.seed = cli.seed;

    let map = MapSync::new(HeadlessSurface::new(), config.map.clone());
    let mut runtime = Runtime::new(
        Explorer::new(ctx),
        map,
        backend.catalog,
        backend.ledger,
        Box::new(LogSpeaker),
    );
    let mut signals = runtime.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_help();
    runtime.mount();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Input::Quit => break,
                    Input::Help => print_help(),
                    Input::Show => render(&runtime.view()),
                    Input::Click(index) => {
                        if !runtime.activate_marker(index) {
                            println!("No marker {}", index);
                        }
                        render(&runtime.view());
                    }
                    Input::Event(event) => {
                        runtime.dispatch(event);
                        render(&runtime.view());
                    }
                    Input::Unknown(text) => println!("Unknown command: {} (try 'help')", text),
                }
            }
            Some(event) = runtime.next_event(), if runtime.has_pending() => {
                let redraw = !matches!(event, Event::ToastExpired(_));
                runtime.dispatch(event);
                if redraw && !runtime.has_pending() {
                    render(&runtime.view());
                }
            }
            Ok(signal) = signals.recv() => {
                log::info!("Visit signal: {}", serde_json::to_string(&signal)?);
            }
        }
    }

    runtime.teardown();
    Ok(())
}

enum Input {
    Event(Event),
    Click(usize),
    Show,
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Input {
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    match word {
        "" | "show" | "ls" => Input::Show,
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        "search" | "/" => Input::Event(Event::QueryChanged(rest.to_string())),
        "clear" => Input::Event(Event::QueryChanged(String::new())),
        "left" | "h" => Input::Event(Event::SelectionMoved(Direction::Left)),
        "right" | "l" => Input::Event(Event::SelectionMoved(Direction::Right)),
        "up" | "k" => Input::Event(Event::SelectionMoved(Direction::Up)),
        "down" | "j" => Input::Event(Event::SelectionMoved(Direction::Down)),
        "spin" => Input::Event(Event::SpinRequested),
        "refresh" => Input::Event(Event::RefreshRequested),
        "mark" if rest.is_empty() => Input::Event(Event::ToggleActive),
        "mark" => Input::Event(Event::ToggleRequested(rest.to_string())),
        "jump" => match rest.parse() {
            Ok(index) => Input::Event(Event::SelectionJumped(index)),
            Err(_) => Input::Unknown(line.to_string()),
        },
        "click" => match rest.parse() {
            Ok(index) => Input::Click(index),
            Err(_) => Input::Unknown(line.to_string()),
        },
        _ => Input::Unknown(line.to_string()),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  search <text> | clear        filter places");
    println!("  left/right/up/down (h/l/k/j) move the cursor");
    println!("  jump <n> | click <n>         select row / click marker");
    println!("  mark [name]                  toggle visited");
    println!("  spin | refresh | show | quit");
}

fn render(view: &ExploreView) {
    let p = &view.progress;
    println!();
    println!(
        "Level {} | {} XP | {}% to {} XP{}",
        p.level,
        p.points,
        p.progress_percent,
        p.next_cap,
        if view.loading { " | loading..." } else { "" }
    );
    if !view.query.is_empty() {
        println!("Search: {:?} ({} matches)", view.query, view.rows.len());
    }
    for (i, row) in view.rows.iter().enumerate() {
        let cursor = if row.active { '>' } else { ' ' };
        let mark = if row.pending {
            '~'
        } else if row.visited {
            '*'
        } else {
            ' '
        };
        println!(
            "{} {:>3} [{}] {} ({})  A{} S{} T{}",
            cursor, i, mark, row.name, row.country, row.adventure, row.study, row.travel
        );
    }
    if view.rows.is_empty() && view.ready {
        println!("  No places match.");
    }
    if let Some(toast) = &view.toast {
        println!(":: {}", toast);
    }
    if let Some(error) = &view.error {
        println!("!! {}", error);
    }
    if let Some(error) = &view.visits_error {
        println!("!! visits: {}", error);
    }
}
