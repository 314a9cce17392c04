//! A terminal client for AI contract review.
//!
//! Run the binary to launch the interactive TUI.  Subcommands (`login`,
//! `list`, `explain`, ...) talk to the service once and exit.

mod api;
mod app;
mod config;
mod core;
mod store;
mod ui;

use std::fs::File;
use std::io::{self, stderr, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use crate::api::client::Page;
use crate::api::ApiClient;
use crate::app::{
    api_runtime::{self, ApiUpdate},
    event::{spawn_event_reader, AppEvent},
    handler,
    reveal::{Applied, Revealer, EXPLAIN_FAILED},
    route::Route,
    state::{AppState, Command},
};
use crate::config::AppConfig;
use crate::core::checklist::parse_checklist;
use crate::core::clause::{build_clause_rows, RiskBand};
use crate::core::model::{
    ContractIndustry, ContractJurisdiction, ContractType, RegisterRequest, ReviewRequest,
};
use crate::store::{AuthStore, FileStore, KeyValueStore};

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), about = "Terminal client for AI contract review")]
struct Cli {
    /// Service root (without `/v1`).  Overrides the config file.
    #[arg(long, env = "JURIS_ENDPOINT", global = true)]
    endpoint: Option<String>,

    /// Page to open, e.g. `/dashboard/contract/<id>/review`.
    #[arg(long)]
    route: Option<String>,

    /// Write TUI logs here (filtered by `RUST_LOG`).
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Log in and remember the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "JURIS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account.
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "JURIS_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Forget the stored session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// List uploaded contracts.
    List {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Upload a PDF contract.
    Upload {
        path: PathBuf,
        #[arg(long)]
        title: Option<String>,
    },
    /// Run the AI review of a contract.
    Review {
        id: String,
        #[arg(long)]
        jurisdiction: Option<String>,
        #[arg(long)]
        industry: Option<String>,
        #[arg(long)]
        contract_type: Option<String>,
    },
    /// Explain one clause, revealed as it arrives.
    Explain { id: String, clause_key: String },
    /// Print a reviewed contract's summary checklist.
    Checklist { id: String },
}

// ───────────────────────────────────────── setup ─────────────

fn init_tracing(log_file: Option<&PathBuf>, interactive: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    match (interactive, log_file) {
        // The TUI owns the terminal: log to a file or not at all.
        (true, Some(path)) => {
            let file = File::create(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        (true, None) => {}
        (false, _) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

fn parse_wire<T>(parse: fn(&str) -> Option<T>, value: Option<&str>, what: &str) -> Result<T>
where
    T: Default,
{
    match value {
        None => Ok(T::default()),
        Some(raw) => parse(raw).ok_or_else(|| anyhow!("unknown {what} `{raw}`")),
    }
}

// ───────────────────────────────────────── subcommands ───────

async fn run_command(cmd: Cmd, api: &ApiClient, config: &AppConfig) -> Result<()> {
    match cmd {
        Cmd::Login { email, password } => {
            let user = api.user().sign_in(&email, &password).await?;
            println!("Logged in as {} <{}>", user.display_name(), user.email);
        }
        Cmd::Register {
            email,
            password,
            first_name,
            last_name,
        } => {
            let payload = RegisterRequest {
                email,
                password,
                first_name,
                last_name,
            };
            let user = api.user().register(&payload).await?;
            println!("Registered {}. Log in with `juris login --email {}`.", user.email, user.email);
        }
        Cmd::Logout => {
            api.auth().clear()?;
            println!("Logged out");
        }
        Cmd::Whoami => {
            if !api.auth().is_authenticated() {
                bail!("not logged in");
            }
            let user = api.user().current().await?;
            api.auth().set_user(user.clone())?;
            println!("{} <{}>", user.display_name(), user.email);
            if let Some(id) = &user.id {
                println!("id: {id}");
            }
        }
        Cmd::List { page, limit } => {
            let page = page.zip(limit).map(|(page, limit)| Page { page, limit });
            let contracts = api.contract().list(page).await?;
            if contracts.is_empty() {
                println!("No contracts.");
            }
            for c in contracts {
                let pages = c.pages.map(|p| p.to_string()).unwrap_or_else(|| "-".into());
                let reviewed = if c.has_review { "reviewed" } else { "not reviewed" };
                println!("{}  {:<40} {:>4}p  {}", c.id, c.title, pages, reviewed);
            }
        }
        Cmd::Upload { path, title } => {
            let title = title.unwrap_or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
            let contract = api.contract().upload(&path, &title).await?;
            println!("Uploaded \"{}\" as {}", contract.title, contract.id);
        }
        Cmd::Review {
            id,
            jurisdiction,
            industry,
            contract_type,
        } => {
            let request = ReviewRequest {
                jurisdiction: parse_wire(
                    ContractJurisdiction::parse,
                    jurisdiction.as_deref(),
                    "jurisdiction",
                )?,
                industry: parse_wire(ContractIndustry::parse, industry.as_deref(), "industry")?,
                contract_type: parse_wire(
                    ContractType::parse,
                    contract_type.as_deref(),
                    "contract type",
                )?,
            };
            eprintln!("Reviewing {id}, this can take a while…");
            let data = api.contract().review(&id, &request).await?;
            let rows = build_clause_rows(&data);
            let risky: Vec<_> = rows.iter().filter(|r| r.risk.is_some()).collect();
            println!(
                "{}: {} clauses, {} flagged",
                data.contract.title,
                rows.len(),
                risky.len()
            );
            for row in risky {
                if let (Some(band), Some(risk)) = (row.band(), &row.risk) {
                    println!("  [{}] clause {} · {}", band.label(), row.number, risk.risk_type);
                    println!("      {}", risk.concerns);
                }
            }
        }
        Cmd::Explain { id, clause_key } => {
            let data = api.contract().get_review(&id).await?;
            let row = build_clause_rows(&data)
                .into_iter()
                .find(|r| r.key == clause_key)
                .ok_or_else(|| anyhow!("no clause `{clause_key}` in contract {id}"))?;
            if let Some(risk) = &row.risk {
                let band = RiskBand::from_level(risk.risk_level);
                eprintln!("Clause {} ({} risk)", row.number, band.label());
            }
            explain_to_stdout(api, config, id, row.content).await?;
        }
        Cmd::Checklist { id } => {
            let data = api.contract().get_review(&id).await?;
            let text = data
                .review
                .and_then(|r| r.summary_checklist)
                .ok_or_else(|| anyhow!("contract {id} has no checklist yet"))?;
            let checklist = parse_checklist(&text);
            if !checklist.heading.is_empty() {
                println!("{}\n", checklist.heading);
            }
            for item in &checklist.items {
                println!("[ ] {}", item.title);
                println!("    {}\n", item.description);
            }
            if !checklist.footer.is_empty() {
                println!("{}", checklist.footer);
            }
        }
    }
    Ok(())
}

/// Drive a [`Revealer`] to completion, echoing each character as it lands.
async fn explain_to_stdout(
    api: &ApiClient,
    config: &AppConfig,
    contract_id: String,
    clause: String,
) -> Result<()> {
    let (mut revealer, mut rx) = Revealer::new(config.cadence());
    revealer.start_stream(api_runtime::explain_chunks(
        api.clone(),
        contract_id,
        clause,
        config.transport,
    ));

    let mut out = io::stdout();
    let mut printed = 0;
    while let Some(update) = rx.recv().await {
        match revealer.apply(update) {
            Applied::Stale => {}
            Applied::Progress => {
                let revealed = revealer.revealed();
                out.write_all(revealed[printed..].as_bytes())?;
                out.flush()?;
                printed = revealed.len();
            }
            Applied::Finished => {
                writeln!(out)?;
                return Ok(());
            }
            Applied::Failed(message) => {
                writeln!(out)?;
                bail!("{EXPLAIN_FAILED} ({message})");
            }
        }
    }
    Ok(())
}

// ───────────────────────────────────────── TUI ───────────────

/// Fetch the data for the current route, tagged with a fresh generation.
fn start_page_load(state: &mut AppState, api: &ApiClient, tx: &mpsc::UnboundedSender<ApiUpdate>) {
    let route = state.route().clone();
    if !route.is_private() {
        return;
    }
    let generation = state.begin_load();
    tracing::debug!(route = %route.path(), generation, "page load");
    match route {
        Route::Contracts => api_runtime::spawn_contract_list(tx.clone(), api.clone(), generation, state.page),
        Route::Review { contract_id } => {
            api_runtime::spawn_review_load(tx.clone(), api.clone(), generation, contract_id)
        }
        Route::Analytics => api_runtime::spawn_analytics(tx.clone(), api.clone(), generation),
        Route::Profile => api_runtime::spawn_current_user(tx.clone(), api.clone()),
        Route::Login | Route::Register => {}
    }
}

/// Execute whatever the input handler queued.
fn run_commands(state: &mut AppState, api: &ApiClient, tx: &mpsc::UnboundedSender<ApiUpdate>) {
    for command in std::mem::take(&mut state.commands) {
        match command {
            Command::SignIn { email, password } => {
                api_runtime::spawn_sign_in(tx.clone(), api.clone(), email, password)
            }
            Command::Register(payload) => api_runtime::spawn_register(tx.clone(), api.clone(), payload),
            Command::RunReview { contract_id, request } => {
                api_runtime::spawn_review_run(tx.clone(), api.clone(), contract_id, request)
            }
            Command::Upload { path, title } => api_runtime::spawn_upload(tx.clone(), api.clone(), path, title),
            Command::Explain { contract_id, clause } => {
                let chunks = api_runtime::explain_chunks(
                    api.clone(),
                    contract_id,
                    clause,
                    state.config.transport,
                );
                state.revealer.start_stream(chunks);
            }
        }
    }
}

async fn run_tui(cli: &Cli, api: ApiClient, config: AppConfig) -> Result<()> {
    let start = match cli.route.as_deref() {
        Some(path) => Route::parse(path).ok_or_else(|| anyhow!("unknown route `{path}`"))?,
        None => Route::Contracts,
    };

    let auth = api.auth().clone();
    let mut auth_rx = auth.subscribe();
    let (revealer, mut reveal_rx) = Revealer::new(config.cadence());
    let mut state = AppState::new(start, config, auth, revealer);
    let (api_tx, mut api_rx) = mpsc::unbounded_channel::<ApiUpdate>();

    // ── terminal setup ────────────────────────────────────────
    enable_raw_mode()?;
    let mut stderr_handle = stderr();
    execute!(
        stderr_handle,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let backend = CrosstermBackend::new(stderr());
    let mut terminal = Terminal::new(backend)?;

    let mut events = spawn_event_reader(Duration::from_millis(100));

    // ── event loop ────────────────────────────────────────────
    let result: Result<()> = async {
        loop {
            if state.nav.take_pending_load() {
                start_page_load(&mut state, &api, &api_tx);
            }
            run_commands(&mut state, &api, &api_tx);

            terminal.draw(|frame| ui::draw(frame, &mut state))?;

            tokio::select! {
                Some(event) = events.recv() => match event {
                    AppEvent::Key(k) => handler::handle_key(&mut state, k),
                    AppEvent::Mouse(m) => handler::handle_mouse(&mut state, m),
                    AppEvent::Paste(text) => handler::handle_paste(&mut state, &text),
                    AppEvent::Resize(_, _) => {}
                    AppEvent::Tick => {
                        state.tick = state.tick.wrapping_add(1);
                        state.expire_toasts(Instant::now());
                    }
                },

                Some(update) = api_rx.recv() => {
                    state.apply_api_update(update);
                    while let Ok(update) = api_rx.try_recv() {
                        state.apply_api_update(update);
                    }
                }

                // Batch every character already due so a fast cadence does
                // not cost one frame per character.
                Some(update) = reveal_rx.recv() => {
                    state.apply_reveal_update(update);
                    while let Ok(update) = reveal_rx.try_recv() {
                        state.apply_reveal_update(update);
                    }
                }

                Ok(()) = auth_rx.changed() => state.resolve_route(),
            }

            if state.should_quit {
                return Ok(());
            }
        }
    }
    .await;

    // ── teardown ──────────────────────────────────────────────
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    result
}

// ───────────────────────────────────────── main ─────────────

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();
    init_tracing(cli.log_file.as_ref(), cli.command.is_none())?;

    let mut config = AppConfig::load();
    if let Some(endpoint) = cli.endpoint.take() {
        config.endpoint = endpoint;
    }

    let kv: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(FileStore::default_dir()));
    let auth = AuthStore::load(kv);
    let api = ApiClient::new(&config.endpoint, auth)?;
    tracing::info!(endpoint = %config.endpoint, "client ready");

    match cli.command.take() {
        Some(cmd) => run_command(cmd, &api, &config).await,
        None => run_tui(&cli, api, config).await,
    }
}
