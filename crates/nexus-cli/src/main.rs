mod config;
mod corpus;
mod daemon;
mod svg;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use nexus_core::persist::{add_saved_search, delete_saved_search, load_saved_searches};
use nexus_core::time::{parse_iso8601, to_iso8601};
use nexus_core::{
    AdvancedFilterSet, Agent, AgentDraft, AgentState, Cadence, Clock, Handle, ModeChange, Mood,
    Notification, Preset, QueryExecutor, QueryModel, QueryRequest, RangeControl, RenderMode,
    ResultRecord, ResultSet, SavedSearch, SchedulerService, SortOption, SpatialView, SystemClock,
    TimeDomain, TimeRange, Track,
};
use nexus_store::{Store, open_data_dir, resolve_base_dir};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::Config;
use crate::corpus::CorpusExecutor;
use crate::svg::SvgSurface;

#[derive(Parser)]
#[command(
    name = "nexus",
    about = "Nexus discovery engine: agents, search, timeline and spatial views"
)]
struct Cli {
    /// Data directory (default: $NEXUS_DATA_DIR, then ~/.nexus)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Corpus file queried by search, agents and render
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage background search agents
    #[command(subcommand)]
    Agent(AgentCommand),

    /// Compose filters, run them against the corpus and print ranked results
    Search {
        #[command(flatten)]
        query: QueryArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Saved search snapshots
    #[command(subcommand)]
    Saved(SavedCommand),

    /// Toggle a viewer interaction on a corpus record
    React {
        id: Uuid,
        /// like, corroborate or save
        #[arg(value_parser = parse_reaction)]
        reaction: Reaction,
    },

    /// Render the matching results to an SVG file
    Render {
        /// pins, heatmap, radar or graph
        #[arg(long, default_value = "pins", value_parser = parse_mode)]
        mode: RenderMode,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 800.0)]
        width: f64,
        #[arg(long, default_value_t = 600.0)]
        height: f64,
        /// Animated modes: frames to run before writing the last one
        #[arg(long, default_value_t = 0)]
        frames: u64,
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Run the agent scheduler until interrupted
    Daemon {
        /// Override tick_interval_secs from nexus.toml
        #[arg(long)]
        tick_secs: Option<u64>,
        /// Exit after this many ticks
        #[arg(long)]
        max_ticks: Option<u64>,
    },

    /// Show how a range-control gesture maps onto the date domain
    Timeline {
        #[arg(long, default_value_t = 0.0)]
        start_pos: f64,
        #[arg(long, default_value_t = 100.0)]
        end_pos: f64,
        /// last-week, last-month, last-quarter or all (overrides positions)
        #[arg(long, value_parser = parse_preset)]
        preset: Option<Preset>,
        /// Handle to drag: start, end or range
        #[arg(long, value_parser = parse_handle, requires_all = ["from", "to"])]
        drag: Option<Handle>,
        /// Pointer position where the drag begins
        #[arg(long, allow_hyphen_values = true)]
        from: Option<f64>,
        /// Pointer position where the drag ends
        #[arg(long, allow_hyphen_values = true)]
        to: Option<f64>,
        /// Treat --from/--to as pixels on a track this wide
        #[arg(long)]
        track_width: Option<f64>,
    },

    /// Recent agent notifications
    Notifications {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum AgentCommand {
    /// Create an agent
    Create {
        name: String,
        #[arg(long, default_value = "")]
        query: String,
        /// Extra filter token (repeatable)
        #[arg(long = "filter")]
        filters: Vec<String>,
        /// hourly, daily, weekly or monthly
        #[arg(long, default_value = "daily", value_parser = parse_cadence)]
        schedule: Cadence,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        color: Option<String>,
        /// Do not notify when new results arrive
        #[arg(long)]
        quiet: bool,
    },
    /// List agents with their state and next due time
    List,
    /// Activate or deactivate an agent
    Toggle { id: Uuid },
    /// Delete an agent
    Delete { id: Uuid },
    /// Execute an agent now, regardless of its cadence
    Run { id: Uuid },
}

#[derive(Subcommand)]
enum SavedCommand {
    /// Snapshot a filter configuration
    Save {
        name: String,
        #[command(flatten)]
        query: QueryArgs,
    },
    /// List saved searches
    List,
    /// Run a saved search by id or name
    Apply {
        search: String,
        #[arg(long, value_parser = parse_preset)]
        preset: Option<Preset>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Delete a saved search
    Delete { id: Uuid },
}

/// Filter tokens plus the advanced panel and the time window.
#[derive(Args, Clone, Debug, Default)]
struct QueryArgs {
    /// Free terms or key:value facets
    tokens: Vec<String>,
    /// Minimum intensity, 1 to 10
    #[arg(long)]
    intensity: Option<u8>,
    /// positive, neutral, negative or mixed
    #[arg(long, value_parser = parse_mood)]
    mood: Option<Mood>,
    /// Only corroborated experiences
    #[arg(long)]
    verified: bool,
    #[arg(long)]
    category: Option<String>,
    /// Time window preset (default: the whole last year)
    #[arg(long, value_parser = parse_preset)]
    preset: Option<Preset>,
    /// Window start, YYYY-MM-DD
    #[arg(long, value_parser = parse_date)]
    since: Option<i64>,
    /// Window end, YYYY-MM-DD
    #[arg(long, value_parser = parse_date)]
    until: Option<i64>,
}

#[derive(Args, Clone, Debug)]
struct OutputArgs {
    /// relevanz, datum or popularitaet (default from nexus.toml)
    #[arg(long, value_parser = parse_sort)]
    sort: Option<SortOption>,
    #[arg(long, default_value_t = 20)]
    limit: usize,
    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug)]
enum Reaction {
    Like,
    Corroborate,
    Save,
}

fn parse_cadence(s: &str) -> std::result::Result<Cadence, String> {
    Cadence::parse(s)
        .ok_or_else(|| format!("unknown schedule '{s}' (hourly, daily, weekly, monthly)"))
}

fn parse_mode(s: &str) -> std::result::Result<RenderMode, String> {
    RenderMode::parse(s)
        .ok_or_else(|| format!("unknown mode '{s}' (pins, heatmap, radar, graph)"))
}

fn parse_sort(s: &str) -> std::result::Result<SortOption, String> {
    SortOption::parse(s)
        .ok_or_else(|| format!("unknown sort '{s}' (relevanz, datum, popularitaet)"))
}

fn parse_preset(s: &str) -> std::result::Result<Preset, String> {
    Preset::parse(s)
        .ok_or_else(|| format!("unknown preset '{s}' (last-week, last-month, last-quarter, all)"))
}

fn parse_handle(s: &str) -> std::result::Result<Handle, String> {
    Handle::parse(s).ok_or_else(|| format!("unknown handle '{s}' (start, end, range)"))
}

fn parse_mood(s: &str) -> std::result::Result<Mood, String> {
    Mood::parse(s).ok_or_else(|| format!("unknown mood '{s}'"))
}

fn parse_date(s: &str) -> std::result::Result<i64, String> {
    parse_iso8601(s).ok_or_else(|| format!("expected YYYY-MM-DD, got '{s}'"))
}

fn parse_reaction(s: &str) -> std::result::Result<Reaction, String> {
    match s.trim().to_lowercase().as_str() {
        "like" => Ok(Reaction::Like),
        "corroborate" => Ok(Reaction::Corroborate),
        "save" => Ok(Reaction::Save),
        _ => Err(format!("unknown reaction '{s}' (like, corroborate, save)")),
    }
}

/// Resolved data directory, its config and the corpus location.
struct Session {
    base: PathBuf,
    config: Config,
    corpus: PathBuf,
}

impl Session {
    fn load(cli: &Cli) -> Result<Self> {
        let base = resolve_base_dir(cli.data_dir.as_deref());
        let config = Config::load(&base)?;
        let corpus = cli
            .corpus
            .clone()
            .unwrap_or_else(|| config.corpus_path(&base));
        Ok(Self {
            base,
            config,
            corpus,
        })
    }

    fn open_store(&self) -> Result<Store> {
        open_data_dir(&self.base)
            .with_context(|| format!("failed to open store in {}", self.base.display()))
    }

    fn open_service(&self) -> Result<SchedulerService<SystemClock, Store>> {
        let service = SchedulerService::new(SystemClock, self.open_store()?)
            .context("failed to load agents")?;
        if service.skipped_on_load() > 0 {
            tracing::warn!(
                "skipped {} unreadable agent record(s)",
                service.skipped_on_load()
            );
        }
        Ok(service)
    }

    fn executor(&self) -> CorpusExecutor {
        CorpusExecutor::new(&self.corpus)
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let env = Session::load(&cli)?;

    match &cli.command {
        Commands::Agent(cmd) => cmd_agent(&env, cmd).await,
        Commands::Search { query, output } => cmd_search(&env, query, output).await,
        Commands::Saved(cmd) => cmd_saved(&env, cmd).await,
        Commands::React { id, reaction } => cmd_react(&env, *id, *reaction),
        Commands::Render {
            mode,
            out,
            width,
            height,
            frames,
            query,
        } => cmd_render(&env, *mode, out, (*width, *height), *frames, query).await,
        Commands::Daemon {
            tick_secs,
            max_ticks,
        } => cmd_daemon(&env, *tick_secs, *max_ticks).await,
        Commands::Timeline {
            start_pos,
            end_pos,
            preset,
            drag,
            from,
            to,
            track_width,
        } => cmd_timeline(
            (*start_pos, *end_pos),
            *preset,
            (*drag).zip((*from).zip(*to)),
            *track_width,
        ),
        Commands::Notifications { limit } => cmd_notifications(&env, *limit),
    }
}

// ---------------------------------------------------------------------------
// Query helpers
// ---------------------------------------------------------------------------

fn build_model(args: &QueryArgs) -> QueryModel {
    let mut model = QueryModel::new();
    for token in &args.tokens {
        model.add_filter(token);
    }
    let mut advanced = AdvancedFilterSet::from_tokens(model.tokens());
    if let Some(intensity) = args.intensity {
        advanced.intensity = intensity;
    }
    if let Some(mood) = args.mood {
        advanced.mood = Some(mood);
    }
    if args.verified {
        advanced.verified_only = true;
    }
    if let Some(category) = &args.category {
        advanced.category = Some(category.clone());
    }
    model.apply_advanced_filters(advanced);
    model
}

fn time_window(preset: Option<Preset>, since: Option<i64>, until: Option<i64>) -> TimeRange {
    let domain = TimeDomain::last_year(SystemClock.now());
    let mut control = RangeControl::new(domain);
    match (preset, since, until) {
        (Some(preset), _, _) => control.apply_preset(preset),
        (None, None, None) => control.apply_preset(Preset::All),
        (None, since, until) => control.set_range(TimeRange::new(
            since.unwrap_or(domain.start()),
            until.unwrap_or(domain.end()),
        )),
    }
}

async fn execute(
    env: &Session,
    model: &QueryModel,
    window: TimeRange,
) -> Result<Vec<ResultRecord>> {
    let request = QueryRequest::from_composed(&model.compose_query(), window);
    tracing::debug!(?request, "executing query");
    env.executor()
        .execute(&request)
        .await
        .context("query execution failed")
}

fn print_results(set: &ResultSet, output: &OutputArgs, describe: &str) -> Result<()> {
    let shown: Vec<&ResultRecord> = set.records().iter().take(output.limit).collect();
    if output.json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }
    if shown.is_empty() {
        println!("(no results for {describe})");
        return Ok(());
    }
    let mut stdout = std::io::stdout().lock();
    for r in &shown {
        writeln!(
            stdout,
            "{}  {}  likes={} corr={} int={}  {}",
            r.id,
            &to_iso8601(r.created_at)[..10],
            r.likes,
            r.corroborations,
            r.intensity,
            r.summary
        )?;
    }
    writeln!(
        stdout,
        "{} of {} results for {describe}, sorted by {}",
        shown.len(),
        set.len(),
        set.sort_option().as_str()
    )?;
    Ok(())
}

async fn search_and_print(
    env: &Session,
    model: &QueryModel,
    window: TimeRange,
    output: &OutputArgs,
) -> Result<()> {
    let results = execute(env, model, window).await?;
    let sort = output.sort.unwrap_or(env.config.default_sort);
    let set = ResultSet::new(results, sort);
    print_results(&set, output, &model.compose_query().describe())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn state_label(state: Option<AgentState>) -> &'static str {
    match state {
        Some(AgentState::Inactive) => "inactive",
        Some(AgentState::ActiveIdle) => "idle",
        Some(AgentState::ActiveRunning) => "running",
        None => "?",
    }
}

fn print_agent(service: &SchedulerService<SystemClock, Store>, agent: &Agent) {
    let last = agent
        .last_run
        .map(to_iso8601)
        .unwrap_or_else(|| "never".to_string());
    let next = service
        .next_due(agent.id)
        .map(to_iso8601)
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{}  {:<20} {:<8} {:<8} last={} next={}  [{}]",
        agent.id,
        agent.name,
        state_label(service.state(agent.id)),
        agent.schedule.as_str(),
        last,
        next,
        agent.compose_query().describe()
    );
}

async fn cmd_agent(env: &Session, cmd: &AgentCommand) -> Result<()> {
    let mut service = env.open_service()?;

    match cmd {
        AgentCommand::Create {
            name,
            query,
            filters,
            schedule,
            description,
            color,
            quiet,
        } => {
            let mut draft = AgentDraft::new(name, query)
                .with_schedule(*schedule)
                .with_filters(filters.iter().cloned());
            draft.description = description.clone();
            draft.color = color.clone();
            draft.notify_on_results = !quiet;
            let agent = service.create_agent(draft).context("failed to create agent")?;
            println!("created agent {} ({})", agent.id, agent.name);
        }
        AgentCommand::List => {
            if service.agents().is_empty() {
                println!("(no agents)");
            }
            for agent in service.agents() {
                print_agent(&service, agent);
            }
        }
        AgentCommand::Toggle { id } => {
            let active = service.toggle_agent(*id)?;
            println!(
                "agent {id} is now {}",
                if active { "active" } else { "inactive" }
            );
        }
        AgentCommand::Delete { id } => {
            let agent = service.delete_agent(*id)?;
            println!("deleted agent {} ({})", agent.id, agent.name);
        }
        AgentCommand::Run { id } => {
            let executor = env.executor();
            let notification = service
                .run_now(*id, &executor, &|_: Notification| {})
                .await?;
            if let Some(n) = &notification {
                service
                    .store()
                    .record_notification(n, service.clock().now())
                    .context("failed to log notification")?;
            }
            match notification {
                Some(Notification::NewResults {
                    new_results_count, ..
                }) => println!("{new_results_count} new result(s)"),
                Some(Notification::ExecutionFailed { error, .. }) => {
                    println!("execution failed: {error}")
                }
                None => println!("no new results"),
            }
        }
    }
    Ok(())
}

async fn cmd_search(env: &Session, query: &QueryArgs, output: &OutputArgs) -> Result<()> {
    let model = build_model(query);
    let window = time_window(query.preset, query.since, query.until);
    search_and_print(env, &model, window, output).await
}

fn find_saved<'a>(searches: &'a [SavedSearch], key: &str) -> Option<&'a SavedSearch> {
    let by_id = Uuid::parse_str(key)
        .ok()
        .and_then(|id| searches.iter().find(|s| s.id == id));
    by_id.or_else(|| searches.iter().find(|s| s.name == key))
}

async fn cmd_saved(env: &Session, cmd: &SavedCommand) -> Result<()> {
    let store = env.open_store()?;

    match cmd {
        SavedCommand::Save { name, query } => {
            let model = build_model(query);
            if model.is_empty() {
                bail!("nothing to save: add at least one filter token");
            }
            let search = model.save_search(name, SystemClock.now());
            add_saved_search(&store, &search).context("failed to save search")?;
            println!("saved search {} ({})", search.id, search.name);
        }
        SavedCommand::List => {
            let loaded = load_saved_searches(&store)?;
            if loaded.skipped > 0 {
                tracing::warn!("skipped {} unreadable saved search(es)", loaded.skipped);
            }
            if loaded.items.is_empty() {
                println!("(no saved searches)");
            }
            for s in &loaded.items {
                let tokens: Vec<&str> = s.tokens.iter().map(|t| t.as_str()).collect();
                println!(
                    "{}  {:<20} {}  [{}]",
                    s.id,
                    s.name,
                    &to_iso8601(s.created_at)[..10],
                    tokens.join(" ")
                );
            }
        }
        SavedCommand::Apply {
            search,
            preset,
            output,
        } => {
            let loaded = load_saved_searches(&store)?;
            let saved = find_saved(&loaded.items, search)
                .ok_or_else(|| anyhow!("no saved search matching '{search}'"))?;
            let mut model = QueryModel::new();
            model.apply_saved_search(saved);
            let window = time_window(*preset, None, None);
            search_and_print(env, &model, window, output).await?;
        }
        SavedCommand::Delete { id } => {
            if delete_saved_search(&store, *id)? {
                println!("deleted saved search {id}");
            } else {
                bail!("no saved search with id {id}");
            }
        }
    }
    Ok(())
}

fn cmd_react(env: &Session, id: Uuid, reaction: Reaction) -> Result<()> {
    let records = corpus::load(&env.corpus)?;
    let mut set = ResultSet::new(records, env.config.default_sort);
    let record = match reaction {
        Reaction::Like => set.toggle_like(id),
        Reaction::Corroborate => set.toggle_corroboration(id),
        Reaction::Save => set.toggle_save(id),
    }
    .ok_or_else(|| anyhow!("no record with id {id} in {}", env.corpus.display()))?;
    println!(
        "{}  likes={} corr={} liked={} corroborated={} saved={}",
        record.id,
        record.likes,
        record.corroborations,
        record.liked,
        record.corroborated_by_viewer,
        record.saved
    );
    corpus::save(&env.corpus, set.records())
}

async fn cmd_render(
    env: &Session,
    mode: RenderMode,
    out: &Path,
    (width, height): (f64, f64),
    frames: u64,
    query: &QueryArgs,
) -> Result<()> {
    if !(width > 0.0 && height > 0.0) {
        bail!("width and height must be positive");
    }
    let model = build_model(query);
    let window = time_window(query.preset, query.since, query.until);
    let results = execute(env, &model, window).await?;
    let count = results.len();

    let now = SystemClock.now();
    let view = Arc::new(Mutex::new(SpatialView::new(SvgSurface::new(width, height))));
    let change = {
        let mut v = view.lock().await;
        v.set_results(results, now);
        v.set_time_range(Some(window), now);
        v.set_mode(mode, now)
    };

    if let ModeChange::StartAnimation(token) = change {
        if frames > 0 {
            let interval = Duration::from_millis(env.config.frame_interval_ms);
            let loop_task = tokio::spawn(daemon::animate(
                view.clone(),
                token,
                SystemClock,
                interval,
                Some(frames),
            ));
            let drawn = loop_task.await.context("animation task failed")?;
            tracing::debug!(drawn, "animation finished");
        } else {
            token.cancel();
        }
    }

    let document = view.lock().await.surface().document();
    std::fs::write(out, document).with_context(|| format!("failed to write {}", out.display()))?;
    println!(
        "rendered {count} result(s) in {} mode to {}",
        mode.as_str(),
        out.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Advisory pidfile for observability
// ---------------------------------------------------------------------------

fn acquire_pidfile(base: &Path) -> Option<PathBuf> {
    let path = base.join("nexus-daemon.pid");
    if let Ok(content) = std::fs::read_to_string(&path)
        && let Ok(pid) = content.trim().parse::<u32>()
    {
        if is_process_alive(pid) {
            tracing::warn!("another nexus daemon (PID {pid}) is running");
        } else {
            tracing::info!("cleaned up stale pidfile (PID {pid} is dead)");
            let _ = std::fs::remove_file(&path);
        }
    }

    match std::fs::write(&path, std::process::id().to_string()) {
        Ok(()) => Some(path),
        Err(e) => {
            tracing::warn!("failed to write pidfile: {e}");
            None
        }
    }
}

#[cfg(unix)]
fn is_process_alive(pid: u32) -> bool {
    // kill(pid, 0) checks existence without sending a signal
    unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
}

#[cfg(not(unix))]
fn is_process_alive(_pid: u32) -> bool {
    false
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {e}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn cmd_daemon(env: &Session, tick_secs: Option<u64>, max_ticks: Option<u64>) -> Result<()> {
    let tick_secs = tick_secs.unwrap_or(env.config.tick_interval_secs);
    if tick_secs == 0 {
        bail!("tick interval must be at least one second");
    }
    let service = Arc::new(Mutex::new(env.open_service()?));
    let executor = Arc::new(env.executor());
    let pidfile = acquire_pidfile(&env.base);

    let shutdown = CancellationToken::new();
    let signal_task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            shutdown.cancel();
        })
    };

    let stats = daemon::run(
        service,
        executor,
        daemon::DaemonOptions {
            tick_interval: Duration::from_secs(tick_secs),
            max_ticks,
        },
        shutdown,
    )
    .await;
    signal_task.abort();

    if let Some(path) = pidfile {
        let _ = std::fs::remove_file(&path);
    }
    println!(
        "ticks={} dispatched={} skipped={} notifications={} errors={}",
        stats.ticks, stats.dispatched, stats.skipped_running, stats.notifications, stats.errors
    );
    Ok(())
}

fn cmd_timeline(
    positions: (f64, f64),
    preset: Option<Preset>,
    drag: Option<(Handle, (f64, f64))>,
    track_width: Option<f64>,
) -> Result<()> {
    let domain = TimeDomain::last_year(SystemClock.now());
    let mut control = RangeControl::new(domain);
    match preset {
        Some(p) => {
            control.apply_preset(p);
        }
        None => control = control.with_positions(positions.0, positions.1),
    }

    if let Some((handle, (from, to))) = drag {
        let to_pos = |x: f64| match track_width {
            Some(width_px) => Track {
                left_px: 0.0,
                width_px,
            }
            .to_position(x),
            None => x,
        };
        control.begin_drag(handle, to_pos(from));
        control.move_pointer(to_pos(to));
        control.end_drag();
    }

    let range = control.range();
    println!(
        "domain: {} .. {}",
        to_iso8601(domain.start()),
        to_iso8601(domain.end())
    );
    println!(
        "handles: start={:.2} end={:.2} (min gap {})",
        control.start_pos(),
        control.end_pos(),
        control.min_gap()
    );
    println!("range: {} .. {}", to_iso8601(range.start), to_iso8601(range.end));
    Ok(())
}

fn cmd_notifications(env: &Session, limit: usize) -> Result<()> {
    let store = env.open_store()?;
    let entries = store.recent_notifications(limit)?;
    if entries.is_empty() {
        println!("(no notifications)");
    }
    for e in entries {
        let at = to_iso8601(e.delivered_at);
        match e.notification {
            Notification::NewResults {
                agent_id,
                new_results_count,
            } => println!("{at}  {agent_id}  {new_results_count} new result(s)"),
            Notification::ExecutionFailed { agent_id, error } => {
                println!("{at}  {agent_id}  failed: {error}")
            }
        }
    }
    Ok(())
}
