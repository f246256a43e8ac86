//!
//! faction-admin terminal front end
//! --------------------------------
//! Drives the library the way the dashboard pages do: log in, browse users,
//! factions, geometries and regions, create or delete factions, log out.
//! One-shot mode runs a single command; interactive mode reads commands with
//! line editing until `quit`.

pub mod outputformatter;

use anyhow::{anyhow, bail, Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use serde::Serialize;
use tokio::sync::watch;

use crate::api::{ApiClient, FactionFilter, GeometryFilter, NewFaction, RegionFilter, UserFilter};
use crate::config::{AdminConfig, ExecutionContext};
use crate::identity::{SessionEnd, SessionManager, SessionState};
use crate::query::QueryClient;

use outputformatter::{render_record, render_table, terminal_width};

const USER_COLUMNS: &[&str] = &["id", "name", "email", "role", "status"];
const FACTION_COLUMNS: &[&str] = &["id", "acronym", "name", "color_hex", "display_priority", "active"];
const GEOMETRY_COLUMNS: &[&str] = &["id", "geometry_type", "risk_level", "status", "faction_id", "region_id"];
const REGION_COLUMNS: &[&str] = &["id", "name", "type", "municipality", "state"];
const PROFILE_COLUMNS: &[&str] = &["id", "email", "name", "role"];

pub fn usage(program: &str) -> String {
    format!(
        "Usage:\n  {program} [flags] <command> [args...]   # run one command\n  {program} [flags] --repl                 # interactive mode (default without a command)\n\n\
Flags:\n  --context <public|internal>  which API base URL to use (default: public)\n  --email <e>                  log in before running the command\n  --password <p>               password for --email\n  --json                       print raw JSON instead of tables\n  --repl                       start interactive mode\n  -h, --help                   show this help\n\n\
Commands:\n  login <email> <password>\n  logout\n  whoami\n  status\n  health\n  users [role]\n  factions [active|inactive]\n  faction create <name> <acronym> <color> <priority>\n  faction delete <id>\n  geometries [region=<id>] [faction=<id>] [bbox=<min_lon,min_lat,max_lon,max_lat>]\n  regions [state=<s>] [city=<c>]\n  help\n  quit\n\n\
Environment:\n  ADMIN_PUBLIC_API_URL, ADMIN_INTERNAL_API_URL, ADMIN_API_TIMEOUT_MS, ADMIN_QUERY_STALE_SECS\n  RUST_LOG controls log verbosity\n"
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub context: ExecutionContext,
    pub email: Option<String>,
    pub password: Option<String>,
    pub json: bool,
    pub repl: bool,
    pub command: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Run(CliArgs),
    Help,
}

/// Parse process arguments (without the program name).
pub fn parse_args(args: &[String]) -> std::result::Result<Parsed, String> {
    let mut out = CliArgs {
        context: ExecutionContext::default(),
        email: None,
        password: None,
        json: false,
        repl: false,
        command: Vec::new(),
    };
    let mut i = 0;
    while i < args.len() {
        let value = |name: &str| args.get(i + 1).cloned().ok_or_else(|| format!("{} requires a value", name));
        match args[i].as_str() {
            "--context" => {
                let v = value("--context")?;
                out.context = ExecutionContext::parse(&v).ok_or_else(|| format!("unknown context '{}'", v))?;
                i += 2;
            }
            "--email" => { out.email = Some(value("--email")?); i += 2; }
            "--password" => { out.password = Some(value("--password")?); i += 2; }
            "--json" => { out.json = true; i += 1; }
            "--repl" => { out.repl = true; i += 1; }
            "-h" | "--help" => return Ok(Parsed::Help),
            flag if flag.starts_with("--") && out.command.is_empty() => {
                return Err(format!("unrecognized flag: {}", flag));
            }
            _ => {
                out.command.extend(args[i..].iter().cloned());
                break;
            }
        }
    }
    Ok(Parsed::Run(out))
}

/// Split a command line on whitespace, keeping double-quoted runs together.
pub fn split_line(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut has_token = false;
    for ch in line.chars() {
        match ch {
            '"' => { in_quotes = !in_quotes; has_token = true; }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    out.push(std::mem::take(&mut cur));
                    has_token = false;
                }
            }
            c => { cur.push(c); has_token = true; }
        }
    }
    if in_quotes {
        return Err("unterminated quote".to_string());
    }
    if has_token {
        out.push(cur);
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login { email: String, password: String },
    Logout,
    Whoami,
    Status,
    Health,
    Users { role: Option<String> },
    Factions { active: Option<bool> },
    FactionCreate { name: String, acronym: String, color: String, priority: i32 },
    FactionDelete { id: String },
    Geometries(GeometryFilter),
    Regions(RegionFilter),
    Help,
    Quit,
}

fn key_values<'a>(args: &'a [String], allowed: &[&str]) -> std::result::Result<Vec<(&'a str, &'a str)>, String> {
    args.iter()
        .map(|a| {
            let (k, v) = a.split_once('=').ok_or_else(|| format!("expected key=value, got '{}'", a))?;
            if !allowed.contains(&k) {
                return Err(format!("unknown filter '{}' (expected one of: {})", k, allowed.join(", ")));
            }
            Ok((k, v))
        })
        .collect()
}

fn parse_bbox(v: &str) -> std::result::Result<[f64; 4], String> {
    let parts: Vec<f64> = v
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| format!("bbox must be four numbers, got '{}'", v))?;
    match parts.as_slice() {
        [a, b, c, d] => Ok([*a, *b, *c, *d]),
        _ => Err(format!("bbox must be four numbers, got '{}'", v)),
    }
}

impl Command {
    pub fn parse(words: &[String]) -> std::result::Result<Command, String> {
        let (head, rest) = words.split_first().ok_or_else(|| "empty command".to_string())?;
        let cmd = match (head.to_ascii_lowercase().as_str(), rest) {
            ("login", [email, password]) => Command::Login { email: email.clone(), password: password.clone() },
            ("login", _) => return Err("usage: login <email> <password>".into()),
            ("logout", []) => Command::Logout,
            ("whoami", []) => Command::Whoami,
            ("status", []) => Command::Status,
            ("health", []) => Command::Health,
            ("users", []) => Command::Users { role: None },
            ("users", [role]) => Command::Users { role: Some(role.clone()) },
            ("factions", []) => Command::Factions { active: None },
            ("factions", [f]) => match f.as_str() {
                "active" => Command::Factions { active: Some(true) },
                "inactive" => Command::Factions { active: Some(false) },
                other => return Err(format!("expected active or inactive, got '{}'", other)),
            },
            ("faction", [sub, args @ ..]) => match (sub.as_str(), args) {
                ("create", [name, acronym, color, priority]) => Command::FactionCreate {
                    name: name.clone(),
                    acronym: acronym.clone(),
                    color: color.clone(),
                    priority: priority.parse().map_err(|_| format!("priority must be a number, got '{}'", priority))?,
                },
                ("delete", [id]) => Command::FactionDelete { id: id.clone() },
                _ => return Err("usage: faction create <name> <acronym> <color> <priority> | faction delete <id>".into()),
            },
            ("geometries", args) => {
                let mut f = GeometryFilter::default();
                for (k, v) in key_values(args, &["region", "faction", "bbox"])? {
                    match k {
                        "region" => f.region_id = Some(v.to_string()),
                        "faction" => f.faction_id = Some(v.to_string()),
                        _ => {
                            let [a, b, c, d] = parse_bbox(v)?;
                            f = f.with_bbox(a, b, c, d);
                        }
                    }
                }
                Command::Geometries(f)
            }
            ("regions", args) => {
                let mut f = RegionFilter::default();
                for (k, v) in key_values(args, &["state", "city"])? {
                    match k {
                        "state" => f.state = Some(v.to_string()),
                        _ => f.city = Some(v.to_string()),
                    }
                }
                Command::Regions(f)
            }
            ("help", _) => Command::Help,
            ("quit", _) | ("exit", _) => Command::Quit,
            (other, _) => return Err(format!("unknown command or wrong arguments: '{}' (try 'help')", other)),
        };
        Ok(cmd)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Output(String),
    Quit,
}

/// Everything one front-end process needs: the session manager, the cached
/// query client bound to the same session store, and output preferences.
pub struct Shell {
    sessions: SessionManager,
    queries: QueryClient,
    json: bool,
    width: usize,
    state_rx: watch::Receiver<SessionState>,
}

impl Shell {
    pub fn new(config: &AdminConfig, context: ExecutionContext) -> Result<Self> {
        let sessions = SessionManager::new(config).context("failed to set up authentication")?;
        let api = ApiClient::new(config, context, sessions.store().clone()).context("failed to set up API client")?;
        let queries = QueryClient::from_config(api, config);
        let state_rx = sessions.subscribe();
        Ok(Self { sessions, queries, json: false, width: terminal_width(), state_rx })
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn queries(&self) -> &QueryClient {
        &self.queries
    }

    pub fn prompt(&self) -> String {
        match self.sessions.current_session() {
            Some(s) => format!("{}@faction-admin> ", s.email),
            None => "faction-admin> ".to_string(),
        }
    }

    /// A line to show when the session ended underneath us (401 or expiry) since the last call.
    pub fn take_session_notice(&mut self) -> Option<String> {
        if !self.state_rx.has_changed().unwrap_or(false) {
            return None;
        }
        let state = *self.state_rx.borrow_and_update();
        if state != SessionState::Unauthenticated {
            return None;
        }
        match self.sessions.store().last_end() {
            Some(SessionEnd::Unauthorized) => Some("session rejected by the backend; log in again".to_string()),
            Some(SessionEnd::Expired) => Some("session expired; log in again".to_string()),
            _ => None,
        }
    }

    fn render_list<T: Serialize>(&self, items: &[T], columns: &[&str]) -> Result<String> {
        let v = serde_json::to_value(items).context("failed to encode result")?;
        if self.json {
            return Ok(serde_json::to_string_pretty(&v)?);
        }
        Ok(render_table(&v, Some(columns), self.width).unwrap_or_else(|| "(no rows)".to_string()))
    }

    fn render_one<T: Serialize>(&self, item: &T, columns: &[&str]) -> Result<String> {
        let v = serde_json::to_value(item).context("failed to encode result")?;
        if self.json {
            return Ok(serde_json::to_string_pretty(&v)?);
        }
        Ok(render_record(&v, columns))
    }

    pub async fn execute(&mut self, cmd: &Command) -> Result<Reply> {
        let out = match cmd {
            Command::Login { email, password } => {
                let s = self
                    .sessions
                    .authenticate(email, password)
                    .await
                    .map_err(|e| anyhow!("login failed: {}", e.message()))?;
                // a new identity must not see the previous one's cached reads
                self.queries.cache().clear();
                format!("logged in as {} <{}> ({})", s.name, s.email, s.role)
            }
            Command::Logout => {
                if self.sessions.logout() {
                    self.queries.cache().clear();
                    "logged out".to_string()
                } else {
                    "not logged in".to_string()
                }
            }
            Command::Whoami => {
                if self.sessions.current_session().is_none() {
                    bail!("not logged in");
                }
                let me = self.queries.api().me().await?;
                self.render_one(&me, PROFILE_COLUMNS)?
            }
            Command::Status => self.status(),
            Command::Health => {
                let h = self.queries.api().health().await?;
                if self.json {
                    serde_json::to_string_pretty(&h)?
                } else {
                    format!("backend {}: {}", if h.is_healthy() { "healthy" } else { "unhealthy" }, h.status)
                }
            }
            Command::Users { role } => {
                let filter = UserFilter { role: role.clone(), ..Default::default() };
                let users = self.queries.users(&filter).await?;
                self.render_list(&users, USER_COLUMNS)?
            }
            Command::Factions { active } => {
                let factions = self.queries.factions(&FactionFilter { active: *active }).await?;
                self.render_list(&factions, FACTION_COLUMNS)?
            }
            Command::FactionCreate { name, acronym, color, priority } => {
                let draft = NewFaction {
                    color_hex: color.clone(),
                    display_priority: *priority,
                    ..NewFaction::new(name.clone(), acronym.clone())
                };
                let done = self.queries.create_faction(&draft).await?;
                format!("{} (id {})", done.notice, done.value.id)
            }
            Command::FactionDelete { id } => {
                let done = self.queries.delete_faction(id).await?;
                done.notice.to_string()
            }
            Command::Geometries(filter) => {
                let geometries = self.queries.geometries(filter).await?;
                self.render_list(&geometries, GEOMETRY_COLUMNS)?
            }
            Command::Regions(filter) => {
                let regions = self.queries.regions(filter).await?;
                self.render_list(&regions, REGION_COLUMNS)?
            }
            Command::Help => usage("faction-admin"),
            Command::Quit => return Ok(Reply::Quit),
        };
        Ok(Reply::Output(out))
    }

    fn status(&self) -> String {
        let api = self.queries.api();
        let mut lines = vec![
            format!("api:      {} ({:?})", api.base_url(), api.context()),
            format!("state:    {:?}", self.sessions.store().state()),
        ];
        match self.sessions.current_session() {
            Some(s) => {
                lines.push(format!("user:     {} <{}> role={}", s.name, s.email, s.role));
                lines.push(format!("since:    {}", s.issued_at.to_rfc3339()));
                if let Some(exp) = s.expires_at {
                    lines.push(format!("expires:  {}", exp.to_rfc3339()));
                }
            }
            None => {
                if let Some(end) = self.sessions.store().last_end() {
                    lines.push(format!("last end: {:?}", end));
                }
            }
        }
        lines.join("\n")
    }
}

/// Entry point used by the binary. Returns the process exit code.
pub fn run(args: Vec<String>) -> Result<i32> {
    let mut args = args;
    let program = if args.is_empty() { "faction-admin".to_string() } else { args.remove(0) };
    let parsed = match parse_args(&args) {
        Ok(Parsed::Help) => {
            print!("{}", usage(&program));
            return Ok(0);
        }
        Ok(Parsed::Run(a)) => a,
        Err(msg) => {
            eprintln!("{}", msg);
            eprint!("{}", usage(&program));
            return Ok(2);
        }
    };

    let config = AdminConfig::from_env();
    tracing::debug!(?config, "configuration loaded");
    let mut shell = Shell::new(&config, parsed.context)?.with_json(parsed.json);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    if let Some(email) = parsed.email.as_deref() {
        let password = parsed.password.clone().unwrap_or_default();
        let login = Command::Login { email: email.to_string(), password };
        match rt.block_on(shell.execute(&login)) {
            Ok(Reply::Output(s)) => eprintln!("{}", s),
            Ok(Reply::Quit) => {}
            Err(e) => {
                eprintln!("error: {}", e);
                return Ok(1);
            }
        }
    }

    if parsed.command.is_empty() || parsed.repl {
        if !parsed.command.is_empty() {
            run_one(&rt, &mut shell, &parsed.command);
        }
        run_repl(&rt, &mut shell)?;
        return Ok(0);
    }
    Ok(if run_one(&rt, &mut shell, &parsed.command) { 0 } else { 1 })
}

fn run_one(rt: &tokio::runtime::Runtime, shell: &mut Shell, words: &[String]) -> bool {
    let cmd = match Command::parse(words) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{}", msg);
            return false;
        }
    };
    let ok = match rt.block_on(shell.execute(&cmd)) {
        Ok(Reply::Output(s)) => {
            println!("{}", s);
            true
        }
        Ok(Reply::Quit) => true,
        Err(e) => {
            eprintln!("error: {}", e);
            false
        }
    };
    if let Some(n) = shell.take_session_notice() {
        eprintln!("{}", n);
    }
    ok
}

fn run_repl(rt: &tokio::runtime::Runtime, shell: &mut Shell) -> Result<()> {
    let mut rl = DefaultEditor::new().context("failed to initialise line editor")?;
    println!("faction-admin interactive mode. Type 'help' for commands.");
    loop {
        let line = match rl.readline(&shell.prompt()) {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Err(e) = rl.add_history_entry(line) {
            tracing::debug!(error = %e, "history entry not recorded");
        }
        let words = match split_line(line) {
            Ok(w) => w,
            Err(msg) => {
                eprintln!("{}", msg);
                continue;
            }
        };
        let cmd = match Command::parse(&words) {
            Ok(c) => c,
            Err(msg) => {
                eprintln!("{}", msg);
                continue;
            }
        };
        match rt.block_on(shell.execute(&cmd)) {
            Ok(Reply::Output(s)) => println!("{}", s),
            Ok(Reply::Quit) => break,
            Err(e) => eprintln!("error: {}", e),
        }
        if let Some(n) = shell.take_session_notice() {
            eprintln!("{}", n);
        }
    }
    Ok(())
}
