//! # Command Line Interface
//!
//! ```text
//! loginuser serve [--bind ADDR] [--cookie-name NAME] [--ttl-secs N] [--no-sliding]
//!                 [--reject-invalid] [--max-sessions N] [--seeds FILE]
//!                 [--purge-interval-secs N]
//! loginuser check-seeds FILE [--json]
//! loginuser new-session-id
//! ```

use crate::auth::{DEFAULT_COOKIE_NAME, now};
use crate::config::{ConfigError, DEFAULT_BIND, DEFAULT_PURGE_INTERVAL_SECS, ServerConfig};
use clap::{Args, Parser, Subcommand};
use loginuser_core::{
    DEFAULT_MAX_SESSIONS, DEFAULT_TTL_SECS, FailurePolicy, SeedError, SessionId, SessionPolicy,
    SessionRecord, StoreError, Timestamp, parse_seeds,
};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

// =============================================================================
// ARGUMENTS
// =============================================================================

#[derive(Debug, Parser)]
#[command(name = "loginuser", version, about = "Inject the authenticated user into HTTP handlers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP server.
    Serve(ServeArgs),

    /// Validate a session seed file and list its sessions.
    CheckSeeds {
        path: PathBuf,
        /// Print the sessions as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print a freshly generated session id.
    NewSessionId,
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    #[arg(long, env = "LOGINUSER_BIND", default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,

    #[arg(long, env = "LOGINUSER_COOKIE_NAME", default_value = DEFAULT_COOKIE_NAME)]
    pub cookie_name: String,

    /// Session lifetime in seconds.
    #[arg(long, env = "LOGINUSER_TTL_SECS", default_value_t = DEFAULT_TTL_SECS)]
    pub ttl_secs: u64,

    /// Keep the original expiry instead of extending it on every request.
    #[arg(long, env = "LOGINUSER_NO_SLIDING")]
    pub no_sliding: bool,

    /// Answer 401 to invalid or expired credentials instead of serving the
    /// request anonymously.
    #[arg(long, env = "LOGINUSER_REJECT_INVALID")]
    pub reject_invalid: bool,

    #[arg(long, env = "LOGINUSER_MAX_SESSIONS", default_value_t = DEFAULT_MAX_SESSIONS)]
    pub max_sessions: usize,

    /// JSON file of sessions to load at startup.
    #[arg(long, env = "LOGINUSER_SEEDS")]
    pub seeds: Option<PathBuf>,

    /// Seconds between expired-session sweeps (0 disables).
    #[arg(
        long,
        env = "LOGINUSER_PURGE_INTERVAL_SECS",
        default_value_t = DEFAULT_PURGE_INTERVAL_SECS
    )]
    pub purge_interval_secs: u64,
}

impl ServeArgs {
    pub fn into_config(self) -> ServerConfig {
        ServerConfig {
            bind: self.bind,
            cookie_name: self.cookie_name,
            session: SessionPolicy {
                ttl_secs: self.ttl_secs,
                sliding: !self.no_sliding,
            },
            failure_policy: if self.reject_invalid {
                FailurePolicy::Reject
            } else {
                FailurePolicy::Anonymous
            },
            max_sessions: self.max_sessions,
            seeds: self.seeds,
            purge_interval_secs: self.purge_interval_secs,
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Seed {
        path: PathBuf,
        #[source]
        source: SeedError,
    },

    #[error(
        "{}: {count} seeded sessions exceed --max-sessions {capacity}",
        path.display()
    )]
    TooManySeeds {
        path: PathBuf,
        count: usize,
        capacity: usize,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Server(#[source] std::io::Error),

    #[error("cannot encode output: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Serve(args) => crate::server::serve(args.into_config()).await,
        Commands::CheckSeeds { path, json } => cmd_check_seeds(&path, json).map(|_| ()),
        Commands::NewSessionId => {
            println!("{}", cmd_new_session_id());
            Ok(())
        }
    }
}

/// Read and parse a seed file.
pub fn load_seed_file(
    path: &Path,
    now: Timestamp,
    default_ttl_secs: u64,
) -> Result<Vec<SessionRecord>, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_seeds(&text, now, default_ttl_secs).map_err(|source| CliError::Seed {
        path: path.to_path_buf(),
        source,
    })
}

/// Validate a seed file and print its sessions. Returns the session count.
pub fn cmd_check_seeds(path: &Path, json: bool) -> Result<usize, CliError> {
    let now = now();
    let records = load_seed_file(path, now, DEFAULT_TTL_SECS)?;

    if json {
        let listing: Vec<_> = records
            .iter()
            .map(|r| {
                serde_json::json!({
                    "id": r.id,
                    "name": r.user.name,
                    "email": r.user.email,
                    "role": r.user.role,
                    "ttl_secs": r.remaining_secs(now),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        for r in &records {
            println!(
                "{}  {:<24} {:<10} {}s",
                r.id,
                r.user.email,
                r.user.role.key(),
                r.remaining_secs(now)
            );
        }
        println!("{} session(s) OK", records.len());
    }

    Ok(records.len())
}

/// Generate a session id suitable for a seed file.
pub fn cmd_new_session_id() -> SessionId {
    SessionId::generate()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_serve_flags() {
        let cli = Cli::try_parse_from([
            "loginuser",
            "serve",
            "--bind",
            "0.0.0.0:9000",
            "--ttl-secs",
            "120",
            "--no-sliding",
            "--reject-invalid",
        ]);
        let config = match cli {
            Ok(Cli {
                command: Commands::Serve(args),
            }) => args.into_config(),
            other => panic!("unexpected parse result: {other:?}"),
        };
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.session.ttl_secs, 120);
        assert!(!config.session.sliding);
        assert_eq!(config.failure_policy, FailurePolicy::Reject);
        assert_eq!(config.cookie_name, DEFAULT_COOKIE_NAME);
    }

    #[test]
    fn cli_rejects_bad_bind_address() {
        assert!(Cli::try_parse_from(["loginuser", "serve", "--bind", "nowhere"]).is_err());
    }

    #[test]
    fn cli_parses_check_seeds() {
        let cli = Cli::try_parse_from(["loginuser", "check-seeds", "seeds.json", "--json"]);
        assert!(matches!(
            cli,
            Ok(Cli { command: Commands::CheckSeeds { json: true, .. } })
        ));
    }

    #[test]
    fn new_session_id_is_parseable() {
        let id = cmd_new_session_id();
        assert_eq!(SessionId::parse(id.as_str()), Ok(id));
    }
}
