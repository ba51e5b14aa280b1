//! # clinic
//!
//! Command-line client for the clinic dashboard backend: session checks,
//! sign-in, account requests, the live-update feed, and the chat assistant.

#![deny(unsafe_code)]

mod app;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use clinic_auth::{FindIdForm, RegisterForm};
use clinic_cache::QueryKey;
use clinic_core::logging::{LogFormat, init_subscriber};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::app::{App, load_config};

const CLEAR_COMMAND: &str = "/clear";

/// Clinic dashboard client.
#[derive(Parser, Debug)]
#[command(name = "clinic", about = "Clinic dashboard client", version)]
struct Cli {
    /// Settings file (defaults to `~/.clinic/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Backend origin, overriding settings (e.g. `http://localhost:5000`).
    #[arg(long, global = true)]
    origin: Option<String>,

    /// Log filter, overriding settings. `RUST_LOG` still wins.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

/// Credentials for commands that can sign in first.
#[derive(clap::Args, Debug, Default)]
struct SignIn {
    /// Sign in as this user before running the command.
    #[arg(long)]
    username: Option<String>,

    /// Password for `--username`.
    #[arg(long, env = "CLINIC_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the current session.
    Whoami {
        #[command(flatten)]
        sign_in: SignIn,
        /// Ask the backend even when a cached session is fresh.
        #[arg(long)]
        refresh: bool,
    },

    /// Sign in and print the session.
    Login {
        /// Login name.
        username: String,
        /// Password.
        #[arg(long, env = "CLINIC_PASSWORD", hide_env_values = true)]
        password: String,
        /// Ask for a long-lived session.
        #[arg(long)]
        remember: bool,
    },

    /// Create an account.
    Register {
        /// Login name (at least 3 characters).
        username: String,
        /// Contact email.
        email: String,
        /// Display name.
        name: String,
        /// Password (at least 8 characters).
        #[arg(long, env = "CLINIC_PASSWORD", hide_env_values = true)]
        password: String,
        /// Password confirmation (defaults to `--password`).
        #[arg(long)]
        confirm_password: Option<String>,
    },

    /// Have the user ID sent to the registered email.
    FindId {
        /// Registered email.
        email: String,
        /// Registered display name.
        name: String,
    },

    /// Follow the live-update feed until interrupted.
    Watch(SignIn),

    /// Chat with the assistant, one message per stdin line. `/clear` starts
    /// a new conversation.
    Chat(SignIn),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let (mut settings, load_error) = load_config(args.settings.as_deref());
    if let Some(origin) = args.origin {
        settings.server.origin = origin;
    }
    if let Some(level) = args.log_level {
        settings.logging.level = level;
    }
    let format = LogFormat::parse(&settings.logging.format).unwrap_or(LogFormat::Compact);
    init_subscriber(&settings.logging.level, format);
    if let Some(e) = load_error {
        warn!(error = %e, "failed to load settings, using defaults");
    }

    let app = App::new(settings)?;
    info!(origin = %app.api.origin(), "clinic client starting");

    match args.command {
        Command::Whoami { sign_in, refresh } => whoami(&app, &sign_in, refresh).await,
        Command::Login {
            username,
            password,
            remember,
        } => {
            let user = app
                .session
                .login(&username, &password, remember)
                .await
                .context("Login failed")?;
            print_json(&user)
        }
        Command::Register {
            username,
            email,
            name,
            password,
            confirm_password,
        } => {
            let form = RegisterForm {
                confirm_password: confirm_password.unwrap_or_else(|| password.clone()),
                username,
                password,
                email,
                name,
            };
            app.session
                .register(&form)
                .await
                .context("Registration failed")?;
            println!("registered {}", form.username);
            Ok(())
        }
        Command::FindId { email, name } => {
            app.session
                .find_id(&FindIdForm { email, name })
                .await
                .context("Account lookup failed")?;
            println!("user ID sent to the registered email");
            Ok(())
        }
        Command::Watch(sign_in) => watch(&app, &sign_in).await,
        Command::Chat(sign_in) => chat(&app, &sign_in).await,
    }
}

/// Sign in when credentials were given. Returns whether it did.
async fn sign_in(app: &App, creds: &SignIn) -> Result<bool> {
    match (&creds.username, &creds.password) {
        (Some(username), Some(password)) => {
            let _ = app
                .session
                .login(username, password, false)
                .await
                .context("Login failed")?;
            Ok(true)
        }
        (Some(_), None) => bail!("--username needs --password (or CLINIC_PASSWORD)"),
        _ => Ok(false),
    }
}

async fn whoami(app: &App, creds: &SignIn, refresh: bool) -> Result<()> {
    let _ = sign_in(app, creds).await?;
    let session = if refresh {
        app.session.refresh_session().await
    } else {
        app.session.current_session().await
    };
    match session.context("Session probe failed")? {
        Some(user) => print_json(&user),
        None => {
            println!("anonymous");
            Ok(())
        }
    }
}

async fn watch(app: &App, creds: &SignIn) -> Result<()> {
    let signed_in = sign_in(app, creds).await?;
    if !app.settings.live.enabled {
        bail!("live channel is disabled in settings (live.enabled = false)");
    }

    let live = app.live_channel()?;
    let collections = app.collections();
    let mut status = live.subscribe_status();
    let mut patients = app.cache.subscribe(QueryKey::Patients);
    live.connect();
    println!("watching {} (ctrl-c to stop)", live.url());
    if app.settings.live.require_session && !app.session.state().is_authenticated() {
        println!("waiting for a signed-in session (pass --username to sign in)");
    }

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for ctrl-c")?;
                break;
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let s = *status.borrow_and_update();
                println!("connection: {:?} (reconnect attempts: {})", s.phase, s.reconnect_attempts);
            }
            changed = patients.changed() => {
                if changed.is_err() {
                    break;
                }
                let _ = patients.borrow_and_update();
                if app.cache.is_stale(QueryKey::Patients) {
                    match collections.patients().await {
                        Ok(list) => println!("patients refreshed: {}", list.len()),
                        Err(e) => warn!(error = %e, "patients refresh failed"),
                    }
                } else {
                    print_counts(app);
                }
            }
        }
    }

    live.shutdown().await;
    if signed_in {
        app.session.logout().await.context("Logout failed")?;
    }
    Ok(())
}

async fn chat(app: &App, creds: &SignIn) -> Result<()> {
    let _ = sign_in(app, creds).await?;
    let chat = app.chat();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim() == CLEAR_COMMAND {
            chat.clear().await;
            println!("conversation cleared");
            continue;
        }
        match chat.send(&line).await {
            Ok(Some(reply)) => println!("{}", reply.content),
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "chat request failed");
                println!("{}", clinic_api::CHAT_FAILURE_TEXT);
            }
        }
    }
    Ok(())
}

fn print_counts(app: &App) {
    let len = |n: Option<usize>| n.map_or_else(|| "-".to_string(), |n| n.to_string());
    println!(
        "patients={} treatments={} appointments={} visits={} outcomes={}",
        len(app.cache.patients().get().map(|v| v.len())),
        len(app.cache.treatments().get().map(|v| v.len())),
        len(app.cache.appointments().get().map(|v| v.len())),
        len(app.cache.patient_visits().get().map(|v| v.len())),
        len(app.cache.treatment_outcomes().get().map(|v| v.len())),
    );
    let stale: Vec<String> = QueryKey::COLLECTIONS
        .iter()
        .filter(|key| app.cache.is_stale(**key))
        .map(ToString::to_string)
        .collect();
    if !stale.is_empty() {
        println!("stale: {}", stale.join(", "));
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
