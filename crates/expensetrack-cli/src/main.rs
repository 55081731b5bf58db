//! Expensetrack - command-line client for the expense-tracking service.
//!
//! Each subcommand drives one view controller from `expensetrack-core` and
//! prints its data and notification.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use expensetrack_core::api::{ApiClient, ApiGateway};
use expensetrack_core::auth::{AuthFlow, Navigator};
use expensetrack_core::config::app_cache_dir;
use expensetrack_core::models::{CategoryForm, CategoryKind};
use expensetrack_core::screens::{AuthMode, AuthScreen, CategoriesScreen, DashboardScreen, ProfileScreen};
use expensetrack_core::utils::{capitalize, format_date};
use expensetrack_core::{Config, Notification};

/// Log file name in cache directory
const LOG_FILE: &str = "expensetrack.log";

const ENV_PASSWORD: &str = "EXPENSETRACK_PASSWORD";

const USAGE: &str = "\
Usage: expensetrack <command>

Commands:
  login [email]                        Sign in
  register <username> <email>          Create an account
  profile                              Show the signed-in user
  categories                           List categories
  categories add <name> [expense|income]
                                       Add a category
  dashboard                            Show a summary
  logout                               Sign out";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Login { email: Option<String> },
    Register { username: String, email: String },
    Profile,
    Categories,
    AddCategory { name: String, kind: CategoryKind },
    Dashboard,
    Logout,
    Help,
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    match args.as_slice() {
        [] | ["help"] | ["--help"] | ["-h"] => Ok(Command::Help),
        ["login"] => Ok(Command::Login { email: None }),
        ["login", email] => Ok(Command::Login { email: Some(email.to_string()) }),
        ["register", username, email] => Ok(Command::Register {
            username: username.to_string(),
            email: email.to_string(),
        }),
        ["profile"] => Ok(Command::Profile),
        ["categories"] => Ok(Command::Categories),
        ["categories", "add", name] => Ok(Command::AddCategory {
            name: name.to_string(),
            kind: CategoryKind::default(),
        }),
        ["categories", "add", name, kind] => Ok(Command::AddCategory {
            name: name.to_string(),
            kind: kind.parse()?,
        }),
        ["dashboard"] => Ok(Command::Dashboard),
        ["logout"] => Ok(Command::Logout),
        other => Err(format!("Unknown command: {}", other.join(" "))),
    }
}

/// Navigation for a one-shot CLI: there is no view to switch to, so the
/// "go to authentication" trigger becomes a hint.
struct CliNavigator;

impl Navigator for CliNavigator {
    fn to_authentication(&self) {
        eprintln!("Run `expensetrack login` to sign in.");
    }

    fn to_home(&self) {}
}

/// Initialize the tracing subscriber, writing to a file so command output
/// stays clean. Use RUST_LOG to control the level (e.g. RUST_LOG=debug).
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = app_cache_dir().ok()?;
    std::fs::create_dir_all(&log_dir).ok()?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, LOG_FILE));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
    Some(guard)
}

fn report(notification: Option<&Notification>) -> ExitCode {
    match notification {
        Some(note) if note.is_error() => {
            eprintln!("{}", note);
            ExitCode::FAILURE
        }
        Some(note) => {
            println!("{}", note);
            ExitCode::SUCCESS
        }
        None => ExitCode::SUCCESS,
    }
}

fn prompt_line(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn read_password() -> Result<String> {
    if let Ok(password) = std::env::var(ENV_PASSWORD) {
        return Ok(password);
    }
    rpassword::prompt_password("Password: ").context("Failed to read password")
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            return Ok(ExitCode::from(2));
        }
    };
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(ExitCode::SUCCESS);
    }

    // Before loading config so its warnings reach the log
    let _log_guard = init_tracing();
    let mut config = Config::load()?;
    info!(command = ?command, api = %config.api_base_url, "Expensetrack starting");

    let gateway = Arc::new(ApiGateway::configure(&config.gateway_config())?);
    let store = config.open_session_store()?;
    let flow = Arc::new(AuthFlow::new(ApiClient::new(gateway), store, Arc::new(CliNavigator)));
    flow.restore().await;

    run(command, flow, &mut config).await
}

async fn run(command: Command, flow: Arc<AuthFlow>, config: &mut Config) -> Result<ExitCode> {
    match command {
        Command::Login { email } => {
            let email = match email.or_else(|| config.last_email.clone()) {
                Some(email) => email,
                None => prompt_line("Email: ")?,
            };
            let mut screen = AuthScreen::new(flow.clone());
            screen.form.email = email.clone();
            screen.form.password = read_password()?;
            screen.submit().await?;

            if flow.is_authenticated().await {
                config.last_email = Some(email);
                if let Err(e) = config.save() {
                    tracing::warn!(error = %e, "Failed to save config");
                }
            }
            Ok(report(screen.notification.as_ref()))
        }
        Command::Register { username, email } => {
            let mut screen = AuthScreen::new(flow);
            screen.set_mode(AuthMode::Register);
            screen.form.username = username;
            screen.form.email = email;
            screen.form.password = read_password()?;
            screen.submit().await?;

            let code = report(screen.notification.as_ref());
            if screen.mode == AuthMode::Login {
                println!("Run `expensetrack login {}` to sign in.", screen.form.email);
            }
            Ok(code)
        }
        Command::Profile => {
            let mut screen = ProfileScreen::new(flow);
            screen.load().await?;
            if let Some(profile) = &screen.profile {
                println!("{}", profile.display_name());
                println!("{}", profile.email);
            }
            Ok(report(screen.notification.as_ref()))
        }
        Command::Categories => {
            let mut screen = CategoriesScreen::new(flow);
            screen.refresh().await?;
            if screen.notification.is_none() && screen.categories.is_empty() {
                println!("No categories yet.");
            }
            for category in &screen.categories {
                let created = category.created_at.as_ref().map(format_date).unwrap_or_default();
                println!("{:<24} {:<8} {}", category.name, capitalize(category.kind.as_str()), created);
            }
            Ok(report(screen.notification.as_ref()))
        }
        Command::AddCategory { name, kind } => {
            let mut screen = CategoriesScreen::new(flow);
            screen.form = CategoryForm::new(name, kind);
            screen.add().await?;
            Ok(report(screen.notification.as_ref()))
        }
        Command::Dashboard => {
            let mut screen = DashboardScreen::new(flow);
            screen.load().await?;
            if let Some(profile) = &screen.profile {
                println!("Welcome, {}", profile.display_name());
            }
            if let Some(summary) = &screen.summary {
                println!("Expense categories: {}", summary.expense_categories);
                println!("Income categories:  {}", summary.income_categories);
            }
            Ok(report(screen.notification.as_ref()))
        }
        Command::Logout => {
            let mut screen = ProfileScreen::new(flow);
            screen.sign_out().await;
            Ok(report(screen.notification.as_ref()))
        }
        Command::Help => {
            println!("{}", USAGE);
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_login() {
        assert_eq!(parse_args(&args(&["login"])), Ok(Command::Login { email: None }));
        assert_eq!(
            parse_args(&args(&["login", "a@b.com"])),
            Ok(Command::Login { email: Some("a@b.com".to_string()) })
        );
    }

    #[test]
    fn test_parse_add_category() {
        assert_eq!(
            parse_args(&args(&["categories", "add", "Rent"])),
            Ok(Command::AddCategory { name: "Rent".to_string(), kind: CategoryKind::Expense })
        );
        assert_eq!(
            parse_args(&args(&["categories", "add", "Salary", "income"])),
            Ok(Command::AddCategory { name: "Salary".to_string(), kind: CategoryKind::Income })
        );
        assert!(parse_args(&args(&["categories", "add", "Salary", "bonus"])).is_err());
    }

    #[test]
    fn test_parse_unknown_and_help() {
        assert_eq!(parse_args(&[]), Ok(Command::Help));
        assert!(parse_args(&args(&["register", "a"])).is_err());
        assert!(parse_args(&args(&["delete"])).is_err());
    }
}
