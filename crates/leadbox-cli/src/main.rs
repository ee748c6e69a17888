//! Leadbox CLI: command-line client for the Leadbox contact intake.
//!
//! Normalizes phone numbers locally, submits contact requests through the
//! same form model a browser would use, and manages the request inbox
//! through the admin API.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod client;
mod error;
mod session;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use leadbox_core::auth::Credentials;
use leadbox_core::form::ContactForm;
use leadbox_core::phone;
use leadbox_core::submission::{
    ListQuery, RequestPage, Service, Stats, Status, StatusUpdate, Submission,
};
use leadbox_core::validate::FieldErrors;

use crate::client::{AdminClient, DEFAULT_TIMEOUT, SubmissionClient};
use crate::error::ClientError;
use crate::session::{AdminSession, SessionStore};

// ── ANSI color helpers ───────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

// ── CLI structure ────────────────────────────────────────────────────

/// Leadbox: contact requests from the website to your inbox.
#[derive(Parser)]
#[command(
    name = "leadbox",
    version,
    about = "Leadbox CLI: normalize phones, submit contact requests, manage the inbox",
    long_about = None,
    after_help = format!(
        "{DIM}Environment variables:{RESET}\n  \
         LEADBOX_ADDR            Server address (default: http://127.0.0.1:8000)\n  \
         LEADBOX_SESSION_FILE    Admin session file (default: ~/.leadbox/session.json)\n\n\
         {DIM}Examples:{RESET}\n  \
         leadbox phone 901234567 --blur\n  \
         leadbox submit --name Aziza --email aziza@example.uz --phone 901234567 --message Hi\n  \
         leadbox admin login --username admin --password secret\n  \
         leadbox admin list --status new"
    ),
)]
struct Cli {
    /// Leadbox server address.
    #[arg(long, env = "LEADBOX_ADDR", default_value = "http://127.0.0.1:8000")]
    addr: String,

    /// Where the admin session is stored.
    #[arg(long, env = "LEADBOX_SESSION_FILE")]
    session_file: Option<PathBuf>,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a phone number in its canonical shape.
    Phone {
        /// Raw phone input.
        input: String,
        /// Also apply the completion rule used when the input loses focus.
        #[arg(long)]
        blur: bool,
    },
    /// Validate and submit a contact request.
    Submit {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        message: String,
        /// Service line: websites, crm, or telegram_bots.
        #[arg(long)]
        service: Option<Service>,
    },
    /// Manage contact requests (requires admin login).
    Admin {
        #[command(subcommand)]
        action: AdminCommands,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Verify admin credentials and remember them.
    Login {
        #[arg(long, default_value = "admin")]
        username: String,
        #[arg(long, env = "LEADBOX_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored admin credentials.
    Logout,
    /// Show request counts per status.
    Stats,
    /// List requests, newest first.
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
        /// new, processed, closed, or all.
        #[arg(long, default_value = "all")]
        status: String,
        /// Search name, email and phone.
        #[arg(long)]
        query: Option<String>,
    },
    /// Show one request.
    Show { id: String },
    /// Change a request's status and notes.
    Update {
        id: String,
        #[arg(long)]
        status: Status,
        /// Replace the admin notes. Omit to keep them.
        #[arg(long)]
        notes: Option<String>,
    },
}

// ── Output helpers ───────────────────────────────────────────────────

fn header(icon: &str, title: &str) {
    println!("{BOLD}{CYAN}{icon} {title}{RESET}");
    println!("{DIM}─────────────────────────────────────────{RESET}");
}

fn kv_line(key: &str, value: &str) {
    println!("  {DIM}{key:<20}{RESET} {WHITE}{value}{RESET}");
}

fn success(msg: &str) {
    println!("{GREEN}{BOLD}✓{RESET} {msg}");
}

fn warning(msg: &str) {
    println!("{YELLOW}{BOLD}⚠{RESET} {YELLOW}{msg}{RESET}");
}

fn print_field_errors(errors: &FieldErrors) {
    for (field, message) in errors.iter() {
        eprintln!("  {RED}•{RESET} {BOLD}{field}{RESET}: {message}");
    }
}

fn status_badge(status: Status) -> String {
    let color = match status {
        Status::New => YELLOW,
        Status::Processed => CYAN,
        Status::Closed => GREEN,
    };
    format!("{color}{status}{RESET}")
}

fn print_stats(stats: &Stats) {
    println!();
    header("▤", "Requests");
    kv_line("Total", &stats.total_requests.to_string());
    kv_line("New", &stats.new_requests.to_string());
    kv_line("Processed", &stats.processed_requests.to_string());
    kv_line("Closed", &stats.closed_requests.to_string());
    println!();
}

fn print_page(page: &RequestPage) {
    println!();
    header("▤", &format!("Requests (page {}, {} total)", page.page, page.total));
    if page.requests.is_empty() {
        println!("  {DIM}no requests{RESET}");
    }
    for request in &page.requests {
        println!(
            "  {DIM}{}{RESET}  {:<10}  {BOLD}{}{RESET}  {}  {DIM}{}{RESET}",
            request.created_at.format("%Y-%m-%d %H:%M"),
            status_badge(request.status),
            request.name,
            request.phone,
            request.id,
        );
    }
    println!();
}

fn print_submission(request: &Submission) {
    println!();
    header("✉", &request.name);
    kv_line("ID", &request.id);
    kv_line("Status", &status_badge(request.status));
    kv_line("Email", &request.email);
    kv_line("Phone", &request.phone);
    kv_line(
        "Service",
        request.service.map_or("(not specified)", Service::label),
    );
    kv_line("Created", &request.created_at.to_rfc3339());
    if let Some(updated) = request.updated_at {
        kv_line("Updated", &updated.to_rfc3339());
    }
    println!();
    println!("  {}", request.message);
    if !request.admin_notes.is_empty() {
        println!();
        kv_line("Admin notes", &request.admin_notes);
    }
    println!();
}

// ── Command dispatch ─────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("  {RED}{BOLD}✗ Error:{RESET} {e:#}");
            eprintln!();
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let timeout = Duration::from_secs(cli.timeout.max(1));
    match cli.command {
        Commands::Phone { input, blur } => {
            cmd_phone(&input, blur);
            Ok(())
        }
        Commands::Submit {
            name,
            email,
            phone,
            message,
            service,
        } => {
            let mut form = ContactForm::new();
            form.set_name(&name);
            form.set_email(&email);
            form.set_phone(&phone);
            form.blur_phone();
            form.set_message(&message);
            form.set_service(service);
            cmd_submit(&SubmissionClient::new(&cli.addr, timeout)?, &mut form).await
        }
        Commands::Admin { action } => {
            let store = match cli.session_file {
                Some(path) => SessionStore::new(path),
                None => SessionStore::new(SessionStore::default_path()?),
            };
            cmd_admin(&cli.addr, timeout, &store, action).await
        }
    }
}

fn cmd_phone(input: &str, blur: bool) {
    let normalized = phone::normalize(input);
    let shown = if blur {
        phone::on_blur(&normalized)
    } else {
        normalized
    };
    println!("{shown}");
}

async fn cmd_submit(client: &SubmissionClient, form: &mut ContactForm) -> Result<()> {
    match client.submit(form).await {
        Ok(message) => {
            println!();
            success(&message);
            println!();
            Ok(())
        }
        Err(ClientError::Invalid(errors)) => {
            eprintln!();
            print_field_errors(&errors);
            bail!("the form has {} invalid field(s), nothing was sent", errors.len())
        }
        Err(ClientError::Rejected {
            status,
            detail,
            fields,
        }) if !fields.is_empty() => {
            eprintln!();
            print_field_errors(&fields);
            bail!("{detail} (HTTP {status})")
        }
        Err(e) => Err(e.into()),
    }
}

async fn cmd_admin(
    addr: &str,
    timeout: Duration,
    store: &SessionStore,
    action: AdminCommands,
) -> Result<()> {
    match action {
        AdminCommands::Login { username, password } => {
            let session = AdminSession::with_credentials(&Credentials::new(username, password));
            let client = AdminClient::new(addr, session.clone(), timeout)?;
            client
                .stats()
                .await
                .context("could not verify admin credentials")?;
            store.save(&session)?;
            println!();
            success(&format!(
                "Logged in as {}",
                session.username().unwrap_or_default()
            ));
            println!();
            Ok(())
        }
        AdminCommands::Logout => {
            let was_logged_in = !matches!(store.load(), Ok(s) if !s.is_logged_in());
            store.clear()?;
            println!();
            if was_logged_in {
                success("Logged out");
            } else {
                warning("No admin session was stored");
            }
            println!();
            Ok(())
        }
        AdminCommands::Stats => {
            print_stats(&logged_in(addr, timeout, store)?.stats().await?);
            Ok(())
        }
        AdminCommands::List {
            page,
            limit,
            status,
            query,
        } => {
            let status = match status.trim() {
                "" | "all" => None,
                other => Some(other.parse::<Status>()?),
            };
            let query = ListQuery {
                page,
                limit,
                status,
                search: query,
                ..ListQuery::default()
            }
            .normalized();
            print_page(&logged_in(addr, timeout, store)?.list(&query).await?);
            Ok(())
        }
        AdminCommands::Show { id } => {
            print_submission(&logged_in(addr, timeout, store)?.get(&id).await?);
            Ok(())
        }
        AdminCommands::Update { id, status, notes } => {
            let update = StatusUpdate {
                status,
                admin_notes: notes,
            };
            let updated = logged_in(addr, timeout, store)?
                .update(&id, &update)
                .await?;
            println!();
            success(&format!(
                "Request {} is now {}",
                updated.id,
                status_badge(updated.status)
            ));
            println!();
            Ok(())
        }
    }
}

/// Admin client for the stored session, or an error when logged out.
fn logged_in(addr: &str, timeout: Duration, store: &SessionStore) -> Result<AdminClient> {
    let session = store.load()?;
    if !session.is_logged_in() {
        return Err(ClientError::NotLoggedIn.into());
    }
    Ok(AdminClient::new(addr, session, timeout)?)
}
