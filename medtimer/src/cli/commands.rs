//! CLI command execution.
//!
//! This is a thin client - every session operation goes through the server.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Local;
use reqwest::{Method, StatusCode};
use serde::Deserialize;

use crate::config::DEFAULT_HISTORY_LIMIT;
use crate::models::time_format::HHMM;
use crate::models::MedicationForm;
use crate::server;
use crate::snapshot;
use crate::tracker::{daily_tip, Notice, NoticeLevel, SessionState};

use super::args::{Cli, Commands};

// === HTTP Client for Server Communication ===

#[derive(Debug, Deserialize)]
struct ScheduleRow {
    id: String,
    name: String,
    icon: String,
    dosage: Option<String>,
    scheduled_time: String,
    status_label: String,
}

#[derive(Debug, Deserialize)]
struct Adherence {
    taken_count: usize,
    total: usize,
    percentage: f64,
}

#[derive(Debug, Deserialize)]
struct Streaks {
    current: u32,
    best: u32,
}

#[derive(Debug, Deserialize)]
struct Motivation {
    headline: String,
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    date: String,
    icon: String,
    medicine_name: String,
    dosage: String,
    scheduled: String,
    taken_at: String,
}

#[derive(Debug, Deserialize)]
struct History {
    records: Vec<HistoryRow>,
    total: usize,
    truncated: bool,
}

/// Dashboard view as returned by the server.
#[derive(Debug, Deserialize)]
struct DashboardView {
    date: String,
    schedule: Vec<ScheduleRow>,
    adherence: Adherence,
    streaks: Streaks,
    motivation: Option<Motivation>,
    history: History,
}

#[derive(Debug, Deserialize)]
struct MutationResponse {
    notice: Notice,
    view: DashboardView,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    notice: Notice,
}

fn base_url(port: u16) -> String {
    format!("http://127.0.0.1:{port}")
}

/// Fetch the dashboard view from the server.
async fn get_view(port: u16, history_limit: usize) -> Result<DashboardView> {
    let url = format!("{}/api/state?history_limit={history_limit}", base_url(port));

    let resp = reqwest::Client::new()
        .get(&url)
        .send()
        .await
        .context("Failed to get state from server")?;

    if !resp.status().is_success() {
        bail!("Server returned {}", resp.status());
    }

    resp.json().await.context("Failed to parse state")
}

/// Fetch the raw session state from the server.
async fn get_snapshot(port: u16) -> Result<SessionState> {
    let url = format!("{}/api/snapshot", base_url(port));

    let resp = reqwest::Client::new()
        .get(&url)
        .send()
        .await
        .context("Failed to get snapshot from server")?;

    if !resp.status().is_success() {
        bail!("Server returned {}", resp.status());
    }

    resp.json().await.context("Failed to parse snapshot")
}

/// Send a mutation and print the server's notice.
///
/// Returns the updated view, or `None` when the server rejected the request
/// with a warning (already printed).
async fn mutate(
    port: u16,
    method: Method,
    path: &str,
    body: Option<serde_json::Value>,
) -> Result<Option<DashboardView>> {
    let url = format!("{}{path}", base_url(port));
    let mut request = reqwest::Client::new().request(method, &url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let resp = request
        .send()
        .await
        .with_context(|| format!("Failed to reach server at {url}"))?;

    let status = resp.status();
    if status.is_success() {
        let response: MutationResponse = resp.json().await.context("Failed to parse response")?;
        print_notice(&response.notice);
        return Ok(Some(response.view));
    }

    if matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY
    ) {
        if let Ok(rejection) = resp.json::<ErrorResponse>().await {
            print_notice(&rejection.notice);
            return Ok(None);
        }
    }

    bail!("Server returned {status}")
}

// === Output ===

fn print_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Warning => eprintln!("Warning: {}", notice.message),
        NoticeLevel::Success | NoticeLevel::Info => println!("{}", notice.message),
    }
}

fn print_schedule(view: &DashboardView) {
    println!("Today's schedule ({})", view.date);
    println!();

    if view.schedule.is_empty() {
        println!("No medicines added yet. Add one with `medtimer add`.");
    } else {
        println!(
            "{:<36}  {:<6} {:<4} {:<24} {:<12} {:<10}",
            "ID", "TIME", "", "NAME", "DOSAGE", "STATUS"
        );
        println!("{}", "-".repeat(98));
        for row in &view.schedule {
            println!(
                "{:<36}  {:<6} {:<4} {:<24} {:<12} {:<10}",
                row.id,
                row.scheduled_time,
                row.icon,
                truncate(&row.name, 24),
                row.dosage.as_deref().unwrap_or("-"),
                row.status_label,
            );
        }
    }

    let a = &view.adherence;
    println!();
    println!(
        "Adherence: {}%  ({}/{} taken)",
        a.percentage, a.taken_count, a.total
    );
    println!(
        "Streak: {} days (best {} days)",
        view.streaks.current, view.streaks.best
    );
    if let Some(ref motivation) = view.motivation {
        println!();
        println!("{}", motivation.headline);
    }
}

fn print_history(history: &History) {
    if history.total == 0 {
        println!("No history yet. Start taking your medications to see history!");
        return;
    }

    println!(
        "{:<12} {:<4} {:<24} {:<12} {:<10} {:<9}",
        "DATE", "", "MEDICINE", "DOSAGE", "SCHEDULED", "TAKEN AT"
    );
    println!("{}", "-".repeat(74));
    for row in &history.records {
        println!(
            "{:<12} {:<4} {:<24} {:<12} {:<10} {:<9}",
            row.date,
            row.icon,
            truncate(&row.medicine_name, 24),
            row.dosage,
            row.scheduled,
            row.taken_at,
        );
    }
    if history.truncated {
        println!();
        println!(
            "Showing last {} of {} total records",
            history.records.len(),
            history.total
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}

// === Command Execution ===

pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve {
            port,
            open,
            restore,
        } => server::start_server(port, open, restore).await,
        Commands::Add {
            name,
            form,
            time,
            dosage,
        } => add_medication(&name.join(" "), form, &time.format(HHMM).to_string(), dosage).await,
        Commands::List => {
            let port = server::ensure_server_running()?;
            let view = get_view(port, DEFAULT_HISTORY_LIMIT).await?;
            print_schedule(&view);
            Ok(())
        }
        Commands::Take { id } => {
            let path = format!("/api/medications/{}/taken", urlencoding::encode(&id));
            simple_mutation(Method::POST, &path).await
        }
        Commands::Delete { id } => {
            let path = format!("/api/medications/{}", urlencoding::encode(&id));
            simple_mutation(Method::DELETE, &path).await
        }
        Commands::NewDay => new_day().await,
        Commands::Clear => simple_mutation(Method::DELETE, "/api/data").await,
        Commands::History { limit } => {
            let port = server::ensure_server_running()?;
            let view = get_view(port, limit).await?;
            print_history(&view.history);
            Ok(())
        }
        Commands::Motivation => {
            let port = server::ensure_server_running()?;
            if let Some(view) = mutate(port, Method::POST, "/api/motivation", None).await? {
                match view.motivation {
                    Some(m) => println!("{}", m.headline),
                    None => println!("(hidden)"),
                }
            }
            Ok(())
        }
        Commands::Tip => {
            println!("{}", daily_tip(Local::now().date_naive()));
            Ok(())
        }
        Commands::Export { file } => export(&file).await,
    }
}

async fn add_medication(
    name: &str,
    form: MedicationForm,
    time: &str,
    dosage: Option<String>,
) -> Result<()> {
    let port = server::ensure_server_running()?;
    let body = serde_json::json!({
        "name": name,
        "form": form.as_str(),
        "time": time,
        "dosage": dosage,
    });
    mutate(port, Method::POST, "/api/medications", Some(body)).await?;
    Ok(())
}

async fn simple_mutation(method: Method, path: &str) -> Result<()> {
    let port = server::ensure_server_running()?;
    mutate(port, method, path, None).await?;
    Ok(())
}

async fn new_day() -> Result<()> {
    let port = server::ensure_server_running()?;
    if let Some(view) = mutate(port, Method::POST, "/api/day", None).await? {
        println!(
            "Streak: {} days (best {} days)",
            view.streaks.current, view.streaks.best
        );
    }
    Ok(())
}

async fn export(file: &Path) -> Result<()> {
    let port = server::ensure_server_running()?;
    let state = get_snapshot(port).await?;
    snapshot::save(&state, file)?;
    println!(
        "Exported {} medications and {} history records to {}",
        state.medications.len(),
        state.history.len(),
        file.display()
    );
    Ok(())
}
