//! Coachlink server - owns the backing store and the push client.
//!
//! Architecture:
//! - One server runs at ~/.coachlink (manages PID/port files)
//! - All store access goes through the server to avoid lock contention
//! - CLI and apps are thin clients that talk to the server via HTTP
//! - Session rooms are NOT brokered here: each client derives the session
//!   key itself and talks to the communications platform directly
//!
//! Endpoints:
//! - GET  /api/participants - List participants
//! - GET  /api/participants/{id} - Profile plus entry flow
//! - GET  /api/participants/{id}/partners - Role-gated partner candidates
//! - GET  /api/assignments - List assignments
//! - GET  /api/activities - List activities (optional participant filter)
//! - POST /api/activities/{id}/reminders - Dispatch reminder notifications
//! - POST /api/seed - Load demo rows

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::db::{ActivityQueries, AssignmentQueries, Database, ParticipantQueries};
use crate::models::{Activity, Assignment, EntryFlow, Participant, Role};
use crate::push::{reminder_times, PushClient};

/// Server configuration file paths.
const SERVER_DIR: &str = ".coachlink";
const PID_FILE: &str = "server.pid";
const PORT_FILE: &str = "server.port";

/// Default port the daemon is spawned on.
pub const DEFAULT_PORT: u16 = 58412;

/// Shared server state.
pub struct ServerState {
    /// Backing store; rusqlite connections are single-threaded.
    db: Mutex<Database>,
    /// Best-effort push delivery.
    push: PushClient,
}

// === Request/Response Types ===

/// Profile response: the participant plus the UI flow their role selects.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub participant: Participant,
    pub entry_flow: EntryFlow,
}

/// Query parameters for activity listing.
#[derive(Debug, Deserialize)]
pub struct ActivityParams {
    pub participant_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemindersResponse {
    pub activity_id: String,
    pub scheduled: usize,
}

/// Counts of demo rows actually inserted by one seed run.
#[derive(Debug, Serialize, Deserialize)]
pub struct SeedResponse {
    pub participants: usize,
    pub assignments: usize,
    pub activities: usize,
}

// === Server Lifecycle ===

/// Start the server.
pub async fn start_server(port: u16, config: Config) -> Result<()> {
    let server_dir = get_server_dir()?;
    std::fs::create_dir_all(&server_dir)?;

    let pid = std::process::id();
    std::fs::write(server_dir.join(PID_FILE), pid.to_string())?;
    std::fs::write(server_dir.join(PORT_FILE), port.to_string())?;

    let db = match &config.database_path {
        Some(path) => Database::open_at(path)?,
        None => Database::open()?,
    };

    let state = Arc::new(ServerState {
        db: Mutex::new(db),
        push: PushClient::from_config(&config.push),
    });

    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("coachlink server starting on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await.context("Server error")?;

    let _ = std::fs::remove_file(server_dir.join(PID_FILE));
    let _ = std::fs::remove_file(server_dir.join(PORT_FILE));

    Ok(())
}

/// Build the router. Separate from [`start_server`] so tests can drive
/// handlers without binding a socket.
fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/api/participants", get(list_participants))
        .route("/api/participants/{id}", get(get_participant))
        .route("/api/participants/{id}/partners", get(get_partners))
        .route("/api/assignments", get(list_assignments))
        .route("/api/activities", get(list_activities))
        .route("/api/activities/{id}/reminders", post(send_reminders))
        .route("/api/seed", post(seed))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn get_server_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(SERVER_DIR))
}

/// Port of a live server, if one is running.
pub fn get_server_port() -> Option<u16> {
    let server_dir = get_server_dir().ok()?;
    let pid_file = server_dir.join(PID_FILE);
    let port_file = server_dir.join(PORT_FILE);

    if let Ok(pid_str) = std::fs::read_to_string(&pid_file) {
        if let Ok(pid) = pid_str.trim().parse::<u32>() {
            #[cfg(unix)]
            {
                use std::process::Command;
                let output = Command::new("kill").args(["-0", &pid.to_string()]).output();
                if output.map(|o| o.status.success()).unwrap_or(false) {
                    if let Ok(port_str) = std::fs::read_to_string(&port_file) {
                        return port_str.trim().parse().ok();
                    }
                }
            }
            #[cfg(not(unix))]
            {
                if let Ok(port_str) = std::fs::read_to_string(&port_file) {
                    return port_str.trim().parse().ok();
                }
            }
        }
    }
    None
}

/// Spawn the server as a detached daemon.
pub fn spawn_server_daemon(port: u16) -> Result<()> {
    use std::process::{Command, Stdio};

    let exe = std::env::current_exe()?;

    #[cfg(unix)]
    {
        Command::new(&exe)
            .args(["serve", "--port", &port.to_string()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("Failed to spawn server daemon")?;
    }

    #[cfg(not(unix))]
    {
        Command::new(&exe)
            .args(["serve", "--port", &port.to_string()])
            .spawn()
            .context("Failed to spawn server daemon")?;
    }

    std::thread::sleep(std::time::Duration::from_millis(500));
    Ok(())
}

/// Return the port of a running server, starting one if needed.
pub fn ensure_server_running() -> Result<u16> {
    if let Some(port) = get_server_port() {
        return Ok(port);
    }

    spawn_server_daemon(DEFAULT_PORT)?;

    for _ in 0..20 {
        if let Some(p) = get_server_port() {
            return Ok(p);
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
    }

    anyhow::bail!("Server failed to start")
}

// === Handlers ===

async fn list_participants(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<Vec<Participant>>, StatusCode> {
    let db = state.db.lock().await;
    let participants = ParticipantQueries::list(db.conn()).map_err(internal_error)?;
    Ok(Json(participants))
}

async fn get_participant(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Json<ProfileResponse>, StatusCode> {
    let db = state.db.lock().await;
    let participant = ParticipantQueries::get_by_id(db.conn(), &id)
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let entry_flow = EntryFlow::for_role(Some(participant.role));
    Ok(Json(ProfileResponse {
        participant,
        entry_flow,
    }))
}

/// Partner candidates for a participant, per the role gate:
/// a coach gets the full assigned-student list to pick from, a student gets
/// the zero-or-one assigned coach, anything else falls open to the student
/// shape.
async fn get_partners(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Participant>>, StatusCode> {
    let db = state.db.lock().await;
    let participant = ParticipantQueries::get_by_id(db.conn(), &id)
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let partners = match participant.role {
        Role::Coach => {
            AssignmentQueries::students_for_coach(db.conn(), &id).map_err(internal_error)?
        }
        Role::Student | Role::Admin => AssignmentQueries::coach_for_student(db.conn(), &id)
            .map_err(internal_error)?
            .into_iter()
            .collect(),
    };

    Ok(Json(partners))
}

async fn list_assignments(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<Vec<Assignment>>, StatusCode> {
    let db = state.db.lock().await;
    let assignments = AssignmentQueries::list(db.conn()).map_err(internal_error)?;
    Ok(Json(assignments))
}

async fn list_activities(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<ActivityParams>,
) -> Result<Json<Vec<Activity>>, StatusCode> {
    let db = state.db.lock().await;
    let activities = ActivityQueries::list(db.conn(), params.participant_id.as_deref())
        .map_err(internal_error)?;
    Ok(Json(activities))
}

/// Compute the reminder plan for an activity and hand each instant to the
/// push collaborator. Delivery is best-effort; the response only reports how
/// many reminders were dispatched.
async fn send_reminders(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Json<RemindersResponse>, StatusCode> {
    let activity = {
        let db = state.db.lock().await;
        ActivityQueries::get_by_id(db.conn(), &id)
            .map_err(internal_error)?
            .ok_or(StatusCode::NOT_FOUND)?
    };

    let reminders = reminder_times(activity.starts_at, Utc::now());
    for reminder in &reminders {
        state
            .push
            .send(
                &activity.participant_id,
                &format!("{}: {}", reminder.label, activity.title),
                &format!("Starts at {}", activity.starts_at.to_rfc3339()),
                serde_json::json!({
                    "activity_id": activity.id,
                    "fires_at": reminder.fires_at.to_rfc3339(),
                }),
            )
            .await;
    }

    Ok(Json(RemindersResponse {
        activity_id: activity.id,
        scheduled: reminders.len(),
    }))
}

/// Load demo rows so an unconfigured install has something to render.
/// Inserts are INSERT OR IGNORE; the response counts rows actually
/// inserted, so a repeat run reports zeros.
async fn seed(State(state): State<Arc<ServerState>>) -> Result<Json<SeedResponse>, StatusCode> {
    let db = state.db.lock().await;
    let conn = db.conn();

    let participants = [
        Participant::new("coach-dana".into(), "Dana".into(), Role::Coach),
        Participant::new("student-ali".into(), "Ali".into(), Role::Student),
        Participant::new("student-riley".into(), "Riley".into(), Role::Student),
        Participant::new("admin-sam".into(), "Sam".into(), Role::Admin),
    ];
    let mut inserted_participants = 0;
    for p in &participants {
        if ParticipantQueries::insert(conn, p).map_err(internal_error)? {
            inserted_participants += 1;
        }
    }

    let assignments = [
        Assignment::new("seed-a1".into(), "coach-dana".into(), "student-ali".into()),
        Assignment::new("seed-a2".into(), "coach-dana".into(), "student-riley".into()),
    ];
    let mut inserted_assignments = 0;
    for a in &assignments {
        if AssignmentQueries::insert(conn, a).map_err(internal_error)? {
            inserted_assignments += 1;
        }
    }

    let activities = [Activity::new(
        "seed-act1".into(),
        "student-ali".into(),
        "Weekly check-in".into(),
        Utc::now() + Duration::days(1),
    )];
    let mut inserted_activities = 0;
    for a in &activities {
        if ActivityQueries::insert(conn, a).map_err(internal_error)? {
            inserted_activities += 1;
        }
    }

    Ok(Json(SeedResponse {
        participants: inserted_participants,
        assignments: inserted_assignments,
        activities: inserted_activities,
    }))
}

fn internal_error(e: anyhow::Error) -> StatusCode {
    tracing::error!("store error: {e:#}");
    StatusCode::INTERNAL_SERVER_ERROR
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bind the router on an ephemeral port backed by an in-memory store.
    async fn spawn_test_server() -> (SocketAddr, Arc<ServerState>) {
        let state = Arc::new(ServerState {
            db: Mutex::new(Database::open_in_memory().unwrap()),
            push: PushClient::Null,
        });
        let app = router(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (addr, state)
    }

    #[tokio::test]
    async fn test_seed_then_profile_entry_flows() {
        let (addr, _state) = spawn_test_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("http://{addr}/api/seed"))
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());

        let profile: ProfileResponse = client
            .get(format!("http://{addr}/api/participants/coach-dana"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(profile.entry_flow, EntryFlow::PartnerSelection);

        let profile: ProfileResponse = client
            .get(format!("http://{addr}/api/participants/student-ali"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(profile.entry_flow, EntryFlow::Direct);
    }

    #[tokio::test]
    async fn test_partner_lists_follow_role_gate() {
        let (addr, state) = spawn_test_server().await;
        let client = reqwest::Client::new();

        client
            .post(format!("http://{addr}/api/seed"))
            .send()
            .await
            .unwrap();

        // Coach sees the full selection list.
        let partners: Vec<Participant> = client
            .get(format!("http://{addr}/api/participants/coach-dana/partners"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(partners.len(), 2);

        // Student sees exactly the assigned coach.
        let partners: Vec<Participant> = client
            .get(format!("http://{addr}/api/participants/student-ali/partners"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(partners.len(), 1);
        assert_eq!(partners[0].id, "coach-dana");

        // A coach with zero assignments gets an empty list, not an error.
        {
            let db = state.db.lock().await;
            ParticipantQueries::insert(
                db.conn(),
                &Participant::new("coach-new".into(), "New Coach".into(), Role::Coach),
            )
            .unwrap();
        }
        let partners: Vec<Participant> = client
            .get(format!("http://{addr}/api/participants/coach-new/partners"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(partners.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_participant_is_404() {
        let (addr, _state) = spawn_test_server().await;
        let resp = reqwest::get(format!("http://{addr}/api/participants/nobody"))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reminders_dispatch_and_404() {
        let (addr, _state) = spawn_test_server().await;
        let client = reqwest::Client::new();

        client
            .post(format!("http://{addr}/api/seed"))
            .send()
            .await
            .unwrap();

        // Seeded activity starts tomorrow: hour-before and at-start remain.
        let resp: RemindersResponse = client
            .post(format!("http://{addr}/api/activities/seed-act1/reminders"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(resp.scheduled, 2);

        let resp = client
            .post(format!("http://{addr}/api/activities/missing/reminders"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_seeding_twice_is_idempotent() {
        let (addr, state) = spawn_test_server().await;
        let client = reqwest::Client::new();

        let first: SeedResponse = client
            .post(format!("http://{addr}/api/seed"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(first.participants, 4);
        assert_eq!(first.assignments, 2);
        assert_eq!(first.activities, 1);

        // A second run inserts nothing and says so.
        let second: SeedResponse = client
            .post(format!("http://{addr}/api/seed"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(second.participants, 0);
        assert_eq!(second.assignments, 0);
        assert_eq!(second.activities, 0);

        let db = state.db.lock().await;
        assert_eq!(ParticipantQueries::list(db.conn()).unwrap().len(), 4);
        assert_eq!(AssignmentQueries::list(db.conn()).unwrap().len(), 2);
    }
}
