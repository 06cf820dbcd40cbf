//! CLI command execution.
//!
//! This is a thin client - all store access goes through the server. The
//! session flow is the exception by design: like the mobile and web apps,
//! the client derives the session key itself and talks to the
//! communications platform directly, so no coordination round-trip is
//! needed for two sides to land in the same room.

use anyhow::{bail, Context, Result};

use crate::config::Config;
use crate::identity::SessionKey;
use crate::models::{Activity, Assignment, EntryFlow, Participant};
use crate::server::{
    self, ensure_server_running, ProfileResponse, RemindersResponse, SeedResponse,
};
use crate::session::{ActiveSession, Members, SessionBackend, SessionKind};

use super::args::{Cli, Commands, ListEntity};

// === HTTP Client for Server Communication ===

async fn fetch_profile(port: u16, id: &str) -> Result<ProfileResponse> {
    let url = format!(
        "http://127.0.0.1:{port}/api/participants/{}",
        urlencoding::encode(id)
    );

    let resp = reqwest::get(&url)
        .await
        .context("Failed to reach coachlink server")?;

    if resp.status() == reqwest::StatusCode::NOT_FOUND {
        bail!("No participant with id '{id}'");
    }
    if !resp.status().is_success() {
        bail!("Server returned {}", resp.status());
    }

    resp.json().await.context("Failed to parse profile")
}

async fn fetch_partners(port: u16, id: &str) -> Result<Vec<Participant>> {
    let url = format!(
        "http://127.0.0.1:{port}/api/participants/{}/partners",
        urlencoding::encode(id)
    );

    let resp = reqwest::get(&url)
        .await
        .context("Failed to reach coachlink server")?;

    if resp.status() == reqwest::StatusCode::NOT_FOUND {
        bail!("No participant with id '{id}'");
    }
    if !resp.status().is_success() {
        bail!("Server returned {}", resp.status());
    }

    resp.json().await.context("Failed to parse partner list")
}

async fn fetch_participants(port: u16) -> Result<Vec<Participant>> {
    let url = format!("http://127.0.0.1:{port}/api/participants");
    let resp = reqwest::get(&url)
        .await
        .context("Failed to reach coachlink server")?;
    if !resp.status().is_success() {
        bail!("Server returned {}", resp.status());
    }
    resp.json().await.context("Failed to parse participants")
}

async fn fetch_assignments(port: u16) -> Result<Vec<Assignment>> {
    let url = format!("http://127.0.0.1:{port}/api/assignments");
    let resp = reqwest::get(&url)
        .await
        .context("Failed to reach coachlink server")?;
    if !resp.status().is_success() {
        bail!("Server returned {}", resp.status());
    }
    resp.json().await.context("Failed to parse assignments")
}

async fn fetch_activities(port: u16, participant_id: Option<&str>) -> Result<Vec<Activity>> {
    let mut url = format!("http://127.0.0.1:{port}/api/activities");
    if let Some(pid) = participant_id {
        url = format!("{url}?participant_id={}", urlencoding::encode(pid));
    }

    let resp = reqwest::get(&url)
        .await
        .context("Failed to reach coachlink server")?;
    if !resp.status().is_success() {
        bail!("Server returned {}", resp.status());
    }
    resp.json().await.context("Failed to parse activities")
}

async fn post_reminders(port: u16, activity_id: &str) -> Result<RemindersResponse> {
    let url = format!(
        "http://127.0.0.1:{port}/api/activities/{}/reminders",
        urlencoding::encode(activity_id)
    );

    let resp = reqwest::Client::new()
        .post(&url)
        .send()
        .await
        .context("Failed to reach coachlink server")?;

    if resp.status() == reqwest::StatusCode::NOT_FOUND {
        bail!("No activity with id '{activity_id}'");
    }
    if !resp.status().is_success() {
        bail!("Server returned {}", resp.status());
    }

    resp.json().await.context("Failed to parse response")
}

async fn post_seed(port: u16) -> Result<SeedResponse> {
    let url = format!("http://127.0.0.1:{port}/api/seed");
    let resp = reqwest::Client::new()
        .post(&url)
        .send()
        .await
        .context("Failed to reach coachlink server")?;
    if !resp.status().is_success() {
        bail!("Server returned {}", resp.status());
    }
    resp.json().await.context("Failed to parse response")
}

// === Command Execution ===

pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve { port } => {
            let config = Config::load()?;
            server::start_server(port, config).await
        }
        Commands::Whoami { id } => whoami(&id).await,
        Commands::Partners { id } => show_partners(&id).await,
        Commands::Session {
            self_id,
            partner,
            chat,
            stay,
        } => start_session(&self_id, partner.as_deref(), chat, stay).await,
        Commands::Activities { participant_id } => show_activities(&participant_id).await,
        Commands::Remind { activity_id } => remind(&activity_id).await,
        Commands::List { entity } => list_entities(entity).await,
        Commands::Seed => seed().await,
    }
}

async fn whoami(id: &str) -> Result<()> {
    let port = ensure_server_running()?;
    let profile = fetch_profile(port, id).await?;

    println!(
        "{} ({}) - {}",
        profile.participant.display_name, profile.participant.id, profile.participant.role
    );
    println!("Entry flow: {}", profile.entry_flow);
    Ok(())
}

async fn show_partners(id: &str) -> Result<()> {
    let port = ensure_server_running()?;
    let partners = fetch_partners(port, id).await?;

    if partners.is_empty() {
        println!("No partners assigned.");
        return Ok(());
    }

    for partner in partners {
        println!("{} ({}) - {}", partner.display_name, partner.id, partner.role);
    }
    Ok(())
}

/// Outcome of resolving a partner under the role gate.
#[derive(Debug)]
enum PartnerResolution {
    /// A partner is settled; the session flow may proceed.
    Partner(String),
    /// A coach with nothing assigned; no session call is attempted.
    NothingAssigned,
    /// A coach must pick explicitly from these candidates first.
    SelectionRequired(Vec<Participant>),
}

/// Apply the role gate to pick a partner.
///
/// Direct flow takes the single assigned partner automatically; the
/// partner-selection flow requires an explicit, validated pick.
fn resolve_partner(
    flow: EntryFlow,
    self_id: &str,
    partner_flag: Option<&str>,
    partners: &[Participant],
) -> Result<PartnerResolution> {
    match flow {
        EntryFlow::Direct => match partner_flag {
            // An explicit pick still has to match the assignment.
            Some(p) => {
                if !partners.iter().any(|candidate| candidate.id == p) {
                    bail!("'{p}' is not your assigned coach");
                }
                Ok(PartnerResolution::Partner(p.to_string()))
            }
            None => match partners.first() {
                Some(partner) => Ok(PartnerResolution::Partner(partner.id.clone())),
                None => bail!("No coach assigned to '{self_id}' yet"),
            },
        },
        EntryFlow::PartnerSelection => {
            if partners.is_empty() {
                return Ok(PartnerResolution::NothingAssigned);
            }
            match partner_flag {
                Some(p) => {
                    if !partners.iter().any(|candidate| candidate.id == p) {
                        bail!("'{p}' is not one of your assigned students");
                    }
                    Ok(PartnerResolution::Partner(p.to_string()))
                }
                None => Ok(PartnerResolution::SelectionRequired(partners.to_vec())),
            }
        }
    }
}

/// Resolve the partner per the role gate, derive the shared session key,
/// create-or-join the room, and release it on the way out.
async fn start_session(
    self_id: &str,
    partner_flag: Option<&str>,
    chat: bool,
    stay: bool,
) -> Result<()> {
    let port = ensure_server_running()?;
    let profile = fetch_profile(port, self_id).await?;
    let partners = fetch_partners(port, self_id).await?;

    let flow = EntryFlow::for_role(Some(profile.participant.role));
    let partner_id = match resolve_partner(flow, self_id, partner_flag, &partners)? {
        PartnerResolution::Partner(id) => id,
        PartnerResolution::NothingAssigned => {
            println!("No students assigned; nothing to start a session with.");
            return Ok(());
        }
        PartnerResolution::SelectionRequired(candidates) => {
            println!("Pick a partner with --partner <id>:");
            for partner in &candidates {
                println!("  {} ({})", partner.display_name, partner.id);
            }
            return Ok(());
        }
    };

    // Both sides compute this independently and land on the same key.
    let key = SessionKey::derive(self_id, &partner_id)?;
    let kind = if chat { SessionKind::Chat } else { SessionKind::Video };

    let config = Config::load()?;
    let backend = SessionBackend::from_config(&config.platform);
    let members = Members {
        self_id: self_id.to_string(),
        partner_id: partner_id.clone(),
    };

    let handle = backend.get_or_create(kind, &key, &members).await?;
    if handle.created() {
        println!("Created {kind} session '{key}' with {partner_id}");
    } else {
        println!("Joining existing {kind} session '{key}' with {partner_id}");
    }

    let mut slot = ActiveSession::new();
    slot.set(handle).await?;
    if let Some(session) = slot.current_mut() {
        session.join().await?;
        println!("Joined {} session.", session.kind());
    }

    // Capture the wait outcome instead of propagating it here, so the
    // release below runs even when stdin fails mid-session.
    let wait_result = if stay {
        println!("Press Enter to leave...");
        let mut line = String::new();
        std::io::stdin()
            .read_line(&mut line)
            .map(drop)
            .context("Failed to read stdin")
    } else {
        Ok(())
    };

    release_session(&mut slot, wait_result).await?;
    println!("Left session '{key}'.");
    Ok(())
}

/// Release the active session, then surface the wait outcome.
///
/// Every exit path must release platform-side participation, including a
/// failed interactive wait; the leave therefore runs before the wait error
/// is propagated.
async fn release_session(slot: &mut ActiveSession, wait_result: Result<()>) -> Result<()> {
    slot.leave().await?;
    wait_result
}

async fn show_activities(participant_id: &str) -> Result<()> {
    let port = ensure_server_running()?;
    let activities = fetch_activities(port, Some(participant_id)).await?;

    if activities.is_empty() {
        println!("No scheduled activities.");
        return Ok(());
    }

    for activity in activities {
        println!(
            "{} - {} (starts {})",
            activity.id,
            activity.title,
            activity.starts_at.format("%Y-%m-%d %H:%M UTC")
        );
    }
    Ok(())
}

async fn remind(activity_id: &str) -> Result<()> {
    let port = ensure_server_running()?;
    let resp = post_reminders(port, activity_id).await?;
    println!(
        "Dispatched {} reminder(s) for activity {}",
        resp.scheduled, resp.activity_id
    );
    Ok(())
}

async fn list_entities(entity: ListEntity) -> Result<()> {
    let port = ensure_server_running()?;

    match entity {
        ListEntity::Participants => {
            let participants = fetch_participants(port).await?;
            if participants.is_empty() {
                println!("No participants. Try `coachlink seed`.");
                return Ok(());
            }
            for p in participants {
                println!("{} ({}) - {}", p.display_name, p.id, p.role);
            }
        }
        ListEntity::Assignments => {
            let assignments = fetch_assignments(port).await?;
            if assignments.is_empty() {
                println!("No assignments. Try `coachlink seed`.");
                return Ok(());
            }
            for a in assignments {
                let marker = if a.active { "active" } else { "inactive" };
                println!("{} coaches {} ({marker})", a.coach_id, a.student_id);
            }
        }
        ListEntity::Activities => {
            let activities = fetch_activities(port, None).await?;
            if activities.is_empty() {
                println!("No activities. Try `coachlink seed`.");
                return Ok(());
            }
            for activity in activities {
                println!(
                    "{} - {} for {} (starts {})",
                    activity.id,
                    activity.title,
                    activity.participant_id,
                    activity.starts_at.format("%Y-%m-%d %H:%M UTC")
                );
            }
        }
    }
    Ok(())
}

async fn seed() -> Result<()> {
    let port = ensure_server_running()?;
    let resp = post_seed(port).await?;
    println!(
        "Inserted {} participants, {} assignments, {} activities",
        resp.participants, resp.assignments, resp.activities
    );
    Ok(())
}
