//! Session handle and the single active-session slot.

use crate::identity::SessionKey;
use crate::session::{SessionBackend, SessionError, SessionKind};

/// Handle to one session on the platform, from one participant's side.
///
/// Exposes exactly the two state-changing operations the platform offers:
/// [`join`](Self::join) and [`leave`](Self::leave). Duplicate transitions
/// collapse locally so callers cannot double-acquire media resources.
#[derive(Debug)]
pub struct SessionHandle {
    kind: SessionKind,
    key: SessionKey,
    self_id: String,
    created: bool,
    joined: bool,
    backend: SessionBackend,
}

impl SessionHandle {
    pub(crate) fn new(
        kind: SessionKind,
        key: SessionKey,
        self_id: String,
        created: bool,
        backend: SessionBackend,
    ) -> Self {
        Self {
            kind,
            key,
            self_id,
            created,
            joined: false,
            backend,
        }
    }

    /// The derived key identifying the session.
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// The room type.
    pub const fn kind(&self) -> SessionKind {
        self.kind
    }

    /// Whether the platform created the session on this get-or-create.
    pub const fn created(&self) -> bool {
        self.created
    }

    /// Whether this side currently participates.
    pub const fn is_joined(&self) -> bool {
        self.joined
    }

    /// Transition local participation to active.
    pub async fn join(&mut self) -> Result<(), SessionError> {
        if self.joined {
            return Ok(());
        }
        self.backend.join(self.kind, &self.key, &self.self_id).await?;
        self.joined = true;
        Ok(())
    }

    /// Transition to inactive and release platform-side participation.
    ///
    /// Safe to call when not joined.
    pub async fn leave(&mut self) -> Result<(), SessionError> {
        if !self.joined {
            return Ok(());
        }
        self.backend
            .leave(self.kind, &self.key, &self.self_id)
            .await?;
        self.joined = false;
        Ok(())
    }
}

/// Explicitly owned slot for the one current session.
///
/// Owned by the UI layer driving the session, one instance per participant;
/// not a process-wide singleton. Callers are expected to serialize calls on
/// the slot (no second `join` while one is outstanding) — the slot holds
/// `&mut self` for every transition, so the borrow checker enforces that
/// within one instance.
#[derive(Debug, Default)]
pub struct ActiveSession {
    current: Option<SessionHandle>,
}

impl ActiveSession {
    /// An empty slot.
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// The current handle, if any.
    pub fn current(&self) -> Option<&SessionHandle> {
        self.current.as_ref()
    }

    /// Mutable access for join/leave on the current session.
    pub fn current_mut(&mut self) -> Option<&mut SessionHandle> {
        self.current.as_mut()
    }

    /// Install a new session, leaving any previous one first.
    pub async fn set(&mut self, handle: SessionHandle) -> Result<(), SessionError> {
        self.leave().await?;
        self.current = Some(handle);
        Ok(())
    }

    /// Leave and drop the current session.
    ///
    /// Called on every exit path (explicit end, sign-out, backgrounding);
    /// a no-op when no session is active.
    pub async fn leave(&mut self) -> Result<(), SessionError> {
        if let Some(mut handle) = self.current.take() {
            handle.leave().await?;
        }
        Ok(())
    }
}
