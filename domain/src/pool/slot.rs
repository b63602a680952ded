//! Pool slot state machine.
//!
//! ```text
//!            begin_init            finish_init
//!   Cold ───────────────▶ Initializing ───────────▶ Idle ◀──────┐
//!                             │ fail_init            │ try_claim │ release
//!                             ▼                      ▼           │
//!                         Unhealthy ◀─────────────  Busy ────────┘
//!                             ▲      mark_unhealthy
//!                             │ fail_refresh
//!   Idle ── begin_refresh ──▶ Refreshing ── finish_refresh ──▶ Idle
//! ```
//!
//! The flags mirror what the pool exposes: `ready`, `busy`, `initializing`
//! and the session creation time. Every transition is a method here; the pool
//! calls them under the slot's lock so that check-and-set is atomic.

use std::time::{Duration, Instant};

/// Coarse phase derived from the slot flags, for logs and stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPhase {
    Cold,
    Initializing,
    Idle,
    Busy,
    Refreshing,
    Unhealthy,
}

impl std::fmt::Display for SlotPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SlotPhase::Cold => "cold",
            SlotPhase::Initializing => "initializing",
            SlotPhase::Idle => "idle",
            SlotPhase::Busy => "busy",
            SlotPhase::Refreshing => "refreshing",
            SlotPhase::Unhealthy => "unhealthy",
        };
        write!(f, "{}", s)
    }
}

/// Pool-visible status of one slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotState {
    pub ready: bool,
    pub busy: bool,
    pub initializing: bool,
    pub session_created_at: Option<Instant>,
    /// Set once any initialization has been attempted.
    attempted: bool,
}

impl SlotState {
    pub fn new() -> Self {
        Self::default()
    }

    /// `ready && !busy` is the only acquirable condition.
    pub fn is_acquirable(&self) -> bool {
        self.ready && !self.busy
    }

    /// Claim the slot for a request. Returns false if it was not acquirable.
    pub fn try_claim(&mut self) -> bool {
        if !self.is_acquirable() {
            return false;
        }
        self.busy = true;
        true
    }

    /// Return the slot after a request.
    pub fn release(&mut self) {
        self.busy = false;
    }

    /// Enter initialization (warmup). Returns false if one is already running.
    pub fn begin_init(&mut self) -> bool {
        if self.initializing {
            return false;
        }
        self.initializing = true;
        self.attempted = true;
        true
    }

    /// Whether the health check should re-initialize this slot.
    pub fn needs_reinit(&self) -> bool {
        !self.ready && !self.busy && !self.initializing
    }

    /// Enter re-initialization if the slot still needs it.
    pub fn begin_reinit(&mut self) -> bool {
        if !self.needs_reinit() {
            return false;
        }
        self.begin_init()
    }

    pub fn finish_init(&mut self, now: Instant) {
        self.ready = true;
        self.initializing = false;
        self.session_created_at = Some(now);
    }

    pub fn fail_init(&mut self) {
        self.ready = false;
        self.initializing = false;
        self.session_created_at = None;
    }

    /// Whether an idle session is older than `max_age`.
    pub fn is_stale(&self, now: Instant, max_age: Duration) -> bool {
        self.ready
            && !self.busy
            && !self.initializing
            && self
                .session_created_at
                .is_some_and(|created| now.saturating_duration_since(created) > max_age)
    }

    /// Take a stale slot out of rotation for a refresh.
    ///
    /// The slot is marked busy so acquire cannot see it until
    /// [`finish_refresh`](Self::finish_refresh) or
    /// [`fail_refresh`](Self::fail_refresh).
    pub fn begin_refresh(&mut self, now: Instant, max_age: Duration) -> bool {
        if !self.is_stale(now, max_age) {
            return false;
        }
        self.busy = true;
        self.initializing = true;
        true
    }

    pub fn finish_refresh(&mut self, now: Instant) {
        self.session_created_at = Some(now);
        self.initializing = false;
        self.busy = false;
    }

    pub fn fail_refresh(&mut self) {
        self.ready = false;
        self.session_created_at = None;
        self.initializing = false;
        self.busy = false;
    }

    /// Drop the slot from rotation after a session/auth failure.
    ///
    /// `busy` is left alone; the holder still releases it.
    pub fn mark_unhealthy(&mut self) {
        self.ready = false;
        self.session_created_at = None;
    }

    pub fn phase(&self) -> SlotPhase {
        match (self.ready, self.busy, self.initializing) {
            (_, true, true) => SlotPhase::Refreshing,
            (_, false, true) => SlotPhase::Initializing,
            (true, true, false) => SlotPhase::Busy,
            (true, false, false) => SlotPhase::Idle,
            (false, _, false) if !self.attempted => SlotPhase::Cold,
            (false, _, false) => SlotPhase::Unhealthy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_AGE: Duration = Duration::from_secs(600);

    fn ready_slot(created: Instant) -> SlotState {
        let mut slot = SlotState::new();
        assert!(slot.begin_init());
        slot.finish_init(created);
        slot
    }

    #[test]
    fn new_slot_is_cold_and_not_acquirable() {
        let slot = SlotState::new();
        assert_eq!(slot.phase(), SlotPhase::Cold);
        assert!(!slot.is_acquirable());
        assert!(slot.needs_reinit());
    }

    #[test]
    fn claim_is_exclusive() {
        let mut slot = ready_slot(Instant::now());
        assert!(slot.try_claim());
        assert_eq!(slot.phase(), SlotPhase::Busy);
        assert!(!slot.try_claim());
        slot.release();
        assert!(slot.try_claim());
    }

    #[test]
    fn failed_init_is_unhealthy() {
        let mut slot = SlotState::new();
        assert!(slot.begin_init());
        assert_eq!(slot.phase(), SlotPhase::Initializing);
        assert!(!slot.begin_init());
        slot.fail_init();
        assert_eq!(slot.phase(), SlotPhase::Unhealthy);
        assert!(slot.needs_reinit());
    }

    #[test]
    fn reinit_skips_busy_and_initializing() {
        let mut slot = ready_slot(Instant::now());
        assert!(slot.try_claim());
        slot.mark_unhealthy();
        assert!(!slot.begin_reinit());
        slot.release();
        assert!(slot.begin_reinit());
        assert!(!slot.begin_reinit());
    }

    #[test]
    fn mark_unhealthy_keeps_busy() {
        let mut slot = ready_slot(Instant::now());
        slot.try_claim();
        slot.mark_unhealthy();
        assert!(slot.busy);
        assert!(!slot.ready);
        assert!(slot.session_created_at.is_none());
    }

    #[test]
    fn staleness() {
        let start = Instant::now();
        let slot = ready_slot(start);
        assert!(!slot.is_stale(start + Duration::from_secs(599), MAX_AGE));
        assert!(!slot.is_stale(start + MAX_AGE, MAX_AGE));
        assert!(slot.is_stale(start + Duration::from_secs(601), MAX_AGE));
    }

    #[test]
    fn busy_slot_never_stale() {
        let start = Instant::now();
        let mut slot = ready_slot(start);
        slot.try_claim();
        assert!(!slot.is_stale(start + Duration::from_secs(3600), MAX_AGE));
    }

    #[test]
    fn refresh_hides_slot_from_acquire() {
        let start = Instant::now();
        let later = start + Duration::from_secs(700);
        let mut slot = ready_slot(start);

        assert!(slot.begin_refresh(later, MAX_AGE));
        assert_eq!(slot.phase(), SlotPhase::Refreshing);
        assert!(!slot.is_acquirable());
        assert!(!slot.begin_refresh(later, MAX_AGE));

        slot.finish_refresh(later);
        assert_eq!(slot.phase(), SlotPhase::Idle);
        assert_eq!(slot.session_created_at, Some(later));
    }

    #[test]
    fn failed_refresh_is_unhealthy() {
        let start = Instant::now();
        let later = start + Duration::from_secs(700);
        let mut slot = ready_slot(start);
        assert!(slot.begin_refresh(later, MAX_AGE));
        slot.fail_refresh();
        assert_eq!(slot.phase(), SlotPhase::Unhealthy);
        assert!(!slot.busy);
    }
}
