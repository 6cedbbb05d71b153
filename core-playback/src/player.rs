//! # Session Player
//!
//! Drives a single audio resource through the [`PlayerState`] lifecycle.
//!
//! Operator commands (`preload`, `start`, `pause`, `resume`, `stop`,
//! `restart`) and host transport notifications ([`TransportEvent`], delivered
//! through [`SessionPlayer::handle_transport_event`]) both go through the same
//! transition table, so a late or spurious transport event can never move the
//! player somewhere the table does not allow.
//!
//! ## Locking
//!
//! The session record sits behind a mutex that is never held while calling
//! into the transport, so a host may deliver transport events synchronously
//! from inside `pause()` or `play()`.

use bridge_traits::media::{MediaError, MediaTransport, TransportEvent};
use core_runtime::events::{EventBus, EventStream, Receiver};
use core_runtime::logging::strip_url_query;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::events::{PlayerEvent, StateChange, TimeSnapshot, TrackStatus};
use crate::state::PlayerState;

/// Shown when the track fails to load or decode.
pub const LOAD_ERROR_MESSAGE: &str = "Could not load session audio. Check connection and try again.";
/// Shown when the platform refuses to start audio without a gesture.
pub const PLAY_BLOCKED_MESSAGE: &str = "Audio playback was blocked. Tap Start again.";
/// Shown for any other play failure.
pub const PLAY_FAILED_MESSAGE: &str = "Could not start playback. Please try again.";

#[derive(Debug, Default)]
struct Session {
    state: PlayerState,
    current_src: String,
    track_ready: bool,
    /// The next pause notification was requested by the operator.
    expected_pause: bool,
    /// Play as soon as the track signals ready.
    pending_start: bool,
    /// A stop is forcing idle; pause notifications are not state changes.
    stopping: bool,
}

/// Single-track player over a host [`MediaTransport`].
pub struct SessionPlayer {
    transport: Arc<dyn MediaTransport>,
    session: Mutex<Session>,
    events: EventBus<PlayerEvent>,
}

impl SessionPlayer {
    pub fn new(transport: Arc<dyn MediaTransport>) -> Self {
        Self {
            transport,
            session: Mutex::new(Session::default()),
            events: EventBus::default(),
        }
    }

    /// Publish on a shared event bus instead of a private one.
    pub fn with_event_bus(mut self, events: EventBus<PlayerEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> EventStream<PlayerEvent> {
        self.events.stream()
    }

    pub fn state(&self) -> PlayerState {
        self.session.lock().state
    }

    /// Current position, duration and remaining time. Never fails.
    pub fn snapshot(&self) -> TimeSnapshot {
        TimeSnapshot::from_transport(self.transport.current_time(), self.transport.duration())
    }

    pub fn is_track_ready_for(&self, src: &str) -> bool {
        let session = self.session.lock();
        session.track_ready && session.current_src == src
    }

    /// URL of the loaded track, if any.
    pub fn current_track(&self) -> Option<String> {
        let session = self.session.lock();
        (!session.current_src.is_empty()).then(|| session.current_src.clone())
    }

    fn emit(&self, event: PlayerEvent) {
        let _ = self.events.emit(event);
    }

    fn emit_track_status(&self, status: TrackStatus) {
        self.emit(PlayerEvent::TrackStatus(status));
    }

    /// Apply a transition if the table allows it. Same-state and
    /// out-of-table transitions are silent no-ops.
    fn transition(&self, next: PlayerState, message: Option<&str>, interrupted: Option<bool>) -> bool {
        let mut session = self.session.lock();
        self.transition_locked(&mut session, next, message, interrupted)
    }

    fn transition_locked(
        &self,
        session: &mut Session,
        next: PlayerState,
        message: Option<&str>,
        interrupted: Option<bool>,
    ) -> bool {
        let previous = session.state;
        if previous == next || !previous.can_transition_to(next) {
            debug!(from = %previous, to = %next, "Ignoring transition");
            return false;
        }

        session.state = next;
        debug!(from = %previous, to = %next, "Player state changed");
        self.emit(PlayerEvent::StateChanged(StateChange {
            state: next,
            message: message.map(str::to_string),
            interrupted,
        }));
        true
    }

    /// Make `src` the current track and begin loading it.
    ///
    /// Preloading the track that is already current and ready only repeats
    /// the ready notification.
    #[instrument(skip(self, src), fields(src = %strip_url_query(src)))]
    pub fn preload(&self, src: &str) {
        let already_ready = {
            let session = self.session.lock();
            session.current_src == src && session.track_ready
        };

        if already_ready {
            self.emit_track_status(TrackStatus::ready(src, self.transport.duration()));
            return;
        }

        {
            let mut session = self.session.lock();
            session.current_src = src.to_string();
            session.track_ready = false;
            session.pending_start = false;
        }

        self.transport.load(src);
        debug!("Loading track");
        self.emit_track_status(TrackStatus::loading(src));
    }

    /// Start `src`, loading it first if it is not the current track.
    ///
    /// If the track is not ready yet, playback begins on the ready signal.
    #[instrument(skip(self, src), fields(src = %strip_url_query(src)))]
    pub async fn start(&self, src: &str) {
        let is_current = self.session.lock().current_src == src;
        if !is_current {
            self.preload(src);
        }

        self.transition(PlayerState::Loading, None, None);

        {
            let mut session = self.session.lock();
            if !session.track_ready {
                debug!("Track not ready, deferring start");
                session.pending_start = true;
                return;
            }
        }

        self.play_internal().await;
    }

    /// Resume from `Paused`. Ignored in any other state.
    pub async fn resume(&self) {
        if self.state() != PlayerState::Paused {
            return;
        }
        self.play_internal().await;
    }

    /// Pause from `Playing`. Ignored in any other state.
    pub fn pause(&self) {
        {
            let mut session = self.session.lock();
            if session.state != PlayerState::Playing {
                return;
            }
            session.expected_pause = true;
        }
        self.transport.pause();
    }

    /// Force `Idle` with the position rewound to zero.
    ///
    /// Cancels a deferred start. Pause notifications caused by the stop do not
    /// surface as `Paused`.
    #[instrument(skip(self))]
    pub fn stop(&self) {
        {
            let mut session = self.session.lock();
            if !session.state.is_stoppable() {
                return;
            }
            session.stopping = true;
            session.pending_start = false;
            session.expected_pause = true;
        }

        if !self.transport.is_paused() {
            self.transport.pause();
        }
        self.transport.set_current_time(0.0);

        let mut session = self.session.lock();
        self.transition_locked(&mut session, PlayerState::Idle, None, None);
        session.stopping = false;
        session.expected_pause = false;
        info!("Playback stopped");
    }

    /// Rewind to zero and play again from `Loading`.
    #[instrument(skip(self))]
    pub async fn restart(&self) {
        self.transport.set_current_time(0.0);
        self.transition(PlayerState::Loading, None, None);
        self.play_internal().await;
    }

    async fn play_internal(&self) {
        if let Err(e) = self.transport.play().await {
            let message = match e {
                MediaError::NotAllowed => PLAY_BLOCKED_MESSAGE,
                MediaError::Failed(_) => PLAY_FAILED_MESSAGE,
            };
            warn!(error = %e, "Transport refused to play");
            self.transition(PlayerState::Error, Some(message), None);
        }
    }

    /// Feed a transport notification into the state machine.
    pub async fn handle_transport_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::LoadedMetadata | TransportEvent::CanPlay => self.on_ready().await,
            TransportEvent::Play => {
                self.transition(PlayerState::Playing, None, None);
            }
            TransportEvent::Pause => self.on_pause(),
            TransportEvent::Ended => {
                self.transition(PlayerState::Completed, None, None);
            }
            TransportEvent::TimeUpdate => {
                self.emit(PlayerEvent::TimeUpdate(self.snapshot()));
            }
            TransportEvent::Error => self.on_error(),
        }
    }

    async fn on_ready(&self) {
        let (src, start_now) = {
            let mut session = self.session.lock();
            session.track_ready = true;
            let start_now = std::mem::take(&mut session.pending_start);
            (session.current_src.clone(), start_now)
        };

        self.emit_track_status(TrackStatus::ready(src, self.transport.duration()));

        if start_now {
            debug!("Track ready, running deferred start");
            self.play_internal().await;
        }
    }

    fn on_pause(&self) {
        let ended = self.transport.has_ended();
        let mut session = self.session.lock();

        if ended || session.stopping {
            session.expected_pause = false;
            return;
        }

        let interrupted = !std::mem::take(&mut session.expected_pause);
        if session.state == PlayerState::Playing {
            if interrupted {
                info!("Playback interrupted");
            }
            self.transition_locked(&mut session, PlayerState::Paused, None, Some(interrupted));
        }
    }

    fn on_error(&self) {
        let src = {
            let mut session = self.session.lock();
            session.pending_start = false;
            session.current_src.clone()
        };

        warn!(src = %strip_url_query(&src), "Track failed to load");
        self.emit_track_status(TrackStatus::failed(src, LOAD_ERROR_MESSAGE));
        self.transition(PlayerState::Error, Some(LOAD_ERROR_MESSAGE), None);
    }
}

impl std::fmt::Debug for SessionPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.session.lock();
        f.debug_struct("SessionPlayer")
            .field("state", &session.state)
            .field("current_src", &session.current_src)
            .field("track_ready", &session.track_ready)
            .finish()
    }
}
