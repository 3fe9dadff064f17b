//! Heuristic watch-time tracking for the playback view.
//!
//! The player is an opaque embedded surface, so nothing about real playback
//! position is observable. Instead a fixed-period tick accumulates minutes
//! while tracking is active, and clicks on the player toggle tracking.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::history::{WatchStatus, WatchStore};

pub const TICK_PERIOD: Duration = Duration::from_secs(5);

/// Minutes credited per tick
pub const TICK_MINUTES: f64 = 5.0 / 60.0;

/// Clicks this close to the container's bottom edge land on the embedded
/// player's own control bar and never toggle tracking
pub const CONTROL_BAR_HEIGHT_PX: f64 = 80.0;

/// Axis-aligned box in pixels, origin at the top-left
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Geometry of the playback view the click listener is attached to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSurface {
    pub container: Bounds,
}

/// What a click landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Container,
    Player,
    /// Buttons and other controls drawn over the container
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Click {
    pub target: ClickTarget,
    /// Vertical position in the same coordinate space as the surface bounds
    pub y: f64,
    /// 1 for a single click, 2 or more for the later clicks of a multi-click
    pub count: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Overlay,
    DoubleClick,
    ControlBar,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Paused,
    Resumed,
    Ignored(IgnoreReason),
}

/// Decide whether a click may toggle tracking on this surface
pub fn classify_click(surface: &PlaybackSurface, click: &Click) -> Result<(), IgnoreReason> {
    if click.target == ClickTarget::Overlay {
        return Err(IgnoreReason::Overlay);
    }
    if click.count >= 2 {
        return Err(IgnoreReason::DoubleClick);
    }
    if click.y > surface.container.bottom() - CONTROL_BAR_HEIGHT_PX {
        return Err(IgnoreReason::ControlBar);
    }
    Ok(())
}

/// Video id from a navigation path such as `/watch/12`: its final non-empty segment
pub fn video_id_from_path(path: &str) -> Option<&str> {
    path.split(['?', '#'])
        .next()
        .unwrap_or_default()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .next_back()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    Active,
    Paused,
    TornDown,
}

enum TimerState {
    /// Ticking; dropping the interval stops it
    Active(Interval),
    Paused,
    TornDown,
}

/// Tracks estimated watch time for one video on the playback view.
///
/// Ticks are driven by awaiting [`WatchTimer::tick`] from the view's event
/// loop. The final `completed` write happens on [`WatchTimer::finish`] or,
/// failing that, when the timer is dropped.
pub struct WatchTimer {
    store: Arc<dyn WatchStore>,
    video_id: String,
    surface: PlaybackSurface,
    state: TimerState,
    minutes_watched: f64,
}

impl WatchTimer {
    /// Attach to a playback view. Returns `None` when the path carries no
    /// video id or the view has no player container.
    pub fn attach(
        store: Arc<dyn WatchStore>,
        path: &str,
        surface: Option<PlaybackSurface>,
    ) -> Option<Self> {
        let Some(video_id) = video_id_from_path(path) else {
            debug!(path, "no video id in path, watch tracking disabled");
            return None;
        };
        let Some(surface) = surface else {
            debug!(video_id, "no player container, watch tracking disabled");
            return None;
        };
        Some(Self::start(store, video_id, surface))
    }

    /// Create the record if needed and start ticking.
    ///
    /// Must be called within a tokio runtime.
    pub fn start(
        store: Arc<dyn WatchStore>,
        video_id: impl Into<String>,
        surface: PlaybackSurface,
    ) -> Self {
        let video_id = video_id.into();

        let mut history = store.load();
        let (record, created) = history.get_or_create(&video_id, Utc::now());
        let minutes_watched = record.minutes_watched;
        if created {
            store.save(&history);
            info!(video_id = %video_id, "started tracking new video");
        } else {
            info!(video_id = %video_id, minutes = minutes_watched, "resumed tracking video");
        }

        Self {
            store,
            video_id,
            surface,
            state: TimerState::Active(Self::new_interval()),
            minutes_watched,
        }
    }

    fn new_interval() -> Interval {
        let mut interval = tokio::time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// The view was laid out again, e.g. after a resize
    pub fn set_surface(&mut self, surface: PlaybackSurface) {
        self.surface = surface;
    }

    /// Minutes as of the last write made by this timer
    pub fn minutes_watched(&self) -> f64 {
        self.minutes_watched
    }

    pub fn state(&self) -> TrackingState {
        match self.state {
            TimerState::Active(_) => TrackingState::Active,
            TimerState::Paused => TrackingState::Paused,
            TimerState::TornDown => TrackingState::TornDown,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, TimerState::Active(_))
    }

    /// Wait for the next tick and credit it to the store.
    ///
    /// Never completes unless tracking is active, so it can sit in a
    /// `tokio::select!` next to input handling. Cancel safe.
    pub async fn tick(&mut self) {
        match &mut self.state {
            TimerState::Active(interval) => {
                interval.tick().await;
            }
            _ => std::future::pending::<()>().await,
        }
        self.accumulate();
    }

    fn accumulate(&mut self) {
        let now = Utc::now();
        // Reload so writes from elsewhere since the last tick are kept
        let mut history = self.store.load();
        let (record, _) = history.get_or_create(&self.video_id, now);
        record.minutes_watched += TICK_MINUTES;
        record.last_watched_at = now;
        self.minutes_watched = record.minutes_watched;
        self.store.save(&history);
        debug!(video_id = %self.video_id, minutes = self.minutes_watched, "watch tick");
    }

    /// Apply the click heuristic, toggling tracking for qualifying clicks
    pub fn handle_click(&mut self, click: &Click) -> ClickOutcome {
        if matches!(self.state, TimerState::TornDown) {
            return ClickOutcome::Ignored(IgnoreReason::Finished);
        }
        if let Err(reason) = classify_click(&self.surface, click) {
            debug!(?reason, y = click.y, "click ignored");
            return ClickOutcome::Ignored(reason);
        }

        match self.toggle() {
            TrackingState::Active => ClickOutcome::Resumed,
            TrackingState::Paused => ClickOutcome::Paused,
            TrackingState::TornDown => ClickOutcome::Ignored(IgnoreReason::Finished),
        }
    }

    pub fn toggle(&mut self) -> TrackingState {
        match self.state {
            TimerState::Active(_) => {
                self.pause();
            }
            TimerState::Paused => {
                self.resume();
            }
            TimerState::TornDown => {}
        }
        self.state()
    }

    /// Stop ticking. Returns false if tracking was not active.
    pub fn pause(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.state = TimerState::Paused;
        info!(video_id = %self.video_id, "tracking paused");
        true
    }

    /// Start ticking again with a fresh period. Returns false unless paused.
    pub fn resume(&mut self) -> bool {
        if !matches!(self.state, TimerState::Paused) {
            return false;
        }
        self.state = TimerState::Active(Self::new_interval());
        info!(video_id = %self.video_id, "tracking resumed");
        true
    }

    /// End the session: stop ticking and mark the video completed
    pub fn finish(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if matches!(self.state, TimerState::TornDown) {
            return;
        }
        self.state = TimerState::TornDown;

        let now = Utc::now();
        let mut history = self.store.load();
        let (record, _) = history.get_or_create(&self.video_id, now);
        record.status = WatchStatus::Completed;
        record.last_watched_at = now;
        self.minutes_watched = record.minutes_watched;
        self.store.save(&history);
        info!(video_id = %self.video_id, minutes = self.minutes_watched, "watch session ended");
    }
}

impl Drop for WatchTimer {
    fn drop(&mut self) {
        self.teardown();
    }
}
