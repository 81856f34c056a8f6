//! Console side of the shield control protocol.
//!
//! A console sends [`ConsoleMessage`]s upstream and receives
//! [`ShieldStateSnapshot`]s back. Toggles go out immediately. Parameter
//! changes from continuous controls (sliders) pass through a [`RateLimiter`]
//! first; anything arriving inside the cooldown is dropped, not queued.
//!
//! The limiter lives here, on the client side of the boundary. The
//! authoritative world clamps every accepted change again on its own.

use std::time::Duration;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::angle::Angle;
use crate::config::ShieldConfig;
use crate::id::{ConsoleId, ShieldId};
use crate::shield::{Color, GeometryUpdate, ShieldState};

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Console to authority.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConsoleMessage {
    ToggleShield,
    ChangeParameters {
        angle: Option<Angle>,
        width: Option<Angle>,
        radius: Option<i64>,
    },
}

impl ConsoleMessage {
    pub fn change(update: GeometryUpdate) -> Self {
        ConsoleMessage::ChangeParameters {
            angle: update.angle,
            width: update.width,
            radius: update.radius,
        }
    }
}

/// Authority to console. Everything a console UI needs to redraw the
/// shield without asking again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShieldStateSnapshot {
    pub bound_shield: Option<ShieldId>,
    pub bound_console: Option<ConsoleId>,
    pub enabled: bool,
    pub powered: bool,
    pub angle: Angle,
    pub width: Angle,
    pub radius: u32,
    pub color: Color,
    pub desired_draw: u64,
    pub max_width: Angle,
    pub max_radius: u32,
    pub position: DVec2,
    pub overloaded: bool,
    pub can_work: bool,
}

impl ShieldStateSnapshot {
    /// Project authoritative state into the client-visible shape.
    pub fn project(shield_id: ShieldId, shield: &ShieldState, console: Option<ConsoleId>) -> Self {
        Self {
            bound_shield: Some(shield_id),
            bound_console: console,
            enabled: shield.enabled(),
            powered: shield.powered(),
            angle: shield.angle(),
            width: shield.width(),
            radius: shield.radius(),
            color: shield.color,
            desired_draw: shield.desired_draw(),
            max_width: shield.config().max_width,
            max_radius: shield.config().max_radius,
            position: shield.position,
            overloaded: shield.overloaded(),
            can_work: shield.can_work(),
        }
    }
}

// ---------------------------------------------------------------------------
// Rate limiter
// ---------------------------------------------------------------------------

/// Minimum-interval gate over a monotonic clock.
///
/// `now` is any monotonic time expressed as a [`Duration`] since an
/// arbitrary epoch (typically the host's game clock).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiter {
    cooldown: Duration,
    next_allowed: Option<Duration>,
}

impl RateLimiter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            next_allowed: None,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn next_allowed(&self) -> Option<Duration> {
        self.next_allowed
    }

    /// Returns `true` and arms the cooldown if a request may go out at
    /// `now`. Rejected calls leave the deadline untouched.
    pub fn try_acquire(&mut self, now: Duration) -> bool {
        if let Some(next) = self.next_allowed
            && now < next
        {
            return false;
        }
        self.next_allowed = Some(now.saturating_add(self.cooldown));
        true
    }

    pub fn reset(&mut self) {
        self.next_allowed = None;
    }
}

// ---------------------------------------------------------------------------
// Console client
// ---------------------------------------------------------------------------

/// Client half of a console: rate-limits outgoing changes and keeps the
/// latest snapshot pushed by the authority.
#[derive(Debug, Clone)]
pub struct ConsoleClient {
    console: ConsoleId,
    limiter: RateLimiter,
    outbox: Vec<ConsoleMessage>,
    last_snapshot: Option<ShieldStateSnapshot>,
    dropped: u64,
}

impl ConsoleClient {
    pub fn new(console: ConsoleId, cooldown: Duration) -> Self {
        Self {
            console,
            limiter: RateLimiter::new(cooldown),
            outbox: Vec::new(),
            last_snapshot: None,
            dropped: 0,
        }
    }

    /// Client using the cooldown tuned on the shield's config.
    pub fn for_shield(console: ConsoleId, config: &ShieldConfig) -> Self {
        Self::new(console, config.cooldown)
    }

    pub fn cooldown(&self) -> Duration {
        self.limiter.cooldown()
    }

    pub fn console(&self) -> ConsoleId {
        self.console
    }

    /// Queue a toggle. Never rate limited.
    pub fn request_toggle(&mut self) {
        self.outbox.push(ConsoleMessage::ToggleShield);
    }

    /// Queue a parameter change if the cooldown allows it at `now`.
    /// Returns `false` when the request was dropped.
    pub fn request_parameter_change(&mut self, now: Duration, update: GeometryUpdate) -> bool {
        if !self.limiter.try_acquire(now) {
            self.dropped += 1;
            tracing::trace!(console = ?self.console, "parameter change dropped by cooldown");
            return false;
        }
        self.outbox.push(ConsoleMessage::change(update));
        true
    }

    /// Messages waiting to be sent, in request order.
    pub fn take_outbox(&mut self) -> Vec<ConsoleMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// Store a snapshot pushed by the authority (`None` when unbound).
    pub fn receive(&mut self, snapshot: Option<ShieldStateSnapshot>) {
        self.last_snapshot = snapshot;
    }

    pub fn snapshot(&self) -> Option<&ShieldStateSnapshot> {
        self.last_snapshot.as_ref()
    }

    /// Whether the last snapshot reported a bound shield.
    pub fn is_bound(&self) -> bool {
        self.last_snapshot
            .as_ref()
            .is_some_and(|s| s.bound_shield.is_some())
    }

    /// Parameter changes dropped by the limiter so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
