//! Shield events emitted by [`ShieldWorld::step`](crate::world::ShieldWorld::step).
//!
//! Events describe transitions, so each is emitted once when the state
//! changes rather than every tick it holds.

use crate::id::{ConsoleId, ShieldId};
use crate::sim::Ticks;

/// Why a console command had no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The console is not bound to a shield.
    Unbound,
    /// The console id is not known to the world.
    UnknownConsole,
    /// The toggle was refused because the shield is not anchored.
    Unanchored,
}

/// A shield event. All events carry the tick at which they occurred.
#[derive(Debug, Clone, PartialEq)]
pub enum ShieldEvent {
    // -- Operator --
    Toggled {
        shield: ShieldId,
        enabled: bool,
        tick: Ticks,
    },
    GeometryChanged {
        shield: ShieldId,
        tick: Ticks,
    },
    CommandIgnored {
        console: ConsoleId,
        reason: IgnoreReason,
        tick: Ticks,
    },

    // -- Power --
    PowerChanged {
        shield: ShieldId,
        powered: bool,
        tick: Ticks,
    },
    AnchorChanged {
        shield: ShieldId,
        anchored: bool,
        tick: Ticks,
    },
    Overloaded {
        shield: ShieldId,
        draw: u64,
        tick: Ticks,
    },
    OverloadCleared {
        shield: ShieldId,
        draw: u64,
        tick: Ticks,
    },

    // -- Surge --
    SurgeStarted {
        shield: ShieldId,
        power: f64,
        tick: Ticks,
    },
    SurgeEnded {
        shield: ShieldId,
        tick: Ticks,
    },
}

impl ShieldEvent {
    pub fn tick(&self) -> Ticks {
        match self {
            ShieldEvent::Toggled { tick, .. }
            | ShieldEvent::GeometryChanged { tick, .. }
            | ShieldEvent::CommandIgnored { tick, .. }
            | ShieldEvent::PowerChanged { tick, .. }
            | ShieldEvent::AnchorChanged { tick, .. }
            | ShieldEvent::Overloaded { tick, .. }
            | ShieldEvent::OverloadCleared { tick, .. }
            | ShieldEvent::SurgeStarted { tick, .. }
            | ShieldEvent::SurgeEnded { tick, .. } => *tick,
        }
    }

    /// The shield the event concerns, if any.
    pub fn shield(&self) -> Option<ShieldId> {
        match self {
            ShieldEvent::CommandIgnored { .. } => None,
            ShieldEvent::Toggled { shield, .. }
            | ShieldEvent::GeometryChanged { shield, .. }
            | ShieldEvent::PowerChanged { shield, .. }
            | ShieldEvent::AnchorChanged { shield, .. }
            | ShieldEvent::Overloaded { shield, .. }
            | ShieldEvent::OverloadCleared { shield, .. }
            | ShieldEvent::SurgeStarted { shield, .. }
            | ShieldEvent::SurgeEnded { shield, .. } => Some(*shield),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn accessors_cover_every_variant() {
        let mut shields = SlotMap::<ShieldId, ()>::with_key();
        let mut consoles = SlotMap::<ConsoleId, ()>::with_key();
        let shield = shields.insert(());
        let console = consoles.insert(());

        let ignored = ShieldEvent::CommandIgnored {
            console,
            reason: IgnoreReason::Unbound,
            tick: 3,
        };
        assert_eq!(ignored.tick(), 3);
        assert_eq!(ignored.shield(), None);

        let tripped = ShieldEvent::Overloaded {
            shield,
            draw: 10_025,
            tick: 9,
        };
        assert_eq!(tripped.tick(), 9);
        assert_eq!(tripped.shield(), Some(shield));
    }
}
