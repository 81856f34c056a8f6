//! Input command queue for externally-submitted shield mutations.
//!
//! Console messages, damage reports, power and anchoring changes and entry
//! notifications all arrive here first. They are executed at the start of
//! the next tick so no outside input interleaves with the tick's own steps.

use crate::console::ConsoleMessage;
use crate::id::{ConsoleId, ShieldId, TargetId};
use crate::sim::Ticks;

// ---------------------------------------------------------------------------
// Command enum
// ---------------------------------------------------------------------------

/// A single input submitted to the world.
#[derive(Debug, Clone, PartialEq)]
pub enum ShieldCommand {
    /// A message received from a console. Routed to the bound shield.
    Console {
        console: ConsoleId,
        message: ConsoleMessage,
    },
    /// Damage absorbed by a shield, in damage points.
    Damage { shield: ShieldId, points: f64 },
    /// Power-grid status for a shield.
    SetPowered { shield: ShieldId, powered: bool },
    /// Anchoring status of the shield's mounting.
    SetAnchored { shield: ShieldId, anchored: bool },
    /// A target entered the shield's covered sector.
    TargetEnter { shield: ShieldId, target: TargetId },
}

// ---------------------------------------------------------------------------
// CommandQueue
// ---------------------------------------------------------------------------

/// Commands waiting for the next tick boundary, with optional history.
#[derive(Debug)]
pub struct CommandQueue {
    pending: Vec<ShieldCommand>,
    /// Executed commands as (tick, command).
    history: Vec<(Ticks, ShieldCommand)>,
    /// 0 = no history.
    max_history: usize,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::with_max_history(0)
    }

    /// Queue that retains up to `max_history` executed commands.
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            pending: Vec::new(),
            history: Vec::new(),
            max_history,
        }
    }

    pub fn push(&mut self, command: ShieldCommand) {
        self.pending.push(command);
    }

    pub fn push_batch(&mut self, commands: impl IntoIterator<Item = ShieldCommand>) {
        self.pending.extend(commands);
    }

    /// Drain all pending commands in submission order, recording them in
    /// history under `tick`.
    pub fn drain(&mut self, tick: Ticks) -> Vec<ShieldCommand> {
        let commands: Vec<ShieldCommand> = self.pending.drain(..).collect();

        if self.max_history > 0 {
            self.history
                .extend(commands.iter().map(|cmd| (tick, cmd.clone())));
            let excess = self.history.len().saturating_sub(self.max_history);
            if excess > 0 {
                self.history.drain(..excess);
            }
        }

        commands
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn history(&self) -> &[(Ticks, ShieldCommand)] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
