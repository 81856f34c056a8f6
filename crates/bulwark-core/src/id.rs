use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a shield generator entity in the world.
    pub struct ShieldId;

    /// Identifies a shield control console entity in the world.
    pub struct ConsoleId;
}

/// Identifies a spatial grid container (a ship, a station). Assigned by the
/// host game, never by the shield world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridId(pub u32);

/// Reference to an external entity (projectile, ship, debris) owned by the
/// host game. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetId(pub u64);
