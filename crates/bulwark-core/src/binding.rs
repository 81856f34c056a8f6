//! One-to-one console/shield binding.
//!
//! Both directions are stored and always updated together, so
//! `shield_of(c) == Some(s)` exactly when `console_of(s) == Some(c)`.

use slotmap::SecondaryMap;

use crate::id::{ConsoleId, ShieldId};

#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    by_console: SecondaryMap<ConsoleId, ShieldId>,
    by_shield: SecondaryMap<ShieldId, ConsoleId>,
}

/// Pairs displaced by a [`BindingTable::bind`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rebind {
    /// Shield the console was bound to before.
    pub previous_shield: Option<ShieldId>,
    /// Console the shield was bound to before.
    pub previous_console: Option<ConsoleId>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `console` to `shield`, first releasing any existing partner of
    /// either side.
    pub fn bind(&mut self, console: ConsoleId, shield: ShieldId) -> Rebind {
        let previous_shield = self.unbind_console(console);
        let previous_console = self.unbind_shield(shield);
        self.by_console.insert(console, shield);
        self.by_shield.insert(shield, console);
        Rebind {
            previous_shield,
            previous_console,
        }
    }

    /// Release `console`. Returns the shield it was bound to.
    pub fn unbind_console(&mut self, console: ConsoleId) -> Option<ShieldId> {
        let shield = self.by_console.remove(console)?;
        self.by_shield.remove(shield);
        Some(shield)
    }

    /// Release `shield`. Returns the console it was bound to.
    pub fn unbind_shield(&mut self, shield: ShieldId) -> Option<ConsoleId> {
        let console = self.by_shield.remove(shield)?;
        self.by_console.remove(console);
        Some(console)
    }

    pub fn shield_of(&self, console: ConsoleId) -> Option<ShieldId> {
        self.by_console.get(console).copied()
    }

    pub fn console_of(&self, shield: ShieldId) -> Option<ConsoleId> {
        self.by_shield.get(shield).copied()
    }

    pub fn len(&self) -> usize {
        self.by_console.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_console.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConsoleId, ShieldId)> + '_ {
        self.by_console.iter().map(|(c, s)| (c, *s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn consoles(n: usize) -> Vec<ConsoleId> {
        let mut sm = SlotMap::<ConsoleId, ()>::with_key();
        (0..n).map(|_| sm.insert(())).collect()
    }

    fn shields(n: usize) -> Vec<ShieldId> {
        let mut sm = SlotMap::<ShieldId, ()>::with_key();
        (0..n).map(|_| sm.insert(())).collect()
    }

    fn assert_symmetric(table: &BindingTable) {
        for (c, s) in table.iter() {
            assert_eq!(table.console_of(s), Some(c));
        }
        assert_eq!(table.by_console.len(), table.by_shield.len());
    }

    #[test]
    fn bind_is_visible_from_both_sides() {
        let c = consoles(1);
        let s = shields(1);
        let mut table = BindingTable::new();

        let rebind = table.bind(c[0], s[0]);
        assert_eq!(rebind, Rebind::default());
        assert_eq!(table.shield_of(c[0]), Some(s[0]));
        assert_eq!(table.console_of(s[0]), Some(c[0]));
        assert_symmetric(&table);
    }

    #[test]
    fn rebinding_console_releases_old_shield() {
        let c = consoles(1);
        let s = shields(2);
        let mut table = BindingTable::new();

        table.bind(c[0], s[0]);
        let rebind = table.bind(c[0], s[1]);

        assert_eq!(rebind.previous_shield, Some(s[0]));
        assert_eq!(table.console_of(s[0]), None);
        assert_eq!(table.shield_of(c[0]), Some(s[1]));
        assert_eq!(table.len(), 1);
        assert_symmetric(&table);
    }

    #[test]
    fn rebinding_shield_releases_old_console() {
        let c = consoles(2);
        let s = shields(1);
        let mut table = BindingTable::new();

        table.bind(c[0], s[0]);
        let rebind = table.bind(c[1], s[0]);

        assert_eq!(rebind.previous_console, Some(c[0]));
        assert_eq!(table.shield_of(c[0]), None);
        assert_eq!(table.console_of(s[0]), Some(c[1]));
        assert_symmetric(&table);
    }

    #[test]
    fn unbind_clears_both_sides() {
        let c = consoles(1);
        let s = shields(1);
        let mut table = BindingTable::new();

        table.bind(c[0], s[0]);
        assert_eq!(table.unbind_shield(s[0]), Some(c[0]));
        assert_eq!(table.shield_of(c[0]), None);
        assert!(table.is_empty());

        table.bind(c[0], s[0]);
        assert_eq!(table.unbind_console(c[0]), Some(s[0]));
        assert_eq!(table.console_of(s[0]), None);
        assert_eq!(table.unbind_console(c[0]), None);
    }
}
