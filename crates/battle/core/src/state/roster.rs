use super::combatant::Combatant;
use super::ids::{CombatantId, Side};

/// All combatants of one battle, in creation order.
///
/// The roster is the single owner of combatant data. Lookups go through
/// [`CombatantId`]; defeated combatants stay in place.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Roster {
    combatants: Vec<Combatant>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a combatant. Returns false if the id is already taken.
    pub fn insert(&mut self, combatant: Combatant) -> bool {
        if self.contains(combatant.id) {
            return false;
        }
        self.combatants.push(combatant);
        true
    }

    pub fn contains(&self, id: CombatantId) -> bool {
        self.combatants.iter().any(|c| c.id == id)
    }

    pub fn get(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.iter_mut().find(|c| c.id == id)
    }

    /// Borrows two distinct combatants mutably at once.
    pub fn pair_mut(
        &mut self,
        first: CombatantId,
        second: CombatantId,
    ) -> Option<(&mut Combatant, &mut Combatant)> {
        if first == second {
            return None;
        }
        let a = self.combatants.iter().position(|c| c.id == first)?;
        let b = self.combatants.iter().position(|c| c.id == second)?;
        if a < b {
            let (left, right) = self.combatants.split_at_mut(b);
            Some((&mut left[a], &mut right[0]))
        } else {
            let (left, right) = self.combatants.split_at_mut(a);
            Some((&mut right[0], &mut left[b]))
        }
    }

    pub fn is_alive(&self, id: CombatantId) -> bool {
        self.get(id).is_some_and(Combatant::is_alive)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Combatant> {
        self.combatants.iter_mut()
    }

    pub fn side(&self, side: Side) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter().filter(move |c| c.side == side)
    }

    /// Living combatants of a side: the valid targets.
    pub fn living(&self, side: Side) -> impl Iterator<Item = &Combatant> {
        self.side(side).filter(|c| c.is_alive())
    }

    pub fn living_ids(&self, side: Side) -> Vec<CombatantId> {
        self.living(side).map(|c| c.id).collect()
    }

    /// Living enemies of `id`.
    pub fn opponents_of(&self, id: CombatantId) -> Vec<CombatantId> {
        self.get(id)
            .map(|c| self.living_ids(c.side.opponent()))
            .unwrap_or_default()
    }

    /// Living allies of `id`, including itself.
    pub fn allies_of(&self, id: CombatantId) -> Vec<CombatantId> {
        self.get(id)
            .map(|c| self.living_ids(c.side))
            .unwrap_or_default()
    }

    /// True when no combatant of `side` is alive.
    pub fn all_defeated(&self, side: Side) -> bool {
        self.living(side).next().is_none()
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    /// Splits the roster back into its sides, consuming it.
    pub fn into_sides(self) -> (Vec<Combatant>, Vec<Combatant>) {
        self.combatants.into_iter().partition(|c| c.side == Side::Party)
    }
}

impl FromIterator<Combatant> for Roster {
    fn from_iter<I: IntoIterator<Item = Combatant>>(iter: I) -> Self {
        let mut roster = Roster::new();
        for combatant in iter {
            roster.insert(combatant);
        }
        roster
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::DamageFlags;
    use crate::stats::BaseStats;

    fn roster() -> Roster {
        [
            Combatant::new(CombatantId(1), "a", Side::Party, BaseStats::new()),
            Combatant::new(CombatantId(2), "b", Side::Party, BaseStats::new()),
            Combatant::new(CombatantId(10), "x", Side::Foe, BaseStats::new()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn defeated_are_not_targets() {
        let mut roster = roster();
        roster
            .get_mut(CombatantId(2))
            .unwrap()
            .take_damage(1_000_000, DamageFlags::empty());

        assert_eq!(roster.allies_of(CombatantId(1)), vec![CombatantId(1)]);
        assert_eq!(roster.opponents_of(CombatantId(10)), vec![CombatantId(1)]);
        assert!(roster.contains(CombatantId(2)));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut roster = roster();
        assert!(!roster.insert(Combatant::new(
            CombatantId(1),
            "dup",
            Side::Foe,
            BaseStats::new()
        )));
        assert_eq!(roster.len(), 3);
    }

    #[test]
    fn pair_mut_borrows_both() {
        let mut roster = roster();
        let (a, x) = roster.pair_mut(CombatantId(1), CombatantId(10)).unwrap();
        assert_eq!((a.id, x.id), (CombatantId(1), CombatantId(10)));
        let (x, a) = roster.pair_mut(CombatantId(10), CombatantId(1)).unwrap();
        assert_eq!((x.id, a.id), (CombatantId(10), CombatantId(1)));
        assert!(roster.pair_mut(CombatantId(1), CombatantId(1)).is_none());
    }

    #[test]
    fn side_wiped_out() {
        let mut roster = roster();
        assert!(!roster.all_defeated(Side::Foe));
        roster
            .get_mut(CombatantId(10))
            .unwrap()
            .take_damage(1_000_000, DamageFlags::empty());
        assert!(roster.all_defeated(Side::Foe));
    }
}
