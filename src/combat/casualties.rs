//! Casualty distribution and unit consolidation.

use crate::world::{Army, ArmyUnit};

impl Army {
    /// Spreads `hits` evenly over the units (the first units absorb any
    /// remainder), turns them into casualties through each unit's armor,
    /// then consolidates. Returns the units that were removed.
    pub fn take_damage(&mut self, hits: u64) -> Vec<ArmyUnit> {
        if self.units.is_empty() || hits == 0 {
            return Vec::new();
        }
        let n = self.units.len() as u64;
        let (share, remainder) = (hits / n, hits % n);
        for (i, unit) in self.units.iter_mut().enumerate() {
            let received = share + u64::from((i as u64) < remainder);
            let landed = received * u64::from(unit.troop().armor) / 100;
            let size = unit.size();
            let total = u64::from(unit.casualties) + landed;
            unit.casualties = total.min(u64::from(size)) as u32;
        }
        self.consolidate()
    }

    /// Folds broken units into the rest of the army.
    ///
    /// While total casualties reach the size of the weakest unit, that unit
    /// is disbanded and its survivors refill the remaining units, reducing
    /// their casualties. Units with no survivors are dropped first. Every
    /// pass removes a unit, so the loop ends; afterwards every remaining
    /// unit has at least one soldier standing.
    pub fn consolidate(&mut self) -> Vec<ArmyUnit> {
        let mut removed = Vec::new();
        loop {
            if let Some(i) = self.units.iter().position(ArmyUnit::is_wiped_out) {
                removed.push(self.units.remove(i));
                continue;
            }
            let Some(weakest) = self.weakest_unit() else {
                break;
            };
            if self.total_casualties() < self.units[weakest].size() {
                break;
            }
            let unit = self.units.remove(weakest);
            self.reinforce(unit.alive());
            removed.push(unit);
        }
        removed
    }

    /// Index of the unit with the lowest troop strength; earliest on ties.
    fn weakest_unit(&self) -> Option<usize> {
        self.units
            .iter()
            .enumerate()
            .min_by_key(|(i, u)| (u.troop().strength, *i))
            .map(|(i, _)| i)
    }

    fn reinforce(&mut self, survivors: u32) {
        if self.units.is_empty() {
            return;
        }
        let n = self.units.len() as u32;
        let (share, remainder) = (survivors / n, survivors % n);
        for (i, unit) in self.units.iter_mut().enumerate() {
            let joined = share + u32::from((i as u32) < remainder);
            unit.casualties = unit.casualties.saturating_sub(joined);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::world::{Army, ArmyUnit, Hex, ItemCore, ItemId, TroopType};

    fn troop(name: &str, strength: u32, armor: u32) -> TroopType {
        TroopType {
            name: name.into(),
            size: 100,
            strength,
            armor,
            movement: 3,
            ..TroopType::default()
        }
    }

    fn army(units: &[TroopType]) -> Army {
        let mut army = Army::new(ItemCore::new(ItemId(1), "Host"), Hex::new(0, 0));
        for (i, t) in units.iter().enumerate() {
            army.units.push(ArmyUnit::new(ItemId(10 + i as u32), t));
        }
        army
    }

    #[test]
    fn hits_pass_through_armor() {
        let mut a = army(&[troop("Pikes", 10, 50), troop("Bows", 12, 100)]);
        a.take_damage(40);
        assert_eq!(a.units[0].casualties, 10);
        assert_eq!(a.units[1].casualties, 20);
    }

    #[test]
    fn remainder_goes_to_the_first_units() {
        let mut a = army(&[troop("A", 10, 100), troop("B", 10, 100), troop("C", 10, 100)]);
        a.take_damage(5);
        let got: Vec<u32> = a.units.iter().map(|u| u.casualties).collect();
        assert_eq!(got, vec![2, 2, 1]);
    }

    #[test]
    fn weakest_unit_is_folded_into_the_rest() {
        let mut a = army(&[troop("Militia", 5, 100), troop("Infantry", 10, 100)]);
        a.units[0].casualties = 60;
        a.units[1].casualties = 60;
        let removed = a.consolidate();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].troop_name(), "Militia");
        assert_eq!(a.units.len(), 1);
        assert_eq!(a.units[0].casualties, 20);
    }

    #[test]
    fn heavy_damage_wipes_out_the_army() {
        let mut a = army(&[troop("A", 10, 100), troop("B", 10, 100)]);
        a.take_damage(1000);
        assert!(a.units.is_empty());
        assert!(!a.is_active());
    }

    #[test]
    fn light_damage_keeps_every_unit() {
        let mut a = army(&[troop("A", 10, 100), troop("B", 10, 100)]);
        let removed = a.take_damage(30);
        assert!(removed.is_empty());
        assert_eq!(a.total_casualties(), 30);
    }
}
