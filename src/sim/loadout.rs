//! The player's three weapon slots and the equipped selection

use serde::{Deserialize, Serialize};

use super::weapon::{Weapon, WeaponSlot};

/// Slot order used by `select(n)`: 1 = melee, 2 = gun, 3 = beam
const SLOT_ORDER: [WeaponSlot; 3] = [WeaponSlot::Melee, WeaponSlot::Projectile, WeaponSlot::Beam];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Loadout {
    melee: Option<Weapon>,
    gun: Option<Weapon>,
    beam: Option<Weapon>,
    current: Option<WeaponSlot>,
}

impl Loadout {
    /// Build a loadout; the gun is equipped first, then melee, then beam.
    ///
    /// A weapon whose kind does not match its slot is dropped with a warning.
    pub fn new(melee: Option<Weapon>, gun: Option<Weapon>, beam: Option<Weapon>) -> Self {
        let fit = |w: Option<Weapon>, slot: WeaponSlot| match w {
            Some(w) if w.slot() == slot => Some(w),
            Some(w) => {
                log::warn!("Weapon {} does not fit the {slot:?} slot, ignoring", w.name);
                None
            }
            None => None,
        };
        let mut loadout = Self {
            melee: fit(melee, WeaponSlot::Melee),
            gun: fit(gun, WeaponSlot::Projectile),
            beam: fit(beam, WeaponSlot::Beam),
            current: None,
        };
        loadout.current = [WeaponSlot::Projectile, WeaponSlot::Melee, WeaponSlot::Beam]
            .into_iter()
            .find(|&s| loadout.slot(s).is_some());
        if loadout.current.is_none() {
            log::warn!("No weapons in loadout");
        }
        loadout
    }

    pub fn standard() -> Self {
        Self::new(Some(Weapon::blade()), Some(Weapon::gun()), Some(Weapon::laser()))
    }

    pub fn slot(&self, slot: WeaponSlot) -> Option<&Weapon> {
        match slot {
            WeaponSlot::Melee => self.melee.as_ref(),
            WeaponSlot::Projectile => self.gun.as_ref(),
            WeaponSlot::Beam => self.beam.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, slot: WeaponSlot) -> Option<&mut Weapon> {
        match slot {
            WeaponSlot::Melee => self.melee.as_mut(),
            WeaponSlot::Projectile => self.gun.as_mut(),
            WeaponSlot::Beam => self.beam.as_mut(),
        }
    }

    pub fn current_slot(&self) -> Option<WeaponSlot> {
        self.current
    }

    pub fn current(&self) -> Option<&Weapon> {
        self.slot(self.current?)
    }

    pub fn current_mut(&mut self) -> Option<&mut Weapon> {
        let slot = self.current?;
        self.slot_mut(slot)
    }

    /// Equip slot `n` (1-based). Empty or already equipped slots are ignored.
    pub fn select(&mut self, n: u8) -> bool {
        let Some(&slot) = SLOT_ORDER.get((n as usize).wrapping_sub(1)) else {
            return false;
        };
        if self.current == Some(slot) || self.slot(slot).is_none() {
            return false;
        }
        self.current = Some(slot);
        log::debug!("Equipped {slot:?}");
        true
    }

    /// Count down every weapon's cooldowns, equipped or not
    pub fn tick(&mut self, dt: f32) {
        for w in self.iter_mut() {
            w.tick(dt);
        }
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Weapon> {
        [self.melee.as_mut(), self.gun.as_mut(), self.beam.as_mut()]
            .into_iter()
            .flatten()
    }
}
