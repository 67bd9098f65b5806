//! Buildings and their occupancy.
//!
//! A [`Building`] wraps its mutable occupancy in its own reader/writer lock.
//! Mutations ([`Building::add_resident`], [`Building::buy_apartment`], ...)
//! take the exclusive lock for the duration of one set mutation; probes
//! ([`Building::occupied`], [`Building::has_room`]) take the shared lock.
//!
//! The occupied count is the size of the resident set, so
//! `occupied == |residents|` holds by construction. `occupied <= capacity`
//! is checked inside the exclusive section of every inserting operation.
//! A refused mutation returns `false`; nothing here raises.

use std::collections::BTreeSet;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use humanity_ledger::{Flow, Ledger};
use humanity_types::{AgentId, BuildingId, BuildingType, CityId, JobId};

/// A geographic position. Stored for output only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

/// A capacity-bounded structure in a city.
#[derive(Debug)]
pub struct Building {
    /// Unique id, also the lock-ordering key for two-building operations.
    pub id: BuildingId,
    /// Display name, e.g. `"Greenville House 2"`.
    pub name: String,
    /// What kind of building this is.
    pub kind: BuildingType,
    /// The city the building belongs to.
    pub city: CityId,
    /// Maximum number of registered residents.
    pub capacity: u32,
    /// Price of one apartment when bought from or sold to the city.
    pub apartment_price: i64,
    /// Position on the map.
    pub location: Coordinates,
    /// Jobs hosted here (workplaces only). Fixed at construction.
    pub jobs: Vec<JobId>,
    residents: RwLock<BTreeSet<AgentId>>,
}

impl Building {
    /// Create an empty building.
    pub fn new(
        id: BuildingId,
        name: String,
        kind: BuildingType,
        city: CityId,
        capacity: u32,
        apartment_price: i64,
        location: Coordinates,
    ) -> Self {
        Self {
            id,
            name,
            kind,
            city,
            capacity,
            apartment_price,
            location,
            jobs: Vec::new(),
            residents: RwLock::new(BTreeSet::new()),
        }
    }

    /// Number of registered residents.
    pub fn occupied(&self) -> u32 {
        let residents = self.residents.read();
        u32::try_from(residents.len()).unwrap_or(u32::MAX)
    }

    /// Whether another resident would fit.
    pub fn has_room(&self) -> bool {
        self.occupied() < self.capacity
    }

    /// Whether the agent is a registered resident.
    pub fn is_resident(&self, agent: AgentId) -> bool {
        self.residents.read().contains(&agent)
    }

    /// A copy of the resident set.
    pub fn residents(&self) -> BTreeSet<AgentId> {
        self.residents.read().clone()
    }

    /// Register a resident. Refused for non-residential buildings, when
    /// full, or when the agent already lives here.
    pub fn add_resident(&self, agent: AgentId) -> bool {
        if !self.kind.is_residential() {
            return false;
        }
        let mut residents = self.residents.write();
        insert_within_capacity(&mut residents, self.capacity, agent)
    }

    /// Deregister a resident. Returns `false` if the agent did not live here.
    pub fn remove_resident(&self, agent: AgentId) -> bool {
        self.residents.write().remove(&agent)
    }

    /// Buy an apartment from the city: the buyer must afford the price and
    /// the building must have room.
    pub fn buy_apartment(&self, agent: AgentId, ledger: &Ledger) -> bool {
        if !self.kind.is_residential() || ledger.balance(agent) < self.apartment_price {
            return false;
        }
        let mut residents = self.residents.write();
        if !insert_within_capacity(&mut residents, self.capacity, agent) {
            return false;
        }
        ledger.debit(agent, self.apartment_price, Flow::ApartmentPurchase);
        debug!(agent = %agent, building = %self.id, price = self.apartment_price, "Apartment bought");
        true
    }

    /// Sell the agent's apartment back to the city for the apartment price.
    pub fn sell_apartment(&self, agent: AgentId, ledger: &Ledger) -> bool {
        if !self.residents.write().remove(&agent) {
            return false;
        }
        ledger.credit(agent, self.apartment_price, Flow::ApartmentSale);
        debug!(agent = %agent, building = %self.id, price = self.apartment_price, "Apartment sold");
        true
    }

    /// Move `agent` from `from` into `to`, selling the vacated unit back to
    /// the city.
    ///
    /// Both buildings are locked in ascending id order and the move happens
    /// entirely inside that critical section, so no observer ever sees the
    /// agent in both buildings or in neither. Refused (with no change) when
    /// the agent does not live in `from` or `to` is full. Moving within the
    /// same building is a successful no-op.
    pub fn move_to_spouse(from: &Self, to: &Self, agent: AgentId, ledger: &Ledger) -> bool {
        if from.id == to.id {
            return from.is_resident(agent);
        }
        if !to.kind.is_residential() {
            return false;
        }
        let (first, second) = if from.id < to.id { (from, to) } else { (to, from) };
        let mut first_guard = first.residents.write();
        let mut second_guard = second.residents.write();
        let (source, destination) = if from.id < to.id {
            (&mut *first_guard, &mut *second_guard)
        } else {
            (&mut *second_guard, &mut *first_guard)
        };

        if !source.contains(&agent) || !insert_within_capacity(destination, to.capacity, agent) {
            return false;
        }
        source.remove(&agent);
        ledger.credit(agent, from.apartment_price, Flow::ApartmentSale);
        debug!(agent = %agent, from = %from.id, to = %to.id, "Moved in with spouse");
        true
    }
}

/// Insert `agent` unless the set is full or already holds it.
fn insert_within_capacity(residents: &mut BTreeSet<AgentId>, capacity: u32, agent: AgentId) -> bool {
    let fits = u32::try_from(residents.len()).is_ok_and(|occupied| occupied < capacity);
    fits && residents.insert(agent)
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use rayon::prelude::*;

    use super::*;

    fn house(id: u32, capacity: u32) -> Building {
        Building::new(
            BuildingId::new(id),
            format!("House {id}"),
            BuildingType::ResidentialHouse,
            CityId::new(0),
            capacity,
            1_000,
            Coordinates::default(),
        )
    }

    fn ledger_with(balances: &[i64]) -> Ledger {
        let mut ledger = Ledger::new();
        for balance in balances {
            ledger.open_account(*balance);
        }
        ledger
    }

    #[test]
    fn add_resident_respects_capacity() {
        let building = house(0, 2);
        assert!(building.add_resident(AgentId::new(1)));
        assert!(building.add_resident(AgentId::new(2)));
        assert!(!building.add_resident(AgentId::new(3)));
        assert_eq!(building.occupied(), 2);
        assert!(!building.has_room());
    }

    #[test]
    fn duplicate_resident_is_refused() {
        let building = house(0, 5);
        assert!(building.add_resident(AgentId::new(1)));
        assert!(!building.add_resident(AgentId::new(1)));
        assert_eq!(building.occupied(), 1);
    }

    #[test]
    fn workplaces_hold_no_residents() {
        let office = Building::new(
            BuildingId::new(4),
            "Office".to_owned(),
            BuildingType::Workplace,
            CityId::new(0),
            100,
            0,
            Coordinates::default(),
        );
        assert!(!office.add_resident(AgentId::new(0)));
    }

    #[test]
    fn remove_missing_resident_fails() {
        let building = house(0, 5);
        assert!(!building.remove_resident(AgentId::new(9)));
    }

    #[test]
    fn buy_apartment_checks_funds_and_debits_price() {
        let building = house(0, 5);
        let ledger = ledger_with(&[500, 5_000]);
        assert!(!building.buy_apartment(AgentId::new(0), &ledger));
        assert!(building.buy_apartment(AgentId::new(1), &ledger));
        assert_eq!(ledger.balance(AgentId::new(1)), 4_000);
        assert!(building.is_resident(AgentId::new(1)));
    }

    #[test]
    fn sell_apartment_credits_price() {
        let building = house(0, 5);
        let ledger = ledger_with(&[0]);
        assert!(building.add_resident(AgentId::new(0)));
        assert!(building.sell_apartment(AgentId::new(0), &ledger));
        assert_eq!(ledger.balance(AgentId::new(0)), 1_000);
        assert!(!building.sell_apartment(AgentId::new(0), &ledger));
    }

    #[test]
    fn move_to_spouse_relocates_and_sells_old_unit() {
        let hers = house(3, 5);
        let his = house(1, 5);
        let ledger = ledger_with(&[0]);
        let bride = AgentId::new(0);
        assert!(hers.add_resident(bride));

        assert!(Building::move_to_spouse(&hers, &his, bride, &ledger));
        assert!(!hers.is_resident(bride));
        assert!(his.is_resident(bride));
        assert_eq!(ledger.balance(bride), 1_000);
    }

    #[test]
    fn move_to_full_building_changes_nothing() {
        let from = house(0, 5);
        let to = house(1, 1);
        let ledger = ledger_with(&[0, 0]);
        assert!(from.add_resident(AgentId::new(0)));
        assert!(to.add_resident(AgentId::new(1)));

        assert!(!Building::move_to_spouse(&from, &to, AgentId::new(0), &ledger));
        assert!(from.is_resident(AgentId::new(0)));
        assert_eq!(to.occupied(), 1);
        assert_eq!(ledger.balance(AgentId::new(0)), 0);
    }

    #[test]
    fn opposing_moves_do_not_deadlock() {
        let a = house(0, 1_000);
        let b = house(1, 1_000);
        let ledger = ledger_with(&vec![0; 400]);
        for i in 0..200 {
            a.add_resident(AgentId::new(i));
            b.add_resident(AgentId::new(i + 200));
        }
        (0..400_u32).into_par_iter().for_each(|i| {
            let agent = AgentId::new(i);
            if i < 200 {
                Building::move_to_spouse(&a, &b, agent, &ledger);
            } else {
                Building::move_to_spouse(&b, &a, agent, &ledger);
            }
        });
        assert_eq!(a.occupied() + b.occupied(), 400);
        assert_eq!(a.occupied(), 200);
    }

    #[test]
    fn concurrent_inserts_never_exceed_capacity() {
        let building = house(0, 10);
        let admitted = AtomicU32::new(0);
        (0..100_u32).into_par_iter().for_each(|i| {
            if building.add_resident(AgentId::new(i)) {
                admitted.fetch_add(1, Ordering::Relaxed);
            }
        });
        assert_eq!(admitted.load(Ordering::Relaxed), 10);
        assert_eq!(building.occupied(), 10);
        assert_eq!(building.residents().len(), 10);
    }
}
