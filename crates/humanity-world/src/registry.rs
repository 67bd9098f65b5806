//! The world registry: every city, building, and job of a run.
//!
//! The registry itself is immutable after [`WorldBuilder::build`]; all
//! runtime mutation goes through the per-entity locks inside
//! [`Building`] and [`Job`], so a `&World` can be shared freely across the
//! parallel per-agent phase.

use std::collections::BTreeMap;

use humanity_ledger::Ledger;
use humanity_types::{AgentId, BuildingId, BuildingType, CityId, JobId, VacancyId};

use crate::building::{Building, Coordinates};
use crate::error::WorldError;
use crate::job::{Job, Vacancy};

/// A city: a named group of buildings sharing an apartment price.
#[derive(Debug, Clone, PartialEq)]
pub struct City {
    /// Unique id.
    pub id: CityId,
    /// Display name.
    pub name: String,
    /// Price of one apartment in any of the city's houses.
    pub apartment_price: i64,
    /// Map position of the city centre.
    pub center: Coordinates,
    /// Buildings in the city, in creation order.
    pub buildings: Vec<BuildingId>,
    /// Jobs in the city, in creation order.
    pub jobs: Vec<JobId>,
}

/// Shape of a vacancy passed to [`WorldBuilder::add_job`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VacancySpec {
    /// Title, e.g. `"senior"`.
    pub title: String,
    /// Required item tags.
    pub required_tags: Vec<String>,
    /// Monthly payment.
    pub payment: i64,
    /// Initial number of slots.
    pub slots: u32,
}

/// Immutable registry of cities, buildings, and jobs.
#[derive(Debug, Default)]
pub struct World {
    cities: Vec<City>,
    buildings: Vec<Building>,
    jobs: Vec<Job>,
    vacancy_owners: BTreeMap<VacancyId, JobId>,
}

impl World {
    /// Start assembling a world.
    pub fn builder() -> WorldBuilder {
        WorldBuilder::default()
    }

    /// All cities.
    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    /// All buildings.
    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    /// All jobs.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Look up a city.
    pub fn city(&self, id: CityId) -> Option<&City> {
        self.cities.get(id.index())
    }

    /// Look up a building.
    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(id.index())
    }

    /// Look up a job.
    pub fn job(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(id.index())
    }

    /// Look up a vacancy and the job that offers it.
    pub fn vacancy(&self, id: VacancyId) -> Option<(&Job, &Vacancy)> {
        let job = self.job(*self.vacancy_owners.get(&id)?)?;
        job.vacancy(id).map(|vacancy| (job, vacancy))
    }

    /// Buildings of one kind in one city.
    pub fn buildings_of(&self, city: CityId, kind: BuildingType) -> impl Iterator<Item = &Building> {
        self.buildings
            .iter()
            .filter(move |b| b.city == city && b.kind == kind)
    }

    /// Number of buildings of one kind in one city.
    pub fn count_of(&self, city: CityId, kind: BuildingType) -> u32 {
        let count = self.buildings_of(city, kind).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Jobs located in one city.
    pub fn jobs_in(&self, city: CityId) -> impl Iterator<Item = &Job> {
        self.jobs.iter().filter(move |j| j.city == city)
    }

    /// Take one slot of a vacancy.
    pub fn hire(&self, vacancy: VacancyId) -> bool {
        self.vacancy(vacancy).is_some_and(|(job, _)| job.hire(vacancy))
    }

    /// Return one slot of a vacancy.
    pub fn release(&self, vacancy: VacancyId) -> bool {
        self.vacancy(vacancy).is_some_and(|(job, _)| job.release(vacancy))
    }

    /// Quit one vacancy and take another under the two-lock protocol.
    pub fn switch_job(&self, from: VacancyId, to: VacancyId) -> bool {
        match (self.vacancy(from), self.vacancy(to)) {
            (Some((old, _)), Some((new, _))) => Job::switch(old, from, new, to),
            _ => false,
        }
    }

    /// Relocate a resident into a spouse's building under the two-lock
    /// protocol, selling the vacated unit.
    pub fn move_to_spouse(
        &self,
        agent: AgentId,
        from: BuildingId,
        to: BuildingId,
        ledger: &Ledger,
    ) -> bool {
        match (self.building(from), self.building(to)) {
            (Some(old), Some(new)) => Building::move_to_spouse(old, new, agent, ledger),
            _ => false,
        }
    }
}

/// Incrementally assembles a [`World`], assigning dense ids.
#[derive(Debug, Default)]
pub struct WorldBuilder {
    world: World,
    next_vacancy: u32,
}

impl WorldBuilder {
    /// Add a city.
    pub fn add_city(
        &mut self,
        name: &str,
        apartment_price: i64,
        center: Coordinates,
    ) -> Result<CityId, WorldError> {
        let id = CityId::from_index(self.world.cities.len())
            .ok_or(WorldError::IdSpaceExhausted { entity: "cities" })?;
        self.world.cities.push(City {
            id,
            name: name.to_owned(),
            apartment_price,
            center,
            buildings: Vec::new(),
            jobs: Vec::new(),
        });
        Ok(id)
    }

    /// Add a building to a city. Residential buildings inherit the city's
    /// apartment price.
    pub fn add_building(
        &mut self,
        city: CityId,
        kind: BuildingType,
        name: String,
        capacity: u32,
        location: Coordinates,
    ) -> Result<BuildingId, WorldError> {
        let id = BuildingId::from_index(self.world.buildings.len())
            .ok_or(WorldError::IdSpaceExhausted { entity: "buildings" })?;
        let owner = self
            .world
            .cities
            .get_mut(city.index())
            .ok_or(WorldError::CityNotFound(city))?;
        let price = if kind.is_residential() {
            owner.apartment_price
        } else {
            0
        };
        owner.buildings.push(id);
        self.world
            .buildings
            .push(Building::new(id, name, kind, city, capacity, price, location));
        Ok(id)
    }

    /// Attach a job with the given vacancies to a workplace.
    pub fn add_job(
        &mut self,
        building: BuildingId,
        vacancies: Vec<VacancySpec>,
    ) -> Result<JobId, WorldError> {
        let id = JobId::from_index(self.world.jobs.len())
            .ok_or(WorldError::IdSpaceExhausted { entity: "jobs" })?;
        let workplace = self
            .world
            .buildings
            .get_mut(building.index())
            .ok_or(WorldError::BuildingNotFound(building))?;
        if workplace.kind != BuildingType::Workplace {
            return Err(WorldError::NotAWorkplace(building));
        }
        workplace.jobs.push(id);
        let city = workplace.city;

        let mut built = Vec::with_capacity(vacancies.len());
        for spec in vacancies {
            let vacancy_id = VacancyId::new(self.next_vacancy);
            self.next_vacancy = self
                .next_vacancy
                .checked_add(1)
                .ok_or(WorldError::IdSpaceExhausted { entity: "vacancies" })?;
            self.world.vacancy_owners.insert(vacancy_id, id);
            built.push(Vacancy {
                id: vacancy_id,
                job: id,
                title: spec.title,
                required_tags: spec.required_tags,
                payment: spec.payment,
                initial_slots: spec.slots,
            });
        }

        if let Some(owner) = self.world.cities.get_mut(city.index()) {
            owner.jobs.push(id);
        }
        self.world.jobs.push(Job::new(id, building, city, built));
        Ok(id)
    }

    /// Finish assembly.
    pub fn build(self) -> World {
        self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(title: &str, payment: i64, slots: u32) -> VacancySpec {
        VacancySpec {
            title: title.to_owned(),
            required_tags: Vec::new(),
            payment,
            slots,
        }
    }

    fn small_world() -> Result<World, WorldError> {
        let mut builder = World::builder();
        let city = builder.add_city("Testville", 2_000, Coordinates::default())?;
        builder.add_building(city, BuildingType::ResidentialHouse, "House".to_owned(), 2, Coordinates::default())?;
        builder.add_building(city, BuildingType::ResidentialHouse, "House 2".to_owned(), 2, Coordinates::default())?;
        let office = builder.add_building(city, BuildingType::Workplace, "Office".to_owned(), 50, Coordinates::default())?;
        builder.add_job(office, vec![spec("junior", 30_000, 2), spec("senior", 60_000, 1)])?;
        Ok(builder.build())
    }

    #[test]
    fn builder_assigns_dense_ids_and_links_entities() {
        let world = small_world();
        assert!(world.is_ok());
        let world = world.unwrap_or_default();
        assert_eq!(world.cities().len(), 1);
        assert_eq!(world.buildings().len(), 3);
        assert_eq!(world.count_of(CityId::new(0), BuildingType::ResidentialHouse), 2);
        let office = world.building(BuildingId::new(2));
        assert_eq!(office.map(|b| b.jobs.clone()), Some(vec![JobId::new(0)]));
        assert_eq!(world.jobs_in(CityId::new(0)).count(), 1);
        assert_eq!(world.building(BuildingId::new(0)).map(|b| b.apartment_price), Some(2_000));
    }

    #[test]
    fn vacancy_lookup_and_slots() {
        let world = small_world().unwrap_or_default();
        let senior = VacancyId::new(1);
        assert_eq!(world.vacancy(senior).map(|(_, v)| v.payment), Some(60_000));
        assert!(world.hire(senior));
        assert!(!world.hire(senior));
        assert!(world.switch_job(senior, VacancyId::new(0)));
        assert!(world.hire(senior));
        assert!(world.release(VacancyId::new(0)));
    }

    #[test]
    fn jobs_only_attach_to_workplaces() {
        let mut builder = World::builder();
        let city = builder.add_city("X", 1, Coordinates::default());
        let house = city.and_then(|c| {
            builder.add_building(c, BuildingType::ResidentialHouse, "H".to_owned(), 1, Coordinates::default())
        });
        let result = house.and_then(|h| builder.add_job(h, vec![spec("junior", 1, 1)]));
        assert!(matches!(result, Err(WorldError::NotAWorkplace(_))));
    }

    #[test]
    fn move_to_spouse_through_registry() {
        let world = small_world().unwrap_or_default();
        let mut ledger = Ledger::new();
        let agent = ledger.open_account(0).unwrap_or(AgentId::new(0));
        let from = BuildingId::new(0);
        let to = BuildingId::new(1);
        assert!(world.building(from).is_some_and(|b| b.add_resident(agent)));
        assert!(world.move_to_spouse(agent, from, to, &ledger));
        assert!(world.building(to).is_some_and(|b| b.is_resident(agent)));
        assert_eq!(ledger.balance(agent), 2_000);
    }
}
