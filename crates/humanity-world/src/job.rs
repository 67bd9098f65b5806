//! Jobs, vacancies, and remaining-slot accounting.
//!
//! A [`Job`] owns a fixed list of [`Vacancy`] descriptions and one
//! reader/writer lock over the remaining-slot counts of those vacancies.
//! Every successful [`Job::hire`] must be paired with the agent taking the
//! job reference, every successful [`Job::release`] with the agent dropping
//! it; that pairing keeps `holders + remaining == initial` for every vacancy.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use tracing::debug;

use humanity_types::{BuildingId, CityId, JobId, VacancyId};

/// A priced opening at a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vacancy {
    /// Unique id across all jobs.
    pub id: VacancyId,
    /// The job offering this vacancy.
    pub job: JobId,
    /// Title, e.g. `"junior"`.
    pub title: String,
    /// Item tags a candidate should hold. Empty means anyone qualifies.
    pub required_tags: Vec<String>,
    /// Payment credited on every month boundary.
    pub payment: i64,
    /// Number of slots the vacancy was created with.
    pub initial_slots: u32,
}

impl Vacancy {
    /// Whether the vacancy has no requirements.
    pub fn is_open_to_all(&self) -> bool {
        self.required_tags.is_empty()
    }

    /// Fraction of required tags the candidate holds, in `[0, 1]`.
    /// A vacancy without requirements is a perfect match.
    pub fn skill_match(&self, holds: impl Fn(&str) -> bool) -> f64 {
        let Ok(total) = u32::try_from(self.required_tags.len()) else {
            return 0.0;
        };
        if total == 0 {
            return 1.0;
        }
        let held = self.required_tags.iter().filter(|tag| holds(tag)).count();
        f64::from(u32::try_from(held).unwrap_or(0)) / f64::from(total)
    }
}

/// All vacancies offered by one workplace, plus their slot counters.
#[derive(Debug)]
pub struct Job {
    /// Unique id, also the lock-ordering key for job switches.
    pub id: JobId,
    /// Workplace building where the job is performed.
    pub building: BuildingId,
    /// City of the workplace.
    pub city: CityId,
    /// Vacancies, fixed at construction.
    pub vacancies: Vec<Vacancy>,
    remaining: RwLock<BTreeMap<VacancyId, u32>>,
}

impl Job {
    /// Create a job whose vacancies start with all slots open.
    pub fn new(id: JobId, building: BuildingId, city: CityId, vacancies: Vec<Vacancy>) -> Self {
        let remaining = vacancies.iter().map(|v| (v.id, v.initial_slots)).collect();
        Self {
            id,
            building,
            city,
            vacancies,
            remaining: RwLock::new(remaining),
        }
    }

    /// Look up one of this job's vacancies.
    pub fn vacancy(&self, id: VacancyId) -> Option<&Vacancy> {
        self.vacancies.iter().find(|v| v.id == id)
    }

    /// Remaining slots of a vacancy (0 if it is not part of this job).
    pub fn remaining(&self, vacancy: VacancyId) -> u32 {
        self.remaining.read().get(&vacancy).copied().unwrap_or(0)
    }

    /// Vacancies that currently have at least one open slot.
    pub fn open_vacancies(&self) -> Vec<&Vacancy> {
        let remaining = self.remaining.read();
        self.vacancies
            .iter()
            .filter(|v| remaining.get(&v.id).is_some_and(|slots| *slots > 0))
            .collect()
    }

    /// Take one slot. Fails when none are left.
    pub fn hire(&self, vacancy: VacancyId) -> bool {
        let hired = take_slot(&mut self.remaining.write(), vacancy);
        if hired {
            debug!(job = %self.id, vacancy = %vacancy, "Slot taken");
        }
        hired
    }

    /// Return one slot. Fails if it would exceed the initial allocation.
    pub fn release(&self, vacancy: VacancyId) -> bool {
        let Some(initial) = self.vacancy(vacancy).map(|v| v.initial_slots) else {
            return false;
        };
        let released = return_slot(&mut self.remaining.write(), vacancy, initial);
        if released {
            debug!(job = %self.id, vacancy = %vacancy, "Slot returned");
        }
        released
    }

    /// Quit `(from, from_vacancy)` and take `(to, to_vacancy)` atomically.
    ///
    /// Both jobs are locked in ascending id order. The switch either takes
    /// a slot in the new vacancy and returns one to the old vacancy, or
    /// changes nothing.
    pub fn switch(from: &Self, from_vacancy: VacancyId, to: &Self, to_vacancy: VacancyId) -> bool {
        if from_vacancy == to_vacancy {
            return false;
        }
        let Some(initial) = from.vacancy(from_vacancy).map(|v| v.initial_slots) else {
            return false;
        };
        if to.vacancy(to_vacancy).is_none() {
            return false;
        }

        if from.id == to.id {
            let mut remaining = from.remaining.write();
            let can_return = remaining.get(&from_vacancy).is_some_and(|slots| *slots < initial);
            if !can_return || !take_slot(&mut remaining, to_vacancy) {
                return false;
            }
            return return_slot(&mut remaining, from_vacancy, initial);
        }

        let (first, second) = if from.id < to.id { (from, to) } else { (to, from) };
        let mut first_guard = first.remaining.write();
        let mut second_guard = second.remaining.write();
        let (old, new) = if from.id < to.id {
            (&mut *first_guard, &mut *second_guard)
        } else {
            (&mut *second_guard, &mut *first_guard)
        };

        let can_return = old.get(&from_vacancy).is_some_and(|slots| *slots < initial);
        if !can_return || !take_slot(new, to_vacancy) {
            return false;
        }
        return_slot(old, from_vacancy, initial)
    }
}

fn take_slot(remaining: &mut BTreeMap<VacancyId, u32>, vacancy: VacancyId) -> bool {
    match remaining.get_mut(&vacancy) {
        Some(slots) if *slots > 0 => {
            *slots = slots.saturating_sub(1);
            true
        }
        _ => false,
    }
}

fn return_slot(remaining: &mut BTreeMap<VacancyId, u32>, vacancy: VacancyId, initial: u32) -> bool {
    match remaining.get_mut(&vacancy) {
        Some(slots) if *slots < initial => {
            *slots = slots.saturating_add(1);
            true
        }
        _ => false,
    }
}
