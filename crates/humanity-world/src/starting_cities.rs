//! Default starting cities for the Humanity simulation.
//!
//! Two templates ship with the simulation: the small city "Greenville" and
//! the large city "Metropolis". Each template lists building counts and
//! capacities per type; every workplace gets one job with a junior vacancy
//! (open to all) and a senior vacancy (requiring a diploma at the first
//! few workplaces). Salaries and slot counts are drawn from the template's
//! ranges when the world is built.

use rand::Rng;
use serde::Deserialize;
use tracing::info;

use humanity_types::BuildingType;

use crate::building::Coordinates;
use crate::error::WorldError;
use crate::registry::{VacancySpec, World};

/// Spacing between generated building coordinates, in degrees.
const GRID_STEP_DEGREES: f64 = 0.001;

/// Buildings per row of the coordinate grid.
const GRID_ROW: u32 = 5;

/// A half-open `[min, max)` integer range drawn uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Band {
    /// Inclusive lower bound.
    pub min: i64,
    /// Exclusive upper bound. Equal to `min` means always `min`.
    pub max: i64,
}

impl Band {
    /// Draw a value from the band.
    pub fn sample(self, rng: &mut impl Rng) -> i64 {
        if self.max > self.min {
            rng.random_range(self.min..self.max)
        } else {
            self.min
        }
    }
}

/// How many buildings of one type a city has, and how big they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BuildingTemplate {
    /// Building type.
    pub kind: BuildingType,
    /// Number of buildings of this type.
    pub count: u32,
    /// Capacity of each.
    pub capacity: u32,
}

/// Full description of one starting city.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CityTemplate {
    /// Display name.
    pub name: String,
    /// Apartment price in the city's houses.
    pub apartment_price: i64,
    /// Map position of the city centre.
    pub center: Coordinates,
    /// Buildings to create, in order.
    pub buildings: Vec<BuildingTemplate>,
    /// Monthly payment range of junior vacancies.
    pub junior_salary: Band,
    /// Monthly payment range of senior vacancies.
    pub senior_salary: Band,
    /// Slot count range of every vacancy.
    pub vacancy_slots: Band,
    /// Number of workplaces (from the first) whose senior vacancy needs a diploma.
    pub diploma_workplaces: u32,
    /// Item tag a senior candidate needs at those workplaces.
    pub diploma_tag: String,
}

impl CityTemplate {
    /// The small city: ten buildings, cheaper housing, lower salaries.
    pub fn small() -> Self {
        Self {
            name: "Greenville".to_owned(),
            apartment_price: 2_000_000,
            center: Coordinates {
                lat: 55.5665,
                lon: 39.4260,
            },
            buildings: vec![
                building(BuildingType::Hospital, 1, 50),
                building(BuildingType::School, 1, 200),
                building(BuildingType::Workplace, 2, 100),
                building(BuildingType::Entertainment, 1, 150),
                building(BuildingType::Cafe, 1, 30),
                building(BuildingType::Shop, 1, 40),
                building(BuildingType::ResidentialHouse, 3, 15),
            ],
            junior_salary: Band { min: 30_000, max: 45_000 },
            senior_salary: Band { min: 50_000, max: 75_000 },
            vacancy_slots: Band { min: 3, max: 8 },
            diploma_workplaces: 1,
            diploma_tag: "engineer_diploma".to_owned(),
        }
    }

    /// The large city: more of everything, pricier housing, higher salaries.
    pub fn large() -> Self {
        Self {
            name: "Metropolis".to_owned(),
            apartment_price: 3_000_000,
            center: Coordinates {
                lat: 55.7558,
                lon: 37.6173,
            },
            buildings: vec![
                building(BuildingType::Hospital, 2, 75),
                building(BuildingType::School, 2, 300),
                building(BuildingType::Workplace, 3, 150),
                building(BuildingType::Entertainment, 1, 200),
                building(BuildingType::Cafe, 2, 40),
                building(BuildingType::Shop, 2, 50),
                building(BuildingType::ResidentialHouse, 3, 25),
            ],
            junior_salary: Band { min: 35_000, max: 55_000 },
            senior_salary: Band { min: 60_000, max: 90_000 },
            vacancy_slots: Band { min: 5, max: 11 },
            diploma_workplaces: 2,
            diploma_tag: "engineer_diploma".to_owned(),
        }
    }

    /// Check the template for values that cannot produce a usable city.
    pub fn validate(&self) -> Result<(), WorldError> {
        let invalid = |reason: &str| WorldError::InvalidTemplate {
            city: self.name.clone(),
            reason: reason.to_owned(),
        };
        if self.apartment_price < 0 {
            return Err(invalid("apartment_price must not be negative"));
        }
        if !self.buildings.iter().any(|b| b.kind.is_residential() && b.count > 0) {
            return Err(invalid("at least one residential house is required"));
        }
        for band in [self.junior_salary, self.senior_salary, self.vacancy_slots] {
            if band.min < 0 || band.max < band.min {
                return Err(invalid("ranges need 0 <= min <= max"));
            }
        }
        if u32::try_from(self.vacancy_slots.max).is_err() {
            return Err(invalid("vacancy_slots.max does not fit in u32"));
        }
        Ok(())
    }
}

const fn building(kind: BuildingType, count: u32, capacity: u32) -> BuildingTemplate {
    BuildingTemplate {
        kind,
        count,
        capacity,
    }
}

/// The two default city templates, small first.
pub fn default_templates() -> Vec<CityTemplate> {
    vec![CityTemplate::small(), CityTemplate::large()]
}

/// Build a world from city templates.
///
/// Buildings are laid out on a small grid around each city's centre.
///
/// # Errors
///
/// Returns [`WorldError::InvalidTemplate`] if a template fails validation,
/// or an id-space error if the world is implausibly large.
pub fn build_world(templates: &[CityTemplate], rng: &mut impl Rng) -> Result<World, WorldError> {
    let mut builder = World::builder();

    for template in templates {
        template.validate()?;
        let city = builder.add_city(&template.name, template.apartment_price, template.center)?;
        let mut placed: u32 = 0;
        let mut workplaces: u32 = 0;

        for spec in &template.buildings {
            for ordinal in 1..=spec.count {
                let name = format!("{} {} {ordinal}", template.name, spec.kind);
                let location = grid_position(template.center, placed);
                placed = placed.saturating_add(1);
                let id = builder.add_building(city, spec.kind, name, spec.capacity, location)?;

                if spec.kind == BuildingType::Workplace {
                    workplaces = workplaces.saturating_add(1);
                    let needs_diploma = workplaces <= template.diploma_workplaces;
                    builder.add_job(id, workplace_vacancies(template, needs_diploma, rng))?;
                }
            }
        }

        info!(
            city = %template.name,
            buildings = placed,
            workplaces,
            apartment_price = template.apartment_price,
            "City built"
        );
    }

    Ok(builder.build())
}

fn workplace_vacancies(template: &CityTemplate, needs_diploma: bool, rng: &mut impl Rng) -> Vec<VacancySpec> {
    let mut slots = || u32::try_from(template.vacancy_slots.sample(rng)).unwrap_or(0);
    let junior_slots = slots();
    let senior_slots = slots();
    let senior_requirements = if needs_diploma {
        vec![template.diploma_tag.clone()]
    } else {
        Vec::new()
    };
    vec![
        VacancySpec {
            title: "junior".to_owned(),
            required_tags: Vec::new(),
            payment: template.junior_salary.sample(rng),
            slots: junior_slots,
        },
        VacancySpec {
            title: "senior".to_owned(),
            required_tags: senior_requirements,
            payment: template.senior_salary.sample(rng),
            slots: senior_slots,
        },
    ]
}

fn grid_position(center: Coordinates, index: u32) -> Coordinates {
    let row = f64::from(index / GRID_ROW);
    let column = f64::from(index % GRID_ROW);
    Coordinates {
        lat: center.lat + row * GRID_STEP_DEGREES,
        lon: center.lon + column * GRID_STEP_DEGREES,
    }
}
