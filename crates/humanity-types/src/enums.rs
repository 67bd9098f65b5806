//! Enumeration types shared across the Humanity workspace.

use serde::{Deserialize, Serialize};

/// Biological gender category of a human. Marriage pairs opposite categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    /// Male.
    Male,
    /// Female.
    Female,
}

impl Gender {
    /// The other gender category.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Male => Self::Female,
            Self::Female => Self::Male,
        }
    }

    /// Lowercase label used in logs and CSV output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl core::fmt::Display for Gender {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marital status. `Married` always implies a symmetric spouse link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaritalStatus {
    /// Not married.
    #[default]
    Single,
    /// Married to the agent referenced by the spouse link.
    Married,
}

impl MaritalStatus {
    /// Lowercase label used in logs and CSV output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Married => "married",
        }
    }
}

impl core::fmt::Display for MaritalStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of building in a city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingType {
    /// Hospital. Raises the city's family-friendliness.
    Hospital,
    /// School. Raises the city's family-friendliness.
    School,
    /// Workplace hosting one job.
    Workplace,
    /// Entertainment venue.
    Entertainment,
    /// Cafe.
    Cafe,
    /// Shop.
    Shop,
    /// Residential house with apartments.
    ResidentialHouse,
}

impl BuildingType {
    /// Every building type, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Hospital,
        Self::School,
        Self::Workplace,
        Self::Entertainment,
        Self::Cafe,
        Self::Shop,
        Self::ResidentialHouse,
    ];

    /// Snake-case label used in logs, config, and CSV output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hospital => "hospital",
            Self::School => "school",
            Self::Workplace => "workplace",
            Self::Entertainment => "entertainment",
            Self::Cafe => "cafe",
            Self::Shop => "shop",
            Self::ResidentialHouse => "residential_house",
        }
    }

    /// Whether buildings of this type hold residents.
    pub const fn is_residential(self) -> bool {
        matches!(self, Self::ResidentialHouse)
    }
}

impl core::fmt::Display for BuildingType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_gender_is_involutive() {
        assert_eq!(Gender::Male.opposite(), Gender::Female);
        assert_eq!(Gender::Female.opposite().opposite(), Gender::Female);
    }

    #[test]
    fn building_type_serde_uses_snake_case() {
        let json = serde_json::to_string(&BuildingType::ResidentialHouse).ok();
        assert_eq!(json.as_deref(), Some("\"residential_house\""));
    }

    #[test]
    fn only_houses_are_residential() {
        let residential: Vec<_> = BuildingType::ALL
            .iter()
            .filter(|kind| kind.is_residential())
            .collect();
        assert_eq!(residential, vec![&BuildingType::ResidentialHouse]);
    }
}
