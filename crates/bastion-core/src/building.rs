//! Building catalogue.

use serde::{Deserialize, Serialize};

use crate::error::KindError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildingKind {
    #[default]
    Workshop,
    Barracks,
}

/// Static data for one building kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildingDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub base_cost: u32,
    /// Column and row on the tile sheet, in tiles.
    pub sprite: (u32, u32),
}

const WORKSHOP: BuildingDefinition = BuildingDefinition {
    name: "Workshop",
    description: "A place for artisans to craft goods.",
    base_cost: 500,
    sprite: (2, 0),
};

const BARRACKS: BuildingDefinition = BuildingDefinition {
    name: "Barracks",
    description: "Trains and houses your bastion guards.",
    base_cost: 1000,
    sprite: (3, 0),
};

impl BuildingKind {
    pub const ALL: [BuildingKind; 2] = [BuildingKind::Workshop, BuildingKind::Barracks];

    pub fn definition(self) -> &'static BuildingDefinition {
        match self {
            BuildingKind::Workshop => &WORKSHOP,
            BuildingKind::Barracks => &BARRACKS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuildingKind::Workshop => "workshop",
            BuildingKind::Barracks => "barracks",
        }
    }
}

impl std::fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BuildingKind {
    type Err = KindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "workshop" => Ok(BuildingKind::Workshop),
            "barracks" => Ok(BuildingKind::Barracks),
            other => Err(KindError::Unknown(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        assert_eq!("barracks".parse::<BuildingKind>(), Ok(BuildingKind::Barracks));
        assert!("castle".parse::<BuildingKind>().is_err());
        for kind in BuildingKind::ALL {
            assert_eq!(kind.as_str().parse::<BuildingKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_catalogue_sprites() {
        assert_eq!(BuildingKind::Workshop.definition().sprite, (2, 0));
        assert_eq!(BuildingKind::Barracks.definition().base_cost, 1000);
    }
}
