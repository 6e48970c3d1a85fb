use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

use super::ids::{LineId, NetworkId, PlantId, SubstationId};

/// The four kinds of grid component that maintenance and outages can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Plant,
    Line,
    Substation,
    Network,
}

impl AssetKind {
    pub const ALL: [AssetKind; 4] = [
        AssetKind::Plant,
        AssetKind::Line,
        AssetKind::Substation,
        AssetKind::Network,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Plant => "plant",
            AssetKind::Line => "line",
            AssetKind::Substation => "substation",
            AssetKind::Network => "network",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plant" => Ok(AssetKind::Plant),
            "line" => Ok(AssetKind::Line),
            "substation" => Ok(AssetKind::Substation),
            "network" => Ok(AssetKind::Network),
            _ => Err(format!("Unknown asset type: {}", s)),
        }
    }
}

/// Typed reference to one asset.
///
/// Ids are only unique within their own kind, so the variant is what
/// disambiguates `Plant(PlantId(3))` from `Line(LineId(3))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetRef {
    Plant(PlantId),
    Line(LineId),
    Substation(SubstationId),
    Network(NetworkId),
}

impl AssetRef {
    pub fn kind(&self) -> AssetKind {
        match self {
            AssetRef::Plant(_) => AssetKind::Plant,
            AssetRef::Line(_) => AssetKind::Line,
            AssetRef::Substation(_) => AssetKind::Substation,
            AssetRef::Network(_) => AssetKind::Network,
        }
    }

    pub fn raw_id(&self) -> u64 {
        match self {
            AssetRef::Plant(id) => id.get(),
            AssetRef::Line(id) => id.get(),
            AssetRef::Substation(id) => id.get(),
            AssetRef::Network(id) => id.get(),
        }
    }

    /// Splits the reference into the `(asset_id, asset_type)` column pair.
    pub fn to_columns(&self) -> (u64, &'static str) {
        (self.raw_id(), self.kind().as_str())
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.raw_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_raw_id_different_kind_is_distinct() {
        let plant = AssetRef::Plant(PlantId(3));
        let line = AssetRef::Line(LineId(3));
        assert_ne!(plant, line);
        assert_eq!(plant.raw_id(), line.raw_id());
        assert_eq!(plant.to_columns(), (3, "plant"));
        assert_eq!(line.to_columns(), (3, "line"));
    }

    #[test]
    fn kind_round_trips_through_str() {
        for kind in AssetKind::ALL {
            assert_eq!(kind.as_str().parse::<AssetKind>().unwrap(), kind);
        }
        assert!("transformer".parse::<AssetKind>().is_err());
    }
}
