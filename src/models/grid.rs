use std::fmt;
use std::str::FromStr;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::{CustomerId, LineId, MeterId, NetworkId, PlantId, SubstationId};

// Field order on every record is the column order handed to sinks.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerPlant {
    pub plant_id: PlantId,
    pub plant_name: String,
    pub capacity_mw: f64,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmissionLine {
    pub line_id: LineId,
    pub line_name: String,
    pub voltage_kv: f64,
    pub length_km: f64,
    pub plant_id: PlantId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substation {
    pub substation_id: SubstationId,
    pub substation_name: String,
    pub capacity_mva: f64,
    pub location: String,
}

/// Many-to-many join between lines and substations. Duplicate pairs are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSubstationLink {
    pub line_id: LineId,
    pub substation_id: SubstationId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionNetwork {
    pub network_id: NetworkId,
    pub network_name: String,
    pub voltage_kv: f64,
    pub substation_id: SubstationId,
    /// City inherited from the owning substation.
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub address: String,
    pub network_id: NetworkId,
    #[serde(skip)]
    pub city: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeterType {
    Smart,
    Analog,
    Digital,
}

impl MeterType {
    pub const ALL: [MeterType; 3] = [MeterType::Smart, MeterType::Analog, MeterType::Digital];
}

impl fmt::Display for MeterType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MeterType::Smart => write!(f, "Smart"),
            MeterType::Analog => write!(f, "Analog"),
            MeterType::Digital => write!(f, "Digital"),
        }
    }
}

impl FromStr for MeterType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Smart" => Ok(MeterType::Smart),
            "Analog" => Ok(MeterType::Analog),
            "Digital" => Ok(MeterType::Digital),
            _ => Err(format!("Unknown meter type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meter {
    pub meter_id: MeterId,
    pub meter_type: MeterType,
    pub installation_date: NaiveDate,
    pub customer_id: CustomerId,
}
