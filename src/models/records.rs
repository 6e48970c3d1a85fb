use chrono::{NaiveDate, NaiveDateTime};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::asset::AssetRef;
use super::ids::{BillId, ConsumptionId, CustomerId, MaintenanceId, MeterId, OutageId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyConsumption {
    pub consumption_id: ConsumptionId,
    pub meter_id: MeterId,
    pub reading_date: NaiveDate,
    pub consumption_kwh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Billing {
    pub bill_id: BillId,
    pub customer_id: CustomerId,
    pub billing_date: NaiveDate,
    pub amount: f64,
    /// Last consumption row that went into this bill.
    pub consumption_id: ConsumptionId,
    #[serde(skip)]
    pub total_kwh: f64,
    #[serde(skip)]
    pub tariff_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Maintenance {
    pub maintenance_id: MaintenanceId,
    pub maintenance_date: NaiveDate,
    pub description: String,
    pub cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssetMaintenance {
    pub maintenance_id: MaintenanceId,
    pub asset: AssetRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outage {
    pub outage_id: OutageId,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub description: String,
    pub asset: AssetRef,
}

impl Outage {
    pub fn duration_hours(&self) -> f64 {
        (self.end_time - self.start_time).num_seconds() as f64 / 3600.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CustomerOutage {
    pub outage_id: OutageId,
    pub customer_id: CustomerId,
}

// The asset reference is flattened into the (asset_id, asset_type) column pair.

impl Serialize for AssetMaintenance {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let (asset_id, asset_type) = self.asset.to_columns();
        let mut state = serializer.serialize_struct("AssetMaintenance", 3)?;
        state.serialize_field("maintenance_id", &self.maintenance_id)?;
        state.serialize_field("asset_id", &asset_id)?;
        state.serialize_field("asset_type", asset_type)?;
        state.end()
    }
}

impl Serialize for Outage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let (asset_id, asset_type) = self.asset.to_columns();
        let mut state = serializer.serialize_struct("Outage", 6)?;
        state.serialize_field("outage_id", &self.outage_id)?;
        state.serialize_field("start_time", &self.start_time)?;
        state.serialize_field("end_time", &self.end_time)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("asset_id", &asset_id)?;
        state.serialize_field("asset_type", asset_type)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ids::SubstationId;

    #[test]
    fn asset_maintenance_flattens_asset_reference() {
        let row = AssetMaintenance {
            maintenance_id: MaintenanceId(7),
            asset: AssetRef::Substation(SubstationId(12)),
        };
        let json = serde_json::to_value(row).unwrap();
        assert_eq!(json["maintenance_id"], 7);
        assert_eq!(json["asset_id"], 12);
        assert_eq!(json["asset_type"], "substation");
    }

    #[test]
    fn outage_duration_in_hours() {
        let start = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();
        let outage = Outage {
            outage_id: OutageId(1),
            start_time: start,
            end_time: start + chrono::Duration::minutes(90),
            description: String::new(),
            asset: AssetRef::Substation(SubstationId(1)),
        };
        assert!((outage.duration_hours() - 1.5).abs() < 1e-9);
    }
}
