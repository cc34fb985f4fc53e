use serde::{Deserialize, Serialize};

/// Incident total for one administrative region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionCrimeAggregate {
    pub region_name: String,
    pub total_incidents: f64,
}
