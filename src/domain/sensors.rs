//! Simulated sensor readings.
//!
//! Each domain exposes one numeric metric per sensor. A zone gets a random
//! sensor count the first time it is queried and keeps it afterwards, so
//! repeated zone queries return the same set of sensor ids.

use dashmap::DashMap;
use rand::Rng;
use serde_json::{json, Value};
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::domain::Domain;

/// Sensors per zone, chosen once per zone.
const SENSORS_PER_ZONE: RangeInclusive<usize> = 3..=8;

/// Zones remembered per service. New zones past this are refused.
pub const MAX_ZONES: usize = 4096;

const MAX_ZONE_ID_LEN: usize = 64;

/// A zone query that cannot be answered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ZoneError {
    #[error("invalid zone id '{0}': use up to 64 letters, digits, '-' or '_'")]
    InvalidZone(String),

    #[error("zone table full ({0} zones)")]
    CapacityReached(usize),
}

/// Zone ids are short ASCII identifiers.
pub fn validate_zone_id(zone: &str) -> Result<(), ZoneError> {
    let valid = !zone.is_empty()
        && zone.len() <= MAX_ZONE_ID_LEN
        && zone
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ZoneError::InvalidZone(zone.to_string()))
    }
}

/// Shape of the readings produced for one domain.
#[derive(Debug, Clone, Copy)]
pub struct SensorProfile {
    /// Prefix of sensor ids (`TRF-A-01`).
    pub id_prefix: &'static str,
    /// JSON field carrying the measurement.
    pub metric: &'static str,
    pub range: (u32, u32),
    /// Values above this are reported with `alert_status`.
    pub alert_above: u32,
    pub normal_status: &'static str,
    pub alert_status: &'static str,
}

impl SensorProfile {
    pub fn for_domain(domain: Domain) -> Self {
        match domain {
            Domain::Traffic => Self {
                id_prefix: "TRF",
                metric: "vehicle_count",
                range: (50, 500),
                alert_above: 400,
                normal_status: "FLOWING",
                alert_status: "CONGESTED",
            },
            Domain::Energy => Self {
                id_prefix: "PWR",
                metric: "consumption_kw",
                range: (100, 1000),
                alert_above: 850,
                normal_status: "NORMAL",
                alert_status: "OVERLOAD",
            },
            Domain::Water => Self {
                id_prefix: "WTR",
                metric: "flow_lpm",
                range: (0, 600),
                alert_above: 550,
                normal_status: "NORMAL",
                alert_status: "LEAK_SUSPECTED",
            },
            Domain::Waste => Self {
                id_prefix: "BIN",
                metric: "fill_level_pct",
                range: (0, 100),
                alert_above: 89,
                normal_status: "OK",
                alert_status: "FULL",
            },
            Domain::Security => Self {
                id_prefix: "CAM",
                metric: "people_detected",
                range: (0, 50),
                alert_above: 40,
                normal_status: "SAFE",
                alert_status: "WARNING_CROWD",
            },
            Domain::Health => Self {
                id_prefix: "HSP",
                metric: "occupied_beds",
                range: (0, 120),
                alert_above: 100,
                normal_status: "NORMAL",
                alert_status: "CRITICAL",
            },
        }
    }

    /// Produce one reading for `sensor_id` in `zone`.
    pub fn reading(&self, sensor_id: &str, zone: &str) -> Value {
        let value = rand::thread_rng().gen_range(self.range.0..=self.range.1);
        let status = if value > self.alert_above {
            self.alert_status
        } else {
            self.normal_status
        };

        let mut reading = json!({
            "id": sensor_id,
            "zone": zone,
            "timestamp": unix_now(),
            "status": status,
        });
        reading[self.metric] = json!(value);
        reading
    }
}

/// Sensor layout per zone for one domain service.
#[derive(Debug, Clone)]
pub struct ZoneSensors {
    profile: SensorProfile,
    zones: Arc<DashMap<String, usize>>,
    max_zones: usize,
}

impl ZoneSensors {
    pub fn new(domain: Domain) -> Self {
        Self::with_capacity(domain, MAX_ZONES)
    }

    pub fn with_capacity(domain: Domain, max_zones: usize) -> Self {
        Self {
            profile: SensorProfile::for_domain(domain),
            zones: Arc::new(DashMap::new()),
            max_zones,
        }
    }

    pub fn profile(&self) -> &SensorProfile {
        &self.profile
    }

    /// Number of sensors in `zone`, assigning one on first use.
    ///
    /// The capacity check races with concurrent first uses, so the table
    /// may end up a few entries past `max_zones`.
    pub fn sensor_count(&self, zone: &str) -> Result<usize, ZoneError> {
        validate_zone_id(zone)?;
        if let Some(count) = self.zones.get(zone) {
            return Ok(*count);
        }
        if self.zones.len() >= self.max_zones {
            tracing::warn!(zone = %zone, max_zones = self.max_zones, "Zone table full");
            return Err(ZoneError::CapacityReached(self.max_zones));
        }

        let count = *self
            .zones
            .entry(zone.to_string())
            .or_insert_with(|| {
                let count = rand::thread_rng().gen_range(SENSORS_PER_ZONE);
                tracing::debug!(zone = %zone, sensors = count, "Configured zone");
                count
            })
            .value();
        Ok(count)
    }

    /// Fresh readings for every sensor in `zone`.
    pub fn readings(&self, zone: &str) -> Result<Vec<Value>, ZoneError> {
        let count = self.sensor_count(zone)?;
        Ok((1..=count)
            .map(|i| {
                let id = format!("{}-{}-{:02}", self.profile.id_prefix, zone, i);
                self.profile.reading(&id, zone)
            })
            .collect())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
