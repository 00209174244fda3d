// src/nwis/mod.rs
// Seam between the dispatcher and the USGS water services. Operations build
// a ServiceRequest; the provider turns it into a Table or an NwisError.

pub mod client;
pub mod rdb;

use async_trait::async_trait;

use crate::error::NwisError;
use crate::table::Table;

pub use client::NwisClient;

/// The NWIS query kinds the bridge knows how to issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// Site description records (also backs site search).
    Site,
    DailyValues,
    InstantaneousValues,
    /// Surface-water field measurements.
    Measurements,
    /// Annual peak streamflow.
    Peaks,
    GwLevels,
    /// Rating table for an active streamgage.
    Ratings,
    PmCodes,
    Stats,
    WaterUse,
}

impl Service {
    /// Service keyword used by the generic record fetch (`get_record`),
    /// mirroring the service names of the NWIS web services.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "site" => Some(Self::Site),
            "dv" => Some(Self::DailyValues),
            "iv" => Some(Self::InstantaneousValues),
            "measurements" => Some(Self::Measurements),
            "peaks" => Some(Self::Peaks),
            "gwlevels" => Some(Self::GwLevels),
            "ratings" => Some(Self::Ratings),
            "pmcodes" => Some(Self::PmCodes),
            "stat" | "stats" => Some(Self::Stats),
            "water_use" => Some(Self::WaterUse),
            _ => None,
        }
    }
}

/// A single query parameter value. Lists stay structured until the HTTP
/// layer so callers (and tests) can see exactly what an operation forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    List(Vec<String>),
}

impl ParamValue {
    pub fn as_query_value(&self) -> String {
        match self {
            Self::Single(v) => v.clone(),
            Self::List(vs) => vs.join(","),
        }
    }
}

/// One call against the external data service: a named query type plus an
/// ordered parameter mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRequest {
    pub service: Service,
    pub params: Vec<(String, ParamValue)>,
}

impl ServiceRequest {
    pub fn new(service: Service) -> Self {
        Self {
            service,
            params: Vec::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .push((key.into(), ParamValue::Single(value.into())));
        self
    }

    pub fn param_opt(self, key: impl Into<String>, value: Option<String>) -> Self {
        match value {
            Some(v) => self.param(key, v),
            None => self,
        }
    }

    pub fn param_list(mut self, key: impl Into<String>, values: Vec<String>) -> Self {
        self.params.push((key.into(), ParamValue::List(values)));
        self
    }

    /// Look up a forwarded parameter (test hook and client convenience).
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Opaque capability the dispatcher calls out to. The real implementation is
/// [`NwisClient`]; tests substitute a scripted mock.
#[async_trait]
pub trait WaterDataProvider: Send + Sync {
    async fn fetch(&self, request: ServiceRequest) -> Result<Table, NwisError>;
}
