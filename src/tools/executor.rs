// src/tools/executor.rs
// Name-based dispatch over a closed set of operations. Each operation keeps
// its own validation policy (some enforce nothing); the dispatcher itself
// only rejects unknown names.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::NwisError;
use crate::nwis::{Service, ServiceRequest, WaterDataProvider};
use crate::table::Table;
use crate::tools::types::Envelope;

/// Every dispatchable operation. The set is fixed at compile time; the
/// catalog in `definitions.rs` carries one descriptor per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SiteData,
    DailyValues,
    InstantaneousValues,
    DischargeMeasurements,
    DischargePeaks,
    GwLevels,
    Ratings,
    WhatSites,
    Info,
    Record,
    Stats,
    PmCodes,
    WaterUse,
}

impl Operation {
    pub const ALL: [Operation; 13] = [
        Operation::SiteData,
        Operation::DailyValues,
        Operation::InstantaneousValues,
        Operation::DischargeMeasurements,
        Operation::DischargePeaks,
        Operation::GwLevels,
        Operation::Ratings,
        Operation::WhatSites,
        Operation::Info,
        Operation::Record,
        Operation::Stats,
        Operation::PmCodes,
        Operation::WaterUse,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::SiteData => "get_site_data",
            Operation::DailyValues => "get_daily_values",
            Operation::InstantaneousValues => "get_instantaneous_values",
            Operation::DischargeMeasurements => "get_discharge_measurements",
            Operation::DischargePeaks => "get_discharge_peaks",
            Operation::GwLevels => "get_gwlevels",
            Operation::Ratings => "get_ratings",
            Operation::WhatSites => "what_sites",
            Operation::Info => "get_info",
            Operation::Record => "get_record",
            Operation::Stats => "get_stats",
            Operation::PmCodes => "get_pmcodes",
            Operation::WaterUse => "get_water_use",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.name() == name)
    }
}

/// Extract a scalar parameter as a string. Empty strings count as absent,
/// matching the truthiness checks the operations apply.
fn str_param(params: &Value, key: &str) -> Option<String> {
    match params.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Split a comma-separated string into an ordered list.
fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

/// Forward every parameter of the mapping verbatim, minus `skip` keys.
/// `split_keys` values are treated as comma-separated lists.
fn forward_params(
    mut request: ServiceRequest,
    params: &Value,
    skip: &[&str],
    split_keys: &[&str],
) -> ServiceRequest {
    if let Some(map) = params.as_object() {
        for (key, value) in map {
            if skip.contains(&key.as_str()) {
                continue;
            }
            let raw = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => continue,
            };
            if split_keys.contains(&key.as_str()) && raw.contains(',') {
                request = request.param_list(key.clone(), split_csv(&raw));
            } else {
                request = request.param(key.clone(), raw);
            }
        }
    }
    request
}

/// Executes catalog operations against the water-data provider and wraps
/// every outcome in the uniform envelope.
pub struct ToolExecutor {
    provider: Arc<dyn WaterDataProvider>,
}

impl ToolExecutor {
    pub fn new(provider: Arc<dyn WaterDataProvider>) -> Self {
        Self { provider }
    }

    /// Dispatch a function by name. Unknown names get an error envelope
    /// enumerating the valid names and never reach the provider.
    pub async fn call(&self, function_name: &str, params: &Value) -> Envelope {
        let Some(op) = Operation::from_name(function_name) else {
            let valid: Vec<&str> = Operation::ALL.iter().map(|op| op.name()).collect();
            return Envelope::error(format!(
                "Function '{}' not found. Available functions: {}",
                function_name,
                valid.join(", ")
            ));
        };

        debug!(function = op.name(), "dispatching");
        match op {
            Operation::SiteData => self.get_site_data(params).await,
            Operation::DailyValues => self.get_daily_values(params).await,
            Operation::InstantaneousValues => self.get_instantaneous_values(params).await,
            Operation::DischargeMeasurements => self.get_discharge_measurements(params).await,
            Operation::DischargePeaks => self.get_discharge_peaks(params).await,
            Operation::GwLevels => self.get_gwlevels(params).await,
            Operation::Ratings => self.get_ratings(params).await,
            Operation::WhatSites => self.what_sites(params).await,
            Operation::Info => self.get_info(params).await,
            Operation::Record => self.get_record(params).await,
            Operation::Stats => self.get_stats(params).await,
            Operation::PmCodes => self.get_pmcodes(params).await,
            Operation::WaterUse => self.get_water_use(params).await,
        }
    }

    async fn fetch_sanitized(&self, request: ServiceRequest) -> Result<Table, NwisError> {
        let mut table = self.provider.fetch(request).await?;
        table.sanitize();
        Ok(table)
    }

    async fn get_site_data(&self, params: &Value) -> Envelope {
        let Some(site_code) = str_param(params, "site_code") else {
            return Envelope::error("Site code is required");
        };

        let request = ServiceRequest::new(Service::Site).param("sites", site_code.clone());
        match self.fetch_sanitized(request).await {
            Ok(table) if !table.is_empty() => Envelope::success(
                table,
                format!("Successfully retrieved data for site {site_code}"),
            ),
            Ok(_) => Envelope::error(format!("No data found for site {site_code}")),
            Err(e) => Envelope::error(format!("Error retrieving site data: {e}")),
        }
    }

    async fn get_daily_values(&self, params: &Value) -> Envelope {
        let Some(site_code) = str_param(params, "site_code") else {
            return Envelope::error("site_code is required");
        };

        let request = ServiceRequest::new(Service::DailyValues)
            .param("sites", site_code.clone())
            .param_opt("parameterCd", str_param(params, "parameter_code"))
            .param_opt("statCd", str_param(params, "statCd"))
            .param_opt("start", str_param(params, "start_date"))
            .param_opt("end", str_param(params, "end_date"));

        match self.fetch_sanitized(request).await {
            Ok(table) if !table.is_empty() => Envelope::success(
                table,
                format!("Successfully retrieved daily values for site {site_code}"),
            ),
            Ok(_) => Envelope::error("No daily values found for the specified parameters"),
            Err(e) => Envelope::error(format!("Error retrieving daily values: {e}")),
        }
    }

    async fn get_instantaneous_values(&self, params: &Value) -> Envelope {
        let site_code = str_param(params, "site_code");
        let parameter_code = str_param(params, "parameter_code");
        let (Some(site_code), Some(parameter_code)) = (site_code, parameter_code) else {
            return Envelope::error("site_code and parameter_code are both required");
        };

        let request = ServiceRequest::new(Service::InstantaneousValues)
            .param("sites", site_code.clone())
            .param("parameterCd", parameter_code)
            .param_opt("start", str_param(params, "start_date"))
            .param_opt("end", str_param(params, "end_date"));

        match self.fetch_sanitized(request).await {
            Ok(table) if !table.is_empty() => Envelope::success(
                table,
                format!("Successfully retrieved instantaneous values for site {site_code}"),
            ),
            Ok(_) => Envelope::error("No instantaneous values found for the specified parameters"),
            Err(e) => Envelope::error(format!("Error retrieving instantaneous values: {e}")),
        }
    }

    async fn sites_with_dates(&self, service: Service, params: &Value) -> Result<Table, Envelope> {
        let Some(sites_raw) = str_param(params, "sites") else {
            return Err(Envelope::error("Sites parameter is required"));
        };

        let request = ServiceRequest::new(service)
            .param_list("sites", split_csv(&sites_raw))
            .param_opt("start", str_param(params, "start"))
            .param_opt("end", str_param(params, "end"));

        self.fetch_sanitized(request)
            .await
            .map_err(|e| Envelope::error(e.to_string()))
    }

    async fn get_discharge_measurements(&self, params: &Value) -> Envelope {
        match self.sites_with_dates(Service::Measurements, params).await {
            Ok(table) => {
                let n = table.len();
                Envelope::success(table, format!("Retrieved {n} discharge measurements"))
            }
            Err(envelope) => envelope,
        }
    }

    async fn get_discharge_peaks(&self, params: &Value) -> Envelope {
        match self.sites_with_dates(Service::Peaks, params).await {
            Ok(table) => {
                let n = table.len();
                Envelope::success(table, format!("Retrieved {n} discharge peaks"))
            }
            Err(envelope) => envelope,
        }
    }

    async fn get_gwlevels(&self, params: &Value) -> Envelope {
        match self.sites_with_dates(Service::GwLevels, params).await {
            Ok(table) => {
                let n = table.len();
                Envelope::success(table, format!("Retrieved {n} groundwater level records"))
            }
            Err(envelope) => envelope,
        }
    }

    async fn get_ratings(&self, params: &Value) -> Envelope {
        let Some(site) = str_param(params, "site") else {
            return Envelope::error("Site parameter is required");
        };
        let file_type = str_param(params, "file_type").unwrap_or_else(|| "base".to_string());

        let request = ServiceRequest::new(Service::Ratings)
            .param("site", site.clone())
            .param("file_type", file_type);

        match self.fetch_sanitized(request).await {
            Ok(table) => {
                let n = table.len();
                Envelope::success(table, format!("Retrieved {n} rating records for site {site}"))
            }
            Err(e) => Envelope::error(e.to_string()),
        }
    }

    async fn what_sites(&self, params: &Value) -> Envelope {
        let request = forward_params(ServiceRequest::new(Service::Site), params, &[], &[]);
        match self.fetch_sanitized(request).await {
            Ok(table) => {
                let n = table.len();
                Envelope::success(table, format!("Found {n} sites matching the criteria"))
            }
            Err(e) => Envelope::error(e.to_string()),
        }
    }

    async fn get_info(&self, params: &Value) -> Envelope {
        // siteOutput/seriesCatalogOutput shape the response and do not count
        // as filters on their own.
        const FILTERS: [&str; 11] = [
            "sites",
            "stateCd",
            "huc",
            "bBox",
            "countyCd",
            "startDt",
            "endDt",
            "period",
            "modifiedSince",
            "parameterCd",
            "siteType",
        ];
        let has_filter = FILTERS
            .iter()
            .any(|&key| str_param(params, key).is_some());
        if !has_filter {
            return Envelope::error("At least one of the parameters is required");
        }

        let request = forward_params(ServiceRequest::new(Service::Site), params, &[], &["sites"]);
        match self.fetch_sanitized(request).await {
            Ok(table) => Envelope::success(table, "Retrieved site information"),
            Err(e) => Envelope::error(e.to_string()),
        }
    }

    async fn get_record(&self, params: &Value) -> Envelope {
        let request = match record_request(params) {
            Ok(request) => request,
            Err(e) => return Envelope::error(e.to_string()),
        };
        match self.fetch_sanitized(request).await {
            Ok(table) => {
                let n = table.len();
                Envelope::success(table, format!("Retrieved {n} records"))
            }
            Err(e) => Envelope::error(e.to_string()),
        }
    }

    async fn get_stats(&self, params: &Value) -> Envelope {
        let request = forward_params(ServiceRequest::new(Service::Stats), params, &[], &["sites"]);
        match self.fetch_sanitized(request).await {
            Ok(table) => Envelope::success(table, "Retrieved statistical data"),
            Err(e) => Envelope::error(e.to_string()),
        }
    }

    async fn get_pmcodes(&self, params: &Value) -> Envelope {
        let Some(parameter_cd) = str_param(params, "parameterCd") else {
            return Envelope::error("Parameter code is required");
        };

        let request = ServiceRequest::new(Service::PmCodes).param("parameterCd", parameter_cd);
        match self.fetch_sanitized(request).await {
            Ok(table) => {
                let n = table.len();
                Envelope::success(table, format!("Retrieved {n} parameter codes"))
            }
            Err(e) => Envelope::error(e.to_string()),
        }
    }

    async fn get_water_use(&self, params: &Value) -> Envelope {
        let years = str_param(params, "years");
        let state = str_param(params, "state");
        let counties = str_param(params, "counties");
        let categories = str_param(params, "categories");
        if years.is_none() && state.is_none() && counties.is_none() && categories.is_none() {
            return Envelope::error("At least one of the parameters is required");
        }

        let mut request = ServiceRequest::new(Service::WaterUse)
            .param_opt("state", state)
            .param_opt("counties", counties)
            .param_opt("categories", categories);
        if let Some(years) = years {
            request = if years.contains(',') {
                request.param_list("years", split_csv(&years))
            } else {
                request.param("years", years)
            };
        }

        match self.provider.fetch(request).await {
            Ok(mut table) => {
                // Internal join columns from the water-use service.
                table.drop_columns(&["state_cd", "county_cd"]);
                table.sanitize();
                Envelope::success(table, "Retrieved water use data")
            }
            Err(e) => Envelope::error(e.to_string()),
        }
    }
}

/// Build the generic-record request: `service` selects the query kind, every
/// other parameter is forwarded verbatim (sites split on commas).
fn record_request(params: &Value) -> Result<ServiceRequest, NwisError> {
    let keyword = str_param(params, "service")
        .ok_or_else(|| NwisError::InvalidInput("service parameter is required".to_string()))?;
    let service = Service::from_keyword(&keyword).ok_or_else(|| {
        NwisError::InvalidInput(format!("unknown NWIS service '{keyword}'"))
    })?;
    Ok(forward_params(
        ServiceRequest::new(service),
        params,
        &["service"],
        &["sites"],
    ))
}
