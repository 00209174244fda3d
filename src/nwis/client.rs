// src/nwis/client.rs
// Real USGS implementation of WaterDataProvider. Every service is requested
// in RDB format so one parser covers the whole surface.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::CONFIG;
use crate::error::NwisError;
use crate::table::Table;

use super::{ParamValue, Service, ServiceRequest, WaterDataProvider, rdb};

pub struct NwisClient {
    client: Client,
}

impl NwisClient {
    pub fn new() -> Result<Self, NwisError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(CONFIG.request_timeout_secs))
            .user_agent(CONFIG.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    /// Endpoint URL for a service. Most queries go through the REST
    /// waterservices host; the legacy waterdata host still owns field
    /// measurements, peaks, ratings and parameter codes; water use lives on
    /// its own host and is scoped by state via the URL path.
    fn endpoint(&self, request: &ServiceRequest) -> String {
        let ws = &CONFIG.waterservices_base_url;
        let wd = &CONFIG.waterdata_base_url;
        match request.service {
            Service::Site => format!("{ws}/nwis/site/"),
            Service::DailyValues => format!("{ws}/nwis/dv/"),
            Service::InstantaneousValues => format!("{ws}/nwis/iv/"),
            Service::GwLevels => format!("{ws}/nwis/gwlevels/"),
            Service::Stats => format!("{ws}/nwis/stat/"),
            Service::Measurements => format!("{wd}/nwis/measurements"),
            Service::Peaks => format!("{wd}/nwis/peak"),
            Service::Ratings => format!("{wd}/nwisweb/get_ratings"),
            Service::PmCodes => format!("{wd}/nwis/pmcodes/pmcodes"),
            Service::WaterUse => {
                let base = &CONFIG.wateruse_base_url;
                match request.get("state") {
                    Some(state) => format!("{base}/{}/nwis/water_use", state.as_query_value()),
                    None => format!("{base}/nwis/water_use"),
                }
            }
        }
    }

    /// Translate the bridge's canonical parameter names into what each USGS
    /// host expects. The legacy waterdata services predate the REST naming.
    fn translate(service: Service, key: &str) -> Option<String> {
        let mapped = match service {
            Service::Measurements | Service::Peaks => match key {
                "sites" => "site_no",
                "start" => "begin_date",
                "end" => "end_date",
                other => other,
            },
            Service::Ratings => match key {
                "site" => "site_no",
                other => other,
            },
            Service::PmCodes => match key {
                "parameterCd" => "pm_search",
                other => other,
            },
            Service::WaterUse => match key {
                "years" => "wu_year",
                "counties" => "wu_county",
                "categories" => "wu_category",
                // Consumed by endpoint() as a URL path segment.
                "state" => return None,
                other => other,
            },
            _ => match key {
                "start" => "startDT",
                "end" => "endDT",
                other => other,
            },
        };
        Some(mapped.to_string())
    }

    fn base_params(service: Service) -> Vec<(String, String)> {
        let mut params = vec![("format".to_string(), "rdb".to_string())];
        match service {
            Service::PmCodes => {
                params.push(("radio_pm_search".to_string(), "pm_search".to_string()));
                params.push(("show".to_string(), "parameter_nm".to_string()));
            }
            Service::WaterUse => {
                params.push(("rdb_compression".to_string(), "value".to_string()));
            }
            _ => {}
        }
        params
    }

    fn query_pairs(request: &ServiceRequest) -> Vec<(String, String)> {
        let mut pairs = Self::base_params(request.service);
        for (key, value) in &request.params {
            if let Some(mapped) = Self::translate(request.service, key) {
                pairs.push((mapped, value.as_query_value()));
            }
        }
        pairs
    }
}

#[async_trait]
impl WaterDataProvider for NwisClient {
    async fn fetch(&self, request: ServiceRequest) -> Result<Table, NwisError> {
        let url = self.endpoint(&request);
        let pairs = Self::query_pairs(&request);
        debug!(service = ?request.service, %url, "fetching from USGS");

        let response = self.client.get(&url).query(&pairs).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(300).collect();
            return Err(NwisError::Api {
                status: status.as_u16(),
                body: snippet,
            });
        }

        let body = response.text().await?;
        rdb::parse(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waterdata_services_use_legacy_parameter_names() {
        let request = ServiceRequest::new(Service::Peaks)
            .param_list("sites", vec!["01594440".to_string()])
            .param("start", "2020-01-01");
        let pairs = NwisClient::query_pairs(&request);
        assert!(pairs.contains(&("site_no".to_string(), "01594440".to_string())));
        assert!(pairs.contains(&("begin_date".to_string(), "2020-01-01".to_string())));
        assert!(pairs.contains(&("format".to_string(), "rdb".to_string())));
    }

    #[test]
    fn waterservices_dates_map_to_start_dt_end_dt() {
        let request = ServiceRequest::new(Service::DailyValues)
            .param("sites", "09380000")
            .param("start", "2021-01-01")
            .param("end", "2021-01-10");
        let pairs = NwisClient::query_pairs(&request);
        assert!(pairs.contains(&("startDT".to_string(), "2021-01-01".to_string())));
        assert!(pairs.contains(&("endDT".to_string(), "2021-01-10".to_string())));
    }

    #[test]
    fn site_lists_join_with_commas_in_the_query() {
        let value = ParamValue::List(vec!["A".to_string(), "B".to_string()]);
        assert_eq!(value.as_query_value(), "A,B");
    }

    #[test]
    fn water_use_state_moves_into_the_path() {
        let request = ServiceRequest::new(Service::WaterUse)
            .param("state", "PA")
            .param_list("years", vec!["2015".to_string()]);
        let pairs = NwisClient::query_pairs(&request);
        assert!(pairs.iter().all(|(k, _)| k != "state"));
        assert!(pairs.contains(&("wu_year".to_string(), "2015".to_string())));
    }
}
