//! MCP server surface: one tool per catalog operation, all routed through
//! the shared executor so MCP clients and the chat driver see identical
//! behavior.

mod response;

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::ToolExecutor;

pub use response::envelope_response;

#[derive(Clone)]
pub struct WaterDataServer {
    executor: Arc<ToolExecutor>,
    tool_router: ToolRouter<Self>,
}

impl WaterDataServer {
    pub fn new(executor: Arc<ToolExecutor>) -> Self {
        Self {
            executor,
            tool_router: Self::tool_router(),
        }
    }

    async fn dispatch<R: Serialize>(&self, name: &str, req: &R) -> Result<CallToolResult, McpError> {
        let params = serde_json::to_value(req)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(envelope_response(self.executor.call(name, &params).await))
    }
}

// === Request types ===

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SiteDataRequest {
    #[schemars(description = "USGS site code (e.g., '09380000')")]
    pub site_code: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DailyValuesRequest {
    #[schemars(description = "USGS site code")]
    pub site_code: String,
    #[schemars(description = "USGS parameter code (e.g., '00060' for discharge)")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_code: Option<String>,
    #[schemars(description = "USGS statistic code")]
    #[serde(rename = "statCd", skip_serializing_if = "Option::is_none")]
    pub stat_cd: Option<String>,
    #[schemars(description = "Start date in YYYY-MM-DD format")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[schemars(description = "End date in YYYY-MM-DD format")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct InstantaneousValuesRequest {
    #[schemars(description = "USGS site code")]
    pub site_code: String,
    #[schemars(description = "USGS parameter code (e.g., '00060' for discharge)")]
    pub parameter_code: String,
    #[schemars(description = "Start date in YYYY-MM-DD format")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[schemars(description = "End date in YYYY-MM-DD format")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

/// Shared shape for the waterdata services keyed on sites plus a date range
/// (measurements, peaks, groundwater levels).
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SitesDateRangeRequest {
    #[schemars(description = "USGS site code(s), comma-separated")]
    pub sites: String,
    #[schemars(description = "Start date in YYYY-MM-DD format")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[schemars(description = "End date in YYYY-MM-DD format")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RatingsRequest {
    #[schemars(description = "USGS site code")]
    pub site: String,
    #[schemars(description = "File type (base, corr, exsa)")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct WhatSitesRequest {
    #[schemars(description = "Two-letter state code (e.g., 'CA')")]
    #[serde(rename = "stateCd", skip_serializing_if = "Option::is_none")]
    pub state_cd: Option<String>,
    #[schemars(description = "Type of site (e.g., 'ST' for stream)")]
    #[serde(rename = "siteType", skip_serializing_if = "Option::is_none")]
    pub site_type: Option<String>,
    #[schemars(description = "County code")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[schemars(description = "Hydrologic Unit Code")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub huc: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SiteInfoRequest {
    #[schemars(description = "USGS site code(s), comma-separated")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sites: Option<String>,
    #[schemars(description = "Two-letter state code (e.g., 'CA')")]
    #[serde(rename = "stateCd", skip_serializing_if = "Option::is_none")]
    pub state_cd: Option<String>,
    #[schemars(description = "Hydrologic Unit Code(s)")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub huc: Option<String>,
    #[schemars(description = "Bounding box coordinates (minx,miny,maxx,maxy)")]
    #[serde(rename = "bBox", skip_serializing_if = "Option::is_none")]
    pub b_box: Option<String>,
    #[schemars(description = "County code(s)")]
    #[serde(rename = "countyCd", skip_serializing_if = "Option::is_none")]
    pub county_cd: Option<String>,
    #[schemars(description = "Start date in YYYY-MM-DD format")]
    #[serde(rename = "startDt", skip_serializing_if = "Option::is_none")]
    pub start_dt: Option<String>,
    #[schemars(description = "End date in YYYY-MM-DD format")]
    #[serde(rename = "endDt", skip_serializing_if = "Option::is_none")]
    pub end_dt: Option<String>,
    #[schemars(description = "Period of record (e.g., 'P7D' for 7 days)")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[schemars(description = "Modified since date in YYYY-MM-DD format")]
    #[serde(rename = "modifiedSince", skip_serializing_if = "Option::is_none")]
    pub modified_since: Option<String>,
    #[schemars(description = "USGS parameter code (e.g., '00060' for discharge)")]
    #[serde(rename = "parameterCd", skip_serializing_if = "Option::is_none")]
    pub parameter_cd: Option<String>,
    #[schemars(description = "Type of site (e.g., 'ST' for stream)")]
    #[serde(rename = "siteType", skip_serializing_if = "Option::is_none")]
    pub site_type: Option<String>,
    #[schemars(description = "Site output format")]
    #[serde(rename = "siteOutput", skip_serializing_if = "Option::is_none")]
    pub site_output: Option<String>,
    #[schemars(description = "Series catalog output format")]
    #[serde(rename = "seriesCatalogOutput", skip_serializing_if = "Option::is_none")]
    pub series_catalog_output: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecordRequest {
    #[schemars(
        description = "NWIS service (site, dv, iv, measurements, peaks, gwlevels, ratings, pmcodes, stat, water_use)"
    )]
    pub service: String,
    #[schemars(description = "USGS site code(s), comma-separated")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sites: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StatsRequest {
    #[schemars(description = "USGS site code(s), comma-separated")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sites: Option<String>,
    #[schemars(description = "USGS parameter code (e.g., '00060' for discharge)")]
    #[serde(rename = "parameterCd", skip_serializing_if = "Option::is_none")]
    pub parameter_cd: Option<String>,
    #[schemars(description = "Type of statistical report")]
    #[serde(rename = "statReportType", skip_serializing_if = "Option::is_none")]
    pub stat_report_type: Option<String>,
    #[schemars(description = "Type of statistical data")]
    #[serde(rename = "statTypeCd", skip_serializing_if = "Option::is_none")]
    pub stat_type_cd: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PmCodesRequest {
    #[schemars(description = "USGS parameter code")]
    #[serde(rename = "parameterCd")]
    pub parameter_cd: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct WaterUseRequest {
    #[schemars(description = "Years to retrieve data for, comma-separated")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years: Option<String>,
    #[schemars(description = "Two-letter state code (e.g., 'CA')")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[schemars(description = "County codes")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counties: Option<String>,
    #[schemars(description = "Water use categories")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<String>,
}

#[tool_router]
impl WaterDataServer {
    #[tool(description = "Get information about a specific USGS water monitoring site")]
    async fn get_site_data(
        &self,
        Parameters(req): Parameters<SiteDataRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch("get_site_data", &req).await
    }

    #[tool(description = "Get daily values of water data")]
    async fn get_daily_values(
        &self,
        Parameters(req): Parameters<DailyValuesRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch("get_daily_values", &req).await
    }

    #[tool(description = "Get instantaneous values of water data")]
    async fn get_instantaneous_values(
        &self,
        Parameters(req): Parameters<InstantaneousValuesRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch("get_instantaneous_values", &req).await
    }

    #[tool(description = "Get discharge measurements from the waterdata service")]
    async fn get_discharge_measurements(
        &self,
        Parameters(req): Parameters<SitesDateRangeRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch("get_discharge_measurements", &req).await
    }

    #[tool(description = "Get discharge peaks from the waterdata service")]
    async fn get_discharge_peaks(
        &self,
        Parameters(req): Parameters<SitesDateRangeRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch("get_discharge_peaks", &req).await
    }

    #[tool(description = "Get groundwater levels from the waterdata service")]
    async fn get_gwlevels(
        &self,
        Parameters(req): Parameters<SitesDateRangeRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch("get_gwlevels", &req).await
    }

    #[tool(description = "Get rating table for an active USGS streamgage")]
    async fn get_ratings(
        &self,
        Parameters(req): Parameters<RatingsRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch("get_ratings", &req).await
    }

    #[tool(description = "Search NWIS for sites within a region with specific data")]
    async fn what_sites(
        &self,
        Parameters(req): Parameters<WhatSitesRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch("what_sites", &req).await
    }

    #[tool(description = "Get site description information from NWIS")]
    async fn get_info(
        &self,
        Parameters(req): Parameters<SiteInfoRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch("get_info", &req).await
    }

    #[tool(description = "Get data from NWIS for an arbitrary service")]
    async fn get_record(
        &self,
        Parameters(req): Parameters<RecordRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch("get_record", &req).await
    }

    #[tool(description = "Get water services statistics information")]
    async fn get_stats(
        &self,
        Parameters(req): Parameters<StatsRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch("get_stats", &req).await
    }

    #[tool(description = "Get NWIS parameter codes")]
    async fn get_pmcodes(
        &self,
        Parameters(req): Parameters<PmCodesRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch("get_pmcodes", &req).await
    }

    #[tool(description = "Get water use data from USGS (NWIS)")]
    async fn get_water_use(
        &self,
        Parameters(req): Parameters<WaterUseRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch("get_water_use", &req).await
    }
}

#[tool_handler]
impl ServerHandler for WaterDataServer {
    fn get_info(&self) -> ServerInfo {
        let now = chrono::Local::now();
        let date_str = now.format("%Y-%m-%d %H:%M:%S %Z").to_string();

        let instructions = format!(
            "USGS water data bridge over the NWIS web services.\n\n\
            CURRENT DATE/TIME: {}\n\n\
            Tools cover site descriptions, daily and instantaneous values, discharge \
            measurements and peaks, groundwater levels, rating tables, statistics, \
            parameter codes and state water use. Results are tabular: column_names plus \
            data rows, with all-empty columns removed.",
            date_str
        );

        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "nwis-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(instructions),
        }
    }
}
