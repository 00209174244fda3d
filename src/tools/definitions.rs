// src/tools/definitions.rs
// The fixed function catalog surfaced to callers (human, MCP client, or
// language model). Built once, never mutated at runtime.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::chat::ChatMessage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

fn def(name: &str, description: &str, parameters: Value) -> FunctionDefinition {
    FunctionDefinition {
        name: name.to_string(),
        description: description.to_string(),
        parameters,
    }
}

pub fn catalog() -> Vec<FunctionDefinition> {
    vec![
        def(
            "get_site_data",
            "Get information about a specific USGS water monitoring site",
            json!({
                "type": "object",
                "properties": {
                    "site_code": {
                        "type": "string",
                        "description": "USGS site code (e.g., '09380000')"
                    }
                },
                "required": ["site_code"]
            }),
        ),
        def(
            "get_daily_values",
            "Get daily values of water data",
            json!({
                "type": "object",
                "properties": {
                    "site_code": {
                        "type": "string",
                        "description": "USGS site code"
                    },
                    "parameter_code": {
                        "type": "string",
                        "description": "USGS parameter code (e.g., '00060' for discharge)"
                    },
                    "statCd": {
                        "type": "string",
                        "description": "USGS statistic code"
                    },
                    "start_date": {
                        "type": "string",
                        "description": "Start date in YYYY-MM-DD format"
                    },
                    "end_date": {
                        "type": "string",
                        "description": "End date in YYYY-MM-DD format"
                    }
                },
                "required": ["site_code"]
            }),
        ),
        def(
            "get_instantaneous_values",
            "Get instantaneous values of water data",
            json!({
                "type": "object",
                "properties": {
                    "site_code": {
                        "type": "string",
                        "description": "USGS site code"
                    },
                    "parameter_code": {
                        "type": "string",
                        "description": "USGS parameter code (e.g., '00060' for discharge)"
                    },
                    "start_date": {
                        "type": "string",
                        "description": "Start date in YYYY-MM-DD format"
                    },
                    "end_date": {
                        "type": "string",
                        "description": "End date in YYYY-MM-DD format"
                    }
                },
                "required": ["site_code", "parameter_code"]
            }),
        ),
        def(
            "get_discharge_measurements",
            "Get discharge measurements from the waterdata service",
            json!({
                "type": "object",
                "properties": {
                    "sites": {
                        "type": "string",
                        "description": "USGS site code(s), comma-separated"
                    },
                    "start": {
                        "type": "string",
                        "description": "Start date in YYYY-MM-DD format"
                    },
                    "end": {
                        "type": "string",
                        "description": "End date in YYYY-MM-DD format"
                    }
                },
                "required": ["sites"]
            }),
        ),
        def(
            "get_discharge_peaks",
            "Get discharge peaks from the waterdata service",
            json!({
                "type": "object",
                "properties": {
                    "sites": {
                        "type": "string",
                        "description": "USGS site code(s), comma-separated"
                    },
                    "start": {
                        "type": "string",
                        "description": "Start date in YYYY-MM-DD format"
                    },
                    "end": {
                        "type": "string",
                        "description": "End date in YYYY-MM-DD format"
                    }
                },
                "required": ["sites"]
            }),
        ),
        def(
            "get_gwlevels",
            "Get groundwater levels from the waterdata service",
            json!({
                "type": "object",
                "properties": {
                    "sites": {
                        "type": "string",
                        "description": "USGS site code(s), comma-separated"
                    },
                    "start": {
                        "type": "string",
                        "description": "Start date in YYYY-MM-DD format"
                    },
                    "end": {
                        "type": "string",
                        "description": "End date in YYYY-MM-DD format"
                    }
                },
                "required": ["sites"]
            }),
        ),
        def(
            "get_ratings",
            "Get rating table for an active USGS streamgage",
            json!({
                "type": "object",
                "properties": {
                    "site": {
                        "type": "string",
                        "description": "USGS site code"
                    },
                    "file_type": {
                        "type": "string",
                        "description": "File type (base, corr, exsa)",
                        "default": "base"
                    }
                },
                "required": ["site"]
            }),
        ),
        def(
            "what_sites",
            "Search NWIS for sites within a region with specific data",
            json!({
                "type": "object",
                "properties": {
                    "stateCd": {
                        "type": "string",
                        "description": "Two-letter state code (e.g., 'CA')"
                    },
                    "siteType": {
                        "type": "string",
                        "description": "Type of site (e.g., 'ST' for stream)"
                    },
                    "county": {
                        "type": "string",
                        "description": "County code"
                    },
                    "huc": {
                        "type": "string",
                        "description": "Hydrologic Unit Code"
                    }
                }
            }),
        ),
        def(
            "get_info",
            "Get site description information from NWIS",
            json!({
                "type": "object",
                "properties": {
                    "sites": {
                        "type": "string",
                        "description": "USGS site code(s), comma-separated"
                    },
                    "stateCd": {
                        "type": "string",
                        "description": "Two-letter state code (e.g., 'CA')"
                    },
                    "huc": {
                        "type": "string",
                        "description": "Hydrologic Unit Code(s)"
                    },
                    "bBox": {
                        "type": "string",
                        "description": "Bounding box coordinates (minx,miny,maxx,maxy)"
                    },
                    "countyCd": {
                        "type": "string",
                        "description": "County code(s)"
                    },
                    "startDt": {
                        "type": "string",
                        "description": "Start date in YYYY-MM-DD format"
                    },
                    "endDt": {
                        "type": "string",
                        "description": "End date in YYYY-MM-DD format"
                    },
                    "period": {
                        "type": "string",
                        "description": "Period of record (e.g., 'P7D' for 7 days)"
                    },
                    "modifiedSince": {
                        "type": "string",
                        "description": "Modified since date in YYYY-MM-DD format"
                    },
                    "parameterCd": {
                        "type": "string",
                        "description": "USGS parameter code (e.g., '00060' for discharge)"
                    },
                    "siteType": {
                        "type": "string",
                        "description": "Type of site (e.g., 'ST' for stream)"
                    },
                    "siteOutput": {
                        "type": "string",
                        "description": "Site output format"
                    },
                    "seriesCatalogOutput": {
                        "type": "string",
                        "description": "Series catalog output format"
                    }
                }
            }),
        ),
        def(
            "get_record",
            "Get data from NWIS for an arbitrary service",
            json!({
                "type": "object",
                "properties": {
                    "service": {
                        "type": "string",
                        "description": "NWIS service (site, dv, iv, measurements, peaks, gwlevels, ratings, pmcodes, stat, water_use)"
                    },
                    "sites": {
                        "type": "string",
                        "description": "USGS site code(s), comma-separated"
                    }
                }
            }),
        ),
        def(
            "get_stats",
            "Get water services statistics information",
            json!({
                "type": "object",
                "properties": {
                    "sites": {
                        "type": "string",
                        "description": "USGS site code(s), comma-separated"
                    },
                    "parameterCd": {
                        "type": "string",
                        "description": "USGS parameter code (e.g., '00060' for discharge)"
                    },
                    "statReportType": {
                        "type": "string",
                        "description": "Type of statistical report"
                    },
                    "statTypeCd": {
                        "type": "string",
                        "description": "Type of statistical data"
                    }
                }
            }),
        ),
        def(
            "get_pmcodes",
            "Get NWIS parameter codes",
            json!({
                "type": "object",
                "properties": {
                    "parameterCd": {
                        "type": "string",
                        "description": "USGS parameter code"
                    }
                }
            }),
        ),
        def(
            "get_water_use",
            "Get water use data from USGS (NWIS)",
            json!({
                "type": "object",
                "properties": {
                    "years": {
                        "type": "string",
                        "description": "Years to retrieve data for, comma-separated"
                    },
                    "state": {
                        "type": "string",
                        "description": "Two-letter state code (e.g., 'CA')"
                    },
                    "counties": {
                        "type": "string",
                        "description": "County codes"
                    },
                    "categories": {
                        "type": "string",
                        "description": "Water use categories"
                    }
                }
            }),
        ),
    ]
}

/// Context document handed to any caller discovering the bridge: the catalog
/// plus source metadata and, for the driver, the running conversation.
pub fn context_document(messages: Option<&[ChatMessage]>) -> Value {
    let mut context = json!({
        "functions": catalog(),
        "metadata": {
            "source": "USGS Water Data",
            "description": "Data retrieval interface for USGS water data through NWIS web services",
            "version": env!("CARGO_PKG_VERSION"),
            "documentation_url": "https://waterservices.usgs.gov/docs/"
        }
    });

    if let Some(messages) = messages {
        if !messages.is_empty() {
            context["messages"] = serde_json::to_value(messages).unwrap_or(Value::Null);
        }
    }

    context
}
