// tests/dispatch.rs
// End-to-end dispatcher behavior against a scripted provider: validation,
// request shaping, sanitization and the envelope contract.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use nwis_mcp::chat::extract_function_calls;
use nwis_mcp::error::NwisError;
use nwis_mcp::nwis::{ParamValue, Service, ServiceRequest, WaterDataProvider};
use nwis_mcp::table::Table;
use nwis_mcp::tools::{Status, ToolExecutor};

/// Provider that records every request and replays scripted responses.
struct MockProvider {
    requests: Mutex<Vec<ServiceRequest>>,
    responses: Mutex<VecDeque<Result<Table, NwisError>>>,
}

impl MockProvider {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
        })
    }

    fn push(&self, response: Result<Table, NwisError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    fn requests(&self) -> Vec<ServiceRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl WaterDataProvider for MockProvider {
    async fn fetch(&self, request: ServiceRequest) -> Result<Table, NwisError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Table::new(vec![], vec![])))
    }
}

fn executor(provider: &Arc<MockProvider>) -> ToolExecutor {
    ToolExecutor::new(provider.clone())
}

fn site_table() -> Table {
    Table::new(
        vec![
            "agency_cd".to_string(),
            "site_no".to_string(),
            "station_nm".to_string(),
            "blank_col".to_string(),
            "dash_col".to_string(),
        ],
        vec![
            vec![
                json!("USGS"),
                json!("09380000"),
                json!("COLORADO RIVER AT LEES FERRY, AZ"),
                Value::Null,
                json!("-"),
            ],
            vec![
                json!("USGS"),
                json!("09380001"),
                json!("SECOND STATION"),
                Value::Null,
                json!("-"),
            ],
        ],
    )
}

#[tokio::test]
async fn site_data_success_drops_empty_and_sentinel_columns() {
    let provider = MockProvider::new();
    provider.push(Ok(site_table()));

    let envelope = executor(&provider)
        .call("get_site_data", &json!({"site_code": "09380000"}))
        .await;

    assert_eq!(envelope.status, Status::Success);
    assert_eq!(
        envelope.message.as_deref(),
        Some("Successfully retrieved data for site 09380000")
    );
    let columns = envelope.column_names.unwrap();
    assert_eq!(columns, vec!["agency_cd", "site_no", "station_nm"]);
    let data = envelope.data.unwrap();
    assert_eq!(data.len(), 2);
    assert!(data.iter().all(|row| row.len() == columns.len()));
}

#[tokio::test]
async fn missing_required_parameter_never_reaches_the_provider() {
    let provider = MockProvider::new();
    let envelope = executor(&provider).call("get_site_data", &json!({})).await;

    assert_eq!(envelope.status, Status::Error);
    assert_eq!(envelope.message.as_deref(), Some("Site code is required"));
    assert!(envelope.column_names.is_none());
    assert!(envelope.data.is_none());
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn empty_string_counts_as_missing() {
    let provider = MockProvider::new();
    let envelope = executor(&provider)
        .call("get_site_data", &json!({"site_code": ""}))
        .await;

    assert_eq!(envelope.message.as_deref(), Some("Site code is required"));
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn unknown_function_lists_the_valid_names() {
    let provider = MockProvider::new();
    let envelope = executor(&provider)
        .call("get_weather", &json!({}))
        .await;

    assert_eq!(envelope.status, Status::Error);
    let message = envelope.message.unwrap();
    assert!(message.starts_with("Function 'get_weather' not found"));
    assert!(message.contains("get_site_data"));
    assert!(message.contains("get_water_use"));
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn empty_site_result_is_an_error_envelope() {
    let provider = MockProvider::new();
    provider.push(Ok(Table::new(
        vec!["agency_cd".to_string()],
        vec![],
    )));

    let envelope = executor(&provider)
        .call("get_site_data", &json!({"site_code": "00000000"}))
        .await;

    assert_eq!(envelope.status, Status::Error);
    assert_eq!(
        envelope.message.as_deref(),
        Some("No data found for site 00000000")
    );
}

#[tokio::test]
async fn rows_with_no_surviving_columns_count_as_no_data() {
    let provider = MockProvider::new();
    provider.push(Ok(Table::new(
        vec!["remark".to_string(), "flag".to_string()],
        vec![
            vec![json!("-"), Value::Null],
            vec![Value::Null, json!("-")],
        ],
    )));

    let envelope = executor(&provider)
        .call("get_site_data", &json!({"site_code": "09380000"}))
        .await;

    assert_eq!(envelope.status, Status::Error);
    assert_eq!(
        envelope.message.as_deref(),
        Some("No data found for site 09380000")
    );
}

#[tokio::test]
async fn provider_error_is_reported_with_the_operation_prefix() {
    let provider = MockProvider::new();
    provider.push(Err(NwisError::Api {
        status: 503,
        body: "service unavailable".to_string(),
    }));

    let envelope = executor(&provider)
        .call("get_daily_values", &json!({"site_code": "09380000"}))
        .await;

    assert_eq!(envelope.status, Status::Error);
    let message = envelope.message.unwrap();
    assert!(message.starts_with("Error retrieving daily values: "));
    assert!(message.contains("503"));
}

#[tokio::test]
async fn comma_separated_sites_reach_the_provider_as_a_list() {
    let provider = MockProvider::new();
    provider.push(Ok(Table::new(
        vec!["site_no".to_string(), "measurement_dt".to_string()],
        vec![
            vec![json!("01594440"), json!("2020-01-01")],
            vec![json!("09380000"), json!("2020-01-02")],
        ],
    )));

    let envelope = executor(&provider)
        .call(
            "get_discharge_measurements",
            &json!({"sites": "01594440,09380000", "start": "2020-01-01"}),
        )
        .await;

    assert_eq!(envelope.status, Status::Success);
    assert_eq!(
        envelope.message.as_deref(),
        Some("Retrieved 2 discharge measurements")
    );

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].service, Service::Measurements);
    assert_eq!(
        requests[0].get("sites"),
        Some(&ParamValue::List(vec![
            "01594440".to_string(),
            "09380000".to_string()
        ]))
    );
    assert_eq!(
        requests[0].get("start"),
        Some(&ParamValue::Single("2020-01-01".to_string()))
    );
}

#[tokio::test]
async fn instantaneous_values_require_both_site_and_parameter() {
    let provider = MockProvider::new();
    let envelope = executor(&provider)
        .call("get_instantaneous_values", &json!({"site_code": "09380000"}))
        .await;

    assert_eq!(
        envelope.message.as_deref(),
        Some("site_code and parameter_code are both required")
    );
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn ratings_default_to_the_base_file_type() {
    let provider = MockProvider::new();
    provider.push(Ok(Table::new(
        vec!["indep".to_string(), "dep".to_string()],
        vec![vec![json!(1.2), json!(30.5)]],
    )));

    let envelope = executor(&provider)
        .call("get_ratings", &json!({"site": "01594440"}))
        .await;

    assert_eq!(
        envelope.message.as_deref(),
        Some("Retrieved 1 rating records for site 01594440")
    );
    let requests = provider.requests();
    assert_eq!(requests[0].service, Service::Ratings);
    assert_eq!(
        requests[0].get("file_type"),
        Some(&ParamValue::Single("base".to_string()))
    );
}

#[tokio::test]
async fn site_info_requires_at_least_one_query_filter() {
    let provider = MockProvider::new();
    let envelope = executor(&provider)
        .call("get_info", &json!({"siteOutput": "expanded"}))
        .await;

    assert_eq!(
        envelope.message.as_deref(),
        Some("At least one of the parameters is required")
    );
    assert!(provider.requests().is_empty());

    provider.push(Ok(Table::new(
        vec!["site_no".to_string()],
        vec![vec![json!("09380000")]],
    )));
    let envelope = executor(&provider)
        .call("get_info", &json!({"stateCd": "AZ", "siteOutput": "expanded"}))
        .await;
    assert_eq!(envelope.message.as_deref(), Some("Retrieved site information"));
    let requests = provider.requests();
    assert_eq!(
        requests[0].get("siteOutput"),
        Some(&ParamValue::Single("expanded".to_string()))
    );
}

#[tokio::test]
async fn record_routes_by_service_keyword() {
    let provider = MockProvider::new();
    provider.push(Ok(Table::new(
        vec!["peak_va".to_string()],
        vec![vec![json!(12400)]],
    )));

    let envelope = executor(&provider)
        .call(
            "get_record",
            &json!({"service": "peaks", "sites": "01594440"}),
        )
        .await;

    assert_eq!(envelope.message.as_deref(), Some("Retrieved 1 records"));
    let requests = provider.requests();
    assert_eq!(requests[0].service, Service::Peaks);
    assert!(requests[0].get("service").is_none());
}

#[tokio::test]
async fn record_rejects_unknown_services_before_fetching() {
    let provider = MockProvider::new();
    let envelope = executor(&provider)
        .call("get_record", &json!({"service": "tides"}))
        .await;

    assert_eq!(envelope.status, Status::Error);
    assert!(envelope.message.unwrap().contains("unknown NWIS service 'tides'"));
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn water_use_drops_internal_join_columns() {
    let provider = MockProvider::new();
    provider.push(Ok(Table::new(
        vec![
            "state_cd".to_string(),
            "county_cd".to_string(),
            "year".to_string(),
            "total_withdrawals".to_string(),
        ],
        vec![vec![json!("42"), json!("001"), json!(2015), json!(981.2)]],
    )));

    let envelope = executor(&provider)
        .call("get_water_use", &json!({"state": "PA", "years": "2015"}))
        .await;

    assert_eq!(envelope.status, Status::Success);
    assert_eq!(envelope.message.as_deref(), Some("Retrieved water use data"));
    assert_eq!(
        envelope.column_names.unwrap(),
        vec!["year", "total_withdrawals"]
    );

    let requests = provider.requests();
    assert_eq!(requests[0].service, Service::WaterUse);
    assert_eq!(
        requests[0].get("state"),
        Some(&ParamValue::Single("PA".to_string()))
    );
}

#[tokio::test]
async fn water_use_requires_at_least_one_selector() {
    let provider = MockProvider::new();
    let envelope = executor(&provider).call("get_water_use", &json!({})).await;

    assert_eq!(
        envelope.message.as_deref(),
        Some("At least one of the parameters is required")
    );
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn extracted_calls_dispatch_end_to_end() {
    let provider = MockProvider::new();
    provider.push(Ok(site_table()));

    let model_output = "I'll look up that site.\n<function_call>\n{\"name\": \
                        \"get_site_data\", \"parameters\": {\"site_code\": \"09380000\"}}\n\
                        </function_call>";
    let calls: Vec<_> = extract_function_calls(model_output)
        .into_iter()
        .filter_map(Result::ok)
        .collect();
    assert_eq!(calls.len(), 1);

    let executor = executor(&provider);
    let envelope = executor.call(&calls[0].name, &calls[0].parameters).await;
    assert_eq!(envelope.status, Status::Success);
    assert_eq!(provider.requests()[0].service, Service::Site);
}
