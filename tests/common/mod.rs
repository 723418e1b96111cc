//! Shared fixtures: an in-process server that records uploads, and sample data.

#![allow(dead_code)]

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::routing::post;
use axum::Router;
use giskard_client::model::{Estimator, FeatureInput};
use giskard_client::{ColumnType, ColumnTypes, Model, ModelType, PredictionFunction};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const TOKEN: &str = "SECRET_TOKEN";

#[derive(Debug, Clone)]
pub struct CapturedPart {
    pub name: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub path: String,
    pub headers: HeaderMap,
    pub parts: Vec<CapturedPart>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn metadata(&self) -> serde_json::Value {
        serde_json::from_slice(&self.parts[0].data).unwrap()
    }
}

#[derive(Clone)]
struct MockState {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    status: StatusCode,
    body: String,
}

/// Records every upload and answers with a fixed status and body.
pub struct MockServer {
    pub url: String,
    state: MockState,
    handle: JoinHandle<()>,
}

impl MockServer {
    pub async fn start() -> Self {
        Self::with_response(StatusCode::OK, r#"{"id": 42}"#).await
    }

    pub async fn with_response(status: StatusCode, body: &str) -> Self {
        let state = MockState {
            requests: Arc::new(Mutex::new(Vec::new())),
            status,
            body: body.to_string(),
        };

        let app = Router::new()
            .route("/api/v2/project/data/upload", post(capture))
            .route("/api/v2/project/models/upload", post(capture))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}"),
            state,
            handle,
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> CapturedRequest {
        self.requests().pop().expect("no request received")
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn capture(
    State(state): State<MockState>,
    uri: Uri,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> (StatusCode, String) {
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.unwrap().to_vec();
        parts.push(CapturedPart {
            name,
            file_name,
            content_type,
            data,
        });
    }

    state.requests.lock().unwrap().push(CapturedRequest {
        path: uri.path().to_string(),
        headers,
        parts,
    });

    (state.status, state.body.clone())
}

/// A closed local port, for connection failures.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

// === Diabetes regression fixtures ===

/// Returns (dataframe, input types, target).
pub fn diabetes_dataset() -> (RecordBatch, ColumnTypes, &'static str) {
    let df = RecordBatch::try_from_iter(vec![
        (
            "age",
            Arc::new(Int64Array::from(vec![59, 48, 72, 24, 50, 23])) as ArrayRef,
        ),
        (
            "sex",
            Arc::new(StringArray::from(vec![
                "male", "female", "male", "female", "female", "male",
            ])) as ArrayRef,
        ),
        (
            "bmi",
            Arc::new(Float64Array::from(vec![32.1, 21.6, 30.5, 25.3, 23.0, 22.6])) as ArrayRef,
        ),
        (
            "progression",
            Arc::new(Float64Array::from(vec![
                151.0, 75.0, 141.0, 206.0, 135.0, 97.0,
            ])) as ArrayRef,
        ),
    ])
    .unwrap();

    let input_types = ColumnTypes::from([
        ("age".to_string(), ColumnType::Numeric),
        ("sex".to_string(), ColumnType::Category),
        ("bmi".to_string(), ColumnType::Numeric),
    ]);

    (df, input_types, "progression")
}

pub fn linear_regression_diabetes() -> Model {
    let prediction_function = PredictionFunction::new(
        vec![
            FeatureInput::numeric("age"),
            FeatureInput::one_hot("sex", ["female", "male"]),
            FeatureInput::numeric("bmi"),
        ],
        Estimator::Linear {
            intercept: -152.1,
            coefficients: vec![0.138, -11.4, 11.4, 10.23],
        },
    )
    .unwrap();

    Model::new(prediction_function, ModelType::Regression, ["age", "sex", "bmi"]).unwrap()
}

// === German credit classification fixtures ===

/// Returns (dataframe, input types, target).
pub fn german_credit_data() -> (RecordBatch, ColumnTypes, &'static str) {
    let df = RecordBatch::try_from_iter(vec![
        (
            "account_check_status",
            Arc::new(StringArray::from(vec![
                "< 0 DM",
                "0 <= ... < 200 DM",
                "no checking account",
                "< 0 DM",
                "no checking account",
            ])) as ArrayRef,
        ),
        (
            "duration_in_month",
            Arc::new(Int64Array::from(vec![6, 48, 12, 42, 24])) as ArrayRef,
        ),
        (
            "credit_amount",
            Arc::new(Float64Array::from(vec![
                1169.0, 5951.0, 2096.0, 7882.0, 4870.0,
            ])) as ArrayRef,
        ),
        (
            "default",
            Arc::new(StringArray::from(vec![
                "Not default",
                "Default",
                "Not default",
                "Not default",
                "Default",
            ])) as ArrayRef,
        ),
    ])
    .unwrap();

    let input_types = ColumnTypes::from([
        ("account_check_status".to_string(), ColumnType::Category),
        ("duration_in_month".to_string(), ColumnType::Numeric),
        ("credit_amount".to_string(), ColumnType::Numeric),
        ("default".to_string(), ColumnType::Category),
    ]);

    (df, input_types, "default")
}

pub fn german_credit_model() -> Model {
    let prediction_function = PredictionFunction::new(
        vec![
            FeatureInput::one_hot(
                "account_check_status",
                ["< 0 DM", "0 <= ... < 200 DM", "no checking account"],
            ),
            FeatureInput::numeric("duration_in_month"),
            FeatureInput::numeric("credit_amount"),
        ],
        Estimator::Logistic {
            intercepts: vec![-1.2, 1.2],
            coefficients: vec![
                vec![0.6, 0.2, -0.9, 0.03, 0.0001],
                vec![-0.6, -0.2, 0.9, -0.03, -0.0001],
            ],
        },
    )
    .unwrap();

    Model::new(
        prediction_function,
        ModelType::classification(["Default", "Not default"]),
        ["account_check_status", "duration_in_month", "credit_amount"],
    )
    .unwrap()
}
