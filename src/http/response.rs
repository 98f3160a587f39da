//! Response payload rendering.
//!
//! Every matched request is answered with status 200 and a JSON body;
//! callers inspect `success` to tell outcomes apart.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::query::{QueryError, RowMap};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePayload {
    pub success: bool,
    pub rows: Vec<RowMap>,
    pub error_type: String,
    pub error_description: String,
}

impl ResponsePayload {
    pub fn success(rows: Vec<RowMap>) -> Self {
        Self {
            success: true,
            rows,
            error_type: String::new(),
            error_description: String::new(),
        }
    }

    pub fn failure(err: &QueryError) -> Self {
        Self {
            success: false,
            rows: Vec::new(),
            error_type: err.kind().as_str().to_string(),
            error_description: err.to_string(),
        }
    }
}

impl From<Result<Vec<RowMap>, QueryError>> for ResponsePayload {
    fn from(result: Result<Vec<RowMap>, QueryError>) -> Self {
        match result {
            Ok(rows) => Self::success(rows),
            Err(err) => Self::failure(&err),
        }
    }
}

impl IntoResponse for ResponsePayload {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{ColumnValue, RawText};
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let row = RowMap::from([
            ("id".to_string(), ColumnValue::Integer(3)),
            ("body".to_string(), ColumnValue::Text(RawText(b"x".to_vec()))),
        ]);
        let payload = ResponsePayload::success(vec![row]);
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "success": true,
                "rows": [{"id": 3, "body": "x"}],
                "errorType": "",
                "errorDescription": ""
            })
        );
    }

    #[test]
    fn test_failure_shape() {
        let payload = ResponsePayload::from(Err(QueryError::UnknownArg("missing".into())));
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "success": false,
                "rows": [],
                "errorType": "UnknownArgError",
                "errorDescription": "unknown argument name: missing"
            })
        );
    }

    #[test]
    fn test_failure_is_still_http_ok() {
        let response =
            ResponsePayload::failure(&QueryError::QueryExecution("boom".into())).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
