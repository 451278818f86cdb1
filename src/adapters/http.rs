use crate::config::toml_config::BackendConfig;
use crate::core::{BulkResponse, ConfigProvider, Transport, TransportError, ValidatedEntry};
use crate::utils::error::Result;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

const ID_FIELDS: [&str; 3] = ["orderId", "order", "id"];
const ERROR_FIELDS: [&str; 2] = ["error", "message"];

#[derive(Debug, Serialize)]
struct OrderPayload<'a> {
    service: u64,
    link: &'a str,
    quantity: u64,
}

impl<'a> From<&'a ValidatedEntry> for OrderPayload<'a> {
    fn from(entry: &'a ValidatedEntry) -> Self {
        Self {
            service: entry.service_id,
            link: &entry.target_link,
            quantity: entry.quantity,
        }
    }
}

#[derive(Debug, Serialize)]
struct BulkPayload<'a> {
    orders: Vec<OrderPayload<'a>>,
}

/// 以 HTTP 呼叫後端的批次與單筆下單端點
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    bulk_url: String,
    single_url: String,
    headers: HashMap<String, String>,
    bulk_timeout: Duration,
    item_timeout: Duration,
}

impl HttpTransport {
    pub fn new<C: ConfigProvider>(backend: &BackendConfig, config: &C) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            bulk_url: backend.bulk_endpoint()?,
            single_url: backend.single_endpoint()?,
            headers: backend.headers.clone().unwrap_or_default(),
            bulk_timeout: config.bulk_timeout(),
            item_timeout: config.item_timeout(),
        })
    }

    fn post(&self, url: &str, timeout: Duration) -> RequestBuilder {
        let mut request = self.client.post(url).timeout(timeout);

        // 添加自定義標頭
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        request
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn submit_bulk(
        &self,
        entries: &[ValidatedEntry],
    ) -> std::result::Result<BulkResponse, TransportError> {
        let payload = BulkPayload {
            orders: entries.iter().map(OrderPayload::from).collect(),
        };

        tracing::debug!("📡 POST {} ({} orders)", self.bulk_url, entries.len());
        let response = self
            .post(&self.bulk_url, self.bulk_timeout)
            .json(&payload)
            .send()
            .await
            .map_err(map_request_error)?;

        let (status, body) = read_body(response).await?;
        tracing::debug!("📡 Bulk response status: {}", status);

        if !status.is_success() {
            return Err(classify_failure(status, &body, true));
        }

        parse_bulk_body(status, body)
    }

    async fn submit_single(
        &self,
        entry: &ValidatedEntry,
    ) -> std::result::Result<String, TransportError> {
        tracing::debug!("📡 POST {} (line {})", self.single_url, entry.line_number);
        let response = self
            .post(&self.single_url, self.item_timeout)
            .json(&OrderPayload::from(entry))
            .send()
            .await
            .map_err(map_request_error)?;

        let (status, body) = read_body(response).await?;

        if !status.is_success() {
            return Err(classify_failure(status, &body, false));
        }

        parse_single_body(status, &body)
    }
}

fn map_request_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(e.to_string())
    }
}

async fn read_body(
    response: reqwest::Response,
) -> std::result::Result<(StatusCode, Value), TransportError> {
    let status = response.status();
    let text = response.text().await.map_err(map_request_error)?;

    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };

    Ok((status, body))
}

/// 只有批次端點的 404/405 代表「功能不存在」
fn classify_failure(status: StatusCode, body: &Value, bulk: bool) -> TransportError {
    let code = status.as_u16();
    match code {
        404 | 405 if bulk => TransportError::CapabilityAbsent { status: code },
        401 | 403 => TransportError::Unauthorized { status: code },
        400 | 422 => TransportError::Rejected {
            status: Some(code),
            message: error_message(body),
        },
        _ => TransportError::UnexpectedStatus {
            status: code,
            message: error_message(body),
        },
    }
}

fn error_message(body: &Value) -> String {
    ERROR_FIELDS
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::to_string)
        .or_else(|| body.as_str().map(str::to_string))
        .unwrap_or_else(|| "no details provided".to_string())
}

fn reports_failure(body: &Value) -> bool {
    body.get("success") == Some(&Value::Bool(false))
}

/// 回應可能包在 `data` 之下
fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut obj) => match obj.remove("data") {
            Some(data @ Value::Object(_)) | Some(data @ Value::Array(_)) => data,
            Some(other) => {
                obj.insert("data".to_string(), other);
                Value::Object(obj)
            }
            None => Value::Object(obj),
        },
        other => other,
    }
}

fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// 後端可能以數字回傳訂單編號，且同一欄位可能有多個名稱；
/// 每個欄位只保留一個標準名稱，依優先順序取第一個有效值
fn normalize_ids(body: &mut Value) {
    let Some(obj) = body.as_object_mut() else {
        return;
    };

    let order_ids = ["orderIds", "orders"]
        .iter()
        .find_map(|key| match obj.get(*key) {
            Some(Value::Array(ids)) => Some(
                ids.iter()
                    .filter_map(id_to_string)
                    .map(Value::String)
                    .collect::<Vec<_>>(),
            ),
            _ => None,
        });
    obj.remove("orders");
    obj.remove("orderIds");
    if let Some(ids) = order_ids {
        obj.insert("orderIds".to_string(), Value::Array(ids));
    }

    if let Some(Value::Array(results)) = obj.get_mut("results") {
        for item in results.iter_mut().filter_map(Value::as_object_mut) {
            let order_id = ID_FIELDS
                .iter()
                .find_map(|key| item.get(*key).and_then(id_to_string));
            let error = ERROR_FIELDS
                .iter()
                .find_map(|key| item.get(*key).and_then(Value::as_str).map(str::to_string));

            for key in ID_FIELDS.iter().chain(ERROR_FIELDS.iter()) {
                item.remove(*key);
            }
            if let Some(id) = order_id {
                item.insert("orderId".to_string(), Value::String(id));
            }
            if let Some(error) = error {
                item.insert("error".to_string(), Value::String(error));
            }
        }
    }
}

fn parse_bulk_body(
    status: StatusCode,
    body: Value,
) -> std::result::Result<BulkResponse, TransportError> {
    if reports_failure(&body) {
        return Err(TransportError::Rejected {
            status: Some(status.as_u16()),
            message: error_message(&body),
        });
    }

    let mut body = match unwrap_envelope(body) {
        Value::Null => return Ok(BulkResponse::default()),
        Value::Array(items) => serde_json::json!({ "results": items }),
        other => other,
    };
    normalize_ids(&mut body);

    serde_json::from_value(body).map_err(|e| TransportError::InvalidResponse(e.to_string()))
}

fn parse_single_body(status: StatusCode, body: &Value) -> std::result::Result<String, TransportError> {
    if reports_failure(body) || body.get("error").is_some() {
        return Err(TransportError::Rejected {
            status: Some(status.as_u16()),
            message: error_message(body),
        });
    }

    let data = body.get("data").unwrap_or(body);
    ID_FIELDS
        .iter()
        .find_map(|key| data.get(key).and_then(id_to_string))
        .ok_or_else(|| TransportError::InvalidResponse("missing order id".to_string()))
}
