//! JSON-RPC method routing.
//!
//! | Method            | Params                                  |
//! |-------------------|-----------------------------------------|
//! | `blockflow_fetch` | `[fromTs, toTs]` or `{fromTs, toTs}`    |
//! | `clique_info`     | none                                    |
//! | `get_balance`     | `[address]`                             |
//! | `transfer`        | `{fromPrivateKey, toAddress, value}`    |
//! | `mining_start`    | none                                    |
//! | `mining_stop`     | none                                    |

use crate::domain::{parse_hex32, ApiError, JsonRpcRequest, JsonRpcResponse, TransferRequest};
use crate::ports::RpcServer;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Route a JSON-RPC method to the node.
pub async fn route_method(
    server: &dyn RpcServer,
    method: &str,
    params: Option<&Value>,
) -> Result<Value, ApiError> {
    match method {
        "blockflow_fetch" => {
            let (from_ts, to_ts) = match params {
                Some(Value::Object(map)) => (
                    field(map.get("fromTs"), "fromTs")?,
                    field(map.get("toTs"), "toTs")?,
                ),
                _ => (parse_param(params, 0)?, parse_param(params, 1)?),
            };
            if from_ts > to_ts {
                return Err(ApiError::invalid_params("fromTs is after toTs"));
            }
            to_value(server.fetch_blocks(from_ts, to_ts).await?)
        }
        "clique_info" => to_value(server.clique_info().await?),
        "get_balance" => {
            let address: String = parse_param(params, 0)?;
            to_value(server.get_balance(parse_hex32(&address)?).await?)
        }
        "transfer" => {
            let request: TransferRequest = parse_param(params, 0)?;
            let key = parse_hex32(&request.from_private_key)?;
            let to = parse_hex32(&request.to_address)?;
            to_value(server.transfer(key, to, request.value).await?)
        }
        "mining_start" => to_value(server.start_mining().await?),
        "mining_stop" => to_value(server.stop_mining().await?),
        _ => Err(ApiError::method_not_found(method)),
    }
}

/// Handle one request object and build its response.
pub async fn process_single_request(server: &dyn RpcServer, request: &Value) -> JsonRpcResponse {
    let request: JsonRpcRequest = match serde_json::from_value(request.clone()) {
        Ok(request) => request,
        Err(e) => {
            return JsonRpcResponse::failure(Value::Null, ApiError::invalid_request(e.to_string()))
        }
    };
    let id = request.id.clone().unwrap_or(Value::Null);
    if request.jsonrpc != crate::domain::JSONRPC_VERSION {
        return JsonRpcResponse::failure(id, ApiError::invalid_request("jsonrpc must be \"2.0\""));
    }

    debug!(method = %request.method, "JSON-RPC request");
    match route_method(server, &request.method, request.params.as_ref()).await {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err(error) => {
            debug!(method = %request.method, %error, "JSON-RPC request failed");
            JsonRpcResponse::failure(id, error)
        }
    }
}

/// Handle a raw request body: a single request or a batch.
pub async fn process_body(server: &dyn RpcServer, body: &str) -> Value {
    let request: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            let error = ApiError::parse_error(e.to_string());
            return response_value(JsonRpcResponse::failure(Value::Null, error));
        }
    };

    match request {
        Value::Array(requests) if requests.is_empty() => {
            let error = ApiError::invalid_request("empty batch");
            response_value(JsonRpcResponse::failure(Value::Null, error))
        }
        Value::Array(requests) => {
            let mut responses = Vec::with_capacity(requests.len());
            for request in &requests {
                responses.push(response_value(process_single_request(server, request).await));
            }
            Value::Array(responses)
        }
        request => response_value(process_single_request(server, &request).await),
    }
}

fn response_value(response: JsonRpcResponse) -> Value {
    serde_json::to_value(response).unwrap_or(Value::Null)
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::internal(e.to_string()))
}

fn field<T: DeserializeOwned>(value: Option<&Value>, name: &str) -> Result<T, ApiError> {
    let value = value.ok_or_else(|| ApiError::invalid_params(format!("missing {}", name)))?;
    serde_json::from_value(value.clone())
        .map_err(|e| ApiError::invalid_params(format!("invalid {}: {}", name, e)))
}

/// Parse a required parameter from JSON-RPC params array.
fn parse_param<T: DeserializeOwned>(params: Option<&Value>, index: usize) -> Result<T, ApiError> {
    let param = params
        .and_then(|p| {
            if p.is_array() {
                p.get(index)
            } else if index == 0 {
                Some(p)
            } else {
                None
            }
        })
        .ok_or_else(|| ApiError::invalid_params(format!("missing parameter at index {}", index)))?;

    serde_json::from_value(param.clone()).map_err(|e| {
        ApiError::invalid_params(format!("invalid parameter at index {}: {}", index, e))
    })
}
