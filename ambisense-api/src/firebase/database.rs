use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use serde::Deserialize;
use serde_json::Value;

use crate::models::RemotePath;
use crate::store::{StoreError, StoreResult};

use super::transport::HttpResponse;

/// Accepts `host`, `https://host` or `https://host/` and returns `https://host`.
pub fn normalize_database_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');

    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        String::from(trimmed)
    } else {
        format!("https://{}", trimmed)
    }
}

/// `<database>/<path>.json?auth=<token>`
pub(crate) fn node_url(database_url: &str, path: &RemotePath, id_token: &str) -> String {
    format!(
        "{}/{}.json?auth={}",
        database_url,
        path.as_str().trim_matches('/'),
        id_token
    )
}

pub(crate) fn float_body(value: f32) -> StoreResult<Vec<u8>> {
    if !value.is_finite() {
        return Err(StoreError::local(format!(
            "cannot store non-finite value {}",
            value
        )));
    }

    serde_json::to_vec(&value)
        .map_err(|e| StoreError::local(format!("failed to encode value: {}", e)))
}

#[derive(Debug, Deserialize)]
struct DatabaseErrorBody {
    error: String,
}

/// `{"error":"Permission denied"}` -> reason `Permission denied`
pub(crate) fn database_error(response: &HttpResponse) -> StoreError {
    let reason = serde_json::from_slice::<DatabaseErrorBody>(&response.body)
        .map(|body| body.error)
        .unwrap_or_else(|_| String::from_utf8_lossy(&response.body).into_owned());

    StoreError::new(reason, response.status as i32)
}

pub(crate) fn parse_bool(response: &HttpResponse) -> StoreResult<bool> {
    if !response.is_success() {
        return Err(database_error(response));
    }

    let code = response.status as i32;
    let value: Value = serde_json::from_slice(&response.body)
        .map_err(|e| StoreError::new(format!("invalid response payload: {}", e), code))?;

    match value {
        Value::Bool(flag) => Ok(flag),
        Value::Null => Err(StoreError::new("path not exist", code)),
        _ => Err(StoreError::new("data type mismatch", code)),
    }
}

pub(crate) fn check_write(response: &HttpResponse) -> StoreResult<()> {
    if response.is_success() {
        Ok(())
    } else {
        Err(database_error(response))
    }
}
