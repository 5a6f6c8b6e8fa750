//! HTTP transport for editor commands and snapshots.

use std::future::Future;
use std::pin::pin;

use bastion_core::{CommandAck, CommandRequest, EditorError};
use bastion_proto::{
    ErrorBody, MapInfo, PlacementResponse, RemoveResponse, SnapshotResponse, USER_HEADER, routes,
};
use futures::future::{Either, select};
use gloo::net::http::{Request, Response};
use gloo::timers::future::TimeoutFuture;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;

/// Backend client. Every call races the configured timeout.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiClient {
    base_url: String,
    user_id: String,
    timeout_ms: u64,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            base_url: config.api_base.trim_end_matches('/').to_string(),
            user_id: config.user_id.clone(),
            timeout_ms: config.editor.command_timeout_ms,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn map_info(&self, map_id: &str) -> Result<MapInfo, EditorError> {
        self.with_timeout(self.get_json(&routes::map(map_id))).await
    }

    pub async fn snapshot(&self, map_id: &str) -> Result<SnapshotResponse, EditorError> {
        self.with_timeout(self.get_json(&routes::snapshot(map_id)))
            .await
    }

    pub async fn execute(&self, request: &CommandRequest) -> Result<CommandAck, EditorError> {
        let body = request
            .to_json()
            .map_err(|err| EditorError::Validation(err.to_string()))?;
        self.with_timeout(async {
            let response = self.post(request.path(), body).await?;
            match request {
                CommandRequest::Remove(_) => {
                    let removed: RemoveResponse = read_json(response).await?;
                    Ok(CommandAck::Removed {
                        warning: removed.warning,
                    })
                }
                CommandRequest::Place(_) | CommandRequest::Rotate(_) => {
                    let placed: PlacementResponse = read_json(response).await?;
                    Ok(CommandAck::Placement(placed.placement))
                }
            }
        })
        .await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, EditorError> {
        let url = self.url(path);
        debug!("GET {url}");
        let response = Request::get(&url)
            .header(USER_HEADER, &self.user_id)
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }

    async fn post(&self, path: &str, body: String) -> Result<Response, EditorError> {
        let url = self.url(path);
        debug!("POST {url}");
        Request::post(&url)
            .header("Content-Type", "application/json")
            .header(USER_HEADER, &self.user_id)
            .body(body)
            .map_err(transport)?
            .send()
            .await
            .map_err(transport)
    }

    async fn with_timeout<T>(
        &self,
        request: impl Future<Output = Result<T, EditorError>>,
    ) -> Result<T, EditorError> {
        let millis = u32::try_from(self.timeout_ms).unwrap_or(u32::MAX);
        let timeout = TimeoutFuture::new(millis);
        match select(pin!(request), timeout).await {
            Either::Left((result, _)) => result,
            Either::Right(((), _)) => Err(EditorError::Timeout(self.timeout_ms)),
        }
    }
}

fn transport(err: gloo::net::Error) -> EditorError {
    EditorError::Transport(err.to_string())
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, EditorError> {
    let status = response.status();
    if !response.ok() {
        let text = response.text().await.unwrap_or_default();
        return Err(error_from_response(status, &text));
    }
    response
        .json::<T>()
        .await
        .map_err(|err| EditorError::Transport(format!("Bad response body: {err}")))
}

/// Map a failed response to an editor error, using `{error}` bodies when present.
pub fn error_from_response(status: u16, body: &str) -> EditorError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|body| body.error)
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                body.trim().to_string()
            }
        });
    EditorError::from_status(status, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_error_body_is_used() {
        let err = error_from_response(403, r#"{"error":"Forbidden"}"#);
        assert_eq!(err, EditorError::Permission("Forbidden".to_string()));
        let err = error_from_response(502, "");
        assert_eq!(err, EditorError::Transport("HTTP 502".to_string()));
        let err = error_from_response(404, "no such map");
        assert_eq!(err, EditorError::NotFound("no such map".to_string()));
    }

    #[wasm_bindgen_test]
    fn test_client_uses_config() {
        let mut config = ClientConfig::default();
        config.api_base = "http://api.local/".to_string();
        let client = ApiClient::new(&config);
        assert_eq!(client.url("/health"), "http://api.local/health");
    }
}
