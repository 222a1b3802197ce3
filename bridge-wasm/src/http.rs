//! Artwork downloads through the browser's `fetch`.
//!
//! The core only ever asks for artwork images, so this client sends plain
//! CORS requests without custom headers. A request timeout arms a
//! `gloo-timers` callback that aborts the fetch; dropping the timer disarms it.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse},
};
use bytes::Bytes;
use gloo_timers::callback::Timeout;
use js_sys::Uint8Array;
use std::collections::HashMap;
use tracing::debug;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, RequestInit, RequestMode, Response, Window};

use crate::error::js_message;

/// `fetch`-based [`HttpClient`] for artwork.
#[derive(Clone)]
pub struct WasmHttpClient {
    window: Window,
}

impl WasmHttpClient {
    /// Bind to the current browser window.
    pub fn new() -> BridgeResult<Self> {
        let window =
            web_sys::window().ok_or_else(|| BridgeError::NotAvailable("window".to_string()))?;
        Ok(Self { window })
    }
}

fn failed(context: &str, err: &JsValue) -> BridgeError {
    BridgeError::OperationFailed(format!("{context}: {}", js_message(err)))
}

async fn body_bytes(response: &Response) -> BridgeResult<Bytes> {
    let buffer = response
        .array_buffer()
        .map_err(|err| failed("read body", &err))?;
    let buffer = JsFuture::from(buffer)
        .await
        .map_err(|err| failed("read body", &err))?;
    Ok(Bytes::from(Uint8Array::new(&buffer).to_vec()))
}

#[async_trait(?Send)]
impl HttpClient for WasmHttpClient {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        let controller = AbortController::new().map_err(|err| failed("abort controller", &err))?;

        let init = RequestInit::new();
        init.set_method(match request.method {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
        });
        init.set_mode(RequestMode::Cors);
        init.set_signal(Some(&controller.signal()));

        // Fires only if the fetch is still pending when it elapses.
        let _deadline = request.timeout.map(|timeout| {
            let millis = timeout.as_millis().min(u128::from(u32::MAX)) as u32;
            let controller = controller.clone();
            Timeout::new(millis, move || controller.abort())
        });

        let response = JsFuture::from(self.window.fetch_with_str_and_init(&request.url, &init))
            .await
            .map_err(|err| {
                if controller.signal().aborted() {
                    BridgeError::OperationFailed("artwork request timed out".to_string())
                } else {
                    failed("fetch", &err)
                }
            })?
            .dyn_into::<Response>()
            .map_err(|_| BridgeError::OperationFailed("fetch returned non-Response".into()))?;

        let body = match request.method {
            HttpMethod::Get => body_bytes(&response).await?,
            HttpMethod::Head => Bytes::new(),
        };

        let mut headers = HashMap::new();
        if let Ok(Some(content_type)) = response.headers().get("content-type") {
            headers.insert("content-type".to_string(), content_type);
        }
        debug!(status = response.status(), len = body.len(), "Fetched artwork");

        Ok(HttpResponse {
            status: response.status(),
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    async fn fetches_image_bytes_and_type() {
        let client = WasmHttpClient::new().expect("window");

        let response = client
            .execute(HttpRequest::get("data:image/png;base64,AAEC"))
            .await
            .expect("data URL fetch");

        assert_eq!(response.status, 200);
        assert_eq!(response.header("content-type"), Some("image/png"));
        assert_eq!(&response.body[..], &[0u8, 1, 2]);
    }
}
