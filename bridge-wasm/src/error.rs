//! Error types for WebAssembly bridge implementations

use bridge_traits::error::BridgeError;
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};

/// Result type for WebAssembly bridge operations
pub type WasmResult<T> = Result<T, WasmError>;

/// Errors that can occur in WebAssembly bridge implementations
#[derive(Error, Debug)]
pub enum WasmError {
    /// JavaScript error from web-sys
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    /// A browser API or script the bridge relies on is missing
    #[error("Not available in this browser: {0}")]
    NotAvailable(String),

    /// The media element refused the request (autoplay policy, bad source)
    #[error("Media element rejected request: {0}")]
    Rejected(String),
}

impl From<WasmError> for BridgeError {
    fn from(err: WasmError) -> Self {
        match err {
            WasmError::NotAvailable(what) => BridgeError::NotAvailable(what),
            WasmError::Rejected(message) => BridgeError::EngineRejected(message),
            WasmError::JavaScript(message) => BridgeError::OperationFailed(message),
        }
    }
}

impl From<JsValue> for WasmError {
    fn from(js_value: JsValue) -> Self {
        WasmError::JavaScript(js_message(&js_value))
    }
}

/// Best-effort readable message for a thrown JavaScript value.
pub fn js_message(js_value: &JsValue) -> String {
    if let Some(text) = js_value.as_string() {
        text
    } else if let Some(error) = js_value.dyn_ref::<js_sys::Error>() {
        let name: String = error.name().into();
        let message: String = error.message().into();
        if name.is_empty() {
            message
        } else {
            format!("{}: {}", name, message)
        }
    } else {
        format!("{:?}", js_value)
    }
}
