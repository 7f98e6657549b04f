use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use super::config::current_api_config;
use crate::constants::{CHATFLOWS_PATH, SANDBOX_RUN_PATH, SANDBOX_STOP_PATH};
use crate::sorting::ListVariant;

// REST client for the chatflow and sandbox endpoints. Every call returns the
// raw response text; callers decode the JSON they expect.
pub struct ApiClient;

impl ApiClient {
    fn url(path: &str) -> String {
        current_api_config().url(path)
    }

    fn encode(id: &str) -> String {
        String::from(js_sys::encode_uri_component(id))
    }

    /// List the workflows of one kind.
    pub async fn get_chatflows(variant: ListVariant) -> Result<String, JsValue> {
        let url = format!("{}?type={}", Self::url(CHATFLOWS_PATH), variant.api_type());
        Self::fetch_json(&url, "GET", None).await
    }

    /// Ask the backend to deploy a sandbox for a workflow.
    pub async fn run_sandbox(id: &str) -> Result<String, JsValue> {
        let url = format!("{}/{}", Self::url(SANDBOX_RUN_PATH), Self::encode(id));
        Self::fetch_json(&url, "POST", None).await
    }

    /// Ask the backend to tear a sandbox down.
    pub async fn stop_sandbox(id: &str) -> Result<String, JsValue> {
        let url = format!("{}/{}", Self::url(SANDBOX_STOP_PATH), Self::encode(id));
        Self::fetch_json(&url, "POST", None).await
    }

    // Update a workflow record (used to persist channel-reported sandbox state)
    pub async fn update_chatflow(id: &str, body: &str) -> Result<String, JsValue> {
        let url = format!("{}/{}", Self::url(CHATFLOWS_PATH), Self::encode(id));
        Self::fetch_json(&url, "PUT", Some(body)).await
    }

    pub async fn fetch_json(url: &str, method: &str, body: Option<&str>) -> Result<String, JsValue> {
        use web_sys::{Headers, Request, RequestCredentials, RequestInit, RequestMode, Response};

        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::Cors);
        // Session cookies carry the user's identity.
        opts.set_credentials(RequestCredentials::Include);

        let headers = Headers::new()?;
        headers.append("Accept", "application/json")?;
        if let Some(data) = body {
            let js_body = JsValue::from_str(data);
            opts.set_body(&js_body);
            headers.append("Content-Type", "application/json")?;
        }
        opts.set_headers(&headers);

        let request = Request::new_with_str_and_init(url, &opts)?;

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window exists"))?;
        let resp_value = JsFuture::from(window.fetch_with_request(&request)).await?;
        let resp: Response = resp_value.dyn_into()?;

        if !resp.ok() {
            return Err(JsValue::from_str(&format!(
                "API request failed: {} {}",
                resp.status(),
                resp.status_text()
            )));
        }

        let text = JsFuture::from(resp.text()?).await?;
        Ok(text.as_string().unwrap_or_default())
    }
}

/// Render a JS error value as a user-facing string.
pub fn describe_js_error(err: &JsValue) -> String {
    if let Some(s) = err.as_string() {
        return s;
    }
    if let Some(e) = err.dyn_ref::<js_sys::Error>() {
        return String::from(e.message());
    }
    format!("{:?}", err)
}
