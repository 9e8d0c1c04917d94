use std::sync::RwLock;
use std::time::{Duration, SystemTime};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use hmac::{Hmac, Mac};
use reqwest::header::LOCATION;
use reqwest::{Client, Method};
use serde_json::Value;
use sha1::Sha1;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, RequestContext, ServiceError, map_server_error, transport_error};
use crate::item::ItemMeta;
use crate::policy::{ExistsPolicy, RestorePolicy, VersionConflict};

type HmacSha1 = Hmac<Sha1>;

pub(crate) const ENDPOINT_OAUTH: &str = "/v2/oauth2/token";
pub(crate) const ENDPOINT_CUSTOMERS: &str = "/v2/admin/cloudfs/customers/";
pub(crate) const ENDPOINT_PING: &str = "/v2/ping";
pub(crate) const ENDPOINT_USER_PROFILE: &str = "/v2/user/profile/";
pub(crate) const ENDPOINT_FOLDERS: &str = "/v2/folders/";
pub(crate) const ENDPOINT_FILES: &str = "/v2/files/";
pub(crate) const ENDPOINT_HISTORY: &str = "/v2/history";
pub(crate) const ENDPOINT_TRASH: &str = "/v2/trash/";

const AUTH_SCHEME: &str = "BCS";
const CONTENT_TYPE_URLENCODED: &str = "application/x-www-form-urlencoded;charset=utf-8";
const MAX_REDIRECTS: u32 = 5;

#[derive(Debug, Clone, Copy)]
pub struct RestConfig {
    pub connect_timeout: Duration,
    pub receive_timeout: Duration,
    /// Additional attempts after the first on HTTP 5xx.
    pub max_retries: u32,
    /// Delay before retry attempt n is `2^n * retry_delay_base`.
    pub retry_delay_base: Duration,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(60),
            receive_timeout: Duration::from_secs(120),
            max_retries: 3,
            retry_delay_base: Duration::from_millis(300),
        }
    }
}

pub(crate) enum Body {
    None,
    Form(Vec<(String, String)>),
    Upload {
        filename: String,
        data: Vec<u8>,
        exists: ExistsPolicy,
    },
}

pub(crate) struct TrashListing {
    pub meta: Option<ItemMeta>,
    pub items: Vec<ItemMeta>,
}

/// Authenticated REST transport for the CloudFS service.
///
/// Safe to share across tasks; item objects hold it behind an `Arc`. The
/// bearer token is session-scoped state of this value, never global.
pub struct RestClient {
    http: Client,
    base_url: Url,
    client_id: String,
    secret: String,
    token: RwLock<Option<String>>,
    config: RestConfig,
}

impl RestClient {
    pub fn new(
        client_id: impl Into<String>,
        secret: impl Into<String>,
        host: &str,
        config: RestConfig,
    ) -> Result<Self, Error> {
        let client_id = client_id.into();
        let secret = secret.into();
        if client_id.trim().is_empty() || secret.trim().is_empty() || host.trim().is_empty() {
            return Err(Error::Argument(
                "client id, secret and host must not be blank".into(),
            ));
        }
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{host}")
        };
        let http = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.receive_timeout)
            .build()
            .map_err(|e| Error::Protocol(e.to_string()))?;
        Ok(Self {
            http,
            base_url: Url::parse(&host)?,
            client_id,
            secret,
            token: RwLock::new(None),
            config,
        })
    }

    // ------------------------------------------------------------------
    // session bootstrap
    // ------------------------------------------------------------------

    /// Exchanges end-user credentials for a bearer token via the signed
    /// bootstrap endpoint.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<(), Error> {
        if username.trim().is_empty() || password.trim().is_empty() {
            return Err(Error::Argument(
                "username and password must not be blank".into(),
            ));
        }
        let form = vec![
            ("grant_type".to_string(), "password".to_string()),
            ("password".to_string(), password.to_string()),
            ("username".to_string(), username.to_string()),
        ];
        let value = self.signed_post(ENDPOINT_OAUTH, form).await?;
        let token = value
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Protocol("token response missing access_token".into()))?;
        self.store_token(Some(token.to_string()));
        Ok(())
    }

    /// Provisions a new end-user account through the second signed bootstrap
    /// endpoint. Returns the account attribute map.
    pub async fn create_account(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<Value, Error> {
        if username.trim().is_empty() || password.trim().is_empty() {
            return Err(Error::Argument(
                "username and password must not be blank".into(),
            ));
        }
        let mut form = vec![
            ("password".to_string(), password.to_string()),
            ("username".to_string(), username.to_string()),
        ];
        if let Some(email) = email.filter(|v| !v.trim().is_empty()) {
            form.push(("email".to_string(), email.to_string()));
        }
        if let Some(first_name) = first_name.filter(|v| !v.trim().is_empty()) {
            form.push(("first_name".to_string(), first_name.to_string()));
        }
        if let Some(last_name) = last_name.filter(|v| !v.trim().is_empty()) {
            form.push(("last_name".to_string(), last_name.to_string()));
        }
        self.signed_post(ENDPOINT_CUSTOMERS, form).await
    }

    /// Verifies the held token against the server.
    pub async fn ping(&self) -> Result<(), Error> {
        self.send(Method::GET, ENDPOINT_PING, None, &[], vec![], Body::None)
            .await?;
        Ok(())
    }

    /// Whether this client can make authenticated calls.
    pub async fn linked(&self) -> Result<bool, Error> {
        match self.ping().await {
            Ok(()) => Ok(true),
            Err(Error::NotAuthenticated) => Ok(false),
            Err(other) => Err(other),
        }
    }

    pub fn has_token(&self) -> bool {
        self.read_token().is_some()
    }

    /// Drops the held token. Idempotent.
    pub fn unlink(&self) {
        self.store_token(None);
    }

    pub async fn get_profile(&self) -> Result<Value, Error> {
        let response = self
            .send(
                Method::GET,
                ENDPOINT_USER_PROFILE,
                None,
                &[],
                vec![],
                Body::None,
            )
            .await?;
        result_value(&response)
    }

    pub async fn list_history(&self, start: i64, stop: Option<i64>) -> Result<Vec<Value>, Error> {
        let mut query = vec![("start", start.to_string())];
        if let Some(stop) = stop {
            query.push(("stop", stop.to_string()));
        }
        let response = self
            .send(Method::GET, ENDPOINT_HISTORY, None, &query, vec![], Body::None)
            .await?;
        match result_value(&response)? {
            Value::Array(entries) => Ok(entries),
            Value::Object(mut map) => match map.remove("items") {
                Some(Value::Array(entries)) => Ok(entries),
                _ => Ok(Vec::new()),
            },
            _ => Ok(Vec::new()),
        }
    }

    // ------------------------------------------------------------------
    // folder / file operations
    // ------------------------------------------------------------------

    pub(crate) async fn create_folder(
        &self,
        name: &str,
        path: Option<&str>,
        exists: ExistsPolicy,
    ) -> Result<ItemMeta, Error> {
        if name.trim().is_empty() {
            return Err(Error::Argument("folder name must not be blank".into()));
        }
        let response = self
            .send(
                Method::POST,
                ENDPOINT_FOLDERS,
                path,
                &[("operation", "create".to_string())],
                vec![],
                Body::Form(vec![
                    ("name".to_string(), name.to_string()),
                    ("exists".to_string(), exists.as_str().to_string()),
                ]),
            )
            .await?;
        let mut items = items_from(result_value(&response)?)?;
        if items.is_empty() {
            return Err(Error::Protocol(
                "create folder response carried no items".into(),
            ));
        }
        Ok(items.swap_remove(0))
    }

    pub(crate) async fn list_folder(
        &self,
        path: Option<&str>,
        depth: Option<u32>,
        filter: Option<&str>,
    ) -> Result<Vec<ItemMeta>, Error> {
        let mut query = Vec::new();
        if let Some(depth) = depth {
            query.push(("depth", depth.to_string()));
        }
        if let Some(filter) = filter.filter(|f| !f.is_empty()) {
            query.push(("filter", filter.to_string()));
            query.push(("strict-traverse", "true".to_string()));
        }
        let response = self
            .send(Method::GET, ENDPOINT_FOLDERS, path, &query, vec![], Body::None)
            .await?;
        items_from(result_value(&response)?)
    }

    pub(crate) async fn delete_item(
        &self,
        endpoint: &'static str,
        path: &str,
        commit: bool,
        force: bool,
    ) -> Result<(), Error> {
        let mut query = vec![("commit", commit.to_string())];
        if force {
            query.push(("force", "true".to_string()));
        }
        self.send(Method::DELETE, endpoint, Some(path), &query, vec![], Body::None)
            .await?;
        Ok(())
    }

    pub(crate) async fn move_item(
        &self,
        endpoint: &'static str,
        path: &str,
        destination: &str,
        name: &str,
        exists: ExistsPolicy,
    ) -> Result<ItemMeta, Error> {
        self.transfer_item(endpoint, "move", path, destination, name, exists)
            .await
    }

    pub(crate) async fn copy_item(
        &self,
        endpoint: &'static str,
        path: &str,
        destination: &str,
        name: &str,
        exists: ExistsPolicy,
    ) -> Result<ItemMeta, Error> {
        self.transfer_item(endpoint, "copy", path, destination, name, exists)
            .await
    }

    async fn transfer_item(
        &self,
        endpoint: &'static str,
        operation: &'static str,
        path: &str,
        destination: &str,
        name: &str,
        exists: ExistsPolicy,
    ) -> Result<ItemMeta, Error> {
        if path.trim().is_empty() || destination.trim().is_empty() || name.trim().is_empty() {
            return Err(Error::Argument(format!(
                "{operation} requires a path, a destination and a name"
            )));
        }
        let destination = crate::path::absolute(destination);
        let response = self
            .send(
                Method::POST,
                endpoint,
                Some(path),
                &[("operation", operation.to_string())],
                vec![],
                Body::Form(vec![
                    ("to".to_string(), destination),
                    ("name".to_string(), name.to_string()),
                    ("exists".to_string(), exists.as_str().to_string()),
                ]),
            )
            .await?;
        meta_from(result_value(&response)?)
    }

    pub(crate) async fn get_meta(
        &self,
        endpoint: &'static str,
        path: &str,
    ) -> Result<ItemMeta, Error> {
        if path.trim().is_empty() {
            return Err(Error::Argument("path must not be blank".into()));
        }
        let name = op_suffix(path, "meta");
        let response = self
            .send(Method::GET, endpoint, Some(&name), &[], vec![], Body::None)
            .await?;
        meta_from(result_value(&response)?)
    }

    pub(crate) async fn alter_meta(
        &self,
        endpoint: &'static str,
        path: &str,
        version: u64,
        version_conflict: VersionConflict,
        mut properties: Vec<(String, String)>,
    ) -> Result<ItemMeta, Error> {
        if path.trim().is_empty() {
            return Err(Error::Argument("path must not be blank".into()));
        }
        properties.push(("version".to_string(), version.to_string()));
        properties.push((
            "version-conflict".to_string(),
            version_conflict.as_str().to_string(),
        ));
        let name = op_suffix(path, "meta");
        let response = self
            .send(
                Method::POST,
                endpoint,
                Some(&name),
                &[],
                vec![],
                Body::Form(properties),
            )
            .await?;
        meta_from(result_value(&response)?)
    }

    pub(crate) async fn upload(
        &self,
        path: &str,
        filename: &str,
        data: Vec<u8>,
        exists: ExistsPolicy,
    ) -> Result<ItemMeta, Error> {
        if filename.trim().is_empty() {
            return Err(Error::Argument("upload requires a file name".into()));
        }
        let response = self
            .send(
                Method::POST,
                ENDPOINT_FILES,
                Some(path),
                &[],
                vec![],
                Body::Upload {
                    filename: filename.to_string(),
                    data,
                    exists,
                },
            )
            .await?;
        meta_from(result_value(&response)?)
    }

    /// Buffered download of a byte range. `count: None` reads to end of file.
    pub(crate) async fn download(
        &self,
        path: &str,
        start: u64,
        count: Option<u64>,
    ) -> Result<Bytes, Error> {
        let headers = range_header(start, count)
            .map(|value| vec![("Range".to_string(), value)])
            .unwrap_or_default();
        self.send(Method::GET, ENDPOINT_FILES, Some(path), &[], headers, Body::None)
            .await
    }

    /// Streaming download; the caller consumes the byte stream.
    pub(crate) async fn download_response(&self, path: &str) -> Result<reqwest::Response, Error> {
        self.send_raw(Method::GET, ENDPOINT_FILES, Some(path), &[], vec![], &Body::None)
            .await
    }

    pub(crate) async fn list_file_versions(
        &self,
        path: &str,
        start_version: u64,
        stop_version: Option<u64>,
        limit: u32,
    ) -> Result<Vec<ItemMeta>, Error> {
        let name = op_suffix(path, "versions");
        let mut query = vec![
            ("start-version", start_version.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(stop) = stop_version {
            query.push(("stop-version", stop.to_string()));
        }
        let response = self
            .send(Method::GET, ENDPOINT_FILES, Some(&name), &query, vec![], Body::None)
            .await?;
        items_from(result_value(&response)?)
    }

    // ------------------------------------------------------------------
    // trash
    // ------------------------------------------------------------------

    pub(crate) async fn browse_trash(&self, path: Option<&str>) -> Result<TrashListing, Error> {
        let response = self
            .send(Method::GET, ENDPOINT_TRASH, path, &[], vec![], Body::None)
            .await?;
        let value = result_value(&response)?;
        let meta = match value.get("meta") {
            Some(meta) if meta.is_object() => Some(
                serde_json::from_value(meta.clone())
                    .map_err(|e| Error::Protocol(format!("invalid trash meta: {e}")))?,
            ),
            _ => None,
        };
        let items = match value.get("items") {
            Some(items) => serde_json::from_value(items.clone())
                .map_err(|e| Error::Protocol(format!("invalid trash items: {e}")))?,
            None => Vec::new(),
        };
        Ok(TrashListing { meta, items })
    }

    pub(crate) async fn delete_trash_item(&self, path: &str) -> Result<(), Error> {
        if path.trim().is_empty() {
            return Err(Error::Argument("trash path must not be blank".into()));
        }
        self.send(Method::DELETE, ENDPOINT_TRASH, Some(path), &[], vec![], Body::None)
            .await?;
        Ok(())
    }

    pub(crate) async fn recover_trash_item(
        &self,
        path: &str,
        policy: RestorePolicy,
        destination: Option<&str>,
    ) -> Result<(), Error> {
        if path.trim().is_empty() {
            return Err(Error::Argument("trash path must not be blank".into()));
        }
        let mut form = vec![("restore".to_string(), policy.as_str().to_string())];
        if let Some(destination) = destination.filter(|d| !d.trim().is_empty()) {
            let destination = crate::path::absolute(destination);
            match policy {
                RestorePolicy::Rescue => form.push(("rescue-path".to_string(), destination)),
                RestorePolicy::Recreate => form.push(("recreate-path".to_string(), destination)),
                RestorePolicy::Fail => {}
            }
        }
        self.send(Method::POST, ENDPOINT_TRASH, Some(path), &[], vec![], Body::Form(form))
            .await?;
        Ok(())
    }

    /// Resolves a named path (`/a/b`) to an id-addressed path by listing one
    /// level per segment. Expensive by design; used by RECREATE restores.
    pub(crate) async fn address_of_named_path(&self, named_path: &str) -> Result<String, Error> {
        let mut address = String::new();
        for segment in named_path.split('/').filter(|s| !s.is_empty()) {
            let parent = if address.is_empty() {
                None
            } else {
                Some(address.as_str())
            };
            let filter = format!("name={segment}");
            let items = self.list_folder(parent, Some(1), Some(&filter)).await?;
            let first = items.into_iter().next().ok_or_else(|| {
                Error::Service(ServiceError::missing_path_segment(
                    segment,
                    RequestContext {
                        method: Method::GET.to_string(),
                        url: format!("{}{}", self.base_url, named_path),
                    },
                ))
            })?;
            address.push('/');
            address.push_str(&first.id);
        }
        if address.is_empty() {
            address.push('/');
        }
        Ok(address)
    }

    // ------------------------------------------------------------------
    // request plumbing
    // ------------------------------------------------------------------

    async fn signed_post(
        &self,
        endpoint: &'static str,
        form: Vec<(String, String)>,
    ) -> Result<Value, Error> {
        let date = httpdate::fmt_http_date(SystemTime::now());
        let headers = vec![
            ("Content-Type".to_string(), CONTENT_TYPE_URLENCODED.to_string()),
            ("Date".to_string(), date),
        ];
        let signature = sign(&self.secret, &string_to_sign(endpoint, &form, &headers));
        let mut headers = headers;
        headers.push((
            "Authorization".to_string(),
            format!("{AUTH_SCHEME} {}:{signature}", self.client_id),
        ));
        let response = self
            .send(Method::POST, endpoint, None, &[], headers, Body::Form(form))
            .await?;
        result_value(&response)
    }

    pub(crate) async fn send(
        &self,
        method: Method,
        endpoint: &'static str,
        name: Option<&str>,
        query: &[(&str, String)],
        headers: Vec<(String, String)>,
        body: Body,
    ) -> Result<Bytes, Error> {
        let response = self
            .send_raw(method, endpoint, name, query, headers, &body)
            .await?;
        response.bytes().await.map_err(transport_error)
    }

    async fn send_raw(
        &self,
        method: Method,
        endpoint: &'static str,
        name: Option<&str>,
        query: &[(&str, String)],
        headers: Vec<(String, String)>,
        body: &Body,
    ) -> Result<reqwest::Response, Error> {
        let bootstrap = endpoint == ENDPOINT_OAUTH || endpoint == ENDPOINT_CUSTOMERS;
        let token = self.read_token();
        if !bootstrap && token.is_none() {
            return Err(Error::NotAuthenticated);
        }
        let has_authorization = headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case("authorization"));

        let mut url = self.build_url(endpoint, name)?;
        let context = RequestContext {
            method: method.to_string(),
            url: url.to_string(),
        };
        let mut attempt: u32 = 0;
        let mut redirects: u32 = 0;
        loop {
            let mut request = self.http.request(method.clone(), url.clone());
            if !query.is_empty() {
                request = request.query(query);
            }
            request = match body {
                Body::None => request,
                Body::Form(fields) => request.form(fields),
                Body::Upload {
                    filename,
                    data,
                    exists,
                } => request.multipart(multipart_form(filename, data.clone(), *exists)?),
            };
            for (key, value) in &headers {
                request = request.header(key, value);
            }
            if let Some(token) = token.as_deref().filter(|_| !has_authorization) {
                request = request.bearer_auth(token);
            }

            let response = request.send().await.map_err(transport_error)?;
            let status = response.status();

            if status.is_redirection() {
                // Only GETs follow redirects; mutations treat them as failures.
                if method == Method::GET && redirects < MAX_REDIRECTS {
                    if let Some(location) =
                        response.headers().get(LOCATION).and_then(|v| v.to_str().ok())
                    {
                        redirects += 1;
                        url = url.join(location)?;
                        debug!(%url, "following redirect");
                        continue;
                    }
                }
                let body = response.text().await.unwrap_or_default();
                return Err(Error::Server { status, body });
            }

            if status.is_server_error() && attempt < self.config.max_retries {
                attempt += 1;
                let delay = retry_delay(self.config.retry_delay_base, attempt);
                warn!(
                    %status,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    url = %context.url,
                    "server failure, backing off before retry"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            if status.is_success() {
                return Ok(response);
            }

            let body = response.text().await.unwrap_or_default();
            return Err(map_server_error(status, body, context));
        }
    }

    fn build_url(&self, endpoint: &str, name: Option<&str>) -> Result<Url, Error> {
        let mut path = endpoint.to_string();
        if let Some(name) = name {
            let name = name.trim();
            if !name.is_empty() {
                if path.ends_with('/') && name.starts_with('/') {
                    path.push_str(&name[1..]);
                } else if !path.ends_with('/') && !name.starts_with('/') {
                    path.push('/');
                    path.push_str(name);
                } else {
                    path.push_str(name);
                }
            }
        }
        Ok(self.base_url.join(&path)?)
    }

    fn read_token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn store_token(&self, token: Option<String>) {
        match self.token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }
}

fn multipart_form(
    filename: &str,
    data: Vec<u8>,
    exists: ExistsPolicy,
) -> Result<reqwest::multipart::Form, Error> {
    let part = reqwest::multipart::Part::bytes(data)
        .file_name(filename.to_string())
        .mime_str("application/octet-stream")
        .map_err(|e| Error::Protocol(e.to_string()))?;
    Ok(reqwest::multipart::Form::new()
        .text("exists", exists.as_str())
        .part("file", part))
}

fn range_header(start: u64, count: Option<u64>) -> Option<String> {
    match (start, count) {
        (0, None) => None,
        (start, None) => Some(format!("bytes={start}-")),
        (start, Some(count)) => Some(format!("bytes={start}-{}", start + count - 1)),
    }
}

pub(crate) fn retry_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1u32 << attempt.min(16))
}

fn op_suffix(path: &str, operation: &str) -> String {
    let path = path.trim();
    if path.ends_with('/') {
        format!("{path}{operation}")
    } else {
        format!("{path}/{operation}")
    }
}

fn urlencode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn encode_pairs(pairs: &[(String, String)], delim: char, join: char) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{}{delim}{}", urlencode(key), urlencode(value)))
        .collect::<Vec<_>>()
        .join(&join.to_string())
}

/// The string signed for bootstrap calls. Form keys sort case-insensitively;
/// the byte-for-byte layout is part of the wire contract.
pub(crate) fn string_to_sign(
    endpoint: &str,
    form: &[(String, String)],
    headers: &[(String, String)],
) -> String {
    let mut sorted = form.to_vec();
    sorted.sort_by(|a, b| a.0.to_lowercase().cmp(&b.0.to_lowercase()));
    let form_encoded = encode_pairs(&sorted, '=', '&');
    let headers_encoded = encode_pairs(headers, ':', '&');
    format!("POST&{endpoint}&{form_encoded}&{headers_encoded}")
}

pub(crate) fn sign(secret: &str, payload: &str) -> String {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(payload.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

fn result_value(content: &[u8]) -> Result<Value, Error> {
    let value: Value = serde_json::from_slice(content)
        .map_err(|e| Error::Protocol(format!("invalid json response: {e}")))?;
    Ok(match value {
        Value::Object(mut map) if map.contains_key("result") => {
            map.remove("result").unwrap_or(Value::Null)
        }
        other => other,
    })
}

fn meta_from(value: Value) -> Result<ItemMeta, Error> {
    let payload = match value {
        Value::Object(mut map) if map.contains_key("meta") => {
            map.remove("meta").unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value(payload).map_err(|e| Error::Protocol(format!("invalid item meta: {e}")))
}

fn items_from(value: Value) -> Result<Vec<ItemMeta>, Error> {
    let payload = match value {
        Value::Object(mut map) => map.remove("items").unwrap_or(Value::Array(Vec::new())),
        other => other,
    };
    serde_json::from_value(payload).map_err(|e| Error::Protocol(format!("invalid item list: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_to_sign_sorts_form_keys_case_insensitively() {
        let form = vec![
            ("grant_type".to_string(), "password".to_string()),
            ("Username".to_string(), "demo user".to_string()),
            ("password".to_string(), "s3cret".to_string()),
        ];
        let headers = vec![
            ("Content-Type".to_string(), CONTENT_TYPE_URLENCODED.to_string()),
            ("Date".to_string(), "Mon, 01 Jan 2024 00:00:00 GMT".to_string()),
        ];
        let signed = string_to_sign(ENDPOINT_OAUTH, &form, &headers);
        assert!(signed.starts_with("POST&/v2/oauth2/token&"));
        // grant_type < password < Username when compared case-insensitively
        let grant = signed.find("grant_type").expect("grant_type present");
        let pass = signed.find("password=s3cret").expect("password present");
        let user = signed.find("Username=demo+user").expect("username present");
        assert!(grant < pass && pass < user, "form keys out of order: {signed}");
        // headers keep declaration order; the ':' delimiter stays raw while
        // values are escaped
        assert!(signed.contains("Content-Type:application%2Fx-www-form-urlencoded%3Bcharset%3Dutf-8"));
        assert!(signed.contains("&Date:Mon%2C+01+Jan+2024"));
    }

    #[test]
    fn signature_is_base64_of_20_byte_digest() {
        use base64::Engine as _;
        let signature = sign("secret", "POST&/v2/oauth2/token&a=b&c:d");
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(&signature)
            .expect("valid base64");
        assert_eq!(decoded.len(), 20);
    }

    #[test]
    fn retry_delay_doubles_per_attempt() {
        let base = Duration::from_millis(300);
        assert_eq!(retry_delay(base, 1), Duration::from_millis(600));
        assert_eq!(retry_delay(base, 2), Duration::from_millis(1200));
        assert_eq!(retry_delay(base, 3), Duration::from_millis(2400));
    }

    #[test]
    fn range_header_is_inclusive() {
        assert_eq!(range_header(0, None), None);
        assert_eq!(range_header(4, None), Some("bytes=4-".to_string()));
        assert_eq!(range_header(0, Some(10)), Some("bytes=0-9".to_string()));
        assert_eq!(range_header(5, Some(5)), Some("bytes=5-9".to_string()));
    }

    #[test]
    fn op_suffix_handles_trailing_slash() {
        assert_eq!(op_suffix("/abc", "meta"), "/abc/meta");
        assert_eq!(op_suffix("/abc/", "meta"), "/abc/meta");
        assert_eq!(op_suffix("/", "meta"), "/meta");
    }
}
