//! Remote drive adapter
//!
//! Implements the [`Drive`] contract by proxying every operation to a
//! second, independently addressed server's contents REST API. Each
//! operation is one HTTP round trip: build the endpoint URL from the
//! current connection settings, issue the request, check the status the
//! operation expects, validate the body shape, then publish a change event
//! for mutations. Nothing is cached and nothing is retried.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::drive::Drive;
use crate::error::{DriveError, DriveResult};
use crate::events::{ChangeEvent, ChangeListeners, ListenerId};
use crate::settings::{ConnectionSettings, DEFAULT_API_ENDPOINT, FILES_ENDPOINT, XSRF_COOKIE};
use crate::types::{
    CheckpointModel, ContentModel, CreateOptions, ContentType, FetchOptions, SaveModel,
};
use crate::{uri, validate};

const CHECKPOINTS: &str = "checkpoints";

/// A named drive proxying file operations to a remote contents server
///
/// Connection settings are shared and mutable: the owning layer can point
/// the drive at a different server at runtime and the change takes effect
/// for every operation that has not yet started. Each operation reads a
/// settings snapshot at call start, so requests already in flight keep the
/// target they were built against.
pub struct RemoteDrive {
    name: String,
    api_endpoint: String,
    settings: Arc<RwLock<ConnectionSettings>>,
    listeners: ChangeListeners,
    disposed: AtomicBool,
}

impl RemoteDrive {
    /// Create a drive with default (empty) connection settings
    ///
    /// The drive is inert until a base URL is supplied via
    /// [`update_settings`](Self::update_settings).
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_settings(name, ConnectionSettings::default())
    }

    pub fn with_settings(name: impl Into<String>, settings: ConnectionSettings) -> Self {
        Self {
            name: name.into(),
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            settings: Arc::new(RwLock::new(settings)),
            listeners: ChangeListeners::new(),
            disposed: AtomicBool::new(false),
        }
    }

    /// Override the REST path prefix (default `api/contents`)
    pub fn with_api_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.api_endpoint = endpoint.into();
        self
    }

    /// Snapshot of the current connection settings
    pub fn settings(&self) -> ConnectionSettings {
        self.settings.read().unwrap().clone()
    }

    /// Mutate the shared connection settings in place
    ///
    /// Takes effect immediately for all operations that start afterwards;
    /// in-flight requests are unaffected.
    pub fn update_settings(&self, mutate: impl FnOnce(&mut ConnectionSettings)) {
        mutate(&mut self.settings.write().unwrap());
    }

    /// Shared handle to the settings record, for owners that prefer to
    /// hold it directly
    pub fn settings_handle(&self) -> Arc<RwLock<ConnectionSettings>> {
        Arc::clone(&self.settings)
    }

    fn snapshot(&self) -> DriveResult<ConnectionSettings> {
        let settings = self.settings.read().unwrap().clone();
        if !settings.has_base_url() {
            return Err(DriveError::MissingBaseUrl);
        }
        Ok(settings)
    }

    fn contents_url(&self, settings: &ConnectionSettings, path: &str, tail: &[&str]) -> String {
        let encoded = uri::encode_path(path);
        let mut parts = vec![self.api_endpoint.as_str(), encoded.as_str()];
        parts.extend_from_slice(tail);
        uri::join(&settings.base_url, &parts)
    }

    /// Issue one request and enforce the operation's expected status
    ///
    /// Any other status becomes a [`DriveError::Server`] carrying the raw
    /// response body for the caller to inspect.
    async fn dispatch<B: Serialize + ?Sized>(
        &self,
        settings: &ConnectionSettings,
        method: Method,
        url: &str,
        body: Option<&B>,
        expected: &[u16],
    ) -> DriveResult<reqwest::Response> {
        debug!(method = %method, url, drive = %self.name, "contents api request");

        let mut request = settings.client.request(method, url);
        if let Some(token) = &settings.token {
            request = request.header(AUTHORIZATION, format!("token {token}"));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        if !expected.contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(DriveError::Server {
                status,
                url: url.to_string(),
                body,
            });
        }
        Ok(response)
    }

    /// Request whose success carries a JSON body
    async fn send_json<B: Serialize + ?Sized>(
        &self,
        settings: &ConnectionSettings,
        method: Method,
        url: &str,
        body: Option<&B>,
        expected: &[u16],
    ) -> DriveResult<Value> {
        let response = self
            .dispatch(settings, method, url, body, expected)
            .await?;
        Ok(response.json::<Value>().await?)
    }

    /// Request whose success is a bodyless 204
    async fn send_no_content(
        &self,
        settings: &ConnectionSettings,
        method: Method,
        url: &str,
    ) -> DriveResult<()> {
        self.dispatch(settings, method, url, None::<&Value>, &[204])
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Drive for RemoteDrive {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, path: &str, options: FetchOptions) -> DriveResult<ContentModel> {
        let settings = self.snapshot()?;

        let mut query: Vec<(String, String)> = Vec::new();
        if let Some(kind) = options.kind {
            query.push(("type".to_string(), kind.as_str().to_string()));
        }
        if let Some(format) = &options.format {
            // The remote API rejects a format for notebooks.
            if options.kind != Some(ContentType::Notebook) {
                query.push(("format".to_string(), format.clone()));
            }
        }
        if let Some(content) = options.content {
            let flag = if content { "1" } else { "0" };
            query.push(("content".to_string(), flag.to_string()));
        }
        query.extend(settings.query_params.iter().cloned());

        let url = uri::with_query(&self.contents_url(&settings, path, &[]), &query);
        let body = self
            .send_json(&settings, Method::GET, &url, None::<&Value>, &[200])
            .await?;
        Ok(validate::content_model(&body)?)
    }

    async fn new_untitled(&self, options: CreateOptions) -> DriveResult<ContentModel> {
        let settings = self.snapshot()?;

        let mut options = options;
        if let Some(ext) = options.ext.take() {
            options.ext = Some(normalize_extension(&ext));
        }

        let url = uri::with_query(
            &self.contents_url(&settings, &options.path, &[]),
            &settings.query_params,
        );
        let body = self
            .send_json(&settings, Method::POST, &url, Some(&options), &[201])
            .await?;
        let model = validate::content_model(&body)?;
        self.listeners.emit(&ChangeEvent::New {
            model: model.clone(),
        });
        Ok(model)
    }

    async fn delete(&self, path: &str) -> DriveResult<()> {
        let settings = self.snapshot()?;
        let url = uri::with_query(
            &self.contents_url(&settings, path, &[]),
            &settings.query_params,
        );
        self.send_no_content(&settings, Method::DELETE, &url).await?;
        self.listeners.emit(&ChangeEvent::Delete {
            path: path.to_string(),
        });
        Ok(())
    }

    async fn rename(&self, old_path: &str, new_path: &str) -> DriveResult<ContentModel> {
        let settings = self.snapshot()?;
        let url = uri::with_query(
            &self.contents_url(&settings, old_path, &[]),
            &settings.query_params,
        );
        let body = self
            .send_json(
                &settings,
                Method::PATCH,
                &url,
                Some(&json!({ "path": new_path })),
                &[200],
            )
            .await?;
        let model = validate::content_model(&body)?;
        self.listeners.emit(&ChangeEvent::Rename {
            old_path: old_path.to_string(),
            model: model.clone(),
        });
        Ok(model)
    }

    async fn save(&self, path: &str, model: &SaveModel) -> DriveResult<ContentModel> {
        let settings = self.snapshot()?;
        let url = uri::with_query(
            &self.contents_url(&settings, path, &[]),
            &settings.query_params,
        );
        let body = self
            .send_json(&settings, Method::PUT, &url, Some(model), &[200, 201])
            .await?;
        let model = validate::content_model(&body)?;
        self.listeners.emit(&ChangeEvent::Save {
            model: model.clone(),
        });
        Ok(model)
    }

    async fn copy(&self, source: &str, dest_dir: &str) -> DriveResult<ContentModel> {
        let settings = self.snapshot()?;
        let url = uri::with_query(
            &self.contents_url(&settings, dest_dir, &[]),
            &settings.query_params,
        );
        let body = self
            .send_json(
                &settings,
                Method::POST,
                &url,
                Some(&json!({ "copy_from": source })),
                &[201],
            )
            .await?;
        let model = validate::content_model(&body)?;
        self.listeners.emit(&ChangeEvent::New {
            model: model.clone(),
        });
        Ok(model)
    }

    async fn create_checkpoint(&self, path: &str) -> DriveResult<CheckpointModel> {
        let settings = self.snapshot()?;
        let url = uri::with_query(
            &self.contents_url(&settings, path, &[CHECKPOINTS]),
            &settings.query_params,
        );
        let body = self
            .send_json(&settings, Method::POST, &url, None::<&Value>, &[201])
            .await?;
        Ok(validate::checkpoint_model(&body)?)
    }

    async fn list_checkpoints(&self, path: &str) -> DriveResult<Vec<CheckpointModel>> {
        let settings = self.snapshot()?;
        let url = uri::with_query(
            &self.contents_url(&settings, path, &[CHECKPOINTS]),
            &settings.query_params,
        );
        let body = self
            .send_json(&settings, Method::GET, &url, None::<&Value>, &[200])
            .await?;
        Ok(validate::checkpoint_list(&body)?)
    }

    async fn restore_checkpoint(&self, path: &str, checkpoint_id: &str) -> DriveResult<()> {
        let settings = self.snapshot()?;
        let id = uri::encode_segment(checkpoint_id);
        let url = uri::with_query(
            &self.contents_url(&settings, path, &[CHECKPOINTS, id.as_str()]),
            &settings.query_params,
        );
        self.send_no_content(&settings, Method::POST, &url).await?;
        Ok(())
    }

    async fn delete_checkpoint(&self, path: &str, checkpoint_id: &str) -> DriveResult<()> {
        let settings = self.snapshot()?;
        let id = uri::encode_segment(checkpoint_id);
        let url = uri::with_query(
            &self.contents_url(&settings, path, &[CHECKPOINTS, id.as_str()]),
            &settings.query_params,
        );
        self.send_no_content(&settings, Method::DELETE, &url).await?;
        Ok(())
    }

    fn get_download_url(&self, path: &str) -> DriveResult<String> {
        let settings = self.snapshot()?;
        let encoded = uri::encode_path(path);
        let url = uri::join(&settings.base_url, &[FILES_ENDPOINT, &encoded]);
        match settings.cookie(XSRF_COOKIE) {
            Some(token) => Ok(uri::with_query(
                &url,
                &[("_xsrf".to_string(), token.to_string())],
            )),
            None => Ok(url),
        }
    }

    fn subscribe(&self, listener: Box<dyn Fn(&ChangeEvent) + Send + Sync>) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            self.listeners.clear();
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

/// Prepend the missing leading dot of a non-empty extension. Case is
/// preserved as given.
fn normalize_extension(ext: &str) -> String {
    if ext.is_empty() || ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{ext}")
    }
}
