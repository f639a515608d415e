//! SecurityRAT API client.
//!
//! Every call goes through the same pipeline: the transport performs one
//! exchange, the response mapper classifies the status, and the retry policy
//! decides whether to go again. Bodies are decoded after the retry loop, so a
//! malformed payload is reported once as a decoding error and never retried.

use log::{debug, info};
use regex::Regex;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::cache::ResponseCache;
use crate::config::{ConnectorConfig, Credentials};
use crate::error::{ApiError, Result};
use crate::http::response::{check_status, decode};
use crate::http::{ApiRequest, HttpTransport, RawResponse, RequestBody, Transport};
use crate::model::{OptColumnContent, RequirementSkeleton, Resource, Updatable, overlay};

const AUTH_CONFIG_PATH: &str = "authentication_config";
const AUTH_PATH: &str = "authentication";

pub struct SecurityRatClient<T: Transport = HttpTransport> {
    transport: Arc<T>,
    config: Arc<ConnectorConfig>,
    cache: Option<Arc<ResponseCache>>,
    cancel: CancellationToken,
}

impl<T: Transport> Clone for SecurityRatClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            config: Arc::clone(&self.config),
            cache: self.cache.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl SecurityRatClient<HttpTransport> {
    pub fn new(config: ConnectorConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> SecurityRatClient<T> {
    pub fn with_transport(config: ConnectorConfig, transport: T) -> Self {
        let cache = config
            .cached
            .then(|| Arc::new(ResponseCache::new(config.cache_ttl)));

        Self {
            transport: Arc::new(transport),
            config: Arc::new(config),
            cache,
            cancel: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Token that aborts every in-flight call made through this handle.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// A handle sharing session, pool and cache, but cancelled by `cancel`.
    pub fn scoped(&self, cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..self.clone()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.transport.csrf_token().is_some()
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    async fn execute(&self, request: ApiRequest) -> Result<RawResponse> {
        let name = format!("{} {}", request.method, request.path);
        let idempotent = request.method != Method::POST;
        let transport = &self.transport;
        let request = &request;

        self.config
            .retry
            .run_with(&name, idempotent, &self.cancel, move || async move {
                check_status(transport.send(request).await?)
            })
            .await
    }

    fn invalidate(&self, endpoint: &str) {
        if let Some(cache) = &self.cache {
            cache.invalidate_collection(endpoint);
        }
    }

    /// Requests the session bootstrap configuration. This also issues the
    /// CSRF cookie that the login call must echo.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_authentication_config(&self) -> Result<()> {
        self.execute(ApiRequest::get(AUTH_CONFIG_PATH).without_session())
            .await?;
        Ok(())
    }

    /// Posts the credentials. Needs the CSRF cookie from
    /// [`fetch_authentication_config`](Self::fetch_authentication_config).
    #[tracing::instrument(skip(self, credentials))]
    pub async fn login(&self, credentials: &Credentials) -> Result<()> {
        let request = ApiRequest::new(Method::POST, AUTH_PATH).with_body(RequestBody::Form(vec![
            ("j_username".to_string(), credentials.username().to_string()),
            ("j_password".to_string(), credentials.password().to_string()),
        ]));

        self.execute(request).await?;
        self.clear_cache();

        info!(
            "Logged in to {} as {}",
            self.config.api_url,
            credentials.username()
        );
        Ok(())
    }

    /// Runs the whole login flow.
    #[tracing::instrument(skip(self, credentials))]
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<()> {
        self.fetch_authentication_config().await?;
        self.login(credentials).await
    }

    /// GET `{api}/{endpoint}`, bypassing the cache.
    #[tracing::instrument(skip(self))]
    pub async fn get_value(&self, endpoint: &str) -> Result<Value> {
        let raw = self.execute(ApiRequest::get(endpoint)).await?;
        decode(&raw)
    }

    /// GET `{api}/{endpoint}`, served from the cache when enabled.
    #[tracing::instrument(skip(self))]
    pub async fn get_cached_value(&self, endpoint: &str) -> Result<Value> {
        let Some(cache) = &self.cache else {
            return self.get_value(endpoint).await;
        };

        if let Some(value) = cache.get(endpoint) {
            debug!("Cache hit for {}", endpoint);
            return Ok(value);
        }

        let generation = cache.generation(endpoint);
        let value = self.get_value(endpoint).await?;
        if !cache.insert(endpoint, generation, value.clone()) {
            debug!("{} changed while it was fetched, not caching", endpoint);
        }
        Ok(value)
    }

    #[tracing::instrument(skip(self, body))]
    pub async fn post_value(&self, endpoint: &str, body: Value) -> Result<Value> {
        let raw = self.execute(ApiRequest::post(endpoint, body)).await?;
        self.invalidate(endpoint);
        decode(&raw)
    }

    #[tracing::instrument(skip(self, body))]
    pub async fn put_value(&self, endpoint: &str, body: Value) -> Result<Value> {
        let raw = self.execute(ApiRequest::put(endpoint, body)).await?;
        self.invalidate(endpoint);
        decode(&raw)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, endpoint: &str) -> Result<()> {
        self.execute(ApiRequest::delete(endpoint)).await?;
        self.invalidate(endpoint);
        Ok(())
    }

    /// All entities of a collection.
    pub async fn list<R: Resource>(&self) -> Result<Vec<R>> {
        let value = self.get_cached_value(R::PATH).await?;
        from_value(value, R::PATH)
    }

    pub async fn get<R: Resource>(&self, id: u64) -> Result<R> {
        let endpoint = format!("{}/{}", R::PATH, id);
        let value = self.get_value(&endpoint).await?;
        from_value(value, &endpoint)
    }

    /// Creates `entity`; any id it carries is dropped so the server assigns one.
    pub async fn create<R: Resource>(&self, entity: &R) -> Result<R> {
        let mut body = to_value(entity)?;
        if let Value::Object(map) = &mut body {
            map.insert("id".to_string(), Value::Null);
        }

        let created = self.post_value(R::PATH, body).await?;
        from_value(created, R::PATH)
    }

    /// Fetches the current object, applies the fields set in `patch` and
    /// writes the result back. Fields the patch leaves unset, including ones
    /// this crate does not model, keep their server values.
    pub async fn update<R: Updatable>(&self, id: u64, patch: &R::Patch) -> Result<R> {
        let mut current = self.get_value(&format!("{}/{}", R::PATH, id)).await?;
        if !current.is_object() {
            return Err(ApiError::decoding(
                None,
                format!("{}/{} did not return an object", R::PATH, id),
            ));
        }

        overlay(&mut current, to_value(patch)?);
        overlay(&mut current, serde_json::json!({ "id": id }));

        let updated = self.put_value(R::PATH, current).await?;
        from_value(updated, R::PATH)
    }

    pub async fn remove<R: Resource>(&self, id: u64) -> Result<()> {
        self.delete(&format!("{}/{}", R::PATH, id)).await
    }

    /// Requirement skeletons assigned to at least one of `project_types`.
    #[tracing::instrument(skip(self))]
    pub async fn find_requirement_skeletons_with_project_types(
        &self,
        project_types: &[u64],
    ) -> Result<Vec<RequirementSkeleton>> {
        let skeletons = self.list::<RequirementSkeleton>().await?;
        Ok(skeletons
            .into_iter()
            .filter(|s| s.has_any_project_type(project_types))
            .collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_opt_column_contents(
        &self,
        filter: &ContentFilter,
    ) -> Result<Vec<OptColumnContent>> {
        let contents = self.list::<OptColumnContent>().await?;
        Ok(contents.into_iter().filter(|c| filter.matches(c)).collect())
    }
}

fn to_value<S: serde::Serialize + ?Sized>(value: &S) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::config(format!("Failed to encode request body: {}", e)))
}

fn from_value<D: DeserializeOwned>(value: Value, endpoint: &str) -> Result<D> {
    serde_json::from_value(value)
        .map_err(|e| ApiError::decoding(None, format!("Unexpected payload from {}: {}", endpoint, e)))
}

#[derive(Debug, Clone)]
pub enum ContentMatch {
    Substring(String),
    Regex(Regex),
}

/// Criteria for optional column contents. Unset criteria match everything.
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    pub requirement_skeleton: Option<u64>,
    pub opt_column: Option<u64>,
    pub content: Option<ContentMatch>,
}

impl ContentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_requirement_skeleton(mut self, id: u64) -> Self {
        self.requirement_skeleton = Some(id);
        self
    }

    pub fn with_opt_column(mut self, id: u64) -> Self {
        self.opt_column = Some(id);
        self
    }

    pub fn containing(mut self, needle: impl Into<String>) -> Self {
        self.content = Some(ContentMatch::Substring(needle.into()));
        self
    }

    pub fn matching(mut self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| ApiError::config(format!("Invalid search pattern '{}': {}", pattern, e)))?;
        self.content = Some(ContentMatch::Regex(regex));
        Ok(self)
    }

    pub fn matches(&self, entry: &OptColumnContent) -> bool {
        if let Some(id) = self.requirement_skeleton {
            if entry.requirement_skeleton.map(|r| r.id) != Some(id) {
                return false;
            }
        }
        if let Some(id) = self.opt_column {
            if entry.opt_column.map(|r| r.id) != Some(id) {
                return false;
            }
        }
        match &self.content {
            None => true,
            Some(ContentMatch::Substring(needle)) => entry.content.contains(needle.as_str()),
            Some(ContentMatch::Regex(regex)) => regex.is_match(&entry.content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{MockTransport, RetryPolicy};
    use crate::model::{IdRef, TagCategory, TagInstance, TagInstancePatch};
    use async_trait::async_trait;
    use mockito::Matcher;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::default()
            .with_base_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(5))
            .without_jitter()
    }

    fn mock_client(transport: MockTransport) -> SecurityRatClient<MockTransport> {
        let config = ConnectorConfig::new("http://rat.test/api")
            .unwrap()
            .with_retry(fast_retry());
        SecurityRatClient::with_transport(config, transport)
    }

    async fn logged_in_client(server: &mut mockito::Server) -> SecurityRatClient {
        let _config = server
            .mock("GET", "/authentication_config")
            .with_status(200)
            .with_header("set-cookie", "CSRF-TOKEN=csrf-abc; Path=/")
            .with_body("{}")
            .create_async()
            .await;
        let _login = server
            .mock("POST", "/authentication")
            .match_header("X-CSRF-TOKEN", "csrf-abc")
            .with_status(200)
            .create_async()
            .await;

        let config = ConnectorConfig::new(&server.url())
            .unwrap()
            .with_retry(fast_retry());
        let client = SecurityRatClient::new(config).unwrap();
        client
            .authenticate(&Credentials::new("admin", "admin"))
            .await
            .unwrap();
        client
    }

    #[tokio::test]
    async fn test_authenticate_posts_form_credentials() {
        let mut server = mockito::Server::new_async().await;
        let config_mock = server
            .mock("GET", "/authentication_config")
            .with_status(200)
            .with_header("set-cookie", "CSRF-TOKEN=csrf-abc; Path=/")
            .with_body("{}")
            .create_async()
            .await;
        let login_mock = server
            .mock("POST", "/authentication")
            .match_header("X-CSRF-TOKEN", "csrf-abc")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("j_username=admin".to_string()),
                Matcher::Regex("j_password=s3cret".to_string()),
            ]))
            .with_status(200)
            .create_async()
            .await;

        let client = SecurityRatClient::new(ConnectorConfig::new(&server.url()).unwrap()).unwrap();
        assert!(!client.is_authenticated());

        client
            .authenticate(&Credentials::new("admin", "s3cret"))
            .await
            .unwrap();

        config_mock.assert_async().await;
        login_mock.assert_async().await;
        assert!(client.is_authenticated());
    }

    #[tokio::test]
    async fn test_rejected_login_is_auth_error_without_retry() {
        let mut server = mockito::Server::new_async().await;
        let _config = server
            .mock("GET", "/authentication_config")
            .with_status(200)
            .with_header("set-cookie", "CSRF-TOKEN=csrf-abc; Path=/")
            .create_async()
            .await;
        let login_mock = server
            .mock("POST", "/authentication")
            .with_status(401)
            .with_body(r#"{"message": "Bad credentials"}"#)
            .expect(1)
            .create_async()
            .await;

        let config = ConnectorConfig::new(&server.url())
            .unwrap()
            .with_retry(fast_retry());
        let client = SecurityRatClient::new(config).unwrap();
        let result = client
            .authenticate(&Credentials::new("admin", "wrong"))
            .await;

        login_mock.assert_async().await;
        match result {
            Err(ApiError::Auth { status, message }) => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(message, "Bad credentials");
            }
            other => panic!("Expected Auth error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_is_served_from_cache() {
        let mut server = mockito::Server::new_async().await;
        let client = logged_in_client(&mut server).await;

        let mock = server
            .mock("GET", "/tagCategorys")
            .with_status(200)
            .with_body(r#"[{"id": 1, "name": "Source", "showOrder": 1, "active": true}]"#)
            .expect(1)
            .create_async()
            .await;

        let first: Vec<TagCategory> = client.list().await.unwrap();
        let second: Vec<TagCategory> = client.list().await.unwrap();

        mock.assert_async().await;
        assert_eq!(first, second);
        assert_eq!(first[0].name, "Source");
    }

    #[tokio::test]
    async fn test_create_invalidates_cached_collection() {
        let mut server = mockito::Server::new_async().await;
        let client = logged_in_client(&mut server).await;

        let list_mock = server
            .mock("GET", "/tagCategorys")
            .with_status(200)
            .with_body("[]")
            .expect(2)
            .create_async()
            .await;
        let create_mock = server
            .mock("POST", "/tagCategorys")
            .match_body(Matcher::Json(json!({
                "id": null,
                "name": "Source",
                "description": "Where it comes from",
                "showOrder": 0,
                "active": false
            })))
            .with_status(201)
            .with_body(r#"{"id": 5, "name": "Source", "description": "Where it comes from"}"#)
            .create_async()
            .await;

        let _: Vec<TagCategory> = client.list().await.unwrap();
        let created = client
            .create(&TagCategory::new("Source", "Where it comes from"))
            .await
            .unwrap();
        let _: Vec<TagCategory> = client.list().await.unwrap();

        create_mock.assert_async().await;
        list_mock.assert_async().await;
        assert_eq!(created.id, Some(5));
    }

    /// Serves `tagCategorys`, holding the first list response back while a
    /// create goes through.
    #[derive(Default)]
    struct SlowListTransport {
        lists: AtomicUsize,
        created: AtomicUsize,
    }

    #[async_trait]
    impl Transport for SlowListTransport {
        async fn send(&self, request: &ApiRequest) -> Result<RawResponse> {
            if request.method == Method::POST {
                self.created.fetch_add(1, Ordering::SeqCst);
                return Ok(RawResponse::new(
                    StatusCode::CREATED,
                    r#"{"id": 5, "name": "Source"}"#,
                ));
            }

            let created_before = self.created.load(Ordering::SeqCst);
            if self.lists.fetch_add(1, Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
            let body = if created_before > 0 {
                r#"[{"id": 5, "name": "Source"}]"#
            } else {
                "[]"
            };
            Ok(RawResponse::new(StatusCode::OK, body))
        }

        fn csrf_token(&self) -> Option<String> {
            Some("csrf-abc".to_string())
        }
    }

    #[tokio::test]
    async fn test_list_in_flight_during_create_is_not_cached() {
        let config = ConnectorConfig::new("http://rat.test/api")
            .unwrap()
            .with_retry(fast_retry());
        let client = SecurityRatClient::with_transport(config, SlowListTransport::default());

        let reader = client.clone();
        let stale = tokio::spawn(async move { reader.list::<TagCategory>().await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        client
            .create(&TagCategory::new("Source", "Where it comes from"))
            .await
            .unwrap();

        let before = stale.await.unwrap().unwrap();
        assert!(before.is_empty());

        let after: Vec<TagCategory> = client.list().await.unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(client.transport().lists.load(Ordering::SeqCst), 2);

        let cached: Vec<TagCategory> = client.list().await.unwrap();
        assert_eq!(cached, after);
        assert_eq!(client.transport().lists.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_delete_by_id_invalidates_collection() {
        let mut server = mockito::Server::new_async().await;
        let client = logged_in_client(&mut server).await;

        let list_mock = server
            .mock("GET", "/tagInstances")
            .with_status(200)
            .with_body("[]")
            .expect(2)
            .create_async()
            .await;
        let delete_mock = server
            .mock("DELETE", "/tagInstances/4")
            .with_status(200)
            .create_async()
            .await;

        let _: Vec<TagInstance> = client.list().await.unwrap();
        client.remove::<TagInstance>(4).await.unwrap();
        let _: Vec<TagInstance> = client.list().await.unwrap();

        delete_mock.assert_async().await;
        list_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_keeps_fields_outside_patch() {
        let mut server = mockito::Server::new_async().await;
        let client = logged_in_client(&mut server).await;

        let _current = server
            .mock("GET", "/tagInstances/4")
            .with_status(200)
            .with_body(
                r#"{"id": 4, "name": "Old", "description": "kept", "showOrder": 2,
                    "active": true, "tagCategory": {"id": 1}, "serverOnly": "x"}"#,
            )
            .create_async()
            .await;
        let put_mock = server
            .mock("PUT", "/tagInstances")
            .match_body(Matcher::Json(json!({
                "id": 4,
                "name": "New",
                "description": "kept",
                "showOrder": 2,
                "active": true,
                "tagCategory": {"id": 1},
                "serverOnly": "x"
            })))
            .with_status(200)
            .with_body(r#"{"id": 4, "name": "New", "description": "kept", "tagCategory": {"id": 1}}"#)
            .create_async()
            .await;

        let patch = TagInstancePatch {
            name: Some("New".to_string()),
            ..Default::default()
        };
        let updated: TagInstance = client.update(4, &patch).await.unwrap();

        put_mock.assert_async().await;
        assert_eq!(updated.name, "New");
        assert_eq!(updated.tag_category, Some(IdRef::new(1)));
    }

    #[tokio::test]
    async fn test_get_without_session_sends_nothing() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/tagInstances/1")
            .expect(0)
            .create_async()
            .await;

        let client = SecurityRatClient::new(ConnectorConfig::new(&server.url()).unwrap()).unwrap();
        let result = client.get::<TagInstance>(1).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(ApiError::MissingCredential { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_gets_share_one_client() {
        let mut server = mockito::Server::new_async().await;
        let client = logged_in_client(&mut server).await;

        let mut mocks = Vec::new();
        for id in 1..=3 {
            let mock = server
                .mock("GET", format!("/tagInstances/{}", id).as_str())
                .with_status(200)
                .with_body(format!(r#"{{"id": {}, "name": "Tag {}"}}"#, id, id))
                .create_async()
                .await;
            mocks.push(mock);
        }

        let results = futures_util::future::join_all(
            (1..=3).map(|id| client.get::<TagInstance>(id)),
        )
        .await;

        let names: Vec<String> = results.into_iter().map(|r| r.unwrap().name).collect();
        assert_eq!(names, vec!["Tag 1", "Tag 2", "Tag 3"]);
    }

    #[test_log::test(tokio::test)]
    async fn test_server_error_is_retried_then_surfaces() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(4)
            .returning(|_| Ok(RawResponse::new(StatusCode::SERVICE_UNAVAILABLE, "down")));

        let client = mock_client(transport);
        let err = client.get_value("tagInstances").await.unwrap_err();

        assert!(matches!(err, ApiError::RetriesExhausted { attempts: 4, .. }));
        assert!(matches!(err.root_cause(), ApiError::Server { .. }));
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[tokio::test]
    async fn test_server_error_recovers_on_retry() {
        let mut transport = MockTransport::new();
        let mut calls = 0;
        transport.expect_send().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(RawResponse::new(StatusCode::BAD_GATEWAY, ""))
            } else {
                Ok(RawResponse::new(StatusCode::OK, r#"[{"id": 1}]"#))
            }
        });

        let client = mock_client(transport);
        let value = client.get_value("tagInstances").await.unwrap();
        assert_eq!(value, json!([{"id": 1}]));
    }

    #[tokio::test]
    async fn test_rate_limit_waits_for_retry_after() {
        let mut transport = MockTransport::new();
        let mut calls = 0;
        transport.expect_send().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(RawResponse::new(StatusCode::TOO_MANY_REQUESTS, "").with_header("retry-after", "1"))
            } else {
                Ok(RawResponse::new(StatusCode::OK, "[]"))
            }
        });

        let client = mock_client(transport);
        let start = Instant::now();
        client.get_value("optColumns").await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_post_is_not_resent_after_network_error() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Err(ApiError::network("request timed out (tagCategorys)")));

        let client = mock_client(transport);
        let err = client
            .post_value("tagCategorys", json!({"id": null, "name": "Source"}))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Network { .. }));
    }

    #[tokio::test]
    async fn test_get_is_retried_after_network_error() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(4)
            .returning(|_| Err(ApiError::network("connection reset")));

        let client = mock_client(transport);
        let err = client.get_value("tagCategorys").await.unwrap_err();

        assert!(matches!(err, ApiError::RetriesExhausted { attempts: 4, .. }));
    }

    #[tokio::test]
    async fn test_validation_error_is_not_retried() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(|_| {
            Ok(RawResponse::new(
                StatusCode::BAD_REQUEST,
                r#"{"title": "Bad Request", "detail": "name must not be null"}"#,
            ))
        });

        let client = mock_client(transport);
        let err = client
            .post_value("tagCategorys", json!({"id": null}))
            .await
            .unwrap_err();

        match err {
            ApiError::Validation { message, .. } => assert_eq!(message, "name must not be null"),
            other => panic!("Expected Validation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_decoding_error_without_retry() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(RawResponse::new(StatusCode::OK, "<html>login</html>")));

        let client = mock_client(transport);
        let err = client.list::<TagCategory>().await.unwrap_err();
        assert!(matches!(err, ApiError::Decoding { .. }));
    }

    #[tokio::test]
    async fn test_list_accepts_null_fields() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(|_| {
            Ok(RawResponse::new(
                StatusCode::OK,
                r#"[{"id": 1, "name": "A", "description": null, "showOrder": null, "active": true}]"#,
            ))
        });

        let client = mock_client(transport);
        let categories = client.list::<TagCategory>().await.unwrap();

        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].show_order, 0);
        assert!(categories[0].active);
    }

    #[tokio::test]
    async fn test_wrong_shape_is_decoding_error() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(RawResponse::new(StatusCode::OK, r#"{"id": 1}"#)));

        let client = mock_client(transport);
        let err = client.list::<TagCategory>().await.unwrap_err();
        assert!(matches!(err, ApiError::Decoding { .. }));
    }

    #[test_log::test(tokio::test)]
    async fn test_scoped_cancellation_aborts_backoff() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .returning(|_| Ok(RawResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "")));

        let config = ConnectorConfig::new("http://rat.test/api").unwrap().with_retry(
            RetryPolicy::default()
                .with_base_delay(Duration::from_secs(30))
                .with_max_delay(Duration::from_secs(30)),
        );
        let client = SecurityRatClient::with_transport(config, transport);

        let cancel = CancellationToken::new();
        let scoped = client.scoped(cancel.clone());
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let start = Instant::now();
        let err = scoped.get_value("tagInstances").await.unwrap_err();

        assert!(matches!(err, ApiError::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(!client.cancellation_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_find_skeletons_with_project_types() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(|_| {
            Ok(RawResponse::new(
                StatusCode::OK,
                r#"[
                    {"id": 1, "shortName": "A", "projectTypes": [{"id": 1}, {"id": 2}]},
                    {"id": 2, "shortName": "B", "projectTypes": [{"id": 3}]},
                    {"id": 3, "shortName": "C", "projectTypes": []}
                ]"#,
            ))
        });

        let client = mock_client(transport);
        let found = client
            .find_requirement_skeletons_with_project_types(&[1, 2])
            .await
            .unwrap();

        let ids: Vec<_> = found.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![Some(1)]);
    }

    #[tokio::test]
    async fn test_find_opt_column_contents_combines_criteria() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(|_| {
            Ok(RawResponse::new(
                StatusCode::OK,
                r#"[
                    {"id": 1, "content": "Use TLS 1.2", "optColumn": {"id": 1}, "requirementSkeleton": {"id": 10}},
                    {"id": 2, "content": "Use TLS 1.3", "optColumn": {"id": 2}, "requirementSkeleton": {"id": 10}},
                    {"id": 3, "content": "Hash passwords", "optColumn": {"id": 1}, "requirementSkeleton": {"id": 11}}
                ]"#,
            ))
        });

        let client = mock_client(transport);

        let by_column = client
            .find_opt_column_contents(&ContentFilter::new().with_opt_column(1))
            .await
            .unwrap();
        assert_eq!(by_column.len(), 2);

        let combined = client
            .find_opt_column_contents(
                &ContentFilter::new()
                    .with_requirement_skeleton(10)
                    .containing("TLS"),
            )
            .await
            .unwrap();
        assert_eq!(combined.len(), 2);

        let by_regex = client
            .find_opt_column_contents(&ContentFilter::new().matching(r"TLS 1\.3$").unwrap())
            .await
            .unwrap();
        assert_eq!(by_regex.iter().map(|c| c.id).collect::<Vec<_>>(), vec![Some(2)]);
    }

    #[test]
    fn test_invalid_regex_is_config_error() {
        let result = ContentFilter::new().matching("(unclosed");
        assert!(matches!(result, Err(ApiError::Config { .. })));
    }

    #[tokio::test]
    async fn test_uncached_client_fetches_every_time() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(2)
            .returning(|_| Ok(RawResponse::new(StatusCode::OK, "[]")));

        let config = ConnectorConfig::new("http://rat.test/api")
            .unwrap()
            .with_cache(false);
        let client = SecurityRatClient::with_transport(config, transport);

        client.get_cached_value("statusColumns").await.unwrap();
        client.get_cached_value("statusColumns").await.unwrap();
    }
}
