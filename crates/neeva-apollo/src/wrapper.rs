//! Session-gated GraphQL calls

use neeva_session::SessionToken;
use std::sync::Arc;

use crate::error::ApolloError;
use crate::operation::{GraphQlRequest, GraphQlResponse, Operation, OperationKind};
use crate::summary::ResponseSummary;
use crate::transport::GraphQlTransport;
use crate::Result;

/// Which session cookie, if any, accompanies requests.
#[derive(Clone)]
pub enum CredentialPolicy {
    /// Regular profile. The login cookie is used when present, otherwise
    /// the anonymous preview session.
    Authenticated {
        login: Arc<SessionToken>,
        preview: Arc<SessionToken>,
    },
    /// Incognito profile. Its cookie is fetched before every operation.
    Incognito { token: Arc<SessionToken> },
    /// No session cookie at all.
    Unauthenticated,
}

impl CredentialPolicy {
    fn label(&self) -> &'static str {
        match self {
            CredentialPolicy::Authenticated { .. } => "authenticated",
            CredentialPolicy::Incognito { .. } => "incognito",
            CredentialPolicy::Unauthenticated => "unauthenticated",
        }
    }
}

/// Runs GraphQL operations against the backend.
#[derive(Clone)]
pub struct ApolloWrapper {
    policy: CredentialPolicy,
    transport: Arc<dyn GraphQlTransport>,
}

impl ApolloWrapper {
    pub fn new(policy: CredentialPolicy, transport: Arc<dyn GraphQlTransport>) -> Self {
        Self { policy, transport }
    }

    pub fn policy(&self) -> &CredentialPolicy {
        &self.policy
    }

    /// Resolves the session cookies for the next operation. Fails with
    /// [`ApolloError::NotLoggedIn`] when a login is required and no usable
    /// cookie exists.
    pub async fn prepare_for_operation(
        &self,
        user_must_be_logged_in: bool,
    ) -> Result<Vec<(String, String)>> {
        match &self.policy {
            CredentialPolicy::Authenticated { login, preview } => {
                let login_value = login.cached_value();
                if !login_value.is_empty() {
                    return Ok(vec![(login.cookie_name().to_string(), login_value)]);
                }
                if user_must_be_logged_in {
                    return Err(ApolloError::NotLoggedIn);
                }

                match preview.get_or_fetch_cookie().await {
                    Ok(credential) if !credential.is_empty() => {
                        Ok(vec![(preview.cookie_name().to_string(), credential.value)])
                    }
                    Ok(_) => Ok(Vec::new()),
                    Err(e) => {
                        tracing::warn!(error = %e, "Preview session unavailable");
                        Ok(Vec::new())
                    }
                }
            }
            CredentialPolicy::Incognito { token } => {
                let value = match token.get_or_fetch_cookie().await {
                    Ok(credential) => credential.value,
                    Err(e) => {
                        tracing::warn!(error = %e, "Incognito session unavailable");
                        String::new()
                    }
                };

                if !value.is_empty() {
                    Ok(vec![(token.cookie_name().to_string(), value)])
                } else if user_must_be_logged_in {
                    Err(ApolloError::NotLoggedIn)
                } else {
                    Ok(Vec::new())
                }
            }
            CredentialPolicy::Unauthenticated => {
                if user_must_be_logged_in {
                    Err(ApolloError::NotLoggedIn)
                } else {
                    Ok(Vec::new())
                }
            }
        }
    }

    pub async fn perform_query<O: Operation>(
        &self,
        query: &O,
        user_must_be_logged_in: bool,
    ) -> ResponseSummary<O::Data> {
        debug_assert_eq!(O::KIND, OperationKind::Query);
        self.perform(query, user_must_be_logged_in).await
    }

    pub async fn perform_mutation<O: Operation>(
        &self,
        mutation: &O,
        user_must_be_logged_in: bool,
    ) -> ResponseSummary<O::Data> {
        debug_assert_eq!(O::KIND, OperationKind::Mutation);
        self.perform(mutation, user_must_be_logged_in).await
    }

    async fn perform<O: Operation>(
        &self,
        operation: &O,
        user_must_be_logged_in: bool,
    ) -> ResponseSummary<O::Data> {
        let cookies = match self.prepare_for_operation(user_must_be_logged_in).await {
            Ok(cookies) => cookies,
            Err(e) => {
                tracing::debug!(
                    operation = operation.name(),
                    policy = self.policy.label(),
                    "Skipping operation without a session"
                );
                return ResponseSummary::Failed(e);
            }
        };

        self.execute(operation, &cookies).await.into()
    }

    async fn execute<O: Operation>(
        &self,
        operation: &O,
        cookies: &[(String, String)],
    ) -> Result<GraphQlResponse<O::Data>> {
        let request = GraphQlRequest::for_operation(operation);
        let body = self.transport.execute(&request, cookies).await.map_err(|e| {
            tracing::warn!(operation = operation.name(), error = %e, "GraphQL call failed");
            e
        })?;

        let response: GraphQlResponse<O::Data> = serde_json::from_value(body)?;
        if response.has_errors() {
            tracing::warn!(
                operation = operation.name(),
                errors = response.errors.len(),
                "GraphQL response carried errors"
            );
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use neeva_prefs::{InMemoryPreferences, SharedPreferencesModel};
    use neeva_session::{CookieJar, CookieManager, NeevaConstants};
    use parking_lot::Mutex;
    use serde::Deserialize;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    #[derive(Debug, Deserialize, PartialEq)]
    struct SearchData {
        answer: String,
    }

    struct SearchQuery;

    impl Operation for SearchQuery {
        type Data = SearchData;
        const KIND: OperationKind = OperationKind::Query;

        fn name(&self) -> &'static str {
            "Search"
        }

        fn document(&self) -> &'static str {
            "query Search { answer }"
        }
    }

    struct StarMutation;

    impl Operation for StarMutation {
        type Data = Value;
        const KIND: OperationKind = OperationKind::Mutation;

        fn name(&self) -> &'static str {
            "Star"
        }

        fn document(&self) -> &'static str {
            "mutation Star { star }"
        }
    }

    /// Replies with a canned result and records what it was sent.
    struct RecordingTransport {
        reply: std::result::Result<Value, ApolloError>,
        calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl RecordingTransport {
        fn replying(reply: std::result::Result<Value, ApolloError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }

        fn last_cookies(&self) -> Vec<(String, String)> {
            self.calls
                .lock()
                .last()
                .map(|(_, cookies)| cookies.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl GraphQlTransport for RecordingTransport {
        async fn execute(
            &self,
            request: &GraphQlRequest,
            cookies: &[(String, String)],
        ) -> Result<Value> {
            self.calls
                .lock()
                .push((request.operation_name.clone(), cookies.to_vec()));
            self.reply.clone()
        }
    }

    /// Cookie jar that counts how often the cookie is read.
    struct CountingCookies {
        jar: CookieJar,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl CookieManager for CountingCookies {
        async fn get_cookie(&self, url: &Url) -> neeva_session::Result<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.jar.get_cookie(url).await
        }

        async fn set_cookie(&self, url: &Url, cookie: &str) -> neeva_session::Result<bool> {
            self.jar.set_cookie(url, cookie).await
        }

        async fn remove_cookie(&self, url: &Url, name: &str) -> neeva_session::Result<bool> {
            self.jar.remove_cookie(url, name).await
        }

        fn is_destroyed(&self) -> bool {
            self.jar.is_destroyed()
        }
    }

    fn prefs() -> SharedPreferencesModel {
        SharedPreferencesModel::new(Arc::new(InMemoryPreferences::new()))
    }

    fn ok_reply() -> std::result::Result<Value, ApolloError> {
        Ok(json!({ "data": { "answer": "42" } }))
    }

    fn authenticated(login_value: &str) -> (CredentialPolicy, Arc<SessionToken>) {
        let constants = NeevaConstants::default();
        let login = Arc::new(SessionToken::login(&constants, prefs()));
        login.update_cached_cookie(login_value).unwrap();
        let preview = Arc::new(SessionToken::preview(
            &constants,
            prefs(),
            reqwest::Client::new(),
        ));
        (
            CredentialPolicy::Authenticated {
                login: login.clone(),
                preview,
            },
            login,
        )
    }

    async fn incognito_with_cookie(value: &str) -> (CredentialPolicy, Arc<CountingCookies>) {
        let constants = NeevaConstants::default();
        let cookies = Arc::new(CountingCookies {
            jar: CookieJar::new(),
            reads: AtomicUsize::new(0),
        });
        if !value.is_empty() {
            cookies
                .set_cookie(&constants.app_url, &format!("httpd~incognito={value}; Path=/"))
                .await
                .unwrap();
        }

        // An endpoint nothing listens on, so a refresh can never succeed.
        let token = SessionToken::incognito(&constants, reqwest::Client::new())
            .with_endpoint(Url::parse("http://127.0.0.1:9/incognito/session").unwrap());
        token
            .initialize_cookie_manager(cookies.clone(), false)
            .await
            .unwrap();
        cookies.reads.store(0, Ordering::SeqCst);

        (
            CredentialPolicy::Incognito {
                token: Arc::new(token),
            },
            cookies,
        )
    }

    #[tokio::test]
    async fn test_required_login_without_cookie_skips_transport() {
        let (policy, _) = authenticated("");
        let transport = RecordingTransport::replying(ok_reply());
        let wrapper = ApolloWrapper::new(policy, transport.clone());

        let summary = wrapper.perform_query(&SearchQuery, true).await;

        assert_eq!(summary.exception(), Some(&ApolloError::NotLoggedIn));
        assert!(summary.response().is_none());
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_logged_in_query_attaches_login_cookie() {
        let (policy, _) = authenticated("login-cookie");
        let transport = RecordingTransport::replying(ok_reply());
        let wrapper = ApolloWrapper::new(policy, transport.clone());

        let summary = wrapper.perform_query(&SearchQuery, true).await;

        assert!(summary.exception().is_none());
        assert_eq!(
            summary.data(),
            Some(&SearchData {
                answer: "42".to_string()
            })
        );
        assert_eq!(
            transport.last_cookies(),
            vec![("httpd~login".to_string(), "login-cookie".to_string())]
        );
    }

    #[tokio::test]
    async fn test_signed_out_optional_login_still_runs() {
        let (policy, _) = authenticated("");
        let transport = RecordingTransport::replying(ok_reply());
        let wrapper = ApolloWrapper::new(policy, transport.clone());

        let summary = wrapper.perform_query(&SearchQuery, false).await;

        assert!(summary.response().is_some());
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_is_captured() {
        let (policy, _) = authenticated("login-cookie");
        let transport =
            RecordingTransport::replying(Err(ApolloError::Network("connection reset".into())));
        let wrapper = ApolloWrapper::new(policy, transport);

        let summary = wrapper.perform_mutation(&StarMutation, true).await;

        assert!(summary.response().is_none());
        assert!(summary.exception().map(ApolloError::is_network).unwrap_or(false));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_serialization_error() {
        let (policy, _) = authenticated("login-cookie");
        let transport = RecordingTransport::replying(Ok(json!({ "data": { "answer": 7 } })));
        let wrapper = ApolloWrapper::new(policy, transport);

        let summary = wrapper.perform_query(&SearchQuery, false).await;

        assert!(matches!(
            summary.exception(),
            Some(ApolloError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_remote_errors_are_left_to_caller() {
        let (policy, _) = authenticated("login-cookie");
        let transport = RecordingTransport::replying(Ok(json!({
            "data": null,
            "errors": [{ "message": "bad query" }]
        })));
        let wrapper = ApolloWrapper::new(policy, transport);

        let summary = wrapper.perform_query(&SearchQuery, false).await;

        assert!(summary.exception().is_none());
        assert!(summary.response().map(|r| r.has_errors()).unwrap_or(false));
        assert!(summary.data().is_none());
    }

    #[tokio::test]
    async fn test_incognito_with_cookie_ignores_login_requirement() {
        let (policy, cookies) = incognito_with_cookie("not-empty").await;
        let wrapper = ApolloWrapper::new(policy, RecordingTransport::replying(ok_reply()));

        assert!(wrapper.prepare_for_operation(false).await.is_ok());
        assert_eq!(cookies.reads.load(Ordering::SeqCst), 1);

        let attached = wrapper.prepare_for_operation(true).await.unwrap();
        assert_eq!(cookies.reads.load(Ordering::SeqCst), 2);
        assert_eq!(
            attached,
            vec![("httpd~incognito".to_string(), "not-empty".to_string())]
        );
    }

    #[tokio::test]
    async fn test_incognito_without_cookie_checks_login_requirement() {
        let (policy, cookies) = incognito_with_cookie("").await;
        let transport = RecordingTransport::replying(ok_reply());
        let wrapper = ApolloWrapper::new(policy, transport.clone());

        assert_eq!(wrapper.prepare_for_operation(false).await, Ok(Vec::new()));
        assert_eq!(cookies.reads.load(Ordering::SeqCst), 1);

        assert_eq!(
            wrapper.prepare_for_operation(true).await,
            Err(ApolloError::NotLoggedIn)
        );
        assert_eq!(cookies.reads.load(Ordering::SeqCst), 2);

        let summary = wrapper.perform_query(&SearchQuery, true).await;
        assert!(summary.response().is_none());
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unauthenticated_never_attaches_cookies() {
        let transport = RecordingTransport::replying(ok_reply());
        let wrapper = ApolloWrapper::new(CredentialPolicy::Unauthenticated, transport.clone());

        let summary = wrapper.perform_query(&SearchQuery, false).await;
        assert!(summary.response().is_some());
        assert!(transport.last_cookies().is_empty());

        let summary = wrapper.perform_query(&SearchQuery, true).await;
        assert_eq!(summary.exception(), Some(&ApolloError::NotLoggedIn));
        assert_eq!(transport.call_count(), 1);
    }
}
