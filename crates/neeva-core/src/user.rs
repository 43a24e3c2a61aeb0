//! Signed-in user

use neeva_apollo::{ApolloError, ApolloWrapper, Operation, OperationKind, ResponseSummary};
use neeva_prefs::{keys, SharedPreferencesModel};
use neeva_session::{extract_login_token, SessionToken};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::Result;

/// Minimum time between two user info fetches.
const FETCH_COOLDOWN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SsoProvider {
    #[default]
    Unknown,
    Google,
    Apple,
    Microsoft,
    Okta,
}

impl SsoProvider {
    pub const ALL: [SsoProvider; 5] = [
        SsoProvider::Unknown,
        SsoProvider::Google,
        SsoProvider::Apple,
        SsoProvider::Microsoft,
        SsoProvider::Okta,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SsoProvider::Unknown => "UNKNOWN",
            SsoProvider::Google => "GOOGLE",
            SsoProvider::Apple => "APPLE",
            SsoProvider::Microsoft => "MICROSOFT",
            SsoProvider::Okta => "OKTA",
        }
    }

    /// Authenticator path reported by the backend for this provider.
    pub fn url(&self) -> &'static str {
        match self {
            SsoProvider::Unknown => "",
            SsoProvider::Google => "neeva.co/auth/oauth2/authenticators/google",
            SsoProvider::Apple => "neeva.co/auth/oauth2/authenticators/apple",
            SsoProvider::Microsoft => "neeva.co/auth/oauth2/authenticators/microsoft",
            SsoProvider::Okta => "neeva.co/auth/oauth2/authenticators/okta",
        }
    }

    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|provider| provider.name() == name)
            .unwrap_or_default()
    }

    pub fn from_url(url: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|provider| provider.url() == url)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscriptionType {
    Basic,
    Premium,
    Lifetime,
    Unlimited,
    #[default]
    Unknown,
}

impl SubscriptionType {
    pub const ALL: [SubscriptionType; 5] = [
        SubscriptionType::Basic,
        SubscriptionType::Premium,
        SubscriptionType::Lifetime,
        SubscriptionType::Unlimited,
        SubscriptionType::Unknown,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SubscriptionType::Basic => "Basic",
            SubscriptionType::Premium => "Premium",
            SubscriptionType::Lifetime => "Lifetime",
            SubscriptionType::Unlimited => "Unlimited",
            SubscriptionType::Unknown => "Unknown",
        }
    }

    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .unwrap_or_default()
    }
}

fn unknown_provider() -> String {
    SsoProvider::Unknown.name().to_string()
}

fn unknown_subscription() -> String {
    SubscriptionType::Unknown.name().to_string()
}

/// Profile of the signed-in user, persisted as JSON under `USER/USER_INFO`.
///
/// Enums are kept by name so values written by a newer build still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "pictureURL")]
    pub picture_url: Option<String>,
    #[serde(default = "unknown_provider")]
    pub sso_provider_string: String,
    #[serde(default = "unknown_subscription")]
    pub subscription_type_string: String,
}

impl UserInfo {
    pub fn sso_provider(&self) -> SsoProvider {
        SsoProvider::from_name(&self.sso_provider_string)
    }

    pub fn subscription_type(&self) -> SubscriptionType {
        SubscriptionType::from_name(&self.subscription_type_string)
    }
}

impl Default for UserInfo {
    fn default() -> Self {
        Self {
            id: None,
            display_name: None,
            email: None,
            picture_url: None,
            sso_provider_string: unknown_provider(),
            subscription_type_string: unknown_subscription(),
        }
    }
}

const USER_INFO_DOCUMENT: &str = r#"query UserInfo {
  user {
    id
    profile {
      displayName
      email
      pictureURL
    }
    authProvider
    subscriptionType
  }
}"#;

/// Fetches the profile of the signed-in user.
pub struct UserInfoQuery;

#[derive(Debug, Clone, Deserialize)]
pub struct UserInfoData {
    pub user: Option<UserNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserNode {
    pub id: Option<String>,
    #[serde(default)]
    pub profile: ProfileNode,
    pub auth_provider: Option<String>,
    pub subscription_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileNode {
    pub display_name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "pictureURL")]
    pub picture_url: Option<String>,
}

impl Operation for UserInfoQuery {
    type Data = UserInfoData;

    const KIND: OperationKind = OperationKind::Query;

    fn name(&self) -> &'static str {
        "UserInfo"
    }

    fn document(&self) -> &'static str {
        USER_INFO_DOCUMENT
    }
}

impl From<&UserNode> for UserInfo {
    fn from(node: &UserNode) -> Self {
        let provider = node
            .auth_provider
            .as_deref()
            .map(SsoProvider::from_url)
            .unwrap_or_default();
        let subscription = node
            .subscription_type
            .as_deref()
            .map(SubscriptionType::from_name)
            .unwrap_or_default();

        Self {
            id: node.id.clone(),
            display_name: node.profile.display_name.clone(),
            email: node.profile.email.clone(),
            picture_url: node.profile.picture_url.clone(),
            sso_provider_string: provider.name().to_string(),
            subscription_type_string: subscription.name().to_string(),
        }
    }
}

type SignInJob = Box<dyn FnOnce() + Send>;

/// The signed-in user of the regular profile.
pub struct NeevaUser {
    prefs: SharedPreferencesModel,
    login_token: Arc<SessionToken>,
    user_info: RwLock<Option<UserInfo>>,
    last_fetch: Mutex<Option<Instant>>,
    /// Jobs waiting for the next successful sign-in, by unique name
    sign_in_jobs: Mutex<Vec<(String, SignInJob)>>,
}

impl NeevaUser {
    /// Creates the user, restoring whatever profile was last saved.
    pub fn new(prefs: SharedPreferencesModel, login_token: Arc<SessionToken>) -> Self {
        let saved = prefs.get(&keys::user::USER_INFO);
        let user_info = if saved.is_empty() {
            None
        } else {
            match serde_json::from_str::<UserInfo>(&saved) {
                Ok(info) => Some(info),
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding unreadable saved user info");
                    None
                }
            }
        };

        Self {
            prefs,
            login_token,
            user_info: RwLock::new(user_info),
            last_fetch: Mutex::new(None),
            sign_in_jobs: Mutex::new(Vec::new()),
        }
    }

    pub fn login_token(&self) -> &Arc<SessionToken> {
        &self.login_token
    }

    pub fn user_info(&self) -> Option<UserInfo> {
        self.user_info.read().clone()
    }

    pub fn is_signed_out(&self) -> bool {
        self.login_token.is_empty()
    }

    pub fn set_user_info(&self, info: UserInfo) -> Result<()> {
        let encoded = serde_json::to_string(&info)?;
        self.prefs.set(&keys::user::USER_INFO, &encoded)?;
        *self.user_info.write() = Some(info);
        Ok(())
    }

    pub fn clear_user_info(&self) -> Result<()> {
        self.prefs.remove(&keys::user::USER_INFO)?;
        *self.user_info.write() = None;
        Ok(())
    }

    /// Queues `job` to run after the next successful fetch. A job whose
    /// name is already queued is dropped.
    pub fn queue_on_sign_in(&self, name: &str, job: impl FnOnce() + Send + 'static) {
        let mut jobs = self.sign_in_jobs.lock();
        if jobs.iter().any(|(queued, _)| queued == name) {
            return;
        }
        jobs.push((name.to_string(), Box::new(job)));
    }

    pub fn queued_jobs(&self) -> usize {
        self.sign_in_jobs.lock().len()
    }

    /// Refreshes the user's profile from the backend.
    ///
    /// Does nothing while signed out or within a minute of the previous
    /// fetch unless `ignore_cooldown` is set. A failure caused by the
    /// network keeps the current profile; any other failure clears it.
    pub async fn fetch(&self, apollo: &ApolloWrapper, ignore_cooldown: bool) -> Result<()> {
        if self.is_signed_out() {
            return Ok(());
        }

        {
            let mut last_fetch = self.last_fetch.lock();
            let now = Instant::now();
            if let Some(previous) = *last_fetch {
                if !ignore_cooldown && now.duration_since(previous) <= FETCH_COOLDOWN {
                    tracing::info!("Skipping user info fetch because one was done recently");
                    return Ok(());
                }
            }
            *last_fetch = Some(now);
        }

        let summary = apollo.perform_query(&UserInfoQuery, false).await;
        let response = match summary {
            ResponseSummary::Response(response) => response,
            ResponseSummary::Failed(e) if e.is_network() || e == ApolloError::NotLoggedIn => {
                tracing::warn!(error = %e, "User info fetch failed, keeping saved profile");
                return Ok(());
            }
            ResponseSummary::Failed(e) => {
                tracing::error!(error = %e, "Could not fetch user info");
                return self.clear_user_info();
            }
        };

        let Some(user) = response.data.as_ref().and_then(|data| data.user.as_ref()) else {
            return Ok(());
        };
        if response.has_errors() {
            tracing::warn!("User info came back with errors, clearing saved profile");
            return self.clear_user_info();
        }
        self.set_user_info(UserInfo::from(user))?;

        let jobs = std::mem::take(&mut *self.sign_in_jobs.lock());
        for (name, job) in jobs {
            tracing::debug!(job = %name, "Running sign-in job");
            job();
        }
        Ok(())
    }

    /// Stores the login cookie carried by a sign-in redirect. Returns false
    /// if `uri` carries none.
    pub async fn complete_sign_in(&self, uri: &str) -> Result<bool> {
        let Some(token) = extract_login_token(uri) else {
            return Ok(false);
        };

        self.login_token.store_cookie(&token).await?;
        self.prefs
            .set(&keys::first_run::HAS_SIGNED_IN_BEFORE, &true)?;
        *self.last_fetch.lock() = None;

        tracing::info!("Signed in");
        Ok(true)
    }

    /// Clears the login cookie and the saved profile. The profile is kept
    /// if the browser refused to drop the cookie.
    pub async fn sign_out(&self) -> Result<bool> {
        if !self.login_token.purge_cached_cookie().await {
            return Ok(false);
        }
        self.clear_user_info()?;

        tracing::info!("Signed out");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use neeva_apollo::{ApolloError, CredentialPolicy, GraphQlRequest, GraphQlTransport};
    use neeva_prefs::InMemoryPreferences;
    use neeva_session::NeevaConstants;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CannedTransport {
        reply: std::result::Result<Value, ApolloError>,
        calls: AtomicUsize,
    }

    impl CannedTransport {
        fn new(reply: std::result::Result<Value, ApolloError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GraphQlTransport for CannedTransport {
        async fn execute(
            &self,
            _request: &GraphQlRequest,
            _cookies: &[(String, String)],
        ) -> neeva_apollo::Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    fn user_reply() -> Value {
        json!({
            "data": {
                "user": {
                    "id": "user-1",
                    "profile": {
                        "displayName": "Ada",
                        "email": "ada@example.com",
                        "pictureURL": "https://example.com/ada.png"
                    },
                    "authProvider": "neeva.co/auth/oauth2/authenticators/okta",
                    "subscriptionType": "Premium"
                }
            }
        })
    }

    fn setup(
        signed_in: bool,
        transport: Arc<CannedTransport>,
    ) -> (NeevaUser, ApolloWrapper, SharedPreferencesModel) {
        let prefs = SharedPreferencesModel::new(Arc::new(InMemoryPreferences::new()));
        let constants = NeevaConstants::default();
        let login = Arc::new(SessionToken::login(&constants, prefs.clone()));
        if signed_in {
            login.update_cached_cookie("login-cookie").unwrap();
        }
        let preview = Arc::new(SessionToken::preview(
            &constants,
            prefs.clone(),
            reqwest::Client::new(),
        ));
        let apollo = ApolloWrapper::new(
            CredentialPolicy::Authenticated {
                login: Arc::clone(&login),
                preview,
            },
            transport,
        );
        (NeevaUser::new(prefs.clone(), login), apollo, prefs)
    }

    #[test]
    fn test_unknown_names_fall_back() {
        let info: UserInfo = serde_json::from_str(
            r#"{"id":"1","ssoProviderString":"MYSPACE","subscriptionTypeString":"Gold"}"#,
        )
        .unwrap();
        assert_eq!(info.sso_provider(), SsoProvider::Unknown);
        assert_eq!(info.subscription_type(), SubscriptionType::Unknown);

        let info: UserInfo = serde_json::from_str("{}").unwrap();
        assert_eq!(info, UserInfo::default());
    }

    #[tokio::test]
    async fn test_signed_out_skips_fetch() {
        let transport = CannedTransport::new(Ok(user_reply()));
        let (user, apollo, _prefs) = setup(false, transport.clone());

        user.fetch(&apollo, true).await.unwrap();

        assert_eq!(transport.calls(), 0);
        assert!(user.user_info().is_none());
    }

    #[tokio::test]
    async fn test_fetch_saves_info_and_runs_jobs_once() {
        let transport = CannedTransport::new(Ok(user_reply()));
        let (user, apollo, prefs) = setup(true, transport.clone());
        let runs = Arc::new(AtomicUsize::new(0));
        for _ in 0..2 {
            let runs = Arc::clone(&runs);
            user.queue_on_sign_in("sync-spaces", move || {
                runs.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(user.queued_jobs(), 1);

        user.fetch(&apollo, false).await.unwrap();

        let info = user.user_info().unwrap();
        assert_eq!(info.display_name.as_deref(), Some("Ada"));
        assert_eq!(info.sso_provider(), SsoProvider::Okta);
        assert_eq!(info.subscription_type(), SubscriptionType::Premium);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(user.queued_jobs(), 0);

        // A fresh instance restores what was saved.
        let restored = NeevaUser::new(prefs, Arc::clone(user.login_token()));
        assert_eq!(restored.user_info(), Some(info));

        user.fetch(&apollo, true).await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cooldown() {
        let transport = CannedTransport::new(Ok(user_reply()));
        let (user, apollo, _prefs) = setup(true, transport.clone());

        user.fetch(&apollo, false).await.unwrap();
        user.fetch(&apollo, false).await.unwrap();
        assert_eq!(transport.calls(), 1);

        user.fetch(&apollo, true).await.unwrap();
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_network_failure_keeps_info() {
        let transport = CannedTransport::new(Err(ApolloError::Network("offline".to_string())));
        let (user, apollo, _prefs) = setup(true, transport);
        user.set_user_info(UserInfo::default()).unwrap();

        user.fetch(&apollo, true).await.unwrap();

        assert!(user.user_info().is_some());
    }

    #[tokio::test]
    async fn test_other_failures_clear_info() {
        let rejected = CannedTransport::new(Err(ApolloError::Http {
            status: 401,
            body: String::new(),
        }));
        let (user, apollo, prefs) = setup(true, rejected);
        user.set_user_info(UserInfo::default()).unwrap();

        user.fetch(&apollo, true).await.unwrap();

        assert!(user.user_info().is_none());
        assert!(!prefs.contains(&keys::user::USER_INFO));

        let mut reply = user_reply();
        reply["errors"] = json!([{ "message": "session expired" }]);
        let (user, apollo, _prefs) = setup(true, CannedTransport::new(Ok(reply)));
        user.set_user_info(UserInfo::default()).unwrap();

        user.fetch(&apollo, true).await.unwrap();

        assert!(user.user_info().is_none());
    }

    #[tokio::test]
    async fn test_errors_without_user_keep_info() {
        for reply in [
            json!({ "data": { "user": null }, "errors": [{ "message": "session expired" }] }),
            json!({ "data": null, "errors": [{ "message": "session expired" }] }),
        ] {
            let (user, apollo, prefs) = setup(true, CannedTransport::new(Ok(reply)));
            let saved = UserInfo {
                id: Some("user-1".to_string()),
                ..UserInfo::default()
            };
            user.set_user_info(saved.clone()).unwrap();

            user.fetch(&apollo, true).await.unwrap();

            assert_eq!(user.user_info(), Some(saved));
            assert!(prefs.contains(&keys::user::USER_INFO));
        }
    }

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let transport = CannedTransport::new(Ok(user_reply()));
        let (user, apollo, prefs) = setup(false, transport);

        assert!(!user
            .complete_sign_in("neeva://login?retry=1")
            .await
            .unwrap());
        assert!(user
            .complete_sign_in("neeva://login?sessionKey=abc123")
            .await
            .unwrap());
        assert!(!user.is_signed_out());
        assert!(prefs.get(&keys::first_run::HAS_SIGNED_IN_BEFORE));

        user.fetch(&apollo, false).await.unwrap();
        assert!(user.user_info().is_some());

        assert!(user.sign_out().await.unwrap());
        assert!(user.is_signed_out());
        assert!(user.user_info().is_none());
        assert!(prefs.get(&keys::user::TOKEN).is_empty());
    }
}
