//! Application root
//!
//! Owns the regular profile's components and creates incognito profiles on
//! demand.

use std::sync::Arc;

use neeva_apollo::{ApolloWrapper, CredentialPolicy, GraphQlTransport, HttpTransport};
use neeva_favicons::{DomainProvider, IncognitoFaviconCache, RegularFaviconCache, SuffixDomainProvider};
use neeva_history::HistoryManager;
use neeva_prefs::{keys, DatabasePreferences, SharedPreferencesModel};
use neeva_session::{CookieManager, NeevaConstants, SessionToken};
use neeva_storage::Database;
use neeva_tabs::TabDataManager;

use crate::config::Config;
use crate::user::NeevaUser;
use crate::Result;

/// Components of the regular profile.
pub struct Neeva {
    config: Config,
    constants: NeevaConstants,
    db: Database,
    prefs: SharedPreferencesModel,
    /// Client used for session endpoints
    http: reqwest::Client,
    transport: Arc<dyn GraphQlTransport>,
    domains: Arc<dyn DomainProvider>,
    login_token: Arc<SessionToken>,
    preview_token: Arc<SessionToken>,
    apollo: ApolloWrapper,
    user: Arc<NeevaUser>,
    favicons: RegularFaviconCache,
    tabs: TabDataManager,
    history: HistoryManager,
}

impl Neeva {
    /// Opens the regular profile described by `config`.
    pub async fn new(config: Config) -> Result<Self> {
        let constants = NeevaConstants::new(&config.app_host, &config.app_version)?;
        let transport = HttpTransport::new(&constants, config.request_timeout())?;
        Self::with_transport(config, Arc::new(transport)).await
    }

    /// Opens the profile, sending GraphQL operations through `transport`.
    pub async fn with_transport(
        config: Config,
        transport: Arc<dyn GraphQlTransport>,
    ) -> Result<Self> {
        let constants = NeevaConstants::new(&config.app_host, &config.app_version)?;

        // Anything left here belongs to an incognito session that never
        // closed cleanly.
        IncognitoFaviconCache::remove_directory(&config.incognito_favicon_dir).await?;

        let db = Database::open(&config.database_path)?;
        let prefs = SharedPreferencesModel::new(Arc::new(DatabasePreferences::new(db.clone())));
        prefs.set(&keys::app::IS_CURRENTLY_INCOGNITO, &false)?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        let login_token = Arc::new(SessionToken::login(&constants, prefs.clone()));
        let preview_token = Arc::new(SessionToken::preview(&constants, prefs.clone(), http.clone()));
        let apollo = ApolloWrapper::new(
            CredentialPolicy::Authenticated {
                login: Arc::clone(&login_token),
                preview: Arc::clone(&preview_token),
            },
            Arc::clone(&transport),
        );
        let user = Arc::new(NeevaUser::new(prefs.clone(), Arc::clone(&login_token)));

        let domains: Arc<dyn DomainProvider> = Arc::new(SuffixDomainProvider);
        let favicons =
            RegularFaviconCache::new(db.clone(), config.favicon_dir.clone(), Arc::clone(&domains));
        let tabs = TabDataManager::new(db.clone())?;
        let history = HistoryManager::new(db.clone());

        tracing::info!(
            host = %constants.app_host,
            signed_in = !login_token.is_empty(),
            "Neeva initialized"
        );

        Ok(Self {
            config,
            constants,
            db,
            prefs,
            http,
            transport,
            domains,
            login_token,
            preview_token,
            apollo,
            user,
            favicons,
            tabs,
            history,
        })
    }

    /// Connects the session tokens to the regular profile's browser.
    pub async fn attach_browser(&self, cookies: Arc<dyn CookieManager>) -> Result<()> {
        self.login_token
            .initialize_cookie_manager(Arc::clone(&cookies), false)
            .await?;
        self.preview_token
            .initialize_cookie_manager(cookies, self.login_token.is_empty())
            .await?;
        Ok(())
    }

    /// Re-reads both session cookies after the browser reported a change.
    pub async fn on_cookies_changed(&self) -> Result<()> {
        self.login_token.on_cookie_changed().await?;
        self.preview_token.on_cookie_changed().await?;
        Ok(())
    }

    /// Opens an incognito profile on top of `cookies`, the incognito
    /// browser's cookie store.
    pub async fn open_incognito(&self, cookies: Arc<dyn CookieManager>) -> Result<IncognitoProfile> {
        let token = Arc::new(SessionToken::incognito(&self.constants, self.http.clone()));
        token.initialize_cookie_manager(cookies, false).await?;

        let apollo = ApolloWrapper::new(
            CredentialPolicy::Incognito {
                token: Arc::clone(&token),
            },
            Arc::clone(&self.transport),
        );
        let favicons = IncognitoFaviconCache::new(
            self.config.incognito_favicon_dir.clone(),
            Arc::clone(&self.domains),
        );

        self.prefs.set(&keys::app::IS_CURRENTLY_INCOGNITO, &true)?;
        tracing::info!("Opened incognito profile");

        Ok(IncognitoProfile {
            token,
            apollo,
            favicons,
        })
    }

    /// Tears down an incognito profile, deleting everything it stored.
    pub async fn close_incognito(&self, profile: IncognitoProfile) -> Result<()> {
        profile.close().await?;
        self.prefs.set(&keys::app::IS_CURRENTLY_INCOGNITO, &false)?;
        Ok(())
    }

    /// Archives tabs that have been inactive longer than the user allows.
    pub fn archive_inactive_tabs(&self, now_ms: i64) -> Result<Vec<String>> {
        Ok(self.tabs.archive_inactive_tabs_with(&self.prefs, now_ms)?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn constants(&self) -> &NeevaConstants {
        &self.constants
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn prefs(&self) -> &SharedPreferencesModel {
        &self.prefs
    }

    pub fn login_token(&self) -> &Arc<SessionToken> {
        &self.login_token
    }

    pub fn preview_token(&self) -> &Arc<SessionToken> {
        &self.preview_token
    }

    pub fn apollo(&self) -> &ApolloWrapper {
        &self.apollo
    }

    pub fn user(&self) -> &Arc<NeevaUser> {
        &self.user
    }

    pub fn favicons(&self) -> &RegularFaviconCache {
        &self.favicons
    }

    pub fn tabs(&self) -> &TabDataManager {
        &self.tabs
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }
}

/// Components of one incognito session. Nothing here outlives [`close`].
///
/// [`close`]: IncognitoProfile::close
pub struct IncognitoProfile {
    token: Arc<SessionToken>,
    apollo: ApolloWrapper,
    favicons: IncognitoFaviconCache,
}

impl IncognitoProfile {
    pub fn token(&self) -> &Arc<SessionToken> {
        &self.token
    }

    pub fn apollo(&self) -> &ApolloWrapper {
        &self.apollo
    }

    pub fn favicons(&self) -> &IncognitoFaviconCache {
        &self.favicons
    }

    pub async fn close(self) -> Result<()> {
        self.token.detach_cookie_manager();
        self.favicons.destroy().await?;

        tracing::info!("Closed incognito profile");
        Ok(())
    }
}
