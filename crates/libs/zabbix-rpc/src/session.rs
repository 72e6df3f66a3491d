use crate::adapter::AdapterSet;
use crate::caller::{Caller, RpcCall};
use crate::config::{ClientConfig, QueryDefaults};
use crate::error::ZabbixError;
use crate::transport::HttpSender;
use crate::version::{Feature, ServerVersion, VersionManager};
use serde::de::DeserializeOwned;
use serde_json::{json, Value as JsonValue};
use std::sync::RwLock;

/// Version state and the adapters derived from it; always replaced together.
#[derive(Clone, Debug, Default)]
pub(crate) struct Negotiated {
    pub(crate) versions: VersionManager,
    pub(crate) adapters: Option<AdapterSet>,
}

impl Negotiated {
    fn from_versions(versions: VersionManager) -> Self {
        let adapters = versions.generation().map(AdapterSet::for_generation);
        Self { versions, adapters }
    }
}

/// An authenticated conversation with one Zabbix frontend.
///
/// Login, logout and version changes must not race other calls; the locks keep
/// the state consistent but do not order operations.
pub struct Session {
    caller: Caller,
    token: RwLock<Option<String>>,
    negotiated: RwLock<Negotiated>,
    query: QueryDefaults,
}

impl Session {
    pub fn new(config: ClientConfig) -> Result<Self, ZabbixError> {
        config.validate()?;
        let caller = Caller::new(&config)?;
        Ok(Self::from_caller(caller, &config))
    }

    pub fn with_sender(config: ClientConfig, sender: impl HttpSender + 'static) -> Self {
        let caller = Caller::with_sender(&config, sender);
        Self::from_caller(caller, &config)
    }

    pub fn from_caller(caller: Caller, config: &ClientConfig) -> Self {
        let negotiated = match config.forced_version.as_deref() {
            Some(raw) => Negotiated::from_versions(VersionManager::with_version(raw)),
            None => Negotiated::default(),
        };
        Self {
            caller,
            token: RwLock::new(None),
            negotiated: RwLock::new(negotiated),
            query: config.query.clone(),
        }
    }

    pub fn caller(&self) -> &Caller {
        &self.caller
    }

    /// Logs in and, when no version is known yet, detects it.
    ///
    /// A failed detection is logged and leaves the version unknown; the login
    /// itself still succeeds and the next login tries again.
    pub fn login(&self, user: &str, secret: &str) -> Result<String, ZabbixError> {
        let token = self.login_without_detection(user, secret)?;
        if !self.version_known() {
            if let Err(err) = self.detect_version() {
                log::warn!("zabbix version detection after login failed: {err}");
            }
        }
        Ok(token)
    }

    pub fn login_without_detection(&self, user: &str, secret: &str) -> Result<String, ZabbixError> {
        let result = self.caller.call_redacted(
            "user.login",
            json!({"username": user, "password": secret}),
            None,
        )?;
        let JsonValue::String(token) = result else {
            return Err(ZabbixError::decode("user.login: expected a session token string"));
        };
        *self.token.write().expect("token lock poisoned") = Some(token.clone());
        log::debug!("logged in to {} as {user}", self.caller.endpoint());
        Ok(token)
    }

    /// Ends the remote session. The local token is dropped even when the call fails.
    pub fn logout(&self) -> Result<(), ZabbixError> {
        let Some(token) = self.token.write().expect("token lock poisoned").take() else {
            return Ok(());
        };
        match self.caller.call("user.logout", json!([]), Some(&token)) {
            Ok(_) => Ok(()),
            Err(err) => {
                log::warn!("user.logout failed; local token cleared anyway: {err}");
                Err(err)
            }
        }
    }

    pub fn current_token(&self) -> Option<String> {
        self.token.read().expect("token lock poisoned").clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().expect("token lock poisoned").is_some()
    }

    /// Queries `apiinfo.version` and re-selects the adapters.
    pub fn detect_version(&self) -> Result<ServerVersion, ZabbixError> {
        let mut versions = VersionManager::new();
        let version = versions.detect(&self.caller)?.clone();
        self.install(versions);
        Ok(version)
    }

    /// Pins the version without asking the server.
    pub fn force_version(&self, raw: &str) -> ServerVersion {
        let versions = VersionManager::with_version(raw);
        let version = versions.version().cloned().unwrap_or_else(|| ServerVersion::parse(raw));
        self.install(versions);
        version
    }

    fn install(&self, versions: VersionManager) {
        let negotiated = Negotiated::from_versions(versions);
        log::debug!(
            "zabbix api {} selected {:?} adapters",
            negotiated.versions.raw_version().unwrap_or("unknown"),
            negotiated.adapters.map(|set| set.generation())
        );
        *self.negotiated.write().expect("version lock poisoned") = negotiated;
    }

    pub(crate) fn negotiated(&self) -> Negotiated {
        self.negotiated.read().expect("version lock poisoned").clone()
    }

    fn version_known(&self) -> bool {
        self.negotiated.read().expect("version lock poisoned").versions.is_known()
    }

    /// Snapshot of the negotiated version state.
    pub fn versions(&self) -> VersionManager {
        self.negotiated.read().expect("version lock poisoned").versions.clone()
    }

    pub fn is_feature_supported(&self, name: &str) -> bool {
        self.negotiated.read().expect("version lock poisoned").versions.is_feature_supported(name)
    }

    pub fn supports(&self, feature: Feature) -> bool {
        self.negotiated.read().expect("version lock poisoned").versions.supports(feature)
    }

    pub fn supported_features(&self) -> Vec<Feature> {
        self.negotiated.read().expect("version lock poisoned").versions.supported_features()
    }

    pub fn server_version(&self) -> Option<String> {
        self.negotiated
            .read()
            .expect("version lock poisoned")
            .versions
            .raw_version()
            .map(str::to_owned)
    }

    pub fn adapters(&self) -> Option<AdapterSet> {
        self.negotiated.read().expect("version lock poisoned").adapters
    }

    pub fn query_defaults(&self) -> &QueryDefaults {
        &self.query
    }

    /// Calls `method` with the current token.
    pub fn call(&self, method: &str, params: JsonValue) -> Result<JsonValue, ZabbixError> {
        let token = self.current_token();
        self.caller.call(method, params, token.as_deref())
    }

    pub fn call_typed<T: DeserializeOwned>(
        &self,
        method: &str,
        params: JsonValue,
    ) -> Result<T, ZabbixError> {
        let token = self.current_token();
        self.caller.call_typed(method, params, token.as_deref())
    }

    pub fn call_unauthenticated(&self, method: &str, params: JsonValue) -> Result<JsonValue, ZabbixError> {
        self.caller.call(method, params, None)
    }
}

impl RpcCall for Session {
    fn call(&self, method: &str, params: JsonValue) -> Result<JsonValue, ZabbixError> {
        Session::call(self, method, params)
    }

    fn server_version(&self) -> Option<String> {
        Session::server_version(self)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("caller", &self.caller)
            .field("authenticated", &self.is_authenticated())
            .field("version", &self.server_version())
            .finish()
    }
}
