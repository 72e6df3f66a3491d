use crate::caller::Caller;
use crate::error::ZabbixError;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;

/// Capabilities whose availability depends on the server version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Feature {
    HistoryPush,
    Mfa,
    ProxyGroup,
    BrowserItem,
    HeadersV7,
    ProxyId,
    MonitoredBy,
    SupportedRevision,
}

impl Feature {
    pub const ALL: [Feature; 8] = [
        Feature::HistoryPush,
        Feature::Mfa,
        Feature::ProxyGroup,
        Feature::BrowserItem,
        Feature::HeadersV7,
        Feature::ProxyId,
        Feature::MonitoredBy,
        Feature::SupportedRevision,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Feature::HistoryPush => "history.push",
            Feature::Mfa => "mfa",
            Feature::ProxyGroup => "proxygroup",
            Feature::BrowserItem => "browser_item",
            Feature::HeadersV7 => "headers_v7",
            Feature::ProxyId => "proxyid",
            Feature::MonitoredBy => "monitored_by",
            Feature::SupportedRevision => "supported_revision",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|feature| feature.as_str() == name)
    }

    fn requirement(self) -> Requirement {
        match self {
            Feature::SupportedRevision => Requirement::MajorIn(&[6, 7]),
            Feature::HistoryPush
            | Feature::Mfa
            | Feature::ProxyGroup
            | Feature::BrowserItem
            | Feature::HeadersV7
            | Feature::ProxyId
            | Feature::MonitoredBy => Requirement::MajorAtLeast(7),
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug)]
enum Requirement {
    MajorAtLeast(u32),
    MajorIn(&'static [u32]),
}

impl Requirement {
    fn holds(self, version: &ServerVersion) -> bool {
        match self {
            Requirement::MajorAtLeast(major) => version.major >= major,
            Requirement::MajorIn(majors) => majors.contains(&version.major),
        }
    }
}

/// Which of the two incompatible wire shapes the server speaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireGeneration {
    /// 6.x and older: object-shaped pairs, `proxy_hostid`.
    Legacy,
    /// 7.x and newer: `{name, value}` lists, `proxyid` + `monitored_by`.
    Current,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerVersion {
    pub raw: String,
    pub major: u32,
    pub minor: u32,
}

impl ServerVersion {
    /// Lenient parse: missing or non-numeric components become 0.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let mut parts = raw.split('.').map(|part| part.trim().parse::<u32>().unwrap_or(0));
        let major = parts.next().unwrap_or(0);
        let minor = parts.next().unwrap_or(0);
        Self { raw: raw.to_owned(), major, minor }
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Negotiated server version and the feature table derived from it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VersionManager {
    version: Option<ServerVersion>,
    features: BTreeMap<Feature, bool>,
}

impl VersionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(raw: &str) -> Self {
        let mut manager = Self::new();
        manager.force_version(raw);
        manager
    }

    /// Asks the server for its version and applies it.
    ///
    /// `apiinfo.version` is always sent without a token.
    pub fn detect(&mut self, caller: &Caller) -> Result<&ServerVersion, ZabbixError> {
        let raw: String = caller.call_typed("apiinfo.version", json!({}), None)?;
        log::debug!("detected zabbix api version {raw}");
        Ok(self.force_version(&raw))
    }

    /// Replaces the known version and recomputes every feature.
    pub fn force_version(&mut self, raw: &str) -> &ServerVersion {
        let version = ServerVersion::parse(raw);
        self.features = Feature::ALL
            .into_iter()
            .map(|feature| (feature, feature.requirement().holds(&version)))
            .collect();
        if !self.features.get(&Feature::SupportedRevision).copied().unwrap_or(false) {
            log::warn!(
                "zabbix api version {} is outside the supported 6.x/7.x range; using {:?} wire shapes",
                version.raw,
                generation_for(&self.features)
            );
        }
        self.version.insert(version)
    }

    pub fn version(&self) -> Option<&ServerVersion> {
        self.version.as_ref()
    }

    pub fn raw_version(&self) -> Option<&str> {
        self.version.as_ref().map(|version| version.raw.as_str())
    }

    pub fn is_known(&self) -> bool {
        self.version.is_some()
    }

    pub fn supports(&self, feature: Feature) -> bool {
        self.features.get(&feature).copied().unwrap_or(false)
    }

    /// Unknown names and an undetected version both report `false`.
    pub fn is_feature_supported(&self, name: &str) -> bool {
        Feature::from_name(name).is_some_and(|feature| self.supports(feature))
    }

    pub fn major_at_least(&self, major: u32) -> bool {
        self.version.as_ref().is_some_and(|version| version.major >= major)
    }

    /// Fails with [`ZabbixError::UnsupportedFeature`] unless `feature` is available.
    pub fn require(&self, feature: Feature) -> Result<(), ZabbixError> {
        if self.supports(feature) {
            Ok(())
        } else {
            Err(ZabbixError::unsupported(feature, self.raw_version()))
        }
    }

    pub fn generation(&self) -> Option<WireGeneration> {
        self.version.as_ref().map(|_| generation_for(&self.features))
    }

    pub fn supported_features(&self) -> Vec<Feature> {
        self.features.iter().filter(|(_, supported)| **supported).map(|(feature, _)| *feature).collect()
    }
}

fn generation_for(features: &BTreeMap<Feature, bool>) -> WireGeneration {
    if features.get(&Feature::HeadersV7).copied().unwrap_or(false) {
        WireGeneration::Current
    } else {
        WireGeneration::Legacy
    }
}
