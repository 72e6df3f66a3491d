use super::{PlainCodec, Resource};
use crate::adapter::{AdapterSet, HostAdapter};
use crate::error::ZabbixError;
use crate::fields::{lenient, MonitoredBy, ProxyRef};
use crate::version::Feature;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// A monitored host. The proxy assignment is written by the host adapter.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Host {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub hostid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub status: Option<String>,
    #[serde(skip)]
    pub proxy: ProxyRef,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Resource for Host {
    type Codec = HostAdapter;

    const API: &'static str = "host";
    const ID_FIELD: &'static str = "hostid";
    const IDS_PARAM: &'static str = "hostids";
    const CREATED_IDS: &'static str = "hostids";
    const DELETED_IDS: &'static str = "hostids";

    fn id(&self) -> Option<&str> {
        self.hostid.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.hostid = id;
    }

    fn required_feature(&self) -> Option<Feature> {
        (self.proxy.monitored_by == Some(MonitoredBy::ProxyGroup)).then_some(Feature::ProxyGroup)
    }

    fn codec(adapters: Option<&AdapterSet>) -> Result<Self::Codec, ZabbixError> {
        adapters.map(|set| set.hosts).ok_or(ZabbixError::VersionNotDetected)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct HostGroup {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub groupid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Resource for HostGroup {
    type Codec = PlainCodec;

    const API: &'static str = "hostgroup";
    const ID_FIELD: &'static str = "groupid";
    const IDS_PARAM: &'static str = "groupids";
    const CREATED_IDS: &'static str = "groupids";
    const DELETED_IDS: &'static str = "groupids";

    fn id(&self) -> Option<&str> {
        self.groupid.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.groupid = id;
    }

    fn codec(_adapters: Option<&AdapterSet>) -> Result<Self::Codec, ZabbixError> {
        Ok(PlainCodec)
    }
}

/// A 7.x proxy group, the target of `monitored_by = 2`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ProxyGroup {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub proxy_groupid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failover_delay: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub min_online: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Resource for ProxyGroup {
    type Codec = PlainCodec;

    const API: &'static str = "proxygroup";
    const ID_FIELD: &'static str = "proxy_groupid";
    const IDS_PARAM: &'static str = "proxy_groupids";
    const CREATED_IDS: &'static str = "proxy_groupids";
    const DELETED_IDS: &'static str = "proxy_groupids";
    const FEATURE: Option<Feature> = Some(Feature::ProxyGroup);

    fn id(&self) -> Option<&str> {
        self.proxy_groupid.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.proxy_groupid = id;
    }

    fn codec(_adapters: Option<&AdapterSet>) -> Result<Self::Codec, ZabbixError> {
        Ok(PlainCodec)
    }
}
