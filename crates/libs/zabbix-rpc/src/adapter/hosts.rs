use crate::caller::RpcCall;
use crate::error::ZabbixError;
use crate::fields::ProxyRef;
use crate::resources::{self, Host, WireCodec};
use crate::version::WireGeneration;
use serde_json::Value as JsonValue;

const PROXY_MEMBERS: [&str; 4] = ["proxy_hostid", "proxyid", "monitored_by", "proxy_groupid"];

/// Host wire strategy: `proxy_hostid` on legacy servers, `proxyid` + `monitored_by` on current ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostAdapter {
    Legacy,
    Current,
}

impl HostAdapter {
    pub fn for_generation(generation: WireGeneration) -> Self {
        match generation {
            WireGeneration::Legacy => HostAdapter::Legacy,
            WireGeneration::Current => HostAdapter::Current,
        }
    }

    pub fn generation(self) -> WireGeneration {
        match self {
            HostAdapter::Legacy => WireGeneration::Legacy,
            HostAdapter::Current => WireGeneration::Current,
        }
    }

    /// Fails for proxy-group assignments on legacy servers.
    pub fn prepare(self, host: &mut Host, version: Option<&str>) -> Result<(), ZabbixError> {
        host.proxy.prepare_for(self.generation(), version)
    }

    pub fn encode(self, host: &Host) -> Result<JsonValue, ZabbixError> {
        let mut value = serde_json::to_value(host)?;
        let object = value
            .as_object_mut()
            .ok_or_else(|| ZabbixError::decode("host did not encode to an object"))?;
        for member in PROXY_MEMBERS {
            object.remove(member);
        }
        if !host.proxy.is_unset() {
            let mut proxy = host.proxy.clone();
            proxy.prepare_for(self.generation(), None)?;
            proxy.write_into(object)?;
        }
        Ok(value)
    }

    pub fn decode(self, value: JsonValue) -> Result<Host, ZabbixError> {
        let mut object = match value {
            JsonValue::Object(object) => object,
            other => return Err(ZabbixError::decode(format!("host: expected an object, got {other}"))),
        };
        let proxy = ProxyRef::take_from(&mut object)?;
        let mut host: Host = serde_json::from_value(JsonValue::Object(object))?;
        host.proxy = proxy;
        Ok(host)
    }

    pub fn create(self, rpc: &dyn RpcCall, hosts: &mut [Host]) -> Result<Vec<String>, ZabbixError> {
        resources::create(rpc, &self, hosts)
    }

    pub fn get(self, rpc: &dyn RpcCall, params: JsonValue) -> Result<Vec<Host>, ZabbixError> {
        resources::get::<Host, _>(rpc, &self, params)
    }

    pub fn update(self, rpc: &dyn RpcCall, hosts: &mut [Host]) -> Result<Vec<String>, ZabbixError> {
        resources::update(rpc, &self, hosts)
    }

    pub fn delete(self, rpc: &dyn RpcCall, hosts: &mut [Host]) -> Result<Vec<String>, ZabbixError> {
        resources::delete(rpc, hosts)
    }

    pub fn delete_by_ids(self, rpc: &dyn RpcCall, ids: &[String]) -> Result<Vec<String>, ZabbixError> {
        resources::delete_by_ids::<Host>(rpc, ids)
    }
}

impl WireCodec<Host> for HostAdapter {
    fn prepare(&self, payload: &mut Host, version: Option<&str>) -> Result<(), ZabbixError> {
        HostAdapter::prepare(*self, payload, version)
    }

    fn encode(&self, payload: &Host) -> Result<JsonValue, ZabbixError> {
        HostAdapter::encode(*self, payload)
    }

    fn decode(&self, value: JsonValue) -> Result<Host, ZabbixError> {
        HostAdapter::decode(*self, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::MonitoredBy;
    use crate::version::Feature;
    use serde_json::json;

    fn proxied_host() -> Host {
        Host {
            host: Some("db-01".into()),
            proxy: ProxyRef { proxyid: Some("10105".into()), ..ProxyRef::default() },
            ..Host::default()
        }
    }

    #[test]
    fn current_generation_defaults_monitored_by_to_proxy() {
        let mut host = proxied_host();
        HostAdapter::Current.prepare(&mut host, Some("7.0.0")).expect("prepare");
        assert_eq!(host.proxy.monitored_by, Some(MonitoredBy::Proxy));

        let wire = HostAdapter::Current.encode(&host).expect("encode");
        assert_eq!(wire["proxyid"], "10105");
        assert_eq!(wire["monitored_by"], "1");
        assert!(wire.get("proxy_hostid").is_none());
    }

    #[test]
    fn legacy_generation_sends_proxy_hostid_only() {
        let mut host = proxied_host();
        host.proxy.monitored_by = Some(MonitoredBy::Proxy);
        HostAdapter::Legacy.prepare(&mut host, Some("6.0.0")).expect("prepare");

        let wire = HostAdapter::Legacy.encode(&host).expect("encode");
        assert_eq!(wire["proxy_hostid"], "10105");
        assert!(wire.get("proxyid").is_none());
        assert!(wire.get("monitored_by").is_none());
    }

    #[test]
    fn proxy_group_on_legacy_server_is_unsupported() {
        let mut host = Host { proxy: ProxyRef::via_proxy_group("2"), ..Host::default() };
        let err = HostAdapter::Legacy.prepare(&mut host, Some("6.4.0")).expect_err("legacy");
        assert!(matches!(
            err,
            ZabbixError::UnsupportedFeature { feature: Feature::ProxyGroup, ref version } if version == "6.4.0"
        ));
    }

    #[test]
    fn proxy_reference_round_trips() {
        for adapter in [HostAdapter::Legacy, HostAdapter::Current] {
            let mut host = proxied_host();
            adapter.prepare(&mut host, None).expect("prepare");
            let decoded = adapter.decode(adapter.encode(&host).expect("encode")).expect("decode");
            assert_eq!(decoded.proxy.proxyid.as_deref(), Some("10105"));
            assert_eq!(decoded.proxy.proxy_hostid.as_deref(), Some("10105"));
            assert_eq!(decoded.proxy.monitored_by, Some(MonitoredBy::Proxy));
            assert_eq!(decoded.host.as_deref(), Some("db-01"));
        }
    }

    #[test]
    fn host_without_proxy_sends_no_proxy_members() {
        let host = Host { host: Some("web-01".into()), ..Host::default() };
        let wire = HostAdapter::Current.encode(&host).expect("encode");
        assert_eq!(wire, json!({"host": "web-01"}));
    }
}
