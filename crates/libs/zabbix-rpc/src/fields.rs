//! Value types for fields that have two wire representations.

use crate::error::ZabbixError;
use crate::version::{Feature, WireGeneration};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// Name/value pairs that keep insertion order and unique names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyValueMap(Vec<(String, String)>);

impl KeyValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name`; an existing name keeps its position and takes the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|(existing, _)| existing == name).map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn to_list(&self) -> Vec<NameValue> {
        self.iter().map(|(name, value)| NameValue::new(name, value)).collect()
    }

    /// Repeated names collapse onto the first position with the last value.
    pub fn from_list(list: &[NameValue]) -> Self {
        let mut map = Self::new();
        for pair in list {
            if map.get(&pair.name).is_some() {
                log::debug!("duplicate pair name {:?}; keeping the last value", pair.name);
            }
            map.insert(pair.name.clone(), pair.value.clone());
        }
        map
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeyValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

impl Serialize for KeyValueMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for KeyValueMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = KeyValueMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of name/value pairs")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = KeyValueMap::new();
                while let Some((name, value)) = access.next_entry::<String, JsonValue>()? {
                    map.insert(name, scalar_text(value));
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NameValue {
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub value: String,
}

impl NameValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// A pair-valued field such as item `headers` or `query_fields`.
///
/// Outbound, only the representation required by the peer is sent. Inbound,
/// both are filled so callers can read either.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PairField {
    pub map: Option<KeyValueMap>,
    pub list: Option<Vec<NameValue>>,
}

impl PairField {
    pub fn from_map(map: KeyValueMap) -> Self {
        Self { map: Some(map), list: None }
    }

    pub fn from_list(list: Vec<NameValue>) -> Self {
        Self { map: None, list: Some(list) }
    }

    pub fn is_unset(&self) -> bool {
        self.map.is_none() && self.list.is_none()
    }

    /// Fills the representation `generation` needs and clears the other.
    /// A representation that is already populated wins over conversion.
    pub fn prepare_for(&mut self, generation: WireGeneration) {
        match generation {
            WireGeneration::Legacy => {
                let list = self.list.take();
                if self.map.is_none() {
                    self.map = list.map(|list| {
                        let map = KeyValueMap::from_list(&list);
                        if map.len() < list.len() {
                            log::warn!(
                                "dropping {} pair(s) with repeated names: object-shaped fields keep one value per name",
                                list.len() - map.len()
                            );
                        }
                        map
                    });
                }
            }
            WireGeneration::Current => {
                let map = self.map.take();
                if self.list.is_none() {
                    self.list = map.map(|map| map.to_list());
                }
            }
        }
    }

    /// Sniffs the received shape and fills the sibling representation.
    pub fn decode(field: &str, value: JsonValue) -> Result<Self, ZabbixError> {
        match value {
            JsonValue::Null => Ok(Self::default()),
            JsonValue::Array(items) if items.is_empty() => {
                Ok(Self { map: Some(KeyValueMap::new()), list: Some(Vec::new()) })
            }
            JsonValue::Array(items) => {
                let list: Vec<NameValue> = serde_json::from_value(JsonValue::Array(items))
                    .map_err(|err| ZabbixError::decode(format!("{field}: {err}")))?;
                Ok(Self { map: Some(KeyValueMap::from_list(&list)), list: Some(list) })
            }
            JsonValue::Object(_) => {
                let map: KeyValueMap = serde_json::from_value(value)
                    .map_err(|err| ZabbixError::decode(format!("{field}: {err}")))?;
                Ok(Self { list: Some(map.to_list()), map: Some(map) })
            }
            other => Err(ZabbixError::decode(format!(
                "{field}: expected an object or an array, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn take_from(object: &mut Map<String, JsonValue>, field: &str) -> Result<Self, ZabbixError> {
        object.remove(field).map_or_else(|| Ok(Self::default()), |value| Self::decode(field, value))
    }

    /// Writes the populated representation under `field`, list before map.
    pub fn write_into(&self, object: &mut Map<String, JsonValue>, field: &str) -> Result<(), ZabbixError> {
        let value = match (&self.list, &self.map) {
            (Some(list), _) => serde_json::to_value(list)?,
            (None, Some(map)) => serde_json::to_value(map)?,
            (None, None) => return Ok(()),
        };
        object.insert(field.to_owned(), value);
        Ok(())
    }
}

/// Who polls a host in the current wire shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitoredBy {
    Server,
    Proxy,
    ProxyGroup,
}

impl MonitoredBy {
    pub fn code(self) -> u8 {
        match self {
            MonitoredBy::Server => 0,
            MonitoredBy::Proxy => 1,
            MonitoredBy::ProxyGroup => 2,
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(MonitoredBy::Server),
            1 => Some(MonitoredBy::Proxy),
            2 => Some(MonitoredBy::ProxyGroup),
            _ => None,
        }
    }

    fn from_json(value: &JsonValue) -> Result<Self, String> {
        let code = match value {
            JsonValue::Number(number) => number.as_u64(),
            JsonValue::String(text) => text.trim().parse::<u64>().ok(),
            _ => None,
        };
        code.and_then(Self::from_code).ok_or_else(|| format!("invalid monitored_by value {value}"))
    }
}

impl Serialize for MonitoredBy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.code().to_string())
    }
}

impl<'de> Deserialize<'de> for MonitoredBy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = JsonValue::deserialize(deserializer)?;
        Self::from_json(&value).map_err(de::Error::custom)
    }
}

/// Host proxy assignment in both wire shapes.
///
/// Legacy servers use `proxy_hostid`; current servers use `proxyid` with the
/// mandatory companion `monitored_by`, plus `proxy_groupid` for proxy groups.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProxyRef {
    pub proxy_hostid: Option<String>,
    pub proxyid: Option<String>,
    pub monitored_by: Option<MonitoredBy>,
    pub proxy_groupid: Option<String>,
}

const PROXY_HOSTID: &str = "proxy_hostid";
const PROXYID: &str = "proxyid";
const MONITORED_BY: &str = "monitored_by";
const PROXY_GROUPID: &str = "proxy_groupid";

impl ProxyRef {
    pub fn via_proxy(proxyid: impl Into<String>) -> Self {
        Self { proxyid: Some(proxyid.into()), monitored_by: Some(MonitoredBy::Proxy), ..Self::default() }
    }

    pub fn via_proxy_group(proxy_groupid: impl Into<String>) -> Self {
        Self {
            proxy_groupid: Some(proxy_groupid.into()),
            monitored_by: Some(MonitoredBy::ProxyGroup),
            ..Self::default()
        }
    }

    pub fn is_unset(&self) -> bool {
        self.proxy_hostid.is_none()
            && self.proxyid.is_none()
            && self.monitored_by.is_none()
            && self.proxy_groupid.is_none()
    }

    /// Outbound normalization. `version` only feeds the error message.
    pub fn prepare_for(
        &mut self,
        generation: WireGeneration,
        version: Option<&str>,
    ) -> Result<(), ZabbixError> {
        match generation {
            WireGeneration::Current => {
                let legacy = self.proxy_hostid.take();
                if self.proxyid.is_none() {
                    self.proxyid = legacy;
                }
                if self.monitored_by.is_none() {
                    self.monitored_by = self.proxyid.as_deref().map(monitor_for_proxy);
                }
            }
            WireGeneration::Legacy => {
                if self.monitored_by == Some(MonitoredBy::ProxyGroup) {
                    return Err(ZabbixError::unsupported(Feature::ProxyGroup, version));
                }
                let current = self.proxyid.take();
                if self.proxy_hostid.is_none() {
                    self.proxy_hostid = current;
                }
                self.monitored_by = None;
                self.proxy_groupid = None;
            }
        }
        Ok(())
    }

    /// Removes every proxy member from `object` and fills both shapes.
    pub fn take_from(object: &mut Map<String, JsonValue>) -> Result<Self, ZabbixError> {
        let proxy_hostid = object.remove(PROXY_HOSTID).and_then(|value| lenient::text(&value));
        let proxyid = object.remove(PROXYID).and_then(|value| lenient::text(&value));
        let proxy_groupid = object.remove(PROXY_GROUPID).and_then(|value| lenient::text(&value));
        let monitored_by = match object.remove(MONITORED_BY) {
            None | Some(JsonValue::Null) => None,
            Some(value) => Some(MonitoredBy::from_json(&value).map_err(ZabbixError::Decode)?),
        };

        let mut proxy = Self { proxy_hostid, proxyid, monitored_by, proxy_groupid };
        if proxy.proxyid.is_none() {
            proxy.proxyid = proxy.proxy_hostid.clone();
        }
        if proxy.proxy_hostid.is_none() {
            proxy.proxy_hostid = proxy.proxyid.clone();
        }
        if proxy.monitored_by.is_none() {
            proxy.monitored_by = proxy.proxyid.as_deref().map(monitor_for_proxy);
        }
        Ok(proxy)
    }

    pub fn write_into(&self, object: &mut Map<String, JsonValue>) -> Result<(), ZabbixError> {
        let members = [
            (PROXY_HOSTID, self.proxy_hostid.as_ref().map(|id| JsonValue::String(id.clone()))),
            (PROXYID, self.proxyid.as_ref().map(|id| JsonValue::String(id.clone()))),
            (MONITORED_BY, self.monitored_by.map(serde_json::to_value).transpose()?),
            (PROXY_GROUPID, self.proxy_groupid.as_ref().map(|id| JsonValue::String(id.clone()))),
        ];
        for (key, value) in members {
            if let Some(value) = value {
                object.insert(key.to_owned(), value);
            }
        }
        Ok(())
    }
}

fn monitor_for_proxy(proxyid: &str) -> MonitoredBy {
    if is_assigned_id(proxyid) {
        MonitoredBy::Proxy
    } else {
        MonitoredBy::Server
    }
}

/// Zabbix uses `"0"` and the empty string for "no object".
pub fn is_assigned_id(id: &str) -> bool {
    let id = id.trim();
    !id.is_empty() && id != "0"
}

fn scalar_text(value: JsonValue) -> String {
    match value {
        JsonValue::String(text) => text,
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// The API returns most scalars as strings but accepts numbers; these accept both.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value as JsonValue;

    pub fn text(value: &JsonValue) -> Option<String> {
        match value {
            JsonValue::String(text) => Some(text.clone()),
            JsonValue::Number(number) => Some(number.to_string()),
            JsonValue::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let value = JsonValue::deserialize(deserializer)?;
        Ok(text(&value).unwrap_or_default())
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let value = Option::<JsonValue>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(text))
    }
}
