use crate::fields::lenient;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One value for `history.push`. Address the item by `itemid` or by `host` + `key`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct HistoryValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub itemid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub value: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clock: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ns: Option<i64>,
}

impl HistoryValue {
    pub fn for_item(itemid: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self { itemid: Some(itemid.into()), value: value.into(), ..Self::default() }
    }

    pub fn for_key(host: impl Into<String>, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self { host: Some(host.into()), key: Some(key.into()), value: value.into(), ..Self::default() }
    }

    /// Pins the sample to a timestamp instead of the server's receive time.
    pub fn at(mut self, clock: i64, ns: i64) -> Self {
        self.clock = Some(clock);
        self.ns = Some(ns);
        self
    }
}

/// Per-value outcome of `history.push`, in request order.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryPushOutcome {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub itemid: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl HistoryPushOutcome {
    pub fn is_accepted(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryPushReport {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub data: Vec<HistoryPushOutcome>,
}

impl HistoryPushReport {
    pub fn rejected(&self) -> impl Iterator<Item = &HistoryPushOutcome> {
        self.data.iter().filter(|outcome| !outcome.is_accepted())
    }
}
