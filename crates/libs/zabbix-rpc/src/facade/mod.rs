//! Typed per-family entry points over a [`Session`].
//!
//! Every feature gate is checked against the negotiated version before any
//! request is sent.

use crate::error::ZabbixError;
use crate::resources::{
    self, HistoryPushReport, HistoryValue, Host, HostGroup, Item, ItemPrototype, Mfa, ProxyGroup,
    Resource, User,
};
use crate::session::Session;
use crate::version::Feature;
use serde_json::{json, Map, Value as JsonValue};
use std::marker::PhantomData;

/// CRUD operations for one resource family.
pub struct Family<'s, R> {
    session: &'s Session,
    resource: PhantomData<fn() -> R>,
}

impl<'s, R: Resource> Family<'s, R> {
    pub fn new(session: &'s Session) -> Self {
        Self { session, resource: PhantomData }
    }

    /// Runs `<api>.get`; `output` defaults to the configured selection.
    pub fn get(&self, params: JsonValue) -> Result<Vec<R>, ZabbixError> {
        let codec = self.admit(&[])?;
        let params = self.with_default_output(params)?;
        resources::get(self.session, &codec, params)
    }

    /// Fetches the single resource with `id`.
    pub fn get_by_id(&self, id: &str) -> Result<R, ZabbixError> {
        let mut params = Map::new();
        params.insert(R::IDS_PARAM.to_owned(), json!([id]));
        let rows = self.get(JsonValue::Object(params))?;
        resources::exactly_one(rows)
    }

    pub fn create(&self, payloads: &mut [R]) -> Result<Vec<String>, ZabbixError> {
        let codec = self.admit(payloads)?;
        resources::create(self.session, &codec, payloads)
    }

    pub fn update(&self, payloads: &mut [R]) -> Result<Vec<String>, ZabbixError> {
        let codec = self.admit(payloads)?;
        resources::update(self.session, &codec, payloads)
    }

    pub fn delete(&self, payloads: &mut [R]) -> Result<Vec<String>, ZabbixError> {
        self.admit(payloads)?;
        resources::delete(self.session, payloads)
    }

    pub fn delete_by_ids(&self, ids: &[String]) -> Result<Vec<String>, ZabbixError> {
        self.admit(&[])?;
        resources::delete_by_ids::<R>(self.session, ids)
    }

    /// Applies the family and per-payload gates, then picks the codec.
    fn admit(&self, payloads: &[R]) -> Result<R::Codec, ZabbixError> {
        let negotiated = self.session.negotiated();
        if let Some(feature) = R::FEATURE {
            negotiated.versions.require(feature)?;
        }
        for feature in payloads.iter().filter_map(R::required_feature) {
            negotiated.versions.require(feature)?;
        }
        R::codec(negotiated.adapters.as_ref())
    }

    fn with_default_output(&self, params: JsonValue) -> Result<JsonValue, ZabbixError> {
        let mut params = match params {
            JsonValue::Null => Map::new(),
            JsonValue::Object(params) => params,
            other => {
                return Err(ZabbixError::InvalidArgument(format!(
                    "{}.get params must be an object, got {other}",
                    R::API
                )))
            }
        };
        if !params.contains_key("output") {
            params.insert("output".to_owned(), self.session.query_defaults().output_for(R::API));
        }
        Ok(JsonValue::Object(params))
    }
}

impl Session {
    pub fn family<R: Resource>(&self) -> Family<'_, R> {
        Family::new(self)
    }

    pub fn items(&self) -> Family<'_, Item> {
        self.family()
    }

    pub fn item_prototypes(&self) -> Family<'_, ItemPrototype> {
        self.family()
    }

    pub fn hosts(&self) -> Family<'_, Host> {
        self.family()
    }

    pub fn host_groups(&self) -> Family<'_, HostGroup> {
        self.family()
    }

    pub fn users(&self) -> Family<'_, User> {
        self.family()
    }

    pub fn mfa(&self) -> Family<'_, Mfa> {
        self.family()
    }

    pub fn proxy_groups(&self) -> Family<'_, ProxyGroup> {
        self.family()
    }

    /// Pushes values into item history (`history.push`, 7.x).
    pub fn history_push(&self, values: &[HistoryValue]) -> Result<HistoryPushReport, ZabbixError> {
        self.negotiated().versions.require(Feature::HistoryPush)?;
        if values.is_empty() {
            return Ok(HistoryPushReport::default());
        }
        let report: HistoryPushReport = self.call_typed("history.push", serde_json::to_value(values)?)?;
        let rejected = report.rejected().count();
        if rejected > 0 {
            log::warn!("history.push rejected {rejected} of {} values", values.len());
        }
        Ok(report)
    }

    /// Clears the TOTP secret of each user (`user.resettotp`, 7.x). The result lists the reset ids.
    pub fn reset_user_totp(&self, userids: &[String]) -> Result<Vec<String>, ZabbixError> {
        self.negotiated().versions.require(Feature::Mfa)?;
        let result = self.call("user.resettotp", JsonValue::from(userids.to_vec()))?;
        resources::result_ids(&result, "userids").transpose().map(Option::unwrap_or_default)
    }
}

#[cfg(test)]
mod tests;
