//! Resource payloads and the generic CRUD plumbing shared by every family.

mod crud;
mod history;
mod host;
mod item;
mod user;

pub use history::{HistoryPushOutcome, HistoryPushReport, HistoryValue};
pub use host::{Host, HostGroup, ProxyGroup};
pub use item::{Item, ItemPrototype, BROWSER_ITEM_TYPE};
pub use user::{Mfa, User};

pub(crate) use crud::{create, delete, delete_by_ids, exactly_one, get, result_ids, update};

use crate::adapter::AdapterSet;
use crate::error::ZabbixError;
use crate::version::Feature;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Converts one payload type to and from its wire form.
pub trait WireCodec<R> {
    /// Outbound normalization, applied in place before encoding.
    fn prepare(&self, payload: &mut R, version: Option<&str>) -> Result<(), ZabbixError>;
    fn encode(&self, payload: &R) -> Result<JsonValue, ZabbixError>;
    /// Inbound normalization; dual-shape fields come back with both shapes filled.
    fn decode(&self, value: JsonValue) -> Result<R, ZabbixError>;
}

/// Serde-only codec for families whose wire shape did not change between versions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlainCodec;

impl<R: Serialize + DeserializeOwned> WireCodec<R> for PlainCodec {
    fn prepare(&self, _payload: &mut R, _version: Option<&str>) -> Result<(), ZabbixError> {
        Ok(())
    }

    fn encode(&self, payload: &R) -> Result<JsonValue, ZabbixError> {
        Ok(serde_json::to_value(payload)?)
    }

    fn decode(&self, value: JsonValue) -> Result<R, ZabbixError> {
        Ok(serde_json::from_value(value)?)
    }
}

/// API metadata for one resource family.
pub trait Resource: Sized {
    type Codec: WireCodec<Self>;

    /// Method prefix, e.g. `item` for `item.get`.
    const API: &'static str;
    const ID_FIELD: &'static str;
    /// Filter parameter of `get` that selects by id.
    const IDS_PARAM: &'static str;
    /// Result member listing ids after `create` and `update`.
    const CREATED_IDS: &'static str;
    /// Result member listing ids after `delete`.
    const DELETED_IDS: &'static str;
    /// Feature the whole family needs, if any.
    const FEATURE: Option<Feature> = None;

    fn id(&self) -> Option<&str>;
    fn set_id(&mut self, id: Option<String>);

    /// Feature a particular payload needs beyond the family gate.
    fn required_feature(&self) -> Option<Feature> {
        None
    }

    /// Picks the codec for the negotiated adapters.
    fn codec(adapters: Option<&AdapterSet>) -> Result<Self::Codec, ZabbixError>;
}
