use super::Resource;
use crate::adapter::{AdapterSet, ItemAdapter};
use crate::error::ZabbixError;
use crate::fields::{lenient, PairField};
use crate::version::Feature;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::ops::{Deref, DerefMut};

/// Item `type` of browser checks.
pub const BROWSER_ITEM_TYPE: &str = "22";

/// A monitored check.
///
/// `headers` and `query_fields` are never serialized directly; the item adapter
/// writes whichever shape the server expects.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Item {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub itemid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub hostid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_: Option<String>,
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_string"
    )]
    pub item_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub value_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub interfaceid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip)]
    pub headers: PairField,
    #[serde(skip)]
    pub query_fields: PairField,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Item {
    pub fn is_browser(&self) -> bool {
        self.item_type.as_deref().map(str::trim) == Some(BROWSER_ITEM_TYPE)
    }
}

impl Resource for Item {
    type Codec = ItemAdapter;

    const API: &'static str = "item";
    const ID_FIELD: &'static str = "itemid";
    const IDS_PARAM: &'static str = "itemids";
    const CREATED_IDS: &'static str = "itemids";
    const DELETED_IDS: &'static str = "itemids";

    fn id(&self) -> Option<&str> {
        self.itemid.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.itemid = id;
    }

    fn required_feature(&self) -> Option<Feature> {
        self.is_browser().then_some(Feature::BrowserItem)
    }

    fn codec(adapters: Option<&AdapterSet>) -> Result<Self::Codec, ZabbixError> {
        adapters.map(|set| set.items).ok_or(ZabbixError::VersionNotDetected)
    }
}

/// An item prototype of a discovery rule; same wire shape as [`Item`].
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ItemPrototype(pub Item);

impl Deref for ItemPrototype {
    type Target = Item;

    fn deref(&self) -> &Item {
        &self.0
    }
}

impl DerefMut for ItemPrototype {
    fn deref_mut(&mut self) -> &mut Item {
        &mut self.0
    }
}

impl From<Item> for ItemPrototype {
    fn from(item: Item) -> Self {
        Self(item)
    }
}

impl Resource for ItemPrototype {
    type Codec = ItemAdapter;

    const API: &'static str = "itemprototype";
    const ID_FIELD: &'static str = "itemid";
    const IDS_PARAM: &'static str = "itemids";
    const CREATED_IDS: &'static str = "itemids";
    const DELETED_IDS: &'static str = "prototypeids";

    fn id(&self) -> Option<&str> {
        self.0.id()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.0.set_id(id);
    }

    fn required_feature(&self) -> Option<Feature> {
        self.0.required_feature()
    }

    fn codec(adapters: Option<&AdapterSet>) -> Result<Self::Codec, ZabbixError> {
        Item::codec(adapters)
    }
}
