use crate::caller::RpcCall;
use crate::error::ZabbixError;
use crate::fields::PairField;
use crate::resources::{self, Item, ItemPrototype, WireCodec};
use crate::version::{Feature, WireGeneration};
use serde_json::Value as JsonValue;

const HEADERS: &str = "headers";
const QUERY_FIELDS: &str = "query_fields";

/// Item wire strategy: object-shaped pairs on legacy servers, `{name, value}` lists on current ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemAdapter {
    Legacy,
    Current,
}

impl ItemAdapter {
    pub fn for_generation(generation: WireGeneration) -> Self {
        match generation {
            WireGeneration::Legacy => ItemAdapter::Legacy,
            WireGeneration::Current => ItemAdapter::Current,
        }
    }

    pub fn generation(self) -> WireGeneration {
        match self {
            ItemAdapter::Legacy => WireGeneration::Legacy,
            ItemAdapter::Current => WireGeneration::Current,
        }
    }

    pub fn prepare(self, item: &mut Item, version: Option<&str>) -> Result<(), ZabbixError> {
        if self == ItemAdapter::Legacy && item.is_browser() {
            return Err(ZabbixError::unsupported(Feature::BrowserItem, version));
        }
        item.headers.prepare_for(self.generation());
        item.query_fields.prepare_for(self.generation());
        Ok(())
    }

    /// Encodes `item` with every pair field in the shape this generation expects.
    pub fn encode(self, item: &Item) -> Result<JsonValue, ZabbixError> {
        let mut value = serde_json::to_value(item)?;
        let object = value
            .as_object_mut()
            .ok_or_else(|| ZabbixError::decode("item did not encode to an object"))?;
        for (field, pairs) in [(HEADERS, &item.headers), (QUERY_FIELDS, &item.query_fields)] {
            object.remove(field);
            let mut pairs = pairs.clone();
            pairs.prepare_for(self.generation());
            pairs.write_into(object, field)?;
        }
        Ok(value)
    }

    /// Accepts either shape regardless of the selected generation.
    pub fn decode(self, value: JsonValue) -> Result<Item, ZabbixError> {
        let mut object = match value {
            JsonValue::Object(object) => object,
            other => return Err(ZabbixError::decode(format!("item: expected an object, got {other}"))),
        };
        let headers = PairField::take_from(&mut object, HEADERS)?;
        let query_fields = PairField::take_from(&mut object, QUERY_FIELDS)?;
        let mut item: Item = serde_json::from_value(JsonValue::Object(object))?;
        item.headers = headers;
        item.query_fields = query_fields;
        Ok(item)
    }

    pub fn create(self, rpc: &dyn RpcCall, items: &mut [Item]) -> Result<Vec<String>, ZabbixError> {
        resources::create(rpc, &self, items)
    }

    pub fn get(self, rpc: &dyn RpcCall, params: JsonValue) -> Result<Vec<Item>, ZabbixError> {
        resources::get::<Item, _>(rpc, &self, params)
    }

    pub fn update(self, rpc: &dyn RpcCall, items: &mut [Item]) -> Result<Vec<String>, ZabbixError> {
        resources::update(rpc, &self, items)
    }

    pub fn delete(self, rpc: &dyn RpcCall, items: &mut [Item]) -> Result<Vec<String>, ZabbixError> {
        resources::delete(rpc, items)
    }

    pub fn delete_by_ids(self, rpc: &dyn RpcCall, ids: &[String]) -> Result<Vec<String>, ZabbixError> {
        resources::delete_by_ids::<Item>(rpc, ids)
    }
}

impl WireCodec<Item> for ItemAdapter {
    fn prepare(&self, payload: &mut Item, version: Option<&str>) -> Result<(), ZabbixError> {
        ItemAdapter::prepare(*self, payload, version)
    }

    fn encode(&self, payload: &Item) -> Result<JsonValue, ZabbixError> {
        ItemAdapter::encode(*self, payload)
    }

    fn decode(&self, value: JsonValue) -> Result<Item, ZabbixError> {
        ItemAdapter::decode(*self, value)
    }
}

impl WireCodec<ItemPrototype> for ItemAdapter {
    fn prepare(&self, payload: &mut ItemPrototype, version: Option<&str>) -> Result<(), ZabbixError> {
        ItemAdapter::prepare(*self, &mut payload.0, version)
    }

    fn encode(&self, payload: &ItemPrototype) -> Result<JsonValue, ZabbixError> {
        ItemAdapter::encode(*self, &payload.0)
    }

    fn decode(&self, value: JsonValue) -> Result<ItemPrototype, ZabbixError> {
        ItemAdapter::decode(*self, value).map(ItemPrototype)
    }
}
