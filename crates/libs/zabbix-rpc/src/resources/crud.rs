use super::{Resource, WireCodec};
use crate::caller::RpcCall;
use crate::error::{CardinalityError, ZabbixError};
use crate::fields::lenient;
use serde_json::Value as JsonValue;

fn method<R: Resource>(verb: &str) -> String {
    format!("{}.{verb}", R::API)
}

pub(crate) fn get<R, C>(rpc: &dyn RpcCall, codec: &C, params: JsonValue) -> Result<Vec<R>, ZabbixError>
where
    R: Resource,
    C: WireCodec<R>,
{
    let method = method::<R>("get");
    match rpc.call(&method, params)? {
        JsonValue::Array(rows) => rows.into_iter().map(|row| codec.decode(row)).collect(),
        other => Err(ZabbixError::decode(format!("{method}: expected an array result, got {other}"))),
    }
}

pub(crate) fn exactly_one<R>(mut rows: Vec<R>) -> Result<R, ZabbixError> {
    if let Some(err) = CardinalityError::from_count(rows.len()) {
        return Err(err.into());
    }
    rows.pop().ok_or_else(|| CardinalityError::NotFound.into())
}

/// Writes the server-assigned ids back into `payloads`.
pub(crate) fn create<R, C>(rpc: &dyn RpcCall, codec: &C, payloads: &mut [R]) -> Result<Vec<String>, ZabbixError>
where
    R: Resource,
    C: WireCodec<R>,
{
    if payloads.is_empty() {
        return Ok(Vec::new());
    }
    let encoded = encode_all(rpc, codec, payloads)?;
    let method = method::<R>("create");
    let result = rpc.call(&method, encoded)?;
    let ids = result_ids(&result, R::CREATED_IDS)
        .ok_or_else(|| ZabbixError::decode(format!("{method}: result has no {}", R::CREATED_IDS)))??;
    if ids.len() != payloads.len() {
        return Err(ZabbixError::decode(format!(
            "{method}: sent {} payloads, got {} ids",
            payloads.len(),
            ids.len()
        )));
    }
    for (payload, id) in payloads.iter_mut().zip(&ids) {
        payload.set_id(Some(id.clone()));
    }
    Ok(ids)
}

pub(crate) fn update<R, C>(rpc: &dyn RpcCall, codec: &C, payloads: &mut [R]) -> Result<Vec<String>, ZabbixError>
where
    R: Resource,
    C: WireCodec<R>,
{
    if payloads.is_empty() {
        return Ok(Vec::new());
    }
    for payload in payloads.iter() {
        require_id(payload)?;
    }
    let encoded = encode_all(rpc, codec, payloads)?;
    let result = rpc.call(&method::<R>("update"), encoded)?;
    let ids = result_ids(&result, R::CREATED_IDS).transpose()?.unwrap_or_default();
    if ids.len() == payloads.len() {
        for (payload, id) in payloads.iter_mut().zip(&ids) {
            payload.set_id(Some(id.clone()));
        }
    }
    Ok(ids)
}

/// Clears the ids of `payloads` once the server confirmed the deletion.
pub(crate) fn delete<R: Resource>(rpc: &dyn RpcCall, payloads: &mut [R]) -> Result<Vec<String>, ZabbixError> {
    let ids = payloads.iter().map(require_id).collect::<Result<Vec<_>, _>>()?;
    let deleted = delete_by_ids::<R>(rpc, &ids)?;
    for payload in payloads.iter_mut() {
        payload.set_id(None);
    }
    Ok(deleted)
}

pub(crate) fn delete_by_ids<R: Resource>(rpc: &dyn RpcCall, ids: &[String]) -> Result<Vec<String>, ZabbixError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let method = method::<R>("delete");
    let result = rpc.call(&method, JsonValue::from(ids.to_vec()))?;
    let deleted = result_ids(&result, R::DELETED_IDS)
        .ok_or_else(|| ZabbixError::decode(format!("{method}: result has no {}", R::DELETED_IDS)))??;
    if deleted.len() != ids.len() {
        return Err(ZabbixError::DeleteCountMismatch { expected: ids.len(), got: deleted.len() });
    }
    Ok(deleted)
}

fn encode_all<R, C>(rpc: &dyn RpcCall, codec: &C, payloads: &mut [R]) -> Result<JsonValue, ZabbixError>
where
    R: Resource,
    C: WireCodec<R>,
{
    let version = rpc.server_version();
    let mut encoded = Vec::with_capacity(payloads.len());
    for payload in payloads.iter_mut() {
        codec.prepare(payload, version.as_deref())?;
        encoded.push(codec.encode(payload)?);
    }
    Ok(JsonValue::Array(encoded))
}

fn require_id<R: Resource>(payload: &R) -> Result<String, ZabbixError> {
    payload
        .id()
        .filter(|id| !id.trim().is_empty())
        .map(str::to_owned)
        .ok_or_else(|| ZabbixError::InvalidArgument(format!("{} payload has no {}", R::API, R::ID_FIELD)))
}

/// Reads `key` from a create/update/delete result. The list may be an array or
/// an index-keyed object, with string or numeric ids.
pub(crate) fn result_ids(result: &JsonValue, key: &str) -> Option<Result<Vec<String>, ZabbixError>> {
    let ids = result.get(key)?;
    let values: Vec<&JsonValue> = match ids {
        JsonValue::Array(values) => values.iter().collect(),
        JsonValue::Object(values) => values.values().collect(),
        other => {
            return Some(Err(ZabbixError::decode(format!(
                "{key}: expected an array or object of ids, got {other}"
            ))))
        }
    };
    Some(
        values
            .into_iter()
            .map(|value| {
                lenient::text(value).ok_or_else(|| ZabbixError::decode(format!("{key}: invalid id {value}")))
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn result_ids_accepts_arrays_objects_and_numbers() {
        let array = result_ids(&json!({"itemids": ["1", 2]}), "itemids");
        assert_eq!(array.expect("present").expect("valid"), ["1", "2"]);

        let object = result_ids(&json!({"itemids": {"0": "7", "1": 8}}), "itemids");
        assert_eq!(object.expect("present").expect("valid"), ["7", "8"]);

        assert!(result_ids(&json!({"hostids": []}), "itemids").is_none());
        assert!(result_ids(&json!({"itemids": "1"}), "itemids").expect("present").is_err());
        assert!(result_ids(&json!({"itemids": [null]}), "itemids").expect("present").is_err());
    }

    #[test]
    fn exactly_one_rejects_zero_and_many() {
        assert_eq!(exactly_one(vec![5]).expect("one"), 5);
        assert!(matches!(
            exactly_one(Vec::<u8>::new()),
            Err(ZabbixError::Cardinality(CardinalityError::NotFound))
        ));
        assert!(matches!(
            exactly_one(vec![1, 2]),
            Err(ZabbixError::Cardinality(CardinalityError::Ambiguous(2)))
        ));
    }
}
