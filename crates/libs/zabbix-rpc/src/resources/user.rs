use super::{PlainCodec, Resource};
use crate::adapter::AdapterSet;
use crate::error::ZabbixError;
use crate::fields::lenient;
use crate::version::Feature;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub userid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub roleid: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Resource for User {
    type Codec = PlainCodec;

    const API: &'static str = "user";
    const ID_FIELD: &'static str = "userid";
    const IDS_PARAM: &'static str = "userids";
    const CREATED_IDS: &'static str = "userids";
    const DELETED_IDS: &'static str = "userids";

    fn id(&self) -> Option<&str> {
        self.userid.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.userid = id;
    }

    fn codec(_adapters: Option<&AdapterSet>) -> Result<Self::Codec, ZabbixError> {
        Ok(PlainCodec)
    }
}

/// A multi-factor authentication method (7.x, TOTP or Duo).
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Mfa {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub mfaid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_string"
    )]
    pub mfa_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub hash_function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub code_length: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Resource for Mfa {
    type Codec = PlainCodec;

    const API: &'static str = "mfa";
    const ID_FIELD: &'static str = "mfaid";
    const IDS_PARAM: &'static str = "mfaids";
    const CREATED_IDS: &'static str = "mfaids";
    const DELETED_IDS: &'static str = "mfaids";
    const FEATURE: Option<Feature> = Some(Feature::Mfa);

    fn id(&self) -> Option<&str> {
        self.mfaid.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.mfaid = id;
    }

    fn codec(_adapters: Option<&AdapterSet>) -> Result<Self::Codec, ZabbixError> {
        Ok(PlainCodec)
    }
}
