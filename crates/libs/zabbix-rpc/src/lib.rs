//! Version-aware client for the Zabbix JSON-RPC API.
//!
//! A [`Session`] logs in, detects the server version, and routes resource
//! calls through the adapters for the 6.x or 7.x wire shapes.
#![allow(clippy::result_large_err)]

pub mod adapter;
pub mod caller;
pub mod config;
pub mod envelope;
pub mod error;
pub mod facade;
pub mod fields;
pub mod resources;
pub mod session;
pub mod trace;
pub mod transport;
pub mod version;

pub use adapter::{AdapterSet, HostAdapter, ItemAdapter};
pub use caller::{Caller, RpcCall};
pub use config::{AuthPlacement, ClientConfig, ConfigError, OutputSelection, QueryDefaults};
pub use error::{CardinalityError, NetworkKind, ProtocolError, TransportFailure, ZabbixError};
pub use facade::Family;
pub use fields::{KeyValueMap, MonitoredBy, NameValue, PairField, ProxyRef};
pub use resources::{
    HistoryPushOutcome, HistoryPushReport, HistoryValue, Host, HostGroup, Item, ItemPrototype, Mfa,
    ProxyGroup, Resource, User, WireCodec,
};
pub use session::Session;
pub use trace::{LogTraceSink, TraceSink};
pub use transport::{HttpReply, HttpSender, UreqSender};
pub use version::{Feature, ServerVersion, VersionManager, WireGeneration};
