use super::*;
use crate::config::{ClientConfig, OutputSelection};
use crate::error::{CardinalityError, TransportFailure};
use crate::fields::{KeyValueMap, NameValue, PairField, ProxyRef};
use crate::transport::{HttpReply, HttpSender};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Answers each request with the next scripted `result` and records what was sent.
#[derive(Default)]
struct StubServer {
    results: Mutex<VecDeque<JsonValue>>,
    requests: Mutex<Vec<JsonValue>>,
}

impl StubServer {
    fn new(results: Vec<JsonValue>) -> Arc<Self> {
        Arc::new(Self { results: Mutex::new(results.into()), requests: Mutex::new(Vec::new()) })
    }

    fn requests(&self) -> Vec<JsonValue> {
        self.requests.lock().expect("requests mutex poisoned").clone()
    }

    fn calls(&self) -> usize {
        self.requests.lock().expect("requests mutex poisoned").len()
    }
}

impl HttpSender for StubServer {
    fn post(
        &self,
        _url: &str,
        _headers: &[(String, String)],
        body: &[u8],
    ) -> Result<HttpReply, TransportFailure> {
        let request: JsonValue = serde_json::from_slice(body).expect("request is json");
        let id = request["id"].clone();
        self.requests.lock().expect("requests mutex poisoned").push(request);
        let result = self
            .results
            .lock()
            .expect("results mutex poisoned")
            .pop_front()
            .expect("unexpected extra request");
        Ok(HttpReply::ok(json!({"jsonrpc": "2.0", "result": result, "id": id}).to_string()))
    }
}

fn session_at(version: &str, results: Vec<JsonValue>) -> (Session, Arc<StubServer>) {
    let server = StubServer::new(results);
    let mut config = ClientConfig::new("http://zabbix.test/api_jsonrpc.php");
    config.forced_version = Some(version.to_owned());
    (Session::with_sender(config, server.clone()), server)
}

#[test]
fn mfa_on_a_6x_server_fails_without_a_request() {
    let (session, server) = session_at("6.4.0", vec![]);
    let mut methods = vec![Mfa { name: Some("TOTP".into()), ..Mfa::default() }];

    let err = session.mfa().create(&mut methods).expect_err("mfa needs 7.x");
    assert!(matches!(err, ZabbixError::UnsupportedFeature { feature: Feature::Mfa, .. }));
    assert!(session.mfa().get(JsonValue::Null).is_err());
    assert!(session.reset_user_totp(&["1".into()]).is_err());
    assert_eq!(server.calls(), 0);
}

#[test]
fn item_create_on_7x_sends_header_list_and_writes_id_back() {
    let (session, server) = session_at("7.0.0", vec![json!({"itemids": ["40001"]})]);
    let headers: KeyValueMap = [("Accept", "application/json")].into_iter().collect();
    let mut items = vec![Item {
        hostid: Some("10084".into()),
        name: Some("api health".into()),
        key_: Some("api.health".into()),
        item_type: Some("19".into()),
        headers: PairField::from_map(headers),
        ..Item::default()
    }];

    let ids = session.items().create(&mut items).expect("create");
    assert_eq!(ids, ["40001"]);
    assert_eq!(items[0].itemid.as_deref(), Some("40001"));
    assert!(items[0].headers.map.is_none());
    assert_eq!(items[0].headers.list, Some(vec![NameValue::new("Accept", "application/json")]));

    let sent = server.requests();
    assert_eq!(sent[0]["method"], "item.create");
    assert_eq!(sent[0]["params"][0]["headers"], json!([{"name": "Accept", "value": "application/json"}]));
}

#[test]
fn get_fills_default_output_and_per_family_override() {
    let server = StubServer::new(vec![json!([]), json!([])]);
    let mut config = ClientConfig::new("http://zabbix.test/api_jsonrpc.php");
    config.query = config
        .query
        .with_override("user", OutputSelection::Fields(vec!["userid".into(), "username".into()]));
    let session = Session::with_sender(config, server.clone());

    session.host_groups().get(json!({"search": {"name": "Linux"}})).expect("hostgroup.get");
    session.users().get(JsonValue::Null).expect("user.get");

    let sent = server.requests();
    assert_eq!(sent[0]["params"]["output"], "extend");
    assert_eq!(sent[0]["params"]["search"]["name"], "Linux");
    assert_eq!(sent[1]["params"]["output"], json!(["userid", "username"]));
}

#[test]
fn explicit_output_is_left_alone() {
    let (session, server) = session_at("7.0.0", vec![json!([])]);
    session.host_groups().get(json!({"output": ["groupid"]})).expect("get");
    assert_eq!(server.requests()[0]["params"]["output"], json!(["groupid"]));
}

#[test]
fn get_by_id_requires_exactly_one_match() {
    let (session, server) = session_at(
        "7.0.0",
        vec![
            json!([]),
            json!([{"groupid": "2", "name": "a"}, {"groupid": "3", "name": "b"}]),
            json!([{"groupid": "4", "name": "Linux servers"}]),
        ],
    );

    let missing = session.host_groups().get_by_id("1").expect_err("none");
    assert!(matches!(missing, ZabbixError::Cardinality(CardinalityError::NotFound)));
    let many = session.host_groups().get_by_id("2").expect_err("two");
    assert!(matches!(many, ZabbixError::Cardinality(CardinalityError::Ambiguous(2))));
    let group = session.host_groups().get_by_id("4").expect("one");
    assert_eq!(group.name.as_deref(), Some("Linux servers"));

    assert_eq!(server.requests()[2]["params"]["groupids"], json!(["4"]));
}

#[test]
fn delete_by_ids_checks_the_count() {
    let (session, _server) = session_at("7.0.0", vec![json!({"hostids": ["1"]})]);
    let err = session
        .hosts()
        .delete_by_ids(&["1".into(), "2".into()])
        .expect_err("one of two deleted");
    assert!(matches!(err, ZabbixError::DeleteCountMismatch { expected: 2, got: 1 }));
}

#[test]
fn delete_clears_ids_and_rejects_unsaved_payloads() {
    let (session, server) = session_at("6.0.0", vec![json!({"prototypeids": ["7"]})]);
    let mut unsaved = vec![ItemPrototype::default()];
    let err = session.item_prototypes().delete(&mut unsaved).expect_err("no id");
    assert!(matches!(err, ZabbixError::InvalidArgument(_)));
    assert_eq!(server.calls(), 0);

    let mut saved = vec![ItemPrototype(Item { itemid: Some("7".into()), ..Item::default() })];
    session.item_prototypes().delete(&mut saved).expect("delete");
    assert!(saved[0].itemid.is_none());
    let sent = server.requests();
    assert_eq!(sent[0]["method"], "itemprototype.delete");
    assert_eq!(sent[0]["params"], json!(["7"]));
}

#[test]
fn routed_families_need_a_known_version() {
    let server = StubServer::new(vec![]);
    let session =
        Session::with_sender(ClientConfig::new("http://zabbix.test/api_jsonrpc.php"), server.clone());

    assert!(matches!(session.items().get(JsonValue::Null), Err(ZabbixError::VersionNotDetected)));
    assert!(matches!(
        session.hosts().create(&mut [Host::default()]),
        Err(ZabbixError::VersionNotDetected)
    ));
    assert_eq!(server.calls(), 0);
}

#[test]
fn proxy_group_hosts_are_refused_by_6x_servers() {
    let (session, server) = session_at("6.4.0", vec![]);
    let mut hosts = vec![Host {
        host: Some("edge-01".into()),
        proxy: ProxyRef::via_proxy_group("5"),
        ..Host::default()
    }];
    let err = session.hosts().create(&mut hosts).expect_err("proxy groups need 7.x");
    assert!(matches!(err, ZabbixError::UnsupportedFeature { feature: Feature::ProxyGroup, .. }));
    assert_eq!(server.calls(), 0);
}

#[test]
fn history_push_follows_version_changes() {
    let (session, server) = session_at(
        "6.4.0",
        vec![json!({"response": "success", "data": [{"itemid": "40001"}, {"error": "Item is disabled."}]})],
    );
    let values = [HistoryValue::for_item("40001", 1.5), HistoryValue::for_key("db-01", "app.lag", 3)];

    assert!(session.history_push(&values).is_err());
    session.force_version("7.0.0");
    let report = session.history_push(&values).expect("push");
    assert_eq!(report.rejected().count(), 1);
    session.force_version("6.0.0");
    assert!(session.history_push(&values).is_err());

    assert_eq!(server.calls(), 1);
    assert_eq!(server.requests()[0]["params"][1], json!({"host": "db-01", "key": "app.lag", "value": 3}));
}

#[test]
fn reset_user_totp_sends_user_ids() {
    let (session, server) = session_at("7.0.3", vec![json!({"userids": ["3"]})]);
    let reset = session.reset_user_totp(&["3".into()]).expect("reset");
    assert_eq!(reset, ["3"]);
    let sent = server.requests();
    assert_eq!(sent[0]["method"], "user.resettotp");
    assert_eq!(sent[0]["params"], json!(["3"]));
}
