use serde_json::Value as JsonValue;
use std::sync::Arc;

pub const WIRE_TARGET: &str = "zabbix_rpc::wire";

/// Receives pre-formatted request/response trace lines.
pub trait TraceSink: Send + Sync {
    fn trace(&self, line: &str);
}

/// Forwards trace lines to the `log` facade at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogTraceSink;

impl TraceSink for LogTraceSink {
    fn trace(&self, line: &str) {
        log::debug!(target: WIRE_TARGET, "{line}");
    }
}

impl<T: TraceSink + ?Sized> TraceSink for Arc<T> {
    fn trace(&self, line: &str) {
        (**self).trace(line);
    }
}

pub(crate) fn shared_default() -> Arc<dyn TraceSink> {
    Arc::new(LogTraceSink)
}

const REDACTED_MEMBERS: [&str; 4] = ["auth", "password", "passwd", "current_passwd"];

/// Renders `request` with every secret member's string value masked, at any depth.
pub(crate) fn redact_secrets(request: &JsonValue) -> String {
    let mut masked = request.clone();
    mask_members(&mut masked);
    masked.to_string()
}

fn mask_members(value: &mut JsonValue) {
    match value {
        JsonValue::Object(members) => {
            for (name, member) in members.iter_mut() {
                if member.is_string() && REDACTED_MEMBERS.contains(&name.as_str()) {
                    *member = JsonValue::from("***");
                } else {
                    mask_members(member);
                }
            }
        }
        JsonValue::Array(values) => values.iter_mut().for_each(mask_members),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_token_and_password_members() {
        let request = json!({"jsonrpc": "2.0", "method": "host.get", "params": {}, "auth": "0424bd59b807674191e7d77572075f33", "id": 4});
        assert_eq!(
            redact_secrets(&request),
            r#"{"jsonrpc":"2.0","method":"host.get","params":{},"auth":"***","id":4}"#
        );

        let login = json!({"params": {"username": "Admin", "password": "zab\"bix"}, "id": 1});
        assert_eq!(redact_secrets(&login), r#"{"params":{"username":"Admin","password":"***"},"id":1}"#);
        assert_eq!(redact_secrets(&json!({"id": 1})), r#"{"id":1}"#);
    }

    #[test]
    fn redacts_user_passwords_inside_batches() {
        let update = json!({
            "method": "user.update",
            "params": [{"userid": "3", "passwd": "n3w-secret", "current_passwd": "old-secret"}],
        });
        let line = redact_secrets(&update);
        assert!(!line.contains("secret"), "leaked: {line}");
        assert!(line.contains(r#""passwd":"***""#));
        assert!(line.contains(r#""current_passwd":"***""#));
        assert!(line.contains(r#""userid":"3""#));
    }
}
