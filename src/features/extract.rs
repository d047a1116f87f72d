//! Feature extraction: sniff payload shape → fixed 4-dim vector. Never fails loudly;
//! a field that is present but unreadable makes the whole event absent.

use super::FeatureVector;
use crate::collectors::{RawEvent, SniffPayload};
use serde_json::{Map, Value};

const SERVICE_PORTS: [(&str, u64); 3] = [("http", 80), ("https", 443), ("dns", 53)];

/// Extract features, or `None` when the event carries no recognized payload
/// or a required number cannot be read.
pub fn extract(event: &RawEvent) -> Option<FeatureVector> {
    match event.payload()? {
        SniffPayload::Packet(packet) => from_packet(packet),
        SniffPayload::Summary {
            summary,
            protocol,
            to,
        } => from_summary(summary, protocol, to),
    }
}

fn from_packet(packet: &Map<String, Value>) -> Option<FeatureVector> {
    let layer = move |name: &str| packet.get(name).filter(|v| v.is_object());
    let tcp = layer("tcp");
    let udp = layer("udp");
    // missing port reads as 0, a malformed one drops the event
    let dst_port = match tcp.or(udp).and_then(|l| l.get("dst_port")) {
        Some(v) => as_uint(v)?,
        None => 0,
    };
    let source = packet
        .get("ipv4")
        .and_then(|ip| ip.get("src"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned);

    Some(FeatureVector {
        size: packet.get("length").and_then(as_uint).unwrap_or(0),
        is_tcp: tcp.is_some(),
        is_udp: udp.is_some(),
        dst_port,
        source,
    })
}

fn from_summary(summary: &Map<String, Value>, protocol: &str, to: &str) -> Option<FeatureVector> {
    Some(FeatureVector {
        size: SniffPayload::summary_size(summary).and_then(as_uint)?,
        is_tcp: protocol.eq_ignore_ascii_case("tcp"),
        is_udp: protocol.eq_ignore_ascii_case("udp"),
        dst_port: destination_port(to),
        source: None,
    })
}

/// Port of an `address:port-or-service` string; unknown services map to 0.
pub fn destination_port(to: &str) -> u64 {
    let Some((_, service)) = to.rsplit_once(':') else {
        return 0;
    };
    if !service.is_empty() && service.bytes().all(|b| b.is_ascii_digit()) {
        return service.parse().unwrap_or(0);
    }
    SERVICE_PORTS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(service))
        .map(|(_, port)| *port)
        .unwrap_or(0)
}

/// Unsigned read: integers, truncated non-negative floats, decimal strings.
fn as_uint(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lenient_numbers() {
        assert_eq!(as_uint(&json!(60)), Some(60));
        assert_eq!(as_uint(&json!(60.9)), Some(60));
        assert_eq!(as_uint(&json!(" 1500 ")), Some(1500));
        assert_eq!(as_uint(&json!(-4)), None);
        assert_eq!(as_uint(&json!("n/a")), None);
        assert_eq!(as_uint(&Value::Null), None);
    }

    #[test]
    fn unreadable_summary_size_drops_event() {
        let ev = |size: Value| {
            RawEvent::new(
                "net.sniff.https",
                json!({"protocol": "tcp", "to": "1.1.1.1:443", "data": {"Size": size}}),
            )
        };
        assert!(extract(&ev(json!("abc"))).is_none());
        assert!(extract(&ev(Value::Null)).is_none());
        assert_eq!(extract(&ev(json!("120"))).unwrap().size, 120);
    }

    #[test]
    fn unreadable_dst_port_drops_packet() {
        let bad = RawEvent::new(
            "net.sniff.tcp",
            json!({"packet": {"length": 60, "tcp": {"dst_port": "garbage"}}}),
        );
        assert!(extract(&bad).is_none());

        let missing = RawEvent::new("net.sniff.tcp", json!({"packet": {"length": 60, "tcp": {}}}));
        let fv = extract(&missing).unwrap();
        assert!(fv.is_tcp);
        assert_eq!(fv.dst_port, 0);
    }

    #[test]
    fn unreadable_length_reads_as_zero() {
        let ev = RawEvent::new(
            "net.sniff.udp",
            json!({"packet": {"length": "huge", "udp": {"dst_port": 53}}}),
        );
        let fv = extract(&ev).unwrap();
        assert_eq!(fv.size, 0);
        assert_eq!(fv.dst_port, 53);
    }

    #[test]
    fn ports_from_to_field() {
        assert_eq!(destination_port("10.0.0.1:443"), 443);
        assert_eq!(destination_port("10.0.0.1:https"), 443);
        assert_eq!(destination_port("10.0.0.1:HTTP"), 80);
        assert_eq!(destination_port("10.0.0.1:8081"), 8081);
        assert_eq!(destination_port("10.0.0.1:weird"), 0);
        assert_eq!(destination_port("10.0.0.1"), 0);
        assert_eq!(destination_port("10.0.0.1:"), 0);
    }

    #[test]
    fn transport_layer_must_be_object() {
        let ev = RawEvent::new("net.sniff.tcp", json!({"packet": {"length": 5, "tcp": null}}));
        let fv = extract(&ev).unwrap();
        assert!(!fv.is_tcp);
        assert_eq!(fv.dst_port, 0);
    }
}
