//! Tool output and configuration fixtures
//!
//! Shapes follow iputils `ping`, `avahi-browse --parsable` and the
//! firmware's `config.h`.

/// Production header: every audit rule matches
pub const PRODUCTION_CONFIG: &str = r#"#ifndef CONFIG_H
#define CONFIG_H

#define DEBUG false

#define MQTT_TOPIC "/arduino"
#define MQTT_PORT 1883

#define MDNS_SERVICE_TYPE "mqtt"
#define MDNS_PROTOCOL "tcp"

#define SEARCH_INTERVAL 60000
#define PUBLISH_INTERVAL 300000

#endif
"#;

/// Development header: debug on, device-specific service type
pub const DEVELOPMENT_CONFIG: &str = r#"#ifndef CONFIG_H
#define CONFIG_H

#define DEBUG true

#define MDNS_SERVICE_TYPE "mosquitto"

#define SEARCH_INTERVAL 30000
#define PUBLISH_INTERVAL 60000

#endif
"#;

/// Output of a successful `ping -c <count> <host>`
pub fn ping_output(host: &str, count: u32, avg_ms: f64) -> String {
    let mut out = format!("PING {host} 56(84) bytes of data.\n");
    for seq in 1..=count {
        out.push_str(&format!(
            "64 bytes from {host}: icmp_seq={seq} ttl=117 time={avg_ms:.1} ms\n"
        ));
    }
    out.push_str(&format!("\n--- {host} ping statistics ---\n"));
    out.push_str(&format!(
        "{count} packets transmitted, {count} received, 0% packet loss, time {}ms\n",
        count.saturating_sub(1) * 1000
    ));
    out.push_str(&format!(
        "rtt min/avg/max/mdev = {:.3}/{avg_ms:.3}/{:.3}/0.412 ms\n",
        avg_ms * 0.9,
        avg_ms * 1.1
    ));
    out
}

/// Output of a successful ping whose summary line is missing
pub fn ping_output_without_summary(host: &str) -> String {
    format!("PING {host} 56(84) bytes of data.\n64 bytes from {host}: icmp_seq=1 ttl=64\n")
}

/// `ip route show default` output
pub fn default_route(gateway: &str) -> String {
    format!("default via {gateway} dev wlan0 proto dhcp src 192.168.1.42 metric 600\n")
}

/// A resolved IPv4 `avahi-browse --parsable` record
pub fn resolved_record(name: &str, hostname: &str, address: &str, port: u16) -> String {
    format!("=;wlan0;IPv4;{name};_mqtt._tcp;local;{hostname};{address};{port};")
}

/// Full browse output: announcement lines followed by the given records
pub fn browse_output(records: &[String]) -> String {
    let mut out = String::from("+;wlan0;IPv6;mosquitto;_mqtt._tcp;local\n");
    out.push_str("+;wlan0;IPv4;mosquitto;_mqtt._tcp;local\n");
    for record in records {
        out.push_str(record);
        out.push('\n');
    }
    out
}

/// A line as printed by `mosquitto_sub -v`
pub fn message_line(topic: &str, payload: &str) -> String {
    format!("{topic} {payload}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_output_has_summary() {
        let out = ping_output("8.8.8.8", 3, 12.5);
        assert!(out.contains("rtt min/avg/max/mdev = 11.250/12.500/13.750/0.412 ms"));
        assert!(out.contains("3 packets transmitted"));
    }

    #[test]
    fn test_record_shape() {
        let record = resolved_record("broker", "pi.local", "10.0.0.1", 1883);
        assert_eq!(record.split(';').count(), 10);
        assert!(record.starts_with('='));
    }

    #[test]
    fn test_config_fixtures_differ() {
        assert!(PRODUCTION_CONFIG.contains("DEBUG false"));
        assert!(!DEVELOPMENT_CONFIG.contains("DEBUG false"));
        assert!(!DEVELOPMENT_CONFIG.contains("\"mqtt\""));
    }
}
