// Startup configuration. Everything is read from `MQTT_*` environment
// variables exactly once, validated, and frozen into a `Settings` value that
// gets injected where it is needed. Nothing reads the environment after this.
use rumqttc::QoS;

/// Immutable settings resolved before the interactive loop starts.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub topic: String,
    pub qos: QoS,
    pub retain: bool,
    pub client_id: String,
    pub credentials: Option<(String, String)>,
    pub ca_file: Option<String>,
}

impl Settings {
    /// Resolve settings from the environment. Check for host, port, topic,
    /// QoS, retain, client id, credentials and an optional CA file; use
    /// defaults where a value is not required. Only the topic is mandatory.
    pub fn from_env() -> anyhow::Result<Self> {
        let host = std::env::var("MQTT_HOST").ok();
        let port = std::env::var("MQTT_PORT").ok();
        let topic = std::env::var("MQTT_TOPIC").ok();
        let qos = std::env::var("MQTT_QOS").ok();
        let retain = std::env::var("MQTT_RETAIN").ok();
        let client_id = std::env::var("MQTT_CLIENT_ID").ok();
        let user = std::env::var("MQTT_USER").ok();
        let pass = std::env::var("MQTT_PASS").ok();
        let ca_file = std::env::var("MQTT_CA_FILE").ok();

        let (host, port) = match (host, port) {
            // No host or port: default to localhost:1883
            (None, None) => ("localhost".to_string(), 1883),
            // Host and port provided, use both
            (Some(host), Some(port)) => match port.trim().parse::<u16>() {
                Ok(p) => (host, p),
                Err(e) => {
                    return Err(anyhow::anyhow!(
                        "Invalid MQTT_PORT value, expected a number, got: {}",
                        e
                    ));
                }
            },
            // Only host provided, use default port 1883
            (Some(host), None) => (host, 1883),
            (None, Some(_)) => {
                return Err(anyhow::anyhow!(
                    "MQTT_HOST must be set if MQTT_PORT is provided"
                ));
            }
        };

        let Some(topic) = topic else {
            return Err(anyhow::anyhow!(
                "MQTT_TOPIC environment variable must be set to publish to a topic"
            ));
        };

        let qos = match qos {
            Some(raw) => parse_qos(&raw)?,
            None => QoS::AtLeastOnce,
        };

        let retain = match retain {
            Some(raw) => parse_retain(&raw),
            None => false,
        };

        let credentials = match (user, pass) {
            (Some(user), Some(pass)) => Some((user, pass)),
            (Some(_), None) | (None, Some(_)) => {
                // Warn but continue without credentials if only one is set.
                eprintln!(
                    "MQTT credentials incomplete: both MQTT_USER and MQTT_PASS must be set to enable auth"
                );
                None
            }
            (None, None) => None,
        };

        Ok(Settings {
            host,
            port,
            topic,
            qos,
            retain,
            client_id: client_id.unwrap_or_else(|| "scoreboard-publisher".to_string()),
            credentials,
            ca_file,
        })
    }
}

fn parse_qos(raw: &str) -> anyhow::Result<QoS> {
    match raw.trim() {
        "0" => Ok(QoS::AtMostOnce),
        "1" => Ok(QoS::AtLeastOnce),
        "2" => Ok(QoS::ExactlyOnce),
        other => Err(anyhow::anyhow!(
            "Invalid MQTT_QOS value, expected 0, 1 or 2, got: {}",
            other
        )),
    }
}

fn parse_retain(raw: &str) -> bool {
    matches!(raw.trim(), "1" | "true" | "TRUE" | "True" | "yes")
}

//   TESTS
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_qos_levels() {
        assert!(matches!(parse_qos("0").unwrap(), QoS::AtMostOnce));
        assert!(matches!(parse_qos("1").unwrap(), QoS::AtLeastOnce));
        assert!(matches!(parse_qos(" 2 ").unwrap(), QoS::ExactlyOnce));
        assert!(parse_qos("3").is_err(), "QoS 3 does not exist");
        assert!(parse_qos("one").is_err());
    }

    #[test]
    fn test_parse_retain_flags() {
        assert!(parse_retain("1"));
        assert!(parse_retain("true"));
        assert!(parse_retain(" yes "));
        assert!(!parse_retain("0"));
        assert!(!parse_retain("false"));
        assert!(!parse_retain(""));
    }
}
