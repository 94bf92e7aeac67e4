use serde_json::json;
use vyatta_conf::{
    ConfigValue, DuplicateKeyBehavior, ParserConfig, VyattaParser, parse_conf,
};

#[cfg(test)]
mod implicit_list_tests {
    use super::*;

    #[test]
    fn test_automatic_list_creation_from_repeated_keys() {
        let config = r#"
            system {
                name-server 192.168.1.1
                name-server 8.8.8.8
                name-server 8.8.4.4
                ntp {
                    server 0.ubnt.pool.ntp.org
                    server 1.ubnt.pool.ntp.org
                }
            }
        "#;

        let root = parse_conf(config).expect("Should create lists from repeated keys");
        let system = &root["system"];

        assert_eq!(
            system.get("name-server").unwrap().as_list().unwrap(),
            ["192.168.1.1", "8.8.8.8", "8.8.4.4"]
        );
        assert_eq!(
            system.get("ntp").unwrap().get("server").unwrap().as_list().unwrap(),
            ["0.ubnt.pool.ntp.org", "1.ubnt.pool.ntp.org"]
        );
    }

    #[test]
    fn test_single_assignment_is_never_wrapped() {
        let root = parse_conf("address 10.0.0.1/24").unwrap();
        assert!(root["address"].is_scalar());
        assert_eq!(serde_json::to_value(&root).unwrap(), json!({"address": "10.0.0.1/24"}));
    }

    #[test]
    fn test_duplicate_values_are_kept() {
        let root = parse_conf("tag a\ntag b\ntag a\ntag a").unwrap();
        assert_eq!(root["tag"].as_list().unwrap(), ["a", "b", "a", "a"]);
    }

    #[test]
    fn test_lists_are_scoped_per_block() {
        let config = r#"
            ethernet eth0 {
                address 10.0.0.1/24
            }
            ethernet eth1 {
                address 10.0.1.1/24
            }
        "#;

        let root = parse_conf(config).unwrap();
        assert_eq!(
            serde_json::to_value(&root).unwrap(),
            json!({
                "ethernet": {
                    "eth0": {"address": "10.0.0.1/24"},
                    "eth1": {"address": "10.0.1.1/24"}
                }
            })
        );
    }

    #[test]
    fn test_repeated_keys_interleaved_with_others() {
        let config = r#"
            rule 10 {
                source-port 80
                action accept
                source-port 443
                protocol tcp
                source-port 8080
            }
        "#;

        let root = parse_conf(config).unwrap();
        let rule = root["rule"].get("10").unwrap();
        assert_eq!(
            rule.get("source-port").unwrap().values().collect::<Vec<_>>(),
            ["80", "443", "8080"]
        );

        // The list stays where the key first appeared
        let keys: Vec<&str> = rule.as_block().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["source-port", "action", "protocol"]);
    }

    #[test]
    fn test_quoted_and_bare_values_mix_in_one_list() {
        let root = parse_conf("banner \"hello world\"\nbanner bye\nbanner \"#3 (x)\"").unwrap();
        assert_eq!(
            root["banner"],
            ConfigValue::List(["hello world", "bye", "#3 (x)"].iter().map(|s| s.to_string()).collect())
        );
    }

    #[test]
    fn test_list_continues_across_reopened_block() {
        let config = r#"
            service dns {
                forwarding {
                    listen-on eth0
                }
            }
            service dns {
                forwarding {
                    listen-on eth1
                }
            }
        "#;

        let root = parse_conf(config).unwrap();
        assert_eq!(
            serde_json::to_value(&root).unwrap(),
            json!({"service": {"dns": {"forwarding": {"listen-on": ["eth0", "eth1"]}}}})
        );
    }

    #[test]
    fn test_override_behavior_keeps_last() {
        let config = ParserConfig::new().with_duplicate_key_behavior(DuplicateKeyBehavior::Override);
        let root = VyattaParser::new("speed 100\nspeed 1000\nspeed auto")
            .with_config(config)
            .parse()
            .unwrap();
        assert_eq!(root["speed"].as_str(), Some("auto"));
    }
}
