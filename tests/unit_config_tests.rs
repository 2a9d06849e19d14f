//! # Config Module Unit Tests / Config 模块单元测试
//!
//! Covers the default scenario, load-or-create behavior and validation of
//! scenario configuration files.
//!
//! 覆盖默认场景、加载或创建行为以及场景配置文件的校验。

mod common;

use std::fs;

use netprobe::core::config::{
    DEFAULT_SCENARIO, NetprobeConfig, PersistMode, load_or_create, parse_config,
};
use netprobe::errors::ConfigError;

use common::temp_dir;

#[cfg(test)]
mod default_config_tests {
    use super::*;

    #[test]
    fn test_default_has_two_addressed_nodes() {
        let config = NetprobeConfig::default();
        let (name, scenario) = config.scenario(None).unwrap();

        assert_eq!(name, DEFAULT_SCENARIO);
        assert_eq!(scenario.timeout, 30);
        assert_eq!(scenario.node_ip("node1"), Some("172.20.0.2"));
        assert_eq!(scenario.node_ip("node2"), Some("172.20.0.3"));
        assert_eq!(scenario.nodes["node1"].subnet_mask, "255.255.0.0");
        assert_eq!(config.language, None);
        assert_eq!(config.report.persist, PersistMode::Incremental);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_survives_toml_round_trip() {
        let config = NetprobeConfig::default();
        let text = config.to_toml().unwrap();
        assert!(!text.contains("language"));
        assert_eq!(parse_config(&text).unwrap(), config);
    }

    #[test]
    fn test_container_name_substitutes_node() {
        let config = NetprobeConfig::default();
        assert_eq!(
            config.runtime.container_name("node2"),
            "network-test-framework-node2-1"
        );
    }
}

#[cfg(test)]
mod load_tests {
    use super::*;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = temp_dir();
        let path = dir.path().join("config").join("netprobe.toml");

        let config = load_or_create(&path).unwrap();

        assert!(path.is_file());
        assert_eq!(config, NetprobeConfig::default());
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("[scenarios.basic_connectivity.nodes.node1]"));
    }

    #[test]
    fn test_existing_file_is_loaded_not_overwritten() {
        let dir = temp_dir();
        let path = dir.path().join("netprobe.toml");
        fs::write(
            &path,
            r#"
language = "zh-CN"
default_scenario = "lab"

[report]
persist = "journal"

[scenarios.lab]
timeout = 5

[scenarios.lab.nodes.router]
ip_address = "10.0.0.1"
subnet_mask = "255.255.255.0"
"#,
        )
        .unwrap();

        let config = load_or_create(&path).unwrap();
        let (name, scenario) = config.scenario(None).unwrap();

        assert_eq!(name, "lab");
        assert_eq!(scenario.timeout, 5);
        assert_eq!(config.language.as_deref(), Some("zh-CN"));
        assert_eq!(config.report.persist, PersistMode::Journal);
        assert_eq!(config.runtime.docker_bin, "docker");
        assert!(fs::read_to_string(&path).unwrap().contains("router"));
    }

    #[test]
    fn test_broken_file_reports_path() {
        let dir = temp_dir();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "scenarios = [").unwrap();

        let err = load_or_create(&path).unwrap_err();
        assert!(format!("{err:#}").contains("broken.toml"));
    }
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    fn config_error(content: &str) -> ConfigError {
        parse_config(content)
            .unwrap_err()
            .downcast::<ConfigError>()
            .expect("expected a ConfigError")
    }

    #[test]
    fn test_bad_ip_is_rejected() {
        let err = config_error(
            r#"
[scenarios.s.nodes.n1]
ip_address = "172.20.0.300"
subnet_mask = "255.255.0.0"
"#,
        );
        assert_eq!(
            err,
            ConfigError::InvalidAddress {
                scenario: "s".to_string(),
                node: "n1".to_string(),
                field: "ip_address",
                value: "172.20.0.300".to_string(),
            }
        );
    }

    #[test]
    fn test_bad_gateway_is_rejected() {
        let err = config_error(
            r#"
[scenarios.s.nodes.n1]
ip_address = "172.20.0.2"
subnet_mask = "255.255.0.0"
gateway = "router"
"#,
        );
        assert!(matches!(err, ConfigError::InvalidAddress { field: "gateway", .. }));
    }

    #[test]
    fn test_empty_scenario_is_rejected() {
        let err = config_error("[scenarios.empty]\nnodes = {}\n");
        assert_eq!(err, ConfigError::EmptyScenario("empty".to_string()));
    }

    #[test]
    fn test_unknown_default_scenario_is_rejected() {
        let err = config_error(
            r#"
default_scenario = "missing"

[scenarios.s.nodes.n1]
ip_address = "10.0.0.1"
subnet_mask = "255.0.0.0"
"#,
        );
        assert_eq!(err, ConfigError::UnknownDefaultScenario("missing".to_string()));
    }

    #[test]
    fn test_container_template_needs_placeholder() {
        let err = config_error("[runtime]\ncontainer_template = \"fixed-name\"\n");
        assert_eq!(err, ConfigError::BadContainerTemplate("fixed-name".to_string()));
    }

    #[test]
    fn test_scenario_lookup_without_default() {
        let config = parse_config(
            r#"
[scenarios.s.nodes.n1]
ip_address = "10.0.0.1"
subnet_mask = "255.0.0.0"
"#,
        )
        .unwrap();

        assert!(config.scenario(None).is_none());
        assert_eq!(config.scenario(Some("s")).unwrap().0, "s");
        assert!(config.scenario(Some("other")).is_none());
    }
}
