//! Integration tests for TOML configuration loading.
//!
//! Uses `figment::Jail` for sandboxed files and env vars.

use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use pretty_assertions::assert_eq;

use beacon_config::BeaconConfig;

fn from_toml(file: &str) -> Result<BeaconConfig, figment::Error> {
    Figment::from(Serialized::defaults(BeaconConfig::default()))
        .merge(Toml::file(file))
        .extract()
}

#[test]
fn loads_server_and_database_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[server]
bind_addr = "0.0.0.0:9000"
allowed_origins = ["https://dashboard.example.com"]
request_timeout_secs = 10

[database]
path = "/var/lib/beacon/beacon.db"
"#,
        )?;

        let config = from_toml("config.toml")?;
        assert_eq!(config.server.bind_addr, "0.0.0.0:9000");
        assert_eq!(
            config.server.allowed_origins,
            vec!["https://dashboard.example.com".to_string()]
        );
        assert_eq!(config.server.request_timeout_secs, 10);
        assert_eq!(config.database.path, "/var/lib/beacon/beacon.db");
        assert!(!config.server.is_permissive_cors());
        Ok(())
    });
}

#[test]
fn loads_auth_and_analysis_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[auth]
jwt_secret = "toml-secret"
issuer = "https://auth.example.com"
audience = "authenticated"

[analysis]
endpoint = "https://ai.example.com/analyze"
api_key = "ai-key"
model = "fast"
"#,
        )?;

        let config = from_toml("config.toml")?;
        assert!(config.auth.is_configured());
        assert_eq!(config.auth.issuer, "https://auth.example.com");
        assert_eq!(config.auth.audience, "authenticated");
        assert_eq!(config.auth.leeway_secs, 30);
        assert!(config.analysis.is_configured());
        assert_eq!(config.analysis.model.as_deref(), Some("fast"));
        assert_eq!(config.analysis.timeout_secs, 20);
        Ok(())
    });
}

#[test]
fn partial_scoring_override_keeps_other_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r"
[scoring.alignment]
keyword_scale = 40.0

[scoring.recommendation]
high = 80
",
        )?;

        let config = from_toml("config.toml")?;
        assert!((config.scoring.alignment.keyword_scale - 40.0).abs() < f64::EPSILON);
        assert!((config.scoring.alignment.baseline - 50.0).abs() < f64::EPSILON);
        assert_eq!(config.scoring.recommendation.high, 80);
        assert_eq!(config.scoring.recommendation.moderate, 50);
        assert_eq!(config.scoring.health.window_days, 30);
        assert!(config.validate().is_ok());
        Ok(())
    });
}

#[test]
fn project_dir_config_is_picked_up() {
    Jail::expect_with(|jail| {
        jail.create_dir("custom")?;
        jail.create_file(
            "custom/config.toml",
            r"
[general]
default_limit = 5
",
        )?;

        let config: BeaconConfig =
            BeaconConfig::figment_with_project_dir(std::path::Path::new("custom")).extract()?;
        assert_eq!(config.general.default_limit, 5);
        Ok(())
    });
}

#[test]
fn invalid_scoring_values_fail_validation() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r"
[scoring.recommendation]
high = 40
moderate = 60
",
        )?;

        let config = from_toml("config.toml")?;
        assert!(config.validate().is_err());
        Ok(())
    });
}
