use figment::Jail;

use beacon_config::BeaconConfig;

#[test]
fn env_sets_nested_values() {
    Jail::expect_with(|jail| {
        jail.set_env("BEACON_AUTH__JWT_SECRET", "env-secret");
        jail.set_env("BEACON_SERVER__BIND_ADDR", "127.0.0.1:3999");
        jail.set_env("BEACON_SCORING__HEALTH__WINDOW_DAYS", "14");

        let config: BeaconConfig = BeaconConfig::figment().extract()?;
        assert_eq!(config.auth.jwt_secret, "env-secret");
        assert_eq!(config.server.bind_addr, "127.0.0.1:3999");
        assert_eq!(config.scoring.health.window_days, 14);
        Ok(())
    });
}

#[test]
fn env_beats_project_toml() {
    Jail::expect_with(|jail| {
        jail.create_dir(".beacon")?;
        jail.create_file(
            ".beacon/config.toml",
            r#"
[database]
path = "from-toml.db"

[general]
public_base_url = "https://feedback.example.com"
"#,
        )?;
        jail.set_env("BEACON_DATABASE__PATH", "from-env.db");

        let config: BeaconConfig = BeaconConfig::figment().extract()?;
        assert_eq!(config.database.path, "from-env.db");
        assert_eq!(config.general.public_base_url, "https://feedback.example.com");
        Ok(())
    });
}
