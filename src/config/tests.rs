use super::*;
use figment::Jail;
use serde::Serialize;

fn load(custom: Option<&str>) -> figment::error::Result<FanoutConfig> {
    FanoutConfig::load_with_custom_config(custom).map_err(|e| e.to_string().into())
}

fn isolate_home(jail: &mut Jail) {
    let home = jail.directory().to_string_lossy().into_owned();
    jail.set_env("HOME", home);
}

#[test]
fn test_config_loads_defaults() {
    Jail::expect_with(|jail| {
        isolate_home(jail);
        let config = load(None)?;

        let runner = config.runner().unwrap();
        assert_eq!(runner.thread_percentage, 75);
        assert_eq!(runner.max_threads, 0);

        let sleep = config.sleep().unwrap();
        assert_eq!(sleep.tasks, 5);
        assert_eq!(sleep.delay(), Duration::from_secs(1));

        let fetch = config.fetch().unwrap();
        assert_eq!(fetch.urls.len(), 5);
        assert_eq!(fetch.timeout(), Duration::from_secs(10));

        let pipeline = config.pipeline().unwrap();
        assert_eq!(pipeline.files.len(), 3);
        assert_eq!(pipeline.files[0].name, "data1.csv");
        assert_eq!(pipeline.files[0].source, "local_file_1");
        assert!(pipeline.verify);
        Ok(())
    });
}

#[test]
fn test_repo_config_overrides_defaults() {
    Jail::expect_with(|jail| {
        isolate_home(jail);
        jail.create_file(
            "fanout.toml",
            r#"
            [sleep]
            tasks = 3
            "#,
        )?;

        let sleep = load(None)?.sleep().unwrap();
        assert_eq!(sleep.tasks, 3);
        // Untouched keys keep their defaults
        assert_eq!(sleep.delay_ms, 1000);
        Ok(())
    });
}

#[test]
fn test_env_overrides_files() {
    Jail::expect_with(|jail| {
        isolate_home(jail);
        jail.create_file("fanout.yaml", "sleep:\n  delay_ms: 20\n")?;
        jail.set_env("FANOUT_SLEEP__DELAY_MS", 5);
        jail.set_env("FANOUT_RUNNER__MAX_THREADS", 2);

        let config = load(None)?;
        assert_eq!(config.sleep().unwrap().delay_ms, 5);
        assert_eq!(config.runner().unwrap().max_threads, 2);
        Ok(())
    });
}

#[test]
fn test_custom_config_file() {
    Jail::expect_with(|jail| {
        isolate_home(jail);
        jail.create_file("fanout.toml", "[sleep]\ntasks = 9\n")?;
        jail.create_file("custom.json", r#"{"fetch": {"urls": ["http://localhost/a"]}}"#)?;

        let config = load(Some("custom.json"))?;
        assert_eq!(config.fetch().unwrap().urls, vec!["http://localhost/a"]);
        // Repo config is skipped when a custom file is given
        assert_eq!(config.sleep().unwrap().tasks, 5);
        Ok(())
    });
}

#[test]
fn test_missing_custom_config_is_an_error() {
    Jail::expect_with(|jail| {
        isolate_home(jail);
        let result = FanoutConfig::load_with_custom_config(Some("non_existent.toml"));
        assert!(result.is_err());
        Ok(())
    });
}

#[test]
fn test_cli_overrides_skip_absent_fields() {
    #[derive(Serialize)]
    struct SleepOverrides {
        #[serde(skip_serializing_if = "Option::is_none")]
        tasks: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        delay_ms: Option<u64>,
    }

    Jail::expect_with(|jail| {
        isolate_home(jail);
        let config = load(None)?.with_overrides(
            "sleep",
            SleepOverrides {
                tasks: Some(2),
                delay_ms: None,
            },
        );
        let sleep = config.sleep().unwrap();
        assert_eq!(sleep.tasks, 2);
        assert_eq!(sleep.delay_ms, 1000);
        Ok(())
    });
}

#[test]
fn test_invalid_values_are_rejected() {
    Jail::expect_with(|jail| {
        isolate_home(jail);
        jail.set_env("FANOUT_RUNNER__THREAD_PERCENTAGE", 0);
        jail.set_env("FANOUT_FETCH__TIMEOUT_SECS", 0);

        let config = load(None)?;
        assert!(config.runner().is_err());
        assert!(config.fetch().is_err());
        Ok(())
    });
}

#[test]
fn test_full_config_has_every_section() {
    Jail::expect_with(|jail| {
        isolate_home(jail);
        let full = load(None)?.get_full_config().unwrap();
        for section in ["runner", "sleep", "fetch", "pipeline"] {
            assert!(full.get(section).is_some(), "missing [{section}]");
        }
        Ok(())
    });
}
