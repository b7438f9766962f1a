//! Layering behaviour of the console client configuration.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::sync::{Mutex, MutexGuard};

use il2ssd_config::{Config, DEFAULT_PORT, LogFormat};
use once_cell::sync::Lazy;
use ortho_config::OrthoConfig;
use rstest::{fixture, rstest};
use tempfile::TempDir;

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Serialises tests so environment overrides never leak into a concurrent
/// load.
struct Harness {
    temp_dir: TempDir,
    args: Vec<OsString>,
    env_overrides: Vec<(&'static str, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl Harness {
    fn write_config(&mut self, toml: &str) {
        let path = self.temp_dir.path().join("il2ssd.toml");
        fs::write(&path, toml).expect("write configuration");
        self.args.push(OsString::from("--config-path"));
        self.args.push(path.into_os_string());
    }

    fn push_arg(&mut self, arg: &str) {
        self.args.push(OsString::from(arg));
    }

    fn set_env(&mut self, key: &'static str, value: &OsStr) {
        let previous = std::env::var_os(key);
        // Environment mutation is unsafe on edition 2024; restored in Drop.
        unsafe { std::env::set_var(key, value) };
        self.env_overrides.push((key, previous));
    }

    fn load(&self) -> Config {
        Config::load_from_iter(self.args.clone()).expect("configuration loads")
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        while let Some((key, previous)) = self.env_overrides.pop() {
            match previous {
                Some(value) => unsafe { std::env::set_var(key, value) },
                None => unsafe { std::env::remove_var(key) },
            }
        }
    }
}

#[fixture]
fn harness() -> Harness {
    let guard = ENV_MUTEX
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    Harness {
        temp_dir: TempDir::new().expect("create temp dir"),
        args: vec![OsString::from("il2ssd")],
        env_overrides: Vec::new(),
        _guard: guard,
    }
}

#[rstest]
fn file_values_override_defaults(mut harness: Harness) {
    harness.write_config(
        "host = \"10.0.0.5\"\nport = 21004\nremote_path = \"net/dogfight/x.mis\"\nlog_format = \"json\"\n",
    );

    let config = harness.load();

    assert_eq!(config.endpoint(), ("10.0.0.5", 21004));
    assert_eq!(config.remote_path, "net/dogfight/x.mis");
    assert_eq!(config.log_format(), LogFormat::Json);
}

#[rstest]
fn missing_keys_keep_defaults(mut harness: Harness) {
    harness.write_config("host = \"server.example\"\n");

    let config = harness.load();

    assert_eq!(config.port, DEFAULT_PORT);
    assert!(config.remote_mode);
    assert!(config.cycle.is_empty());
}

#[rstest]
fn cli_flags_override_file_values(mut harness: Harness) {
    harness.write_config("port = 21004\n");
    harness.push_arg("--port");
    harness.push_arg("21010");

    let config = harness.load();

    assert_eq!(config.port, 21010);
}

#[rstest]
fn environment_overrides_file_values(mut harness: Harness) {
    harness.write_config("host = \"from-file\"\n");
    harness.set_env("IL2SSD_HOST", OsStr::new("from-env"));

    let config = harness.load();

    assert_eq!(config.host, "from-env");
}
