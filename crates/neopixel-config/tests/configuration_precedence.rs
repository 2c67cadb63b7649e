use std::cell::RefCell;
use std::ffi::OsString;
use std::fs;
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

use neopixel_config::Config;
use ortho_config::OrthoConfig;

const PIXEL_COUNT_ENV: &str = "NEOPIXELD_PIXEL_COUNT";

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct Harness {
    temp_dir: TempDir,
    cli_args: RefCell<Vec<OsString>>,
    previous_env: RefCell<Option<Option<OsString>>>,
    loaded: RefCell<Option<Config>>,
    error: RefCell<Option<String>>,
    _env_lock: MutexGuard<'static, ()>,
}

impl Harness {
    fn new() -> Self {
        let env_lock = ENV_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let temp_dir = match TempDir::new() {
            Ok(dir) => dir,
            Err(error) => panic!("failed to create temporary directory: {error}"),
        };
        Self {
            temp_dir,
            cli_args: RefCell::new(vec![OsString::from("neopixeld")]),
            previous_env: RefCell::new(None),
            loaded: RefCell::new(None),
            error: RefCell::new(None),
            _env_lock: env_lock,
        }
    }

    fn write_config(&self, pixel_count: &str) {
        let path = self.temp_dir.path().join("neopixeld.toml");
        if let Err(error) = fs::write(&path, format!("pixel_count = {pixel_count}\n")) {
            panic!("failed to write configuration: {error}");
        }
        let mut args = self.cli_args.borrow_mut();
        args.push(OsString::from("--config-path"));
        args.push(path.into_os_string());
    }

    fn set_env(&self, value: &str) {
        let previous = std::env::var_os(PIXEL_COUNT_ENV);
        // Environment mutation is serialised through ENV_MUTEX and restored in
        // Drop.
        unsafe { std::env::set_var(PIXEL_COUNT_ENV, value) };
        self.previous_env.borrow_mut().get_or_insert(previous);
    }

    fn load(&self) {
        let args = self.cli_args.borrow().clone();
        match Config::load_from_iter(args) {
            Ok(config) => *self.loaded.borrow_mut() = Some(config),
            Err(error) => *self.error.borrow_mut() = Some(error.to_string()),
        }
    }

    fn config(&self) -> Config {
        if let Some(error) = self.error.borrow().as_ref() {
            panic!("configuration failed to load: {error}");
        }
        match self.loaded.borrow().as_ref() {
            Some(config) => config.clone(),
            None => panic!("configuration was not loaded"),
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        if let Some(previous) = self.previous_env.borrow_mut().take() {
            match previous {
                Some(value) => unsafe { std::env::set_var(PIXEL_COUNT_ENV, value) },
                None => unsafe { std::env::remove_var(PIXEL_COUNT_ENV) },
            }
        }
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[given("a configuration file setting the pixel count to \"{count}\"")]
fn given_configuration_file(harness: &Harness, count: String) {
    harness.write_config(&count);
}

#[given("the environment overrides the pixel count to \"{count}\"")]
fn given_environment_override(harness: &Harness, count: String) {
    harness.set_env(&count);
}

#[when("the configuration is loaded with the flag \"{flag}\" set to \"{value}\"")]
fn when_loaded_with_flag(harness: &Harness, flag: String, value: String) {
    {
        let mut args = harness.cli_args.borrow_mut();
        args.push(OsString::from(flag));
        args.push(OsString::from(value));
    }
    harness.load();
}

#[when("the configuration is loaded")]
fn when_loaded(harness: &Harness) {
    harness.load();
}

#[then("the pixel count resolves to \"{count}\"")]
fn then_pixel_count(harness: &Harness, count: String) {
    let expected: usize = count.parse().expect("numeric pixel count");
    assert_eq!(harness.config().pixel_count(), expected);
}

#[then("the inbound pipe lives in the working directory")]
fn then_inbound_pipe_in_working_dir(harness: &Harness) {
    let paths = harness.config().paths();
    assert_eq!(paths.inbound_pipe().parent(), Some(paths.working_dir()));
}

#[scenario(path = "tests/features/configuration_precedence.feature", index = 0)]
fn cli_flags_override_every_layer(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(path = "tests/features/configuration_precedence.feature", index = 1)]
fn environment_overrides_file(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(path = "tests/features/configuration_precedence.feature", index = 2)]
fn defaults_apply_without_layers(#[from(harness)] harness: Harness) {
    let _ = harness;
}
