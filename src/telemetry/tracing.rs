use crate::config::schema::LoggingConfig;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub level: Level,
    pub log_file: Option<PathBuf>,
    pub log_to_stderr: bool,
    pub json_format: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            log_file: None,
            log_to_stderr: true,
            json_format: false,
        }
    }
}

impl TracingConfig {
    pub fn from_env(debug: bool) -> Self {
        let level = if debug { Level::DEBUG } else { Level::INFO };
        Self {
            level,
            ..Self::default()
        }
    }

    /// Builds from the `[logging]` section. `debug` wins over the configured level.
    pub fn from_logging(logging: &LoggingConfig, debug: bool) -> Result<Self, TracingError> {
        let level = if debug {
            Level::DEBUG
        } else {
            Level::from_str(logging.level.trim())
                .map_err(|_| TracingError::InvalidLevel(logging.level.clone()))?
        };
        Ok(Self {
            level,
            log_file: logging.file.clone(),
            log_to_stderr: true,
            json_format: logging.json,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    #[error("Failed to open log file {path}: {source}")]
    LogFileOpen { path: PathBuf, source: io::Error },
}

#[derive(Debug)]
pub struct TracingGuard {
    _default_guard: tracing::subscriber::DefaultGuard,
    file: Option<Arc<Mutex<File>>>,
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            if let Ok(mut handle) = file.lock() {
                let _ = handle.flush();
            }
        }
    }
}

struct FileWriter {
    file: Arc<Mutex<File>>,
}

impl io::Write for FileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file mutex poisoned"))?;
        guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file mutex poisoned"))?;
        guard.flush()
    }
}

#[derive(Clone)]
struct FileMakeWriter {
    file: Arc<Mutex<File>>,
}

impl<'a> MakeWriter<'a> for FileMakeWriter {
    type Writer = FileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        FileWriter {
            file: Arc::clone(&self.file),
        }
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn fmt_layer<W>(writer: W, json: bool) -> BoxedLayer
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_level(true)
        .with_timer(tracing_subscriber::fmt::time::SystemTime);
    if json {
        layer.json().boxed()
    } else {
        layer.boxed()
    }
}

/// Installs the subscriber as the thread default until the guard drops.
pub fn init_tracing(config: &TracingConfig) -> Result<TracingGuard, TracingError> {
    let env_filter = resolve_env_filter(config);

    let file = match &config.log_file {
        Some(path) => {
            let open = || -> io::Result<File> {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                File::options().create(true).append(true).open(path)
            };
            let file = open().map_err(|source| TracingError::LogFileOpen {
                path: path.clone(),
                source,
            })?;
            Some(Arc::new(Mutex::new(file)))
        }
        None => None,
    };

    let mut layers: Vec<BoxedLayer> = Vec::new();
    if config.log_to_stderr {
        layers.push(fmt_layer(std::io::stderr, config.json_format));
    }
    if let Some(file) = &file {
        let writer = FileMakeWriter {
            file: Arc::clone(file),
        };
        layers.push(fmt_layer(writer, config.json_format));
    }

    let default_guard = tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .set_default();

    Ok(TracingGuard {
        _default_guard: default_guard,
        file,
    })
}

fn resolve_env_filter(config: &TracingConfig) -> EnvFilter {
    if config.level == Level::DEBUG {
        EnvFilter::new(Level::DEBUG.as_str())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ENV_LOCK, TRACING_LOCK};
    use std::env;

    fn set_env_var(key: &str, value: impl AsRef<std::ffi::OsStr>) {
        unsafe {
            env::set_var(key, value);
        }
    }

    fn remove_env_var(key: &str) {
        unsafe {
            env::remove_var(key);
        }
    }

    #[test]
    fn default_config_is_info_stderr_pretty() {
        let config = TracingConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(config.log_file.is_none());
        assert!(config.log_to_stderr);
        assert!(!config.json_format);
    }

    #[test]
    fn from_logging_parses_level_and_debug_wins() {
        let logging = LoggingConfig {
            level: "warn".to_string(),
            json: true,
            file: None,
        };
        let config = TracingConfig::from_logging(&logging, false).unwrap();
        assert_eq!(config.level, Level::WARN);
        assert!(config.json_format);

        let config = TracingConfig::from_logging(&logging, true).unwrap();
        assert_eq!(config.level, Level::DEBUG);
    }

    #[test]
    fn from_logging_rejects_unknown_level() {
        let logging = LoggingConfig {
            level: "verbose".to_string(),
            ..LoggingConfig::default()
        };
        assert!(matches!(
            TracingConfig::from_logging(&logging, false),
            Err(TracingError::InvalidLevel(_))
        ));
    }

    #[test]
    fn env_filter_uses_rust_log_when_set() {
        let _lock = ENV_LOCK.lock().unwrap();
        set_env_var("RUST_LOG", "warn");
        let filter = resolve_env_filter(&TracingConfig::default());
        assert!(filter.to_string().contains("warn"));
        remove_env_var("RUST_LOG");
    }

    #[test]
    fn debug_level_overrides_rust_log() {
        let _lock = ENV_LOCK.lock().unwrap();
        set_env_var("RUST_LOG", "error");
        let config = TracingConfig {
            level: Level::DEBUG,
            ..TracingConfig::default()
        };
        assert!(resolve_env_filter(&config).to_string().contains("debug"));
        remove_env_var("RUST_LOG");
    }

    #[test]
    fn init_tracing_writes_json_log_entry() {
        let _env = ENV_LOCK.lock().unwrap();
        let _tracing = TRACING_LOCK.lock().unwrap();
        remove_env_var("RUST_LOG");
        let temp = tempfile::tempdir().unwrap();
        let log_path = temp.path().join("logs").join("herald.log");

        let config = TracingConfig {
            level: Level::INFO,
            log_file: Some(log_path.clone()),
            log_to_stderr: false,
            json_format: true,
        };

        let guard = init_tracing(&config).unwrap();
        tracing::info!(target_name = "slack", "telemetry test log");
        drop(guard);

        let contents = std::fs::read_to_string(&log_path).unwrap();
        assert!(contents.contains("telemetry test log"));
        assert!(contents.contains("\"level\""));
        assert!(contents.contains("target_name"));
    }
}
