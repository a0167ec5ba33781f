//! Application configuration, see [`Options`].

use std::path::{Path, PathBuf};

use eyre::Context;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

use crate::gis::Position;

/// Global options for the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Options {
    /// Directory where application data is stored (saved coordinates, map, logs).
    ///
    /// Default is `data`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// File the GeoJSON map is written to, relative to `data_dir`.
    ///
    /// Default is `map.geojson`.
    #[serde(default = "default_map_file")]
    pub map_file: PathBuf,
    /// Position reported when locating this device. Can also be specified by setting the
    /// environment variable `DEVICE_POSITION` to `latitude,longitude`.
    ///
    /// Default is `None`, locating fails with "location is not supported".
    #[serde(default)]
    pub device_position: Option<Position>,
    /// Accuracy (in meters) reported along with `device_position`.
    #[serde(default)]
    pub device_accuracy: Option<f64>,
    /// Simulated time (in milliseconds) taken to acquire a device position.
    ///
    /// Default is `0`.
    #[serde(default)]
    pub device_latency_ms: u64,
}

fn default_data_dir() -> PathBuf {
    "data".into()
}

fn default_map_file() -> PathBuf {
    "map.geojson".into()
}

impl Default for Options {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_file: default_map_file(),
            device_position: None,
            device_accuracy: None,
            device_latency_ms: 0,
        }
    }
}

/// Messages produced while loading options, before logging is set up.
#[derive(Debug, Default)]
pub struct InitLogs(Vec<String>);

impl InitLogs {
    fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    /// Emit the messages using `tracing`, once logging is available.
    pub fn present(&self) {
        for message in &self.0 {
            tracing::info!("{}", message);
        }
    }

    /// Print the messages to stderr, when logging could not be set up.
    pub fn print(&self) {
        for message in &self.0 {
            eprintln!("{}", message);
        }
    }
}

/// Result of [`Options::initialize()`].
pub struct OptionsInit {
    /// The loaded options, or why they could not be loaded.
    pub result: eyre::Result<Options>,
    /// Messages to show once it is known whether logging could be set up.
    pub logs: InitLogs,
}

impl Options {
    /// Path of the GeoJSON map file.
    pub fn map_path(&self) -> PathBuf {
        self.data_dir.join(&self.map_file)
    }

    /// Initialize the options using the `OPTIONS` environment variable, otherwise load from file
    /// `options.ron` if it exists, otherwise use the defaults. If `OPTIONS` contains a file path,
    /// it will load the options from that path, if `OPTIONS` contains a RON definition then it
    /// will load the options from the string contained in the variable.
    pub async fn initialize() -> OptionsInit {
        let mut logs = InitLogs::default();
        let result = Self::initialize_impl(&mut logs).await;
        OptionsInit { result, logs }
    }

    async fn initialize_impl(logs: &mut InitLogs) -> eyre::Result<Self> {
        let mut options: Options = match std::env::var("OPTIONS") {
            Ok(options) => match ron::from_str(&options) {
                Ok(options) => {
                    logs.push("Options loaded from `OPTIONS` environment variable");
                    options
                }
                Err(error) => {
                    let path = PathBuf::from(options);
                    if path.is_file() {
                        let options = Self::read_file(&path).await?;
                        logs.push(format!(
                            "Options loaded from file specified in `OPTIONS` environment variable: {:?}",
                            path
                        ));
                        options
                    } else {
                        return Err(error).wrap_err(
                            "Error deserializing options from `OPTIONS` environment variable \
                            string, or you have specified a file path which does not exist",
                        );
                    }
                }
            },
            Err(std::env::VarError::NotPresent) => {
                let path = Path::new("options.ron");
                if path.is_file() {
                    let options = Self::read_file(path).await?;
                    logs.push(format!("Options loaded from default file: {:?}", path));
                    options
                } else {
                    logs.push("No options file found, using default options");
                    Options::default()
                }
            }
            Err(error) => {
                return Err(error).wrap_err("Error reading `OPTIONS` environment variable")
            }
        };

        match std::env::var("DEVICE_POSITION") {
            Ok(position) => {
                options.device_position = Some(
                    position
                        .parse::<Position>()
                        .wrap_err("Error parsing `DEVICE_POSITION` environment variable")?,
                );
                logs.push("Device position loaded from `DEVICE_POSITION` environment variable");
            }
            Err(std::env::VarError::NotPresent) => {}
            Err(error) => {
                return Err(error).wrap_err("Error reading `DEVICE_POSITION` environment variable")
            }
        }

        let options_str = ron::ser::to_string_pretty(&options, PrettyConfig::default())?;
        logs.push(format!("Options{}", options_str));

        Ok(options)
    }

    async fn read_file(path: &Path) -> eyre::Result<Self> {
        let options_str = tokio::fs::read_to_string(path)
            .await
            .wrap_err_with(|| format!("Error reading options file: {:?}", path))?;
        ron::from_str(&options_str)
            .wrap_err_with(|| format!("Error deserializing options file: {:?}", path))
    }
}
