//! Driver configuration for the ZX Spectrum Next HAL
//!
//! Machine-wide sound settings, mouse defaults and PSG options kept in a TOML
//! file and applied to a bus in one go.
//!
//! ```toml
//! [sound]
//! core = "ay"
//! mode = "multiple"
//! stereo = "abc"
//! mono = [false, false, false]
//!
//! [mouse]
//! sensitivity = "default"
//! button_swap = false
//!
//! [psg]
//! clock_hz = 1773447
//! readback = "latch"
//! ```

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zxn_hal::period::PSG_CLOCK_HZ;
use zxn_hal::psg::MAX_PSG;
use zxn_hal::{
    DrvError, IoBus, MouseSensitivity, PeriodCalculator, PsgCore, PsgMode, PsgState, Readback,
    SoundConfig, StereoMode, mouse,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Layered configuration error: {0}")]
    Layered(#[from] config::ConfigError),

    #[error("Driver error: {0}")]
    Driver(#[from] DrvError),
}

/// Standard configuration paths
pub const CONFIG_DIR: &str = "/etc/zxn-drv";
pub const USER_CONFIG_SUBDIR: &str = ".config/zxn-drv";
pub const CONFIG_FILE: &str = "config.toml";
/// Prefix of environment overrides, e.g. `ZXN__PSG__CLOCK_HZ=1750000`
pub const ENV_PREFIX: &str = "ZXN";

/// Per-user configuration file under `$HOME`
pub fn user_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(USER_CONFIG_SUBDIR)
            .join(CONFIG_FILE)
    })
}

/// System-wide configuration file
pub fn system_config_path() -> PathBuf {
    Path::new(CONFIG_DIR).join(CONFIG_FILE)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundSettings {
    #[serde(default)]
    pub core: PsgCore,
    #[serde(default)]
    pub mode: PsgMode,
    #[serde(default)]
    pub stereo: StereoMode,
    /// Mono output per PSG
    #[serde(default)]
    pub mono: [bool; MAX_PSG as usize],
}

impl SoundSettings {
    /// Machine-wide part of the settings
    pub fn sound_config(&self) -> SoundConfig {
        SoundConfig {
            core: self.core,
            mode: self.mode,
            stereo: self.stereo,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseSettings {
    #[serde(default)]
    pub sensitivity: MouseSensitivity,
    #[serde(default)]
    pub button_swap: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PsgSettings {
    /// PSG input clock [Hz]
    #[serde(default = "default_clock_hz")]
    pub clock_hz: u32,
    #[serde(default)]
    pub readback: Readback,
}

fn default_clock_hz() -> u32 {
    PSG_CLOCK_HZ
}

impl Default for PsgSettings {
    fn default() -> Self {
        Self {
            clock_hz: default_clock_hz(),
            readback: Readback::default(),
        }
    }
}

/// Complete driver configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default)]
    pub sound: SoundSettings,

    #[serde(default)]
    pub mouse: MouseSettings,

    #[serde(default)]
    pub psg: PsgSettings,
}

impl DriverConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations
    ///
    /// The user file is laid over the system file key by key.
    pub fn load_default() -> Result<Self, ConfigError> {
        let paths: Vec<PathBuf> = std::iter::once(system_config_path())
            .chain(user_config_path())
            .filter(|p| p.exists())
            .collect();

        if paths.is_empty() {
            tracing::warn!("No configuration file found, using defaults");
            return Ok(Self::default());
        }
        Self::load_merged(&paths)
    }

    /// Load several files, each overriding the keys it sets in the ones before
    pub fn load_merged<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ConfigError> {
        let mut merged = toml::Value::Table(toml::Table::new());
        for path in paths {
            let path = path.as_ref();
            let contents = std::fs::read_to_string(path)?;
            merge_toml(&mut merged, toml::from_str(&contents)?);
            tracing::debug!("Merged configuration from {}", path.display());
        }

        let config: Self = merged.try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Load a file (optional) with `ZXN__SECTION__KEY` environment overrides on top
    pub fn load_layered(path: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults = toml::to_string(&Self::default())?;
        let mut builder =
            Config::builder().add_source(File::from_str(&defaults, FileFormat::Toml));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        let config: Self = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;
        tracing::info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject settings no driver can use
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.psg.clock_hz == 0 {
            return Err(ConfigError::Invalid("psg.clock_hz must not be 0".into()));
        }
        Ok(())
    }

    /// Period calculator for the configured PSG clock
    pub fn calculator(&self) -> PeriodCalculator {
        PeriodCalculator::new(self.psg.clock_hz)
    }

    /// Open a PSG with the configured readback mode
    pub fn open_psg(&self, index: u8) -> Result<PsgState, ConfigError> {
        Ok(PsgState::open(index)?.with_readback(self.psg.readback))
    }

    /// Write sound, mono and mouse settings to the machine
    pub fn apply<B: IoBus>(&self, bus: &mut B) -> Result<(), ConfigError> {
        self.validate()?;
        self.sound.sound_config().apply(bus);
        for (index, mono) in self.sound.mono.iter().enumerate() {
            PsgState::open(index as u8)?.set_mono_mode(bus, *mono)?;
        }
        mouse::set_sensitivity(bus, self.mouse.sensitivity);
        mouse::set_button_swap(bus, self.mouse.button_swap);
        tracing::debug!("Driver configuration applied");
        Ok(())
    }

    /// Read the machine settings back; PSG options are not stored on the machine
    pub fn capture<B: IoBus>(&self, bus: &mut B) -> Result<Self, ConfigError> {
        let sound = SoundConfig::read(bus);
        let mut mono = [false; MAX_PSG as usize];
        for (index, slot) in mono.iter_mut().enumerate() {
            *slot = PsgState::open(index as u8)?.mono_mode(bus);
        }

        Ok(Self {
            sound: SoundSettings {
                core: sound.core,
                mode: sound.mode,
                stereo: sound.stereo,
                mono,
            },
            mouse: MouseSettings {
                sensitivity: mouse::sensitivity(bus),
                button_swap: mouse::button_swap(bus),
            },
            psg: self.psg,
        })
    }
}

/// Helper function to merge TOML values
pub fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                if let Some(base_value) = base_table.get_mut(&key) {
                    merge_toml(base_value, value);
                } else {
                    base_table.insert(key, value);
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
