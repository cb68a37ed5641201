//! Environment overrides of the layered loader
//!
//! Environment variables are process-wide, so this binary holds a single test.

use std::io::Write;
use zxn_config::{DriverConfig, ENV_PREFIX};
use zxn_hal::{PsgCore, StereoMode};

#[test]
fn test_env_overrides_file_and_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(
        file,
        "[sound]\ncore = \"ay\"\nstereo = \"abc\"\n\n[psg]\nclock_hz = 2000000\n"
    )
    .unwrap();

    let clock = format!("{ENV_PREFIX}__PSG__CLOCK_HZ");
    let stereo = format!("{ENV_PREFIX}__SOUND__STEREO");
    // SAFETY: no other thread in this binary touches the environment
    unsafe {
        std::env::set_var(&clock, "1750000");
        std::env::set_var(&stereo, "acb");
    }

    let layered = DriverConfig::load_layered(Some(file.path()));
    let without_file = DriverConfig::load_layered(None);

    unsafe {
        std::env::remove_var(&clock);
        std::env::remove_var(&stereo);
    }

    let config = layered.unwrap();
    assert_eq!(config.psg.clock_hz, 1_750_000);
    assert_eq!(config.sound.stereo, StereoMode::Acb);
    assert_eq!(config.sound.core, PsgCore::Ay);

    let config = without_file.unwrap();
    assert_eq!(config.psg.clock_hz, 1_750_000);
    assert_eq!(config.sound.stereo, StereoMode::Acb);
    assert_eq!(config.sound.core, PsgCore::default());

    let config = DriverConfig::load_layered(None).unwrap();
    assert_eq!(config, DriverConfig::default());
}
