//! ZX Spectrum Next peripheral monitor
//!
//! Opens both joysticks, the mouse, the keyboard and PSG 0 on a simulated bus,
//! applies the driver configuration and reports every device once per frame.
//!
//! Usage:
//!   zxn-monitor [--config <path>] [--frames <n>] [--json] [--demo]

mod demo;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use zxn_config::DriverConfig;
use zxn_hal::mock::MockBus;
use zxn_hal::{Channel, JoystickState, KeyEvent, KeyboardState, MouseState, PsgState, ScanCode};

#[derive(Debug, Parser)]
#[command(name = "zxn-monitor", version, about)]
struct Args {
    /// Configuration file; overrides may follow as ZXN__SECTION__KEY variables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of frames to poll
    #[arg(short, long, default_value_t = 50)]
    frames: u32,

    /// Delay between frames in milliseconds
    #[arg(long, default_value_t = 20)]
    interval: u64,

    /// Print one JSON object per frame
    #[arg(long)]
    json: bool,

    /// Script joystick, mouse and keyboard input and play a chord
    #[arg(long)]
    demo: bool,
}

/// Everything the monitor polls
struct Devices {
    joysticks: [JoystickState; 2],
    mouse: MouseState,
    keyboard: KeyboardState,
    psg: PsgState,
}

impl Devices {
    fn open(config: &DriverConfig) -> Result<Self> {
        Ok(Self {
            joysticks: [JoystickState::open(0), JoystickState::open(1)],
            mouse: MouseState::open(0),
            keyboard: KeyboardState::open(0),
            psg: config.open_psg(0).context("Failed to open PSG 0")?,
        })
    }

    fn poll(&mut self, bus: &mut MockBus) -> Result<()> {
        for joy in self.joysticks.iter_mut() {
            joy.read(bus)
                .with_context(|| format!("Failed to read joystick {}", joy.index))?;
        }
        self.mouse.read(bus).context("Failed to read mouse")?;
        self.keyboard.read(bus).context("Failed to read keyboard")?;
        Ok(())
    }

    fn close(&mut self, bus: &mut MockBus) -> Result<()> {
        self.psg.silence(bus)?;
        self.psg.close()?;
        self.keyboard.close()?;
        self.mouse.close()?;
        for joy in self.joysticks.iter_mut() {
            joy.close()?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct FrameReport<'a> {
    frame: u32,
    joysticks: &'a [JoystickState; 2],
    mouse: &'a MouseState,
    held: Vec<&'static str>,
    events: Vec<KeyEvent>,
    tone_periods: [u16; 3],
}

impl<'a> FrameReport<'a> {
    fn new(frame: u32, devices: &'a Devices, tone_periods: [u16; 3]) -> Self {
        Self {
            frame,
            joysticks: &devices.joysticks,
            mouse: &devices.mouse,
            held: devices.keyboard.held().map(ScanCode::name).collect(),
            events: devices.keyboard.events().collect(),
            tone_periods,
        }
    }

    fn to_line(&self) -> String {
        let joy: Vec<String> = self
            .joysticks
            .iter()
            .map(|j| {
                format!(
                    "joy{}={}/{}",
                    j.index,
                    names(j.dir.iter_names()),
                    names(j.buttons.iter_names())
                )
            })
            .collect();
        format!(
            "frame {:>4}: {} mouse=({},{}) wheel={} btn={} keys=[{}] tone={:?}",
            self.frame,
            joy.join(" "),
            self.mouse.x,
            self.mouse.y,
            self.mouse.wheel,
            names(self.mouse.buttons.iter_names()),
            self.held.join(","),
            self.tone_periods
        )
    }
}

fn names<T>(flags: impl Iterator<Item = (&'static str, T)>) -> String {
    let names: Vec<&str> = flags.map(|(name, _)| name).collect();
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join("|")
    }
}

fn main() -> Result<()> {
    setup_logging();
    let args = Args::parse();

    info!("zxn-monitor {} (drivers {})", env!("CARGO_PKG_VERSION"), zxn_hal::version());

    let config = match &args.config {
        Some(path) => DriverConfig::load_layered(Some(path.as_path()))
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => DriverConfig::load_default().context("Failed to load configuration")?,
    };

    let mut bus = MockBus::new();
    let controller = bus.controller();
    config
        .apply(&mut bus)
        .context("Failed to apply driver configuration")?;
    debug!("Active settings: {:?}", config.capture(&mut bus)?);

    let mut devices = Devices::open(&config)?;
    if args.demo {
        demo::play_chord(&mut bus, &mut devices.psg, &config.calculator())?;
    }

    for frame in 0..args.frames {
        if args.demo {
            demo::script_frame(&controller, frame);
        }
        devices.poll(&mut bus)?;

        let mut tone_periods = [0u16; 3];
        for (slot, channel) in tone_periods.iter_mut().zip(Channel::all()) {
            *slot = devices.psg.tone_period(&mut bus, *channel);
        }

        let report = FrameReport::new(frame, &devices, tone_periods);
        if args.json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            println!("{}", report.to_line());
        }

        if args.interval > 0 {
            std::thread::sleep(Duration::from_millis(args.interval));
        }
    }

    devices.close(&mut bus)?;
    info!("Polled {} frames", args.frames);
    Ok(())
}

/// Setup logging
fn setup_logging() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["zxn-monitor"]);
        assert_eq!(args.frames, 50);
        assert!(!args.json && !args.demo);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_frame_report_line() {
        let mut bus = MockBus::new();
        let controller = bus.controller();
        let mut devices = Devices::open(&DriverConfig::default()).unwrap();

        demo::script_frame(&controller, 0);
        devices.poll(&mut bus).unwrap();

        let line = FrameReport::new(0, &devices, [0; 3]).to_line();
        assert!(line.starts_with("frame    0: joy0=UP/A joy1=-/-"));
        assert!(line.contains("mouse=(3,-2) wheel=1 btn=LEFT"));
        assert!(line.contains("keys=[caps shift]"));
    }

    #[test]
    fn test_frame_report_json() {
        let mut bus = MockBus::new();
        let mut devices = Devices::open(&DriverConfig::default()).unwrap();
        devices.poll(&mut bus).unwrap();

        let json = serde_json::to_value(FrameReport::new(7, &devices, [1, 2, 3])).unwrap();
        assert_eq!(json["frame"], 7);
        assert_eq!(json["tone_periods"][2], 3);
        assert_eq!(json["mouse"]["x"], 0);
        assert!(json["held"].as_array().unwrap().is_empty());
    }
}
