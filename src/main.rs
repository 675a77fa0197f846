use clap::Parser;
use evdev::Device;
use retro_pad_emulator::capture::{self, DeviceClass, EvdevCapture};
use retro_pad_emulator::cli::Args;
use retro_pad_emulator::config::{ConfigStore, KEY_START_ACTIVE, SharedTuning, Tuning, default_config_path};
use retro_pad_emulator::controller_state::ControllerStateReducer;
use retro_pad_emulator::devices::gamepad::VirtualGamepad;
use retro_pad_emulator::error::{CaptureError, InitError};
use retro_pad_emulator::hotkey::{HotkeyWatcher, POLL_INTERVAL};
use retro_pad_emulator::input_mode::{InputMode, InputModeSwitch};
use retro_pad_emulator::logger::{Logger, Verbosity};
use retro_pad_emulator::mapping::MappingTable;
use retro_pad_emulator::pipeline::Pipeline;
use retro_pad_emulator::translator::TranslationEngine;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

type EmulatorPipeline = Pipeline<EvdevCapture, VirtualGamepad>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let logger = Arc::new(Logger::init(Verbosity::from_u8(args.verbose))?);

    if args.list_devices {
        for device in capture::list_devices() {
            println!("{}\t{}\t{}", device.path.display(), device.class, device.name);
        }
        return Ok(());
    }

    info!("🚀 Starting Retro Pad Emulator (verbosity {:?})...", logger.verbosity());

    let (mut pipeline, watcher) = match init(&args, logger.clone()).await {
        Ok(parts) => parts,
        Err(e) => {
            error!("{}", e);
            logger.shutdown();
            return Err(e.into());
        }
    };

    info!("✓ Ready, press the toggle key to switch between mouse+keyboard and gamepad");

    let outcome = tokio::select! {
        result = pipeline.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down Retro Pad Emulator...");
            Ok(())
        }
    };

    watcher.abort();
    // Releases the grab and destroys the virtual devices
    drop(pipeline);

    if let Err(e) = &outcome {
        error!("Processing loop stopped: {}", e);
    }
    logger.shutdown();
    outcome.map_err(Into::into)
}

async fn init(args: &Args, logger: Arc<Logger>) -> Result<(EmulatorPipeline, JoinHandle<()>), InitError> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let mut store = ConfigStore::load(config_path);
    let tuning = Tuning::from_store(&store);

    if args.save_config {
        tuning.write_to(&mut store);
        store.save()?;
    }

    let mut mappings = MappingTable::default();
    if let Some(profile) = store.mapping_profile() {
        match mappings.reconfigure(profile) {
            Ok(()) => info!("Mapping profile loaded from {}", store.path().display()),
            Err(e) => warn!("Invalid mapping profile, keeping defaults: {}", e),
        }
    }

    let keyboard = device_path(args.keyboard.clone(), DeviceClass::Keyboard)?;
    let mouse = device_path(args.mouse.clone(), DeviceClass::Mouse)?;

    let gamepad = VirtualGamepad::create().map_err(InitError::Controller)?;
    let mut reducer = ControllerStateReducer::new(gamepad);
    if let Err(e) = reducer.submit() {
        warn!("Initial neutral report failed: {}", e);
    }
    info!("✓ Virtual devices created");

    let capture = EvdevCapture::open(&keyboard, &mouse).await?;

    // Second handle without a grab, only used to query key state
    let key_source = Device::open(&keyboard).map_err(CaptureError::from)?;
    let start_active = args.active || store.get_bool(KEY_START_ACTIVE, false);
    let switch = InputModeSwitch::new(InputMode::from_active(start_active));
    let watcher = HotkeyWatcher::new(key_source, tuning.toggle_key, switch.clone());
    let watcher = tokio::spawn(async move {
        if let Err(e) = watcher.run(POLL_INTERVAL).await {
            error!("Toggle key watcher stopped: {}", e);
        }
    });

    let engine = TranslationEngine::new(mappings, SharedTuning::new(&tuning), tuning.toggle_key);
    let pipeline = Pipeline::new(capture, engine, reducer, switch, logger);
    Ok((pipeline, watcher))
}

fn device_path(given: Option<PathBuf>, class: DeviceClass) -> Result<PathBuf, CaptureError> {
    match given {
        Some(path) => Ok(path),
        None => capture::discover(class),
    }
}
