use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "retro-pad-emulator",
    version,
    about = "Drive a virtual Xbox 360 gamepad with keyboard and mouse"
)]
pub struct Args {
    /// Keyboard evdev node (e.g. /dev/input/event3); auto-detected if omitted
    #[arg(short, long)]
    pub keyboard: Option<PathBuf>,

    /// Mouse evdev node; auto-detected if omitted
    #[arg(short, long)]
    pub mouse: Option<PathBuf>,

    /// Config file (default: <config dir>/retro-pad-emulator/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Increases verbosity level (-v, -vv)
    #[arg(short, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Start with gamepad emulation on
    #[arg(short, long)]
    pub active: bool,

    /// Write the effective tuning back to the config file
    #[arg(long)]
    pub save_config: bool,

    /// Print the input devices and exit
    #[arg(long)]
    pub list_devices: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["retro-pad-emulator"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(args.keyboard.is_none());
        assert!(!args.active);
    }

    #[test]
    fn flags() {
        let args = Args::try_parse_from([
            "retro-pad-emulator",
            "-vv",
            "--keyboard",
            "/dev/input/event3",
            "--active",
            "--save-config",
        ])
        .unwrap();
        assert_eq!(args.verbose, 2);
        assert_eq!(args.keyboard, Some(PathBuf::from("/dev/input/event3")));
        assert!(args.active);
        assert!(args.save_config);
        assert!(!args.list_devices);
    }
}
