use clap::Parser;
use clap::Subcommand;

use joyhub_input::DEFAULT_AXIS_THRESHOLD_DIVISOR;

#[derive(Debug, Subcommand, PartialEq)]
pub(crate) enum Command {
    /// Print input events until interrupted.
    Watch {
        /// Also print raw axis, hat and button samples
        #[clap(short, long)]
        raw: bool,
    },
    /// List connected devices.
    List {
        /// Time to wait for devices to be enumerated
        #[clap(long, default_value_t = 500)]
        settle_ms: u64,
    },
    /// Rumble every connected game controller.
    Rumble {
        /// Low frequency motor strength
        #[clap(long, default_value_t = 0xffff)]
        low: u16,
        /// High frequency motor strength
        #[clap(long, default_value_t = 0xffff)]
        high: u16,
        /// How long to rumble
        #[clap(short, long, default_value_t = 500)]
        duration_ms: u64,
        /// Time to wait for devices to be enumerated
        #[clap(long, default_value_t = 500)]
        settle_ms: u64,
    },
}

/// Hot-plug aware joystick and game controller monitor.
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub(crate) struct Cli {
    /// Turn debugging information on
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Axis dead zone divisor: an axis is pressed past 1/N of its travel
    #[arg(long, default_value_t = DEFAULT_AXIS_THRESHOLD_DIVISOR, value_parser = clap::value_parser!(u16).range(1..))]
    pub axis_divisor: u16,

    /// The command to run
    #[clap(subcommand)]
    pub command: Command,
}
