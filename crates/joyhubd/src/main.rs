mod cli;
mod logging;

use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use crossbeam_channel::{select, unbounded};
use thiserror::Error;

use joyhub_input::{
    AxisDirection, Broadcaster, DeviceInfo, HatDirection, InputEvent, InputManager, Settings,
};

use crate::cli::{Cli, Command};

/// Extra wait after a rumble so the worker's own stop fires before shutdown.
const RUMBLE_GRACE: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
enum AppError {
    #[error("input manager error: {0}")]
    Input(#[from] joyhub_input::Error),
    #[error("failed to set Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if logging::setup(cli.verbose, cli.no_color).is_err() {
        return ExitCode::FAILURE;
    }

    let settings = Settings::default().with_axis_threshold_divisor(cli.axis_divisor);
    let result = match cli.command {
        Command::Watch { raw } => watch(settings, raw),
        Command::List { settle_ms } => list(settings, Duration::from_millis(settle_ms)),
        Command::Rumble {
            low,
            high,
            duration_ms,
            settle_ms,
        } => rumble(
            settings,
            (low, high),
            Duration::from_millis(duration_ms),
            Duration::from_millis(settle_ms),
        ),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn watch(settings: Settings, raw: bool) -> Result<(), AppError> {
    // Handle Ctrl+C to exit cleanly
    let (stop_tx, stop_rx) = unbounded::<()>();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })?;

    let broadcaster = Broadcaster::new();
    let events = broadcaster.subscribe();
    let manager = InputManager::with_broadcaster(settings, broadcaster)?;
    report!("joyhubd started. Listening for device events.");

    loop {
        select! {
            recv(stop_rx) -> _ => {
                break;
            }
            recv(events) -> msg => {
                match msg {
                    Ok(event) if raw || !event.is_raw() => {
                        report!("{}", describe(&event));
                    }
                    Ok(_) => {}
                    Err(err) => {
                        report_error!("event channel closed: {err}");
                        break;
                    }
                }
            }
        }
    }

    manager.shutdown();
    report!("joyhubd stopped.");
    Ok(())
}

fn list(settings: Settings, settle: Duration) -> Result<(), AppError> {
    let manager = InputManager::with_settings(settings)?;
    thread::sleep(settle);
    let devices = manager.devices()?;
    manager.shutdown();

    if devices.is_empty() {
        report!("no devices connected");
    }
    for device in &devices {
        report!("{}", describe_device(device));
    }
    Ok(())
}

fn rumble(
    settings: Settings,
    (low, high): (u16, u16),
    duration: Duration,
    settle: Duration,
) -> Result<(), AppError> {
    let manager = InputManager::with_settings(settings)?;
    thread::sleep(settle);

    let controllers = manager.controllers()?;
    if controllers.is_empty() {
        report_warn!("no game controllers connected");
        manager.shutdown();
        return Ok(());
    }
    for controller in &controllers {
        report_debug!("rumbling {}", describe_device(controller));
    }

    manager.rumble(low, high, duration)?;
    thread::sleep(duration + RUMBLE_GRACE);
    manager.shutdown();
    report!("rumbled {} controller(s) for {duration:?}", controllers.len());
    Ok(())
}

fn describe_device(device: &DeviceInfo) -> String {
    format!(
        "slot {}: {} ({} API, {} axes, {} buttons, {} hats, instance {})",
        device.slot,
        device.name.bold(),
        device.kind.api_name(),
        device.axes,
        device.buttons,
        device.hats,
        device.instance_id
    )
}

fn phase(pressed: bool) -> colored::ColoredString {
    if pressed {
        "pressed".green()
    } else {
        "released".dimmed()
    }
}

fn axis_sign(direction: AxisDirection) -> &'static str {
    match direction {
        AxisDirection::Negative => "-",
        AxisDirection::Positive => "+",
    }
}

fn hat_name(direction: HatDirection) -> &'static str {
    match direction {
        HatDirection::Up => "up",
        HatDirection::Down => "down",
        HatDirection::Left => "left",
        HatDirection::Right => "right",
    }
}

fn describe(event: &InputEvent) -> String {
    match *event {
        InputEvent::Attached { index, slot: Some(slot) } => {
            format!("{} device {index} as slot {slot}", "attached".bright_green())
        }
        InputEvent::Attached { index, slot: None } => {
            format!("{} device {index} (not opened)", "attached".bright_yellow())
        }
        InputEvent::Detached {
            slot: Some(slot), ..
        } => format!("{} slot {slot}", "detached".bright_yellow()),
        InputEvent::Detached {
            instance_id,
            slot: None,
        } => format!("{} unknown instance {instance_id}", "detached".dimmed()),
        InputEvent::DiscreteAxis {
            slot,
            axis,
            direction,
            pressed,
        } => format!(
            "slot {slot}: axis {axis}{} {}",
            axis_sign(direction),
            phase(pressed)
        ),
        InputEvent::DiscreteHat {
            slot,
            hat,
            direction,
            pressed,
        } => format!(
            "slot {slot}: hat {hat} {} {}",
            hat_name(direction),
            phase(pressed)
        ),
        InputEvent::RawAxis { slot, axis, sample } => {
            format!("{}", format!("slot {slot}: axis {axis} = {sample}").dimmed())
        }
        InputEvent::RawHat { slot, hat, bits } => {
            format!("{}", format!("slot {slot}: hat {hat} = {bits:#04x}").dimmed())
        }
        InputEvent::RawButton {
            slot,
            button,
            pressed,
        } => format!("slot {slot}: button {button} {}", phase(pressed)),
    }
}
