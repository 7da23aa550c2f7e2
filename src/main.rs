//! NetraCam console - interactive remote camera control
//!
//! Connects to the configured camera service and drives it from stdin,
//! one command per line. Mainly a debugging aid for the library; type
//! `help` at the prompt for the command list.

use netra_cam::config::Config;
use netra_cam::connection::TcpDialer;
use netra_cam::controller::{CameraController, EventSink, RecordingInfo, RecordingStarted};
use netra_cam::params::ZoomRect;
use netra_cam::protocol::GainChannel;
use std::env;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Parse config path from command line arguments.
///
/// Supports:
/// - `netra-cam <path>` (positional)
/// - `netra-cam --config <path>` (flag-based)
/// - `netra-cam -c <path>` (short flag)
///
/// Defaults to `netracam.toml` if not specified.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    "netracam.toml".to_string()
}

/// Recording numbering for console sessions: experiment 1, recording
/// number counting up from 1
struct ConsoleRecordingInfo {
    recording_counter: AtomicU32,
}

impl RecordingInfo for ConsoleRecordingInfo {
    fn experiment_number(&self) -> u32 {
        1
    }

    fn recording_number(&self) -> u32 {
        self.recording_counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn recording_path(&self) -> String {
        // empty -> controller generates a date-stamped directory name
        String::new()
    }
}

struct LogSink;

impl EventSink for LogSink {
    fn recording_started(&self, event: &RecordingStarted) {
        log::info!(
            "Recording started on {} -> {} at {}",
            event.address,
            event.remote_path,
            event.timestamp.format("%Y-%m-%d %H:%M:%S")
        );
    }
}

fn main() -> netra_cam::Result<()> {
    let config_path = parse_config_path();
    let config = if std::path::Path::new(&config_path).exists() {
        Config::from_file(&config_path)?
    } else {
        Config::defaults()
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.clone()),
    )
    .init();

    log::info!("NetraCam console starting, endpoint {}", config.endpoint());

    let controller = CameraController::new(
        Arc::new(TcpDialer),
        config.endpoint(),
        Arc::new(ConsoleRecordingInfo {
            recording_counter: AtomicU32::new(0),
        }),
        Arc::new(LogSink),
    );
    controller.set_command_timeout(config.command_timeout());

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("netra> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let result = match parts.as_slice() {
            [] => Ok(()),
            ["help"] => {
                print_help();
                Ok(())
            }
            ["connect"] => controller.connect(),
            ["disconnect"] => {
                controller.disconnect();
                Ok(())
            }
            ["address", addr] => controller.set_address(addr, false),
            ["port", p] => match p.parse() {
                Ok(port) => controller.set_port(port, false),
                Err(_) => {
                    println!("invalid port: {}", p);
                    Ok(())
                }
            },
            ["resolution", w, h] => match (w.parse(), h.parse()) {
                (Ok(w), Ok(h)) => controller.set_resolution(w, h),
                _ => {
                    println!("usage: resolution <width> <height>");
                    Ok(())
                }
            },
            ["framerate", fps] => match fps.parse() {
                Ok(fps) => controller.set_framerate(fps),
                Err(_) => {
                    println!("usage: framerate <fps>");
                    Ok(())
                }
            },
            ["vflip", v] => controller.set_vflip(*v == "1"),
            ["hflip", v] => controller.set_hflip(*v == "1"),
            ["zoom", l, b, r, t] => match (l.parse(), b.parse(), r.parse(), t.parse()) {
                (Ok(l), Ok(b), Ok(r), Ok(t)) => controller.set_zoom(ZoomRect::new(l, b, r, t)),
                _ => {
                    println!("usage: zoom <left> <bottom> <right> <top> (percent)");
                    Ok(())
                }
            },
            ["gain", ch, v] => {
                let channel = match *ch {
                    "0" => Some(GainChannel::Red),
                    "1" => Some(GainChannel::Blue),
                    _ => None,
                };
                match (channel, v.parse()) {
                    (Some(channel), Ok(value)) => controller.set_gain(channel, value),
                    _ => {
                        println!("usage: gain <0|1> <value in [0,8]>");
                        Ok(())
                    }
                }
            }
            ["gains"] => match controller.get_gains() {
                Ok(gains) => {
                    println!("gains: {:.6} {:.6}", gains[0], gains[1]);
                    Ok(())
                }
                Err(e) => Err(e),
            },
            ["resetgains"] => controller.reset_gains(),
            ["start"] => controller.start_recording().map(|path| {
                println!("remote recording path: {}", path);
            }),
            ["stop"] => controller.stop_recording(),
            ["status"] => {
                let params = controller.params();
                println!(
                    "{} | {}x{} @ {} fps | vflip={} hflip={} | zoom ({}, {}, {}, {}) | recording={}",
                    if controller.is_connected() {
                        "connected"
                    } else {
                        "disconnected"
                    },
                    params.width,
                    params.height,
                    params.framerate,
                    params.vflip,
                    params.hflip,
                    params.zoom.left,
                    params.zoom.bottom,
                    params.zoom.right,
                    params.zoom.top,
                    params.recording,
                );
                Ok(())
            }
            ["quit"] | ["exit"] => break,
            _ => {
                println!("unknown command (try 'help')");
                Ok(())
            }
        };

        if let Err(e) = result {
            println!("error: {}", e);
        }
    }

    log::info!("NetraCam console exiting");
    Ok(())
}

fn print_help() {
    println!(
        "commands:\n\
         \x20 connect | disconnect | status\n\
         \x20 address <host> | port <port>\n\
         \x20 resolution <w> <h> | framerate <fps>\n\
         \x20 vflip <0|1> | hflip <0|1>\n\
         \x20 zoom <l> <b> <r> <t>\n\
         \x20 gain <0|1> <value> | gains | resetgains\n\
         \x20 start | stop\n\
         \x20 quit"
    );
}
