//! Serial monitor shell - main entry point
//!
//! A line-based operator shell around the capture pipeline. Every command
//! maps onto one controller operation; matched frames are echoed to the
//! console as they are logged (green for RX, blue for TX).

use clap::Parser;
use colored::Colorize;
use portmon_rs::config::MonitorConfig;
use portmon_rs::monitor::{MonitorEvent, PortMonitor};
use portmon_rs::types::{parse_hex, Direction};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "portmon", about = "Serial port monitor with filtered, rotated logging")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "portmon.toml")]
    config: PathBuf,

    /// Override the configured serial port
    #[arg(short, long)]
    port: Option<String>,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,portmon_rs=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut config = MonitorConfig::load_or_default(&args.config);
    if let Some(port) = args.port {
        config.serial.port = port;
    }

    let (mut monitor, events) = PortMonitor::new(config)?;

    // Echo matched frames and receiver faults as they happen
    std::thread::spawn(move || {
        for event in events {
            match event {
                MonitorEvent::FrameLogged {
                    timestamp,
                    direction,
                    text,
                } => {
                    let line = format!("[{timestamp}] {direction}: {}", text.trim_end());
                    match direction {
                        Direction::Rx => println!("{}", line.green()),
                        Direction::Tx => println!("{}", line.blue()),
                    }
                }
                MonitorEvent::ReceiverError(e) => {
                    eprintln!("{}", format!("Receive error: {e}").red());
                }
            }
        }
    });

    if let Err(e) = monitor.start() {
        eprintln!("{}", format!("Failed to start monitor: {e}").red());
        println!("Type 'start' to retry once the port is available.");
    } else {
        println!("Monitoring started; logging to {}", monitor.log_path().display());
    }
    println!("Type 'help' for commands.");

    let stdin = std::io::stdin();
    loop {
        print!("PORTMON> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "help" | "h" => print_help(),
            "start" => match monitor.start() {
                Ok(()) => println!("Monitoring started; logging to {}", monitor.log_path().display()),
                Err(e) => eprintln!("{}", format!("Failed to start: {e}").red()),
            },
            "stop" => monitor.stop(),
            "send" => {
                if arg.is_empty() {
                    println!("usage: send <data>");
                } else if let Err(e) = monitor.send(arg.as_bytes()) {
                    eprintln!("{}", format!("Send failed: {e}").red());
                }
            }
            "hexsend" => match parse_hex(arg) {
                Some(bytes) => {
                    if let Err(e) = monitor.send(&bytes) {
                        eprintln!("{}", format!("Send failed: {e}").red());
                    }
                }
                None => println!("Invalid hex payload (expected pairs like 'A1 B2 C3')"),
            },
            "match" => {
                if arg.is_empty() {
                    let current = monitor.current_filter();
                    if current.is_empty() {
                        println!("No filter active (all frames are logged)");
                    } else {
                        println!("Active filter: {current}");
                    }
                } else if let Err(e) = monitor.update_filter(arg) {
                    eprintln!(
                        "{}",
                        format!("Invalid filter expression: {e}\nexample: AND(\"0x\",\"111\")")
                            .red()
                    );
                } else {
                    println!("Filter updated to: {arg}");
                }
            }
            "exit" | "quit" => break,
            other => println!("Unknown command '{other}'; type 'help'"),
        }
    }

    monitor.stop();
    Ok(())
}

fn print_help() {
    println!(
        "\
Commands:
  start            retry opening the port after a failed start
  stop             stop capturing and close the port (ends the session)
  send <data>      write text to the port (logged as TX)
  hexsend <hex>    write hex bytes, e.g. hexsend A1 B2 C3
  match [expr]     set the filter expression, or show the active one
                   e.g. match AND(\"0x\",NOT(\"DEBUG\"))  match OR(\"ERR\",/warn/)
  help             this text
  exit             stop and quit"
    );
}
