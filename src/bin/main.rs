#![warn(rust_2018_idioms)]

use std::{
    io::{stdout, Write},
    sync::mpsc,
    time::Duration,
};

use anyhow::{Context, Result};
use sysload::{options::args, CpuLoad, MemSwap, MetricSource, SystemSource};

fn main() -> Result<()> {
    let args = args::get_args();

    #[cfg(all(feature = "logging", debug_assertions))]
    {
        sysload::utils::logging::init_logger(
            log::LevelFilter::Debug,
            std::ffi::OsStr::new("debug.log"),
        )?;
    }

    let source = SystemSource::from_options(&args.source_options());

    if args.output_args.once {
        return print_raw(&source);
    }

    // Set up the ctrl-c handler; the main loop waits on it between samples.
    let (sender, receiver) = mpsc::channel();
    ctrlc::set_handler(move || {
        // The receiver only goes away when we're exiting anyway.
        let _ = sender.send(());
    })
    .context("Unable to set up the ctrl-c handler.")?;

    let mut previous: Option<CpuLoad> = None;
    let mut samples = 0;

    loop {
        let cpu = source.cpu_load().context("Unable to read CPU load.")?;
        let line = format_sample(
            source.uptime().context("Unable to read uptime.")?,
            previous.as_ref().and_then(|earlier| cpu.usage_since(earlier)),
            &source.mem_swap().context("Unable to read memory usage.")?,
        );
        previous = Some(cpu);

        let mut out = stdout().lock();
        writeln!(out, "{line}")?;
        out.flush()?;

        samples += 1;
        if args.output_args.count.is_some_and(|count| samples >= count) {
            break;
        }

        match receiver.recv_timeout(args.output_args.rate) {
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {}
        }
    }

    Ok(())
}

/// Prints the raw readings, one per line.
fn print_raw(source: &SystemSource) -> Result<()> {
    let uptime = source.uptime().context("Unable to read uptime.")?;
    let cpu = source.cpu_load().context("Unable to read CPU load.")?;
    let mem = source.mem_swap().context("Unable to read memory usage.")?;

    let mut out = stdout().lock();
    writeln!(out, "backend: {:?}", source.backend())?;
    writeln!(out, "uptime: {uptime}")?;
    writeln!(out, "cpu: {} {}", cpu.used, cpu.total)?;
    writeln!(
        out,
        "memswap: {} {} {} {}",
        mem.mem_used, mem.mem_total, mem.swap_used, mem.swap_total
    )?;

    Ok(())
}

fn format_sample(uptime: u64, cpu_usage: Option<f64>, mem: &MemSwap) -> String {
    let cpu = match cpu_usage {
        Some(usage) => format!("{:5.1}%", usage * 100.0),
        None => "    --".to_string(),
    };

    format!(
        "up {}  cpu {}  mem {} / {}  swap {} / {}",
        humantime::format_duration(Duration::from_secs(uptime)),
        cpu,
        format_kib(mem.mem_used),
        format_kib(mem.mem_total),
        format_kib(mem.swap_used),
        format_kib(mem.swap_total),
    )
}

/// Formats a kibibyte count with a binary prefix.
fn format_kib(kib: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    let mut value = kib as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{kib} KiB")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
