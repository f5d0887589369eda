// Argument parsing via clap.
//
// Note that you probably want to keep this as a single file so the build script doesn't
// trip all over itself. It is pulled in with `include!`, so no inner attributes.

use std::{path::PathBuf, time::Duration};

use clap::*;
use indoc::indoc;

const TEMPLATE: &str = indoc! {
    "{name} {version}

    {about}

    {usage-heading} {usage}

    {all-args}"
};

const USAGE: &str = "sysload [OPTIONS]";

/// The fastest rate samples may be taken at, in milliseconds.
const MIN_RATE_MS: u128 = 100;

/// Which mechanism to read system load through.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendArg {
    /// procfs if it is mounted, sysctl otherwise.
    Auto,
    /// Read the procfs pseudo-files.
    Procfs,
    /// Query the kernel through sysctl.
    Sysctl,
}

/// The arguments for sysload.
#[derive(Parser, Debug)]
#[command(
    name = crate_name!(),
    version = crate_version!(),
    about = crate_description!(),
    disable_help_flag = true,
    disable_version_flag = true,
    color = ColorChoice::Auto,
    help_template = TEMPLATE,
    override_usage = USAGE,
)]
pub struct Args {
    #[command(flatten)]
    pub source_args: SourceArgs,

    #[command(flatten)]
    pub output_args: OutputArgs,

    #[command(flatten)]
    pub other_args: OtherArgs,
}

#[derive(clap::Args, Clone, Debug)]
#[command(next_help_heading = "Source Options")]
pub struct SourceArgs {
    #[arg(
        short = 'b',
        long,
        value_enum,
        default_value_t = BackendArg::Auto,
        help = "Sets which mechanism to read through.",
        long_help = "Sets which mechanism to read through. 'auto' uses procfs if it is mounted at \
                    the proc root, and sysctl otherwise."
    )]
    pub backend: BackendArg,

    #[arg(
        short = 'p',
        long,
        value_name = "PATH",
        help = "Sets where procfs is mounted.",
        long_help = "Sets where procfs is mounted. Defaults to /proc. Useful for containers, chroots \
                    and captured snapshots."
    )]
    pub proc_root: Option<PathBuf>,
}

#[derive(clap::Args, Clone, Debug)]
#[command(next_help_heading = "Output Options")]
pub struct OutputArgs {
    #[arg(
        short = 'r',
        long,
        value_name = "TIME",
        value_parser = parse_rate,
        default_value = "1s",
        help = "Sets how often to sample.",
        long_help = "Sets how often to sample. Takes a number in milliseconds or a human duration \
                    (e.g. 5s). The minimum is 100ms, and the default is 1s."
    )]
    pub rate: Duration,

    #[arg(
        short = 'n',
        long,
        value_name = "COUNT",
        value_parser = value_parser!(u64).range(1..),
        help = "Stops after this many samples.",
        long_help = "Stops after this many samples. By default, samples until interrupted."
    )]
    pub count: Option<u64>,

    #[arg(
        long,
        conflicts_with = "count",
        help = "Prints the raw counters once and exits."
    )]
    pub once: bool,
}

#[derive(clap::Args, Clone, Debug)]
#[command(next_help_heading = "Other Options")]
pub struct OtherArgs {
    #[arg(short = 'h', long, action = ArgAction::Help, help = "Prints help info (for more details use `--help`.)")]
    help: (),

    #[arg(short = 'V', long, action = ArgAction::Version, help = "Prints version information.")]
    version: (),
}

fn parse_rate(arg: &str) -> std::result::Result<Duration, String> {
    let rate = match arg.parse::<u64>() {
        Ok(millis) => Duration::from_millis(millis),
        Err(_) => humantime::parse_duration(arg).map_err(|err| err.to_string())?,
    };

    if rate.as_millis() < MIN_RATE_MS {
        Err(format!("'--rate' must be at least {MIN_RATE_MS}ms."))
    } else {
        Ok(rate)
    }
}

/// Returns the [`Command`] for sysload.
pub fn build_cmd() -> Command {
    Args::command()
}

/// Returns an [`Args`].
pub fn get_args() -> Args {
    Args::parse()
}
