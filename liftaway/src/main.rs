use std::error::Error;
use std::path::PathBuf;

use clap::Parser;

mod modules;
mod utilities;

#[derive(Parser, Debug)]
#[command(author, version, about = "Action scheduler for the elevator prop")]
pub struct Args {
    /// Configuration file (defaults to config.json, then _config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port of the elevator simulator, overrides the configuration file
    #[arg(long)]
    serverport: Option<u16>,

    /// Render the scheduler status in the terminal
    #[arg(long)]
    status: bool,

    /// Run without an audio device
    #[arg(long)]
    silent: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    utilities::logging::init_logger();
    let args = Args::parse();
    modules::run(args)
}
