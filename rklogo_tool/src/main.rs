mod app;

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, LevelFilter};

#[derive(Parser, Debug)]
#[command(version, about = "Rockchip kernel boot logo tool", long_about = None)]
struct Args {
    /// `kernel.img` to extract logos from, or `1234ABCD.ppm` to write into a
    /// kernel image at offset 0x1234ABCD
    input: PathBuf,

    /// Output directory when extracting, kernel image to patch when writing
    output: PathBuf,

    /// More output, repeat for trace logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    lib_rklogo::init_logging(level);

    info!("===========================================");
    info!("Rockchip Logo Tool v. {}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");
    info!("Input file: {}", args.input.display());
    info!("Output file: {}", args.output.display());

    match app::run(&args.input, &args.output) {
        Ok(app::Outcome::Encoded(layout)) => {
            info!(
                "Logo written @0x{:X} ({} colors replaced, {} bytes reserved)",
                layout.offset, layout.original_count, layout.reserved
            );
            info!("Finished!");
            ExitCode::SUCCESS
        }
        Ok(app::Outcome::Extracted(summary)) => {
            info!(
                "Found {} logo sections, written {}, skipped {}",
                summary.found,
                summary.written.len(),
                summary.skipped
            );
            info!("Finished!");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{}", err);
            let mut source = err.source();
            while let Some(cause) = source {
                error!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
