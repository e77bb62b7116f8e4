//!CLI boundary: argument handling and translation of lookup failures into
//!exit codes

use std::process;
use std::time::Instant;

use clap::Parser;

use nthline::error::Error;

/// Print a single line of a large text file, addressed by its line number.
///
/// The first lookup scans the file and persists a byte-offset index next to
/// it (`<FILE>.idx`); later lookups reuse the index for as long as the file
/// stays unchanged.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to the line-delimited text file
    file: std::path::PathBuf,

    /// Line number to print, 0-based
    #[arg(allow_negative_numbers = true)]
    line_number: String,
}

fn parse_line_number(raw: &str) -> Result<usize, Error> {
    raw.parse().map_err(|_| {
        Error::InvalidArgument("Line number must be a non-negative integer".to_owned())
    })
}

#[async_std::main]
async fn main() {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            use clap::error::ErrorKind;

            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = err.print();
            process::exit(code);
        }
    };

    let line = match parse_line_number(&cli.line_number) {
        Ok(line) => line,
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    };

    let started = Instant::now();
    match nthline::find_line(&cli.file, line).await {
        Ok(text) => {
            println!("{}", text);
            log::debug!("lookup finished in {:?}", started.elapsed());
        }
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    }
}
