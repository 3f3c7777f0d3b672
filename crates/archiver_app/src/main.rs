mod harness;
mod logging;
mod settings_file;

use std::path::PathBuf;
use std::process::ExitCode;

use archiver_logging::archiver_error;

#[tokio::main]
async fn main() -> ExitCode {
    logging::initialize();

    let mut args = std::env::args().skip(1);
    let (Some(input), Some(output_dir)) = (args.next(), args.next()) else {
        eprintln!("usage: archiver_app <gallery.html> <output_dir> [base_url]");
        return ExitCode::FAILURE;
    };
    let base_url = args.next();

    match harness::run(
        &PathBuf::from(input),
        &PathBuf::from(output_dir),
        base_url.as_deref(),
    )
    .await
    {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            archiver_error!("archive run failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}
