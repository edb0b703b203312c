use std::path::PathBuf;

use clap::Parser;
use esr_analysis::log::reproducibility::ReproLog;
use esr_analysis::pipeline::session;
use esr_analysis::{Channel, IntegrationWindow, LoadOptions};

#[derive(Parser)]
#[command(
    name = "esr-analyze",
    version,
    about = "Load, reduce, and integrate an ESR spectrometer file"
)]
struct Cli {
    /// Input file (annotated text, wave text, raw binary, or archive)
    file: PathBuf,

    /// Reduction factor (overrides --options)
    #[arg(short, long)]
    reduce: Option<i64>,

    /// JSON file with load options
    #[arg(long)]
    options: Option<PathBuf>,

    /// Integration window
    #[arg(short, long, num_args = 2, value_names = ["START", "END"], allow_negative_numbers = true)]
    window: Option<Vec<f64>>,

    /// Integration constant (default: first in-window value)
    #[arg(short, long, allow_negative_numbers = true)]
    constant: Option<f64>,

    /// Use the gain-normalized channel
    #[arg(long, default_value_t = false)]
    norm: bool,

    /// Use the imaginary channel
    #[arg(long, default_value_t = false)]
    imag: bool,

    /// Write the raw data to an archive
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Save the reproducibility log (.json, .sh, or text)
    #[arg(short, long)]
    log: Option<PathBuf>,

    /// Print the parsed header
    #[arg(short, long, default_value_t = false)]
    verb: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let mut options = match &cli.options {
        Some(path) => LoadOptions::from_json_file(path)?,
        None => LoadOptions::default(),
    };
    if let Some(f) = cli.reduce {
        options.reduction_factor = f;
    }

    let mut repro = ReproLog::new();
    let mut ds = session::load_dataset(&cli.file, &options, &mut repro)?;

    print!("{}", ds);
    if cli.verb {
        print!("{}", ds.header());
    }

    let channel = Channel::from_flags(cli.norm, cli.imag);
    let (min, max) = ds.x_range();
    let mut window = match cli.window.as_deref() {
        Some([start, end]) => IntegrationWindow::new(*start, *end),
        _ => IntegrationWindow::new(min, max),
    };
    window.constant = cli.constant;

    let area = session::integrate_window(&mut ds, &window, channel, &mut repro);
    println!(
        "integral of {} over [{}, {}]: {}",
        channel, window.start, window.end, area
    );

    if let Some(out) = &cli.export {
        session::export_archive(&ds, out, &mut repro)?;
    }

    if let Some(path) = &cli.log {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => repro.save_json(path)?,
            Some("sh") => repro.save_script(path)?,
            _ => repro.save_text(path)?,
        }
        ::log::info!("reproducibility log written to {}", path.display());
    }

    Ok(())
}
