//! esr2archive: convert an ESR spectrometer export to the archive container.

use clap::Parser;
use esr_io::{load, ArchiveCodec, JsonArchiveCodec};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};

#[derive(Parser)]
#[command(
    name = "esr2archive",
    version,
    about = "Convert ESR exports (annotated text, wave text, raw binary) to an archive"
)]
struct Cli {
    /// Input ESR file
    #[arg(short, long)]
    r#in: String,

    /// Output archive file (or - for stdout)
    #[arg(short, long, default_value = "-")]
    out: String,

    /// Print the parsed header to stderr
    #[arg(short, long, default_value_t = false)]
    verb: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let mut input = BufReader::new(File::open(&cli.r#in)?);
    let loaded = load(&mut input)?;

    if cli.verb {
        eprintln!("{} file, {} samples", loaded.file_type, loaded.samples.len());
        eprint!("{}", loaded.header);
    }
    if !loaded.warnings.is_empty() {
        log::warn!("{}: {} warning(s) while loading", cli.r#in, loaded.warnings.len());
    }

    if cli.out == "-" {
        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        JsonArchiveCodec.encode(&mut out, &loaded.raw_header, &loaded.samples)?;
        out.flush()?;
    } else {
        let mut out = BufWriter::new(File::create(&cli.out)?);
        JsonArchiveCodec.encode(&mut out, &loaded.raw_header, &loaded.samples)?;
        out.flush()?;
        log::info!("wrote {}", cli.out);
    }
    Ok(())
}
