use anyhow::Result;
use clap::Parser;
use tracing::info;

use gridsynth::analysis::reporting::print_generation_summary;
use gridsynth::cli::cli::Args;
use gridsynth::config::generation_config::GenerationConfig;
use gridsynth::core::pipeline::GridDataGenerator;
use gridsynth::data::reference::ReferenceData;
use gridsynth::data::reference_loader::load_reference_data;
use gridsynth::utils::csv_export::CsvSink;
use gridsynth::utils::logging::{self, OperationCategory};

fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_logging(args.enable_timing(), args.debug_logging())?;

    let mut config = match args.config() {
        Some(path) => GenerationConfig::load(path)?,
        None => GenerationConfig::default(),
    };
    args.apply_overrides(&mut config);

    let reference = {
        let _timing = logging::start_timing("load_reference_data", OperationCategory::Other);
        match args.reference() {
            Some(path) => load_reference_data(path)?,
            None => ReferenceData::us_cities()?,
        }
    };

    if !args.quiet() {
        println!("Grid Dataset Generator ({} to {})", config.start_date, config.end_date);
        println!(
            "Debug logging: {}, Timing: {}",
            if args.debug_logging() { "enabled" } else { "disabled" },
            if args.enable_timing() { "enabled" } else { "disabled" }
        );
    }

    let generator = GridDataGenerator::new(config, reference)?.with_progress(!args.quiet());
    let mut sink = CsvSink::new(args.output_dir())?;
    info!(dir = %sink.output_dir().display(), "Writing CSV files");

    let summary = generator.run(&mut sink)?;

    if !args.quiet() {
        print_generation_summary(&summary);
        println!("CSV files written to: {}", sink.output_dir().display());
    }
    logging::print_timing_report();

    Ok(())
}
