use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tracing::info;

use primescan::{cli, config, generate, input, logging, pipeline, util};

fn main() -> Result<()> {
    let cli_opts = cli::parse();
    logging::init_logging(cli_opts.log_json);

    if cli_opts.generate {
        let gen_cfg = util::generate_config_from_cli(&cli_opts);
        let summary = generate::generate_file(&gen_cfg).context("generation failed")?;
        println!(
            "Data file generated, min={}, max={}, count={} ({} bytes) -> {}",
            gen_cfg.min,
            gen_cfg.max,
            summary.values_written,
            summary.bytes_written,
            summary.output.display()
        );
        if gen_cfg.randomize {
            println!("Note: random values are drawn WITH replacement.");
        }
        return Ok(());
    }

    let loaded = config::load_config(cli_opts.config_path.as_deref())?;
    let mut cfg = loaded.config;
    util::apply_cli_overrides(&mut cfg, &cli_opts);
    util::check_scan_config(&cfg).context("configuration error")?;

    let pathname = cli_opts
        .pathname
        .clone()
        .ok_or_else(|| anyhow!("configuration error: --pathname is required"))?;

    info!(
        "run_id={} config_hash={} input={}",
        cfg.run_id,
        loaded.config_hash,
        pathname.display()
    );

    let source = input::RawFileSource::open(&pathname)
        .with_context(|| format!("cannot stat input {}", pathname.display()))?;
    let source: Arc<dyn input::InputSource> = Arc::new(source);

    let cancel_flag = util::install_cancel_handler()?;
    let progress = util::progress_from_config(&cfg);
    let summary = pipeline::run_scan_with_cancel(&cfg, source, cancel_flag, progress)
        .context("scan failed")?;

    match cli_opts.output_format {
        cli::OutputFormat::Text => println!("Total primes: {}", summary.total_primes),
        cli::OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }
    Ok(())
}
