use anyhow::Result;
use clap::Parser;
use forecast_aqi::*;

fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    println!("FORECAST_AQI - Daily air-quality index forecast\n");

    let config = Config::load(&args)?;
    std::fs::create_dir_all(&config.output_dir)?;

    let RunResult { rows, outcome } = run(&config)?;

    println!("\nWindows: {} train / {} test", outcome.train_size, outcome.test_size);
    if let Some(loss) = outcome.history.final_train_loss() {
        println!("Final training loss: {:.6}", loss);
    }
    match &outcome.report {
        Some(report) => println!("Test metrics: {}", report.metrics),
        None => println!("Test metrics: none (empty test segment)"),
    }
    if let Some(cv) = &outcome.cross_validation {
        println!(
            "Cross-validation ({} folds): mean {:.6}, std {:.6}",
            cv.fold_losses.len(),
            cv.mean(),
            cv.std_dev()
        );
    }

    println!("\nRows used: {}", rows);
    println!("Results written to {}", config.results_path().display());
    println!("Summary written to {}", config.summary_path().display());

    Ok(())
}
