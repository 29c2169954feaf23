use anyhow::{Context, Result};
use aqi_forecast::{PipelineOutcome, run_pipeline};
use log::info;

use crate::config::Config;
use crate::evaluation::{write_results, write_summary};
use crate::visualization::{plot_forecast, plot_residuals};

/// Result of one end-to-end run
pub struct RunResult {
    /// Rows left after cleaning
    pub rows: usize,
    pub outcome: PipelineOutcome,
}

/// Read, clean, train, evaluate and write every output the config asks for
pub fn run(config: &Config) -> Result<RunResult> {
    println!("Loading AQI data...");
    let table = table_io::read_aqi_csv(&config.data_file)
        .with_context(|| format!("Failed to load {}", config.data_file.display()))?;
    let rows = table.n_rows();
    println!("Rows after cleaning: {}", rows);

    if let Some(cleaned) = &config.cleaned_file {
        let path = config.output_dir.join(cleaned);
        table_io::write_table_csv(&path, &table)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("cleaned table written to {}", path.display());
    }

    println!("Training...");
    let outcome = run_pipeline(&table, &config.pipeline)?;

    write_results(config.results_path(), config, rows, &outcome)?;
    write_summary(config.summary_path(), config, rows, &outcome)?;

    if config.plots && outcome.report.is_some() {
        let forecast_png = config.output_dir.join("forecast.png");
        plot_forecast(
            &outcome.actuals_original_scale,
            &outcome.predictions_original_scale,
            &forecast_png,
        )
        .map_err(|e| anyhow::anyhow!("{}", e))?;

        let residuals: Vec<f64> = outcome
            .actuals_original_scale
            .iter()
            .zip(&outcome.predictions_original_scale)
            .map(|(a, p)| a - p)
            .collect();
        plot_residuals(&residuals, config.output_dir.join("residuals.png"))
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        info!("charts written to {}", config.output_dir.display());
    }

    Ok(RunResult { rows, outcome })
}
