pub mod config;
pub mod evaluation;
pub mod forecast;
pub mod visualization;

pub use config::{Args, Config};
pub use evaluation::{Summary, render_results, write_results, write_summary};
pub use forecast::{RunResult, run};
pub use visualization::{plot_forecast, plot_residuals, value_range};
