mod app;
pub use app::App;

use anyhow::Context;
use exo_cuing::ExperimentConfig;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args_os().nth(1) {
        Some(path) => ExperimentConfig::load(&path)
            .with_context(|| format!("loading {}", path.to_string_lossy()))?,
        None => ExperimentConfig::default(),
    };

    let app = App::new(config);
    app.run()?;

    Ok(())
}
