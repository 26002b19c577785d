use std::error::Error;

use ambisense_mock::run;
use ambisense_mock::settings::Settings;

fn main() -> Result<(), Box<dyn Error>> {
    let settings = Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let app_name = env!("CARGO_PKG_NAME").replace('-', "_");
            let level = settings.logger.level.as_str();

            format!("{app_name}={level},ambisense_embedded={level},ambisense_api={level}").into()
        }))
        .init();

    run(&settings)
}
