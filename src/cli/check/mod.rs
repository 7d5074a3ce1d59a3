//! Check command - validates configuration and the model artifact

use crate::config::AppConfig;
use crate::domain::{FeatureSchema, ModelInvoker};
use crate::infrastructure::logging;

/// Outcome of a successful self-check
#[derive(Debug)]
pub struct CheckReport {
    pub schema: FeatureSchema,
    pub model_version: Option<String>,
}

impl std::fmt::Display for CheckReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "model:   {}", self.model_version.as_deref().unwrap_or("not loaded"))?;
        write!(f, "schema:  {}", self.schema)
    }
}

/// Run the self-check; an error makes the process exit non-zero
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    let report = check(&config).await?;
    println!("{}", report);
    println!("status:  ok");

    Ok(())
}

/// Loads the model and verifies the resolved schema against it
pub async fn check(config: &AppConfig) -> anyhow::Result<CheckReport> {
    let invoker: ModelInvoker = crate::load_model(&config.model).await?;
    let schema = crate::resolve_schema(&config.model, &invoker)?;
    invoker.verify_schema(&schema)?;

    Ok(CheckReport {
        schema,
        model_version: invoker.version().map(str::to_string),
    })
}
