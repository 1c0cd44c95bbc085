use std::path::Path;

use crate::errors::TroupeError;

use super::types::EngineConfig;

pub async fn parse_config(path: &Path) -> Result<EngineConfig, TroupeError> {
    if !path.exists() {
        return Err(TroupeError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > 1_048_576 {
        return Err(TroupeError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    let config: EngineConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}
