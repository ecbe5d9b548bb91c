use tracing::info;

use crate::models::RunContext;
use crate::utils::error::{AppError, Result};

/// Creates `output_dir` and `images_dir`. Safe to call again for the same run.
pub async fn initialize(ctx: &RunContext) -> Result<()> {
    for dir in [&ctx.output_dir, &ctx.images_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| AppError::storage(dir.as_path(), e))?;
    }

    info!("Created project folders: {}", ctx.output_dir.display());
    Ok(())
}
