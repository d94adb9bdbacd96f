pub mod batch;
pub mod bootstrap;
pub mod serve;

use crate::cli::{Cli, Commands};
use crate::{bootstrap as setup, output};

/// Load config, open the database, and run the parsed command.
pub async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let config = setup::load_config(cli.config_dir.as_deref())?;
    let service = setup::open_service(&config).await?;

    match cli.command {
        Commands::Serve { bind } => serve::handle(&config, service, bind.as_deref()).await,
        Commands::Bootstrap {
            company,
            auth_user_id,
            email,
        } => {
            let created = bootstrap::handle(&service, &company, &auth_user_id, &email).await?;
            output::output(&created, cli.format)
        }
        Commands::DiscoverThemes { company } => {
            output::output(&batch::discover_themes(&service, &company).await?, cli.format)
        }
        Commands::ScoreThemes { company } => {
            output::output(&batch::score_themes(&service, &company).await?, cli.format)
        }
        Commands::RecomputeHealth { company } => {
            output::output(&batch::recompute_health(&service, &company).await?, cli.format)
        }
    }
}
