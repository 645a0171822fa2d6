use console::style;
use tubeplate::db;
use tubeplate::migration::{Migrator, MigratorTrait};

use crate::MigrateAction;
use crate::commands::shared::{CommandResult, is_tty};

pub(crate) async fn handle_migrate(action: MigrateAction, database_url: &str) -> CommandResult {
    let db = db::connect(database_url).await?;

    match action {
        MigrateAction::Up => {
            let pending = Migrator::get_pending_migrations(&db).await?;
            if pending.is_empty() {
                println!("Schema is up to date.");
                return Ok(());
            }
            println!("Applying {} migration(s)...", pending.len());
            Migrator::up(&db, None).await?;
            println!("Migrations applied successfully.");
        }
        MigrateAction::Down => {
            println!("Rolling back last migration...");
            Migrator::down(&db, Some(1)).await?;
            println!("Rollback complete.");
        }
        MigrateAction::Status => {
            let applied = Migrator::get_applied_migrations(&db).await?;
            let pending = Migrator::get_pending_migrations(&db).await?;
            for migration in &applied {
                println!("{} {}", style("applied").green(), migration.name());
            }
            for migration in &pending {
                println!("{} {}", style("pending").yellow(), migration.name());
            }
        }
        MigrateAction::Fresh { yes } => {
            if !yes {
                return Err(
                    "`migrate fresh` drops every table including channels and history; \
                     rerun with --yes to confirm"
                        .into(),
                );
            }
            if is_tty() {
                println!("Dropping all tables and reapplying migrations...");
            } else {
                tracing::warn!("Dropping all tables and reapplying migrations");
            }
            Migrator::fresh(&db).await?;
            println!("Fresh migration complete.");
        }
    }

    Ok(())
}
