use std::{fs::File, path::Path, sync::Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use snake_wrap::clock::SystemClock;
use snake_wrap::config::{Args, Config};
use snake_wrap::game::GameLoop;
use snake_wrap::term::{KeyInput, TermManager};

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to a file, never to the terminal the game draws on
    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    let config = Config::try_from(args)?;
    let (cols, rows) = config.grid_size();

    let mut term = TermManager::new(cols, rows, config.box_size);
    term.setup()?;

    let mut game = GameLoop::new(config, KeyInput, term, SystemClock::new());
    let result = game.run();

    let (_, mut term, _) = game.into_parts();
    let restored = term.restore();

    first_error(result, restored)
}

// A failure while playing matters more than one while cleaning up after it
fn first_error(result: Result<()>, restored: Result<()>) -> Result<()> {
    result?;
    restored
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn game_error_wins_over_restore_error() {
        let err = first_error(Err(anyhow!("input broke")), Err(anyhow!("restore broke"))).unwrap_err();
        assert_eq!(err.to_string(), "input broke");
    }

    #[test]
    fn restore_error_surfaces_after_clean_game() {
        let err = first_error(Ok(()), Err(anyhow!("restore broke"))).unwrap_err();
        assert_eq!(err.to_string(), "restore broke");
        assert!(first_error(Ok(()), Ok(())).is_ok());
    }
}
