// main.rs

use color_eyre::eyre::{Result, WrapErr};
use std::path::Path;
use std::sync::mpsc;
use stockroom::config::Config;
use stockroom::display;
use stockroom::platform::Platform;
use stockroom::ui::UI;

fn main() -> Result<()> {
    color_eyre::install()?;
    // File logging, enabled with STOCKROOM_LOG=debug
    cli_log::init_cli_log!();

    // Load configuration file, or fall back to the defaults
    let config_path = Path::new("config.json");
    let config = if config_path.exists() {
        Config::load(config_path).wrap_err("Error loading configuration")?
    } else {
        Config::default()
    };

    // Create communication channels
    let (display, events) = display::channel(); // Buyer -> UI
    let (commands_tx, commands_rx) = mpsc::channel(); // UI -> Buyer

    let mut platform = Platform::new(config).wrap_err("Error starting the agent runtime")?;
    platform.start(display, commands_rx);

    // Initialize and start the user interface
    let mut ui = UI::new(commands_tx, events);
    ui.run();

    platform.shutdown();
    Ok(())
}
