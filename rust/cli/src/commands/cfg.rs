//! `cfg`: the resolved configuration with the source of every value.
//!
//! ```json
//! {
//!   "seed": { "value": null, "source": "default" },
//!   "max_commit_retries": { "value": 5, "source": "env" },
//!   ...
//! }
//! ```

use crate::config;
use crate::error::CliError;
use crate::ui;
use std::io::Write;

pub fn handle_cfg_command(out: &mut dyn Write, err: &mut dyn Write) -> Result<(), CliError> {
    let resolved = match config::load_with_sources() {
        Ok(r) => r,
        Err(e) => {
            ui::write_error(err, &format!("Invalid configuration: {}", e))?;
            return Err(CliError::Config(e.to_string()));
        }
    };

    let config::ConfigResolved { config, sources } = resolved;
    let display = serde_json::json!({
        "seed": {
            "value": config.seed,
            "source": sources.seed,
        },
        "max_commit_retries": {
            "value": config.max_commit_retries,
            "source": sources.max_commit_retries,
        },
        "turn_timeout_secs": {
            "value": config.turn_timeout_secs,
            "source": sources.turn_timeout_secs,
        },
        "hand_size": {
            "value": config.hand_size,
            "source": sources.hand_size,
        }
    });
    let json_str = serde_json::to_string_pretty(&display).map_err(std::io::Error::other)?;
    writeln!(out, "{}", json_str)?;
    Ok(())
}
