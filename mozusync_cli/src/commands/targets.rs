//! `mozusync targets`

use crate::config::{ConfigManager, resolve_target, target_names};
use crate::error::{CliError, CliResult};
use crate::output::Console;
use serde_json::Value;

/// Print each target with its action, or its merged options as TOML
pub fn list_targets(
    manager: &ConfigManager,
    console: &Console,
    config: &Value,
    show: bool,
) -> CliResult<()> {
    let names = target_names(config);
    if names.is_empty() {
        console.line(&format!(
            "No targets configured in {}",
            manager.config_path().display()
        ));
        return Ok(());
    }

    for name in names {
        let target = resolve_target(config, &name)?;
        if !show {
            console.line(&format!("{name} ({})", target.options.action));
            continue;
        }

        let mut options = target.options;
        if let Some(password) = options
            .context
            .as_mut()
            .and_then(|context| context.developer_account.as_mut())
            .and_then(|account| account.password.as_mut())
        {
            *password = "***".to_string();
        }
        let rendered = toml::to_string(&options)
            .map_err(|e| CliError::general(&format!("Failed to render target {name}: {e}")))?;

        console.subhead(&format!("[targets.{name}]"));
        console.line(rendered.trim_end());
    }

    Ok(())
}
