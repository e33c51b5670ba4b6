use serde_json::Value;
use webscout_core::{Config, Paths};
use webscout_tools::{ToolContext, ToolRegistry};

/// Run a direct tool call, bypassing the LLM.
pub async fn tool(tool_name: &str, params_json: &str) -> anyhow::Result<()> {
    let registry = ToolRegistry::with_defaults();
    let paths = Paths::new();
    paths.ensure_dirs()?;
    let config = Config::load_or_default(&paths)?;

    if registry.get(tool_name).is_none() {
        anyhow::bail!(
            "Tool '{}' not found. Use `webscout tools list` to see available tools.",
            tool_name
        );
    }

    let params: Value = serde_json::from_str(params_json).map_err(|e| {
        anyhow::anyhow!("Failed to parse JSON params: {}\nInput: {}", e, params_json)
    })?;

    let ctx = ToolContext::new(paths.workspace(), config);
    let result = registry.dispatch(tool_name, ctx, params).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
