use serde_json::Value;
use webscout_tools::ToolRegistry;

fn schema_function(schema: &Value) -> &Value {
    schema.get("function").unwrap_or(schema)
}

/// List all registered tools.
pub async fn list() -> anyhow::Result<()> {
    let registry = ToolRegistry::with_defaults();
    let mut schemas = registry.get_tool_schemas();
    schemas.sort_by_key(|s| schema_function(s)["name"].as_str().unwrap_or("").to_string());

    println!();
    println!("🔧 Registered tools ({} total)", schemas.len());
    println!();

    for schema in &schemas {
        let func = schema_function(schema);
        let name = func["name"].as_str().unwrap_or("");
        let desc = func["description"].as_str().unwrap_or("");
        let short_desc: String = desc.chars().take(60).collect();
        let ellipsis = if desc.chars().count() > 60 { "..." } else { "" };
        println!("  {:<20} {}{}", name, short_desc, ellipsis);
    }
    println!();

    Ok(())
}

/// Show detailed info for a specific tool.
pub async fn info(tool_name: &str) -> anyhow::Result<()> {
    let registry = ToolRegistry::with_defaults();
    let schemas = registry.get_tool_schemas();

    let schema = schemas
        .iter()
        .find(|s| schema_function(s)["name"].as_str() == Some(tool_name));

    match schema {
        Some(s) => {
            let func = schema_function(s);
            println!();
            println!("🔧 {}", func["name"].as_str().unwrap_or(""));
            println!();
            println!("  Description: {}", func["description"].as_str().unwrap_or(""));
            println!();

            if let Some(props) = func["parameters"].get("properties").and_then(|p| p.as_object()) {
                let required: Vec<&str> = func["parameters"]
                    .get("required")
                    .and_then(|r| r.as_array())
                    .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
                    .unwrap_or_default();

                println!("  Parameters:");
                for (name, prop) in props {
                    let kind = prop["type"].as_str().unwrap_or("any");
                    let desc = prop["description"].as_str().unwrap_or("");
                    let req = if required.contains(&name.as_str()) { " (required)" } else { "" };
                    println!("    {:<12} {:<8} {}{}", name, kind, desc, req);
                }
                if props.is_empty() {
                    println!("    (none)");
                }
            }
            println!();
            Ok(())
        }
        None => anyhow::bail!(
            "Tool '{}' not found. Use `webscout tools list` to see available tools.",
            tool_name
        ),
    }
}
