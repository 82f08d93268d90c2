//! `cyberclaw tools` — Show the aggregated tool catalog.

use anyhow::Context;
use cyberclaw_config::AppConfig;
use cyberclaw_mcp::ToolRouter;

pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;

    let enabled = config.enabled_tool_servers();
    if enabled.is_empty() {
        println!();
        println!("  No tool servers enabled.");
        println!();
        println!("  Enable one in {}:", AppConfig::config_dir().join("config.toml").display());
        println!();
        println!("    [[tool_servers]]");
        println!("    name = \"nuclei\"");
        println!("    enabled = true");
        println!("    command = \"npx\"");
        println!("    args = [\"-y\", \"@cyproxio/mcp-nuclei\"]");
        println!();
        return Ok(());
    }

    let router = ToolRouter::connect_all(&enabled).await;
    let connected = router.host_names();
    let catalog = router.list_tools().await;

    println!();
    println!(
        "  Connected servers: {} of {} configured",
        connected.len(),
        enabled.len()
    );
    for name in &connected {
        println!("    - {name}");
    }
    println!();

    if catalog.is_empty() {
        println!("  No tools exported.");
    } else {
        println!("  Available tools:");
        for tool in &catalog {
            if tool.description.is_empty() {
                println!("    {}", tool.name);
            } else {
                println!("    {:<28} {}", tool.name, tool.description);
            }
        }
    }
    println!();

    router.disconnect_all().await;
    Ok(())
}
