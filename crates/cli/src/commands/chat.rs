//! `cyberclaw chat` — Interactive or single-message chat mode.

use anyhow::Context;
use cyberclaw_agent::AgentSession;
use cyberclaw_config::AppConfig;
use cyberclaw_core::mode::AgentMode;
use cyberclaw_mcp::ToolRouter;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(
    mode: String,
    provider: Option<String>,
    model: Option<String>,
    message: Option<String>,
) -> anyhow::Result<()> {
    let mode: AgentMode = mode.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let mut config = AppConfig::load().context("Failed to load config")?;
    if let Some(provider) = provider {
        config.provider = provider;
    }
    if let Some(model) = model {
        config.model = model;
    }

    let provider = match cyberclaw_providers::build_from_config(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!();
            eprintln!("  ERROR: {e}");
            eprintln!();
            eprintln!("  Set the API key for your provider, e.g.:");
            eprintln!("    export ANTHROPIC_API_KEY='sk-ant-...'   (anthropic)");
            eprintln!("    export OPENAI_API_KEY='sk-...'          (openai)");
            eprintln!("    export GOOGLE_API_KEY='...'             (gemini)");
            eprintln!();
            eprintln!("  Or add it to your config file:");
            eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
            eprintln!();
            return Err(e.into());
        }
    };

    // Connect tool servers before the session is handed out. Servers that
    // fail to come up are skipped; the catalog is simply smaller.
    let enabled = config.enabled_tool_servers();
    let router = ToolRouter::connect_all(&enabled).await;

    let model_label = if config.model.is_empty() {
        "(provider default)".to_string()
    } else {
        config.model.clone()
    };
    let mut session = AgentSession::new(provider, router, mode, &config.model);

    if let Some(msg) = message {
        // Single message mode
        let response = session.chat(&msg).await?;
        println!("{response}");
        session.shutdown().await;
        return Ok(());
    }

    // Interactive mode
    let tool_count = session.available_tools().await.len();
    println!();
    println!("  cyberclaw — interactive session");
    println!();
    println!("  Provider:  {}", session.provider_name());
    println!("  Model:     {model_label}");
    println!("  Mode:      {}", session.mode());
    println!("  Tools:     {tool_count} available");
    println!();
    println!("  Commands: 'mode <key>' to switch focus, 'clear' to reset");
    println!("  history, 'exit' to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_prompt();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();

        match input {
            "" => {}
            "exit" | "quit" => break,
            "clear" => {
                session.clear_history();
                println!("  History cleared.");
            }
            _ if input.starts_with("mode ") => {
                match input["mode ".len()..].trim().parse::<AgentMode>() {
                    Ok(mode) => {
                        session.set_mode(mode);
                        println!("  Mode set to {mode}.");
                    }
                    Err(e) => println!("  {e}"),
                }
            }
            _ => match session.chat(input).await {
                Ok(response) => {
                    println!();
                    for line in response.lines() {
                        println!("  {line}");
                    }
                    println!();
                }
                Err(e) => {
                    eprintln!("  [Error] {e}");
                    println!();
                }
            },
        }

        print_prompt();
    }

    session.shutdown().await;
    println!();
    println!("  Goodbye!");
    Ok(())
}

fn print_prompt() {
    use std::io::Write;
    print!("  You > ");
    let _ = std::io::stdout().flush();
}
