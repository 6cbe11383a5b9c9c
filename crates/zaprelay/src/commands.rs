//! zaprelay command implementations

use anyhow::{Context, Result};
use std::io::{IsTerminal, Write};
use std::sync::Arc;
use tracing::{debug, info};

use zaprelay_agent::{run_text_relay, PromptRunner, ReactAgentFactory, ToolSummary};
use zaprelay_config::{self, Config, ConfigError, CredentialPair, LlmKind, LlmSettings};

/// Provider selection is checked before anything else is touched
async fn load_settings(llm: &str, model_name: Option<String>) -> Result<(Config, LlmSettings)> {
    let kind: LlmKind = llm.parse()?;
    let config = Config::load().await.context("Failed to load config")?;
    let settings = config.llm_settings_for(kind.as_str(), model_name)?;
    debug!("Using {} model {}", settings.provider, settings.model());
    Ok((config, settings))
}

fn factory(config: &Config, settings: LlmSettings) -> ReactAgentFactory {
    ReactAgentFactory::new(settings, config.toolkit.clone(), config.agent.clone())
}

/// Read a secret with masked input
fn read_password(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    Ok(rpassword::read_password()?)
}

/// Environment value, or a masked prompt when stdin is a terminal
fn secret_from_env_or_prompt(var: &str) -> Result<String> {
    if let Some(value) = std::env::var(var).ok().filter(|v| !v.trim().is_empty()) {
        return Ok(value);
    }
    if !std::io::stdin().is_terminal() {
        return Err(ConfigError::MissingCredential(var.to_string()).into());
    }

    let value = read_password(&format!("Enter {}: ", var))?;
    if value.trim().is_empty() {
        return Err(ConfigError::MissingCredential(var.to_string()).into());
    }
    Ok(value)
}

fn resolve_credentials(config: &Config, settings: &LlmSettings) -> Result<CredentialPair> {
    if let Ok(credentials) = config.credentials_from_env(settings) {
        return Ok(credentials);
    }

    let llm_key = secret_from_env_or_prompt(&settings.api_key_env())?;
    let toolkit_key = secret_from_env_or_prompt(&config.toolkit.api_key_env)?;
    CredentialPair::new(llm_key, toolkit_key).context("Both keys are required")
}

fn print_tools(tools: &[ToolSummary]) {
    for tool in tools {
        println!("{}", tool.name);
        println!("{}", tool.description);
        println!("\n\n");
    }
}

/// Initialize config
pub async fn init_command() -> Result<()> {
    println!("◆ Initializing zaprelay...");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let path = zaprelay_config::init().await?;

    println!("\n◆ Config at {}", path.display());
    println!("\nNext steps:");
    println!("  1. Export OPENAI_API_KEY (or HUGGINGFACEHUB_API_TOKEN) and ZAPIER_NLA_API_KEY");
    println!("     Zapier NLA keys: https://nla.zapier.com/providers/");
    println!("  2. Start relaying: zaprelay chat --llm openai");

    Ok(())
}

/// Relay prompts from stdin until `exit`
pub async fn chat_command(llm: String, model_name: Option<String>) -> Result<()> {
    let (config, settings) = load_settings(&llm, model_name).await?;
    let credentials = resolve_credentials(&config, &settings)?;

    let agent = factory(&config, settings)
        .build_agent(&credentials)
        .await
        .context("Failed to build agent")?;

    print_tools(&agent.tools());

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let runs = run_text_relay(&agent, stdin.lock(), &mut stdout).await?;
    info!("Session ended after {} prompts", runs);

    Ok(())
}

/// Build the agent and print its tools
pub async fn tools_command(llm: String, model_name: Option<String>) -> Result<()> {
    let (config, settings) = load_settings(&llm, model_name).await?;
    let credentials = resolve_credentials(&config, &settings)?;

    let agent = factory(&config, settings)
        .build_agent(&credentials)
        .await
        .context("Failed to build agent")?;

    let tools = agent.tools();
    if tools.is_empty() {
        println!("No actions exposed for this key. Configure them at https://nla.zapier.com/providers/");
    } else {
        print_tools(&tools);
    }

    Ok(())
}

/// Serve the web portal
pub async fn portal_command(
    llm: String,
    model_name: Option<String>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let (config, settings) = load_settings(&llm, model_name).await?;

    let mut portal = config.portal.clone();
    if let Some(host) = host {
        portal.host = host;
    }
    if let Some(port) = port {
        portal.port = port;
    }

    println!("◆ Starting zaprelay portal");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("◆ http://{}:{}", portal.host, portal.port);

    let factory = Arc::new(factory(&config, settings));
    zaprelay_portal::serve(&portal, factory)
        .await
        .context("Portal stopped")?;

    Ok(())
}
