mod config;
mod error;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use runtime::tools::builtin_specs;
use runtime::{
    Conversation, EmptyVault, FsVault, OllamaBackend, Orchestrator, SharedRegistry, Status,
    StatusUpdate, TerminalNotifier, VaultReader,
};
use storage::{Agent, AgentId, DEFAULT_MODEL, SettingsStore};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use config::{Config, ConfigError};
use error::{Error, Result};

const LOG_ENV: &str = "CONVOY_LOG";

#[derive(Parser)]
#[command(name = "convoy")]
#[command(about = "Multi-agent tool calling for a local model server", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a config file (default: ./convoy.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat with an agent
    Chat {
        /// Agent ID (defaults to the first agent)
        #[arg(short, long)]
        agent: Option<String>,
    },
    /// Send one prompt and print the answer
    Ask {
        /// Agent ID (defaults to the first agent)
        #[arg(short, long)]
        agent: Option<String>,
        prompt: String,
    },
    /// Manage agent definitions
    Agents {
        #[command(subcommand)]
        command: AgentCommands,
    },
    /// List models installed on the server
    Models,
    /// Show details for one model
    Model { name: String },
    /// Show or set the model server URL
    Server { url: Option<String> },
}

#[derive(Subcommand)]
enum AgentCommands {
    /// List all agents
    List,
    /// Show one agent
    Show { id: String },
    /// Create an agent
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        model: String,
        #[arg(long, default_value = "")]
        prompt: String,
        /// Tool to enable (repeatable)
        #[arg(long = "tool")]
        tools: Vec<String>,
        /// Comma-separated vault path prefixes (empty: unrestricted)
        #[arg(long, default_value = "")]
        paths: String,
    },
    /// Change an agent
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        prompt: Option<String>,
        /// Replace the enabled tools (repeatable)
        #[arg(long = "tool")]
        tools: Vec<String>,
        /// Disable every tool
        #[arg(long, conflicts_with = "tools")]
        no_tools: bool,
        #[arg(long)]
        paths: Option<String>,
    },
    /// Delete an agent
    Remove { id: String },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::discover(cli.config.as_deref())?;
    init_tracing(&config.logging.level)?;

    let store = open_store()?;

    match cli.command {
        Some(Commands::Chat { agent }) => cmd_chat(&config, &store, agent.as_deref()).await,
        None => cmd_chat(&config, &store, None).await,
        Some(Commands::Ask { agent, prompt }) => {
            cmd_ask(&config, &store, agent.as_deref(), &prompt).await
        }
        Some(Commands::Agents { command }) => cmd_agents(&store, command),
        Some(Commands::Models) => cmd_models(&config, &store).await,
        Some(Commands::Model { name }) => cmd_model(&config, &store, &name).await,
        Some(Commands::Server { url }) => cmd_server(&store, url.as_deref()),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = env_filter(std::env::var(LOG_ENV).ok().as_deref(), level)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

/// `CONVOY_LOG` wins over the configured level. A bad value in either is an
/// error rather than a silent fallback.
fn env_filter(from_env: Option<&str>, level: &str) -> Result<EnvFilter> {
    let (source, directives) = match from_env {
        Some(directives) => (LOG_ENV, directives),
        None => ("logging.level", level),
    };
    EnvFilter::try_new(directives)
        .map_err(|e| ConfigError::Invalid(format!("{source}: {e}")).into())
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat
// ─────────────────────────────────────────────────────────────────────────────

async fn cmd_chat(config: &Config, store: &SettingsStore, agent_id: Option<&str>) -> Result<()> {
    println!("convoy v{}", env!("CARGO_PKG_VERSION"));

    let mut agent = resolve_agent(store, agent_id)?;
    let backend = Arc::new(backend(config, store)?);
    apply_model_fallback(&backend, &mut agent).await;
    let orchestrator = build_orchestrator(config, store, backend)?;

    println!("Agent: {} ({})", agent.name, agent.id);
    println!("Model: {}", agent.model);
    println!("Type '/clear' to start over, 'quit' or Ctrl+D to exit.\n");

    let mut conversation = Conversation::new(Arc::new(orchestrator), agent);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            break;
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "quit" || input == "exit" {
            break;
        }
        if input == "/clear" {
            conversation.clear();
            println!("Conversation cleared.\n");
            continue;
        }

        match conversation.send(input, Some(&render_status)).await {
            Ok(response) => println!("\n{response}\n"),
            Err(e) => eprintln!("Error: {e}\n"),
        }
    }

    println!("\nBye.");
    Ok(())
}

async fn cmd_ask(
    config: &Config,
    store: &SettingsStore,
    agent_id: Option<&str>,
    prompt: &str,
) -> Result<()> {
    let mut agent = resolve_agent(store, agent_id)?;
    let backend = Arc::new(backend(config, store)?);
    apply_model_fallback(&backend, &mut agent).await;
    let orchestrator = build_orchestrator(config, store, backend)?;

    let mut conversation = Conversation::new(Arc::new(orchestrator), agent);
    let response = conversation.send(prompt, Some(&render_status)).await?;
    println!("{response}");
    Ok(())
}

/// Dim status line on stderr.
fn render_status(update: StatusUpdate) {
    let text = match (update.status, update.message) {
        (Status::Loading, _) => "thinking...".to_string(),
        (Status::ToolRunning, Some(message)) => message,
        (Status::ToolResult, Some(tool)) => format!("{tool} finished"),
        (Status::Error, Some(message)) => format!("error: {message}"),
        _ => return,
    };
    status_line(&text);
}

fn status_line(text: &str) {
    eprintln!("\x1b[2m  {text}\x1b[0m");
}

/// Swap a placeholder model for one the server actually has installed.
async fn apply_model_fallback(backend: &OllamaBackend, agent: &mut Agent) {
    let model = match backend.resolve_model(&agent.model).await {
        Ok(Some(model)) => model,
        Ok(None) => return,
        Err(e) => {
            warn!(error = %e, "could not list installed models");
            DEFAULT_MODEL.to_string()
        }
    };
    status_line(&format!("Using fallback model {model} for {}", agent.name));
    agent.model = model;
}

fn build_orchestrator(
    config: &Config,
    store: &SettingsStore,
    backend: Arc<OllamaBackend>,
) -> Result<Orchestrator> {
    let registry = SharedRegistry::new(store.agents()?);
    let vault: Arc<dyn VaultReader> = match &config.vault.root {
        Some(root) => Arc::new(FsVault::new(root)),
        None => Arc::new(EmptyVault),
    };

    Ok(Orchestrator::builder(backend, Arc::new(registry))
        .vault(vault)
        .notifier(Arc::new(TerminalNotifier))
        .path_match(config.orchestration.path_match)
        .max_iterations(config.orchestration.max_iterations)
        .max_depth(config.orchestration.max_depth)
        .build())
}

fn backend(config: &Config, store: &SettingsStore) -> Result<OllamaBackend> {
    let mut builder = OllamaBackend::builder(store.server_url()?);
    if let Some(timeout) = config.server.timeout() {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

fn resolve_agent(store: &SettingsStore, id: Option<&str>) -> Result<Agent> {
    match id {
        Some(id) => store
            .agent(&AgentId::from(id))?
            .ok_or_else(|| Error::AgentNotFound { id: id.to_string() }),
        None => store.agents()?.into_iter().next().ok_or(Error::NoAgents),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Agents
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_agents(store: &SettingsStore, command: AgentCommands) -> Result<()> {
    match command {
        AgentCommands::List => {
            let agents = store.agents()?;
            if agents.is_empty() {
                println!("No agents defined.");
                return Ok(());
            }

            println!("{:<36}  {:<24}  {:<20}  TOOLS", "ID", "NAME", "MODEL");
            println!("{}", "-".repeat(100));
            for agent in agents {
                println!(
                    "{:<36}  {:<24}  {:<20}  {}",
                    agent.id,
                    agent.name,
                    agent.model,
                    agent.enabled_tools.join(",")
                );
            }
        }
        AgentCommands::Show { id } => {
            let agent = resolve_agent(store, Some(&id))?;
            print_agent(&agent);
        }
        AgentCommands::Add {
            name,
            model,
            prompt,
            tools,
            paths,
        } => {
            check_tools(&tools)?;
            let agent = Agent::new(name, prompt, model)
                .with_tools(tools)
                .with_allowed_paths(paths);
            check_agent(&agent)?;
            store.insert_agent(&agent)?;
            println!("Created agent {}", agent.id);
        }
        AgentCommands::Edit {
            id,
            name,
            model,
            prompt,
            tools,
            no_tools,
            paths,
        } => {
            let mut agent = resolve_agent(store, Some(&id))?;
            if let Some(name) = name {
                agent.name = name;
            }
            if let Some(model) = model {
                agent.model = model;
            }
            if let Some(prompt) = prompt {
                agent.system_prompt = prompt;
            }
            if no_tools {
                agent.enabled_tools.clear();
            } else if !tools.is_empty() {
                check_tools(&tools)?;
                agent.enabled_tools = tools;
            }
            if let Some(paths) = paths {
                agent.allowed_paths = paths;
            }
            check_agent(&agent)?;
            store.update_agent(&agent)?;
            println!("Updated agent {}", agent.id);
        }
        AgentCommands::Remove { id } => {
            store.delete_agent(&AgentId::from(id.as_str()))?;
            println!("Removed agent {id}");
        }
    }
    Ok(())
}

fn print_agent(agent: &Agent) {
    println!("ID:      {}", agent.id);
    println!("Name:    {}", agent.name);
    println!("Model:   {}", agent.model);
    println!("Tools:   {}", agent.enabled_tools.join(", "));
    let paths = if agent.allowed_paths.trim().is_empty() {
        "(unrestricted)"
    } else {
        agent.allowed_paths.as_str()
    };
    println!("Paths:   {paths}");
    println!("Prompt:\n{}", agent.system_prompt);
}

fn check_agent(agent: &Agent) -> Result<()> {
    if agent.name.trim().is_empty() {
        return Err(Error::Required("Name"));
    }
    if agent.model.trim().is_empty() {
        return Err(Error::Required("Model"));
    }
    Ok(())
}

fn check_tools(tools: &[String]) -> Result<()> {
    let known = builtin_specs();
    match tools.iter().find(|t| !known.iter().any(|spec| &spec.name == *t)) {
        Some(unknown) => Err(Error::UnknownTool {
            name: unknown.clone(),
            known: known.into_iter().map(|spec| spec.name).collect::<Vec<_>>().join(", "),
        }),
        None => Ok(()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────────────────────────────────────

async fn cmd_models(config: &Config, store: &SettingsStore) -> Result<()> {
    let models = backend(config, store)?.list_models().await?;
    if models.is_empty() {
        println!("No models installed.");
        return Ok(());
    }

    println!("{:<40}  {:>10}  MODIFIED", "NAME", "SIZE");
    println!("{}", "-".repeat(80));
    for model in models {
        println!(
            "{:<40}  {:>10}  {}",
            model.name,
            format_size(model.size),
            model.modified_at.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

async fn cmd_model(config: &Config, store: &SettingsStore, name: &str) -> Result<()> {
    let info = backend(config, store)?.show_model(name).await?;
    println!("Name:     {}", info.name);
    println!("Families: {}", info.families.join(", "));
    println!("Tools:    {}", if info.supports_tools() { "yes" } else { "no" });
    Ok(())
}

fn cmd_server(store: &SettingsStore, url: Option<&str>) -> Result<()> {
    match url {
        Some(url) => {
            let url = url.trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!("server URL must be http(s): {url}")).into());
            }
            store.set_server_url(url)?;
            println!("Server URL set to {url}");
        }
        None => println!("{}", store.server_url()?),
    }
    Ok(())
}

fn format_size(bytes: u64) -> String {
    const GB: u64 = 1 << 30;
    const MB: u64 = 1 << 20;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Storage
// ─────────────────────────────────────────────────────────────────────────────

fn open_store() -> Result<SettingsStore> {
    let data_dir = dirs_data_dir().ok_or(Error::NoDataDir)?;
    std::fs::create_dir_all(&data_dir)?;
    Ok(SettingsStore::open(settings_path(&data_dir))?)
}

fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join("settings.db")
}

fn dirs_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share/convoy"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share")))
            .map(|p| p.join("convoy"))
    }
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|h| PathBuf::from(h).join("convoy"))
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn chat_is_the_default() {
        let cli = Cli::try_parse_from(["convoy"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn ask_takes_agent_and_prompt() {
        let cli = Cli::try_parse_from(["convoy", "ask", "--agent", "default-assistant", "hi"]).unwrap();
        match cli.command {
            Some(Commands::Ask { agent, prompt }) => {
                assert_eq!(agent.as_deref(), Some("default-assistant"));
                assert_eq!(prompt, "hi");
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn edit_rejects_tools_with_no_tools() {
        let parsed = Cli::try_parse_from([
            "convoy", "agents", "edit", "x", "--tool", "get_current_time", "--no-tools",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn unknown_tool_names_are_rejected() {
        assert!(check_tools(&["get_current_time".to_string(), "call_agent".to_string()]).is_ok());
        let err = check_tools(&["launch_rockets".to_string()]).unwrap_err();
        assert!(matches!(err, Error::UnknownTool { ref name, .. } if name == "launch_rockets"));
    }

    #[test]
    fn resolves_agents_from_store() {
        let store = SettingsStore::in_memory().unwrap();
        assert_eq!(resolve_agent(&store, None).unwrap().id.as_str(), "default-assistant");
        assert!(matches!(
            resolve_agent(&store, Some("missing")),
            Err(Error::AgentNotFound { .. })
        ));

        store.delete_agent(&AgentId::from("default-assistant")).unwrap();
        assert!(matches!(resolve_agent(&store, None), Err(Error::NoAgents)));
    }

    #[test]
    fn blank_name_or_model_is_rejected() {
        let err = check_agent(&Agent::new("", "", "llama3.2")).unwrap_err();
        assert_eq!(err.to_string(), "Name is required.");
        let err = check_agent(&Agent::new("Writer", "", "  ")).unwrap_err();
        assert_eq!(err.to_string(), "Model is required.");
        assert!(check_agent(&Agent::new("Writer", "", "llama3.2")).is_ok());
    }

    #[test]
    fn log_filter_prefers_env_and_rejects_bad_values() {
        assert!(env_filter(None, "warn").is_ok());
        assert!(env_filter(Some("runtime=debug"), "warn").is_ok());

        let err = env_filter(Some("runtime=loud"), "warn").unwrap_err();
        assert!(err.to_string().contains(LOG_ENV));
        let err = env_filter(None, "runtime=loud").unwrap_err();
        assert!(err.to_string().contains("logging.level"));
    }

    #[tokio::test]
    async fn placeholder_model_falls_back_when_server_is_down() {
        // Nothing listens on port 1.
        let backend = OllamaBackend::builder("http://127.0.0.1:1").build().unwrap();

        let mut agent = Agent::new("Writer", "", "");
        apply_model_fallback(&backend, &mut agent).await;
        assert_eq!(agent.model, DEFAULT_MODEL);

        let mut agent = Agent::new("Writer", "", "mistral");
        apply_model_fallback(&backend, &mut agent).await;
        assert_eq!(agent.model, "mistral");
    }

    #[test]
    fn sizes() {
        assert_eq!(format_size(3 * (1 << 30)), "3.0 GB");
        assert_eq!(format_size(512 * (1 << 20)), "512.0 MB");
    }
}
