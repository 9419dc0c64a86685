mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use tb_av::{FfprobeInspector, MediaInspector, ToolRegistry};
use tb_core::config::Config;
use tb_core::UserId;

/// Load the config file (if any) and apply `TUBELY_*` environment overrides.
fn load_config(path: Option<&Path>) -> Config {
    let mut config = Config::load_or_default(path);
    config.apply_env_overrides();
    config
}

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = load_config(config_path);
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting tubely");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    tb_server::start(config).await?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise pick defaults from --verbose.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "tubely=trace,tb_pipeline=trace,tb_av=debug,tb_storage=debug,tb_db=debug,tb_server=debug,tower_http=debug".to_string()
        } else {
            "tubely=info,tb_pipeline=info,tb_av=info,tb_storage=info,tb_db=info,tb_server=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Probe { file, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(probe_file(&file, json, cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::IssueToken { user_id } => issue_token(&user_id, cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("tubely {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn probe_file(file: &Path, json: bool, config_path: Option<&Path>) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let config = load_config(config_path);
    let tools = ToolRegistry::discover(&config.tools);
    let inspector = FfprobeInspector::from_registry(&tools)?;
    let geometry = inspector.inspect(file).await?;
    let orientation = geometry.orientation();

    if json {
        let out = serde_json::json!({
            "file": file.display().to_string(),
            "geometry": geometry,
            "orientation": orientation,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("File: {}", file.display());
        let ratio = if geometry.display_aspect_ratio.is_empty() {
            "(none)"
        } else {
            geometry.display_aspect_ratio.as_str()
        };
        println!("Display aspect ratio: {ratio}");
        if let (Some(w), Some(h)) = (geometry.width, geometry.height) {
            println!("Size: {w}x{h}");
        }
        println!("Orientation: {orientation}");
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = load_config(config_path);
    let tools = ToolRegistry::discover(&config.tools);
    let mut all_ok = true;

    for tool in tools.check_all() {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);
        if let Some(ref version) = tool.version {
            print!(" ({version})");
        }
        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }
        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
        Ok(())
    } else {
        anyhow::bail!("ffmpeg and ffprobe are both required; install the missing tool")
    }
}

fn issue_token(user_id: &str, config_path: Option<&Path>) -> Result<()> {
    let user_id: UserId = user_id
        .parse()
        .with_context(|| format!("Invalid user id: {user_id}"))?;
    let config = load_config(config_path);
    let keys = tb_server::context::AppContext::token_keys(&config)
        .context("auth.jwt_secret (or TUBELY_JWT_SECRET) must be set to issue tokens")?;
    println!("{}", keys.issue(user_id)?);
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            let contents = std::fs::read_to_string(p)
                .with_context(|| format!("Failed to read {}", p.display()))?;
            let mut config = Config::from_json(&contents)?;
            config.apply_env_overrides();
            println!("✓ Configuration parses");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            load_config(None)
        }
    };

    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Public URL: {}", config.server.public_url);
    println!("  Storage backend: {:?}", config.storage.backend);
    println!("  Workspace: {}", config.workspace.root.display());
    println!("  Max video size: {} bytes", config.upload.max_video_bytes);

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("✓ No warnings");
    } else {
        for warning in &warnings {
            println!("  ! {warning}");
        }
    }

    Ok(())
}
