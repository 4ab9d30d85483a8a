use rmcp::{ServiceExt, transport::stdio};

use gleaner::config::Config;
use gleaner::server::GleanerServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    load_env_file();

    tracing::info!("gleaner starting");

    let config = Config::load();
    tracing::info!(
        profile = %config.profile,
        endpoint_configured = config.endpoint.url.is_some(),
        "configuration ready"
    );
    let server = GleanerServer::new(config);

    let service = server
        .serve(stdio())
        .await
        .inspect_err(|e| tracing::error!("serving error: {e:?}"))?;

    service.waiting().await?;

    tracing::info!("gleaner shutting down");
    Ok(())
}

/// `GLEANER_*` settings usually live in a `.env` beside the installed binary
/// (or at the crate root for `target/<profile>/` builds), since MCP clients
/// launch the server from an arbitrary directory. The working directory is
/// searched last.
fn load_env_file() {
    let beside_binary = std::env::current_exe().ok().and_then(|exe| {
        let dir = exe.parent()?.to_path_buf();
        [dir.join(".env"), dir.join("../../.env")]
            .into_iter()
            .find(|p| p.exists())
    });
    let loaded = match beside_binary {
        Some(path) => dotenvy::from_path(&path).is_ok(),
        None => dotenvy::dotenv().is_ok(),
    };
    if !loaded {
        tracing::debug!("no .env file loaded");
    }
}
