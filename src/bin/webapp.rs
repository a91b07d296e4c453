use actix_web::{App, HttpServer, web};
use anyhow::Context;
use clap::Parser;
use tracing::info;

use counter::{AppContext, Settings, api};

#[derive(Parser)]
#[command(name = "webapp")]
#[command(about = "HTTP service counting the objects detected in uploaded images")]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind: String,

    #[command(flatten)]
    settings: Settings,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Cli::parse();
    info!(environment = ?args.settings.environment, bind = %args.bind, "starting the application");

    let context = web::Data::new(AppContext::from_settings(&args.settings).await?);
    let server_context = context.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(server_context.clone())
            .configure(api::configure)
    })
    .bind(&args.bind)
    .with_context(|| format!("Failed to bind {}", args.bind))?
    .run()
    .await?;

    context.shutdown().await;
    info!("server stopped");
    Ok(())
}
