use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use restaurant_browse::{config::ServerConfig, db};

mod api;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(true)
        .with_file(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("fail to setup logging")?;

    let config = ServerConfig::from_env()?;
    let db_pool = db::connect(&config.database_url, config.max_connections).await?;
    let state = web::Data::new(api::ApiState::new(db_pool));

    tracing::info!("listening on {}", config.bind);
    let cors_origin = config.cors_origin.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allowed_origin(&cors_origin)
                    .allowed_methods(vec!["GET"])
                    .max_age(3600),
            )
            .app_data(state.clone())
            .configure(api::configure)
    })
    .bind(&config.bind)
    .with_context(|| format!("fail to bind {}", config.bind))?
    .run()
    .await?;

    tracing::info!("server stopped");
    Ok(())
}
