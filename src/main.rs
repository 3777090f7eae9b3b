use anyhow::Context;
use dotenvy::dotenv;
use h5p_hub::cli::create_admin;
use h5p_hub::logging::init_tracing;
use h5p_hub::router::init_router;
use h5p_hub::state::init_app_state;
use h5p_hub_config::server::ServerConfig;
use h5p_hub_db::init_db_pool;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "create-admin" {
        return handle_create_admin(&args).await;
    }

    let _guard = init_tracing();

    let state = init_app_state().await?;
    let app = init_router(state);

    let address = ServerConfig::from_env().bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!(address = %address, "Server listening");
    println!("🚀 Server running on http://{}", address);
    println!("📚 Swagger UI available at http://{}/swagger-ui", address);
    println!("📖 Scalar UI available at http://{}/scalar", address);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

async fn handle_create_admin(args: &[String]) -> anyhow::Result<()> {
    if !(4..=6).contains(&args.len()) {
        eprintln!(
            "Usage: {} create-admin <email> <password> [first_name] [last_name]",
            args[0]
        );
        std::process::exit(1);
    }

    let pool = init_db_pool().await?;

    match create_admin(
        &pool,
        &args[2],
        &args[3],
        args.get(4).cloned(),
        args.get(5).cloned(),
    )
    .await
    {
        Ok(user) => {
            println!("✅ Admin created successfully!");
            println!("   Email: {}", user.email);
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Error creating admin: {}", e.error);
            std::process::exit(1);
        }
    }
}
