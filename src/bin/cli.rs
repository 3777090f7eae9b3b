use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use h5p_hub::cli::create_admin;
use h5p_hub::cli::seeder::{clear_seeded_data, seed_catalog};
use h5p_hub_db::init_db_pool;
use sqlx::PgPool;

#[derive(Parser)]
#[command(name = "h5p-hub-cli")]
#[command(about = "H5P Hub CLI - Administrative tools for H5P Hub", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an administrator account (USER and ADMIN roles)
    CreateAdmin {
        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,

        /// First name of the admin
        #[arg(short = 'f', long)]
        first_name: Option<String>,

        /// Last name of the admin
        #[arg(short = 'l', long)]
        last_name: Option<String>,
    },
    /// Seed the database with sample categories, faculties and contents
    Seed {
        /// Number of contents to create
        #[arg(short = 'c', long, default_value = "20")]
        contents: usize,
    },
    /// Clear all seeded data (keeps users and uploaded contents)
    ClearSeed,
}

fn exit_with(message: &str, e: impl std::fmt::Display) -> ! {
    eprintln!("\n❌ {}: {}", message, e);
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    let pool = match init_db_pool().await {
        Ok(pool) => pool,
        Err(e) => exit_with("Database unavailable", e),
    };

    match cli.command {
        Commands::CreateAdmin {
            email,
            password,
            first_name,
            last_name,
        } => handle_create_admin(&pool, email, password, first_name, last_name).await,
        Commands::Seed { contents } => handle_seed(&pool, contents).await,
        Commands::ClearSeed => handle_clear_seed(&pool).await,
    }
}

async fn handle_create_admin(
    pool: &PgPool,
    email: Option<String>,
    password: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
) {
    let email = match email {
        Some(email) => email,
        None => Input::new()
            .with_prompt("Email address")
            .interact_text()
            .unwrap_or_else(|e| exit_with("Failed to read email", e)),
    };

    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()
            .unwrap_or_else(|e| exit_with("Failed to read password", e)),
    };

    match create_admin(pool, &email, &password, first_name, last_name).await {
        Ok(user) => {
            println!("\n✅ Admin created successfully!");
            println!("   Id: {}", user.id);
            println!("   Email: {}", user.email);
        }
        Err(e) => exit_with("Error creating admin", e.error),
    }
}

async fn handle_seed(pool: &PgPool, contents: usize) {
    if let Err(e) = seed_catalog(pool, contents).await {
        exit_with("Error seeding database", e);
    }
}

async fn handle_clear_seed(pool: &PgPool) {
    if let Err(e) = clear_seeded_data(pool).await {
        exit_with("Error clearing seeded data", e);
    }
}
