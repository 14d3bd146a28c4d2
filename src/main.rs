use broadside::init_logging;
use clap::Parser;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
enum Commands {
    /// Run the matchmaking authority.
    Serve {
        #[arg(long, default_value = "0.0.0.0:5555")]
        bind: String,
        #[arg(long, help = "Fix RNG seed for reproducible fleets (e.g., --seed 12345)")]
        seed: Option<u64>,
    },
    /// Connect to an authority and play from the terminal.
    Play {
        #[arg(long, default_value = "127.0.0.1:5555")]
        connect: String,
        #[arg(long, default_value = "Anonymous")]
        username: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind, seed } => {
            if let Some(s) = seed {
                log::info!("using fixed seed {} (fleets will be reproducible)", s);
            }
            let listener = TcpListener::bind(&bind).await?;
            broadside::server::run(listener, seed).await
        }
        Commands::Play { connect, username } => broadside::client::run(&connect, &username).await,
    }
}
