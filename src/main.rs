//! BellBook CLI binary entry point.

use bellbook::cli::{content, Cli, Commands, Context};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let ctx = match Context::from_env() {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Auth(args) => bellbook::cli::auth::handle(&ctx, args.command).await,
        Commands::Announcements(args) => content::handle_announcements(&ctx, args.command).await,
        Commands::Messages(args) => content::handle_messages(&ctx, args.command).await,
        Commands::Watch => content::handle_watch(&ctx).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        if let Some(hint) = e.recovery_suggestion().hint() {
            eprintln!("  {hint}");
        }
        std::process::exit(1);
    }
}
