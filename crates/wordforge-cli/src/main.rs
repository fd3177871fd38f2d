// wordforge CLI entry point

use wordforge_cli::CommandRouter;

#[tokio::main]
async fn main() {
    match CommandRouter::route().await {
        Ok(output) => println!("{}", output),
        Err(e) => {
            // Fatal responses are still printed so callers can parse them
            if let Some(output) = e.output() {
                println!("{}", output);
            }
            eprintln!("{}", e.user_message());
            tracing::debug!(details = %e.technical_details(), "Command failed");
            std::process::exit(1);
        }
    }
}
