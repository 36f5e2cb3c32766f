use catalog_cli::argparse::parse_args;
use catalog_cli::{commands, utils, CliError};
use catalog_graphql::ResolverConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let cli = parse_args();
    utils::init_logger(cli.verbose);

    let config = ResolverConfig::from_env().map_err(CliError::Config)?;
    let output = commands::handle_command(cli.command, config, cli.store).await?;
    match output {
        serde_json::Value::String(text) => println!("{}", text),
        other => println!("{}", serde_json::to_string_pretty(&other)?),
    }

    Ok(())
}
