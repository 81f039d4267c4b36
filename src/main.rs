use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use conoha_swift::config::default_config_path;
use conoha_swift::StorageClient;
use reqwest::header::HeaderMap;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "conoha-swift")]
#[command(about = "ConoHa object storage client")]
struct Cli {
    /// Path to config file (defaults to ./conoha-swift.toml, then ~/.config/conoha-swift/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Make sure a valid token is cached and show when it expires
    Token,
    /// Account operations
    #[command(subcommand)]
    Account(AccountCommand),
    /// Container operations
    #[command(subcommand)]
    Container(ContainerCommand),
    /// Object operations
    #[command(subcommand)]
    Object(ObjectCommand),
}

#[derive(Subcommand)]
enum AccountCommand {
    /// Show account metadata
    Show,
    /// Set the account quota in gigabytes
    Quota { gigabytes: u64 },
}

#[derive(Subcommand)]
enum ContainerCommand {
    Show { container: String },
    Create { container: String },
    Delete { container: String },
}

#[derive(Subcommand)]
enum ObjectCommand {
    /// Show object metadata
    Head { container: String, object: String },
    Upload {
        container: String,
        object: String,
        /// Local file to upload (defaults to a file named like the object)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    Download {
        container: String,
        object: String,
        /// Where to write the object (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    Delete { container: String, object: String },
    /// Server-side copy
    Copy {
        from_container: String,
        from_object: String,
        to_container: String,
        to_object: String,
    },
}

fn print_headers(headers: &HeaderMap) {
    let mut names: Vec<_> = headers.keys().map(|k| k.as_str()).collect();
    names.sort_unstable();
    for name in names {
        for value in headers.get_all(name) {
            println!("{name}: {}", String::from_utf8_lossy(value.as_bytes()));
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(default_config_path);

    let client = StorageClient::from_config_file(&config_path)
        .await
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

    match cli.command {
        Command::Token => {
            let session = client.ensure_session().await?;
            println!("Expires: {}", session.expires());
            println!("Storage URL: {}", session.storage_url());
        }
        Command::Account(AccountCommand::Show) => print_headers(&client.show_account().await?),
        Command::Account(AccountCommand::Quota { gigabytes }) => {
            print_headers(&client.set_account_quota(gigabytes).await?)
        }
        Command::Container(ContainerCommand::Show { container }) => {
            print_headers(&client.show_container(&container).await?)
        }
        Command::Container(ContainerCommand::Create { container }) => {
            print_headers(&client.create_container(&container).await?)
        }
        Command::Container(ContainerCommand::Delete { container }) => {
            print_headers(&client.delete_container(&container).await?)
        }
        Command::Object(ObjectCommand::Head { container, object }) => {
            print_headers(&client.get_object(&container, &object).await?)
        }
        Command::Object(ObjectCommand::Upload {
            container,
            object,
            file,
        }) => {
            let headers = match file {
                Some(file) => client.upload_object_from(&container, &object, &file).await?,
                None => client.upload_object(&container, &object).await?,
            };
            print_headers(&headers);
        }
        Command::Object(ObjectCommand::Download {
            container,
            object,
            output,
        }) => match output {
            Some(path) => {
                let written = client.download_object_to(&container, &object, &path).await?;
                eprintln!("Wrote {written} bytes to {}", path.display());
            }
            None => {
                use std::io::Write;
                let body = client.download_object(&container, &object).await?;
                std::io::stdout()
                    .write_all(&body)
                    .context("Failed to write object to stdout")?;
            }
        },
        Command::Object(ObjectCommand::Delete { container, object }) => {
            print_headers(&client.delete_object(&container, &object).await?)
        }
        Command::Object(ObjectCommand::Copy {
            from_container,
            from_object,
            to_container,
            to_object,
        }) => print_headers(
            &client
                .copy_object(&from_container, &from_object, &to_container, &to_object)
                .await?,
        ),
    }

    Ok(())
}
