use anyhow::Result;
use clap::{Parser, Subcommand};
use storage::Storage;
use tracing_subscriber::EnvFilter;

const DEFAULT_COUNTRIES: [(&str, &str); 3] = [("CO", "Colombia"), ("EC", "Ecuador"), ("PE", "Peru")];
const DEFAULT_DOCUMENT_TYPES: [&str; 3] = ["Cedula de Ciudadania", "Pasaporte", "Cedula de Extranjeria"];

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/registration.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    CreateCountry {
        country_code: String,
        country_name: String,
    },
    CreateDocumentType {
        name: String,
    },
    /// Print stored reference data and the number of registered users.
    List,
    /// Insert the default countries and document types that are not present yet.
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::CreateCountry {
            country_code,
            country_name,
        } => {
            let country_id = storage
                .create_country(country_code.trim(), country_name.trim())
                .await?;
            println!("created country_id={country_id}");
        }
        Command::CreateDocumentType { name } => {
            let document_type_id = storage.create_document_type(name.trim()).await?;
            println!("created document_type_id={document_type_id}");
        }
        Command::List => {
            for country in storage.list_countries().await? {
                println!(
                    "country {} {} {}",
                    country.id, country.country_code, country.country_name
                );
            }
            for document_type in storage.list_document_types().await? {
                println!(
                    "document_type {} {}",
                    document_type.id, document_type.name_type_document
                );
            }
            println!("users {}", storage.count_users().await?);
        }
        Command::Seed => {
            for (code, name) in DEFAULT_COUNTRIES {
                if storage.country_code_exists(code).await? {
                    continue;
                }
                let country_id = storage.create_country(code, name).await?;
                println!("created country_id={country_id} {code}");
            }
            for name in DEFAULT_DOCUMENT_TYPES {
                if storage.document_type_name_exists(name).await? {
                    continue;
                }
                let document_type_id = storage.create_document_type(name).await?;
                println!("created document_type_id={document_type_id} {name}");
            }
        }
    }

    Ok(())
}
