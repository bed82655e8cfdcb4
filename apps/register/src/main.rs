use std::{path::PathBuf, process::ExitCode, sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    transport::DEFAULT_ENDPOINT, ClientConfig, FormPhase, FormView, GraphQlClient, Notice,
    RegistrationForm,
};
use shared::registration::{FieldValue, FormField, RegistrationInput};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the countries and document types offered by the form.
    Reference,
    /// Fill in the form and submit it.
    Submit {
        /// JSON file holding a camelCase `UserRegistrationInput`.
        #[arg(long)]
        input: Option<PathBuf>,
        /// Single field assignment, e.g. `--set city=Bogota` or `--set isMilitar=true`.
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
        assignments: Vec<(String, String)>,
    },
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(field, value)| (field.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{raw}'"))
}

/// `RUST_LOG` when it parses, `info` otherwise.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();
    let args = Args::parse();

    let config = ClientConfig::new(&args.endpoint)?
        .with_timeout(Duration::from_secs(args.timeout_secs));
    let client = GraphQlClient::new(config)?;
    info!(endpoint = %client.endpoint(), "using registration endpoint");

    let mut form = RegistrationForm::new(Arc::new(client));
    println!("{}", form.view().headline());
    form.load_reference_data().await;
    if form.phase() == FormPhase::ReferenceError {
        eprintln!("{}", form.view().headline());
        return Ok(ExitCode::FAILURE);
    }

    match args.command {
        Command::Reference => {
            print_reference(&form);
            Ok(ExitCode::SUCCESS)
        }
        Command::Submit { input, assignments } => {
            if let Some(path) = input {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                let input: RegistrationInput = serde_json::from_str(&raw)
                    .with_context(|| format!("parsing {}", path.display()))?;
                apply_input(&mut form, &input)?;
            }
            for (name, value) in assignments {
                let field: FormField = name.parse()?;
                let value = if field.is_checkbox() {
                    FieldValue::Checked(
                        value
                            .parse()
                            .map_err(|_| anyhow!("{field} expects true or false"))?,
                    )
                } else {
                    FieldValue::Text(value)
                };
                form.on_field_change(field, value)?;
            }

            let notice = form.submit().await;
            print_notice(&notice);
            Ok(if notice.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn apply_input(form: &mut RegistrationForm, input: &RegistrationInput) -> Result<()> {
    for field in FormField::ALL {
        match input.text(field) {
            Some(text) => form.on_field_change(field, text)?,
            None => form.on_field_change(field, input.is_militar)?,
        }
    }
    Ok(())
}

fn print_reference(form: &RegistrationForm) {
    if let FormView::Ready {
        countries,
        document_types,
        ..
    } = form.view()
    {
        println!("Countries:");
        for country in countries {
            println!(
                "  {} {} ({})",
                country.id, country.country_name, country.country_code
            );
        }
        println!("Document types:");
        for document_type in document_types {
            println!("  {} {}", document_type.id, document_type.name_type_document);
        }
    }
}

fn print_notice(notice: &Notice) {
    match notice {
        Notice::Success(message) => println!("{message}"),
        Notice::Blocked { message, missing } => {
            eprintln!("{message}");
            for field in missing {
                eprintln!("  - {} ({})", field, field.section().title());
            }
        }
        Notice::Rejected(message) | Notice::Failed(message) => eprintln!("{message}"),
    }
}
