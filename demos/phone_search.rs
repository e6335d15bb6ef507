use std::io;

use meapi::{Auth, MeClient, PhoneNumber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(LevelFilter::INFO.into()))
        .init();

    let required = |name: &str| {
        std::env::var(name).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{name} environment variable is required"),
            )
        })
    };
    let own_phone = required("ME_PHONE")?;
    let target = required("ME_SEARCH")?;

    // Uses the credential saved by the `activate` demo.
    let mut client = MeClient::builder(Auth::phone_number(own_phone)?)
        .config_file(std::env::var("ME_CONFIG_FILE").unwrap_or_else(|_| "config.json".to_owned()))
        .build()?;

    let target = PhoneNumber::normalize(target)?;
    match client.phone_search(target).await? {
        Some(found) => println!("{found:#}"),
        None => println!("{target}: not found"),
    }
    println!("spam reports: {}", client.is_spammer(target).await?);
    Ok(())
}
