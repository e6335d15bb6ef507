use std::io::{self, BufRead, Write};
use std::sync::Arc;

use meapi::{
    ActivationCode, Auth, CredentialPrompter, Email, MeClient, NewAccountDetails, PhoneNumber,
};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Reads activation codes and sign-up details from the terminal.
struct ConsolePrompter;

fn ask(prompt: &str) -> Option<String> {
    print!("{prompt}");
    io::stdout().flush().ok()?;
    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line).ok()?;
    (read > 0).then(|| line.trim().to_owned())
}

impl CredentialPrompter for ConsolePrompter {
    fn activation_code(&self, phone_number: PhoneNumber, attempt: u32) -> Option<ActivationCode> {
        if attempt > 1 {
            println!("Incorrect activation code, try again.");
        }
        loop {
            let input = ask(&format!(
                "Enter the 6-digit code sent to {phone_number} (empty to quit): "
            ))?;
            if input.is_empty() {
                return None;
            }
            match ActivationCode::new(input) {
                Ok(code) => return Some(code),
                Err(err) => println!("{err}"),
            }
        }
    }

    fn new_account_details(&self, _: PhoneNumber) -> Option<NewAccountDetails> {
        println!("This number has no Me account yet. Let's create one.");
        let first_name = ask("First name: ")?;
        let last_name = ask("Last name: ")?;
        let email = ask("Email (optional): ")?;
        Some(NewAccountDetails {
            first_name,
            last_name,
            email: Email::new(email).ok(),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(LevelFilter::INFO.into()))
        .init();

    let phone_raw = std::env::var("ME_PHONE").map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "ME_PHONE environment variable is required",
        )
    })?;
    let config_file = std::env::var("ME_CONFIG_FILE").unwrap_or_else(|_| "config.json".to_owned());

    let client = MeClient::builder(Auth::phone_number(phone_raw)?)
        .config_file(config_file)
        .prompter(Arc::new(ConsolePrompter))
        .connect()
        .await?;

    let session = client.session();
    println!(
        "state: {}, account id: {}",
        client.state(),
        session
            .account_id()
            .map_or_else(|| "unknown".to_owned(), ToString::to_string)
    );
    Ok(())
}
