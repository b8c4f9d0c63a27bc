use std::{str::FromStr, time::Duration};

use authcode::{
    env, instrument,
    secure::{self, Sha1, TimeStep},
};

#[derive(serde::Deserialize, Debug, Default)]
struct Config {
    /// Comma separated `label=BASE32SECRET` pairs.
    #[serde(default)]
    accounts: Vec<String>,
    #[serde(default = "default_log_level")]
    log_level: String,
}

fn default_log_level() -> String {
    "info".into()
}

struct Account {
    label: String,
    secret: String,
}

impl Account {
    fn parse(entry: &str) -> Option<Self> {
        let (label, secret) = entry.split_once('=')?;
        Some(Self {
            label: label.trim().to_owned(),
            secret: secret.to_owned(),
        })
    }
}

fn main() -> anyhow::Result<()> {
    // env file is applied here, before the runtime spawns its worker threads
    let config: Config = env::parse()?;
    let level = instrument::LevelFilter::from_str(&config.log_level)?;
    let _inst_guard = instrument::init("authenticator", level)?;

    if std::env::args().nth(1).as_deref() == Some("new-key") {
        let key = secure::generate_key::<Sha1>()?;
        println!("{}", key.to_base32());
        return Ok(());
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(config))
}

async fn run(config: Config) -> anyhow::Result<()> {
    let accounts: Vec<Account> = config
        .accounts
        .iter()
        .filter_map(|entry| {
            let account = Account::parse(entry);
            if account.is_none() {
                tracing::warn!("skipping malformed account entry");
            }
            account
        })
        .collect();

    if accounts.is_empty() {
        anyhow::bail!("no accounts configured, set ACCOUNTS=label=SECRET,...");
    }
    tracing::info!(accounts = accounts.len(), "starting authenticator");

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut previous = Duration::MAX;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let left = secure::time_left(TimeStep::default())?;
                if left > previous || previous == Duration::MAX {
                    print_codes(&accounts);
                }
                previous = left;
                println!("  {:>4.1}s left", left.as_secs_f64());
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                return Ok(());
            }
        }
    }
}

fn print_codes(accounts: &[Account]) {
    for account in accounts {
        match secure::google_authenticator_code(&account.secret) {
            Ok(code) => {
                let code = code.as_str();
                println!("{} {}  {}", &code[..3], &code[3..], account.label);
            }
            Err(err) => {
                tracing::warn!(
                    account = %account.label,
                    error.message = err.to_string(),
                    "cannot compute code"
                );
                println!("Invalid key  {}", account.label);
            }
        }
    }
}
