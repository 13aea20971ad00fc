use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;
use crate::parse::target_handle;
use crate::process::{process_site, stored_submissions, Credentials};
use crate::{Error, Result};

/// Downloads a user's gallery and scraps from an authenticated gallery site.
#[derive(Debug, Parser)]
#[command(name = "gallery_scrap", version, about)]
pub struct Args {
    /// User handle or gallery/user URL to download.
    pub target: String,

    /// Handle to log in with. Defaults to the target's handle.
    #[arg(short, long)]
    pub login: Option<String>,

    /// Password. Prompted for (masked) when not given.
    #[arg(long, env = "GALLERY_SCRAP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// TOML config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Root directory for downloads.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// sqlite database file.
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Site origin, e.g. https://www.furaffinity.net
    #[arg(long)]
    pub base_url: Option<String>,

    /// Only walk the main gallery.
    #[arg(long)]
    pub no_scraps: bool,

    /// Print the submissions stored for the target and exit.
    #[arg(long)]
    pub list: bool,
}

impl Args {
    /// Config file values with command-line overrides applied.
    pub fn config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(output) = &self.output {
            config.output_root = output.clone();
        }
        if let Some(database) = &self.database {
            config.database = database.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if self.no_scraps {
            config.include_scraps = false;
        }
        Ok(config)
    }
}

pub async fn run(args: Args) -> Result<()> {
    let config = args.config()?;
    let handle = target_handle(&args.target)
        .ok_or_else(|| Error::Input(format!("no user handle in '{}'", args.target)))?;

    if args.list {
        for submission in stored_submissions(&config, &handle).await? {
            let kind = if submission.is_secondary { "scraps" } else { "gallery" };
            println!(
                "{}\t{kind}\t{}\t{}",
                submission.id, submission.title, submission.content_url
            );
        }
        return Ok(());
    }

    let login = args.login.clone().unwrap_or_else(|| handle.clone());
    let secret = match args.password.clone() {
        Some(password) => password,
        None => tokio::task::block_in_place(|| rpassword::prompt_password("Password: "))?,
    };
    if secret.is_empty() {
        return Err(Error::Input("no password supplied".into()));
    }

    let credentials = Credentials {
        handle: login,
        secret,
    };
    let report = process_site(&config, &credentials, &args.target).await?;
    println!(
        "{} downloaded, {} already present, {} skipped, {} failed",
        report.written, report.existing, report.skipped, report.failed
    );
    Ok(())
}
