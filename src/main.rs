mod cli;
mod error;
mod logging;
mod prompt;

use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::{OptionExt, ResultExt};
use shutter_config::Config;
use shutter_library::{
    Catalog, Initialization, JsonSettings, LocalHost, Picture, PictureObserver, Resolver, ResolverOptions,
};
use shutter_media::{ImageCodec, MediaKind};
use std::process::ExitCode;
use std::sync::Arc;

/// Exit status when the user declines moving pictures.
const EXIT_DECLINED: u8 = 2;

struct LogObserver;
impl PictureObserver for LogObserver {
    fn on_picture_added(&self, picture: &Arc<Picture>) {
        tracing::debug!(name = %picture.name(), "Picture added");
    }

    fn on_picture_deleted(&self, picture: &Arc<Picture>) {
        tracing::info!(name = %picture.name(), "Picture deleted");
    }
}

async fn find(catalog: &Catalog, name: &str) -> Result<Arc<Picture>> {
    catalog
        .find(name)
        .await
        .or_raise(|| ErrorKind::Catalog)?
        .ok_or_raise(|| ErrorKind::UnknownPicture(name.to_string()))
}

async fn execute(catalog: &Catalog, command: Command) -> Result<()> {
    match command {
        Command::List => {
            for picture in catalog.pictures().await.or_raise(|| ErrorKind::Catalog)? {
                println!("{}\t{}\t{}\t{}", picture.timestamp(), picture.kind(), picture.file().location, picture.name());
            }
        },
        Command::Save { file, video } => {
            let content = tokio::fs::read(&file).await.or_raise(|| ErrorKind::Input(file.display().to_string()))?;
            let kind = if video { MediaKind::Video } else { MediaKind::Image };
            let picture = catalog.save_picture(&content, kind).await.or_raise(|| ErrorKind::Catalog)?;
            println!("{}", picture.name());
        },
        Command::Delete { name } => {
            let picture = find(catalog, &name).await?;
            catalog.delete_picture(&picture, false).await.or_raise(|| ErrorKind::Catalog)?;
        },
        Command::Export { name, target } => {
            let picture = find(catalog, &name).await?;
            catalog.export_picture(&picture, &target).await.or_raise(|| ErrorKind::Catalog)?;
        },
        Command::Check => match catalog.check_last_picture().await.or_raise(|| ErrorKind::Catalog)? {
            Some(last) => println!("{}", last.name()),
            None => println!("No pictures"),
        },
        Command::Url { name, thumbnail } => {
            let picture = find(catalog, &name).await?;
            let url = if thumbnail {
                catalog.thumbnail_url(&picture).await.or_raise(|| ErrorKind::Catalog)?
            } else {
                Some(catalog.picture_url(&picture).await.or_raise(|| ErrorKind::Catalog)?)
            };
            match url {
                Some(url) => println!("{url}"),
                None => println!("No thumbnail"),
            }
        },
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let host = LocalHost::from_config(&config);
    let settings = JsonSettings::new(&config.settings_path);
    let options = ResolverOptions {
        quota: config.internal.quota,
        zone: config.timezone.into(),
    };
    let assume_yes = cli.yes;
    let initialization =
        Resolver::initialize(&host, &settings, options, async || assume_yes || prompt::confirm_migration().await)
            .await
            .or_raise(|| ErrorKind::Initialize)?;
    let resolver = match initialization {
        Initialization::Ready(resolver) => resolver,
        Initialization::Declined => {
            eprintln!("Pictures were left where they are; nothing else was done.");
            return Ok(ExitCode::from(EXIT_DECLINED));
        },
    };

    let catalog = Catalog::new(resolver, Arc::new(ImageCodec))
        .with_thumbnail_width(config.thumbnail_width)
        .with_observer(Arc::new(LogObserver));
    execute(&catalog, cli.command).await?;
    Ok(ExitCode::SUCCESS)
}

// Single-threaded, so the local time zone offset can usually be determined.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = ?e, "Command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        },
    }
}
