use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use mangacovers::{
    make_zip, parse_manga_id, sanitize_file_name, CoverDownloadRequest, CoverDownloader,
    CoverQuery, CoverSize, DownloadProgress, Endpoints, EndpointsBuilder, MangaListQuery,
};
use tower::{Service, ServiceBuilder, ServiceExt};
use tracing::warn;

#[derive(Debug, Parser)]
#[command(
    name = "mgcv",
    version,
    author,
    about = "CLI tool to list manga and download their covers from mangadex"
)]
struct Arguments {
    #[arg(long, global = true, help = "override the api base url")]
    api_url: Option<String>,
    #[arg(long, global = true, help = "override the covers base url")]
    covers_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search manga by title
    Search {
        title: String,
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, help = "print as json")]
        json: bool,
    },
    /// List the covers of a manga
    Covers {
        #[command(flatten)]
        filter: CoverFilter,
        #[arg(long, help = "print as json")]
        json: bool,
    },
    /// Download the covers of a manga
    Download {
        #[command(flatten)]
        filter: CoverFilter,
        #[arg(short, long, default_value = ".", help = "destination folder")]
        path: PathBuf,
        #[arg(long, value_enum, default_value_t = Size::Original)]
        size: Size,
        #[arg(long, help = "pack the covers into a zip file")]
        zip: bool,
    },
}

#[derive(Debug, Clone, Args)]
struct CoverFilter {
    #[arg(help = "manga id or url")]
    manga: String,
    #[arg(short, long, help = "only these volumes")]
    volumes: Vec<String>,
    #[arg(long = "locale", help = "only covers of these locales")]
    locales: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Size {
    Original,
    Medium,
    Small,
}

impl From<Size> for CoverSize {
    fn from(size: Size) -> Self {
        match size {
            Size::Original => CoverSize::Original,
            Size::Medium => CoverSize::Medium,
            Size::Small => CoverSize::Small,
        }
    }
}

impl CoverFilter {
    fn query(&self, endpoints: Endpoints) -> anyhow::Result<CoverQuery> {
        let mut query = CoverQuery::new(parse_manga_id(&self.manga)?).endpoints(endpoints);
        for volume in &self.volumes {
            query = query.volume(volume);
        }
        for locale in &self.locales {
            query = query.locale(locale);
        }
        Ok(query)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Arguments::parse();

    let mut builder = EndpointsBuilder::default();
    if let Some(url) = &args.api_url {
        builder.api_url(url);
    }
    if let Some(url) = &args.covers_url {
        builder.covers_url(url);
    }
    let endpoints = builder.build()?;

    match args.command {
        Command::Search {
            title,
            limit,
            offset,
            json,
        } => {
            let mangas = MangaListQuery::new()
                .title(title)
                .limit(limit)
                .offset(offset)
                .endpoints(endpoints)
                .execute()
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&mangas)?);
            } else {
                for manga in &mangas {
                    println!("{}  {}  {}", manga.id(), manga.title(), manga.cover());
                }
            }
        }
        Command::Covers { filter, json } => {
            let covers = filter.query(endpoints)?.execute().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&covers)?);
            } else {
                for cover in &covers {
                    let volume = if cover.volume().is_empty() {
                        "-"
                    } else {
                        cover.volume().as_str()
                    };
                    println!("{}  vol {}  {}", cover.id(), volume, cover.url());
                }
            }
        }
        Command::Download {
            filter,
            path,
            size,
            zip,
        } => {
            let covers = filter.query(endpoints)?.execute().await?;
            let Some(title) = covers.first().map(|c| c.title().clone()) else {
                println!("No covers found.");
                return Ok(());
            };

            let mut download_service = ServiceBuilder::new()
                .rate_limit(1, Duration::from_secs(1))
                .service(CoverDownloader::new());

            let size = CoverSize::from(size);
            let mut progress = DownloadProgress::new(covers.len() as u64);
            let mut downloaded_paths = Vec::new();
            for cover in covers {
                let file = path.join(cover.file_name_with(size));
                let result = download_service
                    .ready()
                    .await?
                    .call(CoverDownloadRequest::new(cover).size(size).path(&path))
                    .await;
                progress.advance(1);
                match result {
                    Ok(_) => {
                        println!("{progress} {}", file.display());
                        downloaded_paths.push(file);
                    }
                    Err(e) => warn!("{progress} failed: {e}"),
                }
            }

            if zip {
                println!("Making zip file...");
                let dest = path.join(format!("{}_covers.zip", sanitize_file_name(&title)));
                if make_zip(&downloaded_paths, &dest)? {
                    for file in &downloaded_paths {
                        let _ = fs::remove_file(file);
                    }
                }
                println!("Done.");
            }
        }
    }

    Ok(())
}
