use std::path::{Path, PathBuf};

use canvas::crop::Focus;
use canvas::geometry::PixelRect;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::{Value, json};
use store::model::{RegionPatch, StatusFilter, region_label};
use store::services::transfer::{DataUrlCodec, InterchangeDocument};
use store::{Store, StoreConfig, StoreError};


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0} [{code}]", code = .0.error_code())]
    Store(#[from] StoreError),
    #[error("io error on {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("image write failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("region rejected: too small, outside the image, or a near-duplicate")]
    Rejected,
    #[error("preview superseded by a newer request")]
    Superseded,
}

#[derive(Parser, Debug)]
#[command(name = "tracker", about = "Collection tracker store CLI")]
struct Cli {
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Re-run the data migration over collections still on an old version.
    Migrate,
    Collection(CollectionCommand),
    Image(ImageCommand),
    Region(RegionCommand),
    /// Write a region thumbnail as PNG.
    Thumb {
        region_id: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Write a collection cover as PNG.
    Cover {
        collection_id: String,
        #[arg(long)]
        out: PathBuf,
    },
    Export {
        #[arg(long)]
        out: PathBuf,
    },
    /// Replace all data with an exported document.
    Import {
        path: PathBuf,
    },
}

#[derive(Args, Debug)]
struct CollectionCommand {
    #[command(subcommand)]
    command: CollectionSubcommand,
}

#[derive(Subcommand, Debug)]
enum CollectionSubcommand {
    List,
    Create {
        #[arg(long)]
        name: Option<String>,
    },
    Rename {
        collection_id: String,
        name: String,
    },
    SetCover {
        collection_id: String,
        #[arg(long)]
        image_id: Option<String>,
        #[arg(long, default_value_t = 50.0)]
        focus_x: f64,
        #[arg(long, default_value_t = 50.0)]
        focus_y: f64,
        #[arg(long, default_value_t = 1.0)]
        zoom: f64,
    },
    Delete {
        collection_id: String,
    },
}

#[derive(Args, Debug)]
struct ImageCommand {
    #[command(subcommand)]
    command: ImageSubcommand,
}

#[derive(Subcommand, Debug)]
enum ImageSubcommand {
    List {
        collection_id: String,
    },
    Add {
        collection_id: String,
        path: PathBuf,
    },
    Title {
        image_id: String,
        title: Option<String>,
    },
    Delete {
        image_id: String,
    },
}

#[derive(Args, Debug)]
struct RegionCommand {
    #[command(subcommand)]
    command: RegionSubcommand,
}

#[derive(Subcommand, Debug)]
enum RegionSubcommand {
    List {
        collection_id: String,
        #[arg(long, value_enum, default_value_t = StatusArg::All)]
        status: StatusArg,
        #[arg(long)]
        image_id: Option<String>,
    },
    Add {
        image_id: String,
        #[arg(long)]
        x: i64,
        #[arg(long)]
        y: i64,
        #[arg(long)]
        w: i64,
        #[arg(long)]
        h: i64,
    },
    Set {
        region_id: String,
        #[arg(long)]
        found_trade: Option<bool>,
        #[arg(long)]
        received: Option<bool>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Delete the most recent region on an image.
    Undo {
        image_id: String,
    },
    Delete {
        region_id: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum StatusArg {
    All,
    FoundTrade,
    Received,
    Pending,
}

impl From<StatusArg> for StatusFilter {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::All => Self::All,
            StatusArg::FoundTrade => Self::FoundTrade,
            StatusArg::Received => Self::Received,
            StatusArg::Pending => Self::Pending,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    store::telemetry::init();
    let cli = Cli::parse();

    let mut config = StoreConfig::from_env();
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }
    let store = Store::open(config).await?;

    match cli.command {
        Command::Migrate => print_json(&store.migrate().await?),
        Command::Collection(c) => run_collection(&store, c).await,
        Command::Image(i) => run_image(&store, i).await,
        Command::Region(r) => run_region(&store, r).await,
        Command::Thumb { region_id, out } => {
            let image = store.region_thumbnail(&region_id).await?.ok_or(CliError::Superseded)?;
            image.save(&out)?;
            println!("{}", out.display());
            Ok(())
        }
        Command::Cover { collection_id, out } => {
            let image = store.collection_cover(&collection_id).await?.ok_or(CliError::Superseded)?;
            image.save(&out)?;
            println!("{}", out.display());
            Ok(())
        }
        Command::Export { out } => {
            let doc = store.export_document(&DataUrlCodec).await?;
            let rendered = doc.to_json_pretty().map_err(StoreError::from)?;
            std::fs::write(&out, rendered).map_err(|source| CliError::Io { path: out.clone(), source })?;
            println!("{}", out.display());
            Ok(())
        }
        Command::Import { path } => {
            let text = read_to_string(&path)?;
            let doc = InterchangeDocument::from_json(&text).map_err(StoreError::from)?;
            print_json(&store.import_document(doc, &DataUrlCodec).await?)
        }
    }
}

async fn run_collection(store: &Store, collection: CollectionCommand) -> Result<(), CliError> {
    match collection.command {
        CollectionSubcommand::List => {
            let mut rows = Vec::new();
            for c in store.list_collections().await? {
                let progress = store.progress(&c.id).await?;
                rows.push(json!({
                    "id": &c.id,
                    "name": c.display_name(),
                    "updated_at": c.updated_at,
                    "progress": progress,
                }));
            }
            print_json(&Value::Array(rows))
        }
        CollectionSubcommand::Create { name } => print_json(&store.create_collection(name.as_deref()).await?),
        CollectionSubcommand::Rename { collection_id, name } => {
            print_json(&store.rename_collection(&collection_id, &name).await?)
        }
        CollectionSubcommand::SetCover { collection_id, image_id, focus_x, focus_y, zoom } => {
            let c = store
                .set_cover(&collection_id, image_id.as_deref(), Focus::new(focus_x, focus_y), zoom)
                .await?;
            print_json(&c)
        }
        CollectionSubcommand::Delete { collection_id } => {
            store.delete_collection(&collection_id).await?;
            print_json(&json!({ "deleted": collection_id }))
        }
    }
}

async fn run_image(store: &Store, image: ImageCommand) -> Result<(), CliError> {
    match image.command {
        ImageSubcommand::List { collection_id } => print_json(&store.list_images(&collection_id).await?),
        ImageSubcommand::Add { collection_id, path } => {
            let bytes = std::fs::read(&path).map_err(|source| CliError::Io { path: path.clone(), source })?;
            print_json(&store.create_image(&collection_id, bytes).await?)
        }
        ImageSubcommand::Title { image_id, title } => {
            print_json(&store.set_image_title(&image_id, title.as_deref()).await?)
        }
        ImageSubcommand::Delete { image_id } => {
            store.delete_image(&image_id).await?;
            print_json(&json!({ "deleted": image_id }))
        }
    }
}

async fn run_region(store: &Store, region: RegionCommand) -> Result<(), CliError> {
    match region.command {
        RegionSubcommand::List { collection_id, status, image_id } => {
            let status = StatusFilter::from(status);
            let regions = store.list_regions_for_collection(&collection_id).await?;
            // Labels number the whole collection, so filter after enumerating.
            let labelled: Vec<Value> = regions
                .iter()
                .enumerate()
                .filter(|(_, r)| status.matches(r) && image_id.as_deref().is_none_or(|id| r.image_id == id))
                .map(|(pos, r)| json!({ "label": region_label(pos), "region": r }))
                .collect();
            print_json(&Value::Array(labelled))
        }
        RegionSubcommand::Add { image_id, x, y, w, h } => {
            let created = store.create_region(&image_id, PixelRect::new(x, y, w, h)).await?;
            print_json(&created.ok_or(CliError::Rejected)?)
        }
        RegionSubcommand::Set { region_id, found_trade, received, title, note } => {
            let patch = RegionPatch {
                found_trade,
                received,
                title: title.map(|t| Some(t).filter(|t| !t.trim().is_empty())),
                note,
                ..RegionPatch::default()
            };
            print_json(&store.update_region(&region_id, &patch).await?)
        }
        RegionSubcommand::Undo { image_id } => print_json(&store.delete_last_region(&image_id).await?),
        RegionSubcommand::Delete { region_id } => {
            store.delete_region(&region_id).await?;
            print_json(&json!({ "deleted": region_id }))
        }
    }
}

fn read_to_string(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io { path: path.to_path_buf(), source })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
