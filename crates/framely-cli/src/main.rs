//! Framely CLI: the four Framely pages from the command line.
//!
//! Set FRAMELY_TOKEN (a session token), FRAMELY_API_URL and FRAMELY_CLOUD_NAME.

use anyhow::Context;
use clap::{Parser, Subcommand};
use framely_api_client::pages::{
    delivery_target_from_env, BackgroundRemovalPage, GenerativeBackgroundPage, LocalFile,
    SocialSharePage, VideoUploadPage,
};
use framely_api_client::ApiClient;
use framely_cli::{format_video_table, init_tracing};
use framely_core::SocialFormat;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "framely", about = "Framely media tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove the background of an image and download the result
    RemoveBackground {
        /// Image to upload
        file: PathBuf,
        /// Directory the rendition is saved into
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Replace the background of an image with a generated one
    GenerativeBackground {
        /// Image to upload
        file: PathBuf,
        /// Description of the new background
        #[arg(long)]
        prompt: Option<String>,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Crop an image for a social media format
    SocialShare {
        /// Image to upload
        file: PathBuf,
        /// Format name, e.g. "Twitter Header (3:1)" (see `formats`)
        #[arg(long)]
        format: Option<String>,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// List the social media formats
    Formats,
    /// Upload a video with its title and description
    VideoUpload {
        /// Video to upload
        file: PathBuf,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Also download the 1280x720 preview into this directory
        #[arg(long)]
        download: Option<PathBuf>,
    },
    /// List uploaded videos, newest first
    Videos {
        #[arg(long, default_value = "20")]
        limit: i64,
        #[arg(long, default_value = "0")]
        offset: i64,
        /// Output format: json or table
        #[arg(long, default_value = "table")]
        output: String,
    },
    /// Get a single video by ID
    Video {
        /// Video UUID
        id: uuid::Uuid,
    },
    /// Show the identity behind FRAMELY_TOKEN
    Whoami,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Commands::Formats = cli.command {
        return print_json(&SocialFormat::all());
    }

    let client = ApiClient::from_env()
        .context("Failed to create API client. Set FRAMELY_TOKEN and FRAMELY_API_URL")?;

    match cli.command {
        Commands::RemoveBackground { file, out } => {
            let file = LocalFile::open(file)?;
            let target = delivery_target_from_env()?;
            let mut page = BackgroundRemovalPage::background_removal(client, target);
            let public_id = page.upload_image(&file).await?;
            let saved = page.download(&out).await?;
            print_json(&serde_json::json!({
                "publicId": public_id,
                "url": page.session().current_url(),
                "saved": saved,
            }))?;
        }
        Commands::GenerativeBackground { file, prompt, out } => {
            let file = LocalFile::open(file)?;
            let target = delivery_target_from_env()?;
            let mut page = GenerativeBackgroundPage::generative_background(client, target);
            let public_id = page.upload_image(&file).await?;
            if let Some(prompt) = prompt {
                page.apply_prompt(&prompt).await?;
            }
            let saved = page.download(&out).await?;
            print_json(&serde_json::json!({
                "publicId": public_id,
                "prompt": page.session().recipe().applied(),
                "url": page.session().current_url(),
                "saved": saved,
            }))?;
        }
        Commands::SocialShare { file, format, out } => {
            let format = match format {
                Some(name) => Some(SocialFormat::by_name(&name).with_context(|| {
                    format!("Unknown format '{}'. Run `framely formats` for the list", name)
                })?),
                None => None,
            };
            let file = LocalFile::open(file)?;
            let target = delivery_target_from_env()?;
            let mut page = SocialSharePage::social_share(client, target);
            let public_id = page.upload_image(&file).await?;
            if let Some(format) = format {
                page.select_format(format).await?;
            }
            let saved = page.download(&out).await?;
            print_json(&serde_json::json!({
                "publicId": public_id,
                "format": page.session().recipe().format(),
                "url": page.session().current_url(),
                "saved": saved,
            }))?;
        }
        Commands::VideoUpload {
            file,
            title,
            description,
            download,
        } => {
            let file = LocalFile::open(file)?;
            let target = delivery_target_from_env()?;
            let mut page = VideoUploadPage::video_upload(client, target);
            let video = page.upload_video(&file, &title, &description).await?;
            let saved = match download {
                Some(dir) => Some(page.download(&dir).await?),
                None => None,
            };
            print_json(&serde_json::json!({
                "video": video,
                "previewUrl": page.session().current_url(),
                "saved": saved,
            }))?;
        }
        Commands::Videos {
            limit,
            offset,
            output,
        } => {
            let videos = client.list_videos(limit, offset).await?;
            match output.as_str() {
                "json" => print_json(&videos)?,
                "table" => print!("{}", format_video_table(&videos)),
                other => anyhow::bail!("Invalid output format '{}'. Must be: json or table", other),
            }
        }
        Commands::Video { id } => {
            let video = client.get_video(id).await?;
            print_json(&video)?;
        }
        Commands::Whoami => {
            let session = client.session().await?;
            print_json(&session)?;
        }
        Commands::Formats => {}
    }

    Ok(())
}
