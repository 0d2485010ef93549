use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use snapframe::assets::{self, AssetRegistry};
use snapframe::capture::SubjectImage;
use snapframe::config::{EditorConfig, JsonFileStore, SettingsStore};
use snapframe::domain::{BackgroundType, EditorSettings, Snapshot};
use snapframe::pipeline::{AssetImageLoader, FileSaver, ImageCache, RenderPipeline};
use snapframe::render::text::FontBook;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Background {
    Transparent,
    White,
    Black,
    Gray,
}

/// Frame a screenshot on a background and export it as PNG
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Screenshot to frame: path, file:// URL or data URL
    input: String,

    /// Output file; defaults to a timestamped file in the export directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Solid background instead of the configured image
    #[arg(long, value_enum, conflicts_with_all = ["color", "image"])]
    background: Option<Background>,

    /// Custom background colour, #rrggbb
    #[arg(long, conflicts_with = "image")]
    color: Option<String>,

    /// Background asset id (bg-18, mac-7, gradient-3, ...) or image path
    #[arg(long)]
    image: Option<String>,

    /// Border around the screenshot, px (0-200)
    #[arg(long)]
    padding: Option<u32>,

    /// Corner radius, px (0-50)
    #[arg(long)]
    radius: Option<u32>,

    /// Background noise (0-100)
    #[arg(long)]
    noise: Option<u32>,

    /// Background blur, px (0-100)
    #[arg(long)]
    blur: Option<u32>,
}

impl Args {
    fn settings(&self, config: &EditorConfig) -> EditorSettings {
        let mut settings = EditorSettings {
            selected_image: Some(config.default_background.clone()),
            ..Default::default()
        };
        if let Some(background) = self.background {
            settings.background_type = match background {
                Background::Transparent => BackgroundType::Transparent,
                Background::White => BackgroundType::White,
                Background::Black => BackgroundType::Black,
                Background::Gray => BackgroundType::Gray,
            };
        }
        if let Some(color) = &self.color {
            settings.background_type = BackgroundType::Custom;
            settings.custom_color = color.clone();
        }
        if let Some(image) = &self.image {
            match assets::gradient(image) {
                Some(gradient) => {
                    settings.background_type = BackgroundType::Gradient;
                    settings.gradient = gradient;
                }
                None => {
                    settings.background_type = BackgroundType::Image;
                    settings.selected_image = Some(image.clone());
                }
            }
        }
        if let Some(padding) = self.padding {
            settings.padding = padding;
        }
        if let Some(radius) = self.radius {
            settings.border_radius = radius;
        }
        if let Some(noise) = self.noise {
            settings.noise_amount = noise;
        }
        if let Some(blur) = self.blur {
            settings.blur_amount = blur;
        }
        settings.clamped()
    }
}

async fn load_config() -> EditorConfig {
    let Some(path) = JsonFileStore::default_path() else {
        return EditorConfig::default();
    };
    match JsonFileStore::open(&path).await {
        Ok(store) => EditorConfig::load(&store as &dyn SettingsStore).await,
        Err(e) => {
            log::warn!("Using default configuration: {}", e);
            EditorConfig::default()
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let config = load_config().await;
    let subject = SubjectImage::load(&args.input)
        .await
        .with_context(|| format!("Failed to load screenshot {}", args.input))?;

    let registry = match &config.tuning.asset_root {
        Some(root) => AssetRegistry::new(root),
        None => AssetRegistry::from_data_dir(),
    };
    let cache = ImageCache::new(
        config.tuning.image_cache_capacity,
        Arc::new(AssetImageLoader::new(registry)),
    );
    let fonts = FontBook::with_system_fallback(&config.tuning.font_paths);
    let pipeline = RenderPipeline::new(
        subject,
        Arc::new(cache),
        Arc::new(fonts),
        std::time::Duration::from_millis(config.tuning.preview_debounce_ms),
    );

    let snapshot = Snapshot {
        settings: args.settings(&config),
        ..Default::default()
    };
    let saver = match &args.output {
        Some(path) => FileSaver::at(path),
        None => FileSaver::in_dir(config.export_dir()),
    };
    let path = pipeline
        .save(&snapshot, &saver)
        .await
        .context("Failed to export screenshot")?;
    println!("{}", path.display());
    Ok(())
}
