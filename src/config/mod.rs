use bevy::prelude::*;
use image::Rgba;
use masquerade::compositor::{ExportFormat, RenderOptions, TextStyle};
use masquerade::mask::{FillMode, SolidFill};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_JPEG_QUALITY, MAX_RECENT_IMAGES};

/// System set for config loading (other plugins can run after this)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigLoaded;

/// Container format picked for exports; quality lives next to it in the config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportKind {
    #[default]
    Png,
    Jpeg,
}

impl ExportKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ExportKind::Png => "PNG",
            ExportKind::Jpeg => "JPEG",
        }
    }
}

/// Application configuration persisted to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfigData {
    /// Recently opened images, newest first
    #[serde(default)]
    pub recent_images: Vec<PathBuf>,

    /// Directory the open dialog starts in
    #[serde(default)]
    pub last_image_dir: Option<PathBuf>,

    /// Images offered as ready-made substitutes in the fill menu
    #[serde(default)]
    pub substitute_presets: Vec<PathBuf>,

    /// Largest on-screen footprint of the image, in display pixels
    #[serde(default = "default_max_display_width")]
    pub max_display_width: u32,

    #[serde(default = "default_max_display_height")]
    pub max_display_height: u32,

    /// RGBA color of solid face discs
    #[serde(default = "default_solid_fill_color")]
    pub solid_fill_color: [u8; 4],

    /// RGBA color of text redaction boxes
    #[serde(default = "default_text_redaction_color")]
    pub text_redaction_color: [u8; 4],

    #[serde(default)]
    pub export_format: ExportKind,

    /// 1-100, only used for JPEG
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Whether exported solid discs keep their light outline
    #[serde(default = "default_true")]
    pub export_outline: bool,
}

fn default_max_display_width() -> u32 {
    800
}

fn default_max_display_height() -> u32 {
    600
}

fn default_solid_fill_color() -> [u8; 4] {
    [255, 255, 255, 255]
}

fn default_text_redaction_color() -> [u8; 4] {
    [255, 0, 0, 255]
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

fn default_true() -> bool {
    true
}

impl Default for AppConfigData {
    fn default() -> Self {
        Self {
            recent_images: Vec::new(),
            last_image_dir: None,
            substitute_presets: Vec::new(),
            max_display_width: default_max_display_width(),
            max_display_height: default_max_display_height(),
            solid_fill_color: default_solid_fill_color(),
            text_redaction_color: default_text_redaction_color(),
            export_format: ExportKind::default(),
            jpeg_quality: default_jpeg_quality(),
            export_outline: true,
        }
    }
}

impl AppConfigData {
    pub fn export_format(&self) -> ExportFormat {
        match self.export_format {
            ExportKind::Png => ExportFormat::Png,
            ExportKind::Jpeg => ExportFormat::Jpeg {
                quality: self.jpeg_quality.clamp(1, 100),
            },
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            draw_outline: self.export_outline,
        }
    }

    /// Solid disc fill; the outline keeps its stock color.
    pub fn solid_fill(&self) -> FillMode {
        FillMode::SolidColor(SolidFill {
            color: Rgba(self.solid_fill_color),
            ..SolidFill::default()
        })
    }

    pub fn text_style(&self) -> TextStyle {
        let color = Rgba(self.text_redaction_color);
        TextStyle {
            fill: color,
            stroke: color,
            ..TextStyle::default()
        }
    }

    pub fn max_display(&self) -> (f32, f32) {
        (
            self.max_display_width.max(1) as f32,
            self.max_display_height.max(1) as f32,
        )
    }
}

/// Runtime configuration resource
#[derive(Resource)]
pub struct AppConfig {
    /// The persisted configuration data
    pub data: AppConfigData,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Whether config needs to be saved (dirty flag)
    pub dirty: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: AppConfigData::default(),
            config_path: crate::paths::config_file(),
            dirty: false,
        }
    }
}

/// Resource to notify user when config was reset to defaults
#[derive(Resource, Default)]
pub struct ConfigResetNotification {
    /// Whether to show the notification dialog
    pub show: bool,
    /// The reason for the reset (parse error, read error, etc.)
    pub reason: Option<String>,
}

/// Message to trigger config save
#[derive(Message)]
pub struct SaveConfigRequest;

/// Message to put an image at the front of the recent list
#[derive(Message)]
pub struct AddRecentImageRequest {
    pub path: PathBuf,
}

/// Message to remember a substitute image as a preset
#[derive(Message)]
pub struct AddSubstitutePresetRequest {
    pub path: PathBuf,
}

/// Message to change how exports are encoded
#[derive(Message)]
pub struct UpdateExportSettingsRequest {
    pub format: ExportKind,
    pub jpeg_quality: u8,
    pub outline: bool,
}

/// Result of loading config from disk
pub struct LoadConfigResult {
    pub data: AppConfigData,
    /// Error message if config was reset to defaults due to an error
    pub reset_reason: Option<String>,
}

/// Load configuration from the platform config file
pub fn load_config() -> LoadConfigResult {
    load_config_from(&crate::paths::config_file())
}

pub fn load_config_from(config_path: &Path) -> LoadConfigResult {
    let (data, reset_reason) = if config_path.exists() {
        match std::fs::read_to_string(config_path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(data) => {
                    info!("Loaded config from {:?}", config_path);
                    (data, None)
                }
                Err(e) => {
                    warn!("Failed to parse config file: {}", e);
                    (
                        AppConfigData::default(),
                        Some(format!("Configuration file was corrupted: {}", e)),
                    )
                }
            },
            Err(e) => {
                warn!("Failed to read config file: {}", e);
                (
                    AppConfigData::default(),
                    Some(format!("Could not read configuration file: {}", e)),
                )
            }
        }
    } else {
        info!("No config file found, using defaults");
        (AppConfigData::default(), None)
    };

    LoadConfigResult { data, reset_reason }
}

/// Save configuration to disk
fn save_config(config: &AppConfig) {
    match serde_json::to_string_pretty(&config.data) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&config.config_path, json) {
                error!("Failed to save config: {}", e);
            } else {
                info!("Config saved to {:?}", config.config_path);
            }
        }
        Err(e) => {
            error!("Failed to serialize config: {}", e);
        }
    }
}

/// Move `path` to the front of `list`, dropping duplicates and trimming.
fn push_recent(list: &mut Vec<PathBuf>, path: &Path, max: usize) {
    list.retain(|p| p != path);
    list.insert(0, path.to_path_buf());
    list.truncate(max);
}

/// Startup system to load config from disk into the existing resource
fn load_config_system(
    mut config: ResMut<AppConfig>,
    mut reset_notification: ResMut<ConfigResetNotification>,
) {
    if let Err(e) = crate::paths::ensure_directories() {
        warn!("Failed to create app directories: {}", e);
    }

    let result = load_config_from(&config.config_path);
    config.data = result.data;
    config.dirty = false;

    if let Some(reason) = result.reset_reason {
        reset_notification.show = true;
        reset_notification.reason = Some(reason);
    }
}

/// Startup system dropping recent entries whose files are gone
fn prune_missing_recent_images(mut config: ResMut<AppConfig>) {
    let before = config.data.recent_images.len();
    config.data.recent_images.retain(|p| p.exists());
    let removed = before - config.data.recent_images.len();
    if removed > 0 {
        info!("Dropped {} missing images from the recent list", removed);
        config.dirty = true;
    }
}

/// System to save config when requested
fn save_config_system(
    mut events: MessageReader<SaveConfigRequest>,
    mut config: ResMut<AppConfig>,
) {
    for _ in events.read() {
        if config.dirty {
            save_config(&config);
            config.dirty = false;
        }
    }
}

fn add_recent_image_system(
    mut events: MessageReader<AddRecentImageRequest>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) {
    for event in events.read() {
        push_recent(&mut config.data.recent_images, &event.path, MAX_RECENT_IMAGES);
        config.data.last_image_dir = event.path.parent().map(Path::to_path_buf);
        config.dirty = true;
        save_events.write(SaveConfigRequest);
    }
}

fn add_substitute_preset_system(
    mut events: MessageReader<AddSubstitutePresetRequest>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) {
    for event in events.read() {
        if config.data.substitute_presets.contains(&event.path) {
            continue;
        }
        config.data.substitute_presets.push(event.path.clone());
        config.dirty = true;
        save_events.write(SaveConfigRequest);
        info!("Added substitute preset {:?}", event.path);
    }
}

fn update_export_settings_system(
    mut events: MessageReader<UpdateExportSettingsRequest>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) {
    for event in events.read() {
        config.data.export_format = event.format;
        config.data.jpeg_quality = event.jpeg_quality.clamp(1, 100);
        config.data.export_outline = event.outline;
        config.dirty = true;
        save_events.write(SaveConfigRequest);
    }
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AppConfig>()
            .init_resource::<ConfigResetNotification>()
            .add_message::<SaveConfigRequest>()
            .add_message::<AddRecentImageRequest>()
            .add_message::<AddSubstitutePresetRequest>()
            .add_message::<UpdateExportSettingsRequest>()
            .add_systems(
                Startup,
                (load_config_system, prune_missing_recent_images)
                    .chain()
                    .in_set(ConfigLoaded),
            )
            .add_systems(
                Update,
                (
                    add_recent_image_system.run_if(on_message::<AddRecentImageRequest>),
                    add_substitute_preset_system.run_if(on_message::<AddSubstitutePresetRequest>),
                    update_export_settings_system
                        .run_if(on_message::<UpdateExportSettingsRequest>),
                    save_config_system.run_if(on_message::<SaveConfigRequest>),
                )
                    .chain(),
            );
    }
}
