use configparser::ini::Ini;
use log::{info, warn};
use once_cell::sync::Lazy;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

// Display
pub const DEFAULT_DISPLAY_WIDTH: u32 = 1280;
pub const DEFAULT_DISPLAY_HEIGHT: u32 = 720;
pub const DEFAULT_FRAME_BUDGET_MS: f32 = 16.6;

// Timing
pub const DEFAULT_GLOBAL_OFFSET_SECONDS: f64 = 0.0;
pub const DEFAULT_LEAD_IN_SECONDS: f64 = 1.0;
pub const DEFAULT_RESYNC_THRESHOLD_SECONDS: f64 = 0.05;
pub const DEFAULT_DRIFT_CORRECTION: f64 = 0.1;

// Notes
pub const DEFAULT_NOTE_SPEED_SCALE: f32 = 0.6; // stage heights per chart-position unit
pub const DEFAULT_VISIBILITY_WINDOW_BEATS: f64 = 16.0;
pub const SIMULTANEOUS_BEAT_EPSILON: f64 = 1e-6;

// Effects
pub const DEFAULT_HIT_EFFECT_DURATION_SECONDS: f64 = 0.5;
pub const DEFAULT_HOLD_EFFECT_INTERVAL_BEATS: f64 = 0.5;

// Line channel defaults (stage fractions / degrees / alpha)
pub const DEFAULT_LINE_X: f64 = 0.5;
pub const DEFAULT_LINE_Y: f64 = 0.5;
pub const DEFAULT_LINE_ROTATION: f64 = 0.0;
pub const DEFAULT_LINE_OPACITY: f64 = 1.0;

// Draw sizes, as fractions of stage width/height
pub const LINE_WIDTH_FRAC: f32 = 2.0; // lines run well past the stage edges
pub const LINE_THICKNESS_FRAC: f32 = 0.0075;
pub const NOTE_WIDTH_FRAC: f32 = 0.1;
pub const NOTE_HEIGHT_FRAC: f32 = 0.015;
pub const HIT_EFFECT_SIZE_FRAC: f32 = 0.12;

// Texture ids handed to the presentation layer
pub const TEX_JUDGE_LINE: &str = "judge_line";
pub const TEX_TAP: &str = "tap";
pub const TEX_TAP_HL: &str = "tap_hl";
pub const TEX_DRAG: &str = "drag";
pub const TEX_DRAG_HL: &str = "drag_hl";
pub const TEX_FLICK: &str = "flick";
pub const TEX_FLICK_HL: &str = "flick_hl";
pub const TEX_HOLD_HEAD: &str = "hold_head";
pub const TEX_HOLD_HEAD_HL: &str = "hold_head_hl";
pub const TEX_HOLD_BODY: &str = "hold_body";
pub const TEX_HIT_EFFECT: &str = "hit_effect";

// Z layers (higher draws on top)
pub const Z_LINE: i16 = 0;
pub const Z_HOLD: i16 = 10;
pub const Z_DRAG: i16 = 11;
pub const Z_TAP: i16 = 12;
pub const Z_FLICK: i16 = 13;
pub const Z_HIT_EFFECT: i16 = 20;

const DEFAULT_CONFIG_PATH: &str = "phichart.ini";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub display_width: u32,
    pub display_height: u32,
    pub frame_budget_ms: f32,
    pub global_offset_seconds: f64,
    pub lead_in_seconds: f64,
    pub resync_threshold_seconds: f64,
    pub drift_correction: f64,
    pub note_speed_scale: f32,
    pub visibility_window_beats: f64,
    pub hide_notes_behind_line: bool,
    pub hit_effect_duration_seconds: f64,
    pub hold_effect_interval_beats: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display_width: DEFAULT_DISPLAY_WIDTH,
            display_height: DEFAULT_DISPLAY_HEIGHT,
            frame_budget_ms: DEFAULT_FRAME_BUDGET_MS,
            global_offset_seconds: DEFAULT_GLOBAL_OFFSET_SECONDS,
            lead_in_seconds: DEFAULT_LEAD_IN_SECONDS,
            resync_threshold_seconds: DEFAULT_RESYNC_THRESHOLD_SECONDS,
            drift_correction: DEFAULT_DRIFT_CORRECTION,
            note_speed_scale: DEFAULT_NOTE_SPEED_SCALE,
            visibility_window_beats: DEFAULT_VISIBILITY_WINDOW_BEATS,
            hide_notes_behind_line: true,
            hit_effect_duration_seconds: DEFAULT_HIT_EFFECT_DURATION_SECONDS,
            hold_effect_interval_beats: DEFAULT_HOLD_EFFECT_INTERVAL_BEATS,
        }
    }
}

impl Config {
    /// Builds a config from INI text. Missing or malformed keys keep their defaults.
    pub fn from_ini_str(text: &str) -> Result<Self, String> {
        let mut ini = Ini::new();
        ini.read(text.to_string())?;
        Ok(Self::from_ini(&ini))
    }

    fn from_ini(ini: &Ini) -> Self {
        let d = Self::default();
        Self {
            display_width: read_parsed(ini, "Display", "DisplayWidth", d.display_width),
            display_height: read_parsed(ini, "Display", "DisplayHeight", d.display_height),
            frame_budget_ms: read_parsed(ini, "Display", "FrameBudgetMs", d.frame_budget_ms),
            global_offset_seconds: read_parsed(ini, "Timing", "GlobalOffsetSeconds", d.global_offset_seconds),
            lead_in_seconds: read_parsed(ini, "Timing", "LeadInSeconds", d.lead_in_seconds),
            resync_threshold_seconds: read_parsed(
                ini,
                "Timing",
                "ResyncThresholdSeconds",
                d.resync_threshold_seconds,
            ),
            drift_correction: read_parsed(ini, "Timing", "DriftCorrection", d.drift_correction)
                .clamp(0.0, 1.0),
            note_speed_scale: read_parsed(ini, "Notes", "NoteSpeedScale", d.note_speed_scale),
            visibility_window_beats: read_parsed(
                ini,
                "Notes",
                "VisibilityWindowBeats",
                d.visibility_window_beats,
            ),
            hide_notes_behind_line: ini
                .get("Notes", "HideNotesBehindLine")
                .and_then(|v| v.trim().parse::<u8>().ok())
                .map_or(d.hide_notes_behind_line, |v| v != 0),
            hit_effect_duration_seconds: read_parsed(
                ini,
                "Effects",
                "HitEffectDurationSeconds",
                d.hit_effect_duration_seconds,
            ),
            hold_effect_interval_beats: read_parsed(
                ini,
                "Effects",
                "HoldEffectIntervalBeats",
                d.hold_effect_interval_beats,
            ),
        }
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        ini.set("Display", "DisplayWidth", Some(self.display_width.to_string()));
        ini.set("Display", "DisplayHeight", Some(self.display_height.to_string()));
        ini.set("Display", "FrameBudgetMs", Some(self.frame_budget_ms.to_string()));
        ini.set("Timing", "GlobalOffsetSeconds", Some(self.global_offset_seconds.to_string()));
        ini.set("Timing", "LeadInSeconds", Some(self.lead_in_seconds.to_string()));
        ini.set("Timing", "ResyncThresholdSeconds", Some(self.resync_threshold_seconds.to_string()));
        ini.set("Timing", "DriftCorrection", Some(self.drift_correction.to_string()));
        ini.set("Notes", "NoteSpeedScale", Some(self.note_speed_scale.to_string()));
        ini.set("Notes", "VisibilityWindowBeats", Some(self.visibility_window_beats.to_string()));
        ini.set(
            "Notes",
            "HideNotesBehindLine",
            Some(if self.hide_notes_behind_line { "1" } else { "0" }.to_string()),
        );
        ini.set(
            "Effects",
            "HitEffectDurationSeconds",
            Some(self.hit_effect_duration_seconds.to_string()),
        );
        ini.set(
            "Effects",
            "HoldEffectIntervalBeats",
            Some(self.hold_effect_interval_beats.to_string()),
        );
        ini
    }
}

fn read_parsed<T: std::str::FromStr + Copy>(ini: &Ini, section: &str, key: &str, default: T) -> T {
    match ini.get(section, key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                warn!("Invalid value '{}' for [{}] {}, using default.", raw, section, key);
                default
            }
        },
        None => default,
    }
}

static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::default()));

fn create_default_file(path: &Path) -> Result<(), std::io::Error> {
    info!("Config file not found, creating defaults at '{}'.", path.display());
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Config::default().to_ini().write(path)
}

/// Loads the config from `path` (or `phichart.ini`), creating it with defaults if absent.
pub fn load(path: Option<&Path>) {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    if !path.exists() {
        if let Err(e) = create_default_file(path) {
            warn!("Failed to create default config file: {}", e);
            // Proceed with default struct values.
            return;
        }
    }

    let mut ini = Ini::new();
    let loaded = match ini.load(path) {
        Ok(_) => Config::from_ini(&ini),
        Err(e) => {
            warn!("Failed to load '{}' ({}), using defaults.", path.display(), e);
            Config::default()
        }
    };
    info!("Config loaded from '{}'.", path.display());
    match CONFIG.lock() {
        Ok(mut config) => *config = loaded,
        Err(poisoned) => *poisoned.into_inner() = loaded,
    }
}

/// Returns a copy of the currently loaded config.
pub fn get() -> Config {
    match CONFIG.lock() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}
