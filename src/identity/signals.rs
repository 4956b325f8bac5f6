use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Local;

/// Fixed text drawn into the canvas probe.
pub const CANVAS_LABEL: &str = "Club Browser ID";

/// Screen geometry as reported by the display environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenInfo {
    // ---
    pub width: u32,
    pub height: u32,
    pub color_depth: u32,
    pub avail_width: u32,
    pub avail_height: u32,
}

/// Snapshot of the observable signals that feed an identifier.
///
/// Optional fields are ones an environment may decline to expose; a missing
/// user agent or canvas token means fingerprinting is unsupported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentSignals {
    // ---
    pub screen: ScreenInfo,

    /// IANA timezone name; empty when the host does not expose one.
    pub timezone: String,

    /// Minutes to add to local time to get UTC.
    pub timezone_offset_minutes: i32,

    pub language: String,
    pub languages: Vec<String>,
    pub platform: String,
    pub user_agent: Option<String>,

    /// Logical processor count; 0 when unknown.
    pub hardware_concurrency: u32,

    /// Approximate device memory in GiB.
    pub device_memory: Option<f64>,

    /// Opaque token read back from a rendered canvas.
    pub canvas_token: Option<String>,

    pub cookie_enabled: bool,
    pub do_not_track: Option<String>,
}

/// Source of environment signals.
///
/// Every ambient read goes through this trait so identity generation can be
/// driven by fixed values in tests.
pub trait SignalProvider: Send + Sync {
    // ---
    fn read_signals(&self) -> EnvironmentSignals;
}

/// Provider returning the same signals on every read.
#[derive(Debug, Clone, Default)]
pub struct StaticSignals {
    // ---
    signals: EnvironmentSignals,
}

impl StaticSignals {
    // ---
    pub fn new(signals: EnvironmentSignals) -> Self {
        // ---
        Self { signals }
    }
}

impl SignalProvider for StaticSignals {
    // ---
    fn read_signals(&self) -> EnvironmentSignals {
        self.signals.clone()
    }
}

/// Provider reading what a headless host process can observe: OS and
/// architecture, locale environment variables, local UTC offset and
/// processor count. There is no display, so screen geometry is zero.
#[derive(Debug, Clone, Default)]
pub struct HostSignals;

impl HostSignals {
    // ---
    pub fn new() -> Self {
        HostSignals
    }
}

/// Turn a POSIX locale such as `en_US.UTF-8` into a language tag (`en-US`).
fn language_tag(locale: &str) -> Option<String> {
    // ---
    let base = locale.split(['.', '@']).next()?.trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(base.replace('_', "-"))
}

/// IANA zone name: `TZ` when set (a leading `:` is dropped), otherwise the
/// system zone. Empty when neither is known, so the name never disagrees
/// with the offset chrono reports for the same environment.
fn timezone_name(tz: Option<String>, system: impl FnOnce() -> Option<String>) -> String {
    // ---
    tz.map(|tz| tz.trim_start_matches(':').trim().to_string())
        .filter(|tz| !tz.is_empty())
        .or_else(system)
        .unwrap_or_default()
}

fn host_platform() -> String {
    format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}

/// Deterministic stand-in for a canvas readback on hosts without a canvas.
fn host_canvas_token(platform: &str) -> String {
    // ---
    let payload = format!("{CANVAS_LABEL}|14px|{platform}|{}", std::env::consts::FAMILY);
    format!("data:image/png;base64,{}", STANDARD.encode(payload))
}

impl SignalProvider for HostSignals {
    // ---
    fn read_signals(&self) -> EnvironmentSignals {
        // ---
        let platform = host_platform();

        let language = ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|key| std::env::var(key).ok())
            .find_map(|value| language_tag(&value))
            .unwrap_or_else(|| "en-US".to_string());

        let mut languages: Vec<String> = std::env::var("LANGUAGE")
            .ok()
            .map(|list| list.split(':').filter_map(language_tag).collect())
            .unwrap_or_default();
        if languages.is_empty() {
            languages.push(language.clone());
        }

        let offset_secs = Local::now().offset().local_minus_utc();

        EnvironmentSignals {
            screen: ScreenInfo::default(),
            timezone: timezone_name(std::env::var("TZ").ok(), || {
                iana_time_zone::get_timezone().ok()
            }),
            timezone_offset_minutes: -offset_secs / 60,
            language,
            languages,
            user_agent: Some(format!(
                "{}/{} ({})",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                platform
            )),
            hardware_concurrency: std::thread::available_parallelism()
                .map(|n| n.get() as u32)
                .unwrap_or(0),
            device_memory: None,
            canvas_token: Some(host_canvas_token(&platform)),
            cookie_enabled: true,
            do_not_track: std::env::var("DO_NOT_TRACK").ok(),
            platform,
        }
    }
}
