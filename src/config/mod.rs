//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{env, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::domain::locale::LocaleSet;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "config/local";
const DEFAULT_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_LOCALES: [&str; 2] = ["en", "zh"];
const DEFAULT_LOCALE: &str = "en";
const DEFAULT_AVATAR: &str = "/me.png";
const DEFAULT_COUNTRY: &str = "Singapore";
const DEFAULT_CONTENT_DIR: &str = "content";
const DEFAULT_FONT_FAMILY: &str = "Inter";
const DEFAULT_FONT_CSS_URL: &str = "https://fonts.googleapis.com/css2";
const DEFAULT_OG_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ANALYTICS_TIMEOUT_SECS: u64 = 10;

const GA4_PROPERTY_ID_VAR: &str = "GA4_PROPERTY_ID";
const GA4_CLIENT_EMAIL_VAR: &str = "GA4_CLIENT_EMAIL";
const GA4_PRIVATE_KEY_VAR: &str = "GA4_PRIVATE_KEY";

/// Command-line arguments for the folio binary.
#[derive(Debug, Parser)]
#[command(name = "folio", version, about = "Portfolio and blog server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "FOLIO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Serve the site over HTTP.
    Serve(Box<ServeArgs>),
    /// Load all content, print a summary, and exit.
    Check(CheckArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct CheckArgs {
    /// Override the content directory.
    #[arg(long = "content-dir", value_name = "PATH")]
    pub content_dir: Option<PathBuf>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "host", value_name = "HOST")]
    pub host: Option<String>,

    /// Override the listener port.
    #[arg(long = "port", value_name = "PORT")]
    pub port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the content directory.
    #[arg(long = "content-dir", value_name = "PATH")]
    pub content_dir: Option<PathBuf>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub site: SiteSettings,
    pub content: ContentSettings,
    pub analytics: AnalyticsSettings,
    pub og_image: OgImageSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: bool,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    /// Public origin; the path always ends with `/`.
    pub url: Url,
    pub locales: LocaleSet,
    pub avatar: String,
    pub last_updated: Option<String>,
    pub country: String,
    pub repository_url: Option<String>,
    /// Content of the `baidu-site-verification` meta tag.
    pub baidu_verification: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ContentSettings {
    pub dir: PathBuf,
}

/// GA4 service-account credentials. Any of them may be absent.
#[derive(Debug, Clone)]
pub struct AnalyticsSettings {
    pub property_id: Option<String>,
    pub client_email: Option<String>,
    pub private_key: Option<String>,
    /// Applies to the token exchange and each report request.
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct OgImageSettings {
    pub font_family: String,
    pub font_css_url: Url,
    pub timeout: Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("FOLIO").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_ga4_environment();

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Check(args)) => raw.apply_content_override(args.content_dir.as_ref()),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    site: RawSiteSettings,
    content: RawContentSettings,
    analytics: RawAnalyticsSettings,
    og_image: RawOgImageSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        self.apply_content_override(overrides.content_dir.as_ref());
    }

    fn apply_content_override(&mut self, dir: Option<&PathBuf>) {
        if let Some(dir) = dir {
            self.content.dir = Some(dir.clone());
        }
    }

    /// Fill credentials left unset by the config sources from the conventional GA4 variables.
    fn apply_ga4_environment(&mut self) {
        let analytics = &mut self.analytics;
        for (slot, var) in [
            (&mut analytics.ga4_property_id, GA4_PROPERTY_ID_VAR),
            (&mut analytics.ga4_client_email, GA4_CLIENT_EMAIL_VAR),
            (&mut analytics.ga4_private_key, GA4_PRIVATE_KEY_VAR),
        ] {
            if slot.is_none() {
                *slot = env::var(var).ok();
            }
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            site,
            content,
            analytics,
            og_image,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let site = build_site_settings(site)?;
        let content = build_content_settings(content);
        let analytics = build_analytics_settings(analytics)?;
        let og_image = build_og_image_settings(og_image)?;

        Ok(Self {
            server,
            logging,
            site,
            content,
            analytics,
            og_image,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let addr_text = server.addr.unwrap_or_else(|| DEFAULT_ADDR.to_string());
    let mut addr: SocketAddr = addr_text.trim().parse().map_err(|err| {
        LoadError::invalid("server.addr", format!("invalid address `{addr_text}`: {err}"))
    })?;

    if server.host.is_some() || server.port.is_some() {
        let host = server.host.unwrap_or_else(|| addr.ip().to_string());
        let port = server.port.unwrap_or(addr.port());
        if port == 0 {
            return Err(LoadError::invalid(
                "server.port",
                "port must be greater than zero",
            ));
        }
        addr = parse_socket_addr(&host, port)
            .map_err(|reason| LoadError::invalid("server.addr", reason))?;
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: server.graceful_shutdown.unwrap_or(true),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let url = site
        .url
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| LoadError::invalid("site.url", "a public site URL is required"))?;
    let url = normalize_site_url(url)?;

    let tags = site
        .locales
        .unwrap_or_else(|| DEFAULT_LOCALES.iter().map(|tag| tag.to_string()).collect());
    let default_locale = site
        .default_locale
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string());
    let locales = LocaleSet::new(&tags, &default_locale)
        .map_err(|err| LoadError::invalid("site.locales", err.to_string()))?;

    let avatar = non_empty(site.avatar).unwrap_or_else(|| DEFAULT_AVATAR.to_string());
    let country = non_empty(site.country).unwrap_or_else(|| DEFAULT_COUNTRY.to_string());

    Ok(SiteSettings {
        url,
        locales,
        avatar,
        last_updated: non_empty(site.last_updated),
        country,
        repository_url: non_empty(site.repository_url),
        baidu_verification: non_empty(site.baidu_verification),
    })
}

fn normalize_site_url(value: &str) -> Result<Url, LoadError> {
    let mut url =
        Url::parse(value).map_err(|err| LoadError::invalid("site.url", err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(LoadError::invalid("site.url", "scheme must be http or https"));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn build_content_settings(content: RawContentSettings) -> ContentSettings {
    ContentSettings {
        dir: content
            .dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTENT_DIR)),
    }
}

fn build_analytics_settings(
    analytics: RawAnalyticsSettings,
) -> Result<AnalyticsSettings, LoadError> {
    let timeout_secs = analytics
        .timeout_secs
        .unwrap_or(DEFAULT_ANALYTICS_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "analytics.timeout_secs",
            "must be greater than zero",
        ));
    }

    Ok(AnalyticsSettings {
        property_id: non_empty(analytics.ga4_property_id),
        client_email: non_empty(analytics.ga4_client_email),
        private_key: non_empty(analytics.ga4_private_key).map(|key| key.replace("\\n", "\n")),
        timeout: Duration::from_secs(timeout_secs),
    })
}

fn build_og_image_settings(og: RawOgImageSettings) -> Result<OgImageSettings, LoadError> {
    let font_family = non_empty(og.font_family).unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string());
    let css_url = non_empty(og.font_css_url).unwrap_or_else(|| DEFAULT_FONT_CSS_URL.to_string());
    let font_css_url = Url::parse(&css_url)
        .map_err(|err| LoadError::invalid("og_image.font_css_url", err.to_string()))?;

    let timeout_secs = og.timeout_secs.unwrap_or(DEFAULT_OG_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "og_image.timeout_secs",
            "must be greater than zero",
        ));
    }

    Ok(OgImageSettings {
        font_family,
        font_css_url,
        timeout: Duration::from_secs(timeout_secs),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    addr: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    url: Option<String>,
    locales: Option<Vec<String>>,
    default_locale: Option<String>,
    avatar: Option<String>,
    last_updated: Option<String>,
    country: Option<String>,
    repository_url: Option<String>,
    baidu_verification: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentSettings {
    dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAnalyticsSettings {
    ga4_property_id: Option<String>,
    ga4_client_email: Option<String>,
    ga4_private_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawOgImageSettings {
    font_family: Option<String>,
    font_css_url: Option<String>,
    timeout_secs: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    fn raw_with_site() -> RawSettings {
        let mut raw = RawSettings::default();
        raw.site.url = Some("https://example.com".to_string());
        raw
    }

    #[test]
    fn cli_overrides_take_highest_precedence() {
        let mut raw = raw_with_site();
        raw.server.addr = Some("0.0.0.0:4000".to_string());
        raw.logging.level = Some("info".to_string());

        let overrides = ServeOverrides {
            port: Some(4321),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert_eq!(settings.server.addr.to_string(), "0.0.0.0:4321");
        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    }

    #[test]
    fn defaults_apply_when_only_the_site_url_is_set() {
        let settings = Settings::from_raw(raw_with_site()).expect("valid settings");

        assert_eq!(settings.server.addr.to_string(), DEFAULT_ADDR);
        assert!(settings.server.graceful_shutdown);
        assert_eq!(settings.site.url.as_str(), "https://example.com/");
        assert_eq!(settings.site.locales.default_locale().as_str(), "en");
        assert_eq!(settings.site.locales.iter().count(), 2);
        assert_eq!(settings.site.avatar, "/me.png");
        assert_eq!(settings.site.country, "Singapore");
        assert!(settings.site.baidu_verification.is_none());
        assert_eq!(settings.content.dir, PathBuf::from("content"));
        assert_eq!(settings.og_image.font_family, "Inter");
        assert_eq!(settings.og_image.timeout, Duration::from_secs(10));
        assert_eq!(settings.analytics.timeout, Duration::from_secs(10));
        assert!(matches!(settings.logging.format, LogFormat::Compact));
    }

    #[test]
    fn blank_baidu_verification_is_dropped() {
        let mut raw = raw_with_site();
        raw.site.baidu_verification = Some("  ".to_string());
        let settings = Settings::from_raw(raw).expect("valid settings");
        assert!(settings.site.baidu_verification.is_none());

        let mut raw = raw_with_site();
        raw.site.baidu_verification = Some("codeva-abc123".to_string());
        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(
            settings.site.baidu_verification.as_deref(),
            Some("codeva-abc123")
        );
    }

    #[test]
    fn site_url_is_required() {
        let err = Settings::from_raw(RawSettings::default()).expect_err("missing url");
        assert!(matches!(err, LoadError::Invalid { key: "site.url", .. }));
    }

    #[test]
    fn site_url_gains_a_trailing_slash() {
        let mut raw = RawSettings::default();
        raw.site.url = Some("https://example.com/portfolio?x=1".to_string());
        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(settings.site.url.as_str(), "https://example.com/portfolio/");
    }

    #[test]
    fn default_locale_must_be_supported() {
        let mut raw = raw_with_site();
        raw.site.locales = Some(vec!["en".to_string()]);
        raw.site.default_locale = Some("zh".to_string());
        let err = Settings::from_raw(raw).expect_err("unsupported default");
        assert!(matches!(err, LoadError::Invalid { key: "site.locales", .. }));
    }

    #[test]
    fn private_key_escapes_become_newlines() {
        let mut raw = raw_with_site();
        raw.analytics.ga4_private_key = Some("-----BEGIN-----\\nabc\\n-----END-----".to_string());
        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(
            settings.analytics.private_key.as_deref(),
            Some("-----BEGIN-----\nabc\n-----END-----")
        );
    }

    #[test]
    #[serial]
    fn ga4_variables_fill_missing_credentials() {
        // SAFETY: serialised with every other test touching process environment.
        unsafe {
            env::set_var(GA4_PROPERTY_ID_VAR, "123456");
            env::remove_var(GA4_CLIENT_EMAIL_VAR);
            env::remove_var(GA4_PRIVATE_KEY_VAR);
        }

        let mut raw = raw_with_site();
        raw.analytics.ga4_client_email = Some("svc@example.iam".to_string());
        raw.apply_ga4_environment();
        let settings = Settings::from_raw(raw).expect("valid settings");

        // SAFETY: see above.
        unsafe {
            env::remove_var(GA4_PROPERTY_ID_VAR);
        }

        assert_eq!(settings.analytics.property_id.as_deref(), Some("123456"));
        assert_eq!(
            settings.analytics.client_email.as_deref(),
            Some("svc@example.iam")
        );
        assert!(settings.analytics.private_key.is_none());
    }

    #[test]
    fn cli_json_logging_enforces_format() {
        let mut raw = raw_with_site();
        let overrides = ServeOverrides {
            log_json: Some(true),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert!(matches!(settings.logging.format, LogFormat::Json));
    }

    #[test]
    fn analytics_timeout_is_configurable_but_not_zero() {
        let mut raw = raw_with_site();
        raw.analytics.timeout_secs = Some(3);
        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(settings.analytics.timeout, Duration::from_secs(3));

        let mut raw = raw_with_site();
        raw.analytics.timeout_secs = Some(0);
        let err = Settings::from_raw(raw).expect_err("zero timeout");
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "analytics.timeout_secs",
                ..
            }
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut raw = raw_with_site();
        raw.og_image.timeout_secs = Some(0);
        let err = Settings::from_raw(raw).expect_err("zero timeout");
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "og_image.timeout_secs",
                ..
            }
        ));
    }

    #[test]
    fn default_to_serve_command() {
        let args = CliArgs::parse_from(["folio"]);
        let command = args
            .command
            .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
        assert!(matches!(command, Command::Serve(_)));
    }

    #[test]
    fn parse_serve_overrides() {
        let args = CliArgs::parse_from([
            "folio",
            "serve",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--content-dir",
            "/srv/site",
            "--log-json",
            "yes",
        ]);

        match args.command.expect("serve command") {
            Command::Serve(serve) => {
                assert_eq!(serve.overrides.host.as_deref(), Some("0.0.0.0"));
                assert_eq!(serve.overrides.port, Some(8080));
                assert_eq!(
                    serve.overrides.content_dir.as_deref(),
                    Some(std::path::Path::new("/srv/site"))
                );
                assert_eq!(serve.overrides.log_json, Some(true));
            }
            _ => panic!("wrong command parsed"),
        }
    }

    #[test]
    fn parse_check_arguments() {
        let args = CliArgs::parse_from(["folio", "check", "--content-dir", "site"]);
        match args.command.expect("check command") {
            Command::Check(check) => {
                assert_eq!(
                    check.content_dir.as_deref(),
                    Some(std::path::Path::new("site"))
                );
            }
            _ => panic!("wrong command parsed"),
        }
    }
}
