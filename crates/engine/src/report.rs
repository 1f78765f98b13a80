//! Report presentation helpers.
//!
//! Everything here derives display data from an [`AnalysisRun`](crate::AnalysisRun)
//! or a manifest without touching run state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use pwa_report_core::{AnalysisKind, ManifestContext};

use crate::score::CategoryScore;

/// Icon used when there is no manifest to read icons from.
pub const PLACEHOLDER_ICON: &str = "/assets/icons/icon_512.png";

const LIGHT_TEXT: &str = "#ffffff";
const DARK_TEXT: &str = "#000000";

/// Progress-ring colour for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreColor {
    Red,
    Yellow,
    Green,
}

pub fn decide_color(score: &CategoryScore) -> ScoreColor {
    if score.error.is_some() || score.tally.has_required_failures() {
        ScoreColor::Red
    } else if score.tally.ratio() != Some(1.0) {
        ScoreColor::Yellow
    } else {
        ScoreColor::Green
    }
}

/// Which summary message a category shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Nothing usable was found.
    None,
    /// Required fixes stand between the site and packaging.
    Blocked,
    /// Packageable, with recommended or optional improvements left.
    Improvable,
    Perfect,
}

/// A synthesized manifest, a zero (or absent) ratio, a failed suite, and any
/// imperfect security score all yield [`Verdict::None`].
pub fn decide_verdict(kind: AnalysisKind, score: &CategoryScore, created_manifest: bool) -> Verdict {
    let ratio = score.tally.ratio().unwrap_or(0.0);

    if created_manifest
        || score.error.is_some()
        || ratio == 0.0
        || (kind == AnalysisKind::Security && ratio != 1.0)
    {
        Verdict::None
    } else if score.tally.has_required_failures() {
        Verdict::Blocked
    } else if ratio != 1.0 {
        Verdict::Improvable
    } else {
        Verdict::Perfect
    }
}

/// Summary copy for a category verdict.
pub fn verdict_message(kind: AnalysisKind, verdict: Verdict) -> &'static str {
    match (kind, verdict) {
        (AnalysisKind::Manifest, Verdict::Perfect) => {
            "PWABuilder has analyzed your Web Manifest and your manifest is ready for packaging! Great job you have a perfect score!"
        }
        (AnalysisKind::Manifest, Verdict::Improvable) => {
            "PWABuilder has analyzed your Web Manifest and your manifest is ready for packaging! We have identified recommended and optional fields that you can include to make your PWA better. Use our Manifest Editor to edit and update those fields."
        }
        (AnalysisKind::Manifest, Verdict::Blocked) => {
            "PWABuilder has analyzed your Web Manifest. You have one or more fields that need to be updated before you can package. Use our Manifest Editor to edit and update those fields. You can package for the store once you have a valid manifest."
        }
        (AnalysisKind::Manifest, Verdict::None) => {
            "PWABuilder has analyzed your site and did not find a Web Manifest. Use our Manifest Editor to generate one. You can package for the store once you have a valid manifest."
        }
        (AnalysisKind::ServiceWorker, Verdict::Perfect) => {
            "PWABuilder has analyzed your Service Worker and your Service Worker is ready for packaging! Great job you have a perfect score!"
        }
        (AnalysisKind::ServiceWorker, Verdict::Improvable) => {
            "PWABuilder has analyzed your Service Worker, and has identified additional features you can add, like offline support, to make your app feel more robust."
        }
        // a blocked service worker is a missing one
        (AnalysisKind::ServiceWorker, Verdict::Blocked | Verdict::None) => {
            "PWABuilder has analyzed your site and did not find a Service Worker. Having a Service Worker is required to package for the stores. You can generate a Service Worker below or use our documentation to make your own."
        }
        (AnalysisKind::Security, Verdict::Perfect) => {
            "PWABuilder has done a basic analysis of your HTTPS setup and found no issues! Great job you have a perfect score!"
        }
        (AnalysisKind::Security, _) => {
            "PWABuilder has done a basic analysis of your HTTPS setup and has identified required actions before you can package. Check out the documentation linked below to learn more."
        }
    }
}

/// Header card describing the analyzed app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppCard {
    pub site_name: String,
    /// URL without its scheme.
    pub site_url: String,
    pub description: String,
    /// Manifest `theme_color`, unless absent or `"none"`.
    pub background_color: Option<String>,
    /// Text colour readable on `background_color`.
    pub text_color: Option<String>,
}

impl AppCard {
    pub fn from_manifest(context: Option<&ManifestContext>, url: &str, created_manifest: bool) -> Self {
        let site_url = strip_scheme(url).to_owned();

        let Some(context) = context.filter(|_| !created_manifest) else {
            return Self {
                site_name: "Missing Name".to_owned(),
                site_url,
                description: "Your manifest description is missing.".to_owned(),
                background_color: None,
                text_color: None,
            };
        };

        let manifest = &context.manifest;
        let site_name = manifest
            .short_name()
            .or_else(|| manifest.name())
            .unwrap_or("Untitled App")
            .to_owned();
        let description = manifest
            .description()
            .unwrap_or("Add an app description to your manifest")
            .to_owned();

        let background_color = manifest
            .theme_color()
            .filter(|c| *c != "none")
            .map(str::to_owned);
        let text_color = background_color
            .as_deref()
            .map(|bg| pick_text_color(bg, LIGHT_TEXT, DARK_TEXT).to_owned());

        Self {
            site_name,
            site_url,
            description,
            background_color,
            text_color,
        }
    }
}

/// Removes a leading `scheme:` and `//`.
pub fn strip_scheme(url: &str) -> &str {
    let without_scheme = url
        .split_once(':')
        .filter(|(scheme, _)| {
            !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
        .and_then(|(_, rest)| rest.strip_prefix("//"));
    without_scheme.unwrap_or_else(|| url.strip_prefix("//").unwrap_or(url))
}

fn parse_hex_rgb(color: &str) -> Option<[u8; 3]> {
    let hex = color.strip_prefix('#').unwrap_or(color);
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6.. => hex.chars().take(6).collect(),
        _ => return None,
    };
    let channel = |i: usize| u8::from_str_radix(expanded.get(i..i + 2)?, 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// WCAG relative luminance of an sRGB colour.
fn relative_luminance([r, g, b]: [u8; 3]) -> f64 {
    let linear = |channel: u8| {
        let c = f64::from(channel) / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * linear(r) + 0.7152 * linear(g) + 0.0722 * linear(b)
}

/// `dark` on bright backgrounds (luminance above 0.3), `light` otherwise.
/// Unparsable colours get `light`.
pub fn pick_text_color<'a>(background: &str, light: &'a str, dark: &'a str) -> &'a str {
    match parse_hex_rgb(background) {
        Some(rgb) if relative_luminance(rgb) > 0.3 => dark,
        _ => light,
    }
}

/// Absolute icon URLs for the app card.
///
/// Icons resolve against the manifest URL joined with `start_url`. Inline
/// base64 icons are kept as-is; icons that cannot be resolved are skipped.
pub fn icon_sources(context: Option<&ManifestContext>) -> Vec<String> {
    let Some(context) = context else {
        return vec![PLACEHOLDER_ICON.to_owned()];
    };
    let manifest = &context.manifest;
    if context.manifest_url.is_none() && manifest.as_object().is_none_or(|o| o.is_empty()) {
        return vec![PLACEHOLDER_ICON.to_owned()];
    }

    let origin = context.manifest_url.as_deref().unwrap_or(&context.site_url);
    let base = Url::parse(origin).ok().map(|origin| match manifest.start_url() {
        Some(start) => origin.join(start).unwrap_or(origin),
        None => origin,
    });

    manifest
        .icons()
        .into_iter()
        .filter_map(|icon| {
            if icon.is_inline_data() {
                return Some(icon.src);
            }
            match &base {
                Some(base) => base.join(&icon.src).ok().map(String::from),
                None => Url::parse(&icon.src).ok().map(String::from),
            }
        })
        .collect()
}

/// Relative "Last tested ..." label.
pub fn last_tested_label(last: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(last);
    if diff.num_seconds() < 60 {
        "Last tested seconds ago".to_owned()
    } else if diff.num_minutes() < 60 {
        format!("Last tested {} minutes ago", diff.num_minutes())
    } else if diff.num_hours() < 24 {
        format!("Last tested {} hours ago", diff.num_hours())
    } else {
        format!("Last tested {} days ago", diff.num_days())
    }
}
