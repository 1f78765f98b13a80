//! 내장 매니페스트 규칙 엔진
//!
//! 멤버마다 중요도([`Category`])와 검사 함수를 갖는 정적 테이블로 구성됩니다.
//!
//! - **required**: 매니페스트에 없어도 항상 검증되며, 없으면 실패입니다.
//! - **recommended / optional**: 존재하는 멤버만 검증하고, 없는 멤버는
//!   [`ManifestRules::report_missing`]으로 보고됩니다.

use serde_json::Value;

use pwa_report_core::{Category, Manifest, ManifestRules, SuiteError, Validation};

/// 패키징에 필요한 최소 아이콘 크기
pub const MIN_PACKAGE_ICON_SIZE: u32 = 512;

const DISPLAY_MODES: &[&str] = &["fullscreen", "standalone", "minimal-ui", "browser"];

const ORIENTATIONS: &[&str] = &[
    "any",
    "natural",
    "landscape",
    "landscape-primary",
    "landscape-secondary",
    "portrait",
    "portrait-primary",
    "portrait-secondary",
];

/// 멤버 하나의 검증 규칙
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub member: &'static str,
    pub category: Category,
    pub display: &'static str,
    pub error: &'static str,
    check: fn(&Value) -> bool,
}

impl FieldRule {
    const fn new(
        member: &'static str,
        category: Category,
        display: &'static str,
        error: &'static str,
        check: fn(&Value) -> bool,
    ) -> Self {
        Self {
            member,
            category,
            display,
            error,
            check,
        }
    }

    fn validation(&self, value: Option<&Value>) -> Validation {
        let valid = value.is_some_and(|v| !v.is_null() && (self.check)(v));
        Validation {
            member: self.member.to_owned(),
            valid,
            category: self.category,
            test_required: self.category == Category::Required,
            display_string: Some(self.display.to_owned()),
            error_string: Some(self.error.to_owned()),
        }
    }
}

use Category::{Optional, Recommended, Required};

#[rustfmt::skip]
const RULES: &[FieldRule] = &[
    // required
    FieldRule::new("icons", Required, "Manifest has a 512x512 icon", "Add a 512x512 PNG icon to your manifest", has_package_icon),
    FieldRule::new("name", Required, "Manifest has a name", "Add a name to your manifest", is_non_empty_string),
    FieldRule::new("short_name", Required, "Manifest has a short name", "Add a short_name of at least 3 characters to your manifest", is_short_name),
    FieldRule::new("start_url", Required, "Manifest has a start url", "Add a start_url to your manifest", is_non_empty_string),
    // recommended
    FieldRule::new("background_color", Recommended, "Manifest has a valid background color", "Use a valid CSS color for background_color", is_color),
    FieldRule::new("categories", Recommended, "Manifest has categories", "categories should be a list of strings", is_string_array),
    FieldRule::new("description", Recommended, "Manifest has a description", "Add a description to your manifest", is_non_empty_string),
    FieldRule::new("display", Recommended, "Manifest has a valid display mode", "display should be fullscreen, standalone, minimal-ui or browser", is_display_mode),
    FieldRule::new("id", Recommended, "Manifest has an id", "Add an id to your manifest", is_non_empty_string),
    FieldRule::new("launch_handler", Recommended, "Manifest has a launch handler", "launch_handler should be an object", Value::is_object),
    FieldRule::new("orientation", Recommended, "Manifest has a valid orientation", "Use a valid orientation value", is_orientation),
    FieldRule::new("screenshots", Recommended, "Manifest has screenshots", "Add screenshots with a src to your manifest", is_screenshot_list),
    FieldRule::new("shortcuts", Recommended, "Manifest has shortcuts", "Each shortcut needs a name and url", is_shortcut_list),
    FieldRule::new("theme_color", Recommended, "Manifest has a valid theme color", "Use a valid CSS color for theme_color", is_color),
    // optional
    FieldRule::new("dir", Optional, "Manifest has a text direction", "dir should be ltr, rtl or auto", is_direction),
    FieldRule::new("display_override", Optional, "Manifest has display overrides", "display_override should be a list of strings", is_string_array),
    FieldRule::new("edge_side_panel", Optional, "Manifest supports the side panel", "edge_side_panel should be an object", Value::is_object),
    FieldRule::new("file_handlers", Optional, "Manifest has file handlers", "file_handlers should be a list", Value::is_array),
    FieldRule::new("handle_links", Optional, "Manifest has a link handling preference", "handle_links should be a string", is_non_empty_string),
    FieldRule::new("iarc_rating_id", Optional, "Manifest has an IARC rating id", "iarc_rating_id should be a string", is_non_empty_string),
    FieldRule::new("lang", Optional, "Manifest has a language", "lang should be a language tag", is_non_empty_string),
    FieldRule::new("note_taking", Optional, "Manifest supports note taking", "note_taking should be an object", Value::is_object),
    FieldRule::new("prefer_related_applications", Optional, "Manifest sets related app preference", "prefer_related_applications should be true or false", Value::is_boolean),
    FieldRule::new("protocol_handlers", Optional, "Manifest has protocol handlers", "protocol_handlers should be a list", Value::is_array),
    FieldRule::new("related_applications", Optional, "Manifest lists related applications", "related_applications should be a list", Value::is_array),
    FieldRule::new("scope", Optional, "Manifest has a scope", "scope should be a string", Value::is_string),
    FieldRule::new("scope_extensions", Optional, "Manifest has scope extensions", "scope_extensions should be a list", Value::is_array),
    FieldRule::new("share_target", Optional, "Manifest has a share target", "share_target should be an object", Value::is_object),
    FieldRule::new("widgets", Optional, "Manifest has widgets", "widgets should be a list", Value::is_array),
];

/// 규칙 테이블 기반 [`ManifestRules`] 구현
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestRuleEngine;

impl ManifestRuleEngine {
    pub fn new() -> Self {
        Self
    }

    /// 모든 규칙 (테이블 순서)
    pub fn rules(&self) -> &'static [FieldRule] {
        RULES
    }

    fn rule(&self, member: &str) -> Option<&'static FieldRule> {
        RULES.iter().find(|rule| rule.member == member)
    }
}

fn require_object(manifest: &Manifest) -> Result<(), SuiteError> {
    if manifest.as_object().is_some() {
        Ok(())
    } else {
        Err(SuiteError::MalformedManifest(
            "manifest must be a JSON object".to_owned(),
        ))
    }
}

impl ManifestRules for ManifestRuleEngine {
    fn validate(&self, manifest: &Manifest) -> Result<Vec<Validation>, SuiteError> {
        require_object(manifest)?;
        Ok(RULES
            .iter()
            .filter(|rule| rule.category == Required || manifest.has_member(rule.member))
            .map(|rule| rule.validation(manifest.member(rule.member)))
            .collect())
    }

    fn report_missing(&self, manifest: &Manifest) -> Result<Vec<String>, SuiteError> {
        require_object(manifest)?;
        Ok(RULES
            .iter()
            .filter(|rule| rule.category != Required && !manifest.has_member(rule.member))
            .map(|rule| rule.member.to_owned())
            .collect())
    }

    fn classify(&self, member: &str) -> Option<Category> {
        self.rule(member).map(|rule| rule.category)
    }
}

// --- 멤버 검사 함수 ---

fn is_non_empty_string(value: &Value) -> bool {
    value.as_str().is_some_and(|s| !s.trim().is_empty())
}

fn is_short_name(value: &Value) -> bool {
    value.as_str().is_some_and(|s| s.trim().chars().count() >= 3)
}

fn is_string_array(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|items| items.iter().all(Value::is_string))
}

fn is_display_mode(value: &Value) -> bool {
    value.as_str().is_some_and(|s| DISPLAY_MODES.contains(&s))
}

fn is_orientation(value: &Value) -> bool {
    value.as_str().is_some_and(|s| ORIENTATIONS.contains(&s))
}

fn is_direction(value: &Value) -> bool {
    matches!(value.as_str(), Some("ltr" | "rtl" | "auto"))
}

fn is_screenshot_list(value: &Value) -> bool {
    value.as_array().is_some_and(|items| {
        !items.is_empty() && items.iter().all(|item| is_non_empty_string(&item["src"]))
    })
}

fn is_shortcut_list(value: &Value) -> bool {
    value.as_array().is_some_and(|items| {
        items
            .iter()
            .all(|item| is_non_empty_string(&item["name"]) && is_non_empty_string(&item["url"]))
    })
}

fn has_package_icon(value: &Value) -> bool {
    let probe = Manifest::from_value(serde_json::json!({ "icons": value }));
    probe.icons().iter().any(|icon| {
        !icon.src.is_empty()
            && icon
                .dimensions()
                .iter()
                .any(|&(w, h)| w >= MIN_PACKAGE_ICON_SIZE && h >= MIN_PACKAGE_ICON_SIZE)
    })
}

/// CSS 색상 표기 (hex, 함수형, 이름)
fn is_color(value: &Value) -> bool {
    let Some(color) = value.as_str().map(str::trim) else {
        return false;
    };
    if let Some(hex) = color.strip_prefix('#') {
        return matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    let lower = color.to_ascii_lowercase();
    let functional = ["rgb(", "rgba(", "hsl(", "hsla(", "hwb(", "lab(", "lch(", "oklab(", "oklch("];
    if functional.iter().any(|prefix| lower.starts_with(prefix)) {
        return lower.ends_with(')');
    }
    !lower.is_empty() && lower.chars().all(|c| c.is_ascii_alphabetic())
}
