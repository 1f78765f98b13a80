//! 정규식 기반 HTML / 스크립트 스캐너
//!
//! DOM을 구성하지 않고 검사에 필요한 태그와 속성만 추출합니다.
//! 정규식은 [`HtmlScanner::new`]에서 한 번만 컴파일됩니다.

use std::collections::BTreeSet;

use regex::Regex;

use crate::error::ProbeError;

/// 하위 리소스를 불러오는 태그
const SUBRESOURCE_TAGS: &[&str] = &[
    "audio", "embed", "iframe", "img", "link", "object", "script", "source", "track", "video",
];

/// 하위 리소스로 취급하는 `<link rel>` 값
const SUBRESOURCE_LINK_RELS: &[&str] = &["icon", "manifest", "modulepreload", "preload", "stylesheet"];

/// 태그 / 속성 / 등록 호출 추출기
#[derive(Debug, Clone)]
pub struct HtmlScanner {
    tag: Regex,
    attribute: Regex,
    registration: Regex,
    listener: Regex,
    handler_property: Regex,
}

impl HtmlScanner {
    pub fn new() -> Result<Self, ProbeError> {
        Ok(Self {
            tag: compile(r"(?is)<([a-z][a-z0-9]*)\b([^>]*)>")?,
            attribute: compile(
                r#"(?is)([a-z][a-z0-9_:-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#,
            )?,
            registration: compile(
                r#"(?s)serviceWorker\s*\.\s*register\s*\(\s*(?:"([^"]+)"|'([^']+)'|`([^`]+)`)"#,
            )?,
            listener: compile(r#"addEventListener\s*\(\s*["'`]([a-z]+)["'`]"#)?,
            handler_property: compile(r"\bon(fetch|sync|periodicsync|push)\s*=")?,
        })
    }

    /// 태그 이름(소문자)과 속성 목록
    fn tags<'a>(
        &'a self,
        html: &'a str,
    ) -> impl Iterator<Item = (String, Vec<(String, String)>)> + 'a {
        self.tag.captures_iter(html).map(|caps| {
            let name = caps[1].to_ascii_lowercase();
            let attrs = caps.get(2).map_or_else(Vec::new, |m| self.attributes(m.as_str()));
            (name, attrs)
        })
    }

    fn attributes(&self, raw: &str) -> Vec<(String, String)> {
        self.attribute
            .captures_iter(raw)
            .filter_map(|caps| {
                let value = caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4))?;
                Some((caps[1].to_ascii_lowercase(), value.as_str().trim().to_owned()))
            })
            .collect()
    }

    /// `<link rel="manifest">`의 `href`
    pub fn manifest_href(&self, html: &str) -> Option<String> {
        self.tags(html)
            .filter(|(name, _)| name == "link")
            .find_map(|(_, attrs)| {
                let is_manifest = attr(&attrs, "rel")
                    .is_some_and(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("manifest")));
                if !is_manifest {
                    return None;
                }
                attr(&attrs, "href").filter(|href| !href.is_empty()).map(str::to_owned)
            })
    }

    /// `<script src>` 목록 (문서 순서)
    pub fn script_sources(&self, html: &str) -> Vec<String> {
        self.tags(html)
            .filter(|(name, _)| name == "script")
            .filter_map(|(_, attrs)| attr(&attrs, "src").filter(|s| !s.is_empty()).map(str::to_owned))
            .collect()
    }

    /// `navigator.serviceWorker.register(...)`에 전달된 스크립트 경로
    pub fn service_worker_registration(&self, source: &str) -> Option<String> {
        self.registration.captures(source).and_then(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().to_owned())
        })
    }

    /// `http://`로 불러오는 하위 리소스 URL
    pub fn insecure_subresources(&self, html: &str) -> Vec<String> {
        self.tags(html)
            .filter(|(name, _)| SUBRESOURCE_TAGS.contains(&name.as_str()))
            .filter(|(name, attrs)| {
                name != "link"
                    || attr(attrs, "rel").is_some_and(|rel| {
                        rel.split_whitespace()
                            .any(|r| SUBRESOURCE_LINK_RELS.contains(&r.to_ascii_lowercase().as_str()))
                    })
            })
            .flat_map(|(_, attrs)| {
                attrs
                    .into_iter()
                    .filter(|(key, _)| matches!(key.as_str(), "src" | "href" | "data"))
                    .map(|(_, value)| value)
                    .filter(|value| value.to_ascii_lowercase().starts_with("http://"))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Service Worker 스크립트가 처리하는 이벤트 이름
    pub fn event_handlers(&self, script: &str) -> BTreeSet<String> {
        let listeners = self
            .listener
            .captures_iter(script)
            .map(|caps| caps[1].to_owned());
        let properties = self
            .handler_property
            .captures_iter(script)
            .map(|caps| caps[1].to_owned());
        listeners.chain(properties).collect()
    }
}

fn compile(pattern: &str) -> Result<Regex, ProbeError> {
    Regex::new(pattern).map_err(|e| ProbeError::Pattern(e.to_string()))
}

fn attr<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}
