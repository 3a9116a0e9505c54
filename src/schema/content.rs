use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{http_url, storage_path, Validate, ValidationError};

/// Editable site sections served under `/about/:section`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Info,
    Press,
    Sponsors,
    International,
    Terms,
    EmailTemplates,
    Citizens,
    Curated,
    Participants,
}

impl SectionKind {
    pub const ALL: &'static [SectionKind] = &[
        SectionKind::Info,
        SectionKind::Press,
        SectionKind::Sponsors,
        SectionKind::International,
        SectionKind::Terms,
        SectionKind::EmailTemplates,
        SectionKind::Citizens,
        SectionKind::Curated,
        SectionKind::Participants,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Info => "info",
            SectionKind::Press => "press",
            SectionKind::Sponsors => "sponsors",
            SectionKind::International => "international",
            SectionKind::Terms => "terms",
            SectionKind::EmailTemplates => "email-templates",
            SectionKind::Citizens => "citizens",
            SectionKind::Curated => "curated",
            SectionKind::Participants => "participants",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == slug)
    }

    /// Sections that keep an editable item list next to their header.
    pub fn has_items(&self) -> bool {
        matches!(
            self,
            SectionKind::Press | SectionKind::Sponsors | SectionKind::International | SectionKind::EmailTemplates
        )
    }

    /// Sections whose body is computed from participant and user rows.
    pub fn is_derived(&self) -> bool {
        matches!(self, SectionKind::Citizens | SectionKind::Curated | SectionKind::Participants)
    }

    /// Email templates are internal and never served publicly.
    pub fn is_public(&self) -> bool {
        !matches!(self, SectionKind::EmailTemplates)
    }

    fn header_keys(&self) -> &'static [&'static str] {
        match self {
            SectionKind::Info => &["title", "body"],
            SectionKind::Terms => &["body"],
            _ => &[],
        }
    }

    fn item_keys(&self) -> &'static [&'static str] {
        match self {
            SectionKind::Press => &["title", "url"],
            SectionKind::Sponsors => &["name"],
            SectionKind::International => &["name", "country"],
            SectionKind::EmailTemplates => &["key", "subject", "body"],
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentItemPayload {
    /// Existing item id; omitted for new items.
    #[serde(default)]
    pub id: Option<Uuid>,
    pub data: Map<String, Value>,
    #[serde(default)]
    pub image_path: Option<String>,
}

/// Complete desired state of a section. Callers resend everything.
#[derive(Debug, Clone, Deserialize)]
pub struct SectionPayload {
    #[serde(default)]
    pub header: Map<String, Value>,
    #[serde(default)]
    pub items: Option<Vec<ContentItemPayload>>,
}

impl Validate for SectionPayload {
    fn validate(&self) -> Result<(), ValidationError> {
        for (i, item) in self.items.iter().flatten().enumerate() {
            if let Some(path) = &item.image_path {
                storage_path(&format!("items[{}].image_path", i), path)?;
            }
        }
        Ok(())
    }
}

fn required_text(field: String, obj: &Map<String, Value>, key: &str) -> Result<(), ValidationError> {
    match obj.get(key).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(ValidationError::new(field, "is required")),
    }
}

impl SectionPayload {
    /// Section-specific rules on top of the generic shape.
    pub fn validate_for(&self, kind: SectionKind) -> Result<(), ValidationError> {
        self.validate()?;
        for key in kind.header_keys() {
            required_text(format!("header.{}", key), &self.header, key)?;
        }

        let items = match (&self.items, kind.has_items()) {
            (Some(items), true) => items,
            (None, true) => return Err(ValidationError::new("items", "is required for this section")),
            (Some(_), false) => return Err(ValidationError::new("items", "this section has no items")),
            (None, false) => return Ok(()),
        };

        let mut ids: Vec<Uuid> = Vec::new();
        let mut template_keys: Vec<&str> = Vec::new();
        for (i, item) in items.iter().enumerate() {
            for key in kind.item_keys() {
                required_text(format!("items[{}].{}", i, key), &item.data, key)?;
            }
            if let Some(url) = item.data.get("url").and_then(Value::as_str) {
                http_url(&format!("items[{}].url", i), url)?;
            }
            if let Some(id) = item.id {
                if ids.contains(&id) {
                    return Err(ValidationError::new(format!("items[{}].id", i), "duplicate item id"));
                }
                ids.push(id);
            }
            if kind == SectionKind::EmailTemplates {
                let key = item.data.get("key").and_then(Value::as_str).unwrap_or_default();
                if template_keys.contains(&key) {
                    return Err(ValidationError::new(format!("items[{}].key", i), "duplicate template key"));
                }
                template_keys.push(key);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse;
    use serde_json::json;

    #[test]
    fn press_items_need_title_and_url() {
        let payload: SectionPayload = parse(json!({
            "header": { "title": "Press" },
            "items": [{ "data": { "title": "Feature", "url": "ftp://x" } }]
        }))
        .unwrap();
        assert_eq!(payload.validate_for(SectionKind::Press).unwrap_err().field, "items[0].url");
    }

    #[test]
    fn header_only_sections_reject_items() {
        let payload: SectionPayload = parse(json!({ "header": { "body": "..." }, "items": [] })).unwrap();
        assert_eq!(payload.validate_for(SectionKind::Terms).unwrap_err().field, "items");
    }

    #[test]
    fn slugs_round_trip() {
        for kind in SectionKind::ALL {
            assert_eq!(SectionKind::from_slug(kind.as_str()), Some(*kind));
        }
        assert_eq!(SectionKind::from_slug("about"), None);
    }
}
