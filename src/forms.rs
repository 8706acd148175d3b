//! Admin edit forms.
//!
//! The field layout of each content kind's create/edit form, and the
//! conversion of a submitted `application/x-www-form-urlencoded` body into the
//! JSON document the content service works with.

use serde_json::{Map, Value};

use crate::{error::AppError, models::RecordKind};

/// FieldKind
///
/// How a form field is rendered and how its submitted text becomes JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    LongText,
    Date,
    Number,
    /// A checkbox; absent from the body means `false`.
    Flag,
    /// One entry per line.
    List,
}

/// FormField
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Blank input is stored as `null` rather than an empty value.
    pub nullable: bool,
}

impl FormField {
    const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            nullable: false,
        }
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

use FieldKind::*;

const fn text(name: &'static str, label: &'static str) -> FormField {
    FormField::new(name, label, Text)
}

const fn optional(name: &'static str, label: &'static str) -> FormField {
    FormField::new(name, label, Text).nullable()
}

const COMMON: [FormField; 2] = [
    FormField::new("display_order", "Display order", Number),
    FormField::new("is_active", "Active", Flag),
];

const BIO: &[FormField] = &[
    text("name", "Name").required(),
    text("headline", "Headline").required(),
    FormField::new("summary", "Summary", LongText),
    optional("avatar_url", "Avatar URL"),
    optional("resume_url", "Resume URL"),
];

const EXPERIENCE: &[FormField] = &[
    text("company", "Company").required(),
    text("role", "Role").required(),
    optional("location", "Location"),
    FormField::new("start_date", "Start date", Date).required(),
    FormField::new("end_date", "End date", Date).nullable(),
    FormField::new("description", "Description", LongText),
    FormField::new("highlights", "Highlights", List),
];

const EDUCATION: &[FormField] = &[
    text("institution", "Institution").required(),
    text("degree", "Degree").required(),
    optional("field_of_study", "Field of study"),
    FormField::new("start_date", "Start date", Date).required(),
    FormField::new("end_date", "End date", Date).nullable(),
    FormField::new("description", "Description", LongText).nullable(),
];

const ACHIEVEMENT: &[FormField] = &[
    text("title", "Title").required(),
    optional("issuer", "Issuer"),
    FormField::new("awarded_on", "Awarded on", Date).nullable(),
    FormField::new("description", "Description", LongText).nullable(),
    optional("url", "URL"),
];

const SKILL: &[FormField] = &[
    text("name", "Name").required(),
    text("category", "Category").required(),
    FormField::new("proficiency", "Proficiency (0-100)", Number).nullable(),
    optional("icon", "Icon"),
];

const SERVICE: &[FormField] = &[
    text("title", "Title").required(),
    FormField::new("description", "Description", LongText),
    optional("icon", "Icon"),
];

const PROJECT: &[FormField] = &[
    text("title", "Title").required(),
    FormField::new("summary", "Summary", LongText),
    FormField::new("description", "Description", LongText).nullable(),
    optional("image_url", "Image URL"),
    FormField::new("tech_stack", "Tech stack", List),
    optional("live_url", "Live URL"),
    optional("source_url", "Source URL"),
    FormField::new("featured", "Featured", Flag),
];

const CAROUSEL_SLIDE: &[FormField] = &[
    text("title", "Title").required(),
    optional("subtitle", "Subtitle"),
    text("image_url", "Image URL").required(),
    optional("link_url", "Link URL"),
];

const CONTACT_INFO: &[FormField] = &[
    text("email", "Email").required(),
    optional("phone", "Phone"),
    optional("location", "Location"),
    optional("linkedin_url", "LinkedIn URL"),
    optional("github_url", "GitHub URL"),
    optional("website_url", "Website URL"),
];

/// fields
///
/// Editable fields of a content kind, in form order, followed by the display
/// order and active flag every kind shares. Kinds without an edit form
/// (enquiries, users) have no fields.
pub fn fields(kind: RecordKind) -> Vec<FormField> {
    let specific: &[FormField] = match kind {
        RecordKind::Bio => BIO,
        RecordKind::Experience => EXPERIENCE,
        RecordKind::Education => EDUCATION,
        RecordKind::Achievement => ACHIEVEMENT,
        RecordKind::Skill => SKILL,
        RecordKind::Service => SERVICE,
        RecordKind::Project => PROJECT,
        RecordKind::CarouselSlide => CAROUSEL_SLIDE,
        RecordKind::ContactInfo => CONTACT_INFO,
        RecordKind::Enquiry | RecordKind::User => return Vec::new(),
    };
    specific.iter().chain(COMMON.iter()).copied().collect()
}

fn submitted<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// document_from_form
///
/// Builds the JSON document for `kind` from submitted form pairs. Every
/// declared field is written (blank optional fields as `null`, unchecked
/// boxes as `false`), so the result can both create a record and fully
/// replace the editable part of an existing one. Keys that are not declared
/// fields are ignored. Blank required dates and numbers are left out so the
/// content service reports them as missing.
pub fn document_from_form(
    kind: RecordKind,
    pairs: &[(String, String)],
) -> Result<Map<String, Value>, AppError> {
    let mut doc = Map::new();
    for field in fields(kind) {
        let raw = submitted(pairs, field.name).map(str::trim).unwrap_or("");

        let value = match field.kind {
            Flag => Some(Value::Bool(!raw.is_empty())),
            List => Some(Value::Array(
                raw.lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(|line| Value::String(line.to_string()))
                    .collect(),
            )),
            _ if raw.is_empty() && field.nullable => Some(Value::Null),
            Text | LongText => Some(Value::String(raw.to_string())),
            Date if raw.is_empty() => None,
            Date => Some(Value::String(raw.to_string())),
            Number if raw.is_empty() => None,
            Number => {
                let number: i64 = raw.parse().map_err(|_| {
                    AppError::validation(format!("{} must be a whole number", field.name))
                })?;
                Some(Value::from(number))
            }
        };
        if let Some(value) = value {
            doc.insert(field.name.to_string(), value);
        }
    }
    Ok(doc)
}

/// Text shown in a field's input for an existing value.
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn every_content_kind_has_a_form() {
        for kind in RecordKind::CONTENT {
            let fields = fields(kind);
            assert!(fields.iter().any(|f| f.required), "{}", kind.as_str());
            assert!(fields.iter().any(|f| f.name == "is_active"));
        }
        assert!(fields(RecordKind::Enquiry).is_empty());
    }

    #[test]
    fn blank_and_unchecked_inputs_map_to_empty_values() {
        let doc = document_from_form(
            RecordKind::Project,
            &pairs(&[
                ("title", " Folio "),
                ("image_url", ""),
                ("tech_stack", "Rust\r\n\r\n Axum \n"),
                ("display_order", "3"),
                ("unknown", "dropped"),
            ]),
        )
        .unwrap();
        assert_eq!(doc["title"], "Folio");
        assert_eq!(doc["summary"], "");
        assert!(doc["image_url"].is_null());
        assert_eq!(doc["tech_stack"], serde_json::json!(["Rust", "Axum"]));
        assert_eq!(doc["featured"], false);
        assert_eq!(doc["is_active"], false);
        assert_eq!(doc["display_order"], 3);
        assert!(!doc.contains_key("unknown"));
    }

    #[test]
    fn blank_required_date_is_left_out() {
        let doc = document_from_form(
            RecordKind::Experience,
            &pairs(&[("company", "Acme"), ("role", "Dev"), ("start_date", "")]),
        )
        .unwrap();
        assert!(!doc.contains_key("start_date"));
        assert!(doc["end_date"].is_null());
    }

    #[test]
    fn non_numeric_number_is_rejected() {
        let result = document_from_form(
            RecordKind::Skill,
            &pairs(&[("name", "Rust"), ("category", "Languages"), ("proficiency", "lots")]),
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn display_value_joins_lists() {
        assert_eq!(display_value(Some(&serde_json::json!(["a", "b"]))), "a\nb");
        assert_eq!(display_value(Some(&serde_json::json!(7))), "7");
        assert_eq!(display_value(Some(&Value::Null)), "");
        assert_eq!(display_value(None), "");
    }
}
