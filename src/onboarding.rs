//! Company profile onboarding: field order, prompts and per-field validation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// One attribute of the company profile, in collection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OnboardingField {
    CompanyName,
    #[serde(rename = "linkedInURL")]
    LinkedInUrl,
    Headquarters,
    Logo,
    Website,
    Industry,
    BusinessGoal,
    PartnerType,
    CompanySize,
    Products,
    Regions,
    BusinessStage,
    CollaborationInterests,
}

impl OnboardingField {
    /// Collection order. Advancing walks this list strictly front to back.
    pub const ORDER: [OnboardingField; 13] = [
        OnboardingField::CompanyName,
        OnboardingField::LinkedInUrl,
        OnboardingField::Headquarters,
        OnboardingField::Logo,
        OnboardingField::Website,
        OnboardingField::Industry,
        OnboardingField::BusinessGoal,
        OnboardingField::PartnerType,
        OnboardingField::CompanySize,
        OnboardingField::Products,
        OnboardingField::Regions,
        OnboardingField::BusinessStage,
        OnboardingField::CollaborationInterests,
    ];

    /// The field after `current`; the first field when `current` is `None`,
    /// and `None` after the last one.
    pub fn next(current: Option<OnboardingField>) -> Option<OnboardingField> {
        match current {
            None => Self::ORDER.first().copied(),
            Some(field) => {
                let idx = Self::ORDER.iter().position(|f| *f == field)?;
                Self::ORDER.get(idx + 1).copied()
            }
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            OnboardingField::CompanyName => "companyName",
            OnboardingField::LinkedInUrl => "linkedInURL",
            OnboardingField::Headquarters => "headquarters",
            OnboardingField::Logo => "logo",
            OnboardingField::Website => "website",
            OnboardingField::Industry => "industry",
            OnboardingField::BusinessGoal => "businessGoal",
            OnboardingField::PartnerType => "partnerType",
            OnboardingField::CompanySize => "companySize",
            OnboardingField::Products => "products",
            OnboardingField::Regions => "regions",
            OnboardingField::BusinessStage => "businessStage",
            OnboardingField::CollaborationInterests => "collaborationInterests",
        }
    }

    /// Short label used in the completion summary.
    pub fn label(&self) -> &'static str {
        match self {
            OnboardingField::CompanyName => "Company",
            OnboardingField::LinkedInUrl => "LinkedIn",
            OnboardingField::Headquarters => "Headquarters",
            OnboardingField::Logo => "Logo",
            OnboardingField::Website => "Website",
            OnboardingField::Industry => "Industry",
            OnboardingField::BusinessGoal => "Business goal",
            OnboardingField::PartnerType => "Partner type",
            OnboardingField::CompanySize => "Company size",
            OnboardingField::Products => "Products",
            OnboardingField::Regions => "Regions",
            OnboardingField::BusinessStage => "Business stage",
            OnboardingField::CollaborationInterests => "Collaboration interests",
        }
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            OnboardingField::CompanyName => "Please enter your company name:",
            OnboardingField::LinkedInUrl => "Please enter your company's LinkedIn URL:",
            OnboardingField::Headquarters => "Where is your company headquartered?",
            OnboardingField::Logo => {
                "Please upload your company logo or provide a URL to your logo:"
            }
            OnboardingField::Website => "What is your company's website URL?",
            OnboardingField::Industry => "What industry does your company operate in?",
            OnboardingField::BusinessGoal => "What are your primary business goals?",
            OnboardingField::PartnerType => "What type of partners are you looking for?",
            OnboardingField::CompanySize => {
                "What is the size of your company (number of employees)?"
            }
            OnboardingField::Products => "Please describe your main products or services:",
            OnboardingField::Regions => {
                "Which regions do you operate in? (You can list multiple regions)"
            }
            OnboardingField::BusinessStage => {
                "What stage is your business in? (e.g., startup, growth, mature)"
            }
            OnboardingField::CollaborationInterests => {
                "What are your collaboration interests? (You can list multiple interests)"
            }
        }
    }

    /// Fields answered with a comma-separated list.
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            OnboardingField::Regions | OnboardingField::CollaborationInterests
        )
    }

    /// Parse and validate a raw answer for this field.
    pub fn validate(&self, raw: &str) -> Result<FieldValue, ValidationError> {
        let value = raw.trim();
        match self {
            OnboardingField::Logo => Ok(FieldValue::Text(value.to_string())),
            OnboardingField::LinkedInUrl | OnboardingField::Website => {
                validate_url(*self, value).map(FieldValue::Text)
            }
            f if f.is_list() => {
                let items: Vec<String> = value
                    .split(',')
                    .map(|item| item.trim().to_string())
                    .filter(|item| !item.is_empty())
                    .collect();
                if items.is_empty() {
                    Err(ValidationError::EmptyList(*self))
                } else {
                    Ok(FieldValue::List(items))
                }
            }
            _ => {
                if value.is_empty() {
                    Err(ValidationError::Required(*self))
                } else {
                    Ok(FieldValue::Text(value.to_string()))
                }
            }
        }
    }
}

impl fmt::Display for OnboardingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

fn validate_url(field: OnboardingField, value: &str) -> Result<String, ValidationError> {
    match url::Url::parse(value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.host().is_some() => {
            Ok(value.to_string())
        }
        _ => Err(ValidationError::InvalidUrl(field)),
    }
}

/// A collected answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) if text.is_empty() => f.write_str("-"),
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

/// Collected onboarding answers keyed by field.
pub type OnboardingData = BTreeMap<OnboardingField, FieldValue>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{} is required", .0.label())]
    Required(OnboardingField),

    #[error("Please provide a valid {} URL", .0.label())]
    InvalidUrl(OnboardingField),

    #[error("At least one entry is required for {}", .0.label())]
    EmptyList(OnboardingField),
}

impl ValidationError {
    /// Message sent back to the user before the field prompt is repeated.
    pub fn user_message(&self) -> String {
        format!("Invalid input: {}\n\nPlease try again.", self)
    }
}

/// Render collected answers in field order.
pub fn summarize(data: &OnboardingData) -> String {
    OnboardingField::ORDER
        .iter()
        .filter_map(|field| data.get(field).map(|value| format!("• {}: {}", field.label(), value)))
        .collect::<Vec<_>>()
        .join("\n")
}
