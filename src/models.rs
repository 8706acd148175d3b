use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Record Kinds ---

/// RecordKind
///
/// Discriminates the typed collections held by the record store. The string
/// form is the persisted `kind` column value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKind {
    Bio,
    Experience,
    Education,
    Achievement,
    Skill,
    Service,
    Project,
    CarouselSlide,
    ContactInfo,
    Enquiry,
    User,
}

impl RecordKind {
    /// The nine admin-managed content kinds, in dashboard order.
    pub const CONTENT: [RecordKind; 9] = [
        RecordKind::Bio,
        RecordKind::Experience,
        RecordKind::Education,
        RecordKind::Achievement,
        RecordKind::Skill,
        RecordKind::Service,
        RecordKind::Project,
        RecordKind::CarouselSlide,
        RecordKind::ContactInfo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Bio => "bio",
            RecordKind::Experience => "experience",
            RecordKind::Education => "education",
            RecordKind::Achievement => "achievement",
            RecordKind::Skill => "skill",
            RecordKind::Service => "service",
            RecordKind::Project => "project",
            RecordKind::CarouselSlide => "carousel_slide",
            RecordKind::ContactInfo => "contact_info",
            RecordKind::Enquiry => "enquiry",
            RecordKind::User => "user",
        }
    }

    /// URL segment under `/api` and `/admin` for content kinds.
    pub fn segment(&self) -> &'static str {
        match self {
            RecordKind::Bio => "bio",
            RecordKind::Experience => "experiences",
            RecordKind::Education => "education",
            RecordKind::Achievement => "achievements",
            RecordKind::Skill => "skills",
            RecordKind::Service => "services",
            RecordKind::Project => "projects",
            RecordKind::CarouselSlide => "carousel",
            RecordKind::ContactInfo => "contact-info",
            RecordKind::Enquiry => "enquiries",
            RecordKind::User => "users",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::Bio => "Bio",
            RecordKind::Experience => "Experience",
            RecordKind::Education => "Education",
            RecordKind::Achievement => "Achievements",
            RecordKind::Skill => "Skills",
            RecordKind::Service => "Services",
            RecordKind::Project => "Projects",
            RecordKind::CarouselSlide => "Carousel",
            RecordKind::ContactInfo => "Contact Info",
            RecordKind::Enquiry => "Enquiries",
            RecordKind::User => "Users",
        }
    }

    pub fn from_segment(segment: &str) -> Option<RecordKind> {
        RecordKind::CONTENT
            .into_iter()
            .chain([RecordKind::Enquiry])
            .find(|kind| kind.segment() == segment)
    }
}

fn default_true() -> bool {
    true
}

// --- Identity ---

/// User
///
/// The admin account. There is exactly one privileged role; the password hash
/// is an argon2 PHC string and is never serialized to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// SessionUser
///
/// Public projection of the signed-in admin (GET /api/auth/session).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

/// SessionResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionResponse {
    pub user: Option<SessionUser>,
    #[ts(type = "string | null")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// LoginForm
///
/// Browser credential exchange (POST /api/auth/login, form-encoded).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default, rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

/// TokenRequest
///
/// Programmatic credential exchange (POST /api/auth/token).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenRequest {
    pub email: String,
    pub password: String,
}

/// TokenResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenResponse {
    pub token: String,
    #[ts(type = "string")]
    pub expires_at: DateTime<Utc>,
}

/// LogoutForm
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LogoutForm {
    #[serde(default, rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

// --- Content Schemas ---

/// Bio
///
/// Headline biography shown on the home and about pages. The first active
/// record (by display order) is the one rendered.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Bio {
    pub id: Uuid,
    pub name: String,
    pub headline: String,
    #[serde(default)]
    pub summary: String,
    pub avatar_url: Option<String>,
    pub resume_url: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Experience
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Experience {
    pub id: Uuid,
    pub company: String,
    pub role: String,
    pub location: Option<String>,
    #[ts(type = "string")]
    pub start_date: NaiveDate,
    // `None` means the position is current.
    #[ts(type = "string | null")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Education
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Education {
    pub id: Uuid,
    pub institution: String,
    pub degree: String,
    pub field_of_study: Option<String>,
    #[ts(type = "string")]
    pub start_date: NaiveDate,
    #[ts(type = "string | null")]
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Achievement
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Achievement {
    pub id: Uuid,
    pub title: String,
    pub issuer: Option<String>,
    #[ts(type = "string | null")]
    pub awarded_on: Option<NaiveDate>,
    pub description: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Skill
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Skill {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    // Self-assessed level, 0 to 100.
    pub proficiency: Option<u8>,
    pub icon: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Service
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Service {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub icon: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Project
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    pub live_url: Option<String>,
    pub source_url: Option<String>,
    // Featured projects are surfaced on the home page.
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// CarouselSlide
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CarouselSlide {
    pub id: Uuid,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// ContactInfo
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ContactInfo {
    pub id: Uuid,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub website_url: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// ReorderEntry
///
/// One element of a POST /api/{kind}/reorder body.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ReorderEntry {
    pub id: Uuid,
    pub display_order: i32,
}

// --- Enquiries ---

/// EnquiryStatus
///
/// Admin-side workflow state of a visitor enquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum EnquiryStatus {
    New,
    Read,
    Replied,
    Archived,
}

impl EnquiryStatus {
    pub const ALL: [EnquiryStatus; 4] = [
        EnquiryStatus::New,
        EnquiryStatus::Read,
        EnquiryStatus::Replied,
        EnquiryStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnquiryStatus::New => "new",
            EnquiryStatus::Read => "read",
            EnquiryStatus::Replied => "replied",
            EnquiryStatus::Archived => "archived",
        }
    }

    /// Whether the workflow permits moving from `self` to `next`.
    /// Staying in the same state is always permitted.
    pub fn can_transition_to(&self, next: EnquiryStatus) -> bool {
        use EnquiryStatus::*;
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (New, Read | Replied | Archived)
                | (Read, Replied | Archived)
                | (Replied, Archived)
                | (Archived, Read)
        )
    }
}

/// Enquiry
///
/// A persisted contact-form submission.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Enquiry {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub status: EnquiryStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// CreateEnquiryRequest
///
/// Public contact-form payload (POST /api/enquiries, POST /api/contact).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateEnquiryRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
}

/// EnquiryReceipt
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct EnquiryReceipt {
    pub id: Uuid,
    pub status: EnquiryStatus,
}

/// UpdateEnquiryStatusRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateEnquiryStatusRequest {
    pub status: EnquiryStatus,
}

/// BulkDeleteRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct BulkDeleteRequest {
    pub ids: Vec<Uuid>,
}

/// BulkDeleteResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct BulkDeleteResponse {
    pub deleted: u64,
}

// --- Dashboard ---

/// KindCount
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct KindCount {
    pub kind: String,
    pub label: String,
    pub total: u64,
    pub active: u64,
}

/// DashboardStats
///
/// Output of GET /api/stats and the data behind the /admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DashboardStats {
    pub content: Vec<KindCount>,
    pub total_enquiries: u64,
    pub new_enquiries: u64,
}
