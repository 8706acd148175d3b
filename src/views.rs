use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    content::{self, Content},
    error::AppError,
    models::{
        Achievement, Bio, CarouselSlide, ContactInfo, DashboardStats, Education, EnquiryStatus,
        Experience, KindCount, Project, RecordKind, Service, Skill,
    },
    repository::{ListQuery, Repository},
};

/// HomeView
///
/// Everything the landing page shows. Only active records are included.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct HomeView {
    pub bio: Option<Bio>,
    pub slides: Vec<CarouselSlide>,
    pub services: Vec<Service>,
    pub featured_projects: Vec<Project>,
    pub contact: Option<ContactInfo>,
}

/// SkillGroup
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SkillGroup {
    pub category: String,
    pub skills: Vec<Skill>,
}

/// AboutView
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AboutView {
    pub bio: Option<Bio>,
    pub experiences: Vec<Experience>,
    pub education: Vec<Education>,
    pub achievements: Vec<Achievement>,
    pub skill_groups: Vec<SkillGroup>,
}

/// ProjectsView
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ProjectsView {
    pub projects: Vec<Project>,
}

pub async fn home(repo: &dyn Repository) -> Result<HomeView, AppError> {
    let featured_projects = content::list::<Project>(repo, false)
        .await?
        .into_iter()
        .filter(|p| p.featured)
        .collect();

    Ok(HomeView {
        bio: content::first_active::<Bio>(repo).await?,
        slides: content::list::<CarouselSlide>(repo, false).await?,
        services: content::list::<Service>(repo, false).await?,
        featured_projects,
        contact: content::first_active::<ContactInfo>(repo).await?,
    })
}

/// Groups skills by category. Groups appear in the order their first skill
/// appears; skills keep their display order within a group.
pub fn group_skills(skills: Vec<Skill>) -> Vec<SkillGroup> {
    let mut groups: Vec<SkillGroup> = Vec::new();
    for skill in skills {
        match groups.iter_mut().find(|g| g.category == skill.category) {
            Some(group) => group.skills.push(skill),
            None => groups.push(SkillGroup {
                category: skill.category.clone(),
                skills: vec![skill],
            }),
        }
    }
    groups
}

pub async fn about(repo: &dyn Repository) -> Result<AboutView, AppError> {
    Ok(AboutView {
        bio: content::first_active::<Bio>(repo).await?,
        experiences: content::list::<Experience>(repo, false).await?,
        education: content::list::<Education>(repo, false).await?,
        achievements: content::list::<Achievement>(repo, false).await?,
        skill_groups: group_skills(content::list::<Skill>(repo, false).await?),
    })
}

pub async fn projects(repo: &dyn Repository) -> Result<ProjectsView, AppError> {
    Ok(ProjectsView {
        projects: content::list::<Project>(repo, false).await?,
    })
}

async fn count_kind<K: Content>(repo: &dyn Repository) -> Result<KindCount, AppError> {
    Ok(KindCount {
        kind: K::KIND.as_str().to_string(),
        label: K::KIND.label().to_string(),
        total: repo.count(K::KIND, &ListQuery::default()).await?,
        active: repo.count(K::KIND, &ListQuery::active()).await?,
    })
}

/// dashboard_stats
///
/// Record counts per content kind plus the enquiry inbox totals.
pub async fn dashboard_stats(repo: &dyn Repository) -> Result<DashboardStats, AppError> {
    let content = vec![
        count_kind::<Bio>(repo).await?,
        count_kind::<Experience>(repo).await?,
        count_kind::<Education>(repo).await?,
        count_kind::<Achievement>(repo).await?,
        count_kind::<Skill>(repo).await?,
        count_kind::<Service>(repo).await?,
        count_kind::<Project>(repo).await?,
        count_kind::<CarouselSlide>(repo).await?,
        count_kind::<ContactInfo>(repo).await?,
    ];

    let new_only = ListQuery::default().with_field("status", EnquiryStatus::New.as_str());
    Ok(DashboardStats {
        content,
        total_enquiries: repo.count(RecordKind::Enquiry, &ListQuery::default()).await?,
        new_enquiries: repo.count(RecordKind::Enquiry, &new_only).await?,
    })
}
