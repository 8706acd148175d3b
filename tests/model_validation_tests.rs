use folio_server::{
    content::is_plausible_email,
    enquiries::validate_submission,
    models::{CreateEnquiryRequest, EnquiryStatus, LoginForm, RecordKind, Skill},
    views::group_skills,
};
use serde_json::json;

// --- Record Kinds ---

#[test]
fn test_content_kinds_map_to_distinct_segments() {
    let segments: Vec<&str> = RecordKind::CONTENT.iter().map(|k| k.segment()).collect();
    let mut unique = segments.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), segments.len());

    for kind in RecordKind::CONTENT {
        assert_eq!(RecordKind::from_segment(kind.segment()), Some(kind));
    }
    assert_eq!(RecordKind::from_segment("enquiries"), Some(RecordKind::Enquiry));
    // The admin account collection is never exposed by segment.
    assert_eq!(RecordKind::from_segment("users"), None);
    assert_eq!(RecordKind::CarouselSlide.as_str(), "carousel_slide");
    assert_eq!(RecordKind::ContactInfo.segment(), "contact-info");
}

// --- Enquiry Workflow ---

#[test]
fn test_enquiry_status_transitions() {
    use EnquiryStatus::*;
    let allowed = [
        (New, Read),
        (New, Replied),
        (New, Archived),
        (Read, Replied),
        (Read, Archived),
        (Replied, Archived),
        (Archived, Read),
    ];
    let all = [New, Read, Replied, Archived];
    for from in all {
        for to in all {
            let expected = from == to || allowed.contains(&(from, to));
            assert_eq!(
                from.can_transition_to(to),
                expected,
                "{} -> {}",
                from.as_str(),
                to.as_str()
            );
        }
    }
}

#[test]
fn test_enquiry_status_wire_format() {
    assert_eq!(serde_json::to_value(EnquiryStatus::Replied).unwrap(), json!("replied"));
    let parsed: EnquiryStatus = serde_json::from_value(json!("archived")).unwrap();
    assert_eq!(parsed, EnquiryStatus::Archived);
    assert!(serde_json::from_value::<EnquiryStatus>(json!("spam")).is_err());
}

#[test]
fn test_submission_cleanup() {
    let clean = validate_submission(CreateEnquiryRequest {
        name: " Ada Lovelace ".to_string(),
        email: " ada@visitor.example ".to_string(),
        subject: Some(" Engines ".to_string()),
        message: "\nHello\n".to_string(),
    })
    .unwrap();
    assert_eq!(clean.name, "Ada Lovelace");
    assert_eq!(clean.email, "ada@visitor.example");
    assert_eq!(clean.subject.as_deref(), Some("Engines"));
    assert_eq!(clean.message, "Hello");

    let long_subject = CreateEnquiryRequest {
        subject: Some("s".repeat(201)),
        ..clean
    };
    assert!(validate_submission(long_subject).is_err());
}

#[test]
fn test_email_shape() {
    for ok in ["a@b.co", "first.last+tag@sub.example.org"] {
        assert!(is_plausible_email(ok), "{ok}");
    }
    for bad in ["", "plain", "@example.com", "a@", "a@b", "a@@b.com", "a b@c.com", "a@b."] {
        assert!(!is_plausible_email(bad), "{bad}");
    }
}

// --- Wire Formats ---

#[test]
fn test_login_form_uses_callback_url_key() {
    let form: LoginForm = serde_json::from_value(json!({
        "email": "owner@myportfolio.example",
        "password": "pw",
        "callbackUrl": "/admin/bio"
    }))
    .unwrap();
    assert_eq!(form.callback_url.as_deref(), Some("/admin/bio"));

    let form: LoginForm =
        serde_json::from_value(json!({"email": "e@x.io", "password": "pw"})).unwrap();
    assert!(form.callback_url.is_none());
}

#[test]
fn test_skill_grouping_keeps_first_seen_order() {
    let now = chrono::Utc::now();
    let skill = |name: &str, category: &str| Skill {
        id: uuid::Uuid::new_v4(),
        name: name.to_string(),
        category: category.to_string(),
        proficiency: None,
        icon: None,
        display_order: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    let groups = group_skills(vec![
        skill("Axum", "Frameworks"),
        skill("Rust", "Languages"),
        skill("Tokio", "Frameworks"),
    ]);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].category, "Frameworks");
    assert_eq!(groups[0].skills.len(), 2);
    assert_eq!(groups[1].skills[0].name, "Rust");
}
