mod helpers;

use connecthub::auth::{ActionGate, Page, ProtectedAction};
use connecthub::services::{ContentKind, DashboardService, ProfileService};
use connecthub::store::{tables, to_row};
use helpers::*;
use rstest::rstest;
use serde_json::json;
use uuid::Uuid;

#[rstest]
#[case("", "Broken railing at the viewpoint")]
#[case("Broken railing", "   ")]
#[tokio::test]
async fn test_empty_complaint_is_rejected_without_writing(
    #[case] title: &str,
    #[case] description: &str,
) {
    let backend = TestBackend::new().await;
    backend.traveller().await;
    let writes = backend.store.write_count();

    let result = DashboardService::new(backend.ctx.clone())
        .submit_complaint(title, description)
        .await;

    assert!(result.unwrap_err().is_validation());
    assert_eq!(backend.store.write_count(), writes);
    assert_eq!(
        backend.notifier.last().map(|t| t.message),
        Some("Please fill in all fields".to_string())
    );
}

#[tokio::test]
async fn test_submitted_items_appear_on_dashboard() {
    let backend = TestBackend::new().await;
    let user = backend.traveller().await;
    let dashboard = DashboardService::new(backend.ctx.clone());

    dashboard
        .submit_complaint("Broken railing", "Near the falls viewpoint")
        .await
        .unwrap();
    dashboard.submit_feedback("Lovely guides").await.unwrap();
    dashboard
        .submit_agent_request("Need a guide for Kanger Valley")
        .await
        .unwrap();
    backend.seed_booking(user.id, None, "inquiry").await;

    let view = dashboard.load().await.unwrap().ready().unwrap();

    assert_eq!(view.complaints.len(), 1);
    assert_eq!(view.feedback.len(), 1);
    assert_eq!(view.agent_requests.len(), 1);
    assert_eq!(view.bookings.len(), 1);
    assert_eq!(view.stats.complaints, 1);
    assert_eq!(view.stats.agent_requests, 1);
    assert_eq!(view.agent_requests[0].status.as_deref(), Some("pending"));
}

#[tokio::test]
async fn test_failing_section_loads_empty_while_others_render() {
    let backend = TestBackend::new().await;
    let user = backend.traveller().await;
    let dashboard = DashboardService::new(backend.ctx.clone());
    dashboard.submit_feedback("Great trip").await.unwrap();
    backend.seed_booking(user.id, None, "inquiry").await;
    backend.store.fail_table(tables::BOOKINGS).await;

    let view = dashboard.load().await.unwrap().ready().unwrap();

    assert!(view.bookings.is_empty());
    assert_eq!(view.feedback.len(), 1);
}

#[tokio::test]
async fn test_delete_only_touches_own_rows() {
    let backend = TestBackend::new().await;
    let user = backend.traveller().await;
    let someone_else = Uuid::new_v4();
    let foreign = backend
        .store
        .seed(
            tables::COMPLAINTS,
            vec![to_row(&json!({
                "user_id": someone_else, "title": "Other", "description": "Not mine"
            }))
            .unwrap()],
        )
        .await;
    let foreign_id: Uuid = foreign[0]["id"].as_str().unwrap().parse().unwrap();

    let dashboard = DashboardService::new(backend.ctx.clone());
    let mine = dashboard.submit_complaint("Mine", "My complaint").await.unwrap();

    assert_eq!(dashboard.delete_item(ContentKind::Complaint, foreign_id).await.unwrap(), 0);
    let notice = backend.notifier.last().unwrap();
    assert!(notice.is_error());
    assert_eq!(notice.message, "Complaint not found or already deleted");

    assert_eq!(dashboard.delete_item(ContentKind::Complaint, mine.id).await.unwrap(), 1);
    assert_eq!(
        backend.notifier.last().map(|t| t.message),
        Some("Complaint deleted successfully".to_string())
    );

    let remaining = backend.store.rows(tables::COMPLAINTS).await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["user_id"], json!(someone_else.to_string()));
    assert_ne!(user.id, someone_else);
}

#[tokio::test]
async fn test_delete_account_clears_user_content_and_signs_out() {
    let backend = TestBackend::new().await;
    backend.traveller().await;
    let dashboard = DashboardService::new(backend.ctx.clone());
    dashboard.submit_complaint("Noise", "Loud music at night").await.unwrap();
    dashboard.submit_feedback("Thanks").await.unwrap();

    let next = ProfileService::new(backend.ctx.clone())
        .delete_account(PASSWORD)
        .await
        .unwrap();

    assert_eq!(next, Page::Index);
    assert!(backend.store.rows(tables::COMPLAINTS).await.is_empty());
    assert!(backend.store.rows(tables::FEEDBACK).await.is_empty());
    assert!(!backend.ctx.resolver.is_logged_in().await);
}

#[tokio::test]
async fn test_public_action_prompts_for_login() {
    let backend = TestBackend::new().await;

    let gate = backend
        .ctx
        .gate
        .require_auth_for_action(&ProtectedAction::SubmitComplaint)
        .await;

    match gate {
        ActionGate::LoginRequired(prompt) => assert_eq!(prompt.login, Page::Login.href()),
        ActionGate::Allowed => panic!("Visitor should be asked to login"),
    }

    backend.traveller().await;
    assert!(matches!(
        backend
            .ctx
            .gate
            .require_auth_for_action(&ProtectedAction::SubmitComplaint)
            .await,
        ActionGate::Allowed
    ));
}
