// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Project membership and authorization tests.

use plant_tracker::db;
use plant_tracker::error::AppError;
use plant_tracker::models::{CreateProjectInput, ProjectRole, UpdateProjectInput};
use uuid::Uuid;

mod common;

async fn active_owner_count(state: &plant_tracker::AppState, project_id: Uuid) -> i64 {
    let mut conn = state.db.acquire().await.unwrap();
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM project_users \
         WHERE project_id = ? AND role = 'owner' AND is_active = 1",
    )
    .bind(project_id)
    .fetch_one(&mut *conn)
    .await
    .unwrap()
}

#[tokio::test]
async fn test_create_project_writes_owner_and_members() {
    let (_, state) = common::create_test_app().await;
    let owner = common::create_user(&state, "owner").await;
    let member = common::create_user(&state, "member").await;

    let input = CreateProjectInput {
        name: "Orchard".to_string(),
        project_type: Some("Orchard/Grove".to_string()),
        start_date: Some("2025-03-01".to_string()),
        // Duplicates and the owner's own id are ignored
        member_ids: Some(vec![member.id, member.id, owner.id]),
        ..Default::default()
    };
    let project = state
        .project_service
        .create_project(input, owner.id)
        .await
        .unwrap();

    assert_eq!(project.owner_id, owner.id);
    assert_eq!(project.pins_count, 0);
    assert_eq!(project.members.len(), 2);
    assert_eq!(project.members[0].user_id, owner.id);
    assert_eq!(project.members[0].role, ProjectRole::Owner);
    assert_eq!(project.members[1].user_id, member.id);
    assert_eq!(project.members[1].role, ProjectRole::Member);
    assert_eq!(active_owner_count(&state, project.id).await, 1);

    let fetched = state
        .project_service
        .get_project(project.id, member.id)
        .await
        .unwrap();
    assert_eq!(fetched.name, "Orchard");
    assert_eq!(fetched.project_type.as_deref(), Some("Orchard/Grove"));
    assert_eq!(
        fetched.start_date,
        chrono::NaiveDate::from_ymd_opt(2025, 3, 1)
    );
}

#[tokio::test]
async fn test_unknown_member_id_rolls_back_create() {
    let (_, state) = common::create_test_app().await;
    let owner = common::create_user(&state, "owner").await;

    let input = CreateProjectInput {
        name: "Orchard".to_string(),
        member_ids: Some(vec![Uuid::new_v4()]),
        ..Default::default()
    };
    let err = state
        .project_service
        .create_project(input, owner.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let projects = state
        .project_service
        .list_my_projects(owner.id)
        .await
        .unwrap();
    assert!(projects.is_empty());
}

#[tokio::test]
async fn test_invalid_project_input_rejected() {
    let (_, state) = common::create_test_app().await;
    let owner = common::create_user(&state, "owner").await;

    for input in [
        CreateProjectInput {
            name: "ab".to_string(),
            ..Default::default()
        },
        CreateProjectInput {
            name: "Orchard".to_string(),
            project_type: Some("Spaceport".to_string()),
            ..Default::default()
        },
        CreateProjectInput {
            name: "Orchard".to_string(),
            end_date: Some("not a date".to_string()),
            ..Default::default()
        },
    ] {
        let err = state
            .project_service
            .create_project(input, owner.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);
    }
}

#[tokio::test]
async fn test_non_member_cannot_see_project() {
    let (_, state) = common::create_test_app().await;
    let owner = common::create_user(&state, "owner").await;
    let stranger = common::create_user(&state, "stranger").await;
    let project = common::create_project(&state, &owner, &[]).await;

    let err = state
        .project_service
        .get_project(project.id, stranger.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    assert!(!state
        .project_service
        .check_access(project.id, stranger.id)
        .await
        .unwrap());
    assert!(state
        .project_service
        .list_my_projects(stranger.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_member_cannot_update_but_owner_can() {
    let (_, state) = common::create_test_app().await;
    let owner = common::create_user(&state, "owner").await;
    let member = common::create_user(&state, "member").await;
    let project = common::create_project(&state, &owner, &[&member]).await;

    let patch = UpdateProjectInput {
        name: Some("Renamed garden".to_string()),
        ..Default::default()
    };

    let err = state
        .project_service
        .update_project(project.id, patch.clone(), member.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let updated = state
        .project_service
        .update_project(project.id, patch, owner.id)
        .await
        .unwrap();
    assert_eq!(updated.name, "Renamed garden");
    assert!(updated.updated_at >= project.updated_at);

    assert!(state
        .project_service
        .check_ownership(project.id, owner.id)
        .await
        .unwrap());
    assert!(!state
        .project_service
        .check_ownership(project.id, member.id)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_member_management() {
    let (_, state) = common::create_test_app().await;
    let owner = common::create_user(&state, "owner").await;
    let member = common::create_user(&state, "member").await;
    let project = common::create_project(&state, &owner, &[]).await;
    let service = &state.project_service;

    // Unknown user
    let err = service
        .add_member(project.id, Uuid::new_v4(), owner.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let with_member = service
        .add_member(project.id, member.id, owner.id)
        .await
        .unwrap();
    assert_eq!(with_member.members.len(), 2);

    // Already active
    let err = service
        .add_member(project.id, member.id, owner.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Members cannot manage membership
    let err = service
        .remove_member(project.id, owner.id, member.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    // The owner cannot be removed
    let err = service
        .remove_member(project.id, owner.id, owner.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let without_member = service
        .remove_member(project.id, member.id, owner.id)
        .await
        .unwrap();
    assert_eq!(without_member.members.len(), 1);
    assert!(!service.check_access(project.id, member.id).await.unwrap());

    // Removing again finds no active membership
    let err = service
        .remove_member(project.id, member.id, owner.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // Re-adding reactivates the same row as a member
    service
        .add_member(project.id, member.id, owner.id)
        .await
        .unwrap();
    let mut conn = state.db.acquire().await.unwrap();
    let membership = db::projects::find_membership(&mut conn, project.id, member.id)
        .await
        .unwrap()
        .unwrap();
    assert!(membership.is_active);
    assert_eq!(membership.role, ProjectRole::Member);
    drop(conn);

    assert_eq!(active_owner_count(&state, project.id).await, 1);
}

#[tokio::test]
async fn test_delete_project_cascades() {
    let (_, state) = common::create_test_app().await;
    let owner = common::create_user(&state, "owner").await;
    let member = common::create_user(&state, "member").await;
    let project = common::create_project(&state, &owner, &[&member]).await;
    let pin = common::create_pin(&state, project.id, &owner, 37.4, -122.1, true).await;

    let err = state
        .project_service
        .delete_project(project.id, member.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    state
        .project_service
        .delete_project(project.id, owner.id)
        .await
        .unwrap();

    let err = state
        .pin_service
        .get_by_id(pin.id, owner.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(state
        .project_service
        .list_my_projects(member.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_projects_listed_newest_first_with_pin_counts() {
    let (_, state) = common::create_test_app().await;
    let owner = common::create_user(&state, "owner").await;
    let older = common::create_project(&state, &owner, &[]).await;
    let newer = common::create_project(&state, &owner, &[]).await;

    common::create_pin(&state, older.id, &owner, 10.0, 10.0, false).await;
    let removed = common::create_pin(&state, older.id, &owner, 11.0, 11.0, false).await;
    state
        .pin_service
        .delete(removed.id, owner.id)
        .await
        .unwrap();

    let projects = state
        .project_service
        .list_my_projects(owner.id)
        .await
        .unwrap();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0].id, newer.id);
    assert_eq!(projects[1].id, older.id);
    // Soft-deleted pins are not counted
    assert_eq!(projects[1].pins_count, 1);
    assert_eq!(projects[1].members.len(), 1);
}
