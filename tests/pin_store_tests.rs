// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pin store tests: validation, visibility, soft delete and viewport search.

use plant_tracker::error::AppError;
use plant_tracker::models::{CreatePinInput, MapBounds, UpdatePinInput};
use uuid::Uuid;

mod common;

fn bounds(north: f64, south: f64, east: f64, west: f64, project_id: Option<Uuid>) -> MapBounds {
    MapBounds {
        north,
        south,
        east,
        west,
        project_id,
    }
}

#[tokio::test]
async fn test_create_and_get_round_trip() {
    let (_, state) = common::create_test_app().await;
    let owner = common::create_user(&state, "owner").await;
    let project = common::create_project(&state, &owner, &[]).await;

    let input = CreatePinInput {
        name: "Meyer lemon".to_string(),
        description: Some("South fence".to_string()),
        latitude: Some(37.3861),
        longitude: Some(-122.0839),
        metadata: Some(serde_json::json!({ "variety": "Meyer" })),
        project_id: project.id,
        ..Default::default()
    };
    let created = state.pin_service.create(input, owner.id).await.unwrap();

    assert_eq!(created.pin_type, "plant");
    assert_eq!(created.status, "active");
    assert!(!created.is_public);
    assert_eq!(created.created_by_id, owner.id);

    let fetched = state
        .pin_service
        .get_by_id(created.id, owner.id)
        .await
        .unwrap();
    assert_eq!(fetched.name, "Meyer lemon");
    assert_eq!(fetched.latitude, 37.3861);
    assert_eq!(fetched.longitude, -122.0839);
    assert_eq!(
        fetched.metadata.as_ref().map(|m| m.0["variety"].clone()),
        Some(serde_json::json!("Meyer"))
    );

    let location = serde_json::to_value(&fetched.location.0).unwrap();
    assert_eq!(location["type"], "Point");
    assert_eq!(location["coordinates"][0], -122.0839);
    assert_eq!(location["coordinates"][1], 37.3861);
}

#[tokio::test]
async fn test_origin_pin_rejected() {
    let (_, state) = common::create_test_app().await;
    let owner = common::create_user(&state, "owner").await;
    let project = common::create_project(&state, &owner, &[]).await;

    let input = CreatePinInput {
        name: "Null island".to_string(),
        latitude: Some(0.0),
        longitude: Some(0.0),
        project_id: project.id,
        ..Default::default()
    };
    let err = state.pin_service.create(input, owner.id).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert!(state
        .pin_service
        .list_by_project(project.id, owner.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_create_requires_membership() {
    let (_, state) = common::create_test_app().await;
    let owner = common::create_user(&state, "owner").await;
    let stranger = common::create_user(&state, "stranger").await;
    let project = common::create_project(&state, &owner, &[]).await;

    let input = CreatePinInput {
        name: "Intruder".to_string(),
        latitude: Some(1.0),
        longitude: Some(1.0),
        project_id: project.id,
        ..Default::default()
    };
    let err = state
        .pin_service
        .create(input, stranger.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_private_pin_hidden_from_outsiders() {
    let (_, state) = common::create_test_app().await;
    let owner = common::create_user(&state, "owner").await;
    let stranger = common::create_user(&state, "stranger").await;
    let project = common::create_project(&state, &owner, &[]).await;
    let private = common::create_pin(&state, project.id, &owner, 37.0, -122.0, false).await;
    let public = common::create_pin(&state, project.id, &owner, 37.1, -122.1, true).await;

    let err = state
        .pin_service
        .get_by_id(private.id, stranger.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert!(!state
        .pin_service
        .check_access(private.id, stranger.id)
        .await
        .unwrap());

    assert!(state
        .pin_service
        .get_by_id(public.id, stranger.id)
        .await
        .is_ok());
    assert!(state
        .pin_service
        .check_access(public.id, stranger.id)
        .await
        .unwrap());

    let visible = state
        .pin_service
        .list_all_for_user(stranger.id)
        .await
        .unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, public.id);

    let err = state
        .pin_service
        .list_by_project(project.id, stranger.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_list_all_dedupes_and_orders_newest_first() {
    let (_, state) = common::create_test_app().await;
    let owner = common::create_user(&state, "owner").await;
    let project = common::create_project(&state, &owner, &[]).await;

    // Public pins in a member project must appear once
    let first = common::create_pin(&state, project.id, &owner, 10.0, 10.0, true).await;
    let second = common::create_pin(&state, project.id, &owner, 11.0, 11.0, false).await;
    let third = common::create_pin(&state, project.id, &owner, 12.0, 12.0, true).await;

    let pins = state
        .pin_service
        .list_all_for_user(owner.id)
        .await
        .unwrap();
    let ids: Vec<Uuid> = pins.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![third.id, second.id, first.id]);
}

#[tokio::test]
async fn test_soft_deleted_pin_disappears_everywhere() {
    let (_, state) = common::create_test_app().await;
    let owner = common::create_user(&state, "owner").await;
    let project = common::create_project(&state, &owner, &[]).await;
    let pin = common::create_pin(&state, project.id, &owner, 37.5, -122.5, true).await;

    state.pin_service.delete(pin.id, owner.id).await.unwrap();

    assert!(matches!(
        state.pin_service.get_by_id(pin.id, owner.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(state
        .pin_service
        .list_all_for_user(owner.id)
        .await
        .unwrap()
        .is_empty());
    assert!(state
        .pin_service
        .list_by_project(project.id, owner.id)
        .await
        .unwrap()
        .is_empty());
    assert!(state
        .pin_service
        .list_in_bounds(&bounds(38.0, 37.0, -122.0, -123.0, None), owner.id)
        .await
        .unwrap()
        .is_empty());

    // Deleting twice reports the pin as gone
    assert!(matches!(
        state.pin_service.delete(pin.id, owner.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_update_moves_location_and_coordinates_together() {
    let (_, state) = common::create_test_app().await;
    let owner = common::create_user(&state, "owner").await;
    let project = common::create_project(&state, &owner, &[]).await;
    let pin = common::create_pin(&state, project.id, &owner, 37.5, -122.5, false).await;

    let patch = UpdatePinInput {
        latitude: Some(40.25),
        longitude: Some(-105.75),
        status: Some("dormant".to_string()),
        ..Default::default()
    };
    let updated = state
        .pin_service
        .update(pin.id, patch, owner.id)
        .await
        .unwrap();
    assert_eq!(updated.latitude, 40.25);
    assert_eq!(updated.longitude, -105.75);
    assert_eq!(updated.status, "dormant");

    let fetched = state
        .pin_service
        .get_by_id(pin.id, owner.id)
        .await
        .unwrap();
    let location = serde_json::to_value(&fetched.location.0).unwrap();
    assert_eq!(location["coordinates"][0], -105.75);
    assert_eq!(location["coordinates"][1], 40.25);

    // The spatial index follows the move
    let old_area = state
        .pin_service
        .list_in_bounds(&bounds(38.0, 37.0, -122.0, -123.0, None), owner.id)
        .await
        .unwrap();
    assert!(old_area.is_empty());
    let new_area = state
        .pin_service
        .list_in_bounds(&bounds(41.0, 40.0, -105.0, -106.0, None), owner.id)
        .await
        .unwrap();
    assert_eq!(new_area.len(), 1);
}

#[tokio::test]
async fn test_partial_coordinate_update_rejected() {
    let (_, state) = common::create_test_app().await;
    let owner = common::create_user(&state, "owner").await;
    let project = common::create_project(&state, &owner, &[]).await;
    let pin = common::create_pin(&state, project.id, &owner, 37.5, -122.5, false).await;

    let patch = UpdatePinInput {
        latitude: Some(38.0),
        ..Default::default()
    };
    let err = state
        .pin_service
        .update(pin.id, patch, owner.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let unchanged = state
        .pin_service
        .get_by_id(pin.id, owner.id)
        .await
        .unwrap();
    assert_eq!(unchanged.latitude, 37.5);
}

#[tokio::test]
async fn test_bounds_edges_are_inclusive() {
    let (_, state) = common::create_test_app().await;
    let owner = common::create_user(&state, "owner").await;
    let project = common::create_project(&state, &owner, &[]).await;

    let on_corner = common::create_pin(&state, project.id, &owner, 38.0, -122.0, false).await;
    let inside = common::create_pin(&state, project.id, &owner, 37.5, -122.5, false).await;
    // Just outside the north edge
    common::create_pin(&state, project.id, &owner, 38.0001, -122.5, false).await;
    // Far away
    common::create_pin(&state, project.id, &owner, 51.5, -0.12, false).await;

    let mut ids: Vec<Uuid> = state
        .pin_service
        .list_in_bounds(&bounds(38.0, 37.0, -122.0, -123.0, None), owner.id)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    ids.sort();
    let mut expected = vec![on_corner.id, inside.id];
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_bounds_scoping() {
    let (_, state) = common::create_test_app().await;
    let owner = common::create_user(&state, "owner").await;
    let neighbour = common::create_user(&state, "neighbour").await;
    let stranger = common::create_user(&state, "stranger").await;
    let mine = common::create_project(&state, &owner, &[]).await;
    let theirs = common::create_project(&state, &neighbour, &[]).await;

    let my_pin = common::create_pin(&state, mine.id, &owner, 37.5, -122.5, false).await;
    let their_public = common::create_pin(&state, theirs.id, &neighbour, 37.6, -122.6, true).await;
    common::create_pin(&state, theirs.id, &neighbour, 37.7, -122.7, false).await;

    let area = bounds(38.0, 37.0, -122.0, -123.0, None);

    // Member projects plus public pins
    let mut ids: Vec<Uuid> = state
        .pin_service
        .list_in_bounds(&area, owner.id)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    ids.sort();
    let mut expected = vec![my_pin.id, their_public.id];
    expected.sort();
    assert_eq!(ids, expected);

    // Restricted to one project
    let scoped = state
        .pin_service
        .list_in_bounds(&bounds(38.0, 37.0, -122.0, -123.0, Some(mine.id)), owner.id)
        .await
        .unwrap();
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0].id, my_pin.id);

    // Project scope needs membership
    let err = state
        .pin_service
        .list_in_bounds(&bounds(38.0, 37.0, -122.0, -123.0, Some(mine.id)), stranger.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_bounds_empty_without_memberships_or_public_pins() {
    let (_, state) = common::create_test_app().await;
    let owner = common::create_user(&state, "owner").await;
    let stranger = common::create_user(&state, "stranger").await;
    let project = common::create_project(&state, &owner, &[]).await;
    common::create_pin(&state, project.id, &owner, 37.5, -122.5, false).await;

    let pins = state
        .pin_service
        .list_in_bounds(&bounds(90.0, -90.0, 180.0, -180.0, None), stranger.id)
        .await
        .unwrap();
    assert!(pins.is_empty());
}

#[tokio::test]
async fn test_invalid_bounds_rejected() {
    let (_, state) = common::create_test_app().await;
    let owner = common::create_user(&state, "owner").await;

    let err = state
        .pin_service
        .list_in_bounds(&bounds(37.0, 38.0, -122.0, -123.0, None), owner.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_on_shared_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let state = common::create_file_backed_state(dir.path()).await;
    let owner = common::create_user(&state, "owner").await;
    let project = common::create_project(&state, &owner, &[]).await;
    let owner_id = owner.id;

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let service = state.pin_service.clone();
            let input = CreatePinInput {
                name: format!("Seedling {}", i),
                latitude: Some(40.0 + f64::from(i) * 0.01),
                longitude: Some(-105.0),
                project_id: project.id,
                ..Default::default()
            };
            tokio::spawn(async move { service.create(input, owner_id).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().expect("pin create failed under contention");
    }

    let pins = state
        .pin_service
        .list_by_project(project.id, owner.id)
        .await
        .unwrap();
    assert_eq!(pins.len(), 20);
}

#[tokio::test]
async fn test_removed_member_loses_pin_access() {
    let (_, state) = common::create_test_app().await;
    let owner = common::create_user(&state, "owner").await;
    let member = common::create_user(&state, "member").await;
    let project = common::create_project(&state, &owner, &[&member]).await;
    let pin = common::create_pin(&state, project.id, &owner, 12.0, 34.0, false).await;

    assert!(state.pin_service.check_access(pin.id, member.id).await.unwrap());
    assert!(state
        .reminder_service
        .list_by_plant(pin.id, member.id)
        .await
        .is_ok());

    state
        .project_service
        .remove_member(project.id, member.id, owner.id)
        .await
        .unwrap();

    assert!(!state
        .project_service
        .check_access(project.id, member.id)
        .await
        .unwrap());
    assert!(!state.pin_service.check_access(pin.id, member.id).await.unwrap());
    assert!(matches!(
        state.pin_service.get_by_id(pin.id, member.id).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        state.reminder_service.list_by_plant(pin.id, member.id).await,
        Err(AppError::Forbidden(_))
    ));
}
