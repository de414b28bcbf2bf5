mod common;

use common::{seed_activity, seed_user, test_db};
use sporthub::database::activity_repo;
use sporthub::error::Error;
use sporthub::models::activities::{STATUS_CANCELLED, STATUS_DRAFT, STATUS_PUBLISHED};
use sporthub::services::registration_service;

async fn current_participants(pool: &sqlx::SqlitePool, activity_id: &str) -> i64 {
    activity_repo::find_by_id(pool, activity_id)
        .await
        .unwrap()
        .unwrap()
        .current_participants
}

#[tokio::test]
async fn register_inserts_confirmed_row_and_increments_counter() {
    let db = test_db().await;
    let organizer = seed_user(&db.pool, "organizer").await;
    let user = seed_user(&db.pool, "runner").await;
    let activity = seed_activity(&db.pool, &organizer, STATUS_PUBLISHED, 5).await;

    let registration = registration_service::register(
        &db.pool,
        &user,
        &activity,
        Some("bringing a friend's shoes".to_string()),
    )
    .await
    .unwrap();

    assert_eq!(registration.status, "confirmed");
    assert_eq!(registration.user_id, user);
    assert_eq!(registration.activity_id, activity);
    assert_eq!(
        registration.notes.as_deref(),
        Some("bringing a friend's shoes")
    );
    assert_eq!(current_participants(&db.pool, &activity).await, 1);
}

#[tokio::test]
async fn register_unknown_activity_is_not_found() {
    let db = test_db().await;
    let user = seed_user(&db.pool, "runner").await;

    let err = registration_service::register(&db.pool, &user, "no-such-activity", None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn register_requires_published_status() {
    let db = test_db().await;
    let organizer = seed_user(&db.pool, "organizer").await;
    let user = seed_user(&db.pool, "runner").await;

    for status in [STATUS_DRAFT, STATUS_CANCELLED] {
        let activity = seed_activity(&db.pool, &organizer, status, 5).await;
        let err = registration_service::register(&db.pool, &user, &activity, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(current_participants(&db.pool, &activity).await, 0);
    }
}

#[tokio::test]
async fn second_registration_is_conflict_and_adds_no_row() {
    let db = test_db().await;
    let organizer = seed_user(&db.pool, "organizer").await;
    let user = seed_user(&db.pool, "runner").await;
    let activity = seed_activity(&db.pool, &organizer, STATUS_PUBLISHED, 5).await;

    registration_service::register(&db.pool, &user, &activity, None)
        .await
        .unwrap();
    let err = registration_service::register(&db.pool, &user, &activity, None)
        .await
        .unwrap_err();

    match err {
        Error::Conflict(msg) => assert_eq!(msg, "already registered for this activity"),
        other => panic!("expected Conflict, got {:?}", other),
    }
    let stats = registration_service::stats(&db.pool, &activity).await.unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(current_participants(&db.pool, &activity).await, 1);
}

#[tokio::test]
async fn full_activity_rejects_further_registrations() {
    let db = test_db().await;
    let organizer = seed_user(&db.pool, "organizer").await;
    let u1 = seed_user(&db.pool, "runner1").await;
    let u2 = seed_user(&db.pool, "runner2").await;
    let u3 = seed_user(&db.pool, "runner3").await;
    let activity = seed_activity(&db.pool, &organizer, STATUS_PUBLISHED, 2).await;

    registration_service::register(&db.pool, &u1, &activity, None)
        .await
        .unwrap();
    assert_eq!(current_participants(&db.pool, &activity).await, 1);
    registration_service::register(&db.pool, &u2, &activity, None)
        .await
        .unwrap();
    assert_eq!(current_participants(&db.pool, &activity).await, 2);

    let err = registration_service::register(&db.pool, &u3, &activity, None)
        .await
        .unwrap_err();
    match err {
        Error::Conflict(msg) => assert_eq!(msg, "activity is full"),
        other => panic!("expected Conflict, got {:?}", other),
    }
    assert_eq!(current_participants(&db.pool, &activity).await, 2);
}

// Pinned product decision: a cancelled row keeps blocking re-registration.
#[tokio::test]
async fn cancelled_registration_still_blocks_rejoin() {
    let db = test_db().await;
    let organizer = seed_user(&db.pool, "organizer").await;
    let user = seed_user(&db.pool, "runner").await;
    let activity = seed_activity(&db.pool, &organizer, STATUS_PUBLISHED, 5).await;

    registration_service::register(&db.pool, &user, &activity, None)
        .await
        .unwrap();
    registration_service::cancel(&db.pool, &user, &activity)
        .await
        .unwrap();

    let err = registration_service::register(&db.pool, &user, &activity, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    let stats = registration_service::stats(&db.pool, &activity).await.unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.cancelled, 1);
}

#[tokio::test]
async fn cancel_flips_status_and_releases_seat() {
    let db = test_db().await;
    let organizer = seed_user(&db.pool, "organizer").await;
    let user = seed_user(&db.pool, "runner").await;
    let activity = seed_activity(&db.pool, &organizer, STATUS_PUBLISHED, 5).await;

    registration_service::register(&db.pool, &user, &activity, None)
        .await
        .unwrap();
    let cancelled = registration_service::cancel(&db.pool, &user, &activity)
        .await
        .unwrap();

    assert_eq!(cancelled.status, "cancelled");
    assert_eq!(current_participants(&db.pool, &activity).await, 0);

    let err = registration_service::cancel(&db.pool, &user, &activity)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
    assert_eq!(current_participants(&db.pool, &activity).await, 0);
}

#[tokio::test]
async fn cancel_without_registration_is_not_found() {
    let db = test_db().await;
    let organizer = seed_user(&db.pool, "organizer").await;
    let user = seed_user(&db.pool, "runner").await;
    let activity = seed_activity(&db.pool, &organizer, STATUS_PUBLISHED, 5).await;

    let err = registration_service::cancel(&db.pool, &user, &activity)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn cancel_never_drives_counter_negative() {
    let db = test_db().await;
    let organizer = seed_user(&db.pool, "organizer").await;
    let user = seed_user(&db.pool, "runner").await;
    let activity = seed_activity(&db.pool, &organizer, STATUS_PUBLISHED, 5).await;

    registration_service::register(&db.pool, &user, &activity, None)
        .await
        .unwrap();
    // Simulate counter drift from an out-of-band write.
    sqlx::query("UPDATE activities SET current_participants = 0 WHERE activity_id = ?")
        .bind(&activity)
        .execute(&db.pool)
        .await
        .unwrap();

    registration_service::cancel(&db.pool, &user, &activity)
        .await
        .unwrap();
    assert_eq!(current_participants(&db.pool, &activity).await, 0);
}

#[tokio::test]
async fn concurrent_registrations_never_oversell_a_single_seat() {
    let db = test_db().await;
    let organizer = seed_user(&db.pool, "organizer").await;
    let activity = seed_activity(&db.pool, &organizer, STATUS_PUBLISHED, 1).await;

    let mut users = Vec::new();
    for i in 0..8 {
        users.push(seed_user(&db.pool, &format!("runner{}", i)).await);
    }

    let mut handles = Vec::new();
    for user in users {
        let pool = db.pool.clone();
        let activity = activity.clone();
        handles.push(tokio::spawn(async move {
            registration_service::register(&pool, &user, &activity, None).await
        }));
    }

    let mut confirmed = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => confirmed += 1,
            Err(Error::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error under contention: {:?}", other),
        }
    }

    assert_eq!(confirmed, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(current_participants(&db.pool, &activity).await, 1);
    let stats = registration_service::stats(&db.pool, &activity).await.unwrap();
    assert_eq!(stats.confirmed, 1);
    assert_eq!(stats.total, 1);
}

#[tokio::test]
async fn stats_count_rows_by_status() {
    let db = test_db().await;
    let organizer = seed_user(&db.pool, "organizer").await;
    let u1 = seed_user(&db.pool, "runner1").await;
    let u2 = seed_user(&db.pool, "runner2").await;
    let u3 = seed_user(&db.pool, "runner3").await;
    let activity = seed_activity(&db.pool, &organizer, STATUS_PUBLISHED, 5).await;

    for user in [&u1, &u2, &u3] {
        registration_service::register(&db.pool, user, &activity, None)
            .await
            .unwrap();
    }
    registration_service::cancel(&db.pool, &u3, &activity)
        .await
        .unwrap();

    let stats = registration_service::stats(&db.pool, &activity).await.unwrap();
    assert_eq!(stats.confirmed, 2);
    assert_eq!(stats.cancelled, 1);
    assert_eq!(stats.total, 3);
    assert_eq!(current_participants(&db.pool, &activity).await, 2);
}

#[tokio::test]
async fn listings_embed_counterparties_and_filter_by_status() {
    let db = test_db().await;
    let organizer = seed_user(&db.pool, "organizer").await;
    let u1 = seed_user(&db.pool, "runner1").await;
    let u2 = seed_user(&db.pool, "runner2").await;
    let activity = seed_activity(&db.pool, &organizer, STATUS_PUBLISHED, 5).await;

    registration_service::register(&db.pool, &u1, &activity, None)
        .await
        .unwrap();
    registration_service::register(&db.pool, &u2, &activity, None)
        .await
        .unwrap();
    registration_service::cancel(&db.pool, &u2, &activity)
        .await
        .unwrap();

    let mine = registration_service::list_for_user(&db.pool, &u1, None, 1, 10)
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].activity.title, "Sunday five-a-side");
    assert_eq!(mine[0].activity.organizer.username, "organizer");

    // Oldest first, registrant embedded.
    let all = registration_service::list_for_activity(&db.pool, &activity, None, 1, 10)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].user.username, "runner1");
    assert_eq!(all[1].user.username, "runner2");

    let confirmed =
        registration_service::list_for_activity(&db.pool, &activity, Some("confirmed"), 1, 10)
            .await
            .unwrap();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].user.username, "runner1");

    let everything =
        registration_service::list_for_activity(&db.pool, &activity, Some("all"), 1, 10)
            .await
            .unwrap();
    assert_eq!(everything.len(), 2);
}
