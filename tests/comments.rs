mod common;

use common::{seed_activity, seed_user, test_db};
use sporthub::error::Error;
use sporthub::models::activities::STATUS_PUBLISHED;
use sporthub::services::comment_service;

#[tokio::test]
async fn add_and_list_builds_the_two_level_tree() {
    let db = test_db().await;
    let organizer = seed_user(&db.pool, "organizer").await;
    let alice = seed_user(&db.pool, "alice").await;
    let bob = seed_user(&db.pool, "bob").await;
    let activity = seed_activity(&db.pool, &organizer, STATUS_PUBLISHED, 10).await;

    let top = comment_service::add(&db.pool, &alice, &activity, "Great pitch!", Some(5), None)
        .await
        .unwrap();
    comment_service::add(
        &db.pool,
        &bob,
        &activity,
        "Agreed",
        None,
        Some(&top.comment_id),
    )
    .await
    .unwrap();
    comment_service::add(
        &db.pool,
        &alice,
        &activity,
        "See you next week",
        None,
        Some(&top.comment_id),
    )
    .await
    .unwrap();

    let page = comment_service::list_for_activity(&db.pool, &activity, 1, 10)
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.comments.len(), 1);

    let comment = &page.comments[0];
    assert_eq!(comment.user.username, "alice");
    assert_eq!(comment.rating, Some(5));
    // Replies ride along unpaginated, oldest first.
    assert_eq!(comment.replies.len(), 2);
    assert_eq!(comment.replies[0].content, "Agreed");
    assert_eq!(comment.replies[0].user.username, "bob");
    assert_eq!(comment.replies[1].content, "See you next week");
}

#[tokio::test]
async fn comment_on_unknown_activity_is_not_found() {
    let db = test_db().await;
    let user = seed_user(&db.pool, "alice").await;

    let err = comment_service::add(&db.pool, &user, "no-such-activity", "hi", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn reply_must_target_a_comment_on_the_same_activity() {
    let db = test_db().await;
    let organizer = seed_user(&db.pool, "organizer").await;
    let user = seed_user(&db.pool, "alice").await;
    let a1 = seed_activity(&db.pool, &organizer, STATUS_PUBLISHED, 10).await;
    let a2 = seed_activity(&db.pool, &organizer, STATUS_PUBLISHED, 10).await;

    let on_a1 = comment_service::add(&db.pool, &user, &a1, "first", None, None)
        .await
        .unwrap();

    let err = comment_service::add(
        &db.pool,
        &user,
        &a2,
        "cross-activity reply",
        None,
        Some(&on_a1.comment_id),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    // Nothing was inserted on either side.
    let page = comment_service::list_for_activity(&db.pool, &a2, 1, 10)
        .await
        .unwrap();
    assert_eq!(page.total, 0);
    let page = comment_service::list_for_activity(&db.pool, &a1, 1, 10)
        .await
        .unwrap();
    assert_eq!(page.comments[0].replies.len(), 0);
}

#[tokio::test]
async fn reply_to_missing_parent_is_not_found() {
    let db = test_db().await;
    let organizer = seed_user(&db.pool, "organizer").await;
    let user = seed_user(&db.pool, "alice").await;
    let activity = seed_activity(&db.pool, &organizer, STATUS_PUBLISHED, 10).await;

    let err = comment_service::add(&db.pool, &user, &activity, "hi", None, Some("nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn replies_cannot_nest() {
    let db = test_db().await;
    let organizer = seed_user(&db.pool, "organizer").await;
    let user = seed_user(&db.pool, "alice").await;
    let activity = seed_activity(&db.pool, &organizer, STATUS_PUBLISHED, 10).await;

    let top = comment_service::add(&db.pool, &user, &activity, "top", None, None)
        .await
        .unwrap();
    let reply = comment_service::add(
        &db.pool,
        &user,
        &activity,
        "reply",
        None,
        Some(&top.comment_id),
    )
    .await
    .unwrap();

    let err = comment_service::add(
        &db.pool,
        &user,
        &activity,
        "reply to reply",
        None,
        Some(&reply.comment_id),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[tokio::test]
async fn rating_must_be_within_bounds() {
    let db = test_db().await;
    let organizer = seed_user(&db.pool, "organizer").await;
    let user = seed_user(&db.pool, "alice").await;
    let activity = seed_activity(&db.pool, &organizer, STATUS_PUBLISHED, 10).await;

    for rating in [0, 6, -1] {
        let err = comment_service::add(&db.pool, &user, &activity, "hm", Some(rating), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
    for rating in [1, 5] {
        comment_service::add(&db.pool, &user, &activity, "ok", Some(rating), None)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn pagination_windows_top_level_comments_only() {
    let db = test_db().await;
    let organizer = seed_user(&db.pool, "organizer").await;
    let user = seed_user(&db.pool, "alice").await;
    let activity = seed_activity(&db.pool, &organizer, STATUS_PUBLISHED, 10).await;

    let mut top_ids = Vec::new();
    for i in 0..3 {
        let top = comment_service::add(&db.pool, &user, &activity, &format!("top {}", i), None, None)
            .await
            .unwrap();
        comment_service::add(
            &db.pool,
            &user,
            &activity,
            &format!("reply {}", i),
            None,
            Some(&top.comment_id),
        )
        .await
        .unwrap();
        top_ids.push(top.comment_id);
    }

    let page1 = comment_service::list_for_activity(&db.pool, &activity, 1, 2)
        .await
        .unwrap();
    assert_eq!(page1.total, 3);
    assert_eq!(page1.total_pages, 2);
    assert_eq!(page1.comments.len(), 2);
    // Newest first.
    assert_eq!(page1.comments[0].content, "top 2");
    assert_eq!(page1.comments[1].content, "top 1");
    assert!(page1.comments.iter().all(|c| c.replies.len() == 1));

    let page2 = comment_service::list_for_activity(&db.pool, &activity, 2, 2)
        .await
        .unwrap();
    assert_eq!(page2.comments.len(), 1);
    assert_eq!(page2.comments[0].content, "top 0");
    assert_eq!(page2.comments[0].replies.len(), 1);
}

#[tokio::test]
async fn update_is_author_only() {
    let db = test_db().await;
    let organizer = seed_user(&db.pool, "organizer").await;
    let alice = seed_user(&db.pool, "alice").await;
    let bob = seed_user(&db.pool, "bob").await;
    let activity = seed_activity(&db.pool, &organizer, STATUS_PUBLISHED, 10).await;

    let comment = comment_service::add(&db.pool, &alice, &activity, "v1", Some(4), None)
        .await
        .unwrap();

    let err = comment_service::update(&db.pool, &comment.comment_id, &bob, "hijack", None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    let updated = comment_service::update(&db.pool, &comment.comment_id, &alice, "v2", Some(2))
        .await
        .unwrap();
    assert_eq!(updated.content, "v2");
    assert_eq!(updated.rating, Some(2));

    let fetched = comment_service::get(&db.pool, &comment.comment_id)
        .await
        .unwrap();
    assert_eq!(fetched.content, "v2");
    assert_eq!(fetched.rating, Some(2));
}

#[tokio::test]
async fn delete_cascades_to_direct_replies() {
    let db = test_db().await;
    let organizer = seed_user(&db.pool, "organizer").await;
    let alice = seed_user(&db.pool, "alice").await;
    let bob = seed_user(&db.pool, "bob").await;
    let activity = seed_activity(&db.pool, &organizer, STATUS_PUBLISHED, 10).await;

    let doomed = comment_service::add(&db.pool, &alice, &activity, "doomed", None, None)
        .await
        .unwrap();
    for text in ["r1", "r2"] {
        comment_service::add(
            &db.pool,
            &bob,
            &activity,
            text,
            None,
            Some(&doomed.comment_id),
        )
        .await
        .unwrap();
    }
    let survivor = comment_service::add(&db.pool, &bob, &activity, "survivor", None, None)
        .await
        .unwrap();

    let err = comment_service::delete(&db.pool, &doomed.comment_id, &bob)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    let deleted = comment_service::delete(&db.pool, &doomed.comment_id, &alice)
        .await
        .unwrap();
    assert_eq!(deleted, 3);

    let page = comment_service::list_for_activity(&db.pool, &activity, 1, 10)
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.comments[0].id, survivor.comment_id);

    let err = comment_service::get(&db.pool, &doomed.comment_id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn rating_stats_average_rated_comments_only() {
    let db = test_db().await;
    let organizer = seed_user(&db.pool, "organizer").await;
    let user = seed_user(&db.pool, "alice").await;
    let activity = seed_activity(&db.pool, &organizer, STATUS_PUBLISHED, 10).await;

    let empty = comment_service::rating_stats(&db.pool, &activity).await.unwrap();
    assert_eq!(empty.average_rating, 0.0);
    assert_eq!(empty.total_ratings, 0);

    for rating in [5, 4, 3] {
        comment_service::add(&db.pool, &user, &activity, "rated", Some(rating), None)
            .await
            .unwrap();
    }
    // Unrated comments stay out of the average.
    comment_service::add(&db.pool, &user, &activity, "unrated", None, None)
        .await
        .unwrap();

    let stats = comment_service::rating_stats(&db.pool, &activity).await.unwrap();
    assert_eq!(stats.average_rating, 4.0);
    assert_eq!(stats.total_ratings, 3);
}

#[tokio::test]
async fn rating_stats_round_to_one_decimal() {
    let db = test_db().await;
    let organizer = seed_user(&db.pool, "organizer").await;
    let user = seed_user(&db.pool, "alice").await;
    let activity = seed_activity(&db.pool, &organizer, STATUS_PUBLISHED, 10).await;

    for rating in [3, 3, 4] {
        comment_service::add(&db.pool, &user, &activity, "rated", Some(rating), None)
            .await
            .unwrap();
    }

    let stats = comment_service::rating_stats(&db.pool, &activity).await.unwrap();
    assert_eq!(stats.average_rating, 3.3);
    assert_eq!(stats.total_ratings, 3);
}

#[tokio::test]
async fn user_comment_listing_embeds_the_activity() {
    let db = test_db().await;
    let organizer = seed_user(&db.pool, "organizer").await;
    let user = seed_user(&db.pool, "alice").await;
    let activity = seed_activity(&db.pool, &organizer, STATUS_PUBLISHED, 10).await;

    comment_service::add(&db.pool, &user, &activity, "mine", None, None)
        .await
        .unwrap();

    let page = comment_service::list_for_user(&db.pool, &user, 1, 10)
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.comments[0].activity.title, "Sunday five-a-side");
}
