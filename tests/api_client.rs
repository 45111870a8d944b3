mod common;

use common::*;
use peer_review::api::*;
use peer_review::data::{fetch_view, CodeState, ViewTarget};

#[tokio::test]
async fn looks_up_users_by_email() {
    let collaborator = Collaborator::start().await;
    let api = collaborator.client();

    let user = api.user_by_email("ben@union.edu").await.unwrap();
    assert_eq!(user.id, AUTHOR);
    assert!(!user.is_teacher);

    let missing = api.user_by_email("nobody@union.edu").await;
    assert!(matches!(missing, Err(ApiError::NotFound)));
}

#[tokio::test]
async fn lists_classes_by_role() {
    let collaborator = Collaborator::start().await;
    let api = collaborator.client();

    let teacher = api.user(TEACHER).await.unwrap();
    let classes = api.classes_for(&teacher).await.unwrap();
    assert_eq!(classes.len(), 1);
    assert_eq!(classes[0].code, "CSC-120");

    let roster = api.roster(CLASS).await.unwrap();
    let ids: Vec<Id> = roster.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![AUTHOR, PEER]);
}

#[tokio::test]
async fn submission_query_filters_by_student() {
    let collaborator = Collaborator::start().await;
    let api = collaborator.client();

    let query = SubmissionQuery {
        student: Some(AUTHOR),
        current: true,
        requester: Some(PEER),
    };
    let found = api.submissions(ASSIGNMENT, &query).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].files[0].id, FILE);

    let query = SubmissionQuery {
        student: Some(PEER),
        ..query
    };
    assert!(api.submissions(ASSIGNMENT, &query).await.unwrap().is_empty());
}

#[tokio::test]
async fn forbidden_submission_query_is_restricted() {
    let collaborator = Collaborator::start().await;
    collaborator.world.lock().unwrap().restricted.insert(PEER);
    let api = collaborator.client();

    let target = ViewTarget {
        assignment: Some(ASSIGNMENT),
        student: Some(AUTHOR),
        ..ViewTarget::default()
    };
    let view = fetch_view(&api, PEER, &target).await;
    assert_eq!(view.code, CodeState::Restricted);
    assert!(view.records.is_empty());
}

#[tokio::test]
async fn comments_round_trip_through_the_collaborator() {
    let collaborator = Collaborator::start().await;
    let api = collaborator.client();

    let new = NewComment {
        submission: SUBMISSION,
        submission_file: FILE,
        user: PEER,
        comment: "Why print?".to_owned(),
        start_line: 1,
        end_line: 1,
        start_offset: 4,
        end_offset: 12,
        parent: None,
    };
    let created = api.create_comment(&new).await.unwrap();
    assert_eq!(created.start_offset, 4);
    assert_eq!(created.submission_file, Some(FILE));

    let updated = api.update_comment(created.id, "Why print here?").await.unwrap();
    assert_eq!(updated.comment, "Why print here?");

    let submission = api.submission(SUBMISSION).await.unwrap();
    assert_eq!(submission.comments, vec![updated]);

    api.delete_comment(created.id).await.unwrap();
    assert!(collaborator.comments().is_empty());
    assert!(matches!(
        api.delete_comment(created.id).await,
        Err(ApiError::NotFound)
    ));
}

#[tokio::test]
async fn loads_code_and_comments_for_a_student() {
    let collaborator = Collaborator::start().await;
    let api = collaborator.client();

    let target = ViewTarget {
        assignment: Some(ASSIGNMENT),
        student: Some(AUTHOR),
        ..ViewTarget::default()
    };
    let view = fetch_view(&api, PEER, &target).await;
    assert_eq!(view.submission, Some(SUBMISSION));
    assert_eq!(view.file, Some(FILE));
    let CodeState::Loaded(buffer) = &view.code else {
        panic!("expected code, got {:?}", view.code);
    };
    assert_eq!(buffer.line_count(), 4);
    assert_eq!(buffer.line(1), Some("    println!(\"hi\");"));

    let target = ViewTarget {
        student: Some(PEER),
        ..target
    };
    assert_eq!(fetch_view(&api, PEER, &target).await.code, CodeState::Missing);
}
