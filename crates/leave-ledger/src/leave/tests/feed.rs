use super::common::*;
use crate::leave::domain::{LeaveStatus, RequestFilter};

#[tokio::test]
async fn pending_feed_tracks_submissions_and_decisions() {
    let (_, service) = build_service();
    let mut feed = service.watch_requests(RequestFilter {
        employee_id: None,
        status: Some(LeaveStatus::Pending),
    });
    assert!(feed.current().expect("initial snapshot").is_empty());

    let request = july_request(&service, "E1", 1, 5);
    let snapshot = feed.changed().await.expect("feed refreshes");
    assert_eq!(snapshot, vec![request.clone()]);

    service
        .reject(&request.id, &manager(), None)
        .expect("rejection succeeds");
    let snapshot = feed.changed().await.expect("feed refreshes");
    assert!(snapshot.is_empty());
}

#[tokio::test]
async fn employee_feed_ignores_other_employees_in_its_snapshot() {
    let (_, service) = build_service();
    let mut feed = service.watch_requests(RequestFilter {
        employee_id: Some(employee("E1")),
        status: None,
    });
    assert_eq!(feed.filter().employee_id, Some(employee("E1")));

    july_request(&service, "E2", 1, 5);
    assert!(feed.changed().await.expect("feed refreshes").is_empty());

    let own = july_request(&service, "E1", 8, 9);
    let snapshot = feed.changed().await.expect("feed refreshes");
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, own.id);
}

#[tokio::test]
async fn approval_shows_up_in_the_approved_feed() {
    let (_, service) = build_service();
    seed_eight_days(&service, "E1");
    let request = july_request(&service, "E1", 1, 5);
    let mut feed = service.watch_requests(RequestFilter {
        employee_id: None,
        status: Some(LeaveStatus::Approved),
    });
    assert!(feed.current().expect("initial snapshot").is_empty());

    service
        .approve(&request.id, &manager(), may_hire(), &no_holidays())
        .expect("approval succeeds");

    let snapshot = feed.changed().await.expect("feed refreshes");
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].status, LeaveStatus::Approved);
}
