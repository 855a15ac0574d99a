use super::*;

#[test]
fn requests_drain_in_fifo_order() {
    let q = TransitionRequests::new();
    q.push("b", Direction::Forward, "a");
    q.push_external("c", Direction::Back);

    assert_eq!(q.len(), 2);
    let first = q.pop().unwrap();
    assert_eq!(first.target, "b");
    assert_eq!(first.origin.as_deref(), Some("a"));
    let second = q.pop().unwrap();
    assert_eq!(second.direction, Direction::Back);
    assert_eq!(second.origin, None);
    assert!(q.pop().is_none());
}

#[test]
fn clones_feed_the_same_queue() {
    let q = TransitionRequests::new();
    let scene_handle = q.clone();
    scene_handle.push("next", Direction::Forward, "intro");
    assert_eq!(q.pending()[0].target, "next");
    assert!(!q.is_empty());
}

#[test]
fn discard_from_only_drops_that_origin() {
    let q = TransitionRequests::new();
    q.push("x", Direction::Forward, "old");
    q.push_external("y", Direction::Forward);
    q.push("z", Direction::Forward, "new");
    q.push("w", Direction::Forward, "old");

    assert_eq!(q.discard_from("old"), 2);
    let targets: Vec<String> = q.pending().into_iter().map(|r| r.target).collect();
    assert_eq!(targets, vec!["y", "z"]);
}
