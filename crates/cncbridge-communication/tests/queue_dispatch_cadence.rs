//! Integration coverage for the command queue's dispatch cadence,
//! independent of any transport or session plumbing.

use cncbridge_communication::CommandQueue;

fn program(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("G0 X{i} Y{i}")).collect()
}

#[test]
fn queue_streams_one_line_at_a_time_to_completion() {
    let mut queue = CommandQueue::new();
    queue.push(program(3));

    let mut on_wire = Vec::new();
    if let Some(line) = queue.play() {
        on_wire.push(line);
    }
    assert_eq!(on_wire, vec!["G0 X0 Y0"]);

    // Acks arrive one at a time; at most one line is ever in flight.
    let mut statuses = vec![(queue.executed_count(), queue.size())];
    for _ in 0..3 {
        if let Some(line) = queue.next() {
            on_wire.push(line);
        }
        statuses.push((queue.executed_count(), queue.size()));
    }

    assert_eq!(on_wire, vec!["G0 X0 Y0", "G0 X1 Y1", "G0 X2 Y2"]);
    assert_eq!(statuses, vec![(0, 3), (1, 3), (2, 3), (3, 3)]);
    assert!(!queue.is_running());
}

#[test]
fn pause_then_stop_then_replay_restreams_from_the_start() {
    let mut queue = CommandQueue::new();
    queue.push(program(3));

    queue.play();
    queue.next(); // one ack consumed, executed == 1

    queue.pause();
    assert_eq!(queue.next(), None, "an ack while paused must neither advance the cursor nor re-dispatch");
    assert_eq!(queue.executed_count(), 1);
    assert!(!queue.is_running());

    queue.stop();
    assert_eq!(queue.executed_count(), 0);
    assert_eq!(queue.size(), 3, "stop must not truncate the queue");

    assert_eq!(queue.play(), Some("G0 X0 Y0".to_string()));
}

#[test]
fn clear_mid_flight_drops_everything_and_orphans_the_outstanding_ack() {
    let mut queue = CommandQueue::new();
    queue.push(program(2));
    queue.play();

    queue.clear();
    assert_eq!(queue.size(), 0);
    assert_eq!(queue.executed_count(), 0);
    // The ack for the line that was in flight when clear() ran still
    // arrives eventually; the queue is no longer running, so it is the
    // Session's job (not the queue's) to decide what to do with it.
    assert!(!queue.is_running());
}
