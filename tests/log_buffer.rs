// tests/log_buffer.rs

use proptest::prelude::*;

use jobtower::logs::{DEFAULT_LOG_CAPACITY, LogBuffer};
use jobtower::types::JobStatus;

#[test]
fn default_capacity_is_one_thousand() {
    let buffer = LogBuffer::default();
    assert_eq!(buffer.capacity(), DEFAULT_LOG_CAPACITY);
    assert_eq!(buffer.capacity(), 1000);
    assert!(buffer.is_empty());
}

#[test]
fn overflowing_a_full_buffer_evicts_oldest_first() {
    let buffer = LogBuffer::new(1000);
    for i in 0..2500 {
        buffer.append(format!("line {i}"));
    }

    let held = buffer.snapshot();
    assert_eq!(held.len(), 1000);
    assert_eq!(held.first().map(|e| e.text.as_str()), Some("line 1500"));
    assert_eq!(held.last().map(|e| e.text.as_str()), Some("line 2499"));
    assert_eq!(buffer.total_appended(), 2500);
}

#[test]
fn cursor_reads_only_new_entries() {
    let buffer = LogBuffer::new(10);
    buffer.append("a");
    buffer.append("b");

    let (first, cursor) = buffer.read_from(0);
    assert_eq!(first.iter().map(|e| e.text.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(cursor, 2);

    let (nothing, same) = buffer.read_from(cursor);
    assert!(nothing.is_empty());
    assert_eq!(same, 2);

    buffer.append("c");
    let (next, cursor) = buffer.read_from(cursor);
    assert_eq!(next.iter().map(|e| e.text.as_str()).collect::<Vec<_>>(), vec!["c"]);
    assert_eq!(cursor, 3);
}

#[test]
fn cursor_behind_eviction_skips_to_oldest_held() {
    let buffer = LogBuffer::new(3);
    for text in ["a", "b", "c", "d", "e"] {
        buffer.append(text);
    }

    let (entries, cursor) = buffer.read_from(1);
    assert_eq!(
        entries.iter().map(|e| e.text.as_str()).collect::<Vec<_>>(),
        vec!["c", "d", "e"]
    );
    assert_eq!(entries.iter().map(|e| e.seq).collect::<Vec<_>>(), vec![2, 3, 4]);
    assert_eq!(cursor, 5);
}

#[test]
fn zero_capacity_is_clamped_to_one() {
    let buffer = LogBuffer::new(0);
    buffer.append("x");
    buffer.append("y");
    assert_eq!(buffer.capacity(), 1);
    assert_eq!(buffer.snapshot().iter().map(|e| e.text.as_str()).collect::<Vec<_>>(), vec!["y"]);
}

#[test]
fn rendered_entry_has_clock_prefix() {
    let buffer = LogBuffer::new(2);
    buffer.append("hello");
    let entry = buffer.snapshot().remove(0);
    let rendered = entry.render();
    assert_eq!(rendered, format!("[{}] hello", entry.timestamp.format("%H:%M:%S")));
}

#[tokio::test]
async fn append_wakes_waiting_reader() {
    let buffer = std::sync::Arc::new(LogBuffer::new(4));
    let waiter = std::sync::Arc::clone(&buffer);

    let reader = tokio::spawn(async move {
        let notified = waiter.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if waiter.is_empty() {
            notified.await;
        }
        waiter.snapshot().len()
    });

    tokio::task::yield_now().await;
    buffer.append("ping");

    let seen = tokio::time::timeout(std::time::Duration::from_secs(5), reader)
        .await
        .expect("reader woke up")
        .expect("reader task ok");
    assert_eq!(seen, 1);
}

#[tokio::test]
async fn close_records_first_status_and_wakes_readers() {
    let buffer = std::sync::Arc::new(LogBuffer::new(4));
    assert_eq!(buffer.closed(), None);

    let waiter = std::sync::Arc::clone(&buffer);
    let reader = tokio::spawn(async move {
        let notified = waiter.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if waiter.closed().is_none() {
            notified.await;
        }
        waiter.closed()
    });

    tokio::task::yield_now().await;
    buffer.close(JobStatus::Completed);
    buffer.close(JobStatus::Failed);

    let seen = tokio::time::timeout(std::time::Duration::from_secs(5), reader)
        .await
        .expect("reader woke up")
        .expect("reader task ok");
    assert_eq!(seen, Some(JobStatus::Completed));
}

proptest! {
    #[test]
    fn buffer_never_exceeds_capacity_and_keeps_newest(
        capacity in 1usize..64,
        lines in 0usize..300,
    ) {
        let buffer = LogBuffer::new(capacity);
        for i in 0..lines {
            buffer.append(format!("{i}"));
            prop_assert!(buffer.len() <= capacity);
        }

        let held = buffer.snapshot();
        let expected_len = lines.min(capacity);
        prop_assert_eq!(held.len(), expected_len);

        // Exactly the newest `expected_len` lines, oldest first.
        let expected: Vec<String> = (lines - expected_len..lines).map(|i| i.to_string()).collect();
        let actual: Vec<String> = held.iter().map(|e| e.text.clone()).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn independent_cursors_see_increasing_sequences(
        capacity in 1usize..16,
        batches in proptest::collection::vec(0usize..10, 1..20),
    ) {
        let buffer = LogBuffer::new(capacity);
        let mut cursor = 0u64;
        let mut last_seen: Option<u64> = None;

        for batch in batches {
            for _ in 0..batch {
                buffer.append("x");
            }
            let (entries, next) = buffer.read_from(cursor);
            for entry in &entries {
                if let Some(prev) = last_seen {
                    prop_assert!(entry.seq > prev);
                }
                last_seen = Some(entry.seq);
            }
            prop_assert!(entries.len() <= capacity);
            prop_assert_eq!(next, buffer.total_appended());
            cursor = next;
        }
    }
}
