//! Bounded Queue Tests
//!
//! These tests verify:
//! - FIFO ordering
//! - Producers block while full, consumers while empty
//! - Every item is delivered exactly once under contention
//! - Closing releases blocked threads

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mtkv::sync::{BoundedQueue, QueueClosed};

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_queue_fifo_order() {
    let queue = BoundedQueue::new(8);
    for i in 0..5 {
        queue.enqueue(i).unwrap();
    }

    assert_eq!(queue.len(), 5);
    for i in 0..5 {
        assert_eq!(queue.dequeue(), Some(i));
    }
    assert!(queue.is_empty());
}

#[test]
fn test_queue_capacity() {
    let queue = BoundedQueue::<u32>::new(3);
    assert_eq!(queue.capacity(), 3);
    assert!(!queue.is_closed());
}

#[test]
fn test_queue_fill_to_capacity() {
    let queue = BoundedQueue::new(3);
    for i in 0..3 {
        queue.enqueue(i).unwrap();
    }
    assert_eq!(queue.len(), queue.capacity());
}

// =============================================================================
// Blocking Tests
// =============================================================================

#[test]
fn test_enqueue_blocks_when_full() {
    let queue = Arc::new(BoundedQueue::new(1));
    queue.enqueue(1).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let producer = {
        let queue = Arc::clone(&queue);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            queue.enqueue(2).unwrap();
            done.store(true, Ordering::SeqCst);
        })
    };

    thread::sleep(Duration::from_millis(100));
    assert!(!done.load(Ordering::SeqCst), "producer should still be blocked");
    assert_eq!(queue.len(), 1);

    assert_eq!(queue.dequeue(), Some(1));
    producer.join().unwrap();

    assert!(done.load(Ordering::SeqCst));
    assert_eq!(queue.dequeue(), Some(2));
}

#[test]
fn test_dequeue_blocks_when_empty() {
    let queue = Arc::new(BoundedQueue::new(4));
    let (tx, rx) = mpsc::channel();

    let consumer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let item = queue.dequeue();
            tx.send(item).unwrap();
        })
    };

    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

    queue.enqueue(7).unwrap();
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), Some(7));
    consumer.join().unwrap();
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_queue_many_producers_many_consumers() {
    const PRODUCERS: usize = 4;
    const CONSUMERS: usize = 4;
    const PER_PRODUCER: usize = 250;

    let queue = Arc::new(BoundedQueue::new(5));
    let mut producers = Vec::new();

    for p in 0..PRODUCERS {
        let queue = Arc::clone(&queue);
        producers.push(thread::spawn(move || {
            for i in 0..PER_PRODUCER {
                queue.enqueue(p * PER_PRODUCER + i).unwrap();
            }
        }));
    }

    let mut consumers = Vec::new();
    for _ in 0..CONSUMERS {
        let queue = Arc::clone(&queue);
        consumers.push(thread::spawn(move || {
            let mut seen = Vec::new();
            for _ in 0..PER_PRODUCER {
                match queue.dequeue() {
                    Some(item) => seen.push(item),
                    None => break,
                }
            }
            seen
        }));
    }

    for producer in producers {
        producer.join().unwrap();
    }

    let mut all = HashSet::new();
    for consumer in consumers {
        for item in consumer.join().unwrap() {
            assert!(all.insert(item), "item {} delivered twice", item);
        }
    }

    assert_eq!(all.len(), PRODUCERS * PER_PRODUCER);
    assert!(queue.is_empty());
}

#[test]
fn test_single_producer_order_preserved() {
    let queue = Arc::new(BoundedQueue::new(2));

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            for i in 0..100 {
                queue.enqueue(i).unwrap();
            }
        })
    };

    let received: Vec<_> = (0..100).filter_map(|_| queue.dequeue()).collect();
    producer.join().unwrap();

    assert_eq!(received, (0..100).collect::<Vec<_>>());
}

// =============================================================================
// Close Tests
// =============================================================================

#[test]
fn test_close_wakes_blocked_consumers() {
    let queue = Arc::new(BoundedQueue::<u32>::new(2));
    let mut consumers = Vec::new();

    for _ in 0..3 {
        let queue = Arc::clone(&queue);
        consumers.push(thread::spawn(move || queue.dequeue()));
    }

    thread::sleep(Duration::from_millis(50));
    assert!(queue.close().is_empty());

    for consumer in consumers {
        assert_eq!(consumer.join().unwrap(), None);
    }
}

#[test]
fn test_close_wakes_blocked_producer() {
    let queue = Arc::new(BoundedQueue::new(1));
    queue.enqueue("first").unwrap();

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.enqueue("second"))
    };

    thread::sleep(Duration::from_millis(50));
    let pending = queue.close();

    assert_eq!(pending, vec!["first"]);
    assert_eq!(producer.join().unwrap(), Err(QueueClosed("second")));
    assert!(queue.is_closed());
}

#[test]
fn test_close_is_idempotent() {
    let queue = BoundedQueue::new(2);
    queue.enqueue(1).unwrap();

    assert_eq!(queue.close(), vec![1]);
    assert!(queue.close().is_empty());
    assert_eq!(queue.dequeue(), None);
}
