//! Integration tests for Queue

use compio_queue::{Elapsed, Queue, QueueEmpty, TooManyAcknowledgements};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[compio::test]
async fn test_queue_fifo_order() {
    compio::time::timeout(Duration::from_secs(5), async {
        let queue = Queue::unbounded();

        for i in 0..200 {
            queue.put_nowait(i).unwrap();
        }

        for i in 0..200 {
            assert_eq!(queue.get_nowait(), Ok(i));
        }
    })
    .await
    .expect("test timed out");
}

#[compio::test]
async fn test_queue_fifo_order_async() {
    compio::time::timeout(Duration::from_secs(5), async {
        let queue = Queue::bounded(16);

        for i in 0..16 {
            queue.put(i).await;
        }

        for i in 0..16 {
            assert_eq!(queue.get().await, i);
        }
    })
    .await
    .expect("test timed out");
}

#[compio::test]
async fn test_queue_bounded_put_nowait_fails_when_full() {
    compio::time::timeout(Duration::from_secs(5), async {
        let queue = Queue::bounded(10);

        for i in 0..10 {
            queue.put_nowait(i).unwrap();
        }

        assert!(queue.is_full());
        let err = queue.put_nowait(10).unwrap_err();
        assert_eq!(err.into_inner(), 10);
    })
    .await
    .expect("test timed out");
}

#[compio::test]
async fn test_queue_get_nowait_on_empty() {
    compio::time::timeout(Duration::from_secs(5), async {
        let queue = Queue::<u32>::new(0);
        assert_eq!(queue.get_nowait(), Err(QueueEmpty));
    })
    .await
    .expect("test timed out");
}

#[compio::test]
async fn test_queue_handoff_to_waiting_getter() {
    compio::time::timeout(Duration::from_secs(5), async {
        let queue = Arc::new(Queue::bounded(1));

        let queue_clone = queue.clone();
        let handle = compio::runtime::spawn(async move { queue_clone.get().await });

        // Give getter time to start and park
        compio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(queue.waiting_getters(), 1);

        queue.put(42).await;

        assert_eq!(handle.await.unwrap(), 42);
        assert_eq!(queue.len(), 0);
    })
    .await
    .expect("test timed out");
}

#[compio::test]
async fn test_queue_put_waits_for_capacity() {
    compio::time::timeout(Duration::from_secs(5), async {
        let queue = Arc::new(Queue::bounded(2));
        queue.put(1).await;
        queue.put(2).await;

        let queue_clone = queue.clone();
        let handle = compio::runtime::spawn(async move {
            queue_clone.put(3).await;
            "stored"
        });

        compio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(queue.waiting_putters(), 1);
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.get().await, 1);
        assert_eq!(handle.await.unwrap(), "stored");

        assert_eq!(queue.get_nowait(), Ok(2));
        assert_eq!(queue.get_nowait(), Ok(3));
    })
    .await
    .expect("test timed out");
}

#[compio::test]
async fn test_queue_getters_served_in_order() {
    compio::time::timeout(Duration::from_secs(5), async {
        let queue = Arc::new(Queue::unbounded());
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        let mut handles = vec![];
        for i in 0..5 {
            let queue = queue.clone();
            let order = order.clone();
            handles.push(compio::runtime::spawn(async move {
                let item = queue.get().await;
                order.lock().unwrap().push((i, item));
            }));
            // Park them one after the other
            compio::time::sleep(Duration::from_millis(5)).await;
        }

        for item in 0..5 {
            queue.put(item * 10).await;
        }

        for handle in handles {
            handle.await.unwrap();
        }

        let order = order.lock().unwrap();
        assert_eq!(order.len(), 5);
        for &(task, item) in order.iter() {
            assert_eq!(item, task * 10, "getter {task} received {item}");
        }
    })
    .await
    .expect("test timed out");
}

#[compio::test]
async fn test_queue_putters_served_in_order() {
    compio::time::timeout(Duration::from_secs(5), async {
        let queue = Arc::new(Queue::bounded(1));
        queue.put(0).await;

        let mut handles = vec![];
        for i in 1..=3 {
            let queue = queue.clone();
            handles.push(compio::runtime::spawn(async move {
                queue.put(i).await;
            }));
            // Park them one after the other
            compio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(queue.waiting_putters(), 3);

        let mut order = vec![];
        for _ in 0..4 {
            order.push(queue.get().await);
        }
        assert_eq!(order, vec![0, 1, 2, 3]);

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(queue.waiting_putters(), 0);
    })
    .await
    .expect("test timed out");
}

#[compio::test]
async fn test_queue_task_done_on_fresh_queue() {
    compio::time::timeout(Duration::from_secs(5), async {
        let queue = Queue::<u32>::unbounded();
        assert_eq!(queue.task_done(), Err(TooManyAcknowledgements));
    })
    .await
    .expect("test timed out");
}

#[compio::test]
async fn test_queue_task_done_once_too_many() {
    compio::time::timeout(Duration::from_secs(5), async {
        let queue = Queue::unbounded();
        queue.put("a").await;
        queue.put("b").await;

        queue.task_done().unwrap();
        queue.task_done().unwrap();
        assert_eq!(queue.task_done(), Err(TooManyAcknowledgements));
    })
    .await
    .expect("test timed out");
}

#[compio::test]
async fn test_queue_join_returns_after_last_task_done() {
    compio::time::timeout(Duration::from_secs(5), async {
        let queue = Arc::new(Queue::unbounded());
        for i in 0..3 {
            queue.put(i).await;
        }

        let joined = Arc::new(AtomicBool::new(false));
        let queue_clone = queue.clone();
        let joined_clone = joined.clone();
        let handle = compio::runtime::spawn(async move {
            queue_clone.join().await;
            joined_clone.store(true, Ordering::Release);
        });

        compio::time::sleep(Duration::from_millis(10)).await;
        assert!(!joined.load(Ordering::Acquire));

        queue.task_done().unwrap();
        queue.task_done().unwrap();
        compio::time::sleep(Duration::from_millis(10)).await;
        assert!(!joined.load(Ordering::Acquire), "join returned before last task_done");

        queue.task_done().unwrap();
        handle.await.unwrap();
        assert!(joined.load(Ordering::Acquire));
    })
    .await
    .expect("test timed out");
}

#[compio::test]
async fn test_queue_join_stays_suspended_with_outstanding_items() {
    compio::time::timeout(Duration::from_secs(5), async {
        let queue = Queue::unbounded();
        queue.put(1).await;
        queue.put(2).await;
        queue.task_done().unwrap();

        let result = compio::time::timeout(Duration::from_millis(100), queue.join()).await;
        assert!(result.is_err(), "Should timeout - one item unacknowledged");
    })
    .await
    .expect("test timed out");
}

#[compio::test]
async fn test_queue_multiple_joiners_released_together() {
    compio::time::timeout(Duration::from_secs(5), async {
        let queue = Arc::new(Queue::unbounded());
        queue.put(()).await;

        let released = Arc::new(AtomicUsize::new(0));
        let mut handles = vec![];
        for _ in 0..10 {
            let queue = queue.clone();
            let released = released.clone();
            handles.push(compio::runtime::spawn(async move {
                queue.join().await;
                released.fetch_add(1, Ordering::Relaxed);
            }));
        }

        compio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(released.load(Ordering::Relaxed), 0);

        queue.get().await;
        queue.task_done().unwrap();

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(released.load(Ordering::Relaxed), 10);
    })
    .await
    .expect("test timed out");
}

#[compio::test]
async fn test_queue_worker_pool_join() {
    compio::time::timeout(Duration::from_secs(5), async {
        let queue = Arc::new(Queue::bounded(4));
        let processed = Arc::new(AtomicUsize::new(0));

        // Workers run forever; keep their handles alive until the test ends
        let mut workers = vec![];
        for _ in 0..3 {
            let queue = queue.clone();
            let processed = processed.clone();
            workers.push(compio::runtime::spawn(async move {
                loop {
                    let item: usize = queue.get().await;
                    processed.fetch_add(item, Ordering::Relaxed);
                    queue.task_done().unwrap();
                }
            }));
        }

        for i in 1..=100 {
            queue.put(i).await;
        }

        compio::time::timeout(Duration::from_secs(5), queue.join())
            .await
            .expect("workers should acknowledge every item");
        assert_eq!(processed.load(Ordering::Relaxed), 5050);
        assert_eq!(queue.unfinished_tasks(), 0);
        drop(workers);
    })
    .await
    .expect("test timed out");
}

#[compio::test]
async fn test_queue_get_timeout_expires() {
    compio::time::timeout(Duration::from_secs(5), async {
        let queue = Queue::<u32>::unbounded();

        let result = queue.get_timeout(Duration::from_millis(20)).await;
        assert_eq!(result, Err(Elapsed));

        // The timed-out getter must not linger
        assert_eq!(queue.waiting_getters(), 0);
        queue.put_nowait(1).unwrap();
        assert_eq!(queue.get_nowait(), Ok(1));
    })
    .await
    .expect("test timed out");
}

#[compio::test]
async fn test_queue_get_timeout_succeeds() {
    compio::time::timeout(Duration::from_secs(5), async {
        let queue = Arc::new(Queue::unbounded());

        let queue_clone = queue.clone();
        let handle = compio::runtime::spawn(async move {
            compio::time::sleep(Duration::from_millis(10)).await;
            queue_clone.put(7).await;
        });

        assert_eq!(queue.get_timeout(Duration::from_secs(2)).await, Ok(7));
        handle.await.unwrap();
    })
    .await
    .expect("test timed out");
}

#[compio::test]
async fn test_queue_put_timeout_returns_item() {
    compio::time::timeout(Duration::from_secs(5), async {
        let queue = Queue::bounded(1);
        queue.put(String::from("first")).await;

        let err = queue
            .put_timeout(String::from("second"), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert_eq!(err.into_inner(), "second");

        assert_eq!(queue.waiting_putters(), 0);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.unfinished_tasks(), 1);
    })
    .await
    .expect("test timed out");
}

#[compio::test]
async fn test_queue_put_timeout_succeeds_after_get() {
    compio::time::timeout(Duration::from_secs(5), async {
        let queue = Arc::new(Queue::bounded(1));
        queue.put(1).await;

        let queue_clone = queue.clone();
        let handle = compio::runtime::spawn(async move {
            compio::time::sleep(Duration::from_millis(10)).await;
            queue_clone.get().await
        });

        queue
            .put_timeout(2, Duration::from_secs(2))
            .await
            .expect("capacity should free up");
        assert_eq!(handle.await.unwrap(), 1);
        assert_eq!(queue.get_nowait(), Ok(2));
    })
    .await
    .expect("test timed out");
}

#[compio::test]
async fn test_queue_join_timeout() {
    compio::time::timeout(Duration::from_secs(5), async {
        let queue = Queue::unbounded();
        assert_eq!(queue.join_timeout(Duration::from_millis(10)).await, Ok(()));

        queue.put(1).await;
        assert_eq!(
            queue.join_timeout(Duration::from_millis(10)).await,
            Err(Elapsed)
        );
    })
    .await
    .expect("test timed out");
}

#[compio::test]
async fn test_queue_cancelled_getter_does_not_block_line() {
    compio::time::timeout(Duration::from_secs(5), async {
        let queue = Arc::new(Queue::unbounded());

        // A getter that gives up
        let result = compio::time::timeout(Duration::from_millis(10), queue.get()).await;
        assert!(result.is_err());

        let queue_clone = queue.clone();
        let handle = compio::runtime::spawn(async move { queue_clone.get().await });
        compio::time::sleep(Duration::from_millis(10)).await;

        queue.put(99).await;
        assert_eq!(handle.await.unwrap(), 99);
    })
    .await
    .expect("test timed out");
}

#[compio::test]
async fn test_queue_shared_via_arc() {
    compio::time::timeout(Duration::from_secs(5), async {
        let queue = Arc::new(Queue::unbounded());
        let queue2 = queue.clone();

        queue.put(1).await;
        assert_eq!(queue2.len(), 1);
        assert_eq!(queue2.get().await, 1);
        assert!(queue.is_empty());
    })
    .await
    .expect("test timed out");
}
