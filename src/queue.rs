use crossbeam_channel::{unbounded, Receiver, Sender};

/// The open queue of one search direction: one concurrent FIFO per heuristic
/// bucket. Enqueue is O(1); dequeue scans buckets high-to-low, so positions
/// with more boxes on their correct goals are expanded first.
///
/// This is best-first only as a hint: ties within a bucket are FIFO, and a
/// bucket may drain between the scan and the poll. A `None` from `pop` means
/// this caller saw every bucket empty.
pub struct OpenQueue<T> {
    buckets: Vec<(Sender<T>, Receiver<T>)>,
}

impl<T> OpenQueue<T> {
    pub fn new(bucket_count: usize) -> Self {
        OpenQueue {
            buckets: (0..bucket_count).map(|_| unbounded()).collect(),
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn push(&self, bucket: usize, item: T) {
        assert!(
            bucket < self.bucket_count(),
            "bucket {} out of range (queue has {})",
            bucket,
            self.bucket_count()
        );
        self.buckets[bucket]
            .0
            .send(item)
            .expect("open queue receiver dropped");
    }

    pub fn pop(&self) -> Option<T> {
        for (_, receiver) in self.buckets.iter().rev() {
            if let Ok(item) = receiver.try_recv() {
                return Some(item);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_empty() {
        let queue: OpenQueue<i32> = OpenQueue::new(4);
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_highest_bucket_first() {
        let queue = OpenQueue::new(4);
        queue.push(0, "low");
        queue.push(3, "high");
        queue.push(1, "mid");

        assert_eq!(queue.pop(), Some("high"));
        assert_eq!(queue.pop(), Some("mid"));
        assert_eq!(queue.pop(), Some("low"));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_fifo_within_bucket() {
        let queue = OpenQueue::new(2);
        queue.push(1, "first");
        queue.push(1, "second");
        queue.push(1, "third");

        assert_eq!(queue.pop(), Some("first"));
        assert_eq!(queue.pop(), Some("second"));
        assert_eq!(queue.pop(), Some("third"));
    }

    #[test]
    fn test_interleaved_push_pop() {
        let queue = OpenQueue::new(3);
        queue.push(0, 1);
        assert_eq!(queue.pop(), Some(1));
        queue.push(2, 2);
        queue.push(0, 3);
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(3));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    #[should_panic(expected = "bucket 2 out of range")]
    fn test_bucket_out_of_range() {
        let queue = OpenQueue::new(2);
        queue.push(2, ());
    }

    #[test]
    fn test_concurrent_producers_drain_fully() {
        let queue = OpenQueue::new(4);

        std::thread::scope(|scope| {
            for t in 0..4 {
                let queue = &queue;
                scope.spawn(move || {
                    for i in 0..100 {
                        queue.push(t, (t, i));
                    }
                });
            }
        });

        let mut count = 0;
        while queue.pop().is_some() {
            count += 1;
        }
        assert_eq!(count, 400);
    }
}
