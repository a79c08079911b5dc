#![cfg(loom)]

use loom::sync::Arc;
use loom::thread;
use pc_queue::PcQueue;

#[test]
fn loom_one_producer_one_consumer() {
    loom::model(|| {
        let queue = Arc::new(PcQueue::new(1).unwrap());
        queue.register_producer().unwrap();

        let q = queue.clone();
        let producer = thread::spawn(move || {
            q.enqueue(7).unwrap();
            q.deregister_producer().unwrap();
        });

        let mut received = vec![];
        while let Some(v) = queue.dequeue().unwrap() {
            received.push(v);
        }

        producer.join().unwrap();
        assert_eq!(received, vec![7]);
    });
}

#[test]
fn loom_drain_broadcast() {
    loom::model(|| {
        let queue = Arc::new(PcQueue::<i32>::new(1).unwrap());
        queue.register_producer().unwrap();

        let consumers: Vec<_> = (0..2)
            .map(|_| {
                let q = queue.clone();
                thread::spawn(move || q.dequeue().unwrap())
            })
            .collect();

        queue.deregister_producer().unwrap();

        for c in consumers {
            assert_eq!(c.join().unwrap(), None);
        }
    });
}

#[test]
fn loom_two_producers_conserve_items() {
    loom::model(|| {
        let queue = Arc::new(PcQueue::new(2).unwrap());
        let mut producers = vec![];

        for i in 0..2 {
            let q = queue.clone();
            q.register_producer().unwrap();
            producers.push(thread::spawn(move || {
                q.enqueue(i).unwrap();
                q.deregister_producer().unwrap();
            }));
        }

        let q = queue.clone();
        let consumer = thread::spawn(move || {
            let mut received = vec![];
            while let Some(v) = q.dequeue().unwrap() {
                received.push(v);
            }
            received
        });

        for p in producers {
            p.join().unwrap();
        }
        let mut received = consumer.join().unwrap();
        received.sort_unstable();
        assert_eq!(received, vec![0, 1]);
    });
}

#[test]
fn loom_backpressure() {
    loom::model(|| {
        let queue = Arc::new(PcQueue::new(1).unwrap());
        queue.register_producer().unwrap();

        let q = queue.clone();
        let producer = thread::spawn(move || {
            for i in 0..2 {
                q.enqueue(i).unwrap();
            }
            q.deregister_producer().unwrap();
        });

        assert_eq!(queue.dequeue().unwrap(), Some(0));
        assert_eq!(queue.dequeue().unwrap(), Some(1));
        assert_eq!(queue.dequeue().unwrap(), None);
        producer.join().unwrap();
    });
}
