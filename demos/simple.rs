//! Simple usage example

use pc_queue::PcQueue;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() {
    env_logger::init();
    println!("pc_queue - Simple Example\n");

    // Create a queue with 4 slots
    let queue = Arc::new(PcQueue::new(4).expect("queue"));

    // Register before spawning so the consumer can't see an empty, producerless queue
    queue.register_producer().expect("register");
    let producer_queue = queue.clone();
    let producer = thread::spawn(move || {
        for i in 0..10 {
            let message = format!("Message {}", i);
            println!("Sending: {}", message);
            // Blocks while all 4 slots are taken
            producer_queue.enqueue(message).expect("enqueue");
            thread::sleep(Duration::from_millis(50));
        }
        producer_queue.deregister_producer().expect("deregister");
        println!("Producer finished!");
    });

    let consumer_queue = queue.clone();
    let consumer = thread::spawn(move || {
        while let Some(message) = consumer_queue.dequeue().expect("dequeue") {
            println!("Received: {}", message);
        }
        println!("Consumer saw end of input!");
    });

    producer.join().unwrap();
    consumer.join().unwrap();

    println!("\nExample completed successfully!");
}
