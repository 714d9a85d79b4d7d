//! Fixed worker pool that delivers completed messages to callers
//! (`spec.md` §4.8, C8).

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use json::Value;
use tracing::warn;

use crate::client::message::Delivery;
use crate::error::Error;

enum Job {
    Completed {
        delivery: Delivery,
        result: Result<Value, Error>,
    },
}

/// A bounded pool of worker threads popping completed messages from a
/// shared queue and running their delivery (fulfil a future, or invoke a
/// callback). A panic inside a user callback is caught and logged rather
/// than taking the worker down, matching the original's "exceptions thrown
/// by user callbacks are swallowed".
pub struct Executor {
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Executor {
    pub fn new(pool_size: usize) -> Arc<Self> {
        let (tx, rx) = mpsc::channel::<Job>();
        let rx = Arc::new(Mutex::new(rx));
        let mut workers = Vec::with_capacity(pool_size);

        for worker_id in 0..pool_size.max(1) {
            let rx = rx.clone();
            workers.push(thread::spawn(move || loop {
                let job = {
                    let rx = rx.lock().unwrap_or_else(|e| e.into_inner());
                    rx.recv()
                };
                match job {
                    Ok(Job::Completed { delivery, result }) => {
                        Self::deliver(delivery, result, worker_id);
                    }
                    // `shutdown` drops the sender; `recv` then errs and the
                    // worker exits. There is no separate shutdown message.
                    Err(_) => break,
                }
            }));
        }

        Arc::new(Executor {
            sender: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
        })
    }

    fn deliver(delivery: Delivery, result: Result<Value, Error>, worker_id: usize) {
        match delivery {
            Delivery::Sync(slot) | Delivery::Notify(slot) => slot.fulfil(result),
            Delivery::Async(callback) => {
                if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback(result))).is_err() {
                    warn!(worker_id, "async RPC callback panicked; swallowed");
                }
            }
        }
    }

    pub fn submit(&self, delivery: Delivery, result: Result<Value, Error>) {
        let guard = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(tx) = guard.as_ref() {
            let _ = tx.send(Job::Completed { delivery, result });
        }
    }

    /// Stops accepting new work, wakes every idle worker, and joins them
    /// all. Idempotent: a second call is a no-op since the sender is
    /// already gone.
    pub fn shutdown(&self) {
        self.sender.lock().unwrap_or_else(|e| e.into_inner()).take();
        let mut workers = self.workers.lock().unwrap_or_else(|e| e.into_inner());
        for worker in workers.drain(..) {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::message::CallSlot;

    #[test]
    fn sync_delivery_fulfils_the_waiting_slot() {
        let executor = Executor::new(2);
        let slot = CallSlot::new();
        executor.submit(
            Delivery::Sync(slot.clone()),
            Ok(Value::from_bool(true, json::allocator::default_allocator())),
        );
        assert_eq!(slot.wait().unwrap().as_bool().unwrap(), true);
        executor.shutdown();
    }

    #[test]
    fn async_callback_panic_does_not_kill_the_worker() {
        let executor = Executor::new(1);
        executor.submit(
            Delivery::Async(Box::new(|_| panic!("boom"))),
            Ok(Value::null(json::allocator::default_allocator())),
        );

        let slot = CallSlot::new();
        executor.submit(
            Delivery::Sync(slot.clone()),
            Ok(Value::from_bool(true, json::allocator::default_allocator())),
        );
        assert_eq!(slot.wait().unwrap().as_bool().unwrap(), true);
        executor.shutdown();
    }
}
