//! Tokio task that drives a shared [`Picker`] through a shuffle.
//!
//! At most one task runs per driver: starting a shuffle aborts the previous
//! task, and the generation check makes any tick that slips through a no-op.

use rand::Rng;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;
use crate::picker::{Clock, Picker, PickerEvent, PoolKind};

pub type SharedPicker<T, C, R> = Arc<Mutex<Picker<T, C, R>>>;

pub struct ShuffleDriver<T, C: Clock, R: Rng> {
    picker: SharedPicker<T, C, R>,
    task: Option<JoinHandle<()>>,
}

impl<T, C, R> ShuffleDriver<T, C, R>
where
    T: PartialEq + Send + 'static,
    C: Clock + Send + 'static,
    R: Rng + Send + 'static,
{
    pub fn new(picker: Picker<T, C, R>) -> Self {
        Self {
            picker: Arc::new(Mutex::new(picker)),
            task: None,
        }
    }

    pub fn picker(&self) -> SharedPicker<T, C, R> {
        self.picker.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Start (or restart) a shuffle and drive it to completion.
    /// Events arrive on the returned channel, which closes when the shuffle ends or is cancelled.
    pub async fn spawn_shuffle(&mut self) -> mpsc::UnboundedReceiver<PickerEvent> {
        self.cancel();
        let generation = {
            let mut picker = self.picker.lock().await;
            picker.start_shuffle();
            picker.generation()
        };
        self.spawn_ticker(generation)
    }

    /// Replace the pool. Returns an event channel when this started a new shuffle.
    pub async fn set_pool(&mut self, kind: PoolKind, items: Vec<T>) -> Option<mpsc::UnboundedReceiver<PickerEvent>> {
        let (before, after, shuffling) = {
            let mut picker = self.picker.lock().await;
            let before = picker.generation();
            picker.set_pool(kind, items);
            (before, picker.generation(), picker.is_shuffling())
        };

        if before == after {
            return None;
        }
        self.cancel();
        shuffling.then(|| self.spawn_ticker(after))
    }

    fn spawn_ticker(&mut self, generation: u64) -> mpsc::UnboundedReceiver<PickerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let picker = self.picker.clone();

        self.task = Some(tokio::spawn(async move {
            loop {
                let (event, deadline) = {
                    let mut picker = picker.lock().await;
                    if picker.generation() != generation {
                        debug!(generation, "Stale shuffle task stopping");
                        return;
                    }
                    let event = picker.tick();
                    (event, picker.next_deadline())
                };

                match event {
                    PickerEvent::Waiting => {}
                    PickerEvent::Advanced(_) => {
                        if tx.send(event).is_err() {
                            return;
                        }
                    }
                    PickerEvent::Settled(_) | PickerEvent::Idle => {
                        let _ = tx.send(event);
                        return;
                    }
                }

                match deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => return,
                }
            }
        }));
        rx
    }

    /// Stop the running shuffle, if any. The picker keeps its state.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<T, C: Clock, R: Rng> Drop for ShuffleDriver<T, C, R> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
