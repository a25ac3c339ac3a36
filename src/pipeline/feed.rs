//! Feeder thread: pushes caller-supplied items into the first channel, then closes it.

use crossbeam_channel::Sender;
use log::debug;
use std::io;
use std::thread::{self, JoinHandle};

use crate::Item;

/// Spawn a thread that sends every item on `input_tx` and drops it when done. Returns the number
/// of items sent. Stops early if the pipeline side has gone away.
pub fn spawn_feed_thread<I>(items: I, input_tx: Sender<Item>) -> io::Result<JoinHandle<usize>>
where
    I: IntoIterator<Item = Item>,
    I::IntoIter: Send + 'static,
{
    let iter = items.into_iter();
    thread::Builder::new()
        .name("feed".to_string())
        .spawn(move || run_feed_loop(iter, input_tx))
}

/// Send each item from `iter` on `input_tx`; drop `input_tx` when done.
pub fn run_feed_loop<I>(iter: I, input_tx: Sender<Item>) -> usize
where
    I: Iterator<Item = Item>,
{
    let mut count = 0_usize;
    for item in iter {
        if input_tx.send(item).is_err() {
            break;
        }
        count += 1;
    }
    drop(input_tx);
    debug!("feed: sent {} items, input closed", count);
    count
}
