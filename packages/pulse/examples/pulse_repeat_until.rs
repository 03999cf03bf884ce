//! Repeating a single-value source into a stream, stack-safely.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use pulse::{ObservableCallbacks, Single};

fn main() {
    let attempts = Arc::new(AtomicU32::new(0));

    let counter = Arc::clone(&attempts);
    let poll = Single::new(move |emitter| {
        emitter.on_success(counter.fetch_add(1, Ordering::Relaxed) + 1);
        Ok(())
    });

    // Each repetition resubscribes synchronously; the serializer trampoline
    // keeps the stack flat no matter how many rounds it takes.
    let subscription = poll
        .repeat_until(|attempt| Ok(*attempt >= 5))
        .subscribe(
            ObservableCallbacks::new()
                .on_next(|attempt: u32| println!("attempt {attempt}"))
                .on_complete(|| println!("done")),
        );

    drop(subscription);
}
