//! Cooperative cancellation: a producer that checks its emitter and a
//! consumer that cancels mid-stream.

use std::sync::{Arc, Mutex};

use pulse::{ActionDisposable, Disposable, DisposableRef, Observable, ObservableCallbacks};

fn main() {
    let source = Observable::new(|emitter| {
        emitter.set_disposable(Arc::new(ActionDisposable::new(|| {
            println!("upstream torn down");
        })));

        for value in 0_u64.. {
            // Disposal is observed mid-stream; the producer stops on its own.
            if emitter.is_disposed() {
                break;
            }
            emitter.on_next(value);
        }

        Ok(())
    });

    let handle: Arc<Mutex<Option<DisposableRef>>> = Arc::new(Mutex::new(None));

    let stored = Arc::clone(&handle);
    let cancelling = Arc::clone(&handle);

    let subscription = source.subscribe(
        ObservableCallbacks::new()
            .on_subscribe(move |handle| {
                *stored.lock().unwrap() = Some(handle);
            })
            .on_next(move |value: u64| {
                println!("next: {value}");
                if value == 2 {
                    // Cancel from inside the callback; no further elements arrive.
                    if let Some(handle) = cancelling.lock().unwrap().as_ref() {
                        handle.dispose();
                    }
                }
            }),
    );

    println!("cancelled: {}", subscription.is_disposed());
}
