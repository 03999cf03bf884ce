//! Basic usage: an imperatively driven stream and a callback subscription.

use pulse::{Disposable, Observable, ObservableCallbacks};

fn main() {
    let source = Observable::new(|emitter| {
        for value in 1..=3 {
            emitter.on_next(value);
        }
        emitter.on_complete();
        Ok(())
    });

    let subscription = source.subscribe(
        ObservableCallbacks::new()
            .on_next(|value: i32| println!("next: {value}"))
            .on_complete(|| println!("complete")),
    );

    // Each subscription runs the producing logic anew.
    let second = source.subscribe(
        ObservableCallbacks::new().on_next(|value: i32| println!("second subscriber: {value}")),
    );

    subscription.dispose();
    second.dispose();
}
