pub use enclose::*;

/// Builds a [`Listener`](crate::Listener), cloning the listed captures
/// into it first.
///
/// ```
/// use notifier::{listener, SyncNotifier, SyncState};
///
/// let counter = SyncNotifier::<u32, ()>::new(|| SyncState::Loaded(0));
/// let on_change = listener!((counter) => {
///     println!("{:?}", *counter.get());
/// });
/// counter.add_listener(on_change);
/// ```
#[macro_export]
macro_rules! listener {
    (( $($d_tt:tt)* ) => $($b:tt)*) => {{
        let listener: $crate::Listener =
            $crate::macros::enclose!(($( $d_tt )*) ::std::rc::Rc::new(move || { $($b)* }));
        listener
    }};
    (=> $($b:tt)*) => {{
        let listener: $crate::Listener = ::std::rc::Rc::new(move || { $($b)* });
        listener
    }};
}
