use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use futures::channel::{mpsc, oneshot};
use futures::executor::{LocalPool, LocalSpawner};
use futures::stream;
use notifier::{
	listener, AsyncNotifier, AsyncState, Error, Notifier, Registry, StreamNotifier, StreamState,
	SyncNotifier, SyncState, Trace, Var,
};


use mock::{Recorder, SharedMock};

fn pool() -> (LocalPool, LocalSpawner) {
	let pool = LocalPool::new();
	let spawner = pool.spawner();
	(pool, spawner)
}

#[test]
fn var_notifies_on_identical_writes() {
	let var = Var::new(3);
	let mock = SharedMock::new();
	var.add_listener(mock.listener());

	mock.get().expect_trigger().times(3).return_const(());

	var.set(3);
	var.set(3);
	var.set(3);

	mock.get().checkpoint();
}

#[test]
fn var_as_notifier() {
	let var = Var::new(String::from("a"));
	let recorder = Recorder::attach(&var);

	var.set("b".into());
	var.update(|s| s.push('c'));

	assert_eq!(recorder.seen(), vec!["a", "b", "bc"]);
}

#[test]
fn sync_starts_with_first_producer_result() {
	let calls = Rc::new(Cell::new(0));
	let notifier = SyncNotifier::<i32, String>::new({
		let calls = calls.clone();
		move || {
			calls.set(calls.get() + 1);
			SyncState::Loaded(calls.get())
		}
	});

	assert_eq!(calls.get(), 1);
	assert_eq!(notifier.state(), SyncState::Loaded(1));
}

#[test]
fn sync_reload_runs_producer_once_per_call() {
	let calls = Rc::new(Cell::new(0));
	let notifier = SyncNotifier::<i32, String>::new({
		let calls = calls.clone();
		move || {
			calls.set(calls.get() + 1);
			SyncState::Loaded(calls.get())
		}
	});

	let mock = SharedMock::new();
	notifier.add_listener(mock.listener());
	mock.get().expect_trigger().times(3).return_const(());

	notifier.reload();
	notifier.reload();
	notifier.reload();

	mock.get().checkpoint();
	assert_eq!(calls.get(), 4);
	assert_eq!(notifier.state(), SyncState::Loaded(4));
}

#[test]
fn sync_producer_error() {
	let notifier = SyncNotifier::new(|| SyncState::from(Err::<i32, _>("x".to_owned())));
	assert_eq!(notifier.state(), SyncState::Error("x".to_owned()));
	assert!(notifier.get().is_error());
}

#[test]
fn sync_direct_writes_notify() {
	let notifier = SyncNotifier::<i32, ()>::new(|| SyncState::Loaded(0));
	let recorder = Recorder::attach(&notifier);

	notifier.update(|state| {
		if let SyncState::Loaded(count) = state {
			*count += 1;
		}
	});
	notifier.set(SyncState::Loaded(10));
	notifier.set(SyncState::Loaded(10));

	assert_eq!(
		recorder.seen(),
		vec![
			SyncState::Loaded(0),
			SyncState::Loaded(1),
			SyncState::Loaded(10),
			SyncState::Loaded(10),
		]
	);
}

#[test]
fn sync_listener_removal() {
	let notifier = SyncNotifier::<i32, ()>::new(|| SyncState::Loaded(0));
	let mock = SharedMock::new();
	let listener = mock.listener();
	notifier.add_listener(listener.clone());

	mock.get().expect_trigger().times(1).return_const(());
	notifier.reload();
	notifier.remove_listener(&listener);
	notifier.remove_listener(&listener);
	notifier.reload();

	mock.get().checkpoint();
}

#[test]
#[should_panic(expected = "producer failed")]
fn sync_producer_panic_escapes_reload() {
	let first = Cell::new(true);
	let notifier = SyncNotifier::<i32, ()>::new(move || {
		if first.replace(false) {
			SyncState::Loaded(1)
		} else {
			panic!("producer failed")
		}
	});

	notifier.reload();
}

#[test]
fn async_construction_loads_once() {
	let (mut pool, spawner) = pool();
	let notifier =
		AsyncNotifier::new(spawner, || async { AsyncState::<i32, String>::Loaded(5) }).unwrap();

	assert_eq!(notifier.state(), AsyncState::Loading);
	let recorder = Recorder::attach(&notifier);

	pool.run_until_stalled();

	assert_eq!(
		recorder.seen(),
		vec![AsyncState::Loading, AsyncState::Loaded(5)]
	);
}

#[test]
fn async_reload_publishes_loading_then_result() {
	let (mut pool, spawner) = pool();
	let notifier =
		AsyncNotifier::new(spawner, || async { AsyncState::<i32, String>::Loaded(5) }).unwrap();
	pool.run_until_stalled();

	let recorder = Recorder::attach(&notifier);
	let mock = SharedMock::new();
	notifier.add_listener(mock.listener());
	mock.get().expect_trigger().times(2).return_const(());

	let reload = notifier.reload().unwrap();
	assert!(notifier.get().is_loading());
	pool.run_until(reload);

	mock.get().checkpoint();
	assert_eq!(
		recorder.seen()[1..],
		[AsyncState::Loading, AsyncState::Loaded(5)]
	);
}

#[test]
fn async_error_result() {
	let (mut pool, spawner) = pool();
	let notifier = AsyncNotifier::new(spawner, || async {
		AsyncState::<i32, String>::Error("x".to_owned())
	})
	.unwrap();
	let recorder = Recorder::attach(&notifier);

	pool.run_until_stalled();

	assert_eq!(
		recorder.seen(),
		vec![AsyncState::Loading, AsyncState::Error("x".to_owned())]
	);
}

type Pending = Rc<RefCell<VecDeque<oneshot::Sender<AsyncState<i32, String>>>>>;

/// A notifier whose reloads settle when the test says so.
fn deferred(spawner: LocalSpawner, pending: &Pending) -> AsyncNotifier<i32, String> {
	AsyncNotifier::new(spawner, {
		let pending = pending.clone();
		move || {
			let (tx, rx) = oneshot::channel();
			pending.borrow_mut().push_back(tx);
			async move { rx.await.unwrap_or(AsyncState::Error("abandoned".to_owned())) }
		}
	})
	.unwrap()
}

#[test]
fn async_overlapping_reloads_last_settled_wins() {
	let (mut pool, spawner) = pool();
	let pending: Pending = Default::default();
	let notifier = deferred(spawner, &pending);
	let _initial = pending.borrow_mut().pop_front().unwrap();

	let older = notifier.reload().unwrap();
	let newer = notifier.reload().unwrap();
	let older_tx = pending.borrow_mut().pop_front().unwrap();
	let newer_tx = pending.borrow_mut().pop_front().unwrap();

	let _ = newer_tx.send(AsyncState::Loaded(2));
	pool.run_until(newer);
	assert_eq!(notifier.state(), AsyncState::Loaded(2));

	let _ = older_tx.send(AsyncState::Loaded(1));
	pool.run_until(older);
	assert_eq!(notifier.state(), AsyncState::Loaded(1));
}

#[test]
fn async_result_after_drop_is_discarded() {
	let (mut pool, spawner) = pool();
	let pending: Pending = Default::default();
	let notifier = deferred(spawner, &pending);

	let reload = notifier.reload().unwrap();
	drop(notifier);

	let tx = pending.borrow_mut().pop_back().unwrap();
	assert!(tx.send(AsyncState::Loaded(1)).is_ok());
	pool.run_until(reload);
	pool.run_until_stalled();
}

#[test]
fn async_reload_settles_without_being_awaited() {
	let (mut pool, spawner) = pool();
	let notifier =
		AsyncNotifier::new(spawner, || async { AsyncState::<i32, String>::Loaded(5) }).unwrap();
	pool.run_until_stalled();

	let recorder = Recorder::attach(&notifier);
	drop(notifier.reload().unwrap());
	assert_eq!(notifier.state(), AsyncState::Loading);

	pool.run_until_stalled();

	assert_eq!(notifier.state(), AsyncState::Loaded(5));
	assert_eq!(
		recorder.seen(),
		vec![
			AsyncState::Loaded(5),
			AsyncState::Loading,
			AsyncState::Loaded(5)
		]
	);
}

#[test]
fn async_refresh_is_spawned() {
	let (mut pool, spawner) = pool();
	let calls = Rc::new(Cell::new(0));
	let notifier = AsyncNotifier::new(spawner, {
		let calls = calls.clone();
		move || {
			calls.set(calls.get() + 1);
			let value = calls.get();
			async move { AsyncState::<i32, ()>::Loaded(value) }
		}
	})
	.unwrap();
	pool.run_until_stalled();

	let recorder = Recorder::attach(&notifier);
	notifier.refresh().unwrap();
	pool.run_until_stalled();

	assert_eq!(
		recorder.seen(),
		vec![
			AsyncState::Loaded(1),
			AsyncState::Loading,
			AsyncState::Loaded(2)
		]
	);
}

type Item = Result<StreamState<i32, String>, String>;

fn loaded(value: i32) -> Item {
	Ok(StreamState::Loaded(value))
}

fn failed(error: &str) -> StreamState<i32, String> {
	StreamState::Error {
		error: error.to_owned(),
		trace: Trace::capture(),
	}
}

/// One channel per subscription, handed out in order.
fn channels(
	count: usize,
) -> (
	Vec<mpsc::UnboundedSender<Item>>,
	impl Fn() -> mpsc::UnboundedReceiver<Item>,
) {
	let (senders, receivers): (Vec<_>, VecDeque<_>) =
		(0..count).map(|_| mpsc::unbounded()).unzip();
	let receivers = RefCell::new(receivers);
	(senders, move || {
		receivers
			.borrow_mut()
			.pop_front()
			.expect("one channel per subscription")
	})
}

#[test]
fn stream_publishes_elements_then_completion() {
	let (mut pool, spawner) = pool();
	let notifier =
		StreamNotifier::new(spawner, || stream::iter(vec![loaded(1), loaded(2)])).unwrap();
	let recorder = Recorder::attach(&notifier);
	assert!(notifier.is_subscribed());

	pool.run_until_stalled();

	assert_eq!(
		recorder.seen(),
		vec![
			StreamState::Unloaded,
			StreamState::Loaded(1),
			StreamState::Loaded(2),
			StreamState::Complete(Some(2)),
		]
	);
	assert!(!notifier.is_subscribed());
}

#[test]
fn stream_survives_errors() {
	let (mut pool, spawner) = pool();
	let notifier = StreamNotifier::new(spawner, || {
		stream::iter(vec![loaded(1), Err("boom".to_owned()), loaded(2)])
	})
	.unwrap();
	let recorder = Recorder::attach(&notifier);

	pool.run_until_stalled();

	assert_eq!(
		recorder.seen(),
		vec![
			StreamState::Unloaded,
			StreamState::Loaded(1),
			failed("boom"),
			StreamState::Loaded(2),
			StreamState::Complete(Some(2)),
		]
	);
}

#[test]
fn stream_completion_after_error_has_no_value() {
	let (mut pool, spawner) = pool();
	let notifier = StreamNotifier::new(spawner, || {
		stream::iter(vec![loaded(1), Err("boom".to_owned())])
	})
	.unwrap();

	pool.run_until_stalled();

	assert_eq!(notifier.state(), StreamState::Complete(None));
}

#[test]
fn stream_reload_drops_old_subscription() {
	let (mut pool, spawner) = pool();
	let (senders, source) = channels(2);
	let notifier = StreamNotifier::new(spawner, source).unwrap();
	let recorder = Recorder::attach(&notifier);

	senders[0].unbounded_send(loaded(1)).unwrap();
	pool.run_until_stalled();

	// queued before the reload, must never arrive
	senders[0].unbounded_send(loaded(99)).unwrap();
	notifier.reload().unwrap();
	assert_eq!(notifier.state(), StreamState::Unloaded);

	senders[1].unbounded_send(loaded(2)).unwrap();
	pool.run_until_stalled();

	assert!(senders[0].is_closed());
	assert!(!senders[1].is_closed());
	assert_eq!(
		recorder.seen(),
		vec![
			StreamState::Unloaded,
			StreamState::Loaded(1),
			StreamState::Unloaded,
			StreamState::Loaded(2),
		]
	);
}

#[test]
fn stream_reload_from_listener_stops_delivery() {
	let (mut pool, spawner) = pool();
	let subscriptions = Cell::new(0);
	let notifier = StreamNotifier::new(spawner, move || {
		subscriptions.set(subscriptions.get() + 1);
		if subscriptions.get() == 1 {
			stream::iter(vec![loaded(1), loaded(2), loaded(3)])
		} else {
			stream::iter(vec![loaded(10)])
		}
	})
	.unwrap();
	let recorder = Recorder::attach(&notifier);

	let reloaded = Rc::new(Cell::new(false));
	notifier.add_listener(listener!((notifier, reloaded) => {
		let is_two = notifier.get().loaded_value() == Some(&2);
		if is_two && !reloaded.replace(true) {
			notifier.reload().unwrap();
		}
	}));

	pool.run_until_stalled();

	assert_eq!(
		recorder.seen(),
		vec![
			StreamState::Unloaded,
			StreamState::Loaded(1),
			StreamState::Loaded(2),
			StreamState::Unloaded,
			StreamState::Loaded(10),
			StreamState::Complete(Some(10)),
		]
	);
}

#[test]
fn stream_dispose_is_idempotent() {
	let (mut pool, spawner) = pool();
	let (senders, source) = channels(2);
	let notifier = StreamNotifier::new(spawner, source).unwrap();

	let mock = SharedMock::new();
	notifier.add_listener(mock.listener());
	mock.get().expect_trigger().times(1).return_const(());

	notifier.reload().unwrap();
	notifier.dispose();
	notifier.dispose();
	assert!(!notifier.is_subscribed());

	pool.run_until_stalled();
	assert!(senders[0].is_closed());
	assert!(senders[1].is_closed());
	assert!(senders[1].unbounded_send(loaded(1)).is_err());

	mock.get().checkpoint();
	assert_eq!(notifier.state(), StreamState::Unloaded);
}

#[test]
fn stream_dispose_from_listener_releases_later_listeners() {
	let (mut pool, spawner) = pool();
	let (senders, source) = channels(1);
	let notifier = StreamNotifier::new(spawner, source).unwrap();

	notifier.add_listener(listener!((notifier) => notifier.dispose()));
	let mock = SharedMock::new();
	notifier.add_listener(mock.listener());
	mock.get().expect_trigger().times(0).return_const(());

	senders[0].unbounded_send(loaded(1)).unwrap();
	pool.run_until_stalled();

	mock.get().checkpoint();
	assert_eq!(notifier.state(), StreamState::Loaded(1));
	assert!(!notifier.is_subscribed());
	assert!(senders[0].is_closed());
}

#[test]
fn stream_drop_cancels_subscription() {
	let (mut pool, spawner) = pool();
	let (senders, source) = channels(1);
	let notifier = StreamNotifier::new(spawner, source).unwrap();

	pool.run_until_stalled();
	assert!(!senders[0].is_closed());

	drop(notifier);
	pool.run_until_stalled();
	assert!(senders[0].is_closed());
}

#[test]
fn registry_shares_handles() {
	let mut registry = Registry::new();
	let counter = SyncNotifier::<i32, ()>::new(|| SyncState::Loaded(0));
	registry.insert("counter", counter.clone());
	registry.insert("title", Var::new("untitled"));

	let shared = registry.get::<SyncNotifier<i32, ()>>("counter").unwrap();
	shared.set(SyncState::Loaded(7));
	assert_eq!(counter.state(), SyncState::Loaded(7));

	let title = registry.get::<Var<&str>>("title").unwrap();
	assert_eq!(*title.get(), "untitled");

	assert!(matches!(
		registry.get::<Var<i32>>("counter"),
		Err(Error::TypeMismatch { .. })
	));
	assert!(matches!(
		registry.get::<Var<i32>>("missing"),
		Err(Error::Missing(_))
	));

	assert!(registry.remove("title").is_some());
	assert!(!registry.contains("title"));
	assert_eq!(registry.len(), 1);
}
