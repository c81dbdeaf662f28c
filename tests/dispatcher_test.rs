use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use herald::notify::{Context, Dispatcher, FnTarget, NotificationTarget, NotifyError};

/// Records every call and optionally fails with a fixed message.
struct RecordingTarget {
    name: String,
    failure: Option<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl RecordingTarget {
    fn ok(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            failure: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn failing(name: &str, message: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            failure: Some(message.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationTarget for RecordingTarget {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, _ctx: &Context, subject: &str, message: &str) -> Result<(), NotifyError> {
        self.calls
            .lock()
            .unwrap()
            .push((subject.to_string(), message.to_string()));
        match &self.failure {
            Some(message) => Err(NotifyError::send_failed(message.clone())),
            None => Ok(()),
        }
    }
}

fn erased(target: &Arc<RecordingTarget>) -> Option<Arc<dyn NotificationTarget>> {
    Some(Arc::clone(target) as Arc<dyn NotificationTarget>)
}

#[tokio::test]
async fn no_targets_succeeds_whether_enabled_or_not() {
    let mut dispatcher = Dispatcher::new();
    assert!(dispatcher.send(None, "s", "m").await.is_ok());

    dispatcher.disable();
    assert!(dispatcher.send(None, "s", "m").await.is_ok());
}

#[tokio::test]
async fn all_targets_receive_same_payload() {
    let a = RecordingTarget::ok("a");
    let b = RecordingTarget::ok("b");
    let dispatcher = Dispatcher::with_targets([erased(&a), erased(&b)]);

    dispatcher
        .send(Some(&Context::background()), "hi", "there")
        .await
        .unwrap();

    let expected = vec![("hi".to_string(), "there".to_string())];
    assert_eq!(a.calls(), expected);
    assert_eq!(b.calls(), expected);
}

#[tokio::test]
async fn partial_failure_reports_error_and_runs_the_rest() {
    let a = RecordingTarget::ok("a");
    let b = RecordingTarget::failing("b", "network down");
    let dispatcher = Dispatcher::with_targets([erased(&a), erased(&b)]);

    let err = dispatcher.send(None, "hi", "there").await.unwrap_err();

    assert!(err.is_send_notification());
    assert!(err.to_string().contains("network down"));
    assert_eq!(a.calls().len(), 1);
    assert_eq!(b.calls().len(), 1);
}

#[tokio::test]
async fn disabled_dispatcher_invokes_nothing() {
    let a = RecordingTarget::ok("a");
    let mut dispatcher = Dispatcher::with_targets([erased(&a)]);
    dispatcher.set_enabled(false);

    assert!(dispatcher.send(None, "hi", "there").await.is_ok());
    assert!(a.calls().is_empty());
}

#[tokio::test]
async fn absent_registration_is_skipped() {
    let a = RecordingTarget::ok("a");
    let mut dispatcher = Dispatcher::new();
    dispatcher.add_targets([None, erased(&a)]);

    assert_eq!(dispatcher.len(), 1);
    assert!(dispatcher.send(None, "hi", "there").await.is_ok());
    assert_eq!(a.calls().len(), 1);
}

#[tokio::test]
async fn every_failure_is_listed_once() {
    let ok = RecordingTarget::ok("ok");
    let smtp = RecordingTarget::failing("smtp", "connection refused");
    let sms = RecordingTarget::failing("sms", "quota exceeded");
    let dispatcher = Dispatcher::with_targets([erased(&smtp), erased(&ok), erased(&sms)]);

    let err = dispatcher.send(None, "s", "m").await.unwrap_err();
    let failure = err.dispatch_failure().expect("combined dispatch error");

    assert_eq!(failure.total(), 3);
    assert_eq!(failure.failed(), 2);
    let mut failed = failure.failed_targets();
    failed.sort_unstable();
    assert_eq!(failed, vec!["sms", "smtp"]);

    let text = err.to_string();
    assert!(text.starts_with("send notification: 2 of 3 targets failed"));
    assert_eq!(text.matches("connection refused").count(), 1);
    assert_eq!(text.matches("quota exceeded").count(), 1);
    assert_eq!(text.lines().count(), 3);
}

#[tokio::test]
async fn panicking_target_is_contained() {
    let before = RecordingTarget::ok("before");
    let after = RecordingTarget::ok("after");
    let panicking: Arc<dyn NotificationTarget> =
        Arc::new(FnTarget::new("boom", |_ctx, _subject, _message| async {
            if true {
                panic!("nil pointer in adapter");
            }
            Ok::<(), NotifyError>(())
        }));

    let mut dispatcher = Dispatcher::new();
    dispatcher.add_targets([erased(&before), Some(panicking), erased(&after)]);

    let err = dispatcher.send(None, "s", "m").await.unwrap_err();

    assert!(err.to_string().contains("boom: target panicked: nil pointer in adapter"));
    let failure = err.dispatch_failure().unwrap();
    assert_eq!(failure.failed(), 1);
    assert!(matches!(
        failure.failures()[0].error,
        NotifyError::TargetPanicked { .. }
    ));
    assert_eq!(before.calls().len(), 1);
    assert_eq!(after.calls().len(), 1);
}

#[tokio::test]
async fn repeated_sends_invoke_each_target_once_per_call() {
    let a = RecordingTarget::ok("a");
    let b = RecordingTarget::failing("b", "flaky");
    let dispatcher = Dispatcher::with_targets([erased(&a), erased(&b)]);

    for round in 0..3 {
        let _ = dispatcher.send(None, "s", &format!("round {round}")).await;
    }

    assert_eq!(a.calls().len(), 3);
    assert_eq!(b.calls().len(), 3);
    assert_eq!(a.calls()[2].1, "round 2");
}

#[tokio::test]
async fn targets_run_concurrently() {
    let started = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(tokio::sync::Barrier::new(3));
    let mut dispatcher = Dispatcher::new();

    for name in ["a", "b", "c"] {
        let started = Arc::clone(&started);
        let barrier = Arc::clone(&barrier);
        dispatcher.add_target(FnTarget::new(name, move |_ctx, _subject, _message| {
            let started = Arc::clone(&started);
            let barrier = Arc::clone(&barrier);
            async move {
                started.fetch_add(1, Ordering::SeqCst);
                // Only completes if all three run at the same time.
                barrier.wait().await;
                Ok::<(), NotifyError>(())
            }
        }));
    }

    tokio::time::timeout(Duration::from_secs(5), dispatcher.send(None, "s", "m"))
        .await
        .expect("sends should not serialize")
        .unwrap();
    assert_eq!(started.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn targets_share_the_caller_deadline() {
    let mut dispatcher = Dispatcher::new();
    dispatcher.add_target(FnTarget::new("fast", |_ctx, _subject, _message| async {
        Ok::<(), NotifyError>(())
    }));
    dispatcher.add_target(FnTarget::new("slow", |ctx: Context, _subject, _message| async move {
        ctx.run(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await
    }));

    let ctx = Context::background().with_timeout(Duration::from_secs(1));
    let err = dispatcher.send(Some(&ctx), "s", "m").await.unwrap_err();

    let failure = err.dispatch_failure().unwrap();
    assert_eq!(failure.failed_targets(), vec!["slow"]);
    assert!(err.to_string().contains("slow: context deadline exceeded"));
}

#[tokio::test]
async fn cancelled_context_reaches_every_target() {
    let mut dispatcher = Dispatcher::new();
    for name in ["a", "b"] {
        dispatcher.add_target(FnTarget::new(name, |ctx: Context, _subject, _message| async move {
            ctx.check()
        }));
    }

    let ctx = Context::background();
    ctx.cancel();
    let err = dispatcher.send(Some(&ctx), "s", "m").await.unwrap_err();

    let failure = err.dispatch_failure().unwrap();
    assert_eq!(failure.failed(), 2);
    assert!(
        failure
            .failures()
            .iter()
            .all(|f| matches!(f.error, NotifyError::Cancelled))
    );
}

#[tokio::test]
async fn clones_share_targets_but_not_toggle() {
    let a = RecordingTarget::ok("a");
    let dispatcher = Dispatcher::with_targets([erased(&a)]);
    let mut muted = dispatcher.clone();
    muted.disable();

    muted.send(None, "s", "m").await.unwrap();
    dispatcher.send(None, "s", "m").await.unwrap();

    assert_eq!(a.calls().len(), 1);
    assert_eq!(muted.target_names(), vec!["a"]);
}
