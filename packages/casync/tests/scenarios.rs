use std::cell::RefCell;
use std::rc::Rc;

use casync::{Arg, Context, Coroutine, Options, Wrapped};

mod common;
use common::{completed, local, observe, timeout_fail, timeout_set};

fn poo() -> casync::Result<()> {
    casync::bail!("poo")
}

/// Suspends on a timer, then throws
fn throws_after_timer() -> Wrapped<(), i64> {
    casync::wrap(
        Coroutine::new(1, |cx: Context<(), i64>| async move {
            timeout_set(20, cx.next()?);
            cx.suspend().await?;
            poo()?;
            casync::Ok(cx.arg(0).copied())
        }),
        Options::default(),
    )
}

#[tokio::test]
async fn returns_value_after_timer() {
    local(async {
        let wrapped = casync::wrap(
            Coroutine::new(1, |cx: Context<(), i64>| async move {
                timeout_set(20, cx.next()?);
                cx.suspend().await?;
                casync::Ok(cx.arg(0).copied())
            }),
            Options::default(),
        );
        let (callback, recv) = observe();
        wrapped
            .call(vec![Arg::Value(2), Arg::Callback(callback)])
            .unwrap();
        let (error, value) = completed(recv).await;
        assert!(error.is_none(), "unexpected error: {error:?}");
        assert_eq!(value, Some(2));
    })
    .await
}

#[tokio::test]
async fn synchronous_continuation_matches_async() {
    local(async {
        let wrapped = casync::wrap(
            Coroutine::new(1, |cx: Context<(), i64>| async move {
                let value = *cx.arg(0).unwrap_or(&0);
                cx.next()?.ok(value)?;
                let value2 = cx.suspend().await?.into_single()?;
                casync::Ok(value2)
            }),
            Options::default(),
        );
        let (callback, recv) = observe();
        wrapped
            .call(vec![Arg::Value(2), Arg::Callback(callback)])
            .unwrap();
        let (error, value) = completed(recv).await;
        assert!(error.is_none(), "unexpected error: {error:?}");
        assert_eq!(value, Some(2));
    })
    .await
}

#[tokio::test]
async fn error_from_callee_is_catchable() {
    local(async {
        let caught = Rc::new(RefCell::new(None));
        let inner = throws_after_timer();
        let caught2 = Rc::clone(&caught);
        let outer = casync::wrap(
            Coroutine::new(1, move |cx: Context<(), i64>| {
                let inner = inner.clone();
                let caught = Rc::clone(&caught2);
                async move {
                    inner.call(vec![Arg::Value(2), Arg::Callback(cx.next()?.into_callback())])?;
                    match cx.suspend().await {
                        Ok(_) => casync::bail!("callee should have failed"),
                        Err(e) => {
                            *caught.borrow_mut() = Some(e.to_string());
                        }
                    }
                    casync::Ok(None::<i64>)
                }
            }),
            Options::default(),
        );
        let (callback, recv) = observe();
        outer
            .call(vec![Arg::Value(3), Arg::Callback(callback)])
            .unwrap();
        let (error, value) = completed(recv).await;
        assert!(error.is_none(), "unexpected error: {error:?}");
        assert_eq!(value, None);
        assert_eq!(caught.borrow().as_deref(), Some("poo"));
    })
    .await
}

#[tokio::test]
async fn return_works_after_caught_error() {
    local(async {
        let inner = throws_after_timer();
        let outer = casync::wrap(
            Coroutine::new(1, move |cx: Context<(), i64>| {
                let inner = inner.clone();
                async move {
                    inner.call(vec![Arg::Value(2), Arg::Callback(cx.next()?.into_callback())])?;
                    if cx.suspend().await.is_err() {
                        return casync::Ok(Some(7_i64));
                    }
                    casync::bail!("callee should have failed")
                }
            }),
            Options::default(),
        );
        let (callback, recv) = observe();
        outer
            .call(vec![Arg::Value(3), Arg::Callback(callback)])
            .unwrap();
        let (error, value) = completed(recv).await;
        assert!(error.is_none(), "recovery value must not be overridden: {error:?}");
        assert_eq!(value, Some(7));
    })
    .await
}

#[tokio::test]
async fn uncaught_callee_error_reaches_caller_completion() {
    local(async {
        let inner = throws_after_timer();
        let outer = casync::wrap(
            Coroutine::new(1, move |cx: Context<(), i64>| {
                let inner = inner.clone();
                async move {
                    inner.call(vec![Arg::Value(2), Arg::Callback(cx.next()?.into_callback())])?;
                    let value = cx.suspend().await?.single();
                    casync::Ok(value)
                }
            }),
            Options::default(),
        );
        let (callback, recv) = observe();
        outer
            .call(vec![Arg::Value(3), Arg::Callback(callback)])
            .unwrap();
        let (error, value) = completed(recv).await;
        assert_eq!(error.map(|e| e.to_string()).as_deref(), Some("poo"));
        assert_eq!(value, None);
    })
    .await
}

#[tokio::test]
async fn error_after_successful_await_becomes_completion_error() {
    local(async {
        let inner = casync::wrap(
            Coroutine::new(1, |cx: Context<(), i64>| async move {
                timeout_set(20, cx.next()?);
                cx.suspend().await?;
                casync::Ok(cx.arg(0).copied())
            }),
            Options::default(),
        );
        let outer = casync::wrap(
            Coroutine::new(1, move |cx: Context<(), i64>| {
                let inner = inner.clone();
                async move {
                    inner.call(vec![Arg::Value(2), Arg::Callback(cx.next()?.into_callback())])?;
                    let value = cx.suspend().await?.into_single()?;
                    assert_eq!(value, 2);
                    poo()?;
                    casync::Ok(Some(value))
                }
            }),
            Options::default(),
        );
        let (callback, recv) = observe();
        outer
            .call(vec![Arg::Value(3), Arg::Callback(callback)])
            .unwrap();
        let (error, _) = completed(recv).await;
        assert_eq!(error.map(|e| e.to_string()).as_deref(), Some("poo"));
    })
    .await
}

#[tokio::test]
async fn completes_automatically_at_end() {
    local(async {
        let wrapped = casync::wrap(
            Coroutine::new(1, |cx: Context<(), i64>| async move {
                timeout_set(20, cx.next()?);
                cx.suspend().await?;
                casync::Ok(None::<i64>)
            }),
            Options::default(),
        );
        let (callback, recv) = observe();
        wrapped
            .call(vec![Arg::Value(3), Arg::Callback(callback)])
            .unwrap();
        let (error, value) = completed(recv).await;
        assert!(error.is_none());
        assert_eq!(value, None);
    })
    .await
}

struct Constr {
    x: i64,
}

impl Constr {
    fn method(self: &Rc<Self>, wrapped: &Wrapped<Rc<Constr>, i64>, args: Vec<Arg<i64>>) -> Result<(), casync::DriverError> {
        wrapped.call_with(Rc::clone(self), args)
    }
}

#[tokio::test]
async fn receiver_is_preserved_for_methods() {
    local(async {
        let method = casync::wrap(
            Coroutine::new(1, |cx: Context<Rc<Constr>, i64>| async move {
                timeout_set(20, cx.next()?);
                cx.suspend().await?;
                casync::Ok(cx.this().x)
            }),
            Options::default(),
        );
        let o = Rc::new(Constr { x: 42 });
        let (callback, recv) = observe();
        o.method(&method, vec![Arg::Value(3), Arg::Callback(callback)])
            .unwrap();
        let (error, value) = completed(recv).await;
        assert!(error.is_none());
        assert_eq!(value, Some(42));
    })
    .await
}

#[tokio::test]
async fn injected_error_can_be_handled_by_body() {
    local(async {
        let wrapped = casync::wrap(
            Coroutine::new(0, |cx: Context<(), i64>| async move {
                timeout_fail(10, cx.next()?, "boom");
                let recovered: i64 = match cx.suspend().await {
                    Ok(_) => 0,
                    Err(e) => {
                        assert_eq!(e.to_string(), "boom");
                        1
                    }
                };
                timeout_set(10, cx.next()?);
                cx.suspend().await?;
                casync::Ok(recovered + 10)
            }),
            Options::default(),
        );
        let (callback, recv) = observe();
        wrapped.call(vec![Arg::Callback(callback)]).unwrap();
        let (error, value) = completed(recv).await;
        assert!(error.is_none());
        assert_eq!(value, Some(11));
    })
    .await
}

#[tokio::test]
async fn injected_error_propagates_to_completion() {
    local(async {
        let wrapped = casync::wrap(
            Coroutine::new(0, |cx: Context<(), i64>| async move {
                timeout_fail(10, cx.next()?, "boom");
                cx.suspend().await?;
                casync::Ok(Some(1_i64))
            }),
            Options::default(),
        );
        let (callback, recv) = observe();
        wrapped.call(vec![Arg::Callback(callback)]).unwrap();
        let (error, value) = completed(recv).await;
        assert_eq!(error.map(|e| e.to_string()).as_deref(), Some("boom"));
        assert_eq!(value, None);
    })
    .await
}

#[tokio::test]
async fn explicit_completion_is_delivered_once() {
    local(async {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let calls2 = Rc::clone(&calls);
        let wrapped = casync::wrap(
            Coroutine::new(0, |cx: Context<(), i64>| async move {
                timeout_set(10, cx.next()?);
                cx.suspend().await?;
                cx.done().ok(5_i64)?;
                casync::Ok(Some(6_i64))
            }),
            Options::default(),
        );
        let (send, recv) = tokio::sync::oneshot::channel();
        let callback = casync::Callback::new(move |error, value| {
            calls2.borrow_mut().push((error.is_some(), value));
            let _ = send.send(());
        });
        wrapped.call(vec![Arg::Callback(callback)]).unwrap();
        recv.await.unwrap();
        // give any stray second completion a chance to show up
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(*calls.borrow(), vec![(false, Some(5))]);
    })
    .await
}
