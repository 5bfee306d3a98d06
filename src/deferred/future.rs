//! `Future` bridge for [`Deferred`].
//!
//! A [`Deferred`] converts into a [`DeferredFuture`] via [`IntoFuture`], so
//! resolution can be awaited inside any executor. The future registers a
//! single continuation that wakes the most recently polled waker; the waker
//! slot is refreshed on every poll, so a task migrating between wakers is
//! woken correctly.

use super::cell::Deferred;
use crate::types::Outcome;
use parking_lot::Mutex;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

/// Future resolving to the outcome stored in a [`Deferred`].
#[derive(Debug)]
pub struct DeferredFuture<T> {
    deferred: Deferred<T>,
    waker_slot: Option<Arc<Mutex<Option<Waker>>>>,
}

impl<T: Clone + Send + 'static> DeferredFuture<T> {
    pub(crate) fn new(deferred: Deferred<T>) -> Self {
        Self {
            deferred,
            waker_slot: None,
        }
    }
}

impl<T: Clone + Send + 'static> Future for DeferredFuture<T> {
    type Output = Outcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if let Some(outcome) = this.deferred.try_outcome() {
            return Poll::Ready(outcome);
        }
        match &this.waker_slot {
            Some(slot) => {
                *slot.lock() = Some(cx.waker().clone());
            }
            None => {
                let slot = Arc::new(Mutex::new(Some(cx.waker().clone())));
                let registered = Arc::clone(&slot);
                this.deferred.subscribe(move |_| {
                    if let Some(waker) = registered.lock().take() {
                        waker.wake();
                    }
                });
                this.waker_slot = Some(slot);
            }
        }
        // A resolution can land between the first check and the waker
        // registration; `subscribe` replays on a resolved cell, so the wake
        // fires, and this re-check keeps the fast path synchronous.
        match this.deferred.try_outcome() {
            Some(outcome) => Poll::Ready(outcome),
            None => Poll::Pending,
        }
    }
}

impl<T: Clone + Send + 'static> IntoFuture for Deferred<T> {
    type Output = Outcome<T>;
    type IntoFuture = DeferredFuture<T>;

    fn into_future(self) -> Self::IntoFuture {
        DeferredFuture::new(self)
    }
}
