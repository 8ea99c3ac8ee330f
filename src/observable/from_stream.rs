use crate::{
  error::Error,
  observable::{from_future::spawn_observed, Observable},
  observer::Observer,
  scheduler::{Scheduler, TaskHandle},
};
use futures::{ready, Stream};
use pin_project_lite::pin_project;
use std::{
  convert::Infallible,
  future::Future,
  pin::Pin,
  task::{Context, Poll},
};

/// Returns an observable that emits all the items of the source `Stream`,
/// then completes when the stream ends, or right away if the scheduler
/// refuses to poll it.
///
/// ```rust
/// use futures::executor::LocalPool;
/// use rxflow::prelude::*;
///
/// let stream = futures::stream::iter(vec![1, 2, 3]);
/// let mut pool = LocalPool::new();
/// let scheduler = LocalPoolScheduler::new(pool.spawner());
/// observable::from_stream(stream, scheduler).subscribe(|x| {
///   println!("{x}");
/// });
///
/// pool.run();
/// ```
pub fn from_stream<S, SD>(stream: S, scheduler: SD) -> StreamObservable<S, SD>
where
  S: Stream,
{
  StreamObservable { stream, scheduler }
}

/// Like [`from_stream`] for a stream of `Result`s; the first `Err` ends the
/// observable with that error. A refused spawn ends it with the converted
/// [`Error`].
pub fn from_stream_result<S, SD>(
  stream: S,
  scheduler: SD,
) -> StreamResultObservable<S, SD>
where
  S: Stream,
{
  StreamResultObservable { stream, scheduler }
}

#[derive(Clone)]
pub struct StreamObservable<S, SD> {
  stream: S,
  scheduler: SD,
}

#[derive(Clone)]
pub struct StreamResultObservable<S, SD> {
  stream: S,
  scheduler: SD,
}

impl<S, SD> Observable for StreamObservable<S, SD>
where
  S: Stream + 'static,
  SD: Scheduler,
{
  type Item = S::Item;
  type Err = Infallible;
  type Unsub = TaskHandle;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, Infallible> + 'static,
  {
    let Self { stream, scheduler } = self;
    let stream = futures::StreamExt::map(stream, Ok::<S::Item, Infallible>);
    let task = |observer: O| StreamObserverFuture {
      stream,
      observer: Some(observer),
    };
    spawn_observed(&scheduler, observer, task, |o: O, _| o.complete())
  }
}

impl<S, SD, Item, Err> Observable for StreamResultObservable<S, SD>
where
  S: Stream<Item = Result<Item, Err>> + 'static,
  SD: Scheduler,
  Err: From<Error>,
{
  type Item = Item;
  type Err = Err;
  type Unsub = TaskHandle;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + 'static,
  {
    let Self { stream, scheduler } = self;
    let task = |observer: O| StreamObserverFuture {
      stream,
      observer: Some(observer),
    };
    spawn_observed(&scheduler, observer, task, |o: O, err| o.error(err.into()))
  }
}

pin_project! {
  struct StreamObserverFuture<S, O> {
    #[pin]
    stream: S,
    observer: Option<O>,
  }
}

impl<S, O, Item, Err> Future for StreamObserverFuture<S, O>
where
  S: Stream<Item = Result<Item, Err>>,
  O: Observer<Item, Err>,
{
  type Output = ();

  fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
    loop {
      let this = self.as_mut().project();
      let Some(observer) = this.observer.as_mut() else {
        return Poll::Ready(());
      };
      if observer.is_finished() {
        this.observer.take();
        return Poll::Ready(());
      }
      match ready!(this.stream.poll_next(cx)) {
        Some(Ok(value)) => observer.next(value),
        Some(Err(err)) => {
          if let Some(observer) = this.observer.take() {
            observer.error(err);
          }
          return Poll::Ready(());
        }
        None => {
          if let Some(observer) = this.observer.take() {
            observer.complete();
          }
          return Poll::Ready(());
        }
      }
    }
  }
}
