use anyhow::{anyhow, Result};
use std::time::Duration;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

/// Minimal actor trait. `Self: Sized` avoids object-safety issues when using `Context<Self>`.
#[async_trait::async_trait]
pub trait Actor: Send + Sized + 'static {
    type Msg: Send + 'static;

    /// Handle a single message. Return `Err` to stop the actor.
    async fn handle(&mut self, msg: Self::Msg, ctx: &mut Context<Self>) -> Result<()>;

    /// Stop after this long without a message. `None` keeps the actor alive
    /// until one of the other stop conditions.
    fn idle_timeout(&self) -> Option<Duration> {
        None
    }
}

/// Runtime context for an actor instance.
///
/// Holds only a weak sender so the actor still stops once every external
/// `Addr` is dropped.
pub struct Context<A: Actor> {
    addr: mpsc::WeakSender<A::Msg>,
    pub stop: bool,
}

impl<A: Actor> Context<A> {
    /// This actor's `Addr`, or `None` when no external sender is left.
    pub fn addr(&self) -> Option<Addr<A>> {
        self.addr.upgrade().map(Addr)
    }

    /// Request a graceful stop after processing the current message.
    ///
    /// ```
    /// # use anyhow::Result;
    /// # use async_trait::async_trait;
    /// # use veracity_actors::actor::{self, Actor, Context};
    /// # struct StopOnSecond(u8);
    /// # #[async_trait]
    /// # impl Actor for StopOnSecond {
    /// #     type Msg = u8;
    /// #     async fn handle(&mut self, msg: Self::Msg, ctx: &mut Context<Self>) -> Result<()> {
    /// #         self.0 += msg;
    /// #         if self.0 >= 2 {
    /// #             ctx.stop();
    /// #         }
    /// #         Ok(())
    /// #     }
    /// # }
    /// let rt = tokio::runtime::Runtime::new().unwrap();
    /// rt.block_on(async {
    ///     let actor::ActorHandle { addr, task } = actor::spawn_actor(StopOnSecond(0), 4);
    ///     addr.send(1).await.unwrap();
    ///     addr.send(1).await.unwrap();
    ///     task.await.unwrap().unwrap();
    ///     assert!(addr.is_closed());
    /// });
    /// ```
    pub fn stop(&mut self) {
        self.stop = true;
    }
}

/// Address for sending messages to an actor.
pub struct Addr<A: Actor>(mpsc::Sender<A::Msg>);

/// Manual Clone to avoid unnecessary bounds on `A`/`A::Msg`.
impl<A: Actor> Clone for Addr<A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<A: Actor> Addr<A> {
    /// Async send; awaits backpressure. Returns the message if the receiver is dropped.
    pub async fn send(&self, msg: A::Msg) -> std::result::Result<(), A::Msg> {
        self.0.send(msg).await.map_err(|e| e.0)
    }

    /// Try to send without waiting. Returns the message if the mailbox is full or closed.
    pub fn try_send(&self, msg: A::Msg) -> std::result::Result<(), A::Msg> {
        self.0.try_send(msg).map_err(|e| e.into_inner())
    }

    /// Send a request carrying a reply channel and await the answer.
    ///
    /// ```
    /// # use anyhow::Result;
    /// # use async_trait::async_trait;
    /// # use tokio::sync::oneshot;
    /// # use veracity_actors::actor::{self, Actor, Context};
    /// # struct Doubler;
    /// # #[async_trait]
    /// # impl Actor for Doubler {
    /// #     type Msg = (u32, oneshot::Sender<u32>);
    /// #     async fn handle(&mut self, (n, reply): Self::Msg, _ctx: &mut Context<Self>) -> Result<()> {
    /// #         let _ = reply.send(n * 2);
    /// #         Ok(())
    /// #     }
    /// # }
    /// let rt = tokio::runtime::Runtime::new().unwrap();
    /// rt.block_on(async {
    ///     let handle = actor::spawn_actor(Doubler, 4);
    ///     let doubled = handle.addr.ask(|reply| (21, reply)).await.unwrap();
    ///     assert_eq!(doubled, 42);
    /// });
    /// ```
    pub async fn ask<R>(&self, make: impl FnOnce(oneshot::Sender<R>) -> A::Msg) -> Result<R> {
        let (tx, rx) = oneshot::channel();
        self.send(make(tx))
            .await
            .map_err(|_| anyhow!("actor mailbox closed"))?;
        rx.await.map_err(|_| anyhow!("actor dropped the reply channel"))
    }

    /// Bounded mailbox capacity.
    pub fn capacity(&self) -> usize {
        self.0.max_capacity()
    }

    /// True once the actor task has stopped receiving.
    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

/// Handle to a running actor task.
pub struct ActorHandle<A: Actor> {
    pub addr: Addr<A>,
    pub task: JoinHandle<anyhow::Result<()>>,
}

/// Spawn an actor with a bounded mailbox.
///
/// Stop conditions:
/// - `handle` returns `Err`
/// - all senders are dropped
/// - `ctx.stop()` is called
/// - no message arrives within [`Actor::idle_timeout`]
///
/// ```
/// # use anyhow::Result;
/// # use async_trait::async_trait;
/// # use veracity_actors::actor::{self, Actor, Context};
/// # struct Accumulator(u8);
/// # #[async_trait]
/// # impl Actor for Accumulator {
/// #     type Msg = u8;
/// #     async fn handle(&mut self, msg: Self::Msg, ctx: &mut Context<Self>) -> Result<()> {
/// #         self.0 += msg;
/// #         if self.0 >= 5 {
/// #             ctx.stop();
/// #         }
/// #         Ok(())
/// #     }
/// # }
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// rt.block_on(async {
///     let actor::ActorHandle { addr, task } = actor::spawn_actor(Accumulator(0), 8);
///     assert_eq!(addr.capacity(), 8);
///     addr.send(2).await.unwrap();
///     addr.send(3).await.unwrap();
///     drop(addr);
///     task.await.unwrap().unwrap();
/// });
/// ```
pub fn spawn_actor<A: Actor>(actor: A, capacity: usize) -> ActorHandle<A> {
    spawn_actor_with_shutdown(actor, capacity, None)
}

/// Like [`spawn_actor`], additionally stopping when `shutdown` is cancelled.
/// The message in flight finishes first.
pub fn spawn_actor_with_shutdown<A: Actor>(
    actor: A,
    capacity: usize,
    shutdown: Option<CancellationToken>,
) -> ActorHandle<A> {
    let (tx, rx) = mpsc::channel::<A::Msg>(capacity.max(1));
    let addr = Addr(tx);
    let ctx = Context {
        addr: addr.0.downgrade(),
        stop: false,
    };
    let task = tokio::spawn(run(actor, rx, ctx, shutdown.unwrap_or_default()));
    ActorHandle { addr, task }
}

async fn run<A: Actor>(
    mut actor: A,
    mut rx: mpsc::Receiver<A::Msg>,
    mut ctx: Context<A>,
    shutdown: CancellationToken,
) -> Result<()> {
    let idle = actor.idle_timeout();
    loop {
        let msg = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            maybe_msg = rx.recv() => match maybe_msg {
                Some(msg) => msg,
                None => break,
            },
            _ = idle_elapsed(idle) => {
                tracing::debug!(target: "veracity-actors", ?idle, "actor idle; stopping");
                break;
            }
        };
        if let Err(e) = actor.handle(msg, &mut ctx).await {
            tracing::error!(target: "veracity-actors", error = ?e, "actor returned error; stopping");
            return Err(e);
        }
        if ctx.stop {
            break;
        }
    }
    Ok(())
}

async fn idle_elapsed(idle: Option<Duration>) {
    match idle {
        Some(after) => tokio::time::sleep(after).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Collect(Vec<u32>);

    enum CollectMsg {
        Push(u32),
        Dump(oneshot::Sender<Vec<u32>>),
        Fail,
    }

    #[async_trait::async_trait]
    impl Actor for Collect {
        type Msg = CollectMsg;

        async fn handle(&mut self, msg: Self::Msg, _ctx: &mut Context<Self>) -> Result<()> {
            match msg {
                CollectMsg::Push(n) => self.0.push(n),
                CollectMsg::Dump(reply) => {
                    let _ = reply.send(self.0.clone());
                }
                CollectMsg::Fail => return Err(anyhow!("boom")),
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn messages_are_processed_in_order() {
        let handle = spawn_actor(Collect(Vec::new()), 4);
        for n in 0..10 {
            handle.addr.send(CollectMsg::Push(n)).await.ok();
        }
        let seen = handle.addr.ask(CollectMsg::Dump).await.unwrap();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn handler_error_stops_the_actor() {
        let ActorHandle { addr, task } = spawn_actor(Collect(Vec::new()), 4);
        addr.send(CollectMsg::Fail).await.ok();
        assert!(task.await.unwrap().is_err());
        assert!(addr.ask(CollectMsg::Dump).await.is_err());
    }

    #[tokio::test]
    async fn dropping_every_addr_stops_the_actor() {
        let ActorHandle { addr, task } = spawn_actor(Collect(Vec::new()), 4);
        addr.send(CollectMsg::Push(1)).await.ok();
        drop(addr);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn cancellation_stops_the_actor() {
        let token = CancellationToken::new();
        let ActorHandle { addr, task } =
            spawn_actor_with_shutdown(Collect(Vec::new()), 4, Some(token.clone()));
        token.cancel();
        task.await.unwrap().unwrap();
        assert!(addr.is_closed());
    }

    struct Sleepy {
        idle: Duration,
        seen: u32,
    }

    #[async_trait::async_trait]
    impl Actor for Sleepy {
        type Msg = oneshot::Sender<u32>;

        async fn handle(&mut self, reply: Self::Msg, _ctx: &mut Context<Self>) -> Result<()> {
            self.seen += 1;
            let _ = reply.send(self.seen);
            Ok(())
        }

        fn idle_timeout(&self) -> Option<Duration> {
            Some(self.idle)
        }
    }

    #[tokio::test]
    async fn idle_actor_stops_on_its_own() {
        let ActorHandle { addr, task } = spawn_actor(
            Sleepy {
                idle: Duration::from_millis(150),
                seen: 0,
            },
            4,
        );

        // Each message restarts the idle clock.
        for expected in 1..=3 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            assert_eq!(addr.ask(|reply| reply).await.unwrap(), expected);
        }
        assert!(!addr.is_closed());

        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("idle actor should stop")
            .unwrap()
            .unwrap();
        assert!(addr.is_closed());
        assert!(addr.ask(|reply| reply).await.is_err());
    }
}
