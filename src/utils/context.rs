use std::sync::Arc;

use tokio::sync::{broadcast, oneshot};

struct RawContext {
    _sender: oneshot::Sender<()>,
    cancel_receiver: broadcast::Receiver<()>,
}

impl RawContext {
    #[must_use]
    fn new() -> (Self, Handler) {
        let (sender, recv) = oneshot::channel();
        let (cancel_sender, cancel_receiver) = broadcast::channel(1);

        (
            Self {
                _sender: sender,
                cancel_receiver,
            },
            Handler {
                recv,
                cancel_sender,
            },
        )
    }

    async fn done(&self) {
        let mut recv = self.cancel_receiver.resubscribe();
        let _ = recv.recv().await;
    }
}

/// The other half of a [`Context`]. Dropping (or calling [`Handler::cancel`]
/// on) the handler cancels the context; `cancel` additionally waits until
/// every clone of the context has been dropped.
pub struct Handler {
    recv: oneshot::Receiver<()>,
    cancel_sender: broadcast::Sender<()>,
}

impl Handler {
    pub async fn done(&mut self) {
        let _ = (&mut self.recv).await;
    }

    pub async fn cancel(self) {
        drop(self.cancel_sender);

        let _ = self.recv.await;
    }
}

/// A cancellation token handed to long-running tasks. Tasks await
/// [`Context::done`] to learn that shutdown has started.
#[derive(Clone)]
pub struct Context(Arc<RawContext>);

impl From<RawContext> for Context {
    fn from(ctx: RawContext) -> Self {
        Self(Arc::new(ctx))
    }
}

impl Context {
    pub fn new() -> (Self, Handler) {
        let (ctx, handler) = RawContext::new();
        (ctx.into(), handler)
    }

    pub async fn done(&self) {
        self.0.done().await
    }
}
