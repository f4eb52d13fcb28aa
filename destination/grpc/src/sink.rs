use futures::prelude::*;
use linkerd2_proxy_api::destination as proto;
use tokio::sync::mpsc;

/// Delivers translated updates to a single destination stream.
pub trait UpdateSink {
    /// Enqueues `update` without waiting.
    ///
    /// Fails when the stream can no longer accept updates.
    fn send(&mut self, update: proto::Update) -> Result<(), tonic::Status>;
}

pub type BoxUpdateStream =
    std::pin::Pin<Box<dyn Stream<Item = Result<proto::Update, tonic::Status>> + Send>>;

impl UpdateSink for mpsc::UnboundedSender<Result<proto::Update, tonic::Status>> {
    fn send(&mut self, update: proto::Update) -> Result<(), tonic::Status> {
        mpsc::UnboundedSender::send(self, Ok(update))
            .map_err(|_| tonic::Status::cancelled("destination stream closed"))
    }
}

impl UpdateSink for mpsc::Sender<Result<proto::Update, tonic::Status>> {
    fn send(&mut self, update: proto::Update) -> Result<(), tonic::Status> {
        self.try_send(Ok(update)).map_err(|error| match error {
            mpsc::error::TrySendError::Full(_) => {
                tonic::Status::resource_exhausted("destination stream is not being read")
            }
            mpsc::error::TrySendError::Closed(_) => {
                tonic::Status::cancelled("destination stream closed")
            }
        })
    }
}

/// Streams queued updates to a client until the queue closes or the server begins shutting down.
///
/// An error queued in place of an update is returned to the client and ends the stream.
pub fn response_stream(
    drain: drain::Watch,
    mut rx: mpsc::UnboundedReceiver<Result<proto::Update, tonic::Status>>,
) -> BoxUpdateStream {
    Box::pin(async_stream::try_stream! {
        tokio::pin! {
            let shutdown = drain.signaled();
        }

        loop {
            tokio::select! {
                res = rx.recv() => match res {
                    Some(update) => {
                        yield update?;
                    }
                    None => return,
                },

                // Close the stream so that it doesn't hold the server open.
                _ = (&mut shutdown) => {
                    return;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk_update(exists: bool) -> proto::Update {
        proto::Update {
            update: Some(proto::update::Update::NoEndpoints(proto::NoEndpoints {
                exists,
            })),
        }
    }

    #[tokio::test]
    async fn unbounded_sink_closed() {
        let (mut tx, rx) = mpsc::unbounded_channel::<Result<proto::Update, tonic::Status>>();
        UpdateSink::send(&mut tx, mk_update(true)).expect("send must succeed");
        drop(rx);
        let status = UpdateSink::send(&mut tx, mk_update(true)).expect_err("send must fail");
        assert_eq!(status.code(), tonic::Code::Cancelled);
    }

    #[tokio::test]
    async fn bounded_sink_full() {
        let (mut tx, mut rx) = mpsc::channel::<Result<proto::Update, tonic::Status>>(1);
        UpdateSink::send(&mut tx, mk_update(true)).expect("send must succeed");
        let status = UpdateSink::send(&mut tx, mk_update(false)).expect_err("send must fail");
        assert_eq!(status.code(), tonic::Code::ResourceExhausted);

        rx.recv().await.expect("update must be queued").expect("update must be ok");
        UpdateSink::send(&mut tx, mk_update(false)).expect("send must succeed");

        drop(rx);
        let status = UpdateSink::send(&mut tx, mk_update(true)).expect_err("send must fail");
        assert_eq!(status.code(), tonic::Code::Cancelled);
    }

    #[tokio::test]
    async fn streams_updates_until_closed() {
        let (_signal, watch) = drain::channel();
        let (tx, rx) = mpsc::unbounded_channel();
        let mut stream = response_stream(watch, rx);

        tx.send(Ok(mk_update(true))).expect("send must succeed");
        tx.send(Ok(mk_update(false))).expect("send must succeed");
        drop(tx);

        let update = stream.next().await.expect("stream must yield");
        assert_eq!(update.expect("update must be ok"), mk_update(true));
        let update = stream.next().await.expect("stream must yield");
        assert_eq!(update.expect("update must be ok"), mk_update(false));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn queued_error_ends_stream() {
        let (_signal, watch) = drain::channel();
        let (tx, rx) = mpsc::unbounded_channel();
        let mut stream = response_stream(watch, rx);

        tx.send(Err(tonic::Status::unavailable("gone")))
            .expect("send must succeed");
        tx.send(Ok(mk_update(true))).expect("send must succeed");

        let status = stream
            .next()
            .await
            .expect("stream must yield")
            .expect_err("stream must fail");
        assert_eq!(status.code(), tonic::Code::Unavailable);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn stream_ends_on_shutdown() {
        let (signal, watch) = drain::channel();
        let (_tx, rx) = mpsc::unbounded_channel::<Result<proto::Update, tonic::Status>>();
        let mut stream = response_stream(watch, rx);

        let drained = tokio::spawn(signal.drain());
        assert!(stream.next().await.is_none());
        drained.await.expect("drain must complete");
    }
}
