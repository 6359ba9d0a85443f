//! Subscriber side of the proposal fan-out.

use shared_types::Proposal;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};

/// Ordered proposals for one subscriber.
///
/// Yields proposals in publication order and ends with `None` once the gate
/// closes. Proposals published before the subscription are not replayed.
pub struct ProposalStream {
    inner: ReceiverStream<Arc<Proposal>>,
}

impl ProposalStream {
    pub(crate) fn new(receiver: mpsc::Receiver<Arc<Proposal>>) -> Self {
        Self {
            inner: ReceiverStream::new(receiver),
        }
    }

    /// Wait for the next proposal.
    pub async fn next_proposal(&mut self) -> Option<Arc<Proposal>> {
        self.inner.next().await
    }
}

impl Stream for ProposalStream {
    type Item = Arc<Proposal>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
