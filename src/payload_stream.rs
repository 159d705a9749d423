use std::io::ErrorKind;
use std::pin::Pin;
use std::task::{Context, Poll};

use actix_web::dev::Payload;
use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use tokio::sync::mpsc;

// Chunks in flight between the worker reading the payload and the consumer.
const CHANNEL_CAPACITY: usize = 8;

/// An inbound actix payload as a `Send + Sync` stream.
///
/// The payload itself has to stay on its worker, so a local task reads it
/// and hands the chunks over through a bounded channel. Dropping the stream
/// closes the channel and ends that task.
pub struct PayloadStream {
  receiver: mpsc::Receiver<Result<Bytes, std::io::Error>>,
}

impl PayloadStream {
  pub fn spawn(mut payload: Payload) -> Self {
    let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);

    actix_web::rt::spawn(async move {
      while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|err| std::io::Error::new(ErrorKind::Other, err.to_string()));
        let failed = chunk.is_err();

        if sender.send(chunk).await.is_err() || failed {
          break;
        }
      }
    });

    PayloadStream { receiver }
  }
}

impl Stream for PayloadStream {
  type Item = Result<Bytes, std::io::Error>;

  fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
    self.receiver.poll_recv(cx)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::test::TestRequest;

  #[actix_web::test]
  async fn yields_every_payload_byte() {
    let (_, payload) = TestRequest::post()
      .set_payload("remote write batch")
      .to_srv_request()
      .into_parts();

    let chunks: Vec<Bytes> = PayloadStream::spawn(payload)
      .map(|chunk| chunk.unwrap())
      .collect()
      .await;

    assert_eq!(chunks.concat(), b"remote write batch");
  }

  #[test]
  fn is_usable_as_client_body() {
    fn assert_send_sync<T: Send + Sync + 'static>() {}
    assert_send_sync::<PayloadStream>();
  }
}
