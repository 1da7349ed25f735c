use bytes::Buf;
use hyper::body::Body;
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

pin_project! {
    /// Collects every data frame of a body into a single buffer.
    ///
    /// Resolves once the body signals its end, or with the body's own error if a frame
    /// could not be produced (for instance a connection closed before `content-length`
    /// bytes arrived). Trailer frames are skipped.
    pub struct DrainBodyFuture<B: Body> {
        #[pin]
        body: B,
        buf: Vec<u8>,
    }
}

impl<B> DrainBodyFuture<B>
where
    B: Body,
{
    #[inline]
    #[must_use]
    pub fn new_trusted_length(body: B, content_length: usize) -> Self {
        Self {
            body,
            buf: Vec::with_capacity(content_length),
        }
    }

    /// Sizes the buffer from the body's own size hint.
    #[inline]
    #[must_use]
    pub fn new(body: B) -> Self {
        let hint = usize::try_from(body.size_hint().lower()).unwrap_or(0);
        Self::new_trusted_length(body, hint)
    }
}

impl<B> Future for DrainBodyFuture<B>
where
    B: Body,
{
    type Output = Result<Vec<u8>, B::Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slf = self.project();
        loop {
            let Some(next) = ready!(slf.body.as_mut().poll_frame(cx)) else {
                return Poll::Ready(Ok(std::mem::take(slf.buf)));
            };
            let frame = match next {
                Ok(frame) => frame,
                Err(e) => return Poll::Ready(Err(e)),
            };
            if let Ok(mut data) = frame.into_data() {
                while data.has_remaining() {
                    let chunk = data.chunk();
                    let len = chunk.len();
                    slf.buf.extend_from_slice(chunk);
                    data.advance(len);
                }
            }
            if slf.body.is_end_stream() {
                return Poll::Ready(Ok(std::mem::take(slf.buf)));
            }
        }
    }
}
