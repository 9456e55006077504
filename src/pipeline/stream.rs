//! Windowed streaming over a byte source

use futures::{Stream, StreamExt};

use super::{PipelineResult, VoicePipeline};

/// Buffers raw bytes and cuts them into fixed-size windows
///
/// A windower belongs to one source; a new source needs a new windower.
#[derive(Debug, Clone)]
pub struct AudioWindower {
    buffer: Vec<u8>,
    window_bytes: usize,
}

impl AudioWindower {
    /// A zero window size is raised to one byte; the buffer grows with input
    #[must_use]
    pub fn new(window_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            window_bytes: window_bytes.max(1),
        }
    }

    #[must_use]
    pub const fn window_bytes(&self) -> usize {
        self.window_bytes
    }

    /// Bytes buffered towards the next window
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Append bytes and return every window they complete, in order
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        self.buffer.extend_from_slice(bytes);

        let complete = self.buffer.len() / self.window_bytes;
        if complete == 0 {
            return Vec::new();
        }

        let rest = self.buffer.split_off(complete * self.window_bytes);
        let full = std::mem::replace(&mut self.buffer, rest);

        full.chunks_exact(self.window_bytes)
            .map(<[u8]>::to_vec)
            .collect()
    }
}

/// Re-chunk a byte source into full windows
///
/// A partial window left when the source closes is discarded.
pub fn audio_windows<S>(source: S, window_bytes: usize) -> impl Stream<Item = Vec<u8>> + Send
where
    S: Stream<Item = Vec<u8>> + Send,
{
    async_stream::stream! {
        let mut windower = AudioWindower::new(window_bytes);
        let mut source = std::pin::pin!(source);

        while let Some(bytes) = source.next().await {
            for window in windower.push(&bytes) {
                yield window;
            }
        }

        if windower.pending() > 0 {
            tracing::debug!(discarded = windower.pending(), "source closed mid-window");
        }
    }
}

impl VoicePipeline {
    /// Run the pipeline once per full window of `source`
    ///
    /// The stream is lazy and yields results in window order. Up to
    /// `stream_concurrency` windows are processed at once.
    pub fn stream<S>(
        &self,
        source: S,
    ) -> impl Stream<Item = PipelineResult> + Send + 'static + use<S>
    where
        S: Stream<Item = Vec<u8>> + Send + 'static,
    {
        let pipeline = self.clone();

        audio_windows(source, self.window_bytes)
            .map(move |window| {
                let pipeline = pipeline.clone();
                async move { pipeline.run(&window).await }
            })
            .buffered(self.stream_concurrency)
    }
}
