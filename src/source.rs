use anyhow::{anyhow, Result};
use log::debug;
use std::sync::mpsc::Receiver;
use std::sync::{Mutex, PoisonError};

/// Upstream text producer, e.g. a speech recognizer wrapping a microphone.
///
/// `fetch_next_fragment` may block for as long as it needs to. Returning an
/// empty string means nothing is ready yet and the caller should ask again.
/// Returning an error ends production for the worker that called it.
pub trait FragmentSource: Send + Sync {
    fn fetch_next_fragment(&self) -> Result<String>;
}

impl<F> FragmentSource for F
where
    F: Fn() -> Result<String> + Send + Sync,
{
    fn fetch_next_fragment(&self) -> Result<String> {
        self()
    }
}

/// Source fed by a recognizer running on its own thread.
///
/// Each fetch blocks until the next fragment arrives on the channel. Once every
/// sender is dropped the source reports a fault, which lets the worker's
/// producer thread wind down.
pub struct ChannelSource {
    receiver: Mutex<Receiver<String>>,
}

impl ChannelSource {
    pub fn new(receiver: Receiver<String>) -> Self {
        Self {
            receiver: Mutex::new(receiver),
        }
    }
}

impl FragmentSource for ChannelSource {
    fn fetch_next_fragment(&self) -> Result<String> {
        let receiver = self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match receiver.recv() {
            Ok(fragment) => Ok(fragment),
            Err(_) => {
                debug!("Fragment channel has no senders left");
                Err(anyhow!("fragment channel closed"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Arc;

    #[test]
    fn closure_acts_as_source() {
        let source: Arc<dyn FragmentSource> = Arc::new(|| -> Result<String> { Ok("hello".to_string()) });
        assert_eq!(source.fetch_next_fragment().unwrap(), "hello");
    }

    #[test]
    fn channel_source_yields_in_send_order() {
        let (tx, rx) = mpsc::channel();
        let source = ChannelSource::new(rx);

        tx.send("one".to_string()).unwrap();
        tx.send(String::new()).unwrap();
        tx.send("two".to_string()).unwrap();

        assert_eq!(source.fetch_next_fragment().unwrap(), "one");
        assert_eq!(source.fetch_next_fragment().unwrap(), "");
        assert_eq!(source.fetch_next_fragment().unwrap(), "two");
    }

    #[test]
    fn channel_source_faults_once_senders_are_gone() {
        let (tx, rx) = mpsc::channel();
        let source = ChannelSource::new(rx);

        tx.send("last".to_string()).unwrap();
        drop(tx);

        assert_eq!(source.fetch_next_fragment().unwrap(), "last");
        let err = source.fetch_next_fragment().unwrap_err();
        assert!(err.to_string().contains("closed"));
    }
}
