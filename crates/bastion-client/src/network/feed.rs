//! Change-feed subscription over server-sent events.

use bastion_proto::{ChangeEvent, FEED_EVENT, FeedReady, READY_EVENT};
use futures::{StreamExt, stream};
use gloo::net::eventsource::futures::EventSource;
use tracing::{info, warn};

/// One message from the change feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    /// The subscription is live from this sequence number on.
    Ready(u64),
    Change(ChangeEvent),
}

/// Decode the data of an SSE message named `event_type`.
pub fn parse_message(event_type: &str, data: &str) -> Result<FeedMessage, String> {
    match event_type {
        READY_EVENT => serde_json::from_str::<FeedReady>(data)
            .map(|ready| FeedMessage::Ready(ready.seq))
            .map_err(|err| err.to_string()),
        FEED_EVENT => ChangeEvent::from_json(data)
            .map(FeedMessage::Change)
            .map_err(|err| err.to_string()),
        other => Err(format!("unknown event {other}")),
    }
}

/// Follow the change feed at `url`, passing each message to `on_message`.
///
/// Returns when the connection fails or closes; the caller decides when to
/// resubscribe.
pub async fn follow(url: &str, mut on_message: impl FnMut(FeedMessage)) -> Result<(), String> {
    let mut source = EventSource::new(url).map_err(|err| format!("{err:?}"))?;
    let ready = source
        .subscribe(READY_EVENT)
        .map_err(|err| format!("{err:?}"))?;
    let changes = source
        .subscribe(FEED_EVENT)
        .map_err(|err| format!("{err:?}"))?;
    info!("Subscribed to change feed {url}");

    let mut messages = stream::select(ready, changes);
    while let Some(next) = messages.next().await {
        match next {
            Ok((event_type, message)) => {
                let Some(data) = message.data().as_string() else {
                    warn!("Ignoring non-text feed message");
                    continue;
                };
                match parse_message(&event_type, &data) {
                    Ok(message) => on_message(message),
                    Err(err) => warn!(error = %err, "Ignoring malformed feed message"),
                }
            }
            Err(err) => return Err(format!("{err:?}")),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_proto::Change;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_parse_ready_and_change() {
        assert_eq!(
            parse_message(READY_EVENT, r#"{"seq":4}"#),
            Ok(FeedMessage::Ready(4))
        );
        assert_eq!(
            parse_message(FEED_EVENT, r#"{"seq":5,"type":"delete","x":1,"y":2}"#),
            Ok(FeedMessage::Change(ChangeEvent::new(
                Some(5),
                Change::Delete { x: 1, y: 2 }
            )))
        );
        assert!(parse_message("other", "{}").is_err());
    }
}
