use futures::StreamExt;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::room_store::{TopicStream, room_topic},
    dto::{room::RoomId, room_event::RoomEvent},
    error::ServiceError,
    state::SharedState,
};

/// Live feed of a room's events, delivered to a callback by a dedicated task.
///
/// Dropping the handle cancels the feed.
#[must_use = "dropping a subscription cancels it"]
pub struct RoomSubscription {
    id: Uuid,
    room: RoomId,
    cancel: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl RoomSubscription {
    /// Identifier used to correlate this feed's log lines.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Room this feed listens to.
    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// Ask the consumer to stop. Events already being delivered finish; nothing is delivered
    /// afterwards. Safe to call repeatedly and after the feed ended on its own.
    pub fn unsubscribe(&self) {
        if !self.cancel.send_replace(true) {
            debug!(subscription = %self.id, room = %self.room, "unsubscribe requested");
        }
    }

    /// Whether the consumer task has stopped, by cancellation or because the topic closed.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Cancel the feed and wait until the consumer task has exited.
    pub async fn close(mut self) {
        self.unsubscribe();
        let Some(task) = self.task.take() else {
            return;
        };
        if let Err(err) = task.await {
            warn!(subscription = %self.id, room = %self.room, error = %err, "room consumer task failed");
        }
    }
}

impl Drop for RoomSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Start receiving `room`'s events.
///
/// Resolves once the store listens on the room's topic, so every event published after this
/// returns reaches `callback`, in publication order and one at a time. Payloads that do not
/// decode are logged and skipped.
pub async fn subscribe<F>(
    state: &SharedState,
    room: &RoomId,
    callback: F,
) -> Result<RoomSubscription, ServiceError>
where
    F: FnMut(RoomEvent) + Send + 'static,
{
    let stream = state.store().subscribe(&room_topic(room.as_str())).await?;
    let (cancel, cancelled) = watch::channel(false);
    let id = Uuid::new_v4();

    info!(subscription = %id, room = %room, "room subscription started");
    let task = tokio::spawn(consume(id, room.clone(), stream, cancelled, callback));

    Ok(RoomSubscription {
        id,
        room: room.clone(),
        cancel,
        task: Some(task),
    })
}

async fn consume<F>(
    id: Uuid,
    room: RoomId,
    mut stream: TopicStream,
    mut cancelled: watch::Receiver<bool>,
    mut callback: F,
) where
    F: FnMut(RoomEvent),
{
    loop {
        let payload = tokio::select! {
            biased;
            _ = cancelled.changed() => break,
            next = stream.next() => match next {
                Some(payload) => payload,
                None => {
                    warn!(subscription = %id, room = %room, "room topic closed");
                    break;
                }
            },
        };

        if *cancelled.borrow() {
            break;
        }

        match RoomEvent::decode(&payload) {
            Ok(event) => callback(event),
            Err(err) => {
                warn!(subscription = %id, room = %room, error = %err, "dropping malformed room event");
            }
        }
    }

    info!(subscription = %id, room = %room, "room subscription stopped");
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use tokio::sync::mpsc;

    use super::*;
    use crate::{
        dao::room_store::RoomBackend,
        services::room_service,
        test_support::{game, offline_state},
    };

    fn room() -> RoomId {
        RoomId::parse("R7K2Q").unwrap()
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<RoomEvent>) -> RoomEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("subscription ended")
    }

    async fn forwarding(
        state: &SharedState,
        room: &RoomId,
    ) -> (RoomSubscription, mpsc::UnboundedReceiver<RoomEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = subscribe(state, room, move |event| {
            let _ = tx.send(event);
        })
        .await
        .unwrap();
        (subscription, rx)
    }

    #[tokio::test]
    async fn events_arrive_in_order_until_unsubscribed() {
        let (state, _) = offline_state();
        let room = room();
        let (subscription, mut rx) = forwarding(&state, &room).await;

        room_service::add_games(&state, &room, "alice", vec![game("13", "Catan")])
            .await
            .unwrap();
        room_service::set_votes(&state, &room, "alice", vec!["13".into()], vec![])
            .await
            .unwrap();

        assert_eq!(
            next_event(&mut rx).await,
            RoomEvent::AddedGames {
                user: "alice".into(),
                games: vec![game("13", "Catan")],
            }
        );
        assert_eq!(
            next_event(&mut rx).await,
            RoomEvent::AddedVotes {
                user: "alice".into(),
                votes: vec!["13".into()],
                vetoes: vec![],
            }
        );

        subscription.close().await;
        room_service::reset_votes(&state, &room).await.unwrap();
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn nothing_is_delivered_after_unsubscribe() {
        let (state, _) = offline_state();
        let room = room();
        let (subscription, mut rx) = forwarding(&state, &room).await;

        subscription.unsubscribe();
        room_service::reset_votes(&state, &room).await.unwrap();
        room_service::set_votes(&state, &room, "alice", vec![], vec![])
            .await
            .unwrap();

        assert!(rx.recv().await.is_none());
        drop(subscription);
    }

    #[tokio::test]
    async fn burst_of_mutations_reaches_a_busy_subscriber() {
        let (state, _) = offline_state();
        let room = room();
        let (_subscription, mut rx) = forwarding(&state, &room).await;

        for n in 0..100 {
            room_service::set_votes(&state, &room, "alice", vec![n.to_string()], vec![])
                .await
                .unwrap();
        }

        for n in 0..100 {
            match next_event(&mut rx).await {
                RoomEvent::AddedVotes { votes, .. } => assert_eq!(votes, [n.to_string()]),
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn malformed_payloads_are_skipped() {
        let (state, store) = offline_state();
        let room = room();
        let (_subscription, mut rx) = forwarding(&state, &room).await;

        let topic = room_topic(room.as_str());
        store.publish(&topic, "addedVotesUpdate".into()).await.unwrap();
        store.publish(&topic, "hello".into()).await.unwrap();
        store.publish(&topic, "{\"type\":\"shuffleUpdate\"}".into()).await.unwrap();
        store.publish(&topic, "resetVotesUpdate".into()).await.unwrap();

        assert_eq!(next_event(&mut rx).await, RoomEvent::ResetVotes);
    }

    #[tokio::test]
    async fn subscribers_are_independent() {
        let (state, _) = offline_state();
        let room = room();
        let (first, mut first_rx) = forwarding(&state, &room).await;
        let (_second, mut second_rx) = forwarding(&state, &room).await;

        room_service::reset_votes(&state, &room).await.unwrap();
        assert_eq!(next_event(&mut first_rx).await, RoomEvent::ResetVotes);
        assert_eq!(next_event(&mut second_rx).await, RoomEvent::ResetVotes);

        first.close().await;
        room_service::reset_votes(&state, &room).await.unwrap();
        assert_eq!(next_event(&mut second_rx).await, RoomEvent::ResetVotes);
        assert!(first_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn other_rooms_are_not_delivered() {
        let (state, _) = offline_state();
        let (_subscription, mut rx) = forwarding(&state, &room()).await;
        let elsewhere = RoomId::parse("ZZZZZ").unwrap();

        room_service::reset_votes(&state, &elsewhere).await.unwrap();
        room_service::set_votes(&state, &room(), "bob", vec![], vec![]).await.unwrap();

        assert_eq!(next_event(&mut rx).await.user(), Some("bob"));
    }

    #[tokio::test]
    async fn closed_topic_ends_the_feed() {
        let (state, store) = offline_state();
        let (subscription, mut rx) = forwarding(&state, &room()).await;

        store.shutdown();
        assert!(rx.recv().await.is_none());
        subscription.unsubscribe();
        subscription.close().await;
    }

    #[tokio::test]
    async fn live_subscription_is_not_finished() {
        let (state, _) = offline_state();
        let (subscription, _rx) = forwarding(&state, &room()).await;
        assert!(!subscription.is_finished());
        assert_eq!(subscription.room(), &room());
    }

    #[tokio::test]
    async fn dropping_the_handle_cancels() {
        let (state, _) = offline_state();
        let (subscription, mut rx) = forwarding(&state, &room()).await;

        drop(subscription);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn subscribe_fails_when_store_is_down() {
        let (state, store) = offline_state();
        store.shutdown();

        let seen = Arc::new(Mutex::new(0));
        let counter = seen.clone();
        let result = subscribe(&state, &room(), move |_| *counter.lock().unwrap() += 1).await;
        assert!(matches!(result, Err(ServiceError::Unavailable(_))));
        assert_eq!(*seen.lock().unwrap(), 0);
    }
}
