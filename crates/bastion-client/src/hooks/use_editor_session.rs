//! Hook owning the editor session of one open map.
//!
//! All session mutations go through one unbounded channel. A single task
//! receives the messages, dispatches them, then starts whatever network work
//! the session queued. Input listeners, command results and the change feed
//! are producers.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use bastion_core::{
    BuildingKind, ContextMenuState, EditorConfig, EditorSession, GridDimensions,
    Notice, OutboundCommand, Rotation, SessionMsg,
};
use bastion_proto::{MapInfo, routes};
use futures::channel::mpsc;
use futures::future::{AbortHandle, Abortable};
use futures::StreamExt;
use gloo::timers::future::TimeoutFuture;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::config::FEED_RETRY_MS;
use crate::network::feed::{self, FeedMessage};
use crate::network::ApiClient;

/// Snapshot attempts before giving up on a retryable failure.
const SNAPSHOT_ATTEMPTS: u32 = 3;

/// Shared view of the session plus a way to send it messages.
#[derive(Clone)]
pub struct EditorHandle {
    pub session: Rc<RefCell<EditorSession>>,
    sender: mpsc::UnboundedSender<SessionMsg>,
    /// Bumped whenever state shown outside the canvas changes.
    pub version: u64,
}

impl PartialEq for EditorHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.session, &other.session) && self.version == other.version
    }
}

impl EditorHandle {
    pub fn dispatch(&self, msg: SessionMsg) {
        if self.sender.unbounded_send(msg).is_err() {
            tracing::warn!("Editor session is closed");
        }
    }

    pub fn callback<E: 'static>(&self, make: impl Fn(E) -> SessionMsg + 'static) -> Callback<E> {
        let handle = self.clone();
        Callback::from(move |event: E| handle.dispatch(make(event)))
    }
}

/// Session state rendered by the page (palette, rotation, menu).
#[derive(PartialEq)]
struct PageState {
    kind: BuildingKind,
    rotation: Rotation,
    menu: ContextMenuState,
}

impl PageState {
    fn of(session: &EditorSession) -> Self {
        Self {
            kind: session.selected_kind(),
            rotation: session.selected_rotation(),
            menu: session.menu().clone(),
        }
    }
}

async fn load_snapshot(api: ApiClient, map_id: String, sender: mpsc::UnboundedSender<SessionMsg>) {
    let mut attempt = 1;
    let result = loop {
        match api.snapshot(&map_id).await {
            Err(err) if err.is_retryable() && attempt < SNAPSHOT_ATTEMPTS => {
                tracing::warn!(attempt, error = %err, "Snapshot failed, retrying");
                attempt += 1;
                TimeoutFuture::new(FEED_RETRY_MS).await;
            }
            result => break result,
        }
    };
    let _ = sender.unbounded_send(SessionMsg::Snapshot(result));
}

/// Subscribe, load the snapshot once the feed is live, and resubscribe with a
/// reload whenever the feed drops.
async fn sync_loop(api: ApiClient, map_id: String, sender: mpsc::UnboundedSender<SessionMsg>) {
    let url = api.url(&routes::feed(&map_id));
    loop {
        let result = feed::follow(&url, |message| match message {
            FeedMessage::Ready(seq) => {
                let _ = sender.unbounded_send(SessionMsg::FeedReady(seq));
                // Every change after `seq` arrives on this stream
                spawn_local(load_snapshot(api.clone(), map_id.clone(), sender.clone()));
            }
            FeedMessage::Change(event) => {
                let _ = sender.unbounded_send(SessionMsg::Feed(event));
            }
        })
        .await;
        match result {
            Ok(()) => tracing::warn!("Change feed closed"),
            Err(err) => tracing::warn!(error = %err, "Change feed failed"),
        }
        TimeoutFuture::new(FEED_RETRY_MS).await;
        tracing::info!("Resubscribing to change feed");
    }
}

#[hook]
pub fn use_editor_session(
    info: MapInfo,
    api: ApiClient,
    config: EditorConfig,
    on_notices: Callback<Vec<Notice>>,
) -> EditorHandle {
    let session = {
        let info = info.clone();
        use_mut_ref(move || {
            EditorSession::new(
                info.id.clone(),
                GridDimensions::new(info.width, info.height),
                config,
            )
        })
    };
    let version = use_state(|| 0_u64);
    let channel = use_memo((), |_| {
        let (sender, receiver) = mpsc::unbounded::<SessionMsg>();
        (sender, RefCell::new(Some(receiver)))
    });

    {
        let session = session.clone();
        let version = version.clone();
        let channel = channel.clone();
        use_effect_with(info.id.clone(), move |map_id| {
            let map_id = map_id.clone();
            let sender = channel.0.clone();
            let receiver = channel.1.borrow_mut().take();
            let (dispatch_abort, dispatch_reg) = AbortHandle::new_pair();
            let (sync_abort, sync_reg) = AbortHandle::new_pair();

            if let Some(mut receiver) = receiver {
                let counter = Rc::new(Cell::new(*version));
                let api_for_dispatch = api.clone();
                let map_for_dispatch = map_id.clone();
                let sender_for_dispatch = sender.clone();
                let dispatch = async move {
                    while let Some(msg) = receiver.next().await {
                        let (outbound, resync, notices, ui_changed) = {
                            let mut s = session.borrow_mut();
                            let before = PageState::of(&s);
                            s.dispatch(SessionMsg::Tick(js_sys::Date::now()));
                            s.dispatch(msg);
                            (
                                s.drain_outbox(),
                                s.take_resync(),
                                s.take_notices(),
                                before != PageState::of(&s),
                            )
                        };

                        for OutboundCommand { op, command } in outbound {
                            let api = api_for_dispatch.clone();
                            let sender = sender_for_dispatch.clone();
                            let request = command.to_request(&map_for_dispatch);
                            spawn_local(async move {
                                let result = api.execute(&request).await;
                                let _ = sender.unbounded_send(SessionMsg::Resolved { op, result });
                            });
                        }
                        if resync {
                            tracing::info!("Reloading snapshot");
                            spawn_local(load_snapshot(
                                api_for_dispatch.clone(),
                                map_for_dispatch.clone(),
                                sender_for_dispatch.clone(),
                            ));
                        }
                        if !notices.is_empty() {
                            on_notices.emit(notices);
                        }
                        if ui_changed {
                            counter.set(counter.get() + 1);
                            version.set(counter.get());
                        }
                    }
                };
                spawn_local(async move {
                    let _ = Abortable::new(dispatch, dispatch_reg).await;
                });
                spawn_local(async move {
                    let _ = Abortable::new(sync_loop(api, map_id, sender), sync_reg).await;
                });
            } else {
                tracing::error!("Editor session channel already taken");
            }

            move || {
                dispatch_abort.abort();
                sync_abort.abort();
            }
        });
    }

    EditorHandle {
        session,
        sender: channel.0.clone(),
        version: *version,
    }
}
