use crate::domain::drawing::{Fill, Line};
use crate::domain::player::UserId;
use crate::interface_adapters::clients::auth::VerifyTokenError;
use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::rand_id;
use crate::use_cases::join_policy::check_external_policy;
use crate::use_cases::lobby::Lobby;
use crate::use_cases::types::JoinError;

use axum::{
    Json,
    extract::{
        Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures::SinkExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, error, info, info_span, warn};

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
const MAX_SESSION_TOKEN_LEN: usize = 4096;
const JOIN_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
const OUTBOUND_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug)]
enum NetError {
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    ClosedBeforeJoin,
    JoinTimeout,
    JoinRequired,
    AuthVerify,
    Refused(JoinError),
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct LobbyQuery {
    lobby_id: String,
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>, Query(query): Query<LobbyQuery>) -> impl IntoResponse {
    let lobby = match state.lobby_registry.get(&query.lobby_id).await {
        Some(lobby) => lobby,
        None => {
            return (StatusCode::NOT_FOUND, Json(ErrorResponse { error: "lobby not found".to_string() })).into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, lobby, state))
}

/// What a connection turned out to be once the join handshake resolved.
/// Observers never affect game state; their inbound traffic is dropped.
enum Membership {
    Player(UserId),
    Observer(UserId),
}

struct ConnCtx {
    membership: Membership,
    lobby: Arc<Lobby>,
    outbound_rx: mpsc::Receiver<crate::domain::events::Outbound>,

    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u32,
    last_invalid_json_log: Instant,
}

async fn handle_socket(mut socket: WebSocket, lobby: Arc<Lobby>, state: Arc<AppState>) {
    let conn_id = rand_id();
    let span = info_span!("conn", conn_id, user_id = tracing::field::Empty);
    let _enter = span.enter();

    let mut ctx = match bootstrap_connection(&mut socket, lobby.clone(), &state).await {
        Ok(ctx) => ctx,
        Err(NetError::ClosedBeforeJoin) => {
            info!("client disconnected before join handshake");
            return;
        }
        Err(NetError::Refused(reason)) => {
            info!(reason = reason.reason(), "join refused");
            return;
        }
        Err(e) => {
            error!(error = ?e, "failed to bootstrap connection");
            let _ = socket.send(Message::Close(Some(CloseFrame { code: close_code::POLICY, reason: "bootstrap failed".into() }))).await;
            let _ = socket.close().await;
            return;
        }
    };

    let user_id = match &ctx.membership {
        Membership::Player(id) => id.clone(),
        Membership::Observer(id) => id.clone(),
    };
    span.record("user_id", user_id.as_ref());
    info!("client connected");

    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }

    disconnect_cleanup(&ctx, &state).await;
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket.send(Message::Text(txt.into())).await.map_err(NetError::Ws)?;
    Ok(bytes)
}

async fn send_close_with_reason(socket: &mut WebSocket, code: u16, reason: &'static str) -> Result<(), NetError> {
    socket.send(Message::Close(Some(CloseFrame { code, reason: reason.into() }))).await.map_err(NetError::Ws)?;
    socket.close().await.map_err(NetError::Ws)
}

struct JoinHandshake {
    payload: crate::interface_adapters::protocol::JoinPayload,
    bytes_in: u64,
}

async fn read_join_handshake(socket: &mut WebSocket) -> Result<JoinHandshake, NetError> {
    loop {
        let Some(incoming) = socket.recv().await else {
            return Err(NetError::ClosedBeforeJoin);
        };
        let message = incoming.map_err(NetError::Ws)?;
        match message {
            Message::Text(text) => {
                let bytes_in = text.len() as u64;
                return match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Join(payload)) => Ok(JoinHandshake { payload, bytes_in }),
                    Ok(_) => {
                        let _ = send_close_with_reason(socket, close_code::POLICY, "join required").await;
                        Err(NetError::JoinRequired)
                    }
                    Err(_) => {
                        let _ = send_close_with_reason(socket, close_code::POLICY, "invalid join payload").await;
                        Err(NetError::JoinRequired)
                    }
                };
            }
            Message::Binary(_) => {
                let _ = send_close_with_reason(socket, close_code::UNSUPPORTED, "binary messages not supported").await;
                return Err(NetError::JoinRequired);
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => return Err(NetError::ClosedBeforeJoin),
        }
    }
}

async fn bootstrap_connection(socket: &mut WebSocket, lobby: Arc<Lobby>, state: &Arc<AppState>) -> Result<ConnCtx, NetError> {
    let join = match timeout(JOIN_HANDSHAKE_TIMEOUT, read_join_handshake(socket)).await {
        Ok(result) => result?,
        Err(_) => {
            let _ = send_close_with_reason(socket, close_code::POLICY, "join timeout").await;
            return Err(NetError::JoinTimeout);
        }
    };

    let (tx, rx) = mpsc::channel(OUTBOUND_CHANNEL_CAPACITY);

    let (membership, ready) = match join.payload.session_token {
        Some(token) => {
            let token = token.trim();
            if token.is_empty() || token.len() > MAX_SESSION_TOKEN_LEN {
                let _ = send_close_with_reason(socket, close_code::POLICY, "invalid session token").await;
                return Err(NetError::AuthVerify);
            }

            let identity = match state.auth_client.verify_token(token).await {
                Ok(identity) => identity,
                Err(VerifyTokenError::InvalidToken) => {
                    let _ = send_close_with_reason(socket, close_code::POLICY, "invalid session token").await;
                    return Err(NetError::AuthVerify);
                }
                Err(VerifyTokenError::SessionExpired) => {
                    let _ = send_close_with_reason(socket, close_code::POLICY, "session expired").await;
                    return Err(NetError::AuthVerify);
                }
                Err(VerifyTokenError::UpstreamUnavailable) => {
                    let _ = send_close_with_reason(socket, close_code::ERROR, "auth unavailable").await;
                    return Err(NetError::AuthVerify);
                }
            };

            let user_id: UserId = Arc::from(identity.user_id.as_str());

            // Capacity + kick first, matching the join policy order; the
            // network-bound follow/subscribe/ban checks only run once those
            // pass, so a full or kicking lobby never pays for a round trip.
            if let Err(e) = lobby.join_precheck(&user_id).await {
                let _ = send_close_with_reason(socket, close_code::POLICY, e.reason()).await;
                return Err(NetError::Refused(e));
            }

            if let Some(owner_id) = lobby.owner_id().await {
                let access = lobby.access_policy().await;
                if let Err(e) = check_external_policy(&state.identity_provider, &user_id, &owner_id, access.followers_only, access.subscribers_only).await
                {
                    let code = if matches!(e, JoinError::UpstreamUnavailable) { close_code::ERROR } else { close_code::POLICY };
                    let _ = send_close_with_reason(socket, code, e.reason()).await;
                    return Err(NetError::Refused(e));
                }
            }

            let moderator = match state.user_store.get_mods_for_channel(lobby.creator_id.as_ref()).await {
                Ok(mods) => mods.iter().any(|m| m.user_id == user_id.as_ref()),
                Err(e) => {
                    warn!(error = %e, "moderator lookup failed; admitting as non-moderator");
                    false
                }
            };

            let ready = match lobby.join(user_id.clone(), identity.display_name, moderator, tx).await {
                Ok(ready) => ready,
                Err(e) => {
                    let _ = send_close_with_reason(socket, close_code::POLICY, e.reason()).await;
                    return Err(NetError::Refused(e));
                }
            };
            (Membership::Player(user_id), ready)
        }
        None => {
            let observer_id: UserId = Arc::from(format!("observer-{}", rand_id()).as_str());
            let ready = lobby.join_observer(observer_id.clone(), tx).await;
            (Membership::Observer(observer_id), ready)
        }
    };

    if let Err(e) = send_message(socket, &ServerMessage::from(crate::domain::events::Outbound::Ready(Box::new(ready)))).await {
        match &membership {
            Membership::Player(id) => lobby.on_player_disconnect(id).await,
            Membership::Observer(id) => lobby.on_observer_disconnect(id).await,
        }
        return Err(e);
    }

    Ok(ConnCtx {
        membership,
        lobby,
        outbound_rx: rx,
        msgs_in: 1,
        msgs_out: 1,
        bytes_in: join.bytes_in,
        bytes_out: 0,
        invalid_json: 0,
        last_invalid_json_log: Instant::now() - LOG_THROTTLE,
    })
}

enum LoopControl {
    Continue,
    Disconnect,
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let ConnCtx { membership, lobby, outbound_rx, msgs_in, msgs_out, bytes_in, bytes_out, invalid_json, last_invalid_json_log } = ctx;

    loop {
        let disconnect = tokio::select! {
            incoming = socket.recv() => {
                match handle_incoming_ws(incoming, membership, lobby, msgs_in, bytes_in, invalid_json, last_invalid_json_log).await {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => return Err(e),
                }
            }

            outgoing = outbound_rx.recv() => {
                match outgoing {
                    Some(crate::domain::events::Outbound::Shutdown) => {
                        let _ = send_message(socket, &ServerMessage::Shutdown).await;
                        true
                    }
                    Some(event) => {
                        match send_message(socket, &ServerMessage::from(event)).await {
                            Ok(bytes) => {
                                *msgs_out += 1;
                                *bytes_out += bytes as u64;
                                false
                            }
                            Err(err) => {
                                warn!(error = ?err, "failed to send outbound message");
                                true
                            }
                        }
                    }
                    None => true,
                }
            }
        };

        if disconnect {
            let _ = socket.close().await;
            break;
        }
    }

    Ok(())
}

async fn handle_incoming_ws(
    incoming: Option<Result<Message, axum::Error>>,
    membership: &Membership,
    lobby: &Arc<Lobby>,
    msgs_in: &mut u64,
    bytes_in: &mut u64,
    invalid_json: &mut u32,
    last_invalid_json_log: &mut Instant,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(Message::Text(text))) => {
            *msgs_in += 1;
            *bytes_in += text.len() as u64;

            let Ok(msg) = serde_json::from_str::<ClientMessage>(&text) else {
                *invalid_json += 1;
                if should_log(last_invalid_json_log) {
                    warn!(bytes = text.len(), "failed to parse client message");
                }
                if *invalid_json > MAX_INVALID_JSON {
                    return Ok(LoopControl::Disconnect);
                }
                return Ok(LoopControl::Continue);
            };

            // Observers never drive game state; their traffic is silently dropped.
            if let Membership::Observer(_) = membership {
                return Ok(LoopControl::Continue);
            }
            let Membership::Player(user_id) = membership else { unreachable!() };
            dispatch_client_message(msg, user_id, lobby).await;
            Ok(LoopControl::Continue)
        }
        Some(Ok(Message::Binary(_))) => Ok(LoopControl::Disconnect),
        Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => Ok(LoopControl::Continue),
        Some(Ok(Message::Close(_))) => Ok(LoopControl::Disconnect),
        Some(Err(e)) => {
            warn!(error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => Ok(LoopControl::Disconnect),
    }
}

async fn dispatch_client_message(msg: ClientMessage, sender: &UserId, lobby: &Arc<Lobby>) {
    match msg {
        ClientMessage::Join(_) | ClientMessage::KeepAlive => {}
        ClientMessage::Message(payload) => lobby.handle_message(sender, &payload.content).await,
        ClientMessage::Line(dto) => lobby.handle_line(sender, Line::from(dto)).await,
        ClientMessage::Fill(dto) => lobby.handle_fill(sender, Fill::from(dto)).await,
        ClientMessage::ClearDrawingBoard => lobby.handle_clear(sender).await,
        ClientMessage::Undo => lobby.handle_undo(sender).await,
        ClientMessage::ChooseWord(payload) => lobby.handle_choose_word(sender, payload.index).await,
        ClientMessage::Kick(payload) => {
            let target: UserId = Arc::from(payload.player_id.as_str());
            lobby.handle_kick(sender, &target).await;
        }
        ClientMessage::Start => lobby.handle_start(sender).await,
        ClientMessage::RequestDrawing => lobby.handle_request_drawing(sender).await,
        ClientMessage::EditSettings(payload) => lobby.handle_edit_settings(sender, payload.into()).await,
    }
}

async fn disconnect_cleanup(ctx: &ConnCtx, state: &Arc<AppState>) {
    match &ctx.membership {
        Membership::Player(id) => ctx.lobby.on_player_disconnect(id).await,
        Membership::Observer(id) => ctx.lobby.on_observer_disconnect(id).await,
    }
    state.lobby_registry.remove_if_empty(&ctx.lobby.id).await;

    debug!(
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        bytes_in = ctx.bytes_in,
        bytes_out = ctx.bytes_out,
        invalid_json = ctx.invalid_json,
        "connection stats"
    );
    info!("client disconnected");
}
