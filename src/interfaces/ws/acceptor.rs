//! WebSocket acceptor (C8): the TCP listen loop and the per-connection
//! handshake, framing, and dispatch glue.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::{error, info, warn};

use crate::application::commands::SharedCommandSender;
use crate::application::registry::{Connection, Lookup, SessionRegistry};
use crate::domain::RepositoryProvider;
use crate::support::{OcppFrame, ShutdownSignal};

const OCPP_SUBPROTOCOL: &str = "ocpp1.6";

/// Neither rejection falls back to a synthesized identity the way the
/// original server did. A missing `ocpp1.6` offer still completes the
/// upgrade so the close frame can carry code 1002; a missing charge point
/// id in the path fails the upgrade itself.
enum HandshakeOutcome {
    Accepted(String),
    NoSubprotocol,
    NoChargePointId,
}

fn negotiate(req: &Request, response: &mut Response) -> HandshakeOutcome {
    let requested = req
        .headers()
        .get("Sec-WebSocket-Protocol")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let supports_ocpp16 = requested
        .split(',')
        .map(|s| s.trim())
        .any(|p| p == OCPP_SUBPROTOCOL);

    if !supports_ocpp16 {
        warn!(requested, "no ocpp1.6 offer: accepting only to close with 1002");
        return HandshakeOutcome::NoSubprotocol;
    }

    match extract_charge_point_id(req.uri().path()) {
        Some(id) => {
            response.headers_mut().insert(
                "Sec-WebSocket-Protocol",
                OCPP_SUBPROTOCOL.parse().expect("static protocol string"),
            );
            HandshakeOutcome::Accepted(id)
        }
        None => HandshakeOutcome::NoChargePointId,
    }
}

fn extract_charge_point_id(path: &str) -> Option<String> {
    let id = path.trim_start_matches('/');
    if id.is_empty() || id.contains('/') {
        None
    } else {
        Some(id.to_string())
    }
}

/// Accepts connections on `listener` until `shutdown` fires, dispatching
/// each to its own connection task.
pub async fn run(
    listener: TcpListener,
    repo: Arc<dyn RepositoryProvider>,
    registry: Arc<SessionRegistry>,
    command_sender: SharedCommandSender,
    shutdown: ShutdownSignal,
) {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, addr)) => {
                        let repo = repo.clone();
                        let registry = registry.clone();
                        let command_sender = command_sender.clone();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(e) =
                                handle_connection(stream, addr, repo, registry, command_sender, shutdown).await
                            {
                                error!(%addr, error = %e, "connection task failed");
                            }
                        });
                    }
                    Err(e) => error!(error = %e, "failed to accept connection"),
                }
            }
            _ = shutdown.notified().wait() => {
                info!("acceptor stopping: shutdown signalled");
                return;
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    repo: Arc<dyn RepositoryProvider>,
    registry: Arc<SessionRegistry>,
    command_sender: SharedCommandSender,
    shutdown: ShutdownSignal,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let mut handshake: Option<HandshakeOutcome> = None;

    let accept_result = tokio_tungstenite::accept_hdr_async(
        stream,
        |req: &Request, mut response: Response| -> Result<Response, ErrorResponse> {
            let outcome = negotiate(req, &mut response);
            if let HandshakeOutcome::NoChargePointId = outcome {
                let rejection = ErrorResponse::builder()
                    .status(StatusCode::BAD_REQUEST)
                    .body(Some("charge point id required in path".to_string()))
                    .expect("static rejection response");
                handshake = Some(outcome);
                return Err(rejection);
            }
            handshake = Some(outcome);
            Ok(response)
        },
    )
    .await;

    let mut ws_stream = match accept_result {
        Ok(stream) => stream,
        Err(e) => {
            warn!(%addr, error = %e, "handshake rejected: no charge point id");
            return Ok(());
        }
    };

    let charge_point_id = match handshake {
        Some(HandshakeOutcome::Accepted(id)) => id,
        Some(HandshakeOutcome::NoSubprotocol) => {
            warn!(%addr, "closing with 1002: ocpp1.6 not offered");
            let _ = ws_stream
                .send(Message::Close(Some(CloseFrame {
                    code: CloseCode::Protocol,
                    reason: "ocpp1.6 subprotocol required".into(),
                })))
                .await;
            return Ok(());
        }
        Some(HandshakeOutcome::NoChargePointId) | None => {
            unreachable!("no-charge-point-id handshakes are rejected before upgrade completes")
        }
    };

    info!(charge_point_id = %charge_point_id, %addr, "charge point connected");

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    registry
        .register(Connection::new(charge_point_id.clone(), tx))
        .await;

    let cp_id = charge_point_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = ws_sender.send(Message::Text(frame)).await {
                warn!(charge_point_id = %cp_id, error = %e, "send failed");
                break;
            }
        }
        let _ = ws_sender
            .send(Message::Close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: "".into(),
            })))
            .await;
    });

    let cp_id = charge_point_id.clone();
    let recv_repo = repo.clone();
    let recv_registry = registry.clone();
    let recv_command_sender = command_sender.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    handle_frame(&*recv_repo, &recv_registry, &recv_command_sender, &cp_id, &text).await;
                }
                Ok(Message::Binary(data)) => {
                    warn!(charge_point_id = %cp_id, bytes = data.len(), "ignoring binary frame");
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
                Ok(Message::Close(frame)) => {
                    info!(charge_point_id = %cp_id, ?frame, "close frame received");
                    break;
                }
                Err(e) => {
                    warn!(charge_point_id = %cp_id, error = %e, "transport error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
        _ = shutdown.notified().wait() => {
            info!(charge_point_id = %charge_point_id, "connection closing: server shutdown");
        }
    }

    registry.unregister(&charge_point_id).await;
    command_sender.cleanup_charge_point(&charge_point_id);
    info!(charge_point_id = %charge_point_id, "charge point disconnected");

    Ok(())
}

/// Decode one inbound text frame and either dispatch it as a Call or
/// resolve it as the response to an outstanding outbound Call.
async fn handle_frame(
    repo: &dyn RepositoryProvider,
    registry: &SessionRegistry,
    command_sender: &SharedCommandSender,
    cp_id: &str,
    text: &str,
) {
    let frame = match OcppFrame::parse(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(charge_point_id = cp_id, error = %e, "dropping unparseable frame");
            return;
        }
    };

    match frame {
        OcppFrame::Call {
            unique_id,
            action,
            payload,
        } => {
            let result = crate::application::dispatch::dispatch(repo, cp_id, &action, payload).await;
            let response = match result {
                Ok(payload) => OcppFrame::CallResult { unique_id, payload },
                Err(e) => OcppFrame::error_response(unique_id, e.error_code(), e.error_description()),
            };
            if let Lookup::Connected(conn) = registry.lookup(cp_id) {
                if conn.send(response.serialize()).is_err() {
                    warn!(charge_point_id = cp_id, "failed to queue response: write channel closed");
                }
            }
        }
        OcppFrame::CallResult { unique_id, payload } => {
            command_sender.handle_response(cp_id, &unique_id, payload);
        }
        OcppFrame::CallError {
            unique_id,
            error_code,
            error_description,
            ..
        } => {
            command_sender.handle_error(cp_id, &unique_id, &error_code, &error_description);
        }
    }
}
