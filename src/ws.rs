use crate::{
    client::{Client, HostAction, PlayerAction},
    error::GameError,
    session::SessionManager,
};
use futures_util::{select, FutureExt, SinkExt, StreamExt, TryStreamExt};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;

#[derive(Error, Debug)]
enum WsError {
    #[error("violation of the application-layer protocol")]
    ProtocolError,
}

pub async fn accept_connection(stream: TcpStream, manager: &SessionManager) {
    log::info!("Accepted new connection");

    let Ok(stream) = tokio_tungstenite::accept_async(stream).await else {
        log::error!("Error occured during websocket handshake");
        return;
    };
    let (mut write, read) = stream.split();
    let mut read = read.fuse();

    let mut client = Client::new(manager);

    loop {
        select! {
            msg = read.try_next() => {
                let Ok(Some(Message::Text(msg))) = msg else {
                    break;
                };
                let Ok(msg) = serde_json::from_str::<Value>(&msg) else {
                    log::error!("Invalid JSON received: {}", &msg);
                    break;
                };
                let Ok(msg) = parse_request(&msg) else {
                    log::error!("Invalid message received: {}", &msg);
                    break;
                };
                match process_request(msg, &mut client) {
                    Ok(Some(reply)) => {
                        let reply = format_reply(reply);
                        write.send(Message::Text(reply.to_string())).await.ok();
                    },
                    Ok(None) => {},
                    Err(err) => {
                        let reply = json!({
                            "type": "error",
                            "error": err.to_string()
                        });
                        write.send(Message::Text(reply.to_string())).await.ok();
                    }
                }
            },
            msg = client.next_message().fuse() => {
                if write.send(Message::Text(msg.to_string())).await.is_err() {
                    log::error!("Could not send websockets message");
                    break;
                }
            }
        }
    }

    client.leave();
}

/// A message sent by a game client to the server.
enum Request {
    CreateGame { name: String },
    JoinGame { room_code: String, name: String },
    HostAction(HostAction),
    PlayerAction(PlayerAction),
    Heartbeat,
}

/// A message sent by the server to a game client.
enum Response {
    GameCreated { room_code: String },
    GameJoined { room_code: String, name: String },
}

/// Parses a websockets message from the client.
fn parse_request(req: &Value) -> Result<Request, WsError> {
    match req["type"].as_str().unwrap_or("") {
        "create_game" => {
            let name = req["name"].as_str().ok_or(WsError::ProtocolError)?.to_string();
            Ok(Request::CreateGame { name })
        }
        "join_game" => {
            let room_code = req["roomCode"]
                .as_str()
                .ok_or(WsError::ProtocolError)?
                .to_ascii_uppercase();
            let name = req["name"].as_str().ok_or(WsError::ProtocolError)?.to_string();
            Ok(Request::JoinGame { room_code, name })
        }
        "host_action" => {
            let action = serde_json::from_value(req["action"].clone()).map_err(|_| WsError::ProtocolError)?;
            Ok(Request::HostAction(action))
        }
        "player_action" => {
            let action = serde_json::from_value(req["action"].clone()).map_err(|_| WsError::ProtocolError)?;
            Ok(Request::PlayerAction(action))
        }
        "heartbeat" => Ok(Request::Heartbeat),
        _ => Err(WsError::ProtocolError),
    }
}

/// Processes a request from the client.
fn process_request(req: Request, client: &mut Client) -> Result<Option<Response>, GameError> {
    match req {
        Request::CreateGame { name } => {
            let room_code = client.create_game(&name)?;
            Ok(Some(Response::GameCreated { room_code }))
        }
        Request::JoinGame { room_code, name } => {
            client.join_game(&room_code, &name)?;
            Ok(Some(Response::GameJoined { room_code, name }))
        }
        Request::HostAction(action) => {
            client.host_action(action)?;
            Ok(None)
        }
        Request::PlayerAction(action) => {
            client.player_action(action)?;
            Ok(None)
        }
        Request::Heartbeat => {
            client.heartbeat();
            Ok(None)
        }
    }
}

/// Formats a reply to the client to be sent over websockets.
fn format_reply(res: Response) -> Value {
    match res {
        Response::GameCreated { room_code } => json!({
            "type": "game_created",
            "roomCode": room_code
        }),
        Response::GameJoined { room_code, name } => json!({
            "type": "game_joined",
            "roomCode": room_code,
            "name": name
        }),
    }
}
