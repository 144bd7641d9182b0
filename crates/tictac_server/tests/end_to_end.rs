//! End-to-end tests: real sockets against a server on an ephemeral port.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tictac_server::connection::ConnectionManager;
use tictac_server::game::{Board, SessionRegistry, Symbol};
use tictac_server::messaging::{read_server_message, ServerMessage};
use tictac_server::server::handlers::handle_connection;
use tictac_server::{GameServer, RejectionMode, ServerConfig};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;

const MAX_LINE: usize = 1024;

struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect");
        let (read_half, writer) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer,
        }
    }

    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("write");
    }

    async fn recv(&mut self) -> Option<ServerMessage> {
        timeout(
            Duration::from_secs(5),
            read_server_message(&mut self.reader, MAX_LINE),
        )
        .await
        .expect("server answered in time")
        .expect("well-formed server message")
    }
}

async fn start_server(config: ServerConfig) -> (Arc<GameServer>, SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let server = Arc::new(GameServer::new(config));
    let handle = tokio::spawn({
        let server = Arc::clone(&server);
        async move {
            server.serve(listener, None).await.expect("serve");
        }
    });
    (server, addr, handle)
}

/// Connects two clients and consumes the seating messages.
async fn seated_pair(addr: SocketAddr) -> (Client, Client) {
    let mut o = Client::connect(addr).await;
    assert!(matches!(o.recv().await, Some(ServerMessage::RoomAssigned(_))));
    let mut x = Client::connect(addr).await;
    assert!(matches!(x.recv().await, Some(ServerMessage::RoomAssigned(_))));
    assert_eq!(o.recv().await, Some(ServerMessage::Seated(Symbol::O)));
    assert_eq!(x.recv().await, Some(ServerMessage::Seated(Symbol::X)));
    (o, x)
}

#[tokio::test(flavor = "multi_thread")]
async fn two_clients_play_to_a_win() {
    let (_server, addr, _handle) = start_server(ServerConfig::default()).await;
    let (mut o, mut x) = seated_pair(addr).await;

    let script = [
        ("X,1,1", " , , \n ,X, \n , , \n"),
        ("O,0,0", "O, , \n ,X, \n , , \n"),
        ("X,1,0", "O, , \nX,X, \n , , \n"),
        ("O,0,1", "O,O, \nX,X, \n , , \n"),
        ("X,1,2", "O,O, \nX,X,X\n , , \n"),
    ];
    for (index, (line, expected)) in script.into_iter().enumerate() {
        let mover = if index % 2 == 0 { &mut x } else { &mut o };
        mover.send(line).await;

        let expected: Board = expected.parse().expect("board");
        assert_eq!(x.recv().await, Some(ServerMessage::Board(expected.clone())));
        assert_eq!(o.recv().await, Some(ServerMessage::Board(expected)));
    }

    o.send("O,2,2").await;
    assert_eq!(
        o.recv().await,
        Some(ServerMessage::Rejected(tictac_server::error::RejectReason::GameOver))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn exit_closes_the_whole_room() {
    let (server, addr, _handle) = start_server(ServerConfig::default()).await;
    let (mut o, mut x) = seated_pair(addr).await;

    o.send("exit").await;
    assert_eq!(x.recv().await, Some(ServerMessage::Exit));
    assert_eq!(o.recv().await, Some(ServerMessage::Exit));
    assert_eq!(x.recv().await, None);

    // Give both handlers a moment to unregister.
    for _ in 0..50 {
        if server.active_connections().await == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(server.active_connections().await, 0);
    assert_eq!(server.stats().await.active_rooms, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_line_drops_the_connection_and_its_room() {
    let (_server, addr, _handle) = start_server(ServerConfig::default()).await;
    let (mut o, mut x) = seated_pair(addr).await;

    x.send("this is not a move").await;
    assert_eq!(o.recv().await, Some(ServerMessage::Exit));
    assert_eq!(x.recv().await, Some(ServerMessage::Exit));
}

#[tokio::test(flavor = "multi_thread")]
async fn silent_mode_sends_nothing_for_a_bad_move() {
    let config = ServerConfig {
        rejection_mode: RejectionMode::Silent,
        ..Default::default()
    };
    let (_server, addr, _handle) = start_server(config).await;
    let (mut o, mut x) = seated_pair(addr).await;

    // The off-board move is ignored; the legal one is the next thing anyone sees.
    x.send("X,5,5").await;
    x.send("X,2,2").await;
    let expected: Board = " , , \n , , \n , ,X\n".parse().expect("board");
    assert_eq!(o.recv().await, Some(ServerMessage::Board(expected.clone())));
    assert_eq!(x.recv().await, Some(ServerMessage::Board(expected)));
}

#[tokio::test(flavor = "multi_thread")]
async fn connections_past_the_limit_are_told_to_exit() {
    let config = ServerConfig {
        max_connections: 1,
        ..Default::default()
    };
    let (_server, addr, _handle) = start_server(config).await;
    let mut first = Client::connect(addr).await;
    assert!(matches!(first.recv().await, Some(ServerMessage::RoomAssigned(_))));

    let mut second = Client::connect(addr).await;
    assert_eq!(second.recv().await, Some(ServerMessage::Exit));
    assert_eq!(second.recv().await, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_sends_exit_to_everyone_and_stops_accepting() {
    let (server, addr, handle) = start_server(ServerConfig::default()).await;
    let (mut o, mut x) = seated_pair(addr).await;
    let mut waiting = Client::connect(addr).await;
    assert!(matches!(waiting.recv().await, Some(ServerMessage::RoomAssigned(_))));

    assert_eq!(server.shutdown().await, 3);
    for client in [&mut o, &mut x, &mut waiting] {
        assert_eq!(client.recv().await, Some(ServerMessage::Exit));
    }
    timeout(Duration::from_secs(5), handle)
        .await
        .expect("accept loops stopped")
        .expect("serve task");
}

#[tokio::test(flavor = "multi_thread")]
async fn late_arrival_during_shutdown_is_told_to_exit() {
    // The socket was accepted, but its handler only reaches the registry
    // after every room has been closed.
    let registry = Arc::new(SessionRegistry::default());
    registry.shutdown().await;

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let connection_manager = Arc::new(ConnectionManager::new(8));
    let handler = tokio::spawn({
        let connection_manager = Arc::clone(&connection_manager);
        async move {
            let (stream, peer) = listener.accept().await.expect("accept");
            let config = Arc::new(ServerConfig::default());
            handle_connection(stream, peer, config, connection_manager, registry).await
        }
    });

    let mut late = Client::connect(addr).await;
    assert_eq!(late.recv().await, Some(ServerMessage::Exit));
    assert_eq!(late.recv().await, None);

    handler.await.expect("handler task").expect("refusal is not an error");
    assert_eq!(connection_manager.active_count().await, 0);
}
