//! Server lifecycle: a verified start and a cooperative stop.
//!
//! [`ServerHandle::start`] spawns the worker thread and blocks until the
//! worker reports over a one-shot channel that the listener is bound.
//! A caller that gets a handle back can connect immediately; there is no
//! window where the port is not yet listening. The channel is created
//! fresh per call, so independent servers can start concurrently without
//! sharing any process-wide state.
//!
//! [`ServerHandle::stop`] consumes the handle: it raises the shutdown
//! flag, nudges the listener with a wake connection so a parked accept
//! observes the flag, and joins the worker. In-flight requests finish;
//! nothing is cancelled mid-conversion.
use std::{
    io,
    net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread,
    time::Duration,
};

use log::{debug, info, warn};
use thiserror::Error;

use crate::{attr::metadata::MetadataLookup, switch::SwitchApi};

use super::server::RpcServer;

/// How long `start` waits for the worker's readiness report.
const READY_TIMEOUT: Duration = Duration::from_secs(5);
/// Poll interval for the shutdown flag on otherwise idle connections.
const READ_POLL: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("invalid port '{0}'")]
    InvalidPort(String),

    #[error("failed to spawn server worker: {0}")]
    Spawn(#[source] io::Error),

    #[error("failed to bind listener: {0}")]
    Bind(#[source] io::Error),

    #[error("server worker exited before signaling readiness")]
    Aborted,

    #[error("server worker did not signal readiness within {0:?}")]
    StartTimeout(Duration),

    #[error("server worker panicked")]
    Join,
}

/// A running server. Dropping the handle without calling [`stop`] leaves
/// the worker running for the rest of the process.
///
/// [`stop`]: ServerHandle::stop
#[derive(Debug)]
pub struct ServerHandle {
    worker: thread::JoinHandle<()>,
    shutdown: Arc<AtomicBool>,
    local_addr: SocketAddr,
}

impl ServerHandle {
    /// Starts a server on `port` and blocks until its listener is bound.
    ///
    /// `port` 0 asks the OS for a free port; [`local_addr`] reports the
    /// one assigned.
    ///
    /// [`local_addr`]: ServerHandle::local_addr
    pub fn start<M, S>(port: u16, metadata: M, switch: S) -> Result<Self, LifecycleError>
    where
        M: MetadataLookup + Send + 'static,
        S: SwitchApi + Send + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel::<Result<SocketAddr, io::Error>>();

        let flag = Arc::clone(&shutdown);
        let worker = thread::Builder::new()
            .name("asicd-rpc".to_string())
            .spawn(move || {
                let mut server = RpcServer::new(metadata, switch);
                let listener = match bind(port) {
                    Ok(listener) => listener,
                    Err(e) => {
                        // The starter reports this as its own failure.
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                match listener.local_addr() {
                    Ok(addr) => {
                        info!("listening at {addr}");
                        if ready_tx.send(Ok(addr)).is_err() {
                            // Starter gave up waiting; nobody can stop us
                            // anymore, so don't serve either.
                            return;
                        }
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                }
                serve(&listener, &mut server, &flag);
            })
            .map_err(LifecycleError::Spawn)?;

        match ready_rx.recv_timeout(READY_TIMEOUT) {
            Ok(Ok(local_addr)) => Ok(Self {
                worker,
                shutdown,
                local_addr,
            }),
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(LifecycleError::Bind(e))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                let _ = worker.join();
                Err(LifecycleError::Aborted)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => Err(LifecycleError::StartTimeout(READY_TIMEOUT)),
        }
    }

    /// Starts a server from a textual port.
    pub fn start_str<M, S>(port: &str, metadata: M, switch: S) -> Result<Self, LifecycleError>
    where
        M: MetadataLookup + Send + 'static,
        S: SwitchApi + Send + 'static,
    {
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| LifecycleError::InvalidPort(port.to_string()))?;
        Self::start(port, metadata, switch)
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops the worker and waits for it to finish.
    pub fn stop(self) -> Result<(), LifecycleError> {
        info!("stopping server at {}", self.local_addr);
        self.shutdown.store(true, Ordering::SeqCst);

        // Unpark a blocked accept; the worker sees the flag and exits.
        if let Err(e) = TcpStream::connect(self.local_addr) {
            debug!("shutdown wake connection failed: {e:?}");
        }

        self.worker.join().map_err(|_| LifecycleError::Join)
    }
}

fn bind(port: u16) -> io::Result<TcpListener> {
    TcpListener::bind((Ipv4Addr::LOCALHOST, port))
}

fn serve<M: MetadataLookup, S: SwitchApi>(
    listener: &TcpListener,
    server: &mut RpcServer<M, S>,
    shutdown: &AtomicBool,
) {
    loop {
        match listener.accept() {
            Ok((stream, peer)) => {
                if shutdown.load(Ordering::SeqCst) {
                    break;
                }
                debug!("accepted connection from {peer}");
                if let Err(e) = stream.set_read_timeout(Some(READ_POLL)) {
                    warn!("failed to set read timeout for {peer}: {e:?}");
                    continue;
                }
                if let Err(e) = server.handle_connection(stream, shutdown) {
                    warn!("broken connection from {peer}: {e:?}");
                }
            }
            Err(e) => {
                if shutdown.load(Ordering::SeqCst) {
                    break;
                }
                warn!("broken connection: {e:?}");
            }
        }
    }
    info!("server worker exiting");
}

#[cfg(test)]
mod tests {
    use std::net::TcpStream;

    use super::*;
    use crate::{
        attr::{ValueKind, WireAttribute, WireValue, metadata::AttrRegistry},
        protocol::{ProtocolTransport, Request, Response},
        switch::SoftSwitch,
    };

    fn registry() -> AttrRegistry {
        let mut registry = AttrRegistry::new();
        registry.register(1, 1, ValueKind::Bool).register(1, 2, ValueKind::Mac);
        registry
    }

    #[test]
    fn connect_succeeds_immediately_after_start() {
        let handle = ServerHandle::start(0, registry(), SoftSwitch::new()).unwrap();
        // No retry loop: if start returned, the listener is bound.
        let stream = TcpStream::connect(handle.local_addr()).unwrap();
        drop(stream);
        handle.stop().unwrap();
    }

    #[test]
    fn requests_round_trip_over_tcp() {
        let handle = ServerHandle::start(0, registry(), SoftSwitch::new()).unwrap();

        let stream = TcpStream::connect(handle.local_addr()).unwrap();
        let mut transport = ProtocolTransport::new(stream);

        transport.write_request(Request::Ping).unwrap();
        assert_eq!(transport.read_response().unwrap(), Response::Pong);

        transport
            .write_request(Request::Create {
                object_type: 1,
                attrs: vec![WireAttribute {
                    id: 2,
                    value: WireValue::Mac("aa:bb:cc:dd:ee:ff".to_string()),
                }],
            })
            .unwrap();
        let oid = match transport.read_response().unwrap() {
            Response::Created { oid } => oid,
            other => panic!("unexpected response {other:?}"),
        };

        transport
            .write_request(Request::Get {
                object_type: 1,
                oid,
                attr_ids: vec![2],
            })
            .unwrap();
        assert_eq!(
            transport.read_response().unwrap(),
            Response::Attrs {
                attrs: vec![WireAttribute {
                    id: 2,
                    value: WireValue::Mac("aa:bb:cc:dd:ee:ff".to_string()),
                }],
            }
        );

        transport.write_request(Request::CloseConnection).unwrap();
        assert_eq!(
            transport.read_response().unwrap(),
            Response::ConnectionClosed
        );

        handle.stop().unwrap();
    }

    #[test]
    fn slow_frame_straddling_the_read_poll_gets_answered() {
        use std::io::Write;

        let handle = ServerHandle::start(0, registry(), SoftSwitch::new()).unwrap();
        let mut stream = TcpStream::connect(handle.local_addr()).unwrap();

        let config = bincode::config::standard()
            .with_big_endian()
            .with_fixed_int_encoding();
        let bytes = bincode::encode_to_vec(Request::Ping, config).unwrap();

        // Deliver the frame in two segments further apart than the
        // shutdown-poll interval; the pause fires at least one read
        // timeout mid-frame on the server side.
        let (head, tail) = bytes.split_at(2);
        stream.write_all(head).unwrap();
        std::thread::sleep(READ_POLL * 3);
        stream.write_all(tail).unwrap();

        let mut transport = ProtocolTransport::new(stream);
        assert_eq!(transport.read_response().unwrap(), Response::Pong);

        handle.stop().unwrap();
    }

    #[test]
    fn stop_terminates_worker_with_idle_connection_open() {
        let handle = ServerHandle::start(0, registry(), SoftSwitch::new()).unwrap();
        // An idle peer must not stall shutdown.
        let _idle = TcpStream::connect(handle.local_addr()).unwrap();
        handle.stop().unwrap();
    }

    #[test]
    fn double_bind_fails_start() {
        let first = ServerHandle::start(0, registry(), SoftSwitch::new()).unwrap();
        let port = first.local_addr().port();
        let second = ServerHandle::start(port, registry(), SoftSwitch::new());
        assert!(matches!(second, Err(LifecycleError::Bind(_))));
        first.stop().unwrap();
    }

    #[test]
    fn invalid_port_text_is_rejected() {
        let err =
            ServerHandle::start_str("not-a-port", registry(), SoftSwitch::new()).unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidPort(_)));
    }
}
