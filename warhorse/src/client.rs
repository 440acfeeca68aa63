//! The session handle an embedding application owns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, info};

use crate::config::ClientConfig;
use crate::dispatch::EventHandler;
use crate::error::{ConnectionError, ProtocolError, Result, TransportError};
use crate::proto::*;
use crate::queue::EventQueue;
use crate::sansio::{ConnectionState, Event, Session};
use crate::transport::Transport;

/// Transport, session and queue of one connection.
struct Core {
    transport: Transport,
    session: Session,
    queue: EventQueue,
}

impl Core {
    /// Move whatever has arrived into the queue, up to the high-water mark.
    fn ingest(&mut self) -> usize {
        if self.session.state().is_terminal() {
            return 0;
        }

        if self.transport.pending_output() > 0 {
            if let Err(e) = self.transport.flush() {
                self.fail(e);
                return 0;
            }
        }

        let frames = match self.transport.receive_available(self.queue.room()) {
            Ok(frames) => frames,
            Err(e) => {
                self.fail(e);
                return 0;
            }
        };

        let total = frames.len();
        let mut ingested = 0;
        for frame in frames {
            let event = self.session.handle_frame(frame);
            self.queue.enqueue(event);
            ingested += 1;
            if self.session.state().is_terminal() {
                if total > ingested {
                    debug!(discarded = total - ingested, "Frames after session end");
                }
                self.transport.close();
                break;
            }
        }
        ingested
    }

    /// Hand every queued request to the transport without waiting for the
    /// socket. A failed write ends the session.
    fn flush(&mut self) -> Result<()> {
        while let Some(transmit) = self.session.poll_transmit() {
            debug!(method = transmit.method, "Sending request");
            if let Err(e) = self.transport.send(&transmit.payload) {
                error!(method = transmit.method, error = %e, "Failed to send request");
                self.fail(e.clone());
                return Err(e.into());
            }
        }
        Ok(())
    }

    fn fail(&mut self, error: TransportError) {
        if let Some(event) = self.session.fail(&error) {
            self.queue.enqueue(event);
        }
        self.transport.close();
    }

    fn check_open(&self) -> Result<()> {
        if self.session.state() == ConnectionState::Closed {
            return Err(ProtocolError::Closed.into());
        }
        Ok(())
    }

    fn close(&mut self) {
        self.session.close();
        self.transport.close();
        self.queue.clear();
    }
}

/// Requests that can be issued on a session, including from inside an
/// [`EventHandler`] while events are being dispatched.
pub struct Commands<'a> {
    core: &'a mut Core,
}

impl<'a> Commands<'a> {
    fn new(core: &'a mut Core) -> Self {
        Commands { core }
    }

    pub fn state(&self) -> ConnectionState {
        self.core.session.state()
    }

    /// True iff the greeting was seen and no login request has been sent.
    pub fn is_ready_for_login(&self) -> bool {
        self.core.session.is_ready_for_login()
    }

    /// Send the login request. Returns whether it was sent; the outcome
    /// arrives later as a `LoggedIn` or `Error` event.
    pub fn login(&mut self, username: &str, password: &str) -> bool {
        match self.try_login(Credentials::new(username, password)) {
            Ok(()) => {
                info!(%username, "Attempting to login to Warhorse");
                true
            }
            Err(e) => {
                debug!(%username, error = %e, "Login not sent");
                false
            }
        }
    }

    /// Like [`login`](Commands::login), but tells why the request was not sent.
    pub fn try_login(&mut self, credentials: Credentials) -> Result<()> {
        self.core.check_open()?;
        self.core.session.send_login(credentials)?;
        self.core.flush()
    }

    /// Register a new account; the server logs it in on success.
    pub fn register(&mut self, registration: UserRegistration) -> Result<()> {
        self.core.check_open()?;
        self.core.session.send_registration(registration)?;
        self.core.flush()
    }

    pub fn logout(&mut self) -> Result<()> {
        let language = self.core.session.language();
        self.request(METHOD_USER_LOGOUT, to_parameters(&Logout { language })?)
    }

    pub fn send_friend_request(&mut self, friend_id: &str) -> Result<()> {
        self.friend_action(METHOD_FRIEND_REQUEST, friend_id)
    }

    pub fn accept_friend_request(&mut self, friend_id: &str) -> Result<()> {
        self.friend_action(METHOD_FRIEND_REQUEST_ACCEPT, friend_id)
    }

    pub fn reject_friend_request(&mut self, friend_id: &str) -> Result<()> {
        self.friend_action(METHOD_FRIEND_REQUEST_REJECT, friend_id)
    }

    pub fn remove_friend(&mut self, friend_id: &str) -> Result<()> {
        self.friend_action(METHOD_FRIEND_REMOVE, friend_id)
    }

    pub fn block_user(&mut self, user_id: &str) -> Result<()> {
        self.user_action(METHOD_USER_BLOCK, user_id)
    }

    pub fn unblock_user(&mut self, user_id: &str) -> Result<()> {
        self.user_action(METHOD_USER_UNBLOCK, user_id)
    }

    pub fn send_chat_message(&mut self, channel: ChatChannel, message: &str) -> Result<()> {
        let request = SendChatMessage {
            language: self.core.session.language(),
            channel,
            message: message.into(),
        };
        self.request(METHOD_CHAT_SEND, to_parameters(&request)?)
    }

    fn friend_action(&mut self, method: &'static str, friend_id: &str) -> Result<()> {
        let request = FriendAction {
            language: self.core.session.language(),
            friend_id: friend_id.into(),
        };
        self.request(method, to_parameters(&request)?)
    }

    fn user_action(&mut self, method: &'static str, user_id: &str) -> Result<()> {
        let request = UserAction {
            language: self.core.session.language(),
            user_id: user_id.into(),
        };
        self.request(method, to_parameters(&request)?)
    }

    fn request(&mut self, method: &'static str, parameters: Value) -> Result<()> {
        self.core.check_open()?;
        self.core.session.send_request(method, parameters)?;
        self.core.flush()
    }
}

struct Shared {
    core: Mutex<Core>,
    stop: AtomicBool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A Warhorse session.
///
/// Created connected by [`open`](Client::open); the connection is released
/// by [`close`](Client::close) or when the client is dropped.
///
/// # Example
///
/// ```no_run
/// use warhorse::{Client, EventKind};
///
/// let client = warhorse::Client::open("tcp:127.0.0.1:3000")?;
/// loop {
///     for event in client.poll(32)? {
///         match event.kind() {
///             EventKind::Hello => {
///                 client.login("alice", "password");
///             }
///             EventKind::FriendsList => println!("friends: {}", event.payload()),
///             _ => {}
///         }
///     }
///     std::thread::sleep(std::time::Duration::from_millis(100));
/// }
/// # Ok::<(), warhorse::Error>(())
/// ```
pub struct Client {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl Client {
    /// Connect with the default configuration.
    pub fn open(address: &str) -> std::result::Result<Self, ConnectionError> {
        Self::open_with(address, ClientConfig::default())
    }

    pub fn open_with(
        address: &str,
        config: ClientConfig,
    ) -> std::result::Result<Self, ConnectionError> {
        let transport = Transport::connect(address, &config)?;
        Ok(Self::with_transport(transport, &config))
    }

    /// Build a client around an established transport.
    pub fn with_transport(transport: Transport, config: &ClientConfig) -> Self {
        let mut session = Session::new(config.language);
        session.connected();
        Client {
            shared: Arc::new(Shared {
                core: Mutex::new(Core {
                    transport,
                    session,
                    queue: EventQueue::new(config.high_water_mark),
                }),
                stop: AtomicBool::new(false),
            }),
            worker: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.lock().session.state()
    }

    /// True iff a Hello was received by an earlier poll and no login was sent.
    pub fn is_ready_for_login(&self) -> bool {
        self.shared.lock().session.is_ready_for_login()
    }

    /// Send the login request. Returns whether it was sent; the outcome
    /// arrives later as a `LoggedIn` or `Error` event.
    pub fn login(&self, username: &str, password: &str) -> bool {
        self.with_commands(|commands| commands.login(username, password))
    }

    pub fn try_login(&self, credentials: Credentials) -> Result<()> {
        self.with_commands(|commands| commands.try_login(credentials))
    }

    /// Take up to `max_events` events, oldest first. Never waits for the network.
    pub fn poll(&self, max_events: usize) -> Result<Vec<Event>> {
        let mut core = self.shared.lock();
        core.check_open()?;
        core.ingest();
        Ok(core.queue.drain(max_events))
    }

    /// Poll and hand each event to `handler`. Returns the number dispatched.
    pub fn dispatch<H>(&self, handler: &mut H, max_events: usize) -> Result<usize>
    where
        H: EventHandler + ?Sized,
    {
        let mut core = self.shared.lock();
        core.check_open()?;
        core.ingest();
        let events = core.queue.drain(max_events);
        let count = events.len();
        for event in events {
            handler.handle_event(event, &mut Commands::new(&mut core));
        }
        Ok(count)
    }

    /// Run `f` with exclusive access to the session's requests.
    pub fn with_commands<R>(&self, f: impl FnOnce(&mut Commands<'_>) -> R) -> R {
        let mut core = self.shared.lock();
        f(&mut Commands::new(&mut core))
    }

    pub fn register(&self, registration: UserRegistration) -> Result<()> {
        self.with_commands(|commands| commands.register(registration))
    }

    pub fn logout(&self) -> Result<()> {
        self.with_commands(|commands| commands.logout())
    }

    pub fn send_friend_request(&self, friend_id: &str) -> Result<()> {
        self.with_commands(|commands| commands.send_friend_request(friend_id))
    }

    pub fn accept_friend_request(&self, friend_id: &str) -> Result<()> {
        self.with_commands(|commands| commands.accept_friend_request(friend_id))
    }

    pub fn reject_friend_request(&self, friend_id: &str) -> Result<()> {
        self.with_commands(|commands| commands.reject_friend_request(friend_id))
    }

    pub fn remove_friend(&self, friend_id: &str) -> Result<()> {
        self.with_commands(|commands| commands.remove_friend(friend_id))
    }

    pub fn block_user(&self, user_id: &str) -> Result<()> {
        self.with_commands(|commands| commands.block_user(user_id))
    }

    pub fn unblock_user(&self, user_id: &str) -> Result<()> {
        self.with_commands(|commands| commands.unblock_user(user_id))
    }

    pub fn send_chat_message(&self, channel: ChatChannel, message: &str) -> Result<()> {
        self.with_commands(|commands| commands.send_chat_message(channel, message))
    }

    /// Ingest frames on a background thread every `interval`; events wait
    /// in the queue for [`poll`](Client::poll).
    pub fn spawn_ingest(&mut self, interval: Duration) -> Result<()> {
        self.spawn_worker(None, interval)
    }

    /// Ingest on a background thread and hand every event to `handler` as
    /// it arrives.
    pub fn listen<H>(&mut self, handler: H, interval: Duration) -> Result<()>
    where
        H: EventHandler + Send + 'static,
    {
        self.spawn_worker(Some(Box::new(handler)), interval)
    }

    fn spawn_worker(
        &mut self,
        mut handler: Option<Box<dyn EventHandler + Send>>,
        interval: Duration,
    ) -> Result<()> {
        self.shared.lock().check_open()?;
        self.stop_worker();
        self.shared.stop.store(false, Ordering::SeqCst);

        let shared = self.shared.clone();
        let worker = thread::Builder::new()
            .name("warhorse-ingest".into())
            .spawn(move || loop {
                {
                    let mut core = shared.lock();
                    if shared.stop.load(Ordering::SeqCst)
                        || core.session.state() == ConnectionState::Closed
                    {
                        break;
                    }
                    core.ingest();
                    if let Some(handler) = handler.as_mut() {
                        let events = core.queue.drain(usize::MAX);
                        for event in events {
                            handler.handle_event(event, &mut Commands::new(&mut core));
                        }
                    }
                }
                thread::park_timeout(interval);
            })?;

        self.worker = Some(worker);
        Ok(())
    }

    fn stop_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.shared.stop.store(true, Ordering::SeqCst);
            worker.thread().unpark();
            if worker.join().is_err() {
                error!("Ingest worker panicked");
            }
        }
    }

    /// End the session. Later calls fail with `ProtocolError::Closed`.
    /// Calling it again does nothing.
    pub fn close(&mut self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        {
            let mut core = self.shared.lock();
            if core.session.state() != ConnectionState::Closed {
                core.close();
            }
        }
        self.stop_worker();
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.close();
    }
}
