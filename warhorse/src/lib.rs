//!Client core for the Warhorse social backend.
//!
//!A [`Client`] owns one connection to a Warhorse server. It runs the login
//!handshake and queues everything the server sends as [`Event`]s, each
//!carrying the JSON payload as text.
//!
//!```no_run
//!use warhorse::{Client, EventKind};
//!
//!let mut client = Client::open("tcp:127.0.0.1:3000")?;
//!
//!while !client.state().is_terminal() {
//!    for event in client.poll(64)? {
//!        match event.kind() {
//!            EventKind::Hello => {
//!                client.login("alice", "password");
//!            }
//!            EventKind::LoggedIn => println!("logged in as {}", event.payload()),
//!            EventKind::Error => eprintln!("error: {}", event.payload()),
//!            kind => println!("{}: {}", kind, event.payload()),
//!        }
//!    }
//!    std::thread::sleep(std::time::Duration::from_millis(50));
//!}
//!client.close();
//!# Ok::<(), warhorse::Error>(())
//!```
//!
//!Events can also be pushed to application code, either on the caller's
//!thread with [`Client::dispatch`] or from a background thread with
//![`Client::listen`]:
//!
//!```no_run
//!use std::time::Duration;
//!use warhorse::{Client, EventKind, Handlers};
//!
//!let mut client = Client::open("tcp:127.0.0.1:3000")?;
//!let handlers = Handlers::new()
//!    .on(EventKind::Hello, |_, commands| {
//!        commands.login("alice", "password");
//!    })
//!    .on(EventKind::FriendsList, |event, _| println!("friends: {}", event.payload()));
//!client.listen(handlers, Duration::from_millis(50))?;
//!# Ok::<(), warhorse::Error>(())
//!```
//!
//!Supported addresses:
//!
//!- TCP `tcp:127.0.0.1:3000` or plain `127.0.0.1:3000`
//!- `http://localhost:3000` (the path is ignored)
//!- UNIX socket `unix:/run/warhorse.sock`

extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;

pub use crate::client::{Client, Commands};
pub use crate::config::ClientConfig;
pub use crate::dispatch::{EventHandler, Handlers};
pub use crate::error::{ConnectionError, Error, ProtocolError, Result, TransportError};
pub use crate::proto::{
    ChatChannel, Credentials, Language, LoginUserIdentity, RoomId, UserId, UserRegistration,
};
pub use crate::sansio::{ConnectionState, Event, EventKind};
pub use crate::stream::Stream;
pub use crate::transport::Transport;

mod client;
mod config;
mod dispatch;
mod error;
pub mod proto;
mod queue;
pub mod sansio;
mod stream;
mod transport;
