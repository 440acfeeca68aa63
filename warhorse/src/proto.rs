//! Request payloads understood by the Warhorse backend.

use serde_json::Value;
use std::fmt;

pub type UserId = String;
pub type RoomId = String;

// Request methods, named from the client's perspective.
pub const METHOD_USER_LOGIN: &str = "/user/login";
pub const METHOD_USER_REGISTER: &str = "/user/register";
pub const METHOD_USER_LOGOUT: &str = "/user/logout";
pub const METHOD_USER_BLOCK: &str = "/user/block";
pub const METHOD_USER_UNBLOCK: &str = "/user/unblock";
pub const METHOD_FRIEND_REQUEST: &str = "/friend/request";
pub const METHOD_FRIEND_REQUEST_ACCEPT: &str = "/friend/request/accept";
pub const METHOD_FRIEND_REQUEST_REJECT: &str = "/friend/request/reject";
pub const METHOD_FRIEND_REMOVE: &str = "/friend/remove";
pub const METHOD_CHAT_SEND: &str = "/chat/send";

// Server events.
pub const EVENT_HELLO: &str = "/hello";
pub const EVENT_LOGGED_IN: &str = "/user/logged_in";
pub const EVENT_ERROR: &str = "/error";
pub const EVENT_FRIEND_REQUESTS: &str = "/friend_requests/receive";
pub const EVENT_FRIENDS: &str = "/friends/receive";
pub const EVENT_BLOCKED_USERS: &str = "/blocked_users/receive";
pub const EVENT_FRIEND_REQUEST_ACCEPTED: &str = "/friend_request/accepted";
pub const EVENT_CHAT_MESSAGE: &str = "/chat/receive";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Spanish,
    French,
}

/// A user may log in with either their account name or email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoginUserIdentity {
    AccountName(String),
    Email(String),
}

impl LoginUserIdentity {
    /// Anything that looks like an address is sent as an email identity.
    pub fn from_username(username: &str) -> Self {
        if username.contains('@') {
            LoginUserIdentity::Email(username.into())
        } else {
            LoginUserIdentity::AccountName(username.into())
        }
    }
}

/// Username and password for a single login attempt.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct UserLogin {
    pub language: Language,
    pub identity: LoginUserIdentity,
    pub password: String,
}

impl UserLogin {
    pub fn new(language: Language, credentials: Credentials) -> Self {
        UserLogin {
            language,
            identity: LoginUserIdentity::from_username(&credentials.username),
            password: credentials.password,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserRegistration {
    pub language: Language,
    pub account_name: String,
    pub email: String,
    pub display_name: String,
    pub password: String,
}

/// Parameters shared by the friend management requests.
#[derive(Debug, Serialize)]
pub struct FriendAction {
    pub language: Language,
    pub friend_id: UserId,
}

/// Parameters shared by block and unblock.
#[derive(Debug, Serialize)]
pub struct UserAction {
    pub language: Language,
    pub user_id: UserId,
}

/// A chat channel is either a room or a private conversation with a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ChatChannel {
    Room(RoomId),
    PrivateMessage(UserId),
}

#[derive(Debug, Serialize)]
pub struct SendChatMessage {
    pub language: Language,
    pub channel: ChatChannel,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct Logout {
    pub language: Language,
}

/// Serialize request parameters.
pub(crate) fn to_parameters<T: serde::Serialize>(request: &T) -> serde_json::Result<Value> {
    serde_json::to_value(request)
}
