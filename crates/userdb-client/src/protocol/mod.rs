//! Varlink call and reply shapes for the `io.systemd.UserDatabase` interface.
//!
//! Requests are a single JSON object terminated by a NUL byte. Replies arrive
//! as a stream of NUL-terminated objects; [`Reply::decode`] handles one of
//! them and [`Reply::disposition`] tells the dispatcher what to do with it.

use std::fmt;

use crate::json::{self, JsonError, Object, ObjectExt, ObjectWriter};


/// Interface namespace shared by every method and error code.
pub const USERDB_NAMESPACE: &str = "io.systemd.UserDatabase";

/// Service name that fans queries out to every registered provider.
pub const MULTIPLEXER_SERVICE: &str = "io.systemd.Multiplexer";

/// Well-known path of the multiplexer socket.
pub const DEFAULT_SERVICE_SOCKET: &str = "/run/systemd/userdb/io.systemd.Multiplexer";

/// Error reported when no provider knows the requested record.
pub const ERROR_NO_RECORD_FOUND: &str = "io.systemd.UserDatabase.NoRecordFound";

/// Error reported when the multiplexer cannot serve the request at all.
pub const ERROR_SERVICE_NOT_AVAILABLE: &str = "io.systemd.UserDatabase.ServiceNotAvailable";

/// Methods of the userdb interface this crate calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Fetches one group record by name or gid.
    GetGroupRecord,
    /// Fetches one user record by name or uid.
    GetUserRecord,
    /// Streams `(userName, groupName)` membership pairs.
    GetMemberships,
}

impl Method {
    /// Unqualified method name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetGroupRecord => "GetGroupRecord",
            Self::GetUserRecord => "GetUserRecord",
            Self::GetMemberships => "GetMemberships",
        }
    }

    /// Method name qualified with the interface namespace.
    #[must_use]
    pub fn qualified_name(self) -> String {
        format!("{USERDB_NAMESPACE}.{}", self.name())
    }
}

impl fmt::Display for Method {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

/// The single record key a call filters on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `uid`
    Uid(i64),
    /// `userName`
    UserName(String),
    /// `gid`
    Gid(i64),
    /// `groupName`
    GroupName(String),
}

/// One outgoing method call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    method: Method,
    selector: Selector,
    more: bool,
}

impl Call {
    /// Builds a call that expects a single reply.
    #[must_use]
    pub const fn new(method: Method, selector: Selector) -> Self {
        Self {
            method,
            selector,
            more: false,
        }
    }

    /// Builds a call that asks the service to stream every matching reply.
    #[must_use]
    pub const fn streaming(method: Method, selector: Selector) -> Self {
        Self {
            method,
            selector,
            more: true,
        }
    }

    /// Method invoked by this call.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Whether the call requested a reply stream.
    #[must_use]
    pub const fn more(&self) -> bool {
        self.more
    }

    /// Serialises the call into request bytes, including the NUL terminator.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let service = ObjectWriter::new().string("service", MULTIPLEXER_SERVICE);
        let parameters = match &self.selector {
            Selector::Uid(uid) => service.int("uid", *uid),
            Selector::UserName(name) => service.string("userName", name),
            Selector::Gid(gid) => service.int("gid", *gid),
            Selector::GroupName(name) => service.string("groupName", name),
        };

        let mut call = ObjectWriter::new()
            .string("method", &self.method.qualified_name())
            .raw("parameters", &parameters.finish());
        if self.more {
            call = call.bool("more", true);
        }

        let mut request = call.finish().into_bytes();
        request.push(0);
        request
    }
}

/// One decoded reply message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    /// Qualified error code, when the message reports one.
    pub error: Option<String>,
    /// Set when more messages follow for the same call.
    pub continues: bool,
    /// Method output; empty when the message carried none.
    pub parameters: Object,
}

/// What the dispatcher does with a decoded [`Reply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyDisposition<'a> {
    /// Keep the parameters.
    Accept,
    /// Drop this message and carry on with the stream.
    Skip,
    /// Abandon the call; the service cannot answer it.
    Unavailable,
    /// Abandon the call with the given error code.
    Fail(&'a str),
}

impl Reply {
    /// Decodes one message without its NUL terminator.
    ///
    /// Members with unexpected types are ignored, as are unknown members.
    ///
    /// # Errors
    ///
    /// Returns the parse error when the message is not a JSON object.
    pub fn decode(message: &[u8]) -> Result<Self, JsonError> {
        let (mut object, _) = json::parse_object(message)?;
        let error = object.get_as::<&str>("error").map(String::from);
        let continues = object.get_as::<bool>("continues").unwrap_or(false);
        let parameters = match object.remove("parameters") {
            Some(json::Value::Object(parameters)) => parameters,
            _ => Object::new(),
        };
        Ok(Self {
            error,
            continues,
            parameters,
        })
    }

    /// Classifies the message's error code.
    #[must_use]
    pub fn disposition(&self) -> ReplyDisposition<'_> {
        match self.error.as_deref() {
            None | Some("") => ReplyDisposition::Accept,
            Some(ERROR_NO_RECORD_FOUND) => ReplyDisposition::Skip,
            Some(ERROR_SERVICE_NOT_AVAILABLE) => ReplyDisposition::Unavailable,
            Some(code) => ReplyDisposition::Fail(code),
        }
    }
}
