// (c) 2026 The rfetch developers
//! Request lines (client ➡️ server)

use tokio::io::AsyncWriteExt as _;

use super::ProtocolError;
use super::common::{ReceivingStream, SendingStream, read_line_limited, strip_terminator};

/// The longest request line the server will accept, including its terminator
pub const MAX_REQUEST_LINE: usize = 4096;

/// The commands the server understands.
///
/// Matching is case-sensitive; `get` is not a command.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Verb {
    /// Retrieve a file
    Get,
    /// End the session
    Close,
}

/// A single request line, decoded into its parts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    /// The first token on the line. This may be empty, or may not be a known [`Verb`].
    pub command: String,
    /// Any further tokens
    pub args: Vec<String>,
}

impl Request {
    /// Constructor.
    ///
    /// The command and arguments are checked for encodability:
    /// none may be empty, or contain a space or a line terminator.
    pub fn new<C, I, A>(command: C, args: I) -> Result<Self, ProtocolError>
    where
        C: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        let command = check_token(command.into())?;
        let args = args
            .into_iter()
            .map(|a| check_token(a.into()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { command, args })
    }

    /// Convenience constructor for a GET request
    pub fn get(path: &str) -> Result<Self, ProtocolError> {
        Self::new(Verb::Get.to_string(), [path])
    }

    /// Convenience constructor for a CLOSE request
    #[must_use]
    pub fn close() -> Self {
        Self {
            command: Verb::Close.to_string(),
            args: Vec::new(),
        }
    }

    /// Decodes a request line.
    ///
    /// One trailing line terminator (`\n` or `\r\n`) is removed, then the line is split on single spaces.
    /// Empty tokens at the end of the line are discarded.
    /// This never fails; an empty line decodes to an empty command.
    #[must_use]
    pub fn decode(line: &str) -> Self {
        let mut tokens: Vec<String> = strip_terminator(line)
            .split(' ')
            .map(str::to_owned)
            .collect();
        while tokens.last().is_some_and(String::is_empty) {
            let _ = tokens.pop();
        }
        let mut tokens = tokens.into_iter();
        let command = tokens.next().unwrap_or_default();
        Self {
            command,
            args: tokens.collect(),
        }
    }

    /// Encodes this request as a line, including its terminator
    #[must_use]
    pub fn encode(&self) -> String {
        let mut line = self.command.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line.push('\n');
        line
    }

    /// Returns the command as a [`Verb`], if it is one
    #[must_use]
    pub fn verb(&self) -> Option<Verb> {
        self.command.parse().ok()
    }

    /// Sends this request and flushes the stream
    pub async fn write_to<W: SendingStream>(&self, send: &mut W) -> std::io::Result<()> {
        send.write_all(self.encode().as_bytes()).await?;
        send.flush().await
    }

    /// Reads and decodes the next request line.
    ///
    /// # Return
    /// `Ok(None)` if the peer closed the stream cleanly between requests.
    pub async fn read_from<R: ReceivingStream>(
        recv: &mut R,
    ) -> Result<Option<Self>, ProtocolError> {
        Ok(read_line_limited(recv, MAX_REQUEST_LINE)
            .await?
            .map(|line| Self::decode(&line)))
    }
}

fn check_token(token: String) -> Result<String, ProtocolError> {
    if token.is_empty() || token.contains([' ', '\r', '\n']) {
        return Err(ProtocolError::UnencodableArgument(token));
    }
    Ok(token)
}
