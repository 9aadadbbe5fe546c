//! Interactive command interpreter
// (c) 2026 The rfetch developers

use std::io::Write;
use std::str::FromStr;
use std::time::Instant;

use human_repr::{HumanCount as _, HumanDuration as _};
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _};
use tracing::debug;

use super::{Session, State};
use crate::cli::styles::{RESET, error, info, prompt, success};

const PROMPT: &str = "rfetch>";

const HELP: &str = "\
Commands (case-insensitive):
  OPEN <host> <port>        connect to a server
  GET <source> <dest>       fetch a file; <dest> is relative to the client root
  CLOSE                     close the connection
  EXIT                      close the connection (if open) and leave
  HELP                      show this message";

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString)]
#[strum(ascii_case_insensitive)]
enum Keyword {
    Open,
    Get,
    Close,
    #[strum(serialize = "exit", serialize = "quit")]
    Exit,
    #[strum(serialize = "help", serialize = "?")]
    Help,
}

/// A single line of user input, parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReplCommand {
    Open { host: String, port: u16 },
    Get { source: String, destination: String },
    Close,
    Exit,
    Help,
    /// A blank line
    Empty,
}

/// Reasons a line of user input could not be understood
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum ParseError {
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("invalid port {0:?}")]
    BadPort(String),
    #[error("unknown command {0:?}; type HELP for a list of commands")]
    Unknown(String),
}

impl FromStr for ReplCommand {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            return Ok(ReplCommand::Empty);
        };
        let keyword =
            Keyword::from_str(first).map_err(|_| ParseError::Unknown(first.to_owned()))?;
        let args: Vec<&str> = words.collect();
        match (keyword, args.as_slice()) {
            (Keyword::Open, [host, port]) => Ok(ReplCommand::Open {
                host: (*host).to_owned(),
                port: port
                    .parse()
                    .map_err(|_| ParseError::BadPort((*port).to_owned()))?,
            }),
            (Keyword::Open, _) => Err(ParseError::Usage("OPEN <host> <port>")),
            (Keyword::Get, [source, destination]) => Ok(ReplCommand::Get {
                source: (*source).to_owned(),
                destination: (*destination).to_owned(),
            }),
            (Keyword::Get, _) => Err(ParseError::Usage("GET <source> <dest>")),
            (Keyword::Close, []) => Ok(ReplCommand::Close),
            (Keyword::Close, _) => Err(ParseError::Usage("CLOSE")),
            (Keyword::Exit, _) => Ok(ReplCommand::Exit),
            (Keyword::Help, _) => Ok(ReplCommand::Help),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Runs the interpreter until EXIT or end of input.
///
/// Every failure is reported as a single line on `output`, after which the interpreter carries on.
///
/// # Return
/// `true` on a normal exit. Errors are returned only if `input` or `output` fail.
pub(crate) async fn run<I, O>(
    mut session: Session,
    mut input: I,
    mut output: O,
) -> anyhow::Result<bool>
where
    I: AsyncBufRead + Unpin,
    O: Write,
{
    loop {
        write!(output, "{PROMPT_STYLE}{PROMPT}{RESET} ", PROMPT_STYLE = prompt())?;
        output.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line).await? == 0 {
            // end of input
            writeln!(output)?;
            let _ = execute(&mut session, ReplCommand::Exit, &mut output).await?;
            return Ok(true);
        }
        let flow = match line.parse::<ReplCommand>() {
            Ok(command) => {
                debug!("command {command:?}");
                execute(&mut session, command, &mut output).await?
            }
            Err(e) => {
                report_error(&mut output, &e)?;
                Flow::Continue
            }
        };
        if flow == Flow::Exit {
            return Ok(true);
        }
    }
}

async fn execute<O: Write>(
    session: &mut Session,
    command: ReplCommand,
    output: &mut O,
) -> std::io::Result<Flow> {
    match command {
        ReplCommand::Empty => (),
        ReplCommand::Help => writeln!(output, "{HELP}")?,
        ReplCommand::Open { host, port } => match session.connect(&host, port).await {
            Ok(addr) => writeln!(
                output,
                "{INFO}Connected to {host} ({addr}){RESET}",
                INFO = info()
            )?,
            Err(e) => report_error(output, &e)?,
        },
        ReplCommand::Get {
            source,
            destination,
        } => {
            let start = Instant::now();
            match session.get(&source, &destination).await {
                Ok(size) => {
                    if !session.quiet() {
                        writeln!(
                            output,
                            "{SUCCESS}Fetched {source} ({size}) in {elapsed}{RESET}",
                            SUCCESS = success(),
                            size = size.human_count_bytes(),
                            elapsed = start.elapsed().human_duration(),
                        )?;
                    }
                }
                Err(e) => {
                    report_error(output, &e)?;
                    if session.state() == State::Disconnected {
                        writeln!(output, "Connection lost")?;
                    }
                }
            }
        }
        ReplCommand::Close => match session.close().await {
            Ok(()) => writeln!(output, "{INFO}Connection closed{RESET}", INFO = info())?,
            Err(e) => report_error(output, &e)?,
        },
        ReplCommand::Exit => {
            if session.state() == State::Connected {
                if let Err(e) = session.close().await {
                    report_error(output, &e)?;
                }
            }
            return Ok(Flow::Exit);
        }
    }
    Ok(Flow::Continue)
}

fn report_error<O: Write, E: std::fmt::Display>(output: &mut O, e: &E) -> std::io::Result<()> {
    writeln!(output, "{ERROR}Error:{RESET} {e}", ERROR = error())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod test {
    use assertables::{assert_contains, assert_not_contains};
    use indicatif::{MultiProgress, ProgressDrawTarget};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{ParseError, ReplCommand, run};
    use crate::client::Session;
    use crate::config::Configuration;
    use crate::server::Server;

    #[rstest]
    #[case("", ReplCommand::Empty)]
    #[case("   \t ", ReplCommand::Empty)]
    #[case("OPEN example.com 23657", ReplCommand::Open { host: "example.com".into(), port: 23657 })]
    #[case("open ::1 1", ReplCommand::Open { host: "::1".into(), port: 1 })]
    #[case("GET /a/b.txt  out.txt\r\n", ReplCommand::Get { source: "/a/b.txt".into(), destination: "out.txt".into() })]
    #[case("Close", ReplCommand::Close)]
    #[case("EXIT", ReplCommand::Exit)]
    #[case("quit", ReplCommand::Exit)]
    #[case("help", ReplCommand::Help)]
    #[case("?", ReplCommand::Help)]
    fn parse(#[case] line: &str, #[case] expected: ReplCommand) {
        assert_eq!(line.parse::<ReplCommand>().unwrap(), expected);
    }

    #[rstest]
    #[case("OPEN host", ParseError::Usage("OPEN <host> <port>"))]
    #[case("OPEN host 1 2", ParseError::Usage("OPEN <host> <port>"))]
    #[case("OPEN host port", ParseError::BadPort("port".into()))]
    #[case("OPEN host 65536", ParseError::BadPort("65536".into()))]
    #[case("GET a", ParseError::Usage("GET <source> <dest>"))]
    #[case("GET a b c", ParseError::Usage("GET <source> <dest>"))]
    #[case("CLOSE now", ParseError::Usage("CLOSE"))]
    #[case("PUT a b", ParseError::Unknown("PUT".into()))]
    fn parse_errors(#[case] line: &str, #[case] expected: ParseError) {
        assert_eq!(line.parse::<ReplCommand>().unwrap_err(), expected);
    }

    struct Dirs {
        server: tempfile::TempDir,
        client: tempfile::TempDir,
    }

    fn dirs() -> Dirs {
        let server = tempfile::tempdir().unwrap();
        std::fs::write(server.path().join("a.txt"), b"alpha").unwrap();
        Dirs {
            server,
            client: tempfile::tempdir().unwrap(),
        }
    }

    async fn interpret(dirs: &Dirs, script: &str, quiet: bool) -> String {
        let mut config = Configuration::system_default().clone();
        config.client_root = dirs.client.path().to_owned();
        let display = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let session = Session::new(&config, display, quiet).unwrap();
        let mut output = Vec::new();
        assert!(run(session, script.as_bytes(), &mut output).await.unwrap());
        console::strip_ansi_codes(&String::from_utf8(output).unwrap()).to_string()
    }

    async fn start_server(dirs: &Dirs) -> u16 {
        let addr = "127.0.0.1:0".parse().unwrap();
        let server = Server::bind(addr, dirs.server.path(), 4096).await.unwrap();
        let port = server.local_addr().unwrap().port();
        let _ = tokio::spawn(server.run());
        port
    }

    #[tokio::test]
    async fn whole_session() {
        let dirs = dirs();
        let port = start_server(&dirs).await;
        let script = format!(
            "open 127.0.0.1 {port}\nGET a.txt copy.txt\nGET nope x\nclose\nexit\nGET a.txt unreached\n"
        );
        let out = interpret(&dirs, &script, false).await;
        assert_contains!(out, "rfetch> ");
        assert_contains!(out, "Connected to 127.0.0.1");
        assert_contains!(out, "Fetched a.txt (");
        assert_contains!(out, "Error: nope: not found on server");
        assert_contains!(out, "Connection closed");
        assert_eq!(std::fs::read(dirs.client.path().join("copy.txt")).unwrap(), b"alpha");
        assert!(!dirs.client.path().join("x").exists());
        assert!(!dirs.client.path().join("unreached").exists());
    }

    #[tokio::test]
    async fn errors_do_not_stop_the_loop() {
        let dirs = dirs();
        let out = interpret(&dirs, "GET a b\nCLOSE\nFROB\nOPEN x\nhelp\n", false).await;
        assert_contains!(out, "Error: not connected");
        assert_contains!(out, "Error: unknown command \"FROB\"");
        assert_contains!(out, "Error: usage: OPEN <host> <port>");
        assert_contains!(out, "OPEN <host> <port>        connect to a server");
    }

    #[tokio::test]
    async fn end_of_input_closes_the_connection() {
        let dirs = dirs();
        let port = start_server(&dirs).await;
        let script = format!("OPEN 127.0.0.1 {port}\nGET a.txt a.txt\n");
        let out = interpret(&dirs, &script, true).await;
        assert_not_contains!(out, "Fetched");
        assert_not_contains!(out, "Error");
        assert_eq!(std::fs::read(dirs.client.path().join("a.txt")).unwrap(), b"alpha");
    }

    #[tokio::test]
    async fn open_twice_is_refused() {
        let dirs = dirs();
        let port = start_server(&dirs).await;
        let script = format!("OPEN 127.0.0.1 {port}\nOPEN 127.0.0.1 {port}\nGET a.txt a.txt\n");
        let out = interpret(&dirs, &script, false).await;
        assert_contains!(out, "Error: already connected");
        assert_contains!(out, "Fetched a.txt");
    }
}
