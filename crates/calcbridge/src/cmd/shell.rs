use std::io::{BufRead, ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use calcbridge_transport::TcpMedium;

use crate::cmd::{parse_duration, ShellArgs};
use crate::exit::{io_error, transport_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};

/// How long a single response poll waits before giving the prompt back.
const RESPONSE_POLL: Duration = Duration::from_millis(100);

#[derive(Debug)]
struct Credentials {
    calc_id: String,
    username: String,
    token: String,
}

impl Credentials {
    fn from_args(args: &ShellArgs) -> CliResult<Self> {
        match (&args.calc_id, &args.username, &args.token) {
            (Some(calc_id), Some(username), Some(token)) => Ok(Self {
                calc_id: calc_id.clone(),
                username: username.clone(),
                token: token.clone(),
            }),
            _ => Err(CliError::new(
                USAGE,
                "missing credentials: set CALC_ID, USERNAME and TOKEN \
                 (or pass --calc-id, --username, --token)",
            )),
        }
    }

    fn login_frame(&self) -> String {
        format!("LOGIN:{}:{}:{}", self.calc_id, self.username, self.token)
    }
}

/// Server replies the shell knows how to label.
#[derive(Debug, PartialEq, Eq)]
enum Response {
    RtcChat(String),
    Pong,
    Other(String),
}

fn classify_response(text: &str) -> Response {
    if let Some(message) = text.strip_prefix("RTC_CHAT:") {
        Response::RtcChat(message.to_string())
    } else if text == "SERVER_PONG" {
        Response::Pong
    } else {
        Response::Other(text.to_string())
    }
}

pub fn run(args: ShellArgs) -> CliResult<i32> {
    let credentials = Credentials::from_args(&args)?;
    let connect_timeout = parse_duration(&args.connect_timeout)?;
    let addr = format!("{}:{}", args.address, args.port);

    println!("Connecting to {addr} ...");
    let mut sock = TcpMedium::connect(&addr, connect_timeout, RESPONSE_POLL)
        .map_err(|err| transport_error("connect failed", err))?;
    println!("Connected.");

    login(&mut sock, &credentials, connect_timeout)?;
    println!("Logged in as {}.", credentials.username);
    println!("Type your commands, and press Enter to send. '?' lists local commands.");

    prompt_loop(&mut sock)?;
    println!("Socket connection closed.");
    Ok(SUCCESS)
}

fn login(sock: &mut TcpMedium, credentials: &Credentials, timeout: Duration) -> CliResult<()> {
    send(sock, b"SERIAL_CONNECTED")?;
    await_reply(sock, timeout)?;

    send(sock, credentials.login_frame().as_bytes())?;
    let reply = await_reply(sock, timeout)?;
    if reply != "LOGIN_SUCCESS" {
        return Err(CliError::new(FAILURE, format!("login failed: {reply}")));
    }
    Ok(())
}

fn prompt_loop(sock: &mut TcpMedium) -> CliResult<()> {
    let stdin = std::io::stdin();
    let mut line = String::new();

    loop {
        print!(">>> ");
        std::io::stdout()
            .flush()
            .map_err(|err| io_error("prompt write failed", err))?;

        line.clear();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .map_err(|err| io_error("stdin read failed", err))?;
        if read == 0 {
            break;
        }

        let input = line.trim();
        if input.is_empty() {
            println!("Please enter a command.");
            continue;
        }

        match input.to_lowercase().as_str() {
            "exit" => break,
            "clear" => print!("\x1b[2J\x1b[1;1H"),
            "?" => print_help(),
            _ => {
                send(sock, input.as_bytes())?;
                poll_response(sock)?;
            }
        }
    }
    Ok(())
}

fn print_help() {
    println!("Available commands:");
    println!("?     - Show this list of local commands.");
    println!("exit  - Quit the shell.");
    println!("clear - Clear the terminal screen.");
    println!("Anything else is sent to the server verbatim.");
}

fn send(sock: &mut TcpMedium, bytes: &[u8]) -> CliResult<()> {
    sock.write_all(bytes)
        .and_then(|()| sock.flush())
        .map_err(|err| io_error("send failed", err))
}

/// Poll once for a response and print it; silence within the poll window
/// is normal.
fn poll_response(sock: &mut TcpMedium) -> CliResult<()> {
    let mut buf = [0u8; 4096];
    match sock.read(&mut buf) {
        Ok(0) => Err(CliError::new(FAILURE, "server closed the connection")),
        Ok(n) => {
            let text = String::from_utf8_lossy(&buf[..n]);
            match classify_response(text.trim()) {
                Response::RtcChat(message) => println!("Received RTC_CHAT: {message}"),
                Response::Pong => println!("Received SERVER_PONG"),
                Response::Other(message) => println!("Received: {message}"),
            }
            Ok(())
        }
        Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => Ok(()),
        Err(err) => Err(io_error("receive failed", err)),
    }
}

/// Keep polling until the server says something or the timeout elapses.
/// Login replies come through here; the server answers on its own clock.
fn await_reply(sock: &mut TcpMedium, timeout: Duration) -> CliResult<String> {
    let deadline = Instant::now() + timeout;
    let mut buf = [0u8; 4096];
    loop {
        match sock.read(&mut buf) {
            Ok(0) => return Err(CliError::new(FAILURE, "server closed the connection")),
            Ok(n) => return Ok(String::from_utf8_lossy(&buf[..n]).trim().to_string()),
            Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                if Instant::now() >= deadline {
                    return Err(CliError::new(
                        crate::exit::TIMEOUT,
                        "timed out waiting for server reply",
                    ));
                }
            }
            Err(err) => return Err(io_error("receive failed", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_chat_pong_and_plain_responses() {
        assert_eq!(
            classify_response("RTC_CHAT:alice: hi"),
            Response::RtcChat("alice: hi".to_string())
        );
        assert_eq!(classify_response("SERVER_PONG"), Response::Pong);
        assert_eq!(
            classify_response("MAIL:2"),
            Response::Other("MAIL:2".to_string())
        );
    }

    #[test]
    fn missing_credentials_is_a_usage_error() {
        let args = ShellArgs {
            address: "localhost".to_string(),
            port: 2052,
            calc_id: Some("id".to_string()),
            username: None,
            token: Some("t".to_string()),
            connect_timeout: "10s".to_string(),
        };
        let err = Credentials::from_args(&args).unwrap_err();
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn login_frame_is_colon_separated() {
        let credentials = Credentials {
            calc_id: "cid".to_string(),
            username: "user".to_string(),
            token: "tok".to_string(),
        };
        assert_eq!(credentials.login_frame(), "LOGIN:cid:user:tok");
    }
}
