//! parley-ctl — command-line interface for the Parley daemon.

use anyhow::{Context, Result};

mod cmd;

use cmd::connect::cmd_connect;
use cmd::messages::{cmd_chat, cmd_send};
use cmd::peers::cmd_peers;
use cmd::status::{cmd_shutdown, cmd_status};

const DEFAULT_PORT: u16 = 4401;

fn print_usage() {
    println!("Usage: parley-ctl [--port <port>] <command>");
    println!();
    println!("Commands:");
    println!("  status                     Show daemon status");
    println!("  peers                      List active peers");
    println!("  chat                       Show the chat history");
    println!("  send <target> <message>    Send a message (\"all\" or host:port)");
    println!("  connect <host> <port>      Connect to a peer");
    println!("  shutdown                   Stop the daemon");
    println!();
    println!("Options:");
    println!("  --port <port>   API endpoint port (default: {})", DEFAULT_PORT);
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Parse --port option
    let mut port = DEFAULT_PORT;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--port" {
            i += 1;
            port = args
                .get(i)
                .context("--port requires a value")?
                .parse()
                .context("--port must be a number")?;
        } else {
            remaining.push(&args[i]);
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["status"] | []                => cmd_status(port).await,
        ["peers"]                      => cmd_peers(port).await,
        ["chat"]                       => cmd_chat(port).await,
        ["send", target, rest @ ..] if !rest.is_empty() => {
            cmd_send(port, target, &rest.join(" ")).await
        }
        ["connect", host, peer_port]   => {
            let peer_port = peer_port.parse().context("port must be a number")?;
            cmd_connect(port, host, peer_port).await
        }
        ["shutdown"]                   => cmd_shutdown(port).await,
        ["help"] | ["--help"] | ["-h"] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
