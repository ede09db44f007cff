//! StrideDB client
//!
//! Relays stdin lines to a `stridedb-server` and prints each reply. Stops
//! once the server answers the terminator.

use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;

use anyhow::{bail, Context, Result};
use clap::Parser;
use stridedb::ServerConfig;

#[derive(Parser, Debug)]
#[command(name = "stridedb-client", version, about = "Send statements to a StrideDB server")]
struct Args {
    /// Server address.
    #[arg(long)]
    connect: Option<String>,

    /// Line that ends the session; must match the server's.
    #[arg(long)]
    terminator: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let defaults = ServerConfig::default();
    let addr = args.connect.unwrap_or(defaults.listen_addr);
    let terminator = args.terminator.unwrap_or(defaults.terminator);

    let stream = TcpStream::connect(&addr).with_context(|| format!("connecting to {}", addr))?;
    let mut server = BufReader::new(stream.try_clone()?);
    let mut to_server = stream;

    // result file prompt, then the stop hint
    print!("{} ", receive(&mut server)?);
    io::stdout().flush()?;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let Some(path) = lines.next().transpose()? else {
        return Ok(());
    };
    writeln!(to_server, "{}", path)?;
    println!("{}", receive(&mut server)?);

    for line in lines {
        let line = line?;
        writeln!(to_server, "{}", line)?;
        let reply = receive(&mut server)?;
        println!("{}", reply);
        if line == terminator {
            break;
        }
    }
    Ok(())
}

fn receive(server: &mut impl BufRead) -> Result<String> {
    let mut reply = String::new();
    if server.read_line(&mut reply)? == 0 {
        bail!("server closed the connection");
    }
    Ok(reply.trim_end().to_string())
}
