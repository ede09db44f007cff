//! Line-oriented statement server.
//!
//! One session per connection, one connection at a time:
//!
//! ```text
//! S: Input full file name for result
//! C: /tmp/result.txt
//! S: If you want to stop, input - END
//! C: SELECT * FROM people WHERE ALL
//! S: OK
//! C: END
//! S: END
//! ```
//!
//! Each statement's rendered output replaces the contents of the result file.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::net::TcpListener;

use log::{debug, info, warn};

use crate::config::DbConfig;
use crate::error::{Result, TableError};
use crate::sql::Interpreter;

pub const RESULT_FILE_PROMPT: &str = "Input full file name for result";
pub const STOP_HINT_PREFIX: &str = "If you want to stop, input - ";

/// Run one session over `reader`/`writer`. Returns when the client sends the
/// terminator line or closes its side.
pub fn serve_session<R: BufRead, W: Write>(interpreter: &Interpreter, mut reader: R, mut writer: W) -> Result<()> {
    let terminator = interpreter.config().server.terminator.clone();

    reply(&mut writer, RESULT_FILE_PROMPT)?;
    let result_path = match read_line(&mut reader)? {
        Some(path) => path,
        None => return Ok(()),
    };
    reply(&mut writer, &format!("{}{}", STOP_HINT_PREFIX, terminator))?;

    while let Some(line) = read_line(&mut reader)? {
        if line == terminator {
            reply(&mut writer, &terminator)?;
            return Ok(());
        }
        debug!("statement: {}", line);
        let answer = match File::create(&result_path) {
            Ok(file) => {
                let mut sink = BufWriter::new(file);
                let answer = interpreter.respond(&line, &mut sink);
                sink.flush()?;
                answer
            }
            Err(e) => {
                let err = TableError::FileOpen(result_path.clone().into(), e);
                warn!("{}", err);
                format!("ERROR: {}", err)
            }
        };
        reply(&mut writer, &answer)?;
    }

    debug!("client closed the session");
    Ok(())
}

/// Bind `config.server.listen_addr` and serve connections until the
/// listener fails.
pub fn run(config: DbConfig) -> Result<()> {
    let listener = TcpListener::bind(&config.server.listen_addr)?;
    info!(
        "listening on {} (data dir {})",
        config.server.listen_addr,
        config.data_dir.display()
    );
    let interpreter = Interpreter::new(config);

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                warn!("accept failed: {}", e);
                continue;
            }
        };
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown peer".to_string());
        info!("session opened: {}", peer);

        let reader = BufReader::new(stream.try_clone()?);
        match serve_session(&interpreter, reader, stream) {
            Ok(()) => info!("session closed: {}", peer),
            Err(e) => warn!("session {} aborted: {}", peer, e),
        }
    }
    Ok(())
}

/// Next line without its line ending, or `None` at end of input.
fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let trimmed = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed);
    Ok(Some(line))
}

fn reply<W: Write>(writer: &mut W, message: &str) -> Result<()> {
    writeln!(writer, "{}", message)?;
    writer.flush()?;
    Ok(())
}
