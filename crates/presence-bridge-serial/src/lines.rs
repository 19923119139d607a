//! Blocking newline reader feeding an async channel.

use std::io::{self, BufRead, BufReader, Read};

use tokio::sync::mpsc;

/// Read newline-delimited lines until EOF, a hard error, or the receiver
/// goes away.
///
/// Lines are decoded lossily and trimmed. Read timeouts and interrupts are
/// retried without losing partially read bytes. A trailing line without a
/// terminator is emitted at EOF.
pub(crate) fn read_lines<R: Read>(reader: R, tx: &mpsc::UnboundedSender<io::Result<String>>) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    while !tx.is_closed() {
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => {
                if !buf.is_empty() {
                    let _ = tx.send(Ok(decode(&buf)));
                }
                tracing::info!("Serial port reached end of stream");
                return;
            }
            Ok(_) => {
                if buf.ends_with(b"\n") {
                    if tx.send(Ok(decode(&buf))).is_err() {
                        return;
                    }
                    buf.clear();
                }
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::Interrupted) => {}
            Err(e) => {
                tracing::error!("Serial read failed: {e}");
                let _ = tx.send(Err(e));
                return;
            }
        }
    }
}

fn decode(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf).trim().to_string()
}
