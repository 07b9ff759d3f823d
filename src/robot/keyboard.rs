//! Single-key input.
//!
//! A reader thread decodes raw stdin bytes into `Key`s and sends them over a
//! channel. The control loop drains the channel once per tick and acts on the
//! newest key only.

use anyhow::Result;
use std::io::Read;
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;

use super::Action;

const CTRL_C: u8 = 0x03;
const CTRL_D: u8 = 0x04;
const ESC: u8 = 0x1b;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Space,
    Quit,
}

/// Decode one raw byte. Letters are lowercased; non-ASCII bytes are dropped.
pub fn decode_key(byte: u8) -> Option<Key> {
    match byte {
        CTRL_C | CTRL_D => Some(Key::Quit),
        b' ' => Some(Key::Space),
        b if b.is_ascii_graphic() => Some(Key::Char(b.to_ascii_lowercase() as char)),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Move(Action),
    RepeatTarget,
    Quit,
}

impl Command {
    pub fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::Char('w') => Some(Command::Move(Action::Forward)),
            Key::Char('s') => Some(Command::Move(Action::Backward)),
            Key::Char('a') => Some(Command::Move(Action::TurnLeft)),
            Key::Char('d') => Some(Command::Move(Action::TurnRight)),
            Key::Space => Some(Command::RepeatTarget),
            Key::Quit => Some(Command::Quit),
            Key::Char(_) => None,
        }
    }
}

/// Read keys until `Quit`, end of input, or the receiver goes away.
///
/// Escape sequences (arrow and function keys) are swallowed whole, so their
/// trailing letters never reach the control loop.
pub fn spawn_key_reader<R>(mut reader: R, tx: Sender<Key>) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    std::thread::spawn(move || loop {
        let byte = match read_byte(&mut reader) {
            Ok(Some(ESC)) => match skip_escape(&mut reader) {
                Ok(Some(byte)) => byte,
                Ok(None) => continue,
                Err(err) => {
                    log::warn!("keyboard read failed: {}", err);
                    break;
                }
            },
            Ok(Some(byte)) => byte,
            Ok(None) => break,
            Err(err) => {
                log::warn!("keyboard read failed: {}", err);
                break;
            }
        };
        let Some(key) = decode_key(byte) else {
            continue;
        };
        if tx.send(key).is_err() || key == Key::Quit {
            break;
        }
    })
}

fn read_byte<R: Read>(reader: &mut R) -> std::io::Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

/// Consume the rest of a sequence that started with ESC.
///
/// Handles CSI (`ESC [` params final) and SS3 (`ESC O` final). Returns a
/// byte that turned out not to belong to the sequence so the caller can
/// decode it as an ordinary key.
fn skip_escape<R: Read>(reader: &mut R) -> std::io::Result<Option<u8>> {
    match read_byte(reader)? {
        Some(b'[') => loop {
            match read_byte(reader)? {
                Some(0x20..=0x3f) => continue,
                Some(0x40..=0x7e) | None => return Ok(None),
                Some(other) => return Ok(Some(other)),
            }
        },
        Some(b'O') => read_byte(reader).map(|_| None),
        other => Ok(other),
    }
}

/// Puts stdin into raw mode (no echo, no line buffering, no signals) and
/// restores the previous settings on drop.
#[cfg(target_os = "linux")]
pub struct RawTerminal {
    fd: libc::c_int,
    original: libc::termios,
}

#[cfg(target_os = "linux")]
impl RawTerminal {
    pub fn enable() -> Result<Self> {
        use anyhow::Context;

        let fd = libc::STDIN_FILENO;
        let mut original = std::mem::MaybeUninit::<libc::termios>::uninit();
        let rc = unsafe { libc::tcgetattr(fd, original.as_mut_ptr()) };
        if rc != 0 {
            return Err(std::io::Error::last_os_error()).context("tcgetattr on stdin");
        }
        let original = unsafe { original.assume_init() };

        let mut raw = original;
        raw.c_lflag &= !(libc::ICANON | libc::ECHO | libc::ISIG);
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;
        let rc = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &raw) };
        if rc != 0 {
            return Err(std::io::Error::last_os_error()).context("tcsetattr on stdin");
        }
        Ok(Self { fd, original })
    }
}

#[cfg(target_os = "linux")]
impl Drop for RawTerminal {
    fn drop(&mut self) {
        let rc = unsafe { libc::tcsetattr(self.fd, libc::TCSANOW, &self.original) };
        if rc != 0 {
            log::warn!(
                "failed to restore terminal: {}",
                std::io::Error::last_os_error()
            );
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub struct RawTerminal;

#[cfg(not(target_os = "linux"))]
impl RawTerminal {
    pub fn enable() -> Result<Self> {
        Err(anyhow::anyhow!("raw keyboard mode is only supported on Linux"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::mpsc;

    #[test]
    fn decodes_letters_space_and_quit() {
        assert_eq!(decode_key(b'W'), Some(Key::Char('w')));
        assert_eq!(decode_key(b' '), Some(Key::Space));
        assert_eq!(decode_key(CTRL_C), Some(Key::Quit));
        assert_eq!(decode_key(CTRL_D), Some(Key::Quit));
        assert_eq!(decode_key(b'\r'), None);
        assert_eq!(decode_key(0xC3), None);
    }

    #[test]
    fn maps_keys_to_commands() {
        assert_eq!(
            Command::from_key(Key::Char('a')),
            Some(Command::Move(Action::TurnLeft))
        );
        assert_eq!(
            Command::from_key(Key::Char('d')),
            Some(Command::Move(Action::TurnRight))
        );
        assert_eq!(Command::from_key(Key::Space), Some(Command::RepeatTarget));
        assert_eq!(Command::from_key(Key::Quit), Some(Command::Quit));
        assert_eq!(Command::from_key(Key::Char('x')), None);
    }

    #[test]
    fn reader_stops_at_quit() {
        let (tx, rx) = mpsc::channel();
        let input = Cursor::new(vec![b'w', b'\n', b' ', CTRL_C, b's']);
        spawn_key_reader(input, tx).join().unwrap();
        let keys: Vec<Key> = rx.try_iter().collect();
        assert_eq!(keys, vec![Key::Char('w'), Key::Space, Key::Quit]);
    }

    #[test]
    fn reader_stops_at_end_of_input() {
        let (tx, rx) = mpsc::channel();
        spawn_key_reader(Cursor::new(b"ad".to_vec()), tx)
            .join()
            .unwrap();
        let keys: Vec<Key> = rx.try_iter().collect();
        assert_eq!(keys, vec![Key::Char('a'), Key::Char('d')]);
    }

    #[test]
    fn reader_skips_arrow_key_sequences() {
        let (tx, rx) = mpsc::channel();
        // Up arrow, left arrow, then a real key.
        spawn_key_reader(Cursor::new(b"\x1b[A\x1b[Dw".to_vec()), tx)
            .join()
            .unwrap();
        let keys: Vec<Key> = rx.try_iter().collect();
        assert_eq!(keys, vec![Key::Char('w')]);
    }

    #[test]
    fn reader_skips_modified_and_ss3_sequences() {
        let (tx, rx) = mpsc::channel();
        // Ctrl+Right, application-mode Down, a bare ESC, then keys.
        let input = b"\x1b[1;5C\x1bOB\x1bs\x1b\x03".to_vec();
        spawn_key_reader(Cursor::new(input), tx).join().unwrap();
        let keys: Vec<Key> = rx.try_iter().collect();
        assert_eq!(keys, vec![Key::Char('s'), Key::Quit]);
    }
}
