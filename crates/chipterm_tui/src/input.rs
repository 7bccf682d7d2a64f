use std::io;
use std::sync::mpsc::SyncSender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chipterm_chip8::Event;
use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyModifiers};

/// Terminals report presses only; a key counts as released once it has not
/// repeated for this long.
pub const KEY_RELEASE_DELAY: Duration = Duration::from_millis(150);

/// map where '1' => 0x01 and 'a' => 0x0a
const LITERAL_KEYMAP: [(char, u8); 16] = [
    ('0', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('4', 0x04),
    ('5', 0x05),
    ('6', 0x06),
    ('7', 0x07),
    ('8', 0x08),
    ('9', 0x09),
    ('a', 0x0a),
    ('b', 0x0b),
    ('c', 0x0c),
    ('d', 0x0d),
    ('e', 0x0e),
    ('f', 0x0f),
];

/// ditto using the left-hand side of a qwerty keyboard, laid out like the
/// COSMAC VIP keypad
const QWERTY_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Keymap {
    /// hex digits map to themselves
    #[default]
    Literal,
    /// 1234/qwer/asdf/zxcv block
    Qwerty,
}

impl Keymap {
    pub fn key(&self, c: char) -> Option<u8> {
        let table = match self {
            Keymap::Literal => &LITERAL_KEYMAP,
            Keymap::Qwerty => &QWERTY_KEYMAP,
        };
        let c = c.to_ascii_lowercase();
        table.iter().find(|(k, _)| *k == c).map(|(_, v)| *v)
    }
}

/// Translate a terminal key press into a scheduler event.
pub fn translate(key: KeyEvent, keymap: Keymap, debug: bool) -> Option<Event> {
    match key.code {
        KeyCode::Esc => Some(Event::Quit),
        // raw mode swallows SIGINT
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Event::Quit),
        KeyCode::Enter if debug => Some(Event::Step),
        KeyCode::Char(c) => keymap.key(c).map(Event::KeyDown),
        _ => None,
    }
}

/// Poll the terminal on a dedicated thread and forward key events. The thread
/// ends after sending `Quit` or once the scheduler stops listening.
pub fn spawn_input(
    sender: SyncSender<Event>,
    keymap: Keymap,
    debug: bool,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("chipterm_input".into())
        .spawn(move || {
            if let Err(e) = input_loop(&sender, keymap, debug) {
                log::error!("input thread failed: {}", e);
                let _ = sender.send(Event::Quit);
            }
        })
}

fn input_loop(sender: &SyncSender<Event>, keymap: Keymap, debug: bool) -> io::Result<()> {
    let mut held: Option<u8> = None;
    loop {
        let polled = if event::poll(KEY_RELEASE_DELAY)? {
            Some(event::read()?)
        } else {
            None
        };
        for event in track_keys(polled, &mut held, keymap, debug) {
            if sender.send(event).is_err() || event == Event::Quit {
                return Ok(());
            }
        }
    }
}

/// Fold one poll result into the held key and return the events to forward,
/// in order. `None` means the poll timed out, which releases the held key.
/// Pressing a different key releases the previous one first.
fn track_keys(
    polled: Option<TermEvent>,
    held: &mut Option<u8>,
    keymap: Keymap,
    debug: bool,
) -> Vec<Event> {
    let key = match polled {
        None => return held.take().map(Event::KeyUp).into_iter().collect(),
        Some(TermEvent::Key(key)) => key,
        Some(_) => return Vec::new(),
    };
    let Some(translated) = translate(key, keymap, debug) else {
        log::trace!("unmapped key {:?}", key.code);
        return Vec::new();
    };

    let mut events = Vec::with_capacity(2);
    if let Event::KeyDown(k) = translated {
        if let Some(previous) = held.replace(k).filter(|p| *p != k) {
            events.push(Event::KeyUp(previous));
        }
    }
    events.push(translated);
    events
}
