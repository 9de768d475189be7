use crate::util::Position;
use std::any::Any;
use std::collections::HashMap;

/// A key-value store with object-identity keys, used by tokenizers to
/// persist resumption data across suspensions.
///
/// Keys are the addresses of the tokenizers themselves, so cooperating
/// tokenizers of one session never collide.
pub struct StateStore {
    entries: HashMap<usize, Box<dyn Any>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn set<S: 'static>(&mut self, key: usize, value: S) {
        self.entries.insert(key, Box::new(value));
    }

    pub fn get<S: 'static>(&self, key: usize) -> Option<&S> {
        self.entries.get(&key).and_then(|v| v.downcast_ref())
    }

    pub fn get_mut<S: 'static>(&mut self, key: usize) -> Option<&mut S> {
        self.entries.get_mut(&key).and_then(|v| v.downcast_mut())
    }

    pub fn take<S: 'static>(&mut self, key: usize) -> Option<S> {
        let entry = self.entries.remove(&key)?;
        match entry.downcast::<S>() {
            Ok(value) => Some(*value),
            Err(entry) => {
                // Someone else's state under a colliding key; put it back.
                self.entries.insert(key, entry);
                None
            }
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

/// The input contract the runtime consumes characters through.
///
/// `remaining` is the yet-unconsumed window, `consume` advances it and the
/// position, and `is_final_block` says whether more input can ever arrive.
/// Tokenizers keep their suspension snapshots in [state](ISource::state).
pub trait ISource {
    fn remaining(&self) -> &str;
    fn is_final_block(&self) -> bool;
    /// Advance the window by `chars` characters.
    fn consume(&mut self, chars: usize);
    /// The position of the first unconsumed character.
    fn position(&self) -> Position;
    fn state(&mut self) -> &mut StateStore;
}

/// A one-shot source over a complete input; never suspends.
pub struct StringSource<'c> {
    text: &'c str,
    offset: usize,
    position: Position,
    store: StateStore,
}

impl<'c> StringSource<'c> {
    pub fn new(text: &'c str) -> Self {
        Self {
            text,
            offset: 0,
            position: Position::start(),
            store: StateStore::new(),
        }
    }
}

impl<'c> From<&'c str> for StringSource<'c> {
    fn from(text: &'c str) -> Self {
        StringSource::new(text)
    }
}

impl<'c> ISource for StringSource<'c> {
    fn remaining(&self) -> &str {
        &self.text[self.offset..]
    }

    fn is_final_block(&self) -> bool {
        true
    }

    fn consume(&mut self, chars: usize) {
        let mut iter = self.text[self.offset..].chars();
        for _ in 0..chars {
            match iter.next() {
                Some(c) => {
                    self.offset += c.len_utf8();
                    self.position.step(c);
                }
                None => break,
            }
        }
    }

    fn position(&self) -> Position {
        self.position
    }

    fn state(&mut self) -> &mut StateStore {
        &mut self.store
    }
}

/// A streaming source fed chunk by chunk.
///
/// The caller pushes chunks as they arrive and marks the last one with
/// [finish](ChunkSource::finish); until then the runtime suspends instead of
/// failing when the buffer runs dry.
pub struct ChunkSource {
    buffer: String,
    consumed: usize,
    position: Position,
    finished: bool,
    store: StateStore,
}

impl ChunkSource {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            consumed: 0,
            position: Position::start(),
            finished: false,
            store: StateStore::new(),
        }
    }

    /// Append the next chunk of input.
    pub fn push_chunk(&mut self, chunk: &str) {
        if self.consumed > 0 {
            self.buffer.drain(..self.consumed);
            self.consumed = 0;
        }
        self.buffer.push_str(chunk);
    }

    /// Declare that no more input will arrive.
    pub fn finish(&mut self) {
        self.finished = true;
    }
}

impl Default for ChunkSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ISource for ChunkSource {
    fn remaining(&self) -> &str {
        &self.buffer[self.consumed..]
    }

    fn is_final_block(&self) -> bool {
        self.finished
    }

    fn consume(&mut self, chars: usize) {
        let mut iter = self.buffer[self.consumed..].chars();
        for _ in 0..chars {
            match iter.next() {
                Some(c) => {
                    self.consumed += c.len_utf8();
                    self.position.step(c);
                }
                None => break,
            }
        }
    }

    fn position(&self) -> Position {
        self.position
    }

    fn state(&mut self) -> &mut StateStore {
        &mut self.store
    }
}
