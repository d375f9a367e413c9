//! Packed keystring arena
//!
//! Holds one NUL-terminated parameter string per button in a single
//! fixed-size byte buffer. Strings are stored back to back in button
//! order, an empty string is a lone terminator, so an all-zero buffer is
//! N empty strings. The buffer is persisted verbatim as part of a slot.
//!
//! Every update compacts the buffer in place and rebuilds the offset
//! table from scratch, so the buffer never has gaps and offsets never go
//! stale.

use tracing::{debug, trace};

use crate::error::KeystringError;

/// Fixed-capacity arena of `N` strings packed into `CAP` bytes
#[derive(Clone, PartialEq, Eq)]
pub struct KeystringStore<const N: usize, const CAP: usize> {
    buffer: [u8; CAP],
    offsets: [usize; N],
    used: usize,
}

impl<const N: usize, const CAP: usize> KeystringStore<N, CAP> {
    /// Empty arena: N empty strings
    pub fn new() -> Self {
        let mut store = Self {
            buffer: [0; CAP],
            offsets: [0; N],
            used: 0,
        };
        store.rebuild_offsets();
        store
    }

    /// Restore an arena from persisted bytes.
    ///
    /// Missing trailing bytes read as zero; excess bytes are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeystringError> {
        let mut buffer = [0u8; CAP];
        let len = bytes.len().min(CAP);
        buffer[..len].copy_from_slice(&bytes[..len]);

        let mut store = Self {
            buffer,
            offsets: [0; N],
            used: 0,
        };
        let found = store.rebuild_offsets();
        if found < N {
            return Err(KeystringError::Truncated { found, expected: N });
        }
        if std::str::from_utf8(&store.buffer[..store.used]).is_err() {
            return Err(KeystringError::InvalidUtf8);
        }
        Ok(store)
    }

    /// Current string of slot `index`.
    ///
    /// The borrow ends before the next `set`, which may move the string.
    pub fn get(&self, index: usize) -> &str {
        let start = self.offsets[index];
        let end = start + self.len_of(index);
        std::str::from_utf8(&self.buffer[start..end]).unwrap_or_default()
    }

    /// Replace the string of slot `index`, returning the bytes left free.
    ///
    /// The value is cut at its first NUL. On overflow nothing is written.
    pub fn set(&mut self, index: usize, value: &str) -> Result<usize, KeystringError> {
        let value = value.split('\0').next().unwrap_or_default().as_bytes();

        let start = self.offsets[index];
        let old_len = self.len_of(index);
        let new_len = value.len();
        let new_used = self.used - old_len + new_len;

        if new_used > CAP - 1 {
            return Err(KeystringError::Overflow {
                needed: new_used,
                capacity: CAP - 1,
            });
        }

        // Shift everything behind this slot's terminator in one move
        let source = start + old_len + 1;
        if new_len != old_len {
            self.buffer
                .copy_within(source..self.used, start + new_len + 1);
        }
        if new_used < self.used {
            self.buffer[new_used..self.used].fill(0);
        }

        self.buffer[start..start + new_len].copy_from_slice(value);
        self.buffer[start + new_len] = 0;

        self.rebuild_offsets();
        debug!(
            "Keystring {} updated ({} -> {} bytes), {} bytes left",
            index,
            old_len,
            new_len,
            self.free()
        );
        Ok(self.free())
    }

    /// Bytes occupied by all strings plus their terminators
    pub fn used(&self) -> usize {
        self.used
    }

    /// Bytes still available
    pub fn free(&self) -> usize {
        CAP - self.used
    }

    /// Start offset of every slot, in slot order
    pub fn offsets(&self) -> &[usize; N] {
        &self.offsets
    }

    /// Raw arena contents for persistence
    pub fn as_bytes(&self) -> &[u8; CAP] {
        &self.buffer
    }

    /// Reset to N empty strings
    pub fn clear(&mut self) {
        self.buffer.fill(0);
        self.rebuild_offsets();
    }

    /// Iterate over all strings in slot order
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        (0..N).map(move |i| self.get(i))
    }

    fn len_of(&self, index: usize) -> usize {
        let start = self.offsets[index];
        let end = if index + 1 < N {
            self.offsets[index + 1]
        } else {
            self.used
        };
        end - start - 1
    }

    /// Rescan the buffer left to right and point every slot at its
    /// string. Returns how many terminated strings were found.
    fn rebuild_offsets(&mut self) -> usize {
        let mut pos = 0;
        let mut found = 0;
        for offset in self.offsets.iter_mut() {
            if pos >= CAP {
                *offset = CAP - 1;
                continue;
            }
            *offset = pos;
            while pos < CAP && self.buffer[pos] != 0 {
                pos += 1;
            }
            if pos < CAP {
                found += 1;
                pos += 1;
            }
        }
        self.used = pos.min(CAP);
        trace!("Keystring offsets rebuilt, {} bytes used", self.used);
        found
    }
}

impl<const N: usize, const CAP: usize> Default for KeystringStore<N, CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, const CAP: usize> std::fmt::Debug for KeystringStore<N, CAP> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeystringStore")
            .field("strings", &self.iter().collect::<Vec<_>>())
            .field("used", &self.used)
            .field("capacity", &CAP)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Store = KeystringStore<4, 16>;

    fn assert_packed(store: &Store) {
        let total: usize = store.iter().map(str::len).sum();
        assert_eq!(total + 4, store.used());
        let offsets = store.offsets();
        for i in 0..3 {
            assert_eq!(offsets[i] + store.get(i).len() + 1, offsets[i + 1]);
        }
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = Store::new();
        assert_eq!(store.used(), 4);
        assert_eq!(store.free(), 12);
        assert_eq!(store.offsets(), &[0, 1, 2, 3]);
        assert!(store.iter().all(str::is_empty));
    }

    #[test]
    fn test_set_and_get() {
        let mut store = Store::new();
        assert_eq!(store.set(1, "abc"), Ok(9));
        assert_eq!(store.get(0), "");
        assert_eq!(store.get(1), "abc");
        assert_eq!(store.get(2), "");
        assert_packed(&store);
    }

    #[test]
    fn test_grow_and_shrink_move_later_strings() {
        let mut store = Store::new();
        store.set(0, "a").unwrap();
        store.set(2, "cc").unwrap();
        store.set(3, "ddd").unwrap();

        store.set(0, "aaaa").unwrap();
        assert_eq!(store.get(2), "cc");
        assert_eq!(store.get(3), "ddd");
        assert_packed(&store);

        store.set(0, "").unwrap();
        assert_eq!(store.get(0), "");
        assert_eq!(store.get(2), "cc");
        assert_eq!(store.get(3), "ddd");
        assert_packed(&store);

        // vacated tail is zeroed
        assert!(store.as_bytes()[store.used()..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_set_same_value_is_noop() {
        let mut store = Store::new();
        store.set(1, "xy").unwrap();
        let before = store.clone();
        store.set(1, "xy").unwrap();
        store.set(0, "").unwrap();
        assert_eq!(store, before);
    }

    #[test]
    fn test_overflow_leaves_store_unchanged() {
        let mut store = Store::new();
        store.set(0, "12345").unwrap();
        let before = store.clone();

        // 4 terminators + 5 + 7 = 16 > 15
        let err = store.set(1, "abcdefg").unwrap_err();
        assert!(matches!(err, KeystringError::Overflow { .. }));
        assert_eq!(store, before);
        assert_eq!(store.get(0), "12345");
        assert_eq!(store.get(1), "");
    }

    #[test]
    fn test_fill_to_capacity_minus_one() {
        let mut store = Store::new();
        // 4 terminators + 11 = 15 = CAP - 1
        assert_eq!(store.set(3, "abcdefghijk"), Ok(1));
        assert!(store.set(0, "x").is_err());
        // replacing in place with a shorter string still fits
        assert_eq!(store.set(3, "abcdefghij"), Ok(2));
        assert_eq!(store.set(0, "x"), Ok(1));
        assert_packed(&store);
    }

    #[test]
    fn test_value_cut_at_nul() {
        let mut store = Store::new();
        store.set(2, "ab\0cd").unwrap();
        assert_eq!(store.get(2), "ab");
        assert_packed(&store);
    }

    #[test]
    fn test_from_bytes_round_trip() {
        let mut store = Store::new();
        store.set(0, "KEY_A").unwrap();
        store.set(3, "é").unwrap();

        let restored = Store::from_bytes(store.as_bytes()).unwrap();
        assert_eq!(restored, store);
        assert_eq!(restored.get(3), "é");
    }

    #[test]
    fn test_from_bytes_short_input_pads_with_zero() {
        let store = Store::from_bytes(b"ab\0").unwrap();
        assert_eq!(store.get(0), "ab");
        assert_eq!(store.get(1), "");
        assert_eq!(store.used(), 6);
    }

    #[test]
    fn test_from_bytes_rejects_missing_terminators() {
        let bytes = [b'x'; 16];
        assert_eq!(
            Store::from_bytes(&bytes),
            Err(KeystringError::Truncated {
                found: 0,
                expected: 4
            })
        );
    }

    #[test]
    fn test_from_bytes_rejects_invalid_utf8() {
        assert_eq!(
            Store::from_bytes(&[0xff, 0, 0, 0]),
            Err(KeystringError::InvalidUtf8)
        );
    }
}
