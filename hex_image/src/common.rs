use bytes::{Buf, BufMut};

pub const WORD_SIZE: usize = 4;

pub fn encode_word(word: u32) -> [u8; WORD_SIZE] {
    let mut encoded = [0u8; WORD_SIZE];
    (&mut encoded[..]).put_u32(word);
    encoded
}

/// Returns `None` if the image length is not a multiple of the word size.
pub fn decode_words(image: &[u8]) -> Option<Vec<u32>> {
    if image.len() % WORD_SIZE != 0 {
        return None;
    }
    let mut cursor = image;
    let mut words = Vec::with_capacity(image.len() / WORD_SIZE);
    while cursor.has_remaining() {
        words.push(cursor.get_u32());
    }
    Some(words)
}
