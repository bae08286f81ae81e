use std::marker::PhantomData;

use smallvec::SmallVec;

fn into_word_bit(i: usize) -> (usize, u32) {
    (i >> 6, (i & 0x3f) as u32)
}

fn from_word_bit(word: usize, bit: u32) -> usize {
    (word << 6) + (bit as usize)
}

fn words_for(len: usize) -> usize {
    (len + 63) >> 6
}

/// A fixed-length bit vector indexed by `T`. Unlike a growable set, the length is chosen up front
/// and indices at or past it are rejected rather than silently extending the vector.
#[derive(Debug, PartialEq, Eq)]
pub struct BitVec<T: Into<usize>> {
    words: SmallVec<[u64; 16]>,
    len: usize,
    _data: PhantomData<fn (T) -> ()>
}

impl <T: Into<usize>> BitVec<T> {
    pub fn new(len: usize) -> BitVec<T> {
        BitVec {
            words: SmallVec::from_elem(0, words_for(len)),
            len,
            _data: PhantomData
        }
    }

    pub fn get(&self, i: T) -> bool {
        let i = i.into();

        if i >= self.len {
            return false;
        };

        let (word, bit) = into_word_bit(i);
        ((self.words[word] >> bit) & 0x1) != 0
    }

    /// Sets bit `i` to `val`, returning its previous value, or `None` if `i` is out of range.
    pub fn set(&mut self, i: T, val: bool) -> Option<bool> {
        let i = i.into();

        if i >= self.len {
            return None;
        };

        let (word, bit) = into_word_bit(i);
        let old = self.words[word];

        self.words[word] = if val {
            old | (1 << bit)
        } else {
            old & !(1 << bit)
        };

        Some(((old >> bit) & 0x1) != 0)
    }
}

impl <T: Into<usize> + From<usize>> BitVec<T> {
    pub fn iter(&self) -> BitVecIter<T> {
        BitVecIter(self, 0)
    }
}

pub struct BitVecIter<'a, T: Into<usize> + From<usize>>(&'a BitVec<T>, usize);

impl <'a, T: Into<usize> + From<usize>> Iterator for BitVecIter<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.1 >= self.0.len {
            return None;
        };

        let (mut word, bit) = into_word_bit(self.1);
        let tz = (self.0.words[word] >> bit).trailing_zeros();

        if tz != 64 {
            let result = from_word_bit(word, bit + tz);

            self.1 = result + 1;
            return Some(T::from(result));
        };

        for &val in self.0.words[(word + 1)..].iter() {
            word += 1;
            let tz = val.trailing_zeros();

            if tz != 64 {
                let result = from_word_bit(word, tz);

                self.1 = result + 1;
                return Some(T::from(result));
            };
        };

        self.1 = self.0.len;
        None
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use super::BitVec;

    #[test]
    fn test_get_set() {
        let mut bv: BitVec<usize> = BitVec::new(130);

        assert!(!bv.get(0));
        assert!(!bv.get(63));
        assert!(!bv.get(64));

        assert_eq!(bv.set(63, true), Some(false));

        assert!(!bv.get(0));
        assert!(bv.get(63));
        assert!(!bv.get(64));

        assert_eq!(bv.set(64, false), Some(false));
        assert_eq!(bv.set(64, true), Some(false));
        assert_eq!(bv.set(64, true), Some(true));

        assert!(bv.get(63));
        assert!(bv.get(64));

        assert_eq!(bv.set(63, false), Some(true));

        assert!(!bv.get(63));
        assert!(bv.get(64));
    }

    #[test]
    fn test_out_of_range() {
        let mut bv: BitVec<usize> = BitVec::new(8);

        assert_eq!(bv.set(7, true), Some(false));
        assert_eq!(bv.set(8, true), None);
        assert_eq!(bv.set(1000, true), None);

        assert!(!bv.get(8));
        assert!(!bv.get(1000));
        assert!(bv.get(7));
    }

    #[test]
    fn test_iter() {
        let mut bv: BitVec<usize> = BitVec::new(200);

        bv.set(0, true);
        bv.set(7, true);
        bv.set(63, true);
        bv.set(64, true);
        bv.set(199, true);

        assert_eq!(
            bv.iter().collect_vec(),
            vec![0, 7, 63, 64, 199]
        );
    }

    #[test]
    fn test_iter_empty() {
        let bv: BitVec<usize> = BitVec::new(0);

        assert_eq!(bv.iter().collect_vec(), Vec::<usize>::new());
    }
}
