/// One cache line. `lru == 0` is most-recently-used; larger values are
/// older. Only valid blocks participate in the LRU ordering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Block {
    pub tag: u64,
    pub valid: bool,
    pub dirty: bool,
    pub lru: u32,
}

impl Block {
    pub fn invalid() -> Self {
        Self::default()
    }

    pub fn new(tag: u64) -> Self {
        Self {
            tag,
            valid: true,
            dirty: false,
            lru: 0,
        }
    }
}
