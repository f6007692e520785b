// Plane-budgeted output region for object pointer streams.
//
// The buffer tracks two things separately: the 32-bit words of the object
// pointer list, and the plane budget those objects will make the ISP fetch.
// The sort core decides per pass whether the budget still has room; the
// buffer itself never truncates a pass.

pub struct ParamBuffer {
    words: Vec<u32>,
    plane_limit: u32,
    planes_used: u32,
}

impl ParamBuffer {
    pub fn new(plane_limit: u32) -> Self {
        ParamBuffer {
            words: Vec::new(),
            plane_limit,
            planes_used: 0,
        }
    }

    #[inline]
    pub fn push_word(&mut self, word: u32) {
        self.words.push(word);
    }

    #[inline]
    pub fn add_planes(&mut self, planes: u32) {
        self.planes_used += planes;
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub fn plane_limit(&self) -> u32 {
        self.plane_limit
    }

    pub fn planes_used(&self) -> u32 {
        self.planes_used
    }

    pub fn remaining_planes(&self) -> u32 {
        self.plane_limit.saturating_sub(self.planes_used)
    }

    /// Rewind for the next frame. The backing storage is kept.
    pub fn reset(&mut self) {
        self.words.clear();
        self.planes_used = 0;
    }
}
