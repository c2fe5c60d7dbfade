/// Small seedable LCG. Same constants the playback code has always used
/// inline; wrapped so every draw goes through one owned state.
#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed from the wall clock.
    pub fn from_entropy() -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x9E37_79B9_7F4A_7C15);
        Self::new(seed)
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.state >> 33) as u32
    }

    /// Uniform in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        // upper 31 bits of the shifted state are well mixed
        (self.next_u32() >> 1) as f64 / (1u64 << 31) as f64
    }

    /// Uniform integer in [0, n). Returns 0 when n == 0.
    pub fn below(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        (self.next_f64() * n as f64) as usize % n
    }

    /// Uniform integer in [-range, range]
    pub fn offset(&mut self, range: usize) -> i64 {
        self.below(2 * range + 1) as i64 - range as i64
    }

    /// True with the given chance (0.0-1.0)
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}
