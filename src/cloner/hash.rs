//! Stateless per-instance hashing for the Random effector
//!
//! Every draw is a pure function of `(seed, index, effector salt, channel)`,
//! so jitter is stable across frames, runs and process restarts.

/// Channel salts. Each axis of each delta vector gets its own channel.
pub mod channel {
    pub const POSITION: [u32; 3] = [0, 1, 2];
    pub const ROTATION: [u32; 3] = [3, 4, 5];
    pub const SCALE: [u32; 3] = [6, 7, 8];
    pub const HIDE_PROBABILITY: u32 = 9;
    pub const HIDE_GATE: u32 = 10;
    pub const COLOR_GATE: u32 = 11;
    pub const COLOR_PICK: u32 = 12;
    /// Material channels are `MATERIAL_BASE + fnv1a(key)`
    pub const MATERIAL_BASE: u32 = 64;
}

const SEED_MUL: u32 = 0x9E37_79B1;
const INDEX_MUL: u32 = 0x85EB_CA77;
const EFFECTOR_MUL: u32 = 0xC2B2_AE3D;
const CHANNEL_MUL: u32 = 0x27D4_EB2F;
const MIX_MUL: u32 = 0x5BD1_E995;

/// Raw 32-bit multiplicative-XOR hash
#[inline]
pub fn hash_u32(seed: u32, index: u32, effector_salt: u32, channel: u32) -> u32 {
    let mut h = seed.wrapping_mul(SEED_MUL)
        ^ index.wrapping_mul(INDEX_MUL)
        ^ effector_salt.wrapping_mul(EFFECTOR_MUL)
        ^ channel.wrapping_mul(CHANNEL_MUL);
    h ^= h >> 13;
    h = h.wrapping_mul(MIX_MUL);
    h ^= h >> 16;
    h
}

/// Draw in [0, 1)
#[inline]
pub fn unit(seed: u32, index: u32, effector_salt: u32, channel: u32) -> f32 {
    // 24 bits keep the result exactly representable and strictly below 1
    (hash_u32(seed, index, effector_salt, channel) >> 8) as f32 / (1u32 << 24) as f32
}

/// Draw in [-1, 1)
#[inline]
pub fn signed(seed: u32, index: u32, effector_salt: u32, channel: u32) -> f32 {
    2.0 * unit(seed, index, effector_salt, channel) - 1.0
}

/// FNV-1a over a string key, for salting per-material channels
pub fn fnv1a(key: &str) -> u32 {
    let mut h: u32 = 0x811C_9DC5;
    for byte in key.bytes() {
        h ^= byte as u32;
        h = h.wrapping_mul(0x0100_0193);
    }
    h
}
