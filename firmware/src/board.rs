//! Static configuration of the 3x10+3 board
//!
//! Four layers: base (Colemak), symbols/navigation on layer 1, numbers on
//! layer 2 (toggled by the Z+X combo), function keys on layer 3.

use keyflow_core::{
    mods_dance, ComboDefinition, CustomKey, DanceActions, DanceHandler, Duration, HalError,
    KeyCode, Keycode, Keymap, Mods, Resolver, ResolverConfig, ResolverTables, TimeoutOverride,
};

pub const ROWS: usize = 4;
pub const COLS: usize = 10;
pub const LAYERS: usize = 4;

/// Keymap type of this board
pub type BoardKeymap = Keymap<ROWS, COLS, LAYERS>;

/// Resolver wired to the static tables below
pub type BoardResolver = Resolver<'static, BoardKeymap>;

/// Index of the mods tap dance
pub const TD_MODS: u8 = 0;

const fn k(key: KeyCode) -> Keycode {
    Keycode::Key(key)
}

const fn s(key: KeyCode) -> Keycode {
    Keycode::ModKey(Mods::LSHIFT, key)
}

const fn lsft_t(key: KeyCode) -> Keycode {
    Keycode::ModTap(Mods::LSHIFT, key)
}

const fn rsft_t(key: KeyCode) -> Keycode {
    Keycode::ModTap(Mods::RSHIFT, key)
}

const ____: Keycode = Keycode::Transparent;
const XXXX: Keycode = Keycode::No;
const SYM_SPC: Keycode = Keycode::LayerTap(1, KeyCode::Space);
const MODS: Keycode = Keycode::TapDance(TD_MODS);
const RAISE: Keycode = Keycode::Custom(CustomKey::LayerRaise);

use KeyCode::*;

pub static KEYMAP: BoardKeymap = Keymap::new([
    [
        [k(Q), k(W), k(F), k(P), k(G), k(J), k(L), k(U), k(Y), k(BSpace)],
        [k(A), k(R), k(S), k(T), k(D), k(H), k(N), k(E), k(I), k(O)],
        [lsft_t(Z), k(X), k(C), k(V), k(B), k(K), k(M), MODS, k(Dot), rsft_t(Slash)],
        [XXXX, SYM_SPC, XXXX, XXXX, XXXX, XXXX, XXXX, XXXX, XXXX, XXXX],
    ],
    [
        [s(Minus), k(Minus), s(Equal), k(Equal), s(SColon), k(Grave), k(MediaPreviousSong), k(MediaPlayPause), k(MediaNextSong), k(Delete)],
        [s(LBracket), s(Kb9), s(Kb0), s(RBracket), s(Bslash), k(Escape), k(Left), k(Up), k(Down), k(Right)],
        [lsft_t(LBracket), k(Quote), s(Quote), k(RBracket), k(SColon), s(Grave), k(VolDown), k(Mute), k(VolUp), rsft_t(Bslash)],
        [____, ____, ____, XXXX, XXXX, XXXX, XXXX, XXXX, XXXX, XXXX],
    ],
    [
        [s(Kb1), s(Kb2), s(Kb3), s(Kb4), s(Kb5), s(Kb6), s(Kb7), s(Kb8), k(CapsLock), k(BSpace)],
        [k(Kb1), k(Kb2), k(Kb3), k(Kb4), k(Kb5), k(Kb6), k(Kb7), k(Kb8), k(Kb9), k(Kb0)],
        [____, ____, XXXX, XXXX, Keycode::Momentary(3), XXXX, XXXX, k(Comma), k(Dot), rsft_t(Slash)],
        [____, ____, ____, XXXX, XXXX, XXXX, XXXX, XXXX, XXXX, XXXX],
    ],
    [
        [XXXX, XXXX, XXXX, XXXX, XXXX, XXXX, XXXX, XXXX, XXXX, XXXX],
        [k(F1), k(F2), k(F3), k(F4), k(F5), k(F6), k(F7), k(F8), k(F9), k(F10)],
        [k(F11), XXXX, XXXX, XXXX, ____, XXXX, XXXX, XXXX, XXXX, k(F12)],
        [____, ____, ____, XXXX, XXXX, XXXX, XXXX, XXXX, XXXX, XXXX],
    ],
]);

pub static COMBOS: [ComboDefinition<'static>; 3] = [
    ComboDefinition::new(&[k(Q), k(W)], k(Tab)),
    ComboDefinition::new(&[k(A), k(R)], k(Enter)),
    ComboDefinition::new(&[lsft_t(Z), k(X)], RAISE),
];

static MODS_DANCE: DanceActions = mods_dance();

pub static DANCES: [&dyn DanceHandler; 1] = [&MODS_DANCE];

/// Multi-function keys that always use 200 ms, whatever the configured terms
pub static TIMEOUTS: [TimeoutOverride; 2] = [
    TimeoutOverride {
        keycode: MODS,
        timeout: Duration::from_millis(200),
    },
    TimeoutOverride {
        keycode: SYM_SPC,
        timeout: Duration::from_millis(200),
    },
];

/// Tables of this board
pub fn tables() -> ResolverTables<'static, BoardKeymap> {
    ResolverTables {
        keymap: &KEYMAP,
        combos: &COMBOS,
        dances: &DANCES,
        timeouts: &TIMEOUTS,
    }
}

/// Resolver for this board with `config`
pub fn resolver(config: ResolverConfig) -> Result<BoardResolver, HalError> {
    Resolver::new(config, tables())
}
