//! Keycode vocabulary shared by every stage of the resolver

/// HID keyboard page usages understood by the report layer
#[derive(Copy, Clone, PartialEq, Eq, Debug, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum KeyCode {
    A = 0x04,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Kb1,
    Kb2,
    Kb3,
    Kb4,
    Kb5,
    Kb6,
    Kb7,
    Kb8,
    Kb9,
    Kb0,
    Enter,
    Escape,
    BSpace,
    Tab,
    Space,
    Minus,
    Equal,
    LBracket,
    RBracket,
    Bslash,
    NonUsHash,
    SColon,
    Quote,
    Grave,
    Comma,
    Dot,
    Slash,
    CapsLock,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    Delete = 0x4C,
    Right = 0x4F,
    Left,
    Down,
    Up,
    Mute = 0x7F,
    VolUp,
    VolDown,
    MediaPlayPause = 0xE8,
    MediaPreviousSong = 0xEA,
    MediaNextSong,
    LCtrl = 0xE0,
    LShift,
    LAlt,
    LGui,
    RCtrl,
    RShift,
    RAlt,
    RGui,
}

impl KeyCode {
    /// HID usage id
    pub const fn usage(self) -> u8 {
        self as u8
    }

    /// Returns true for the eight modifier usages (0xE0..=0xE7)
    pub const fn is_modifier(self) -> bool {
        let usage = self as u8;
        usage >= 0xE0 && usage <= 0xE7
    }
}

/// HID modifier byte, one bit per modifier key
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mods(u8);

/// Modifier keys in HID bit order
const MODIFIER_KEYS: [KeyCode; 8] = [
    KeyCode::LCtrl,
    KeyCode::LShift,
    KeyCode::LAlt,
    KeyCode::LGui,
    KeyCode::RCtrl,
    KeyCode::RShift,
    KeyCode::RAlt,
    KeyCode::RGui,
];

impl Mods {
    /// No modifier
    pub const NONE: Mods = Mods(0);
    /// Left control
    pub const LCTRL: Mods = Mods(0x01);
    /// Left shift
    pub const LSHIFT: Mods = Mods(0x02);
    /// Left alt
    pub const LALT: Mods = Mods(0x04);
    /// Left GUI
    pub const LGUI: Mods = Mods(0x08);
    /// Right control
    pub const RCTRL: Mods = Mods(0x10);
    /// Right shift
    pub const RSHIFT: Mods = Mods(0x20);
    /// Right alt
    pub const RALT: Mods = Mods(0x40);
    /// Right GUI
    pub const RGUI: Mods = Mods(0x80);

    /// Raw modifier byte
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Combine two modifier sets
    pub const fn with(self, other: Mods) -> Mods {
        Mods(self.0 | other.0)
    }

    /// Returns true if no modifier bit is set
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Modifier keys in press order (lowest bit first)
    pub fn keys(self) -> impl DoubleEndedIterator<Item = KeyCode> {
        MODIFIER_KEYS
            .into_iter()
            .enumerate()
            .filter(move |&(bit, _)| self.0 & (1u8 << bit) != 0)
            .map(|(_, key)| key)
    }
}

impl core::ops::BitOr for Mods {
    type Output = Mods;

    fn bitor(self, rhs: Mods) -> Mods {
        self.with(rhs)
    }
}

/// Reserved keycodes handled by the interceptor instead of the HID layer
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CustomKey {
    /// Invert the raise layer on press
    LayerRaise,
}

/// Logical action bound to a key position
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Keycode {
    /// Does nothing and hides lower layers
    No,
    /// Falls through to the next active layer
    Transparent,
    /// Plain key
    Key(KeyCode),
    /// Key sent together with modifiers, e.g. GUI+Space
    ModKey(Mods, KeyCode),
    /// Modifier when held, key when tapped
    ModTap(Mods, KeyCode),
    /// Layer when held, key when tapped
    LayerTap(u8, KeyCode),
    /// Layer active while held
    Momentary(u8),
    /// Tap-dance site, indexing the configured dance table
    TapDance(u8),
    /// Reserved custom action
    Custom(CustomKey),
}

impl Keycode {
    /// Returns true for keys whose meaning depends on hold duration
    pub const fn is_multi_function(&self) -> bool {
        match self {
            Keycode::TapDance(_) | Keycode::LayerTap(..) | Keycode::ModTap(..) => true,
            Keycode::No
            | Keycode::Transparent
            | Keycode::Key(_)
            | Keycode::ModKey(..)
            | Keycode::Momentary(_)
            | Keycode::Custom(_) => false,
        }
    }

    /// Returns the tap-dance index if this is a tap-dance key
    pub const fn tap_dance_id(&self) -> Option<u8> {
        match self {
            Keycode::TapDance(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<KeyCode> for Keycode {
    fn from(key: KeyCode) -> Self {
        Keycode::Key(key)
    }
}
