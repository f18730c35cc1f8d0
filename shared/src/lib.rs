use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const MAX_HP: i32 = 100;
pub const RESPAWN_DELAY_MS: u64 = 3000;
pub const EYE_HEIGHT: f32 = 1.6;
pub const PLAYER_RADIUS: f32 = 0.5;
pub const MAX_SPAWN_ATTEMPTS: u32 = 100;
pub const NAME_MIN_LEN: usize = 3;
pub const NAME_MAX_LEN: usize = 20;
pub const PROTOCOL_VERSION: u32 = 1;

/// Opaque per-connection identifier assigned by the server.
pub type ClientId = u32;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Packed 0xRRGGBB colors for a player's model.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ColorScheme {
    pub primary: u32,
    pub secondary: u32,
    pub accent: u32,
}

pub const PALETTE: [ColorScheme; 8] = [
    ColorScheme { primary: 0x3366ff, secondary: 0x1a3380, accent: 0x99bbff },
    ColorScheme { primary: 0xff3333, secondary: 0x801a1a, accent: 0xff9999 },
    ColorScheme { primary: 0x33cc33, secondary: 0x1a661a, accent: 0x99ff99 },
    ColorScheme { primary: 0xffcc00, secondary: 0x806600, accent: 0xffe680 },
    ColorScheme { primary: 0x9933ff, secondary: 0x4d1a80, accent: 0xcc99ff },
    ColorScheme { primary: 0xff8800, secondary: 0x804400, accent: 0xffc480 },
    ColorScheme { primary: 0x00cccc, secondary: 0x006666, accent: 0x80ffff },
    ColorScheme { primary: 0xff33aa, secondary: 0x801a55, accent: 0xff99d4 },
];

/// Cosmetic skin applied to a player's model.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureStyle {
    #[default]
    Default,
    Camo,
    Digital,
    Tiger,
    Carbon,
    Gold,
}

impl TextureStyle {
    pub const ALL: [TextureStyle; 6] = [
        TextureStyle::Default,
        TextureStyle::Camo,
        TextureStyle::Digital,
        TextureStyle::Tiger,
        TextureStyle::Carbon,
        TextureStyle::Gold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TextureStyle::Default => "default",
            TextureStyle::Camo => "camo",
            TextureStyle::Digital => "digital",
            TextureStyle::Tiger => "tiger",
            TextureStyle::Carbon => "carbon",
            TextureStyle::Gold => "gold",
        }
    }
}

impl fmt::Display for TextureStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextureStyle {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|style| style.as_str().eq_ignore_ascii_case(wanted))
            .ok_or(())
    }
}

/// Authoritative state of one connected player.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerRecord {
    pub id: ClientId,
    pub name: String,
    pub position: Vec3,
    pub rotation: Vec3,
    pub color_scheme: ColorScheme,
    pub texture_style: TextureStyle,
    pub hp: i32,
    pub is_dead: bool,
    pub kills: u32,
    pub deaths: u32,
}

impl PlayerRecord {
    pub fn new(id: ClientId, name: String, position: Vec3, color_scheme: ColorScheme) -> Self {
        Self {
            id,
            name,
            position,
            rotation: Vec3::default(),
            color_scheme,
            texture_style: TextureStyle::default(),
            hp: MAX_HP,
            is_dead: false,
            kills: 0,
            deaths: 0,
        }
    }

    /// Returns the player to full health at `position`.
    pub fn revive(&mut self, position: Vec3) {
        self.position = position;
        self.hp = MAX_HP;
        self.is_dead = false;
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ScoreEntry {
    pub id: ClientId,
    pub name: String,
    pub kills: u32,
    pub deaths: u32,
}

/// Why a rename was refused.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum NameRejection {
    Invalid,
    NotFound,
    Taken,
}

impl NameRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            NameRejection::Invalid => "invalid",
            NameRejection::NotFound => "not_found",
            NameRejection::Taken => "taken",
        }
    }
}

impl fmt::Display for NameRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for NameRejection {}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    // Client -> server
    Connect {
        client_version: u32,
        name: Option<String>,
    },
    Move {
        position: Vec3,
        rotation: Vec3,
    },
    Shoot {
        ray: Ray,
    },
    Hit {
        player_id: ClientId,
        damage: i32,
    },
    RequestScoreboard,
    ChangeName(String),
    ChangeSkin(String),
    ChangeMap(String),
    Heartbeat,
    Disconnect,

    // Server -> client
    Init {
        id: ClientId,
        players: HashMap<ClientId, PlayerRecord>,
        player_data: PlayerRecord,
        current_map: String,
    },
    PlayerJoined(PlayerRecord),
    PlayerMoved {
        id: ClientId,
        position: Vec3,
        rotation: Vec3,
    },
    PlayerShot {
        shooter_id: ClientId,
        ray: Ray,
    },
    HpUpdate {
        player_id: ClientId,
        hp: i32,
    },
    PlayerDied {
        player_id: ClientId,
        killer_id: ClientId,
    },
    ScoreUpdate(Vec<ScoreEntry>),
    PlayerNameChanged {
        id: ClientId,
        name: String,
    },
    NameChangeRejected {
        reason: NameRejection,
    },
    PlayerSkinChanged {
        player_id: ClientId,
        texture_style: TextureStyle,
    },
    ConsoleMessage(String),
    MapChange {
        map_name: String,
        position: Vec3,
    },
    PlayerRespawn {
        player_id: ClientId,
        position: Vec3,
        hp: i32,
    },
    PlayerLeft {
        id: ClientId,
    },
    Disconnected {
        reason: String,
    },
}
