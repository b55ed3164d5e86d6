//! Static field mapping: replay-model accessor → schema leaf path
//!
//! Paths name schema keys. In player tables `#` stands for the port index.
//! An accessor returning `None` leaves the schema default in place.

use slp_shared::{GameEnd, GameStart, Player, PostFrame, PreFrame};
use std::borrow::Cow;

use crate::schema::Scalar;

/// One mapping entry
pub struct Binding<T> {
    pub path: &'static str,
    pub read: fn(&T) -> Option<Scalar>,
}

impl<T> Binding<T> {
    /// Concrete path with `#` replaced by `index`
    pub fn resolve(&self, index: Option<usize>) -> Cow<'static, str> {
        match index {
            Some(index) => Cow::Owned(self.path.replace('#', &index.to_string())),
            None => Cow::Borrowed(self.path),
        }
    }
}

const fn bind<T>(path: &'static str, read: fn(&T) -> Option<Scalar>) -> Binding<T> {
    Binding { path, read }
}

pub const START_FIELDS: &[Binding<GameStart>] = &[
    bind("gameinfoblock.isteams", |s: &GameStart| s.is_teams.map(Scalar::from)),
    bind("gameinfoblock.stage", |s: &GameStart| s.stage.map(Scalar::from)),
    bind("randomseed", |s: &GameStart| s.random_seed.map(Scalar::from)),
    bind("pal", |s: &GameStart| s.is_pal.map(Scalar::from)),
    bind("frozenps", |s: &GameStart| s.is_frozen_ps.map(Scalar::from)),
];

pub const PLAYER_FIELDS: &[Binding<Player>] = &[
    bind("gameinfoblock.playerdata[#].externalcharid", |p: &Player| {
        p.character.map(Scalar::from)
    }),
    bind("gameinfoblock.playerdata[#].playertype", |p: &Player| p.kind.map(Scalar::from)),
    bind("gameinfoblock.playerdata[#].stockstartcount", |p: &Player| {
        p.stocks.map(Scalar::from)
    }),
    bind("gameinfoblock.playerdata[#].costumeindex", |p: &Player| {
        p.costume.map(Scalar::from)
    }),
    bind("gameinfoblock.playerdata[#].teamid", |p: &Player| p.team.map(Scalar::from)),
    bind("nametag[#].nametag", |p: &Player| p.tag.as_deref().map(Scalar::from)),
    bind("dashandshieldfix[#].dashbackfix", |p: &Player| {
        p.ucf.as_ref().and_then(|ucf| ucf.dash_back).map(Scalar::from)
    }),
    bind("dashandshieldfix[#].shielddropfix", |p: &Player| {
        p.ucf.as_ref().and_then(|ucf| ucf.shield_drop).map(Scalar::from)
    }),
];

pub const PRE_FRAME_FIELDS: &[Binding<PreFrame>] = &[
    bind("randomseed", |f: &PreFrame| f.random_seed.map(Scalar::from)),
    bind("actionstateid", |f: &PreFrame| f.state.map(Scalar::from)),
    bind("xposition", |f: &PreFrame| f.position.map(|p| Scalar::from(p.x))),
    bind("yposition", |f: &PreFrame| f.position.map(|p| Scalar::from(p.y))),
    bind("facingdirection", |f: &PreFrame| f.direction.map(Scalar::from)),
    bind("joystickx", |f: &PreFrame| f.joystick.map(|p| Scalar::from(p.x))),
    bind("joysticky", |f: &PreFrame| f.joystick.map(|p| Scalar::from(p.y))),
    bind("cstickx", |f: &PreFrame| f.cstick.map(|p| Scalar::from(p.x))),
    bind("csticky", |f: &PreFrame| f.cstick.map(|p| Scalar::from(p.y))),
    bind("trigger", |f: &PreFrame| f.trigger.map(Scalar::from)),
    bind("processedbuttons", |f: &PreFrame| f.buttons.map(Scalar::from)),
    bind("percent", |f: &PreFrame| f.damage.map(Scalar::from)),
];

pub const POST_FRAME_FIELDS: &[Binding<PostFrame>] = &[
    bind("internalcharid", |f: &PostFrame| f.character.map(Scalar::from)),
    bind("actionstateid", |f: &PostFrame| f.state.map(Scalar::from)),
    bind("xposition", |f: &PostFrame| f.position.map(|p| Scalar::from(p.x))),
    bind("yposition", |f: &PostFrame| f.position.map(|p| Scalar::from(p.y))),
    bind("facingdirection", |f: &PostFrame| f.direction.map(Scalar::from)),
    bind("percent", |f: &PostFrame| f.damage.map(Scalar::from)),
    bind("shieldsize", |f: &PostFrame| f.shield.map(Scalar::from)),
    bind("lastattacklanded", |f: &PostFrame| f.last_attack_landed.map(Scalar::from)),
    bind("currentcombocount", |f: &PostFrame| f.combo_count.map(Scalar::from)),
    bind("lasthitby", |f: &PostFrame| f.last_hit_by.map(Scalar::from)),
    bind("stocksremaining", |f: &PostFrame| f.stocks.map(Scalar::from)),
    bind("actionstateframecounter", |f: &PostFrame| f.state_age.map(Scalar::from)),
    bind("isairborne", |f: &PostFrame| f.airborne.map(Scalar::from)),
    bind("lastgroundid", |f: &PostFrame| f.ground.map(Scalar::from)),
    bind("jumpsremaining", |f: &PostFrame| f.jumps.map(Scalar::from)),
    bind("lcancelstatus", |f: &PostFrame| f.l_cancel.map(Scalar::from)),
];

pub const END_FIELDS: &[Binding<GameEnd>] = &[
    bind("gameendmethod", |e: &GameEnd| e.method.map(Scalar::from)),
    bind("lrasinitiator", |e: &GameEnd| e.lras_initiator.map(Scalar::from)),
];
