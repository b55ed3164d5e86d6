//! Replay model → value trees
//!
//! Instantiates the schema blocks with their defaults, then overwrites the
//! leaves the replay model can supply. Frame data is expanded into one event
//! tree per (frame, port, leader/follower, pre/post).

use slp_shared::{EntityFrame, EventCode, Frame, GameStart, PortFrame, ReplayModel};

use super::binary::{ContainerFormatError, ContainerPrefix, EmbeddedBlob, PrefixBuilder};
use super::flags::{STATE_FLAG_FIELDS, pack_state_flags};
use super::mapping::{
    Binding, END_FIELDS, PLAYER_FIELDS, POST_FRAME_FIELDS, PRE_FRAME_FIELDS, START_FIELDS,
};
use crate::error::{EncodeError, Result};
use crate::schema::{
    END_BLOCK, FRAME_BLOCK, FieldSpec, POST_FRAME, PRE_FRAME, START_BLOCK, Scalar, Schema,
};
use crate::tree::ValueNode;
use crate::version::Version;

/// One per-frame event tree
#[derive(Debug, Clone, PartialEq)]
pub struct FrameEvent {
    pub code: EventCode,
    pub tree: ValueNode,
}

/// Populated trees for one encode, in write order
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltReplay {
    /// Version every leaf is gated against
    pub version: Version,
    pub start: ValueNode,
    pub frames: Vec<FrameEvent>,
    pub end: Option<ValueNode>,
}

impl BuiltReplay {
    /// Compute the container prefix for these trees plus an optional blob
    pub fn prefix(&self, blob: Option<&EmbeddedBlob>) -> Result<ContainerPrefix, ContainerFormatError> {
        let mut builder = PrefixBuilder::new(self.version);
        builder.add_block(EventCode::GameStart.code(), &self.start)?;
        if let Some(blob) = blob {
            builder.add_blob(blob)?;
        }
        for event in &self.frames {
            builder.add_block(event.code.code(), &event.tree)?;
        }
        if let Some(end) = &self.end {
            builder.add_block(EventCode::GameEnd.code(), end)?;
        }
        builder.finish()
    }
}

/// Builds value trees from a schema and an optional replay model
pub struct TreeBuilder<'a> {
    schema: &'a Schema,
    fallback: Option<Version>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            fallback: None,
        }
    }

    /// Version used when the model carries no build version
    pub fn with_fallback_version(mut self, version: Option<Version>) -> Self {
        self.fallback = version;
        self
    }

    /// The model's build version, else the fallback, else the newest version
    /// the schema knows (every field is emitted).
    pub fn active_version<M>(&self, model: Option<&M>) -> Result<Version>
    where
        M: ReplayModel + ?Sized,
    {
        match model.and_then(|m| m.build_version()) {
            Some(build) => Ok(Version::parse(build)?),
            None => Ok(self
                .fallback
                .or_else(|| self.schema.max_introduced_version())
                .unwrap_or_default()),
        }
    }

    pub fn build<M>(&self, model: Option<&M>) -> Result<BuiltReplay>
    where
        M: ReplayModel + ?Sized,
    {
        let version = self.active_version(model)?;

        let mut start = ValueNode::instantiate(self.schema.require_block(START_BLOCK)?);
        let mut end = self.schema.block(END_BLOCK).map(ValueNode::instantiate);
        let mut frames = Vec::new();

        if let Some(model) = model {
            if let Some(game) = model.start() {
                populate_start(&mut start, game)?;
            }
            if model.build_version().is_some() {
                set_version(&mut start, version)?;
            }

            if !model.frames().is_empty() {
                let expander = FrameExpander::new(self.schema)?;
                for frame in model.frames() {
                    expander.expand(frame, &mut frames)?;
                }
            }

            if let (Some(tree), Some(game_end)) = (end.as_mut(), model.end()) {
                apply(tree, END_BLOCK, END_FIELDS, game_end, None)?;
            }
        }

        tracing::debug!(
            "Built replay trees at version {}: {} frame events, end block {}",
            version,
            frames.len(),
            if end.is_some() { "present" } else { "absent" }
        );

        Ok(BuiltReplay {
            version,
            start,
            frames,
            end,
        })
    }
}

fn populate_start(tree: &mut ValueNode, game: &GameStart) -> Result<()> {
    apply(tree, START_BLOCK, START_FIELDS, game, None)?;
    for (port, player) in game.players.iter().enumerate() {
        if let Some(player) = player {
            apply(tree, START_BLOCK, PLAYER_FIELDS, player, Some(port))?;
        }
    }
    Ok(())
}

fn set_version(tree: &mut ValueNode, version: Version) -> Result<()> {
    assign(tree, START_BLOCK, "version.major", Scalar::from(version.major))?;
    assign(tree, START_BLOCK, "version.minor", Scalar::from(version.minor))?;
    assign(tree, START_BLOCK, "version.build", Scalar::from(version.patch))
}

/// Overwrite every leaf whose accessor yields a value
fn apply<T>(
    tree: &mut ValueNode,
    block: &str,
    bindings: &[Binding<T>],
    source: &T,
    index: Option<usize>,
) -> Result<()> {
    for binding in bindings {
        if let Some(value) = (binding.read)(source) {
            assign(tree, block, &binding.resolve(index), value)?;
        }
    }
    Ok(())
}

fn assign(tree: &mut ValueNode, block: &str, path: &str, value: Scalar) -> Result<()> {
    let Some(leaf) = tree.leaf_mut(path) else {
        tracing::debug!("{}.{} not in schema, skipping", block, path);
        return Ok(());
    };
    leaf.set(value).map_err(|source| EncodeError::ValueOutOfRange {
        path: format!("{block}.{path}"),
        source,
    })
}

/// Leader first, then the follower if present
fn entities(port: &PortFrame) -> impl Iterator<Item = (&EntityFrame, bool)> {
    std::iter::once((&port.leader, false)).chain(port.follower.iter().map(|f| (f, true)))
}

struct FrameExpander<'s> {
    pre: &'s FieldSpec,
    post: &'s FieldSpec,
    pre_label: String,
    post_label: String,
}

impl<'s> FrameExpander<'s> {
    fn new(schema: &'s Schema) -> Result<Self> {
        let (pre, post) = schema.frame_templates()?;
        Ok(Self {
            pre,
            post,
            pre_label: format!("{FRAME_BLOCK}.{PRE_FRAME}"),
            post_label: format!("{FRAME_BLOCK}.{POST_FRAME}"),
        })
    }

    /// Append this frame's events: every pre-frame update, then every
    /// post-frame update, both in port order
    fn expand(&self, frame: &Frame, events: &mut Vec<FrameEvent>) -> Result<()> {
        let mut posts = Vec::new();

        for (port, data) in frame.ports.iter().enumerate() {
            let Some(data) = data else { continue };

            for (entity, follower) in entities(data) {
                if let Some(pre) = &entity.pre {
                    let mut tree = self.event(self.pre, &self.pre_label, frame.index, port, follower)?;
                    apply(&mut tree, &self.pre_label, PRE_FRAME_FIELDS, pre, None)?;
                    events.push(FrameEvent {
                        code: EventCode::PreFrameUpdate,
                        tree,
                    });
                }

                if let Some(post) = &entity.post {
                    let mut tree = self.event(self.post, &self.post_label, frame.index, port, follower)?;
                    apply(&mut tree, &self.post_label, POST_FRAME_FIELDS, post, None)?;
                    if let Some(flags) = post.flags {
                        for (field, byte) in STATE_FLAG_FIELDS.iter().zip(pack_state_flags(flags)) {
                            assign(&mut tree, &self.post_label, field, Scalar::from(byte))?;
                        }
                    }
                    posts.push(FrameEvent {
                        code: EventCode::PostFrameUpdate,
                        tree,
                    });
                }
            }
        }

        events.append(&mut posts);
        Ok(())
    }

    fn event(
        &self,
        template: &FieldSpec,
        label: &str,
        frame: i32,
        port: usize,
        follower: bool,
    ) -> Result<ValueNode> {
        let mut tree = ValueNode::instantiate(template);
        assign(&mut tree, label, "frame", Scalar::from(frame))?;
        assign(&mut tree, label, "playerindex", Scalar::Int(port as i64))?;
        assign(&mut tree, label, "isfollower", Scalar::from(follower))?;
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaError, Value, ValueError};
    use slp_shared::{Game, GameEnd, Player, PostFrame, PreFrame, StateFlags, UcfToggles};

    fn bundled() -> Schema {
        Schema::bundled().unwrap()
    }

    fn leaf(tree: &ValueNode, path: &str) -> Value {
        tree.leaf(path).unwrap().value().clone()
    }

    fn game_with_version(version: &str) -> Game {
        Game {
            start: Some(GameStart {
                slippi_version: Some(version.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_model_uses_defaults() {
        let schema = bundled();
        let built = TreeBuilder::new(&schema).build::<Game>(None).unwrap();

        assert_eq!(Some(built.version), schema.max_introduced_version());
        assert!(built.frames.is_empty());
        assert_eq!(leaf(&built.start, "commandbyte"), Value::U8(0x36));
        assert_eq!(leaf(built.end.as_ref().unwrap(), "commandbyte"), Value::U8(0x39));
        assert_eq!(
            built.start,
            ValueNode::instantiate(schema.block(START_BLOCK).unwrap())
        );
    }

    #[test]
    fn test_fallback_version() {
        let schema = bundled();
        let fallback = Version::new(1, 0, 0);
        let builder = TreeBuilder::new(&schema).with_fallback_version(Some(fallback));
        assert_eq!(builder.active_version::<Game>(None).unwrap(), fallback);
        assert_eq!(builder.active_version(Some(&Game::default())).unwrap(), fallback);

        let game = game_with_version("3.4.0");
        assert_eq!(builder.active_version(Some(&game)).unwrap(), Version::new(3, 4, 0));
    }

    #[test]
    fn test_build_version_sets_version_leaves() {
        let schema = bundled();
        let built = TreeBuilder::new(&schema)
            .build(Some(&game_with_version("3.4.0")))
            .unwrap();
        assert_eq!(built.version, Version::new(3, 4, 0));
        assert_eq!(leaf(&built.start, "version.major"), Value::U8(3));
        assert_eq!(leaf(&built.start, "version.minor"), Value::U8(4));
        assert_eq!(leaf(&built.start, "version.build"), Value::U8(0));
    }

    #[test]
    fn test_malformed_build_version() {
        let schema = bundled();
        let err = TreeBuilder::new(&schema)
            .build(Some(&game_with_version("3.4")))
            .unwrap_err();
        assert!(matches!(err, EncodeError::Version(_)));
    }

    #[test]
    fn test_player_fields_land_in_their_port() {
        let schema = bundled();
        let mut start = GameStart {
            is_teams: Some(true),
            stage: Some(31),
            ..Default::default()
        };
        start.players[2] = Some(Player {
            character: Some(20),
            stocks: Some(4),
            tag: Some("ABCD".to_string()),
            ucf: Some(UcfToggles {
                dash_back: Some(1),
                shield_drop: None,
            }),
            ..Default::default()
        });
        let game = Game {
            start: Some(start),
            ..Default::default()
        };

        let built = TreeBuilder::new(&schema).build(Some(&game)).unwrap();
        let tree = &built.start;
        assert_eq!(leaf(tree, "gameinfoblock.isteams"), Value::Bool(true));
        assert_eq!(leaf(tree, "gameinfoblock.stage"), Value::U16(31));
        assert_eq!(
            leaf(tree, "gameinfoblock.playerdata[2].externalcharid"),
            Value::U8(20)
        );
        assert_eq!(
            leaf(tree, "gameinfoblock.playerdata[2].stockstartcount"),
            Value::U8(4)
        );
        assert_eq!(leaf(tree, "dashandshieldfix[2].dashbackfix"), Value::U32(1));
        assert_eq!(leaf(tree, "dashandshieldfix[2].shielddropfix"), Value::U32(0));

        let mut tag = b"ABCD".to_vec();
        tag.resize(16, 0);
        assert_eq!(leaf(tree, "nametag[2].nametag"), Value::Bytes(tag));

        for port in [0, 1, 3] {
            let path = format!("gameinfoblock.playerdata[{port}].externalcharid");
            assert_eq!(leaf(tree, &path), Value::U8(0));
        }
    }

    #[test]
    fn test_frame_event_order() {
        let schema = bundled();
        let entity = || EntityFrame {
            pre: Some(PreFrame::default()),
            post: Some(PostFrame::default()),
        };
        let mut frame = Frame {
            index: -123,
            ..Default::default()
        };
        frame.ports[0] = Some(PortFrame {
            leader: entity(),
            follower: Some(entity()),
        });
        frame.ports[3] = Some(PortFrame {
            leader: entity(),
            follower: None,
        });
        let game = Game {
            frames: vec![frame],
            ..Default::default()
        };

        let built = TreeBuilder::new(&schema).build(Some(&game)).unwrap();
        let order: Vec<(EventCode, Value, Value)> = built
            .frames
            .iter()
            .map(|e| (e.code, leaf(&e.tree, "playerindex"), leaf(&e.tree, "isfollower")))
            .collect();

        let pre = EventCode::PreFrameUpdate;
        let post = EventCode::PostFrameUpdate;
        assert_eq!(
            order,
            vec![
                (pre, Value::U8(0), Value::Bool(false)),
                (pre, Value::U8(0), Value::Bool(true)),
                (pre, Value::U8(3), Value::Bool(false)),
                (post, Value::U8(0), Value::Bool(false)),
                (post, Value::U8(0), Value::Bool(true)),
                (post, Value::U8(3), Value::Bool(false)),
            ]
        );
        assert!(
            built
                .frames
                .iter()
                .all(|e| leaf(&e.tree, "frame") == Value::I32(-123))
        );
    }

    #[test]
    fn test_post_frame_flags_packed() {
        let schema = bundled();
        let mut frame = Frame::default();
        frame.ports[1] = Some(PortFrame {
            leader: EntityFrame {
                pre: None,
                post: Some(PostFrame {
                    flags: Some(StateFlags::SHIELD | StateFlags::OFF_SCREEN),
                    damage: Some(42.5),
                    ..Default::default()
                }),
            },
            follower: None,
        });
        let game = Game {
            frames: vec![frame],
            ..Default::default()
        };

        let built = TreeBuilder::new(&schema).build(Some(&game)).unwrap();
        assert_eq!(built.frames.len(), 1);
        let tree = &built.frames[0].tree;
        assert_eq!(leaf(tree, "statebitflags3"), Value::U8(0x80));
        assert_eq!(leaf(tree, "statebitflags5"), Value::U8(0x80));
        assert_eq!(leaf(tree, "statebitflags1"), Value::U8(0));
        assert_eq!(leaf(tree, "percent"), Value::F32(42.5));
    }

    #[test]
    fn test_end_block_populated() {
        let schema = bundled();
        let game = Game {
            end: Some(GameEnd {
                method: Some(2),
                lras_initiator: Some(1),
            }),
            ..Default::default()
        };
        let built = TreeBuilder::new(&schema).build(Some(&game)).unwrap();
        let end = built.end.unwrap();
        assert_eq!(leaf(&end, "gameendmethod"), Value::U8(2));
        assert_eq!(leaf(&end, "lrasinitiator"), Value::I8(1));
    }

    const SMALL_SCHEMA: &str = r#"{
        "start": {
            "commandbyte": { "value": "0x36", "type": "uint8", "introduced-version": "0.1.0" },
            "gameinfoblock": {
                "stage": { "value": "0", "type": "uint8", "introduced-version": "0.1.0" }
            }
        }
    }"#;

    #[test]
    fn test_value_out_of_range_names_path() {
        let schema = Schema::from_json(SMALL_SCHEMA).unwrap();
        let game = Game {
            start: Some(GameStart {
                stage: Some(300),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = TreeBuilder::new(&schema).build(Some(&game)).unwrap_err();
        match err {
            EncodeError::ValueOutOfRange { path, source } => {
                assert_eq!(path, "start.gameinfoblock.stage");
                assert!(matches!(source, ValueError::OutOfRange { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unmapped_schema_paths_are_skipped() {
        // No pal, frozenps or player tables in this schema
        let schema = Schema::from_json(SMALL_SCHEMA).unwrap();
        let mut start = GameStart {
            is_pal: Some(true),
            is_frozen_ps: Some(true),
            ..Default::default()
        };
        start.players[0] = Some(Player {
            character: Some(2),
            ..Default::default()
        });
        let game = Game {
            start: Some(start),
            ..Default::default()
        };
        let built = TreeBuilder::new(&schema).build(Some(&game)).unwrap();
        assert!(built.end.is_none());
        assert_eq!(built.start.serialized_size(built.version), 2);
    }

    #[test]
    fn test_frames_require_frame_templates() {
        let schema = Schema::from_json(SMALL_SCHEMA).unwrap();
        let mut frame = Frame::default();
        frame.ports[0] = Some(PortFrame::default());
        let game = Game {
            frames: vec![frame],
            ..Default::default()
        };
        let err = TreeBuilder::new(&schema).build(Some(&game)).unwrap_err();
        assert!(matches!(
            err,
            EncodeError::Schema(SchemaError::MissingBlock(ref name)) if name == FRAME_BLOCK
        ));
    }

    #[test]
    fn test_prefix_counts_every_event() {
        let schema = bundled();
        let mut frame = Frame::default();
        frame.ports[0] = Some(PortFrame {
            leader: EntityFrame {
                pre: Some(PreFrame::default()),
                post: Some(PostFrame::default()),
            },
            follower: None,
        });
        let game = Game {
            frames: vec![frame.clone(), frame],
            end: Some(GameEnd::default()),
            ..game_with_version("2.0.0")
        };
        let built = TreeBuilder::new(&schema).build(Some(&game)).unwrap();
        let blob = EmbeddedBlob::new(0x3D, vec![0; 8]);
        let prefix = built.prefix(Some(&blob)).unwrap();

        let v = built.version;
        let events: usize = built.start.serialized_size(v)
            + blob.len()
            + built.frames.iter().map(|e| e.tree.serialized_size(v)).sum::<usize>()
            + built.end.as_ref().unwrap().serialized_size(v);
        let table = 2 + 3 * 5;
        assert_eq!(prefix.raw_length() as usize, table + events);
        assert_eq!(
            prefix.payload_size(0x36),
            Some((built.start.serialized_size(v) - 1) as u16)
        );
        assert_eq!(prefix.payload_size(0x3D), Some(8));
    }
}
