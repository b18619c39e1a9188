//! In-memory world for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::domain::{Block, TilePos, Vec3, World, WorldError};

#[derive(Default)]
pub struct FakeWorld {
    blocks: Mutex<HashMap<TilePos, Block>>,
    player: Mutex<Option<Vec3>>,
    chat: Mutex<Vec<String>>,
    calls: AtomicUsize,
    offline: AtomicBool,
}

impl FakeWorld {
    pub fn block_at(&self, pos: TilePos) -> Option<Block> {
        self.blocks.lock().unwrap().get(&pos).copied()
    }

    pub fn player(&self) -> Vec3 {
        self.player.lock().unwrap().unwrap_or(Vec3 { x: 0.0, y: 0.0, z: 0.0 })
    }

    pub fn chat(&self) -> Vec<String> {
        self.chat.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    fn enter(&self) -> Result<(), WorldError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(WorldError::Connection("offline".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl World for FakeWorld {
    async fn get_block(&self, pos: TilePos) -> Result<u8, WorldError> {
        self.enter()?;
        Ok(self.block_at(pos).map(|b| b.id).unwrap_or(0))
    }

    async fn set_block(&self, pos: TilePos, block: Block) -> Result<(), WorldError> {
        self.enter()?;
        self.blocks.lock().unwrap().insert(pos, block);
        Ok(())
    }

    async fn set_blocks(&self, from: TilePos, to: TilePos, block: Block) -> Result<(), WorldError> {
        self.enter()?;
        let mut blocks = self.blocks.lock().unwrap();
        for x in from.x.min(to.x)..=from.x.max(to.x) {
            for y in from.y.min(to.y)..=from.y.max(to.y) {
                for z in from.z.min(to.z)..=from.z.max(to.z) {
                    blocks.insert(TilePos::new(x, y, z), block);
                }
            }
        }
        Ok(())
    }

    async fn get_height(&self, x: i32, z: i32) -> Result<i32, WorldError> {
        self.enter()?;
        let blocks = self.blocks.lock().unwrap();
        Ok(blocks
            .iter()
            .filter(|(p, b)| p.x == x && p.z == z && b.id != 0)
            .map(|(p, _)| p.y)
            .max()
            .unwrap_or(0))
    }

    async fn player_pos(&self) -> Result<Vec3, WorldError> {
        self.enter()?;
        Ok(self.player())
    }

    async fn player_tile(&self) -> Result<TilePos, WorldError> {
        self.enter()?;
        let p = self.player();
        Ok(TilePos::new(p.x.floor() as i32, p.y.floor() as i32, p.z.floor() as i32))
    }

    async fn set_player_pos(&self, pos: Vec3) -> Result<(), WorldError> {
        self.enter()?;
        *self.player.lock().unwrap() = Some(pos);
        Ok(())
    }

    async fn set_player_tile(&self, pos: TilePos) -> Result<(), WorldError> {
        self.enter()?;
        *self.player.lock().unwrap() = Some(Vec3 { x: pos.x as f64, y: pos.y as f64, z: pos.z as f64 });
        Ok(())
    }

    async fn post_to_chat(&self, message: &str) -> Result<(), WorldError> {
        self.enter()?;
        self.chat.lock().unwrap().push(message.to_owned());
        Ok(())
    }
}
