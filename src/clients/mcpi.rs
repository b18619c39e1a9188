//! Client for the game's line-based text API (`world.getBlock(x,y,z)\n` → `1\n`).
//!
//! One TCP connection per command: the commands are tiny and independent, and it keeps
//! the client free of shared connection state.

use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::domain::{Block, TilePos, Vec3, World, WorldError};
use crate::infra::config::WorldConfig;
use crate::infra::runtime::limits::retry_async_when;

#[derive(Clone, Debug)]
pub struct McpiRemote {
    addr: String,
    retries: u32,
    retry_delay_ms: u64,
    connect_timeout: Duration,
    timeout: Duration,
}

impl McpiRemote {
    pub fn from_config(cfg: &WorldConfig) -> Self {
        Self {
            addr: format!("{}:{}", cfg.host, cfg.port),
            retries: cfg.retries,
            retry_delay_ms: cfg.retry_delay_ms,
            connect_timeout: Duration::from_millis(cfg.connect_timeout_ms),
            timeout: Duration::from_millis(cfg.timeout_ms),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn connect(&self) -> Result<TcpStream, WorldError> {
        let addr = self.addr.clone();
        let connect_timeout = self.connect_timeout;
        retry_async_when(self.retries, self.retry_delay_ms, WorldError::is_retryable, move |attempt| {
            let addr = addr.clone();
            async move {
                if attempt > 0 {
                    tracing::warn!(%addr, attempt, "retrying game server connection");
                }
                match tokio::time::timeout(connect_timeout, TcpStream::connect(&addr)).await {
                    Ok(Ok(stream)) => Ok(stream),
                    Ok(Err(e)) => Err(WorldError::Connection(format!(
                        "{addr}: {e} (is the game server running?)"
                    ))),
                    Err(_) => Err(WorldError::Timeout(connect_timeout.as_millis() as u64)),
                }
            }
        })
        .await
    }

    /// Send a command that has no reply.
    async fn send(&self, command: &str) -> Result<(), WorldError> {
        let start = Instant::now();
        let mut stream = self.connect().await?;
        tracing::debug!(command = command.trim_end(), "world command");
        self.with_timeout(async {
            stream.write_all(command.as_bytes()).await?;
            stream.flush().await
        })
        .await?;
        crate::infra::logging::log_metric("world", "world_latency_ms", start.elapsed().as_millis() as f64);
        Ok(())
    }

    /// Send a command and read its one-line reply.
    async fn query(&self, command: &str) -> Result<String, WorldError> {
        let start = Instant::now();
        let stream = self.connect().await?;
        tracing::debug!(command = command.trim_end(), "world query");
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        let mut line = String::new();
        let read = self
            .with_timeout(async {
                write_half.write_all(command.as_bytes()).await?;
                write_half.flush().await?;
                reader.read_line(&mut line).await
            })
            .await?;
        if read == 0 {
            return Err(WorldError::Protocol("connection closed before reply".into()));
        }
        let reply = line.trim_end().to_owned();
        if reply == "Fail" {
            return Err(WorldError::Protocol(format!("command rejected: {}", command.trim_end())));
        }
        crate::infra::logging::log_metric("world", "world_latency_ms", start.elapsed().as_millis() as f64);
        Ok(reply)
    }

    async fn with_timeout<T>(
        &self,
        fut: impl std::future::Future<Output = std::io::Result<T>>,
    ) -> Result<T, WorldError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => Err(WorldError::Connection(e.to_string())),
            Err(_) => Err(WorldError::Timeout(self.timeout.as_millis() as u64)),
        }
    }
}

fn command(method: &str, args: &[String]) -> String {
    format!("{method}({})\n", args.join(","))
}

fn tile_args(pos: TilePos) -> Vec<String> {
    vec![pos.x.to_string(), pos.y.to_string(), pos.z.to_string()]
}

fn block_args(block: Block) -> Vec<String> {
    let mut args = vec![block.id.to_string()];
    if let Some(data) = block.data {
        args.push(data.to_string());
    }
    args
}

fn parse_number<T: std::str::FromStr>(reply: &str) -> Result<T, WorldError> {
    // Some servers answer integers as floats ("64.0").
    reply
        .trim()
        .parse::<T>()
        .or_else(|_| {
            reply
                .trim()
                .parse::<f64>()
                .map_err(|_| ())
                .and_then(|f| (f.trunc() as i64).to_string().parse::<T>().map_err(|_| ()))
        })
        .map_err(|_| WorldError::Protocol(format!("expected a number, got {reply:?}")))
}

fn parse_triple(reply: &str) -> Result<[f64; 3], WorldError> {
    let parts: Vec<&str> = reply.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(WorldError::Protocol(format!("expected x,y,z, got {reply:?}")));
    }
    let mut out = [0.0; 3];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .parse::<f64>()
            .map_err(|_| WorldError::Protocol(format!("expected x,y,z, got {reply:?}")))?;
    }
    Ok(out)
}

/// The API is line-based; a newline inside a chat message would split the command.
fn sanitize_chat(message: &str) -> String {
    message.replace(['\r', '\n'], " ")
}

#[async_trait::async_trait]
impl World for McpiRemote {
    async fn get_block(&self, pos: TilePos) -> Result<u8, WorldError> {
        let reply = self.query(&command("world.getBlock", &tile_args(pos))).await?;
        parse_number::<u8>(&reply)
    }

    async fn set_block(&self, pos: TilePos, block: Block) -> Result<(), WorldError> {
        let mut args = tile_args(pos);
        args.extend(block_args(block));
        self.send(&command("world.setBlock", &args)).await
    }

    async fn set_blocks(&self, from: TilePos, to: TilePos, block: Block) -> Result<(), WorldError> {
        let mut args = tile_args(from);
        args.extend(tile_args(to));
        args.extend(block_args(block));
        self.send(&command("world.setBlocks", &args)).await
    }

    async fn get_height(&self, x: i32, z: i32) -> Result<i32, WorldError> {
        let reply = self
            .query(&command("world.getHeight", &[x.to_string(), z.to_string()]))
            .await?;
        parse_number::<i32>(&reply)
    }

    async fn player_pos(&self) -> Result<Vec3, WorldError> {
        let reply = self.query(&command("player.getPos", &[])).await?;
        let [x, y, z] = parse_triple(&reply)?;
        Ok(Vec3 { x, y, z })
    }

    async fn player_tile(&self) -> Result<TilePos, WorldError> {
        let reply = self.query(&command("player.getTile", &[])).await?;
        let [x, y, z] = parse_triple(&reply)?;
        Ok(TilePos::new(x as i32, y as i32, z as i32))
    }

    async fn set_player_pos(&self, pos: Vec3) -> Result<(), WorldError> {
        let args = [pos.x.to_string(), pos.y.to_string(), pos.z.to_string()];
        self.send(&command("player.setPos", &args)).await
    }

    async fn set_player_tile(&self, pos: TilePos) -> Result<(), WorldError> {
        self.send(&command("player.setTile", &tile_args(pos))).await
    }

    async fn post_to_chat(&self, message: &str) -> Result<(), WorldError> {
        self.send(&command("chat.post", &[sanitize_chat(message)])).await
    }
}
