use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
};
use tracing::{debug, warn};

use super::checkin::Checkin;

/// Interface for abstracting durable storage of check-ins. The collection
/// talks to disk only through this seam.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckinStorage: Send + Sync {
    /// Reads every persisted check-in. A missing file is an empty store.
    async fn load(&self) -> io::Result<Vec<Checkin>>;

    /// Durably replaces the persisted set with `checkins`. Returning `Ok`
    /// means the data reached the file and was flushed.
    async fn save(&self, checkins: &[Checkin]) -> io::Result<()>;
}

/// The main realization of [CheckinStorage]. Stores the whole collection as
/// JSON lines in a single file inside the application data directory. The
/// data set is personal-scale, so a full rewrite per mutation is cheaper than
/// it sounds and keeps recovery trivial.
pub struct JsonFileStorage {
    path: PathBuf,
}

const STORE_FILE_NAME: &str = "checkins.jsonl";

impl JsonFileStorage {
    pub fn new(data_dir: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(data_dir)?;

        Ok(Self {
            path: data_dir.join(STORE_FILE_NAME),
        })
    }
}

#[async_trait]
impl CheckinStorage for JsonFileStorage {
    async fn load(&self) -> io::Result<Vec<Checkin>> {
        debug!("Loading check-ins from {:?}", self.path);
        let file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e),
        };
        file.lock_shared()?;
        let buffer = BufReader::new(file);
        let mut lines = buffer.lines();
        let mut checkins = vec![];
        loop {
            // read errors must surface; only corrupt lines are skippable
            let Some(v) = lines.next_line().await? else {
                break;
            };
            match serde_json::from_str::<Checkin>(&v) {
                Ok(v) => checkins.push(v),
                Err(e) => {
                    // ignore illegal values. Might happen after shutdowns
                    warn!(
                        "During parsing in path {:?} found illegal json string {}:  {e}",
                        self.path, &v
                    )
                }
            }
        }

        lines.into_inner().into_inner().unlock_async().await?;

        Ok(checkins)
    }

    async fn save(&self, checkins: &[Checkin]) -> io::Result<()> {
        let mut buffer = Vec::<u8>::new();
        for checkin in checkins {
            serde_json::to_writer(&mut buffer, checkin).map_err(io::Error::other)?;
            buffer.push(b'\n');
        }

        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .await?;

        file.lock_exclusive()?;
        let result = Self::overwrite(&mut file, &buffer).await;
        file.unlock_async().await?;
        result
    }
}

impl JsonFileStorage {
    async fn overwrite(file: &mut File, buffer: &[u8]) -> io::Result<()> {
        file.set_len(0).await?;
        file.write_all(buffer).await?;
        file.flush().await?;
        Ok(())
    }
}
