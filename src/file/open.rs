//! file/open - открытие существующего контейнера и создание нового.

use anyhow::{anyhow, Result};
use log::debug;
use std::fmt::Display;
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::File;
use crate::config::HioConfig;
use crate::consts::FILE_HEADER_RECORD;
use crate::dict::{Dictionary, Entry};
use crate::error::HioError;
use crate::footer::FileFooter;
use crate::header::FileHeader;
use crate::omap::OrderedMap;
use crate::rio::{Mode, Stream};

fn open_error(path: &Path, reason: impl Display) -> anyhow::Error {
    HioError::Open {
        path: path.display().to_string(),
        reason: format!("{:#}", reason),
    }
    .into()
}

impl File {
    /// Open an existing container read-only (config from HIO_* env).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, HioConfig::from_env())
    }

    pub fn open_with_config<P: AsRef<Path>>(path: P, cfg: HioConfig) -> Result<Self> {
        let path = path.as_ref();
        let mut s = Stream::open(path, &cfg).map_err(|e| open_error(path, e))?;

        let header = FileHeader::read_from(&mut s).map_err(|e| open_error(path, e))?;
        let begin = s.pos();
        if !header.is_finalized() {
            return Err(open_error(
                path,
                "footer position is 0 (file was never closed)",
            ));
        }
        if header.footer_pos as u64 >= s.len() {
            return Err(open_error(
                path,
                anyhow!(
                    "footer position {} is past the end of file ({} bytes)",
                    header.footer_pos,
                    s.len()
                ),
            ));
        }

        // seek to footer, read it, back to begin
        let footer = s
            .at(header.footer_pos as u64, FileFooter::read_from)
            .map_err(|e| open_error(path, e))?;

        let mut dict = Dictionary::new();
        for e in &footer.entries {
            if dict.put(&e.name, Entry::Unresolved).is_some() {
                return Err(open_error(path, format!("duplicate footer entry [{}]", e.name)));
            }
        }

        debug!(
            "hio: open {} (v{}, footer at {}, {} entries)",
            path.display(),
            header.version,
            header.footer_pos,
            footer.entries.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            cfg,
            mode: Mode::Read,
            stream: Arc::new(Mutex::new(s)),
            header,
            header_slot: None,
            footer,
            begin,
            dict,
            pending: OrderedMap::new(),
            tables: OrderedMap::new(),
            closed: false,
        })
    }

    /// Create (truncate) a container for writing (config from HIO_* env).
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::create_with_config(path, HioConfig::from_env())
    }

    pub fn create_with_config<P: AsRef<Path>>(path: P, cfg: HioConfig) -> Result<Self> {
        let path = path.as_ref();
        let mut s = Stream::create(path, &cfg)?;

        // резерв слота заголовка с footer_pos = 0
        let header = FileHeader::new();
        let slot = s.reserve(FILE_HEADER_RECORD, &header.encode())?;
        let begin = s.pos();

        debug!("hio: create {} ({})", path.display(), cfg);

        Ok(Self {
            path: path.to_path_buf(),
            cfg,
            mode: Mode::Write,
            stream: Arc::new(Mutex::new(s)),
            header,
            header_slot: Some(slot),
            footer: FileFooter::new(),
            begin,
            dict: Dictionary::new(),
            pending: OrderedMap::new(),
            tables: OrderedMap::new(),
            closed: false,
        })
    }
}
