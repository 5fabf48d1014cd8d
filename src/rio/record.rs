//! rio/record - record descriptors and decoded frames.

use anyhow::Result;
use serde::de::DeserializeOwned;
use std::borrow::Cow;

use super::codec::{codec_name, decode_value, decompress};
use crate::error::RioError;

/// Named record descriptor bound to a stream.
///
/// A record must be connected to a block before it can be written; with
/// `unpack` set it decodes matching frames on read.
#[derive(Debug, Clone)]
pub struct Record {
    name: String,
    unpack: bool,
    blocks: Vec<String>,
}

impl Record {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            unpack: false,
            blocks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unpack(&self) -> bool {
        self.unpack
    }

    pub fn set_unpack(&mut self, on: bool) {
        self.unpack = on;
    }

    /// Connect a named block to this record. Connecting the same block twice
    /// yields `RioError::BlockConnected`.
    pub fn connect(&mut self, block: &str) -> std::result::Result<(), RioError> {
        if self.blocks.iter().any(|b| b == block) {
            return Err(RioError::BlockConnected {
                record: self.name.clone(),
                block: block.to_string(),
            });
        }
        self.blocks.push(block.to_string());
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        !self.blocks.is_empty()
    }

    /// Decode `frame` if it belongs to this record and unpacking is on.
    /// Returns Ok(None) for frames of other records.
    pub fn unpack_frame<T: DeserializeOwned>(&self, frame: &Frame) -> Result<Option<T>> {
        if !self.unpack || frame.name != self.name {
            return Ok(None);
        }
        frame.decode().map(Some)
    }
}

/// One physical record read from the stream.
#[derive(Debug, Clone)]
pub struct Frame {
    pub name: String,
    pub flags: u16,
    /// Absolute offset of the frame header.
    pub pos: u64,
    /// Total frame size (header + name + stored payload).
    pub len: u64,
    payload: Vec<u8>,
}

impl Frame {
    pub(crate) fn new(name: String, flags: u16, pos: u64, len: u64, payload: Vec<u8>) -> Self {
        Self {
            name,
            flags,
            pos,
            len,
            payload,
        }
    }

    /// Payload as stored on disk (possibly compressed).
    pub fn stored_payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload after undoing the frame codec.
    pub fn payload(&self) -> Result<Cow<'_, [u8]>> {
        decompress(&self.name, self.flags, &self.payload)
    }

    pub fn codec(&self) -> &'static str {
        codec_name(self.flags)
    }

    /// Offset right after this frame.
    pub fn end(&self) -> u64 {
        self.pos + self.len
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let raw = self.payload()?;
        decode_value(&self.name, &raw)
    }
}
