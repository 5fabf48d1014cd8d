//! Общие константы формата hio (record frames, file header/footer, tables).

// -------- Record frames (rio) --------
//
// Layout (LE):
// [magic4 "HREC"]
// [name_len u16]
// [flags u16]        -- bits 0..1: payload codec (CODEC_*)
// [payload_len u32]  -- stored (possibly compressed) payload length
// [crc32 u32]        -- CRC over header (except crc field) + name + payload
// [name bytes][payload bytes]
//
// Total header size = 4 + 2 + 2 + 4 + 4 = 16 bytes.
pub const REC_MAGIC: &[u8; 4] = b"HREC";
pub const REC_HDR_SIZE: usize = 16;

// Offsets inside frame header
pub const REC_OFF_MAGIC: usize = 0;
pub const REC_OFF_NAME_LEN: usize = 4;
pub const REC_OFF_FLAGS: usize = 6;
pub const REC_OFF_LEN: usize = 8;
pub const REC_OFF_CRC32: usize = 12;

pub const REC_MAX_NAME_LEN: usize = u16::MAX as usize;

// Payload codecs (frame flags bits 0..1)
pub const REC_FLAG_CODEC_MASK: u16 = 0x3;
pub const CODEC_NONE: u16 = 0;
pub const CODEC_GZIP: u16 = 1;
pub const CODEC_ZSTD: u16 = 2;

// -------- Container --------
pub const HIO_MAGIC: &[u8; 4] = b"HIO\0";
pub const HIO_FORMAT_VERSION: u32 = 1;

pub const FILE_HEADER_RECORD: &str = "hio.FileHeader";
pub const FILE_FOOTER_RECORD: &str = "hio.FileFooter";

// [magic4][version u32][footer_pos i64]
pub const FILE_HEADER_SIZE: usize = 16;

// -------- Tables --------
pub const TABLE_HEADER_PREFIX: &str = "header/";
pub const TABLE_VERSION: u32 = 0;

// -------- Buffered I/O --------
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;
