//! hio - keyed container file: named typed values and append-only tables in
//! a single file, indexed by a footer written on close.

// Формат и базовые модули
pub mod consts;
pub mod error;
pub mod config;
pub mod metrics;

// Поток записей (кадры HREC)
pub mod rio;    // src/rio/{mod,encode,reader,record,codec}.rs

// Записи формата
pub mod header;
pub mod footer;

pub mod omap;
mod dict;
pub mod value;
pub mod table;
pub mod file;   // src/file/{mod,open,kv,tables,close}.rs

// Диагностика для CLI
pub mod inspect;

mod util;

// Удобные реэкспорты
pub use config::HioConfig;
pub use error::{is_end_of_table, HioError, RioError};
pub use file::File;
pub use footer::{FileEntry, FileFooter};
pub use header::FileHeader;
pub use rio::{Compression, Mode};
pub use table::{Rows, Table, TableHeader};
pub use value::Value;
