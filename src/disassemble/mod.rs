// Disassembly stage: turn every extracted class file into a bytecode listing

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;
use serde::Deserialize;

use crate::constants;
use crate::error::{Error, Result};

pub mod classfile;
pub mod javap;
pub mod native;
pub mod opcodes;

pub use classfile::ClassFormatError;
pub use javap::JavapDisassembler;
pub use native::NativeDisassembler;

/// Why a single class file could not be disassembled.
#[derive(Debug, thiserror::Error)]
pub enum DisassemblyFailure {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    ClassFormat(#[from] ClassFormatError),

    #[error("{0}")]
    Tool(String),
}

/// Renders class file bytes as text.
pub trait Disassembler: Send + Sync {
    fn name(&self) -> &'static str;

    /// `class_file` is where `bytes` were read from; backends that work on
    /// files rather than buffers use it instead of the bytes.
    fn disassemble(&self, class_file: &Path, bytes: &[u8]) -> Result<String, DisassemblyFailure>;
}

/// Which disassembler backend to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DisassemblerKind {
    #[default]
    Native,
    Javap,
}

impl DisassemblerKind {
    pub fn build(self) -> Arc<dyn Disassembler> {
        match self {
            DisassemblerKind::Native => Arc::new(NativeDisassembler),
            DisassemblerKind::Javap => Arc::new(JavapDisassembler::from_env()),
        }
    }
}

/// Sibling of `class_file` that receives its listing: `Foo.class` -> `Foo.bytecode`.
pub fn output_path(class_file: &Path) -> PathBuf {
    class_file.with_extension(constants::DISASSEMBLY_EXTENSION)
}

/// Disassemble one class file and write the listing next to it, replacing
/// any previous listing. Returns the path written.
pub fn dump_class(disassembler: &dyn Disassembler, class_file: &Path) -> Result<PathBuf> {
    info!("Dumping bytecode {}", class_file.display());

    let failed = |source: DisassemblyFailure| Error::Disassembly {
        path: class_file.to_path_buf(),
        source,
    };

    let bytes = fs::read(class_file).map_err(|e| failed(e.into()))?;
    let text = disassembler
        .disassemble(class_file, &bytes)
        .map_err(failed)?;

    let target = output_path(class_file);
    fs::write(&target, text).map_err(|e| failed(e.into()))?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_dump_writes_sibling_listing() {
        let temp_dir = TempDir::new().unwrap();
        let class_file = temp_dir.path().join("Demo.class");
        fs::write(&class_file, classfile::fixtures::demo_class()).unwrap();
        fs::write(temp_dir.path().join("Demo.bytecode"), "stale").unwrap();

        let written = dump_class(&NativeDisassembler, &class_file).unwrap();

        assert_eq!(written, temp_dir.path().join("Demo.bytecode"));
        let text = fs::read_to_string(&written).unwrap();
        assert!(text.contains("com/example/Demo"));
        assert!(!text.contains("stale"));
    }

    #[test]
    fn test_dump_malformed_class_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let class_file = temp_dir.path().join("Broken.class");
        fs::write(&class_file, b"\xCA\xFE\xBA\xBE\x00").unwrap();

        let err = dump_class(&NativeDisassembler, &class_file).unwrap_err();
        match err {
            Error::Disassembly { path, source } => {
                assert_eq!(path, class_file);
                assert!(matches!(source, DisassemblyFailure::ClassFormat(_)));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(!temp_dir.path().join("Broken.bytecode").exists());
    }

    #[test]
    fn test_dump_missing_file() {
        let err = dump_class(&NativeDisassembler, Path::new("/nonexistent/Missing.class"))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Disassembly {
                source: DisassemblyFailure::Io(_),
                ..
            }
        ));
    }

    #[test]
    fn test_disassembler_kind_builds_backend() {
        assert_eq!(DisassemblerKind::default().build().name(), "native");
        assert_eq!(DisassemblerKind::Javap.build().name(), "javap");
    }
}
