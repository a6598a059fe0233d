// Constants module for shared names and defaults

pub const DEFAULT_BASE_URL: &str = "https://dl.google.com/dl/android/maven2/";
pub const MASTER_INDEX_FILE: &str = "master-index.xml";
pub const GROUP_INDEX_FILE: &str = "group-index.xml";
pub const CONFIG_FILE: &str = "exploder.toml";

/// Namespace prefix mirrored when neither the CLI nor the config file names one.
pub const DEFAULT_NAMESPACE_PREFIX: &str = "androidx.";

/// Packaging assumed when a POM does not declare one.
pub const DEFAULT_FILE_TYPE: &str = "jar";
pub const POM_EXTENSION: &str = "pom";

/// Archive nested inside an AAR that holds the compiled classes.
pub const NESTED_ARCHIVE: &str = "classes.jar";
pub const NESTED_ARCHIVE_DIR: &str = "classes";

pub const CLASS_EXTENSION: &str = "class";
pub const DISASSEMBLY_EXTENSION: &str = "bytecode";

/// Worker count for the file-bound phases (extraction and disassembly).
pub const DEFAULT_IO_WORKERS: usize = 16;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
