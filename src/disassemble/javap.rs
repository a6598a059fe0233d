// javap backend: delegate class file listings to the JDK tool

use std::path::Path;
use std::process::Command;

use super::{Disassembler, DisassemblyFailure};

/// Disassembler that shells out to the JDK's `javap`.
///
/// The binary defaults to `javap` on `PATH` and can be replaced through the
/// `EXPLODER_JAVAP` environment variable.
#[derive(Debug, Clone)]
pub struct JavapDisassembler {
    binary: String,
}

impl JavapDisassembler {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("EXPLODER_JAVAP").unwrap_or_else(|_| "javap".to_string()))
    }
}

impl Default for JavapDisassembler {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Disassembler for JavapDisassembler {
    fn name(&self) -> &'static str {
        "javap"
    }

    fn disassemble(&self, class_file: &Path, _bytes: &[u8]) -> Result<String, DisassemblyFailure> {
        let output = Command::new(&self.binary)
            .args(["-c", "-p", "-v"])
            .arg(class_file)
            .output()
            .map_err(|e| {
                DisassemblyFailure::Tool(format!(
                    "failed to execute {} (ensure a JDK is installed): {}",
                    self.binary, e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DisassemblyFailure::Tool(format!(
                "javap failed: {}",
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::{Mutex, OnceLock};
    use tempfile::TempDir;

    // Writing and executing scripts from parallel tests can hit ETXTBSY.
    fn tool_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn fake_tool(dir: &Path, script: &str) -> String {
        let path = dir.join("javap");
        fs::write(&path, script).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path.to_string_lossy().to_string()
    }

    #[test]
    fn test_javap_output_is_returned() {
        let _guard = tool_lock().lock().unwrap_or_else(|e| e.into_inner());
        let temp_dir = TempDir::new().unwrap();
        let tool = fake_tool(
            temp_dir.path(),
            "#!/bin/sh\necho \"Compiled from $4\"\necho \"public class Demo\"\n",
        );

        let text = JavapDisassembler::new(tool)
            .disassemble(Path::new("Demo.class"), &[])
            .unwrap();
        assert!(text.contains("Compiled from Demo.class"), "{}", text);
        assert!(text.contains("public class Demo"));
    }

    #[test]
    fn test_javap_failure_carries_stderr() {
        let _guard = tool_lock().lock().unwrap_or_else(|e| e.into_inner());
        let temp_dir = TempDir::new().unwrap();
        let tool = fake_tool(temp_dir.path(), "#!/bin/sh\necho \"boom from javap\" >&2\nexit 1\n");

        let err = JavapDisassembler::new(tool)
            .disassemble(Path::new("Demo.class"), &[])
            .unwrap_err();
        assert!(err.to_string().contains("boom from javap"), "{}", err);
    }

    #[test]
    fn test_missing_binary() {
        let err = JavapDisassembler::new("/nonexistent/javap")
            .disassemble(Path::new("Demo.class"), &[])
            .unwrap_err();
        assert!(matches!(err, DisassemblyFailure::Tool(_)));
    }
}
